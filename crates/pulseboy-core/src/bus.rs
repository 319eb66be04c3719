use std::cell::RefCell;
use std::fmt;
use std::ops::RangeInclusive;
use std::rc::Rc;

use crate::clock::{CycleBudget, MEMORY_ACCESS_CYCLES};

/// Size of the direct-mapped address space.
pub const ADDRESS_SPACE_SIZE: usize = 0x10000;

/// Value driven onto the data bus when nothing answers a read.
pub const OPEN_BUS_VALUE: u8 = 0xFF;

pub type ReadFn = Rc<dyn Fn(u16) -> u8>;
pub type WriteFn = Rc<dyn Fn(u16, u8)>;

/// A memory-mapped unit.
///
/// Implementors receive the full bus address, so one device mapped over
/// several ranges decodes the address itself.
pub trait BusDevice {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, value: u8);
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("no handler mapped at ${addr:04X}")]
    Unmapped { addr: u16 },
    #[error(
        "{} unmapped address range(s), first at ${:04X}",
        .ranges.len(),
        first_start(.ranges)
    )]
    Incomplete { ranges: Vec<RangeInclusive<u16>> },
}

fn first_start(ranges: &[RangeInclusive<u16>]) -> u16 {
    ranges.first().map_or(0, |r| *r.start())
}

/// Read and write handlers for one address. The handlers capture whatever
/// context they dispatch to.
#[derive(Clone)]
pub struct MemoryMapEntry {
    read: ReadFn,
    write: WriteFn,
}

impl MemoryMapEntry {
    pub fn new(read: impl Fn(u16) -> u8 + 'static, write: impl Fn(u16, u8) + 'static) -> Self {
        Self {
            read: Rc::new(read),
            write: Rc::new(write),
        }
    }

    /// Entry that reads `$FF` and drops writes.
    pub fn open_bus() -> Self {
        Self::new(|_| OPEN_BUS_VALUE, |_, _| {})
    }

    /// Entry that forwards to a shared device.
    pub fn device<D: BusDevice + 'static>(device: &Rc<RefCell<D>>) -> Self {
        let reader = Rc::clone(device);
        let writer = Rc::clone(device);
        Self::new(
            move |addr| reader.borrow_mut().read(addr),
            move |addr, value| writer.borrow_mut().write(addr, value),
        )
    }
}

impl fmt::Debug for MemoryMapEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMapEntry").finish_non_exhaustive()
    }
}

/// Direct-mapped 64K dispatch table.
///
/// Every address starts out without a handler. Wiring code must map each
/// address explicitly, including the open-bus regions; touching an address
/// that was never mapped is a bug in the wiring and panics.
pub struct AddressBus {
    map: Box<[Option<MemoryMapEntry>]>,
}

impl AddressBus {
    pub fn new() -> Self {
        Self {
            map: vec![None; ADDRESS_SPACE_SIZE].into_boxed_slice(),
        }
    }

    /// Install one entry across an inclusive range. Last mapping wins.
    pub fn map_entry(&mut self, range: RangeInclusive<u16>, entry: MemoryMapEntry) {
        for addr in range {
            self.map[addr as usize] = Some(entry.clone());
        }
    }

    pub fn map(
        &mut self,
        range: RangeInclusive<u16>,
        read: impl Fn(u16) -> u8 + 'static,
        write: impl Fn(u16, u8) + 'static,
    ) {
        self.map_entry(range, MemoryMapEntry::new(read, write));
    }

    pub fn map_device<D: BusDevice + 'static>(
        &mut self,
        range: RangeInclusive<u16>,
        device: &Rc<RefCell<D>>,
    ) {
        self.map_entry(range, MemoryMapEntry::device(device));
    }

    pub fn map_open_bus(&mut self, range: RangeInclusive<u16>) {
        self.map_entry(range, MemoryMapEntry::open_bus());
    }

    pub fn is_mapped(&self, addr: u16) -> bool {
        self.map[addr as usize].is_some()
    }

    /// Contiguous runs of addresses without a handler, in ascending order.
    pub fn unmapped_ranges(&self) -> Vec<RangeInclusive<u16>> {
        let mut ranges = Vec::new();
        let mut start: Option<u16> = None;
        for (i, entry) in self.map.iter().enumerate() {
            let addr = i as u16;
            match (entry.is_some(), start) {
                (false, None) => start = Some(addr),
                (true, Some(s)) => {
                    ranges.push(s..=addr - 1);
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            ranges.push(s..=0xFFFF);
        }
        ranges
    }

    /// Check that every address has a handler.
    pub fn ensure_fully_mapped(&self) -> Result<(), BusError> {
        let ranges = self.unmapped_ranges();
        if ranges.is_empty() {
            Ok(())
        } else {
            Err(BusError::Incomplete { ranges })
        }
    }

    fn entry(&self, addr: u16) -> Result<&MemoryMapEntry, BusError> {
        self.map[addr as usize]
            .as_ref()
            .ok_or(BusError::Unmapped { addr })
    }

    pub fn try_immediate_read(&self, addr: u16) -> Result<u8, BusError> {
        let entry = self.entry(addr)?;
        Ok((entry.read)(addr))
    }

    pub fn try_immediate_write(&self, addr: u16, value: u8) -> Result<(), BusError> {
        let entry = self.entry(addr)?;
        (entry.write)(addr, value);
        Ok(())
    }

    /// Read without any cycle cost.
    ///
    /// # Panics
    ///
    /// Panics if `addr` has no handler.
    pub fn immediate_read(&self, addr: u16) -> u8 {
        self.try_immediate_read(addr)
            .unwrap_or_else(|err| panic!("bus read: {err}"))
    }

    /// Write without any cycle cost.
    ///
    /// # Panics
    ///
    /// Panics if `addr` has no handler.
    pub fn immediate_write(&self, addr: u16, value: u8) {
        if let Err(err) = self.try_immediate_write(addr, value) {
            panic!("bus write: {err}");
        }
    }

    /// Charge one bus access on the caller's budget, then read.
    pub fn synced_read(&self, clock: &mut CycleBudget, addr: u16) -> u8 {
        clock.charge(MEMORY_ACCESS_CYCLES);
        self.immediate_read(addr)
    }

    /// Charge one bus access on the caller's budget, then write.
    pub fn synced_write(&self, clock: &mut CycleBudget, addr: u16, value: u8) {
        clock.charge(MEMORY_ACCESS_CYCLES);
        self.immediate_write(addr, value);
    }
}

impl Default for AddressBus {
    fn default() -> Self {
        Self::new()
    }
}
