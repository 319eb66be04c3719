use std::cell::Cell;
use std::rc::Rc;

use crate::bus::BusDevice;

pub const IF_ADDR: u16 = 0xFF0F;
pub const IE_ADDR: u16 = 0xFFFF;

/// Bits 5-7 of `IE` and `IF` always read back as 1.
///
/// Forcing them into the priority search means `(IF & IE)` always has a set
/// bit, so the lowest-set-bit index is defined even when nothing real is
/// pending and lands on [`NO_INTERRUPT`].
pub const RESERVED_BITS: u8 = 0b1110_0000;
pub const MEANINGFUL_BITS: u8 = !RESERVED_BITS;

/// Index returned by [`InterruptRouter::highest_pending_index`] when nothing
/// is both enabled and requested.
pub const NO_INTERRUPT: u8 = 5;

/// Interrupt request lines, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Interrupt {
    VBlank = 0,
    LcdStat = 1,
    Timer = 2,
    Serial = 3,
    Joypad = 4,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Handler address the processor jumps to when servicing this line.
    pub const fn vector(self) -> u16 {
        0x0040 + 8 * self as u16
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Interrupt::VBlank),
            1 => Some(Interrupt::LcdStat),
            2 => Some(Interrupt::Timer),
            3 => Some(Interrupt::Serial),
            4 => Some(Interrupt::Joypad),
            _ => None,
        }
    }
}

/// `IE`, `IF` and `IME`.
///
/// `IF` lives behind a shared cell so hardware units can raise requests
/// through an [`InterruptRequester`] while the router itself is mapped on the
/// bus.
#[derive(Debug)]
pub struct InterruptRouter {
    enable: u8,
    pending: Rc<Cell<u8>>,
    master_enable: bool,
}

impl InterruptRouter {
    pub fn new() -> Self {
        Self {
            enable: 0,
            pending: Rc::new(Cell::new(0)),
            master_enable: false,
        }
    }

    pub fn request(&self, interrupt: Interrupt) {
        self.pending.set(self.pending.get() | interrupt.bit());
    }

    pub fn clear(&self, interrupt: Interrupt) {
        self.pending.set(self.pending.get() & !interrupt.bit());
    }

    pub fn is_pending(&self, interrupt: Interrupt) -> bool {
        self.pending.get() & interrupt.bit() != 0
    }

    /// Index of the highest-priority line that is both enabled and pending,
    /// or [`NO_INTERRUPT`].
    #[inline]
    pub fn highest_pending_index(&self) -> u8 {
        let candidates = (self.pending.get() | RESERVED_BITS) & (self.enable | RESERVED_BITS);
        candidates.trailing_zeros() as u8
    }

    pub fn highest_pending(&self) -> Option<Interrupt> {
        Interrupt::from_index(self.highest_pending_index())
    }

    /// Processor-side dispatch: if the master enable is set and a line is
    /// ready, clear its request, drop the master enable and return it.
    pub fn acknowledge(&mut self) -> Option<Interrupt> {
        if !self.master_enable {
            return None;
        }
        let interrupt = self.highest_pending()?;
        self.clear(interrupt);
        self.master_enable = false;
        Some(interrupt)
    }

    pub fn read_enable(&self) -> u8 {
        self.enable | RESERVED_BITS
    }

    pub fn write_enable(&mut self, value: u8) {
        self.enable = value & MEANINGFUL_BITS;
    }

    pub fn read_pending(&self) -> u8 {
        self.pending.get() | RESERVED_BITS
    }

    pub fn write_pending(&mut self, value: u8) {
        self.pending.set(value & MEANINGFUL_BITS);
    }

    pub fn master_enable(&self) -> bool {
        self.master_enable
    }

    pub fn set_master_enable(&mut self, value: bool) {
        self.master_enable = value;
    }

    /// Hand out a capability that may only raise or drop `lines`.
    pub fn requester(&self, lines: &[Interrupt]) -> InterruptRequester {
        InterruptRequester {
            pending: Rc::clone(&self.pending),
            granted: lines.iter().fold(0, |mask, line| mask | line.bit()),
        }
    }
}

impl Default for InterruptRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl BusDevice for InterruptRouter {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            IF_ADDR => self.read_pending(),
            IE_ADDR => self.read_enable(),
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            IF_ADDR => self.write_pending(value),
            IE_ADDR => self.write_enable(value),
            _ => {}
        }
    }
}

/// Request capability held by a hardware unit.
///
/// A requester only touches the lines it was granted; asking for any other
/// line is a wiring bug and panics.
#[derive(Clone, Debug)]
pub struct InterruptRequester {
    pending: Rc<Cell<u8>>,
    granted: u8,
}

impl InterruptRequester {
    fn check(&self, interrupt: Interrupt) {
        assert!(
            self.granted & interrupt.bit() != 0,
            "{interrupt:?} was not granted to this requester"
        );
    }

    pub fn request(&self, interrupt: Interrupt) {
        self.check(interrupt);
        log::trace!("interrupt requested: {interrupt:?}");
        self.pending.set(self.pending.get() | interrupt.bit());
    }

    pub fn clear(&self, interrupt: Interrupt) {
        self.check(interrupt);
        self.pending.set(self.pending.get() & !interrupt.bit());
    }

    pub fn grants(&self, interrupt: Interrupt) -> bool {
        self.granted & interrupt.bit() != 0
    }
}
