//! Plain RAM regions: video RAM, work RAM and high RAM.
//!
//! Each region answers for its own bank-select register so the machine can
//! map the register address onto the same device as the memory it selects.

use crate::bus::{BusDevice, OPEN_BUS_VALUE};
use crate::hardware::HardwareMode;

pub const VRAM_BANK_SIZE: usize = 0x2000;
pub const WRAM_BANK_SIZE: usize = 0x1000;
pub const WRAM_BANKS: usize = 8;
pub const HRAM_SIZE: usize = 0x7F;

pub const VRAM_BASE: u16 = 0x8000;
pub const VRAM_LAST: u16 = 0x9FFF;
pub const WRAM_BASE: u16 = 0xC000;
pub const WRAM_LAST: u16 = 0xDFFF;
pub const ECHO_BASE: u16 = 0xE000;
pub const ECHO_LAST: u16 = 0xFDFF;
pub const HRAM_BASE: u16 = 0xFF80;
pub const HRAM_LAST: u16 = 0xFFFE;

pub const VBK_ADDR: u16 = 0xFF4F;
pub const SVBK_ADDR: u16 = 0xFF70;

/// Echo RAM sits 8 KiB above the work RAM it mirrors.
const ECHO_OFFSET: u16 = ECHO_BASE - WRAM_BASE;

pub struct Vram {
    banks: [[u8; VRAM_BANK_SIZE]; 2],
    bank: usize,
    cgb: bool,
}

impl Vram {
    pub fn new(mode: HardwareMode) -> Self {
        Self {
            banks: [[0; VRAM_BANK_SIZE]; 2],
            bank: 0,
            cgb: mode.is_cgb(),
        }
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    pub fn bank_data(&self, bank: usize) -> &[u8; VRAM_BANK_SIZE] {
        &self.banks[bank]
    }
}

impl BusDevice for Vram {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            VRAM_BASE..=VRAM_LAST => self.banks[self.bank][(addr - VRAM_BASE) as usize],
            VBK_ADDR if self.cgb => 0xFE | self.bank as u8,
            _ => OPEN_BUS_VALUE,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            VRAM_BASE..=VRAM_LAST => {
                self.banks[self.bank][(addr - VRAM_BASE) as usize] = value;
            }
            VBK_ADDR if self.cgb => self.bank = (value & 0x01) as usize,
            _ => {}
        }
    }
}

pub struct Wram {
    banks: [[u8; WRAM_BANK_SIZE]; WRAM_BANKS],
    /// Bank visible at `$D000`, never 0.
    bank: usize,
    cgb: bool,
}

impl Wram {
    pub fn new(mode: HardwareMode) -> Self {
        Self {
            banks: [[0; WRAM_BANK_SIZE]; WRAM_BANKS],
            bank: 1,
            cgb: mode.is_cgb(),
        }
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    fn locate(&self, addr: u16) -> (usize, usize) {
        let addr = match addr {
            ECHO_BASE..=ECHO_LAST => addr - ECHO_OFFSET,
            _ => addr,
        };
        let offset = (addr - WRAM_BASE) as usize;
        if offset < WRAM_BANK_SIZE {
            (0, offset)
        } else {
            (self.bank, offset - WRAM_BANK_SIZE)
        }
    }
}

impl BusDevice for Wram {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            WRAM_BASE..=WRAM_LAST | ECHO_BASE..=ECHO_LAST => {
                let (bank, offset) = self.locate(addr);
                self.banks[bank][offset]
            }
            SVBK_ADDR if self.cgb => 0xF8 | self.bank as u8,
            _ => OPEN_BUS_VALUE,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            WRAM_BASE..=WRAM_LAST | ECHO_BASE..=ECHO_LAST => {
                let (bank, offset) = self.locate(addr);
                self.banks[bank][offset] = value;
            }
            SVBK_ADDR if self.cgb => {
                let bank = (value & 0x07) as usize;
                self.bank = if bank == 0 { 1 } else { bank };
            }
            _ => {}
        }
    }
}

pub struct Hram {
    bytes: [u8; HRAM_SIZE],
}

impl Hram {
    pub fn new() -> Self {
        Self {
            bytes: [0; HRAM_SIZE],
        }
    }
}

impl Default for Hram {
    fn default() -> Self {
        Self::new()
    }
}

impl BusDevice for Hram {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            HRAM_BASE..=HRAM_LAST => self.bytes[(addr - HRAM_BASE) as usize],
            _ => OPEN_BUS_VALUE,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if let HRAM_BASE..=HRAM_LAST = addr {
            self.bytes[(addr - HRAM_BASE) as usize] = value;
        }
    }
}
