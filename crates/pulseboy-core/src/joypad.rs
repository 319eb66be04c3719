use bitflags::bitflags;

use crate::bus::{BusDevice, OPEN_BUS_VALUE};
use crate::clock::Pulse;
use crate::interrupt::{Interrupt, InterruptRequester};

pub const P1_ADDR: u16 = 0xFF00;

const P1_UNUSED_BITS: u8 = 0xC0;
const P1_SELECT_MASK: u8 = 0x30;
const SELECT_DIRECTIONS: u8 = 0x10;
const SELECT_ACTIONS: u8 = 0x20;

bitflags! {
    /// Pressed buttons. The low nibble holds the action keys and the high
    /// nibble the direction keys, each in P1 line order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const A = 0x01;
        const B = 0x02;
        const SELECT = 0x04;
        const START = 0x08;
        const RIGHT = 0x10;
        const LEFT = 0x20;
        const UP = 0x40;
        const DOWN = 0x80;
    }
}

/// Button matrix behind `P1`.
pub struct Joypad {
    pressed: Buttons,
    /// Buttons seen by the previous pulse
    previous: Buttons,
    /// P1 bits 4-5, active low
    select: u8,
    interrupts: InterruptRequester,
}

impl Joypad {
    pub fn new(interrupts: InterruptRequester) -> Self {
        assert!(
            interrupts.grants(Interrupt::Joypad),
            "joypad needs the joypad interrupt line"
        );
        Self {
            pressed: Buttons::empty(),
            previous: Buttons::empty(),
            select: SELECT_DIRECTIONS,
            interrupts,
        }
    }

    pub fn press(&mut self, buttons: Buttons) {
        self.pressed.insert(buttons);
    }

    pub fn release(&mut self, buttons: Buttons) {
        self.pressed.remove(buttons);
    }

    pub fn pressed(&self) -> Buttons {
        self.pressed
    }

    pub fn read_p1(&self) -> u8 {
        let keys = self.pressed.bits();
        let mut lines = 0x0F;
        if self.select & SELECT_ACTIONS == 0 {
            lines &= !keys & 0x0F;
        }
        if self.select & SELECT_DIRECTIONS == 0 {
            lines &= !(keys >> 4) & 0x0F;
        }
        P1_UNUSED_BITS | self.select | lines
    }

    pub fn write_p1(&mut self, value: u8) {
        self.select = value & P1_SELECT_MASK;
    }
}

impl Pulse for Joypad {
    /// Raises the joypad interrupt when any button went from released to
    /// pressed since the previous pulse.
    fn pulse(&mut self) {
        if !(self.pressed - self.previous).is_empty() {
            self.interrupts.request(Interrupt::Joypad);
        }
        self.previous = self.pressed;
    }
}

impl BusDevice for Joypad {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            P1_ADDR => self.read_p1(),
            _ => OPEN_BUS_VALUE,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if addr == P1_ADDR {
            self.write_p1(value);
        }
    }
}
