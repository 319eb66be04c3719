mod common;

use std::cell::RefCell;
use std::rc::Rc;

use pulseboy_core::{
    bus::BusDevice,
    clock::Pulse,
    gameboy::GameBoy,
    hardware::{HardwareMode, StatRearm},
    joypad::Buttons,
    ppu::FRAME_CYCLES,
};

struct Rom {
    data: Vec<u8>,
    ram: [u8; 0x2000],
}

impl BusDevice for Rom {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.data.get(addr as usize).copied().unwrap_or(0xFF),
            0xA000..=0xBFFF => self.ram[(addr - 0xA000) as usize],
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if let 0xA000..=0xBFFF = addr {
            self.ram[(addr - 0xA000) as usize] = value;
        }
    }
}

fn machine(mode: HardwareMode) -> GameBoy {
    common::init_logging();
    GameBoy::new_with_mode(mode)
}

#[test]
fn every_address_is_mapped() {
    let gb = machine(HardwareMode::Dmg);
    assert_eq!(gb.config().mode, HardwareMode::Dmg);
    assert_eq!(gb.config().stat_rearm, StatRearm::PerScanline);
    assert!(gb.bus().unmapped_ranges().is_empty());
    for addr in [0x0000, 0x7FFF, 0xA000, 0xFEA0, 0xFF01, 0xFF10, 0xFF46, 0xFF50, 0xFF7F] {
        assert_eq!(gb.read_byte(addr), 0xFF, "open bus at {addr:04X}");
    }
}

#[test]
fn cartridge_replaces_open_bus() {
    let mut gb = machine(HardwareMode::Dmg);
    let cart = Rc::new(RefCell::new(Rom {
        data: vec![0x31, 0xFE, 0xFF],
        ram: [0; 0x2000],
    }));
    gb.map_cartridge(&cart);
    assert_eq!(gb.read_byte(0x0001), 0xFE);
    gb.write_byte(0xA123, 0x77);
    assert_eq!(gb.read_byte(0xA123), 0x77);
    assert_eq!(cart.borrow().ram[0x123], 0x77);
}

#[test]
fn work_ram_echo_and_bank_switch() {
    let gb = machine(HardwareMode::Cgb);
    gb.write_byte(0xC000, 0xAA);
    assert_eq!(gb.read_byte(0xE000), 0xAA);
    gb.write_byte(0xE001, 0xBB);
    assert_eq!(gb.read_byte(0xC001), 0xBB);

    gb.write_byte(0xFF70, 0x02);
    gb.write_byte(0xD000, 0xCC);
    gb.write_byte(0xFF70, 0x03);
    assert_eq!(gb.read_byte(0xD000), 0x00);
    gb.write_byte(0xFF70, 0x02);
    assert_eq!(gb.read_byte(0xD000), 0xCC);
    assert_eq!(gb.read_byte(0xF000), 0xCC);
    assert_eq!(gb.read_byte(0xFF70), 0xFA);
}

#[test]
fn vram_bank_switch() {
    let gb = machine(HardwareMode::Cgb);
    gb.write_byte(0x8000, 0x11);
    gb.write_byte(0xFF4F, 0x01);
    assert_eq!(gb.read_byte(0xFF4F), 0xFF);
    assert_eq!(gb.read_byte(0x8000), 0x00);
    gb.write_byte(0x8000, 0x22);
    gb.write_byte(0xFF4F, 0x00);
    assert_eq!(gb.read_byte(0xFF4F), 0xFE);
    assert_eq!(gb.read_byte(0x8000), 0x11);
    assert_eq!(gb.vram().borrow().bank_data(1)[0], 0x22);
}

#[test]
fn oam_and_hram_round_trip_over_the_bus() {
    let gb = machine(HardwareMode::Dmg);
    for (i, value) in [0x20u8, 0x30, 0x41, 0x80].into_iter().enumerate() {
        gb.write_byte(0xFE04 + i as u16, value);
    }
    let descriptor = gb.oam().borrow().descriptor(1);
    assert_eq!((descriptor.y, descriptor.x), (0x20, 0x30));
    assert_eq!(descriptor.tile_index, 0x41);

    gb.write_byte(0xFF80, 0x12);
    gb.write_byte(0xFFFE, 0x34);
    assert_eq!(gb.read_byte(0xFF80), 0x12);
    assert_eq!(gb.read_byte(0xFFFE), 0x34);
}

#[test]
fn joypad_press_raises_interrupt() {
    let mut gb = machine(HardwareMode::Dmg);
    gb.write_byte(0xFF00, 0x10);
    assert_eq!(gb.read_byte(0xFF00), 0xDF);

    gb.joypad().borrow_mut().press(Buttons::START);
    assert_eq!(gb.joypad().borrow().pressed(), Buttons::START);
    assert_eq!(gb.read_byte(0xFF00), 0xD7);
    gb.pulse();
    assert_eq!(gb.read_byte(0xFF0F) & 0x10, 0x10);
}

#[test]
fn run_frame_lands_on_the_frame_boundary() {
    let mut gb = machine(HardwareMode::Dmg);
    gb.write_byte(0xFFFF, 0x01);
    assert_eq!(gb.run_frame(), FRAME_CYCLES);
    assert_eq!(gb.cycles(), FRAME_CYCLES);
    assert_eq!(gb.read_byte(0xFF44), 0);
    assert_eq!(gb.ppu().borrow().frames(), 1);
    assert_eq!(gb.read_byte(0xFF0F) & 0x01, 0x01);

    let mut router = gb.interrupts().borrow_mut();
    router.set_master_enable(true);
    assert_eq!(router.acknowledge().map(|i| i.vector()), Some(0x40));
    drop(router);

    assert_eq!(gb.run_frame(), FRAME_CYCLES);
    assert_eq!(gb.ppu().borrow().frames(), 2);
}

#[test]
fn run_frame_with_display_off() {
    let mut gb = machine(HardwareMode::Dmg);
    gb.write_byte(0xFF40, 0x00);
    assert_eq!(gb.run_frame(), FRAME_CYCLES);
    assert_eq!(gb.ppu().borrow().frames(), 0);
    assert_eq!(gb.read_byte(0xFF0F) & 0x01, 0x00);
}

#[test]
fn stat_and_ly_visible_through_the_bus() {
    let mut gb = machine(HardwareMode::Dmg);
    gb.run_cycles(81);
    assert_eq!(gb.read_byte(0xFF41) & 0x03, 3);
    gb.run_cycles(456);
    assert_eq!(gb.read_byte(0xFF44), 1);
}
