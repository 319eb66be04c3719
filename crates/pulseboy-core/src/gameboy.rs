use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    bus::{AddressBus, BusDevice},
    clock::Pulse,
    hardware::{Config, HardwareMode},
    interrupt::{IE_ADDR, IF_ADDR, Interrupt, InterruptRouter},
    joypad::{Joypad, P1_ADDR},
    memory::{
        ECHO_LAST, HRAM_BASE, HRAM_LAST, Hram, SVBK_ADDR, VBK_ADDR, VRAM_BASE, VRAM_LAST,
        Vram, WRAM_BASE, Wram,
    },
    oam::{OAM_BASE, OAM_LAST, ObjectAttributeMemory},
    ppu::{FRAME_CYCLES, LCDC_ADDR, OPRI_ADDR, Ppu, WX_ADDR},
};

pub const ROM_LAST: u16 = 0x7FFF;
pub const EXTERNAL_RAM_BASE: u16 = 0xA000;
pub const EXTERNAL_RAM_LAST: u16 = 0xBFFF;

/// The assembled machine: every unit wired onto one address bus and driven
/// from a single master clock.
///
/// The processor and cartridge are external collaborators. Until
/// [`GameBoy::map_cartridge`] is called, cartridge space reads as open bus.
pub struct GameBoy {
    bus: AddressBus,
    interrupts: Rc<RefCell<InterruptRouter>>,
    ppu: Rc<RefCell<Ppu>>,
    oam: Rc<RefCell<ObjectAttributeMemory>>,
    vram: Rc<RefCell<Vram>>,
    wram: Rc<RefCell<Wram>>,
    joypad: Rc<RefCell<Joypad>>,
    config: Config,
    cycles: u64,
}

impl GameBoy {
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    pub fn new_with_mode(mode: HardwareMode) -> Self {
        Self::new_with_config(Config::new(mode))
    }

    /// # Panics
    ///
    /// Panics if the wiring leaves any address without a handler.
    pub fn new_with_config(config: Config) -> Self {
        let router = InterruptRouter::new();
        let ppu_lines = router.requester(&[Interrupt::VBlank, Interrupt::LcdStat]);
        let joypad_lines = router.requester(&[Interrupt::Joypad]);

        let interrupts = Rc::new(RefCell::new(router));
        let oam = Rc::new(RefCell::new(ObjectAttributeMemory::new()));
        let ppu = Rc::new(RefCell::new(Ppu::new(Rc::clone(&oam), ppu_lines, config)));
        let vram = Rc::new(RefCell::new(Vram::new(config.mode)));
        let wram = Rc::new(RefCell::new(Wram::new(config.mode)));
        let hram = Rc::new(RefCell::new(Hram::new()));
        let joypad = Rc::new(RefCell::new(Joypad::new(joypad_lines)));

        let mut bus = AddressBus::new();
        bus.map_open_bus(0x0000..=ROM_LAST);
        bus.map_device(VRAM_BASE..=VRAM_LAST, &vram);
        bus.map_open_bus(EXTERNAL_RAM_BASE..=EXTERNAL_RAM_LAST);
        // Work RAM decodes its echo itself.
        bus.map_device(WRAM_BASE..=ECHO_LAST, &wram);
        bus.map_device(OAM_BASE..=OAM_LAST, &oam);
        bus.map_open_bus(OAM_LAST + 1..=0xFEFF);
        bus.map_device(P1_ADDR..=P1_ADDR, &joypad);
        // Serial and timer belong to collaborators outside this crate.
        bus.map_open_bus(P1_ADDR + 1..=IF_ADDR - 1);
        bus.map_device(IF_ADDR..=IF_ADDR, &interrupts);
        bus.map_open_bus(IF_ADDR + 1..=LCDC_ADDR - 1);
        bus.map_device(LCDC_ADDR..=WX_ADDR, &ppu);
        bus.map_open_bus(WX_ADDR + 1..=VBK_ADDR - 1);
        bus.map_device(VBK_ADDR..=VBK_ADDR, &vram);
        bus.map_open_bus(VBK_ADDR + 1..=OPRI_ADDR - 1);
        bus.map_device(OPRI_ADDR..=OPRI_ADDR, &ppu);
        bus.map_open_bus(OPRI_ADDR + 1..=SVBK_ADDR - 1);
        bus.map_device(SVBK_ADDR..=SVBK_ADDR, &wram);
        bus.map_open_bus(SVBK_ADDR + 1..=HRAM_BASE - 1);
        bus.map_device(HRAM_BASE..=HRAM_LAST, &hram);
        bus.map_device(IE_ADDR..=IE_ADDR, &interrupts);

        if let Err(err) = bus.ensure_fully_mapped() {
            panic!("incomplete memory map: {err}");
        }
        log::debug!("assembled {:?} machine ({:?})", config.mode, config.stat_rearm);

        Self {
            bus,
            interrupts,
            ppu,
            oam,
            vram,
            wram,
            joypad,
            config,
            cycles: 0,
        }
    }

    /// Route ROM (`$0000-$7FFF`) and external RAM (`$A000-$BFFF`) to a
    /// cartridge device.
    pub fn map_cartridge<D: BusDevice + 'static>(&mut self, cartridge: &Rc<RefCell<D>>) {
        self.bus.map_device(0x0000..=ROM_LAST, cartridge);
        self.bus
            .map_device(EXTERNAL_RAM_BASE..=EXTERNAL_RAM_LAST, cartridge);
        log::debug!("cartridge mapped");
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn bus(&self) -> &AddressBus {
        &self.bus
    }

    pub fn interrupts(&self) -> &Rc<RefCell<InterruptRouter>> {
        &self.interrupts
    }

    pub fn ppu(&self) -> &Rc<RefCell<Ppu>> {
        &self.ppu
    }

    pub fn oam(&self) -> &Rc<RefCell<ObjectAttributeMemory>> {
        &self.oam
    }

    pub fn vram(&self) -> &Rc<RefCell<Vram>> {
        &self.vram
    }

    pub fn wram(&self) -> &Rc<RefCell<Wram>> {
        &self.wram
    }

    pub fn joypad(&self) -> &Rc<RefCell<Joypad>> {
        &self.joypad
    }

    /// Master-clock cycles since power on.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        self.bus.immediate_read(addr)
    }

    pub fn write_byte(&self, addr: u16, value: u8) {
        self.bus.immediate_write(addr, value);
    }

    pub fn run_cycles(&mut self, cycles: u64) {
        self.pulse_n(cycles);
    }

    /// Run until the picture unit wraps back to the top of the next frame and
    /// return the number of cycles that took. With the display off this runs
    /// one frame's worth of cycles.
    pub fn run_frame(&mut self) -> u64 {
        let start = self.cycles;
        if !self.ppu.borrow().is_lcd_enabled() {
            self.run_cycles(FRAME_CYCLES);
            return FRAME_CYCLES;
        }
        let target = self.ppu.borrow().frames() + 1;
        while self.ppu.borrow().frames() < target {
            self.pulse();
        }
        while !self.ppu.borrow().budget().is_ready() {
            self.pulse();
        }
        self.cycles - start
    }
}

impl Pulse for GameBoy {
    fn pulse(&mut self) {
        self.ppu.borrow_mut().pulse();
        self.joypad.borrow_mut().pulse();
        self.cycles += 1;
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}
