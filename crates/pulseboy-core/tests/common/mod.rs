#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use pulseboy_core::{
    clock::Pulse,
    hardware::Config,
    interrupt::{Interrupt, InterruptRouter},
    oam::{ObjectAttributeMemory, ObjectDescriptor},
    ppu::{Mode, Ppu, STAT_ADDR},
};

/// Route `log` output through the test harness. Run with `RUST_LOG=trace`
/// (and `--features ppu-trace`) to see every transition.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A picture unit on its own, with the router and OAM it is wired to.
pub struct PpuRig {
    pub router: InterruptRouter,
    pub oam: Rc<RefCell<ObjectAttributeMemory>>,
    pub ppu: Ppu,
}

impl PpuRig {
    pub fn new(config: Config) -> Self {
        init_logging();
        let router = InterruptRouter::new();
        let oam = Rc::new(RefCell::new(ObjectAttributeMemory::new()));
        let ppu = Ppu::new(
            Rc::clone(&oam),
            router.requester(&[Interrupt::VBlank, Interrupt::LcdStat]),
            config,
        );
        Self { router, oam, ppu }
    }

    pub fn place(&self, index: usize, y: u8, x: u8) {
        self.oam
            .borrow_mut()
            .set_descriptor(index, ObjectDescriptor::new(y, x, 0, 0));
    }

    pub fn run(&mut self, cycles: u64) {
        self.ppu.pulse_n(cycles);
    }

    pub fn mode_bits(&self) -> u8 {
        self.ppu.read_reg(STAT_ADDR) & 0x03
    }

    pub fn stat_pending(&self) -> bool {
        self.router.is_pending(Interrupt::LcdStat)
    }

    pub fn take_stat(&self) -> bool {
        let pending = self.stat_pending();
        self.router.clear(Interrupt::LcdStat);
        pending
    }
}

pub fn mode_from_bits(bits: u8) -> Mode {
    match bits & 0x03 {
        0 => Mode::HBlank,
        1 => Mode::VBlank,
        2 => Mode::OamSearch,
        _ => Mode::Transfer,
    }
}
