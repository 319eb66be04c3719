use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use crate::bus::BusDevice;
use crate::clock::{CycleBudget, Cycles, Pulse};
use crate::hardware::{Config, HardwareMode, StatRearm};
use crate::interrupt::{Interrupt, InterruptRequester};
use crate::oam::{
    IntersectedObjects, LARGE_OBJECT_HEIGHT, NORMAL_OBJECT_HEIGHT, OBJECT_COUNT,
    ObjectAttributeMemory, ObjectPriority,
};

pub const LCDC_ADDR: u16 = 0xFF40;
pub const STAT_ADDR: u16 = 0xFF41;
pub const SCY_ADDR: u16 = 0xFF42;
pub const SCX_ADDR: u16 = 0xFF43;
pub const LY_ADDR: u16 = 0xFF44;
pub const LYC_ADDR: u16 = 0xFF45;
pub const BGP_ADDR: u16 = 0xFF47;
pub const OBP0_ADDR: u16 = 0xFF48;
pub const OBP1_ADDR: u16 = 0xFF49;
pub const WY_ADDR: u16 = 0xFF4A;
pub const WX_ADDR: u16 = 0xFF4B;
pub const OPRI_ADDR: u16 = 0xFF6C;

// Timing constants in master-clock cycles
pub const SCANLINE_CYCLES: Cycles = 456;
pub const OAM_SEARCH_CYCLES: Cycles = 80;
pub const OBJECT_SEARCH_CYCLES: Cycles = 2; // OAM_SEARCH_CYCLES / OBJECT_COUNT
pub const END_OF_LINE_CYCLES: Cycles = 4;
pub const RENDER_BASE_CYCLES: Cycles = 172;
pub const RENDER_OBJECT_CYCLES: Cycles = 6;

pub const VISIBLE_LINES: u8 = 144;
pub const LAST_VBLANK_LINE: u8 = 152;
pub const LINES_PER_FRAME: u64 = 154;
pub const FRAME_CYCLES: u64 = SCANLINE_CYCLES as u64 * LINES_PER_FRAME;

// Post-boot LCDC: display, background and tile data 0x8000 enabled.
const LCDC_BOOT_VALUE: u8 = 0x91;
const STAT_UNUSED_BIT: u8 = 0x80;
const STAT_LYC_FLAG: u8 = 0x04;

bitflags! {
    /// LCD control register (`$FF40`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LcdControl: u8 {
        const LCD_ENABLE = 0b1000_0000;
        const WINDOW_TILE_MAP = 0b0100_0000;
        const WINDOW_ENABLE = 0b0010_0000;
        const TILE_DATA = 0b0001_0000;
        const BG_TILE_MAP = 0b0000_1000;
        /// 8x16 objects instead of 8x8.
        const OBJ_SIZE = 0b0000_0100;
        const OBJ_ENABLE = 0b0000_0010;
        const BG_ENABLE = 0b0000_0001;
    }
}

bitflags! {
    /// Writable interrupt-source enables of the LCD status register
    /// (`$FF41`, bits 3-6).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatEnable: u8 {
        const LYC = 0b0100_0000;
        const OAM = 0b0010_0000;
        const VBLANK = 0b0001_0000;
        const HBLANK = 0b0000_1000;
    }
}

/// The two mode bits reported in STAT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    Transfer = 3,
}

impl Mode {
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Scanline engine states. The engine stores the phase it will run on the
/// next ready pulse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    FirstObjectSearch,
    /// Evaluate object `next` (1..=39).
    ObjectSearch { next: u8 },
    Render,
    HorizontalBlank,
    EndOfLine,
    VerticalBlank,
    /// Line 153: LY drops back to 0 a few cycles into the line.
    LastVerticalBlank,
    LastEndOfLine,
}

/// Picture processing unit timing core.
///
/// Walks object search, render, horizontal blank and vertical blank on a
/// [`CycleBudget`], keeping LY, the STAT mode bits and the LCD interrupt
/// requests exact to the cycle. Pixel composition happens elsewhere.
pub struct Ppu {
    oam: Rc<RefCell<ObjectAttributeMemory>>,
    interrupts: InterruptRequester,
    hardware: HardwareMode,
    stat_rearm: StatRearm,

    budget: CycleBudget,
    phase: Phase,
    mode: Mode,

    lcdc: LcdControl,
    stat_enable: StatEnable,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,
    /// Object priority mode register (OPRI)
    opri: u8,

    /// Edge-triggered LY == LYC flag, reported as STAT bit 2
    lyc_flag: bool,
    /// A status interrupt was already requested on this scanline
    stat_latched: bool,
    /// Combined status signal level, for [`StatRearm::SignalEdge`]
    stat_line: bool,

    objects: IntersectedObjects,
    render_cycles: Cycles,
    frame_counter: u64,
}

impl Ppu {
    /// # Panics
    ///
    /// Panics if `interrupts` was not granted both the VBlank and LCD status
    /// lines.
    pub fn new(
        oam: Rc<RefCell<ObjectAttributeMemory>>,
        interrupts: InterruptRequester,
        config: Config,
    ) -> Self {
        assert!(
            interrupts.grants(Interrupt::VBlank) && interrupts.grants(Interrupt::LcdStat),
            "picture unit needs the VBlank and LCD status interrupt lines"
        );
        Self {
            oam,
            interrupts,
            hardware: config.mode,
            stat_rearm: config.stat_rearm,
            budget: CycleBudget::new(),
            phase: Phase::FirstObjectSearch,
            mode: Mode::OamSearch,
            lcdc: LcdControl::from_bits_retain(LCDC_BOOT_VALUE),
            stat_enable: StatEnable::empty(),
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: 0xFC,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            opri: 0,
            lyc_flag: false,
            stat_latched: false,
            stat_line: false,
            objects: IntersectedObjects::new(),
            render_cycles: RENDER_BASE_CYCLES,
            frame_counter: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn lcdc(&self) -> LcdControl {
        self.lcdc
    }

    pub fn budget(&self) -> &CycleBudget {
        &self.budget
    }

    pub fn is_lcd_enabled(&self) -> bool {
        self.lcdc.contains(LcdControl::LCD_ENABLE)
    }

    /// Objects selected for the scanline being drawn, in draw priority order.
    pub fn intersected_objects(&self) -> &IntersectedObjects {
        &self.objects
    }

    /// Render duration computed for the current scanline.
    pub fn render_cycles(&self) -> Cycles {
        self.render_cycles
    }

    /// Returns the number of frames that have been completed since power on.
    pub fn frames(&self) -> u64 {
        self.frame_counter
    }

    pub fn object_height(&self) -> u8 {
        if self.lcdc.contains(LcdControl::OBJ_SIZE) {
            LARGE_OBJECT_HEIGHT
        } else {
            NORMAL_OBJECT_HEIGHT
        }
    }

    /// CGB mode draws in OAM order unless OPRI bit 0 asks for the
    /// monochrome coordinate order; every other mode uses coordinates.
    pub fn object_priority(&self) -> ObjectPriority {
        if self.hardware.is_cgb() && self.opri & 0x01 == 0 {
            ObjectPriority::OamIndex
        } else {
            ObjectPriority::Coordinate
        }
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            LCDC_ADDR => self.lcdc.bits(),
            STAT_ADDR => {
                STAT_UNUSED_BIT
                    | self.stat_enable.bits()
                    | if self.lyc_flag { STAT_LYC_FLAG } else { 0 }
                    | self.mode.bits()
            }
            SCY_ADDR => self.scy,
            SCX_ADDR => self.scx,
            LY_ADDR => self.ly,
            LYC_ADDR => self.lyc,
            BGP_ADDR => self.bgp,
            OBP0_ADDR => self.obp0,
            OBP1_ADDR => self.obp1,
            WY_ADDR => self.wy,
            WX_ADDR => self.wx,
            OPRI_ADDR => {
                if self.hardware.is_cgb() {
                    self.opri | 0xFE
                } else {
                    0xFF
                }
            }
            _ => 0xFF,
        }
    }

    pub fn write_reg(&mut self, addr: u16, val: u8) {
        match addr {
            LCDC_ADDR => self.write_lcdc(val),
            // Mode bits and the LYC flag are read-only.
            STAT_ADDR => self.stat_enable = StatEnable::from_bits_truncate(val),
            SCY_ADDR => self.scy = val,
            SCX_ADDR => self.scx = val,
            LY_ADDR => {}
            LYC_ADDR => self.lyc = val,
            BGP_ADDR => self.bgp = val,
            OBP0_ADDR => self.obp0 = val,
            OBP1_ADDR => self.obp1 = val,
            WY_ADDR => self.wy = val,
            WX_ADDR => self.wx = val,
            OPRI_ADDR => {
                if self.hardware.is_cgb() {
                    self.opri = val & 0x01;
                }
            }
            _ => {}
        }
    }

    fn write_lcdc(&mut self, val: u8) {
        let was_on = self.is_lcd_enabled();
        self.lcdc = LcdControl::from_bits_retain(val);
        match (was_on, self.is_lcd_enabled()) {
            (true, false) => {
                log::debug!("LCD disabled at LY={} ({:?})", self.ly, self.phase);
                self.power_off();
            }
            (false, true) => {
                log::debug!("LCD enabled");
                // Line 0 is compared against LYC as soon as the display starts.
                self.compare_line();
                if self.stat_rearm == StatRearm::SignalEdge {
                    self.update_stat_signal();
                }
            }
            _ => {}
        }
    }

    /// With the display off the engine holds at the top of the frame and
    /// restarts from line 0 once it is switched back on.
    fn power_off(&mut self) {
        self.budget.reset();
        self.phase = Phase::FirstObjectSearch;
        self.mode = Mode::HBlank;
        self.ly = 0;
        self.lyc_flag = false;
        self.stat_latched = false;
        self.stat_line = false;
        self.objects.clear();
    }

    /// Run the current phase once and report the phase that follows it and
    /// the cycles it occupies.
    fn transition(&mut self) -> (Phase, Cycles) {
        match self.phase {
            Phase::FirstObjectSearch => {
                self.mode = Mode::OamSearch;
                self.raise_stat(self.stat_enable.contains(StatEnable::OAM));
                self.objects.clear();
                self.search_object(0);
                (Phase::ObjectSearch { next: 1 }, OBJECT_SEARCH_CYCLES)
            }
            Phase::ObjectSearch { next } => {
                self.search_object(next);
                if next as usize == OBJECT_COUNT - 1 {
                    self.render_cycles = self.compute_render_cycles();
                    (Phase::Render, OBJECT_SEARCH_CYCLES)
                } else {
                    (Phase::ObjectSearch { next: next + 1 }, OBJECT_SEARCH_CYCLES)
                }
            }
            Phase::Render => {
                self.mode = Mode::Transfer;
                (Phase::HorizontalBlank, self.render_cycles)
            }
            Phase::HorizontalBlank => {
                self.mode = Mode::HBlank;
                self.raise_stat(self.stat_enable.contains(StatEnable::HBLANK));
                let remaining =
                    SCANLINE_CYCLES - OAM_SEARCH_CYCLES - self.render_cycles - END_OF_LINE_CYCLES;
                (Phase::EndOfLine, remaining)
            }
            Phase::EndOfLine => {
                self.stat_latched = false;
                self.objects.clear();
                self.ly += 1;
                self.compare_line();
                let next = if self.ly < VISIBLE_LINES {
                    Phase::FirstObjectSearch
                } else if self.ly <= LAST_VBLANK_LINE {
                    Phase::VerticalBlank
                } else {
                    Phase::LastVerticalBlank
                };
                (next, END_OF_LINE_CYCLES)
            }
            Phase::VerticalBlank => {
                self.mode = Mode::VBlank;
                // Only the first blank line enters vertical blank.
                if self.ly == VISIBLE_LINES {
                    self.interrupts.request(Interrupt::VBlank);
                    self.raise_stat(self.vblank_stat_source());
                }
                (Phase::EndOfLine, SCANLINE_CYCLES - END_OF_LINE_CYCLES)
            }
            Phase::LastVerticalBlank => {
                self.mode = Mode::VBlank;
                self.stat_latched = false;
                self.ly = 0;
                self.compare_line();
                (Phase::LastEndOfLine, SCANLINE_CYCLES - END_OF_LINE_CYCLES)
            }
            Phase::LastEndOfLine => {
                self.frame_counter = self.frame_counter.wrapping_add(1);
                log::trace!("frame {} complete", self.frame_counter);
                (Phase::FirstObjectSearch, END_OF_LINE_CYCLES)
            }
        }
    }

    fn search_object(&mut self, index: u8) {
        let descriptor = self.oam.borrow().descriptor(index as usize);
        let height = self.object_height();
        let priority = self.object_priority();
        self.objects
            .consider(self.ly, height, index, descriptor, priority);
    }

    /// Mode 3 length: a fixed fetch cost, the fine-scroll discard and a
    /// penalty per selected object.
    fn compute_render_cycles(&self) -> Cycles {
        RENDER_BASE_CYCLES
            + (self.scx & 0x07) as Cycles
            + RENDER_OBJECT_CYCLES * self.objects.len() as Cycles
    }

    /// LY == LYC comparison at a line boundary. The flag has to drop before
    /// the comparison can fire again.
    fn compare_line(&mut self) {
        if self.lyc_flag {
            self.lyc_flag = false;
            return;
        }
        if self.ly == self.lyc {
            self.lyc_flag = true;
            self.raise_stat(self.stat_enable.contains(StatEnable::LYC));
        }
    }

    fn vblank_stat_source(&self) -> bool {
        // Monochrome hardware also raises the OAM source as line 144 enters
        // vertical blank.
        self.stat_enable.contains(StatEnable::VBLANK)
            || (self.hardware.is_monochrome_compatible()
                && self.ly == VISIBLE_LINES
                && self.stat_enable.contains(StatEnable::OAM))
    }

    fn raise_stat(&mut self, source_enabled: bool) {
        if self.stat_rearm != StatRearm::PerScanline {
            return;
        }
        if source_enabled && !self.stat_latched {
            self.interrupts.request(Interrupt::LcdStat);
            self.stat_latched = true;
        }
    }

    fn stat_signal(&self) -> bool {
        let coincidence = self.lyc_flag && self.stat_enable.contains(StatEnable::LYC);
        let mode_signal = match self.mode {
            Mode::HBlank => self.stat_enable.contains(StatEnable::HBLANK),
            Mode::VBlank => self.vblank_stat_source(),
            Mode::OamSearch => self.stat_enable.contains(StatEnable::OAM),
            Mode::Transfer => false,
        };
        coincidence || mode_signal
    }

    fn update_stat_signal(&mut self) {
        let current = self.stat_signal();
        if current && !self.stat_line {
            self.interrupts.request(Interrupt::LcdStat);
        }
        self.stat_line = current;
    }
}

impl Pulse for Ppu {
    fn pulse(&mut self) {
        if !self.is_lcd_enabled() {
            return;
        }
        if self.budget.is_ready() {
            let (next, cycles) = self.transition();
            #[cfg(feature = "ppu-trace")]
            log::trace!(
                "[PPU] LY={:3} {:?} -> {:?} charge={}",
                self.ly,
                self.phase,
                next,
                cycles
            );
            self.phase = next;
            self.budget.charge(cycles);
            if self.stat_rearm == StatRearm::SignalEdge {
                self.update_stat_signal();
            }
        }
        self.budget.tick_one();
    }
}

impl BusDevice for Ppu {
    fn read(&mut self, addr: u16) -> u8 {
        self.read_reg(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write_reg(addr, value);
    }
}
