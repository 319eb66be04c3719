#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// Hardware compatibility mode the machine runs in.
///
/// Decides object draw priority and which CGB-only registers respond.
pub enum HardwareMode {
    /// Original monochrome Game Boy.
    #[default]
    Dmg,
    /// Game Boy Pocket / Light.
    Mgb,
    /// Game Boy Color running a colour cartridge.
    Cgb,
    /// Game Boy Color running a monochrome cartridge.
    CgbDmg,
}

impl HardwareMode {
    #[inline]
    /// Returns whether CGB-only registers (VBK, SVBK, OPRI) are live.
    pub const fn is_cgb(self) -> bool {
        matches!(self, HardwareMode::Cgb)
    }

    #[inline]
    /// Returns whether monochrome-era quirks apply.
    pub const fn is_monochrome_compatible(self) -> bool {
        !self.is_cgb()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// When the LCD status interrupt may fire again after it fired once.
pub enum StatRearm {
    /// At most one status interrupt is latched per scanline; the latch drops
    /// at every line boundary.
    #[default]
    PerScanline,
    /// The status sources are ORed into one signal and an interrupt fires on
    /// each low-to-high transition of that signal.
    SignalEdge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// Construction-time configuration shared by the units of one machine.
pub struct Config {
    pub mode: HardwareMode,
    pub stat_rearm: StatRearm,
}

impl Config {
    pub const fn new(mode: HardwareMode) -> Self {
        Self {
            mode,
            stat_rearm: StatRearm::PerScanline,
        }
    }

    pub const fn with_stat_rearm(mut self, stat_rearm: StatRearm) -> Self {
        self.stat_rearm = stat_rearm;
        self
    }
}
