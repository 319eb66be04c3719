/// Master-clock cycle count. Signed so that a budget can run below zero
/// between transitions.
pub type Cycles = i64;

/// Cost of one processor bus access in master-clock cycles.
pub const MEMORY_ACCESS_CYCLES: Cycles = 4;

/// Cycle debt owned by a timed hardware unit.
///
/// A unit charges the duration of the operation it is about to perform and
/// then pays one cycle back on every master-clock pulse. While the debt is
/// positive the unit is busy; once it reaches zero the unit may run its next
/// transition. Every pulse follows the same convention:
///
/// ```text
/// if !budget.is_ready() { budget.tick_one(); return; }
/// let cycles = run_one_transition();
/// budget.charge(cycles);
/// budget.tick_one();
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleBudget {
    debt: Cycles,
}

impl CycleBudget {
    pub const fn new() -> Self {
        Self { debt: 0 }
    }

    /// Add the cost of the operation about to execute. The stored debt never
    /// drops below zero as a result of a charge, so zero and negative
    /// durations mean "ready again next pulse".
    #[inline]
    pub fn charge(&mut self, duration: Cycles) {
        self.debt = (self.debt + duration).max(0);
    }

    /// Pay back one cycle. Called unconditionally on every pulse.
    #[inline]
    pub fn tick_one(&mut self) {
        self.debt -= 1;
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.debt <= 0
    }

    /// Forget any outstanding debt.
    pub fn reset(&mut self) {
        self.debt = 0;
    }
}

/// A unit driven by the master clock.
pub trait Pulse {
    /// Advance by exactly one master-clock cycle.
    fn pulse(&mut self);

    /// Advance by `count` cycles. Must behave exactly like calling
    /// [`Pulse::pulse`] `count` times.
    fn pulse_n(&mut self, count: u64) {
        for _ in 0..count {
            self.pulse();
        }
    }
}
