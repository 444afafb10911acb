//! Millisecond time base shared between the tick interrupt and the main loop.

use fugit::MillisDurationU32;

use crate::flash::{FlashController, IndicatorLevel};

/// Time elapsed between two readings of the free running counter. Correct across
/// counter roll-over because the subtraction wraps.
pub fn elapsed(now: u32, since: u32) -> MillisDurationU32 {
    MillisDurationU32::from_ticks(now.wrapping_sub(since))
}

/// Free running millisecond counter plus a countdown for blocking delays.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeBase {
    now: u32,
    delay_remaining: u16,
}

impl TimeBase {
    pub const fn new() -> TimeBase {
        TimeBase {
            now: 0,
            delay_remaining: 0,
        }
    }

    pub fn tick(&mut self) {
        self.now = self.now.wrapping_add(1);
        self.delay_remaining = self.delay_remaining.saturating_sub(1);
    }

    pub fn now(&self) -> u32 {
        self.now
    }

    pub fn start_delay(&mut self, ms: u16) {
        self.delay_remaining = ms;
    }

    pub fn delay_elapsed(&self) -> bool {
        self.delay_remaining == 0
    }
}

/// Everything the millisecond interrupt writes. The main loop only reaches it through a
/// [`TickLock`].
#[derive(Debug)]
pub struct TickState {
    pub time: TimeBase,
    pub flash: FlashController,
}

impl TickState {
    pub fn new(flash: FlashController) -> TickState {
        TickState {
            time: TimeBase::new(),
            flash,
        }
    }

    /// Advance by one millisecond. Returns a new level for the indicator LED when it
    /// has to change.
    pub fn tick(&mut self) -> Option<IndicatorLevel> {
        self.time.tick();
        self.flash.tick()
    }
}

/// Exclusive access to the [`TickState`], e.g. an RTIC resource lock. Implementations
/// must mask the tick interrupt for the duration of `f`.
pub trait TickLock {
    fn lock<R>(&mut self, f: impl FnOnce(&mut TickState) -> R) -> R;

    /// Current value of the millisecond counter.
    fn now(&mut self) -> u32 {
        self.lock(|ticks| ticks.time.now())
    }

    /// Busy wait for `duration`. Only one delay may be outstanding at a time.
    fn delay(&mut self, duration: MillisDurationU32) {
        let ms = duration.ticks().min(u16::MAX as u32) as u16;
        self.lock(|ticks| ticks.time.start_delay(ms));
        while !self.lock(|ticks| ticks.time.delay_elapsed()) {}
    }
}
