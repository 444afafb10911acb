//! Footswitch debounce and autorepeat.
//!
//! Raw pin levels are sampled by [`SwitchBank::scan`], which turns them into at most one
//! [`SwitchId`] per call. Every comparison is made on elapsed time, so a press has to stay
//! down for longer than the debounce threshold before it counts.

use embedded_hal::digital::v2::InputPin;
use fugit::MillisDurationU32;

use crate::{
    time::{elapsed, TickLock},
    SwitchLayout, Timing,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchId {
    Up,
    Down,
    Mode,
}

impl SwitchId {
    /// Poll order. Earlier switches win when several qualify in the same pass.
    const PRIORITY: [SwitchId; 3] = [SwitchId::Up, SwitchId::Down, SwitchId::Mode];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Autorepeat {
    Off,
    On,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DebounceState {
    Released,
    PressedUnconfirmed,
    PressedConfirmed,
}

#[derive(Debug)]
struct Switch {
    state: DebounceState,
    down_since: u32,
    first_down: u32,
    /// Set when the pin took part in a two-switch Mode press. Cleared on release.
    suppressed: bool,
}

impl Switch {
    const fn new() -> Switch {
        Switch {
            state: DebounceState::Released,
            down_since: 0,
            first_down: 0,
            suppressed: false,
        }
    }

    /// Feed one sample. Returns true when the switch activates.
    fn update(&mut self, asserted: bool, now: u32, autorepeat: Autorepeat, timing: &Timing) -> bool {
        if !asserted {
            self.state = DebounceState::Released;
            self.suppressed = false;
            return false;
        }
        if self.suppressed {
            return false;
        }
        match self.state {
            DebounceState::Released => {
                self.state = DebounceState::PressedUnconfirmed;
                self.down_since = now;
                self.first_down = now;
                false
            }
            DebounceState::PressedUnconfirmed => {
                if elapsed(now, self.down_since) > timing.debounce {
                    self.state = DebounceState::PressedConfirmed;
                    self.down_since = now;
                    true
                } else {
                    false
                }
            }
            DebounceState::PressedConfirmed => {
                if autorepeat == Autorepeat::Off {
                    return false;
                }
                let period = if elapsed(now, self.first_down) > timing.repeat_fast_after {
                    timing.repeat_fast
                } else {
                    timing.repeat_slow
                };
                if elapsed(now, self.down_since) > period {
                    self.down_since = now;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn suppress(&mut self) {
        self.state = DebounceState::Released;
        self.suppressed = true;
    }
}

/// One sample of every footswitch input, true meaning pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PinLevels {
    pub up: bool,
    pub down: bool,
    pub mode: bool,
}

pub trait SwitchInputs {
    fn read(&mut self) -> PinLevels;
}

/// Active-low footswitch pins. Boards with two switches have no Mode pin.
pub struct FootswitchPins<U, D, M> {
    up: U,
    down: D,
    mode: Option<M>,
}

impl<U, D, M> FootswitchPins<U, D, M>
where
    U: InputPin,
    D: InputPin,
    M: InputPin,
{
    pub fn new(up: U, down: D, mode: Option<M>) -> Self {
        FootswitchPins { up, down, mode }
    }
}

impl<U, D, M> SwitchInputs for FootswitchPins<U, D, M>
where
    U: InputPin,
    D: InputPin,
    M: InputPin,
{
    fn read(&mut self) -> PinLevels {
        PinLevels {
            up: self.up.is_low().unwrap_or(false),
            down: self.down.is_low().unwrap_or(false),
            mode: self
                .mode
                .as_ref()
                .map(|pin| pin.is_low().unwrap_or(false))
                .unwrap_or(false),
        }
    }
}

/// Debounce state for the Up, Down and Mode switches.
#[derive(Debug)]
pub struct SwitchBank {
    switches: [Switch; 3],
    layout: SwitchLayout,
    timing: Timing,
}

impl SwitchBank {
    pub fn new(layout: SwitchLayout, timing: Timing) -> SwitchBank {
        SwitchBank {
            switches: [Switch::new(), Switch::new(), Switch::new()],
            layout,
            timing,
        }
    }

    /// Feed one sample of all pins taken at `now`. Returns the first switch in priority
    /// order that activates.
    pub fn poll(&mut self, now: u32, levels: PinLevels, autorepeat: Autorepeat) -> Option<SwitchId> {
        let mode = match self.layout {
            SwitchLayout::ThreeSwitch => levels.mode,
            SwitchLayout::TwoSwitch => {
                let combined = levels.up && levels.down;
                if combined {
                    self.switches[SwitchId::Up as usize].suppress();
                    self.switches[SwitchId::Down as usize].suppress();
                }
                combined
            }
        };
        for id in SwitchId::PRIORITY {
            let asserted = match id {
                SwitchId::Up => levels.up,
                SwitchId::Down => levels.down,
                SwitchId::Mode => mode,
            };
            if self.switches[id as usize].update(asserted, now, autorepeat, &self.timing) {
                trace!("[switch] activated id={}", id);
                return Some(id);
            }
        }
        None
    }

    /// Sample `inputs` until a switch activates, or until `timeout` has passed since the
    /// call. While the display is flashing, `refresh` is handed the current intensity on
    /// every pass.
    pub fn scan<T, I, F>(
        &mut self,
        ticks: &mut T,
        inputs: &mut I,
        autorepeat: Autorepeat,
        timeout: Option<MillisDurationU32>,
        mut refresh: F,
    ) -> Option<SwitchId>
    where
        T: TickLock,
        I: SwitchInputs,
        F: FnMut(u8),
    {
        let start = ticks.now();
        loop {
            let (now, level) = ticks.lock(|state| (state.time.now(), state.flash.refresh_level()));
            if let Some(timeout) = timeout {
                if elapsed(now, start) > timeout {
                    return None;
                }
            }
            if let Some(level) = level {
                refresh(level);
            }
            if let Some(id) = self.poll(now, inputs.read(), autorepeat) {
                return Some(id);
            }
        }
    }
}
