#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod config;
pub mod controller;
pub mod display;
pub mod flash;
pub mod midi;
pub mod patch;
pub mod switch;
pub mod time;

#[cfg(test)]
mod sim;

pub use config::{ConfigStore, MidiConfig, StorageError};
pub use controller::{Controller, Mode};
pub use display::{DisplayBackend, Glyph, IntensityRange};
pub use flash::{FlashController, IndicatorLevel};
pub use patch::{PatchRange, PatchSelection};
pub use switch::{Autorepeat, FootswitchPins, PinLevels, SwitchBank, SwitchId, SwitchInputs};
pub use time::{TickLock, TickState, TimeBase};

use fugit::MillisDurationU32;

/// Timing constants for switch handling, display flashing and mode timeouts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    /// A switch must read down for longer than this before it activates.
    pub debounce: MillisDurationU32,
    pub repeat_slow: MillisDurationU32,
    pub repeat_fast: MillisDurationU32,
    /// Hold time after which autorepeat switches from the slow to the fast period.
    pub repeat_fast_after: MillisDurationU32,
    pub flash_period: MillisDurationU32,
    pub activity_pulse: MillisDurationU32,
    /// How long a switch held at power-up is looked for.
    pub startup_window: MillisDurationU32,
    /// Configuration modes exit after this long without a switch activation.
    pub config_idle: MillisDurationU32,
    /// Both display drivers need time after power-up before they accept commands.
    pub display_power_up: MillisDurationU32,
}

impl Timing {
    pub const fn new() -> Timing {
        Timing {
            debounce: MillisDurationU32::millis(50),
            repeat_slow: MillisDurationU32::millis(300),
            repeat_fast: MillisDurationU32::millis(60),
            repeat_fast_after: MillisDurationU32::millis(1000),
            flash_period: MillisDurationU32::millis(150),
            activity_pulse: MillisDurationU32::millis(150),
            startup_window: MillisDurationU32::millis(100),
            config_idle: MillisDurationU32::millis(3000),
            display_power_up: MillisDurationU32::millis(500),
        }
    }
}

impl Default for Timing {
    fn default() -> Timing {
        Timing::new()
    }
}

/// Physical footswitch arrangement.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchLayout {
    /// Up and Down only, Mode is both pressed together.
    #[default]
    TwoSwitch,
    ThreeSwitch,
}

/// Board options, fixed when the firmware is composed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub layout: SwitchLayout,
    /// Send a bank select before every program change, not only for extended ranges.
    pub send_bank_select: bool,
    /// Persist the last sent patch and restore it at power-up.
    pub restore_last_patch: bool,
    /// An external LED is fitted for activity and flash indication.
    pub activity_indicator: bool,
    pub timing: Timing,
}

impl Settings {
    pub const fn new() -> Settings {
        Settings {
            layout: SwitchLayout::TwoSwitch,
            send_bank_select: true,
            restore_last_patch: false,
            activity_indicator: false,
            timing: Timing::new(),
        }
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings::new()
    }
}
