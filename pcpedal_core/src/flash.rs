use crate::{display::IntensityRange, Settings};

/// Drive level for the optional indicator LED.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorLevel {
    On,
    Off,
}

impl IndicatorLevel {
    fn from_lit(lit: bool) -> IndicatorLevel {
        if lit {
            IndicatorLevel::On
        } else {
            IndicatorLevel::Off
        }
    }
}

#[derive(Debug)]
struct Indicator {
    pulse_ms: u16,
    remaining: u16,
    /// Lit from power-on until start-up completes.
    boot_hold: bool,
    lit: bool,
}

/// Flashes the display (and indicator, when fitted) while an attention mode is active,
/// and gives a short activity pulse on the indicator otherwise. Ticked from the
/// millisecond interrupt.
#[derive(Debug)]
pub struct FlashController {
    armed: bool,
    period: u16,
    countdown: u16,
    levels: IntensityRange,
    intensity: u8,
    indicator: Option<Indicator>,
}

impl FlashController {
    pub fn new(settings: &Settings, levels: IntensityRange) -> FlashController {
        let timing = &settings.timing;
        let indicator = if settings.activity_indicator {
            Some(Indicator {
                pulse_ms: timing.activity_pulse.ticks() as u16,
                remaining: 0,
                boot_hold: true,
                lit: false,
            })
        } else {
            None
        };
        FlashController {
            armed: false,
            period: timing.flash_period.ticks() as u16,
            countdown: 0,
            levels,
            intensity: levels.max,
            indicator,
        }
    }

    pub fn start(&mut self) {
        debug!("[flash] start");
        self.armed = true;
        self.countdown = self.period;
        self.intensity = self.levels.max;
    }

    /// Disarm and return the intensity the display must be restored to.
    pub fn stop(&mut self) -> u8 {
        debug!("[flash] stop");
        self.armed = false;
        self.intensity = self.levels.max;
        self.intensity
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    /// Level the display should currently show, or `None` when not flashing.
    pub fn refresh_level(&self) -> Option<u8> {
        if self.armed {
            Some(self.intensity)
        } else {
            None
        }
    }

    /// One-shot activity pulse. Ignored while flashing, the indicator is busy
    /// following the display.
    pub fn pulse_indicator(&mut self) {
        if self.armed {
            return;
        }
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.remaining = indicator.pulse_ms;
        }
    }

    pub fn release_boot_hold(&mut self) {
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.boot_hold = false;
        }
    }

    /// Advance by one millisecond, returning the indicator level if it changed.
    pub fn tick(&mut self) -> Option<IndicatorLevel> {
        if self.armed {
            self.countdown = self.countdown.saturating_sub(1);
            if self.countdown == 0 {
                self.intensity = if self.intensity == self.levels.min {
                    self.levels.max
                } else {
                    self.levels.min
                };
                self.countdown = self.period;
            }
        }

        let armed = self.armed;
        let dim = self.intensity == self.levels.min;
        let indicator = self.indicator.as_mut()?;
        let lit = if armed {
            dim
        } else {
            let pulsing = indicator.remaining > 0;
            indicator.remaining = indicator.remaining.saturating_sub(1);
            indicator.boot_hold || pulsing
        };
        if lit == indicator.lit {
            return None;
        }
        indicator.lit = lit;
        Some(IndicatorLevel::from_lit(lit))
    }
}
