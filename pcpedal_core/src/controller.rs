//! Operating modes of the pedal.
//!
//! [`Controller`] owns every hardware collaborator and runs one blocking transition per
//! [`Controller::step`]. State written by the millisecond interrupt is only reached
//! through the [`TickLock`] passed in.

use embedded_hal::serial::Write;
use fugit::MillisDurationU32;

use crate::{
    config::{ByteStorage, ConfigStore, MidiConfig, SaveOutcome, StorageError},
    display::{self, DisplayBackend},
    midi,
    patch::PatchSelection,
    switch::{Autorepeat, SwitchBank, SwitchId, SwitchInputs},
    time::TickLock,
    Settings,
};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Power-up: settle the display, load the config, look for a held switch.
    Startup,
    /// Up and Down step through patches, sending each one.
    Normal,
    /// Up and Down move a candidate patch without sending it. Mode sends it.
    Jump { candidate: PatchSelection },
    /// Up and Down change the MIDI channel, Mode cycles the patch range.
    ConfigChannel,
    /// Up or Down toggle between showing patch numbers zero- or one-based.
    ConfigDisplay,
}

pub struct Controller<P, D, W, S> {
    pins: P,
    display: D,
    serial: W,
    store: ConfigStore<S>,
    switches: SwitchBank,
    settings: Settings,
    config: MidiConfig,
    selection: PatchSelection,
    mode: Mode,
    storage_fault: bool,
}

impl<P, D, W, S> Controller<P, D, W, S>
where
    P: SwitchInputs,
    D: DisplayBackend,
    W: Write<u8>,
    S: ByteStorage,
{
    pub fn new(settings: Settings, pins: P, display: D, serial: W, storage: S) -> Self {
        Controller {
            pins,
            display,
            serial,
            store: ConfigStore::new(storage),
            switches: SwitchBank::new(settings.layout, settings.timing),
            settings,
            config: MidiConfig::default(),
            selection: PatchSelection::default(),
            mode: Mode::Startup,
            storage_fault: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> MidiConfig {
        self.config
    }

    pub fn selection(&self) -> PatchSelection {
        self.selection
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Latched once any storage read, write or verify has failed.
    pub fn storage_fault(&self) -> bool {
        self.storage_fault
    }

    pub fn run<T: TickLock>(&mut self, ticks: &mut T) -> ! {
        loop {
            self.step(ticks);
        }
    }

    /// Wait for the next event in the current mode and act on it.
    pub fn step<T: TickLock>(&mut self, ticks: &mut T) -> Mode {
        let next = match self.mode {
            Mode::Startup => self.startup(ticks),
            Mode::Normal => self.normal(ticks),
            Mode::Jump { candidate } => self.jump(ticks, candidate),
            Mode::ConfigChannel => self.config_channel(ticks),
            Mode::ConfigDisplay => self.config_display(ticks),
        };
        if next != self.mode {
            debug!("[controller] mode={}", next);
        }
        self.mode = next;
        next
    }

    fn startup<T: TickLock>(&mut self, ticks: &mut T) -> Mode {
        info!("[controller] startup");
        ticks.delay(self.settings.timing.display_power_up);
        let init = self.display.init().and_then(|_| self.display.clear());
        self.check_display(init);

        self.config = match self.store.load() {
            Ok(config) => config,
            Err(err) => {
                self.storage_error(err);
                MidiConfig::default()
            }
        };
        self.selection = PatchSelection::new(self.config.range);
        info!(
            "[controller] config channel={} range={} zero_based={}",
            self.config.channel,
            self.config.range.index(),
            self.config.zero_based
        );

        let startup_window = self.settings.timing.startup_window;
        match self.scan(ticks, Autorepeat::Off, Some(startup_window)) {
            None => self.enter_normal(ticks),
            Some(SwitchId::Down) => {
                ticks.lock(|state| state.flash.start());
                let result = display::show_display_convention(&mut self.display, self.config.zero_based);
                self.check_display(result);
                Mode::ConfigDisplay
            }
            Some(_) => {
                ticks.lock(|state| state.flash.start());
                self.show_channel();
                Mode::ConfigChannel
            }
        }
    }

    fn config_channel<T: TickLock>(&mut self, ticks: &mut T) -> Mode {
        let config_idle = self.settings.timing.config_idle;
        match self.scan(ticks, Autorepeat::Off, Some(config_idle)) {
            None => return self.finish_config(ticks),
            Some(SwitchId::Up) => self.config.next_channel(),
            Some(SwitchId::Down) => self.config.previous_channel(),
            Some(SwitchId::Mode) => self.config.range = self.config.range.next(),
        }
        self.show_channel();
        Mode::ConfigChannel
    }

    fn config_display<T: TickLock>(&mut self, ticks: &mut T) -> Mode {
        let config_idle = self.settings.timing.config_idle;
        match self.scan(ticks, Autorepeat::Off, Some(config_idle)) {
            Some(SwitchId::Up) | Some(SwitchId::Down) => {
                self.config.zero_based = !self.config.zero_based;
                let result = display::show_display_convention(&mut self.display, self.config.zero_based);
                self.check_display(result);
                Mode::ConfigDisplay
            }
            Some(SwitchId::Mode) | None => self.finish_config(ticks),
        }
    }

    fn finish_config<T: TickLock>(&mut self, ticks: &mut T) -> Mode {
        self.stop_flash(ticks);
        match self.store.save(&self.config) {
            Ok(SaveOutcome::Written) => info!("[controller] config saved"),
            Ok(SaveOutcome::Unchanged) => (),
            Err(err) => self.storage_error(err),
        }
        self.selection.set_range(self.config.range);
        self.enter_normal(ticks)
    }

    fn enter_normal<T: TickLock>(&mut self, ticks: &mut T) -> Mode {
        if self.settings.restore_last_patch {
            match self.store.load_last_patch() {
                Ok(patch) => self.selection.restore(patch),
                Err(err) => self.storage_error(err),
            }
        }
        self.show_patch(self.selection.patch());
        ticks.lock(|state| state.flash.release_boot_hold());
        info!("[controller] ready patch={}", self.selection.patch());
        Mode::Normal
    }

    fn normal<T: TickLock>(&mut self, ticks: &mut T) -> Mode {
        match self.scan(ticks, Autorepeat::Off, None) {
            Some(SwitchId::Up) => {
                self.selection.increment();
                self.send_patch(ticks);
                Mode::Normal
            }
            Some(SwitchId::Down) => {
                self.selection.decrement();
                self.send_patch(ticks);
                Mode::Normal
            }
            Some(SwitchId::Mode) => {
                ticks.lock(|state| state.flash.start());
                Mode::Jump {
                    candidate: self.selection,
                }
            }
            None => Mode::Normal,
        }
    }

    fn jump<T: TickLock>(&mut self, ticks: &mut T, mut candidate: PatchSelection) -> Mode {
        match self.scan(ticks, Autorepeat::On, None) {
            Some(SwitchId::Up) => candidate.increment(),
            Some(SwitchId::Down) => candidate.decrement(),
            Some(SwitchId::Mode) => {
                self.selection = candidate;
                // the indicator only takes an activity pulse once flashing has stopped
                self.stop_flash(ticks);
                self.send_patch(ticks);
                return Mode::Normal;
            }
            None => (),
        }
        self.show_patch(candidate.patch());
        Mode::Jump { candidate }
    }

    /// Transmit the active patch, persist it when enabled and show it.
    fn send_patch<T: TickLock>(&mut self, ticks: &mut T) {
        ticks.lock(|state| state.flash.pulse_indicator());
        let patch = self.selection.patch();
        if midi::send_patch(
            &mut self.serial,
            self.config.channel,
            patch,
            self.selection.range(),
            self.settings.send_bank_select,
        )
        .is_err()
        {
            error!("[controller] midi write failed patch={}", patch);
        }
        if self.settings.restore_last_patch {
            if let Err(err) = self.store.save_last_patch(patch) {
                self.storage_error(err);
            }
        }
        self.show_patch(patch);
    }

    fn scan<T: TickLock>(
        &mut self,
        ticks: &mut T,
        autorepeat: Autorepeat,
        timeout: Option<MillisDurationU32>,
    ) -> Option<SwitchId> {
        let display = &mut self.display;
        self.switches
            .scan(ticks, &mut self.pins, autorepeat, timeout, |level| {
                if display.set_intensity(level).is_err() {
                    warn!("[controller] set_intensity failed level={}", level);
                }
            })
    }

    fn stop_flash<T: TickLock>(&mut self, ticks: &mut T) {
        let max = ticks.lock(|state| state.flash.stop());
        let result = self.display.set_intensity(max);
        self.check_display(result);
    }

    fn show_patch(&mut self, patch: u16) {
        let result = display::show_patch(&mut self.display, patch, self.config.zero_based);
        self.check_display(result);
    }

    fn show_channel(&mut self) {
        let result = self
            .display
            .show_channel_and_range(self.config.channel, self.config.range);
        self.check_display(result);
    }

    fn check_display(&mut self, result: Result<(), D::Error>) {
        if result.is_err() {
            error!("[controller] display write failed");
        }
    }

    fn storage_error(&mut self, err: StorageError<S::Error>) {
        match err {
            StorageError::Bus(_) => error!("[controller] storage bus error"),
            StorageError::VerifyFailure { offset, .. } => {
                error!("[controller] storage verify failed offset={}", offset)
            }
        }
        self.storage_fault = true;
    }
}
