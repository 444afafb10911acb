#![no_std]
#![no_main]

mod config;
mod display;
mod eeprom;
mod peripherals;

use panic_probe as _;

// RTIC app module: a 1ms timer task owns the time base and flash cadence, the idle task
// runs the pedal's blocking state machine
#[rtic::app(device = rp_pico::hal::pac, peripherals = true)]
mod app {
    use defmt::{self, error, info};
    use defmt_rtt as _;
    use embedded_hal::digital::v2::OutputPin;
    use fugit::MicrosDurationU32;
    use pcpedal_core::{DisplayBackend, FlashController, IndicatorLevel, TickLock, TickState};
    use rp_pico::hal::timer::{monotonic::Monotonic, Alarm, Alarm0};

    use crate::{
        config::SETTINGS,
        peripherals::{setup, IndicatorLedPin, Pedal, TickAlarm},
    };

    const TICK_INTERVAL: MicrosDurationU32 = MicrosDurationU32::millis(1);

    /// Define RTIC monotonic timer. Also used for defmt.
    #[monotonic(binds = TIMER_IRQ_0, default = true)]
    type TimerMonotonic = Monotonic<Alarm0>;

    /// RTIC shared resources.
    #[shared]
    struct Shared {
        /// Millisecond counter, delay countdown and flash state. Written only by `tick`.
        ticks: TickState,
    }

    /// RTIC local resources.
    #[local]
    struct Local {
        /// Switches, display, MIDI out and config store, driven from idle.
        pedal: Pedal,

        tick_alarm: TickAlarm,

        indicator_led: IndicatorLedPin,
    }

    /// RTIC init method sets up the hardware and initialises shared and local resources.
    #[init]
    fn init(ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        info!("[init] hello world!");

        // configure RTIC monotonic as source of timestamps for defmt
        defmt::timestamp!("{=u64:us}", {
            monotonics::now().duration_since_epoch().to_micros()
        });

        let (footswitches, display, midi_writer, eeprom, indicator_led, mut tick_alarm, monotonic_timer) =
            setup(ctx.device);

        let ticks = TickState::new(FlashController::new(&SETTINGS, display.intensity_range()));
        let pedal = Pedal::new(
            SETTINGS,
            footswitches,
            display,
            midi_writer,
            eeprom,
        );

        // start the 1ms tick
        tick_alarm
            .schedule(TICK_INTERVAL)
            .expect("tick_alarm.schedule should succeed");
        tick_alarm.enable_interrupt();

        info!("[init] complete");

        (
            Shared { ticks },
            Local {
                pedal,
                tick_alarm,
                indicator_led,
            },
            init::Monotonics(monotonic_timer),
        )
    }

    /// Advance the time base and flash cadence, and drive the indicator LED.
    #[task(
        binds = TIMER_IRQ_1,
        priority = 2,
        shared = [ticks],
        local = [tick_alarm, indicator_led]
    )]
    fn tick(mut ctx: tick::Context) {
        ctx.local.tick_alarm.clear_interrupt();
        let _ = ctx.local.tick_alarm.schedule(TICK_INTERVAL);

        if let Some(level) = ctx.shared.ticks.lock(|ticks| ticks.tick()) {
            let result = match level {
                IndicatorLevel::On => ctx.local.indicator_led.set_high(),
                IndicatorLevel::Off => ctx.local.indicator_led.set_low(),
            };
            if result.is_err() {
                error!("[tick] indicator_led write failed");
            }
        }
    }

    /// The pedal busy-waits on the shared tick state, so it runs as idle rather than
    /// letting RTIC wfi() (which also keeps rtt working).
    #[idle(shared = [ticks], local = [pedal])]
    fn task_main(ctx: task_main::Context) -> ! {
        let mut ticks = SharedTicks(ctx.shared.ticks);
        ctx.local.pedal.run(&mut ticks)
    }

    /// Lends the RTIC resource proxy to the core as a [`TickLock`].
    struct SharedTicks<M>(M);

    impl<M> TickLock for SharedTicks<M>
    where
        M: rtic::Mutex<T = TickState>,
    {
        fn lock<R>(&mut self, f: impl FnOnce(&mut TickState) -> R) -> R {
            self.0.lock(f)
        }
    }
}
