/// Device initialisation and interfacing.
use fugit::{HertzU32, RateExtU32};
use pcpedal_core::{Controller, FootswitchPins, SwitchLayout};
use rp2040_hal::clocks::PeripheralClock;
use rp_pico::{
    hal::{
        clocks::{self, Clock},
        gpio::{
            pin::bank0::{
                Gpio10, Gpio11, Gpio12, Gpio16, Gpio17, Gpio21, Gpio25, Gpio26, Gpio27, Gpio4,
                Gpio5, Gpio7,
            },
            FunctionI2C, FunctionSpi, FunctionUart, Pin, PullUpInput, PushPullOutput,
        },
        pac::{self, I2C0, I2C1, RESETS, SPI0, TIMER, UART0},
        sio::Sio,
        spi::Enabled,
        timer::{monotonic::Monotonic, Alarm0, Alarm1},
        uart::{DataBits, StopBits, UartConfig, UartPeripheral, Writer},
        Spi, Timer, Watchdog, I2C,
    },
    Pins, XOSC_CRYSTAL_FREQ,
};
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

use crate::{
    config::{DisplayKind, DISPLAY_KIND, EEPROM_ADDRESS, SETTINGS},
    display::{Display, OledDisplay, SegmentDisplay},
    eeprom::Eeprom24x,
};

// type alias for UART pins
type MidiOutUartPin = Pin<Gpio16, FunctionUart>;
type MidiInUartPin = Pin<Gpio17, FunctionUart>;
type MidiUartPins = (MidiOutUartPin, MidiInUartPin);

pub type MidiWriter = Writer<UART0, MidiUartPins>;

// type alias for OLED pins
type DisplaySdaPin = Pin<Gpio26, FunctionI2C>;
type DisplaySclPin = Pin<Gpio27, FunctionI2C>;
pub type DisplayPins = (DisplaySdaPin, DisplaySclPin);

pub type OledDriver = Ssd1306<
    I2CInterface<I2C<I2C1, DisplayPins>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

pub type SegmentSpi = Spi<Enabled, SPI0, 8>;
pub type SegmentCsPin = Pin<Gpio21, PushPullOutput>;

// type alias for EEPROM pins
type EepromSdaPin = Pin<Gpio4, FunctionI2C>;
type EepromSclPin = Pin<Gpio5, FunctionI2C>;
type EepromWriteProtectPin = Pin<Gpio7, PushPullOutput>;
pub type Eeprom = Eeprom24x<I2C<I2C0, (EepromSdaPin, EepromSclPin)>, EepromWriteProtectPin>;

// type alias for footswitch pins
type FootswitchUpPin = Pin<Gpio10, PullUpInput>;
type FootswitchDownPin = Pin<Gpio11, PullUpInput>;
type FootswitchModePin = Pin<Gpio12, PullUpInput>;
pub type Footswitches = FootswitchPins<FootswitchUpPin, FootswitchDownPin, FootswitchModePin>;

pub type IndicatorLedPin = Pin<Gpio25, PushPullOutput>;

pub type TickAlarm = Alarm1;

/// Everything the main loop drives.
pub type Pedal = Controller<Footswitches, Display, MidiWriter, Eeprom>;

pub fn setup(
    mut pac: pac::Peripherals,
) -> (
    Footswitches,
    Display,
    MidiWriter,
    Eeprom,
    IndicatorLedPin,
    TickAlarm,
    Monotonic<Alarm0>,
) {
    // setup gpio pins
    let sio = Sio::new(pac.SIO);
    let pins = Pins::new(
        pac.IO_BANK0,
        pac.PADS_BANK0,
        sio.gpio_bank0,
        &mut pac.RESETS,
    );

    // setup clocks
    let mut watchdog = Watchdog::new(pac.WATCHDOG);
    let clocks = clocks::init_clocks_and_plls(
        XOSC_CRYSTAL_FREQ,
        pac.XOSC,
        pac.CLOCKS,
        pac.PLL_SYS,
        pac.PLL_USB,
        &mut pac.RESETS,
        &mut watchdog,
    )
    .ok()
    .expect("init: init_clocks_and_plls(...) should succeed");

    let midi_out = new_midi_uart(
        pac.UART0,
        pins.gpio16.into_mode::<FunctionUart>(),
        pins.gpio17.into_mode::<FunctionUart>(),
        &mut pac.RESETS,
        clocks.peripheral_clock.freq(),
    );

    let display = match DISPLAY_KIND {
        DisplayKind::Oled => Display::Oled(OledDisplay::new(new_oled(
            pac.I2C1,
            pins.gpio26.into_mode::<FunctionI2C>(),
            pins.gpio27.into_mode::<FunctionI2C>(),
            &mut pac.RESETS,
            &clocks.peripheral_clock,
        ))),
        DisplayKind::Segment => {
            let _spi_sclk = pins.gpio18.into_mode::<FunctionSpi>();
            let _spi_mosi = pins.gpio19.into_mode::<FunctionSpi>();
            let spi = Spi::<_, _, 8>::new(pac.SPI0).init(
                &mut pac.RESETS,
                clocks.peripheral_clock.freq(),
                1.MHz(),
                &embedded_hal::spi::MODE_0,
            );
            Display::Segment(SegmentDisplay::new(spi, pins.gpio21.into_push_pull_output()))
        }
    };

    let eeprom_i2c = I2C::i2c0(
        pac.I2C0,
        pins.gpio4.into_mode::<FunctionI2C>(),
        pins.gpio5.into_mode::<FunctionI2C>(),
        400.kHz(),
        &mut pac.RESETS,
        &clocks.peripheral_clock,
    );
    let eeprom = Eeprom24x::new(eeprom_i2c, EEPROM_ADDRESS, pins.gpio7.into_push_pull_output());

    // footswitches pull to ground when pressed
    let mode_pin = match SETTINGS.layout {
        SwitchLayout::ThreeSwitch => Some(pins.gpio12.into_pull_up_input()),
        SwitchLayout::TwoSwitch => None,
    };
    let footswitches = FootswitchPins::new(
        pins.gpio10.into_pull_up_input(),
        pins.gpio11.into_pull_up_input(),
        mode_pin,
    );

    let indicator_led = pins.led.into_push_pull_output();

    let (tick_alarm, monotonic_timer) = new_timers(pac.TIMER, &mut pac.RESETS);

    (
        footswitches,
        display,
        midi_out,
        eeprom,
        indicator_led,
        tick_alarm,
        monotonic_timer,
    )
}

fn new_timers(timer: TIMER, resets: &mut RESETS) -> (TickAlarm, Monotonic<Alarm0>) {
    let mut timer = Timer::new(timer, resets);
    let tick_alarm = timer
        .alarm_1()
        .expect("init: timer.alarm_1() should succeed");
    // setup monotonic timer for rtic
    let monotonic_alarm = timer
        .alarm_0()
        .expect("init: timer.alarm_0() should succeed");
    (tick_alarm, Monotonic::new(timer, monotonic_alarm))
}

fn new_midi_uart(
    uart: UART0,
    out_pin: MidiOutUartPin,
    in_pin: MidiInUartPin,
    resets: &mut RESETS,
    peripheral_clock_freq: HertzU32,
) -> MidiWriter {
    let midi_uart_pins = (out_pin, in_pin);
    let uart_config = UartConfig::new(31_250.Hz(), DataBits::Eight, None, StopBits::One);
    let midi_uart = UartPeripheral::new(uart, midi_uart_pins, resets)
        .enable(uart_config, peripheral_clock_freq)
        .expect("enabling uart for midi should succeed");
    // nothing is received, the reader half is dropped
    let (_midi_reader, midi_writer) = midi_uart.split();
    midi_writer
}

fn new_oled(
    i2c: I2C1,
    sda_pin: DisplaySdaPin,
    scl_pin: DisplaySclPin,
    resets: &mut RESETS,
    peripheral_clock: &PeripheralClock,
) -> OledDriver {
    let i2c_bus = I2C::i2c1(i2c, sda_pin, scl_pin, 400.kHz(), resets, peripheral_clock);

    // initialised later, once the panel has had time to power up
    Ssd1306::new(
        I2CDisplayInterface::new(i2c_bus),
        DisplaySize128x64,
        DisplayRotation::Rotate0,
    )
    .into_buffered_graphics_mode()
}
