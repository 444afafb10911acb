/// The two display back ends and the board's choice between them.
use defmt::warn;
use display_interface::DisplayError;
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};
use embedded_hal::{blocking::spi, digital::v2::OutputPin};
use pcpedal_core::{
    display::{segment, POSITIONS},
    DisplayBackend, Glyph, IntensityRange,
};
use ssd1306::prelude::Brightness;

use crate::peripherals::{OledDriver, SegmentCsPin, SegmentSpi};

type DisplayResult = Result<(), DisplayError>;

// each character is a 32x48 seven segment cell, spaced to fill the 128 pixel width
const CELL_PITCH: i32 = 48;
const CELL_Y: i32 = 8;
const CELL_WIDTH: u32 = 32;
const CELL_HEIGHT: u32 = 48;
const STROKE: u32 = 5;

const OLED_PRECHARGE: u8 = 0x2;
const OLED_INTENSITY: IntensityRange = IntensityRange::new(0x00, 0xFF);

/// Bar for each segment relative to the top left of its cell.
const SEGMENT_BARS: [(u8, Point, Size); 7] = [
    (segment::A, Point::new(4, 0), Size::new(24, STROKE)),
    (segment::B, Point::new(27, 4), Size::new(STROKE, 20)),
    (segment::C, Point::new(27, 24), Size::new(STROKE, 20)),
    (segment::D, Point::new(4, 43), Size::new(24, STROKE)),
    (segment::E, Point::new(0, 24), Size::new(STROKE, 20)),
    (segment::F, Point::new(0, 4), Size::new(STROKE, 20)),
    (segment::G, Point::new(4, 21), Size::new(24, STROKE)),
];

/// SSD1306 OLED drawing large seven segment characters.
pub struct OledDisplay {
    driver: OledDriver,
    intensity: Option<u8>,
}

impl OledDisplay {
    pub fn new(driver: OledDriver) -> Self {
        OledDisplay {
            driver,
            intensity: None,
        }
    }
}

impl DisplayBackend for OledDisplay {
    type Error = DisplayError;

    fn init(&mut self) -> DisplayResult {
        self.driver.init()?;
        self.clear()
    }

    fn clear(&mut self) -> DisplayResult {
        self.driver.clear();
        self.driver.flush()
    }

    fn draw_glyph(&mut self, position: u8, glyph: Glyph) -> DisplayResult {
        let origin = Point::new(position as i32 * CELL_PITCH, CELL_Y);
        Rectangle::new(origin, Size::new(CELL_WIDTH, CELL_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(&mut self.driver)?;
        let lit = glyph.segments();
        for (bit, offset, size) in SEGMENT_BARS {
            if lit & bit != 0 {
                Rectangle::new(origin + offset, size)
                    .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                    .draw(&mut self.driver)?;
            }
        }
        self.driver.flush()
    }

    fn set_intensity(&mut self, level: u8) -> DisplayResult {
        // called on every scan pass while flashing, skip the bus when nothing changed
        if self.intensity == Some(level) {
            return Ok(());
        }
        self.driver
            .set_brightness(Brightness::custom(OLED_PRECHARGE, level))?;
        self.intensity = Some(level);
        Ok(())
    }

    fn intensity_range(&self) -> IntensityRange {
        OLED_INTENSITY
    }
}

const REG_DIGIT0: u8 = 0x01;
const REG_DECODE_MODE: u8 = 0x09;
const REG_INTENSITY: u8 = 0x0A;
const REG_SCAN_LIMIT: u8 = 0x0B;
const REG_SHUTDOWN: u8 = 0x0C;
const REG_DISPLAY_TEST: u8 = 0x0F;

const SEGMENT_INTENSITY: IntensityRange = IntensityRange::new(0x00, 0x0C);

/// MAX7219 driving three seven segment digits without BCD decoding. Digit 0 is wired
/// rightmost.
pub struct SegmentDisplay<SPI, CS> {
    spi: SPI,
    cs: CS,
    intensity: Option<u8>,
}

impl<SPI, CS> SegmentDisplay<SPI, CS>
where
    SPI: spi::Write<u8>,
    CS: OutputPin,
{
    pub fn new(spi: SPI, mut cs: CS) -> Self {
        if cs.set_high().is_err() {
            warn!("[display] chip select set_high failed");
        }
        SegmentDisplay {
            spi,
            cs,
            intensity: None,
        }
    }

    fn write_register(&mut self, register: u8, data: u8) -> DisplayResult {
        self.cs.set_low().map_err(|_| DisplayError::CSError)?;
        let written = self
            .spi
            .write(&[register, data])
            .map_err(|_| DisplayError::BusWriteError);
        // data is latched on the rising edge of CS
        self.cs.set_high().map_err(|_| DisplayError::CSError)?;
        written
    }
}

impl<SPI, CS> DisplayBackend for SegmentDisplay<SPI, CS>
where
    SPI: spi::Write<u8>,
    CS: OutputPin,
{
    type Error = DisplayError;

    fn init(&mut self) -> DisplayResult {
        self.write_register(REG_DISPLAY_TEST, 0x00)?;
        self.write_register(REG_SCAN_LIMIT, POSITIONS - 1)?;
        self.write_register(REG_DECODE_MODE, 0x00)?;
        self.set_intensity(SEGMENT_INTENSITY.max)?;
        self.clear()?;
        self.write_register(REG_SHUTDOWN, 0x01)
    }

    fn clear(&mut self) -> DisplayResult {
        for position in 0..POSITIONS {
            self.draw_glyph(position, Glyph::Blank)?;
        }
        Ok(())
    }

    fn draw_glyph(&mut self, position: u8, glyph: Glyph) -> DisplayResult {
        if position >= POSITIONS {
            return Err(DisplayError::OutOfBoundsError);
        }
        self.write_register(REG_DIGIT0 + (POSITIONS - 1 - position), glyph.segments())
    }

    fn set_intensity(&mut self, level: u8) -> DisplayResult {
        if self.intensity == Some(level) {
            return Ok(());
        }
        self.write_register(REG_INTENSITY, level.min(SEGMENT_INTENSITY.max))?;
        self.intensity = Some(level);
        Ok(())
    }

    fn intensity_range(&self) -> IntensityRange {
        SEGMENT_INTENSITY
    }
}

/// The display fitted to this board, picked by `config::DISPLAY_KIND`.
pub enum Display {
    Oled(OledDisplay),
    Segment(SegmentDisplay<SegmentSpi, SegmentCsPin>),
}

impl DisplayBackend for Display {
    type Error = DisplayError;

    fn init(&mut self) -> DisplayResult {
        match self {
            Display::Oled(display) => display.init(),
            Display::Segment(display) => display.init(),
        }
    }

    fn clear(&mut self) -> DisplayResult {
        match self {
            Display::Oled(display) => display.clear(),
            Display::Segment(display) => display.clear(),
        }
    }

    fn draw_glyph(&mut self, position: u8, glyph: Glyph) -> DisplayResult {
        match self {
            Display::Oled(display) => display.draw_glyph(position, glyph),
            Display::Segment(display) => display.draw_glyph(position, glyph),
        }
    }

    fn set_intensity(&mut self, level: u8) -> DisplayResult {
        match self {
            Display::Oled(display) => display.set_intensity(level),
            Display::Segment(display) => display.set_intensity(level),
        }
    }

    fn intensity_range(&self) -> IntensityRange {
        match self {
            Display::Oled(display) => display.intensity_range(),
            Display::Segment(display) => display.intensity_range(),
        }
    }
}
