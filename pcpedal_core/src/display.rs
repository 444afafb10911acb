//! The 3-character field shown by either display back end.

use crate::patch::PatchRange;

/// Number of character positions. Position 0 is leftmost.
pub const POSITIONS: u8 = 3;

/// Lowest and highest brightness a back end supports.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntensityRange {
    pub min: u8,
    pub max: u8,
}

impl IntensityRange {
    pub const fn new(min: u8, max: u8) -> IntensityRange {
        IntensityRange { min, max }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Glyph {
    Digit(u8),
    Blank,
    /// Marker for a patch range, drawn as c, cc, C, u or U.
    Range(PatchRange),
}

/// Seven segment encoding, one bit per segment: dp A B C D E F G from the MSB down.
pub mod segment {
    pub const DP: u8 = 0x80;
    pub const A: u8 = 0x40;
    pub const B: u8 = 0x20;
    pub const C: u8 = 0x10;
    pub const D: u8 = 0x08;
    pub const E: u8 = 0x04;
    pub const F: u8 = 0x02;
    pub const G: u8 = 0x01;
}

const DIGIT_SEGMENTS: [u8; 10] = [0x7E, 0x30, 0x6D, 0x79, 0x33, 0x5B, 0x5F, 0x70, 0x7F, 0x7B];

/// Markers for the five ranges: c, raised c, C, u, U.
const RANGE_SEGMENTS: [u8; 5] = [0x0D, 0x43, 0x4E, 0x1C, 0x3E];

impl Glyph {
    /// Segments to light for this glyph. Digits above 9 are drawn blank.
    pub fn segments(&self) -> u8 {
        match *self {
            Glyph::Digit(d) => DIGIT_SEGMENTS.get(d as usize).copied().unwrap_or(0),
            Glyph::Blank => 0,
            Glyph::Range(range) => RANGE_SEGMENTS[range.index() as usize],
        }
    }
}

pub trait DisplayBackend {
    type Error;

    /// Must be called once after the power-up settle delay.
    fn init(&mut self) -> Result<(), Self::Error>;

    fn clear(&mut self) -> Result<(), Self::Error>;

    fn draw_glyph(&mut self, position: u8, glyph: Glyph) -> Result<(), Self::Error>;

    fn set_intensity(&mut self, level: u8) -> Result<(), Self::Error>;

    fn intensity_range(&self) -> IntensityRange;

    /// Channel screen: one-based channel in positions 0-1, range marker in position 2.
    fn show_channel_and_range(&mut self, channel: u8, range: PatchRange) -> Result<(), Self::Error> {
        for (position, glyph) in channel_glyphs(channel, range).into_iter().enumerate() {
            self.draw_glyph(position as u8, glyph)?;
        }
        Ok(())
    }
}

/// Right-aligned decimal with blank padding. The units digit is always drawn.
pub fn number_glyphs(value: u16) -> [Glyph; POSITIONS as usize] {
    let mut glyphs = [Glyph::Blank; POSITIONS as usize];
    let mut remaining = value % 1000;
    for (i, glyph) in glyphs.iter_mut().rev().enumerate() {
        if i > 0 && remaining == 0 {
            break;
        }
        *glyph = Glyph::Digit((remaining % 10) as u8);
        remaining /= 10;
    }
    glyphs
}

pub fn channel_glyphs(channel: u8, range: PatchRange) -> [Glyph; POSITIONS as usize] {
    let shown = (channel & 0x0F) + 1;
    let tens = if shown >= 10 {
        Glyph::Digit(1)
    } else {
        Glyph::Blank
    };
    [tens, Glyph::Digit(shown % 10), Glyph::Range(range)]
}

/// Draw a patch number, shifted to one-based unless the zero-based convention is on.
pub fn show_patch<D: DisplayBackend>(display: &mut D, patch: u16, zero_based: bool) -> Result<(), D::Error> {
    let shown = if zero_based { patch } else { patch + 1 };
    for (position, glyph) in number_glyphs(shown).into_iter().enumerate() {
        display.draw_glyph(position as u8, glyph)?;
    }
    Ok(())
}

/// Display-convention screen: 0 when zero-based, 1 otherwise, in the rightmost position.
pub fn show_display_convention<D: DisplayBackend>(display: &mut D, zero_based: bool) -> Result<(), D::Error> {
    display.clear()?;
    display.draw_glyph(POSITIONS - 1, Glyph::Digit(if zero_based { 0 } else { 1 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingDisplay;

    #[test]
    fn number_glyphs_should_right_align_with_blank_padding() {
        use Glyph::*;
        assert_eq!([Blank, Blank, Digit(0)], number_glyphs(0));
        assert_eq!([Blank, Blank, Digit(7)], number_glyphs(7));
        assert_eq!([Blank, Digit(4), Digit(2)], number_glyphs(42));
        assert_eq!([Digit(1), Digit(0), Digit(0)], number_glyphs(100));
        assert_eq!([Digit(9), Digit(9), Digit(9)], number_glyphs(999));
    }

    #[test]
    fn glyph_segments_should_match_seven_segment_layout() {
        use segment::*;
        assert_eq!(A | B | C | D | E | F, Glyph::Digit(0).segments());
        assert_eq!(B | C, Glyph::Digit(1).segments());
        assert_eq!(A | B | G | E | D, Glyph::Digit(2).segments());
        assert_eq!(0, Glyph::Blank.segments());
        assert_eq!(0, Glyph::Digit(10).segments());
        assert_eq!(G | E | D, Glyph::Range(PatchRange::from_stored(0)).segments());
        assert_eq!(A | F | G, Glyph::Range(PatchRange::from_stored(1)).segments());
        assert_eq!(B | C | D | E | F, Glyph::Range(PatchRange::from_stored(4)).segments());
        for range in 0..5 {
            assert_eq!(0, Glyph::Range(PatchRange::from_stored(range)).segments() & DP);
        }
    }

    #[test]
    fn channel_glyphs_should_show_one_based_channel() {
        use Glyph::*;
        let range = PatchRange::from_stored(2);
        assert_eq!([Blank, Digit(1), Range(range)], channel_glyphs(0, range));
        assert_eq!([Blank, Digit(9), Range(range)], channel_glyphs(8, range));
        assert_eq!([Digit(1), Digit(0), Range(range)], channel_glyphs(9, range));
        assert_eq!([Digit(1), Digit(6), Range(range)], channel_glyphs(15, range));
    }

    #[test]
    fn show_patch_should_offset_unless_zero_based() {
        let mut display = RecordingDisplay::default();
        show_patch(&mut display, 0, false).unwrap();
        assert_eq!("  1", display.text());
        show_patch(&mut display, 0, true).unwrap();
        assert_eq!("  0", display.text());
        show_patch(&mut display, 998, false).unwrap();
        assert_eq!("999", display.text());
    }

    #[test]
    fn show_channel_and_range_default_should_draw_all_positions() {
        let mut display = RecordingDisplay::default();
        display
            .show_channel_and_range(11, PatchRange::from_stored(4))
            .unwrap();
        assert_eq!("12U", display.text());
    }

    #[test]
    fn show_display_convention_should_clear_and_draw_flag() {
        let mut display = RecordingDisplay::default();
        show_patch(&mut display, 122, false).unwrap();
        show_display_convention(&mut display, true).unwrap();
        assert_eq!("  0", display.text());
        show_display_convention(&mut display, false).unwrap();
        assert_eq!("  1", display.text());
    }
}
