/// Board build options.
use pcpedal_core::{Settings, SwitchLayout, Timing};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DisplayKind {
    /// 128x64 SSD1306 on I2C1.
    Oled,
    /// Three digit common-cathode LED display driven by a MAX7219 on SPI0.
    Segment,
}

pub const DISPLAY_KIND: DisplayKind = DisplayKind::Segment;

pub const SETTINGS: Settings = Settings {
    layout: SwitchLayout::ThreeSwitch,
    send_bank_select: true,
    restore_last_patch: true,
    activity_indicator: true,
    timing: Timing::new(),
};

/// 7-bit bus address of the 24xx EEPROM with A0-A2 tied low.
pub const EEPROM_ADDRESS: u8 = 0x50;
