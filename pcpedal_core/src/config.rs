//! Persisted MIDI configuration and last patch.
//!
//! One byte per field in a small non-volatile region:
//!
//! | offset | contents                    |
//! |--------|-----------------------------|
//! | 0      | channel, low nibble         |
//! | 1      | range index, modulo 5       |
//! | 2      | last patch, high byte       |
//! | 3      | last patch, low byte        |
//! | 4      | zero-based display, bit 0   |
//!
//! All-zero contents decode to channel 1, the 0-127 range and one-based display. Only
//! the bits listed are significant, other bits in a cell are ignored.

use crate::patch::PatchRange;

pub const CHANNEL_OFFSET: u16 = 0;
pub const RANGE_OFFSET: u16 = 1;
pub const LAST_PATCH_MSB_OFFSET: u16 = 2;
pub const LAST_PATCH_LSB_OFFSET: u16 = 3;
pub const ZERO_BASED_OFFSET: u16 = 4;

/// Byte addressable non-volatile memory with a write lock.
pub trait ByteStorage {
    type Error;

    fn unlock(&mut self) -> Result<(), Self::Error>;

    fn lock(&mut self) -> Result<(), Self::Error>;

    fn read_byte(&mut self, offset: u16) -> Result<u8, Self::Error>;

    /// Program one byte, returning once the cell has been written.
    fn program_byte(&mut self, offset: u16, value: u8) -> Result<(), Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StorageError<E> {
    Bus(E),
    VerifyFailure { offset: u16, expected: u8, found: u8 },
}

impl<E> From<E> for StorageError<E> {
    fn from(err: E) -> Self {
        StorageError::Bus(err)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MidiConfig {
    /// Zero-based MIDI channel, 0-15.
    pub channel: u8,
    pub range: PatchRange,
    /// Show patch numbers as sent (0-127) instead of 1-128.
    pub zero_based: bool,
}

impl MidiConfig {
    pub fn decode(channel: u8, range: u8, zero_based: u8) -> MidiConfig {
        MidiConfig {
            channel: channel & 0x0F,
            range: PatchRange::from_stored(range),
            zero_based: zero_based & 0x01 != 0,
        }
    }

    /// Bytes for the channel, range and zero-based offsets, in that order.
    pub fn encode(&self) -> [(u16, u8); 3] {
        [
            (CHANNEL_OFFSET, self.channel & 0x0F),
            (RANGE_OFFSET, self.range.index()),
            (ZERO_BASED_OFFSET, self.zero_based as u8),
        ]
    }

    pub fn next_channel(&mut self) {
        self.channel = (self.channel + 1) & 0x0F;
    }

    pub fn previous_channel(&mut self) {
        self.channel = self.channel.wrapping_sub(1) & 0x0F;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SaveOutcome {
    Unchanged,
    Written,
}

pub struct ConfigStore<S> {
    storage: S,
}

impl<S: ByteStorage> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        ConfigStore { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn load(&mut self) -> Result<MidiConfig, StorageError<S::Error>> {
        let channel = self.storage.read_byte(CHANNEL_OFFSET)?;
        let range = self.storage.read_byte(RANGE_OFFSET)?;
        let zero_based = self.storage.read_byte(ZERO_BASED_OFFSET)?;
        Ok(MidiConfig::decode(channel, range, zero_based))
    }

    /// Write `config` back as one batch if the stored config decodes differently. Every offset
    /// is written and verified even when an earlier one fails, and the region is locked
    /// again before returning. The first failure is reported.
    pub fn save(&mut self, config: &MidiConfig) -> Result<SaveOutcome, StorageError<S::Error>> {
        if self.load()? == *config {
            debug!("[config] save skipped, unchanged");
            return Ok(SaveOutcome::Unchanged);
        }

        info!(
            "[config] save channel={} range={} zero_based={}",
            config.channel,
            config.range.index(),
            config.zero_based
        );
        self.storage.unlock()?;
        let mut result = Ok(());
        for (offset, value) in config.encode() {
            let written = self.write_verified(offset, value);
            if result.is_ok() {
                result = written;
            }
        }
        let locked = self.storage.lock();
        result?;
        locked?;
        Ok(SaveOutcome::Written)
    }

    pub fn load_last_patch(&mut self) -> Result<u16, StorageError<S::Error>> {
        let msb = self.storage.read_byte(LAST_PATCH_MSB_OFFSET)?;
        let lsb = self.storage.read_byte(LAST_PATCH_LSB_OFFSET)?;
        Ok(u16::from_be_bytes([msb, lsb]))
    }

    /// Store `patch` big-endian, programming only the bytes that changed.
    pub fn save_last_patch(&mut self, patch: u16) -> Result<SaveOutcome, StorageError<S::Error>> {
        let [msb, lsb] = patch.to_be_bytes();
        let mut pending: heapless::Vec<(u16, u8), 2> = heapless::Vec::new();
        for (offset, value) in [(LAST_PATCH_MSB_OFFSET, msb), (LAST_PATCH_LSB_OFFSET, lsb)] {
            if self.storage.read_byte(offset)? != value {
                let _ = pending.push((offset, value));
            }
        }
        if pending.is_empty() {
            return Ok(SaveOutcome::Unchanged);
        }

        trace!("[config] save last patch={}", patch);
        self.storage.unlock()?;
        let mut result = Ok(());
        for (offset, value) in pending {
            let written = self.write_verified(offset, value);
            if result.is_ok() {
                result = written;
            }
        }
        let locked = self.storage.lock();
        result?;
        locked?;
        Ok(SaveOutcome::Written)
    }

    /// Program one byte and read it back. Storage must already be unlocked.
    fn write_verified(&mut self, offset: u16, value: u8) -> Result<(), StorageError<S::Error>> {
        self.storage.program_byte(offset, value)?;
        let found = self.storage.read_byte(offset)?;
        if found != value {
            error!(
                "[config] verify failed offset={} expected={} found={}",
                offset, value, found
            );
            return Err(StorageError::VerifyFailure {
                offset,
                expected: value,
                found,
            });
        }
        Ok(())
    }
}
