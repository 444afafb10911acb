/// Program change output.
use embedded_hal::serial::Write;
use heapless::Vec;
use midi_types::MidiMessage;
use nb::block;

use crate::patch::PatchRange;

/// Bank select MSB controller number.
const BANK_SELECT: u8 = 0;

/// Messages needed to select `patch` on `channel`: an optional bank select followed by
/// the program change.
pub fn program_change_messages(
    channel: u8,
    patch: u16,
    range: PatchRange,
    send_bank_select: bool,
) -> Vec<MidiMessage, 2> {
    let channel = channel & 0x0F;
    let mut messages = Vec::new();
    if send_bank_select || !range.is_default() {
        let bank = (patch / 128) as u8;
        // capacity is 2 and this is the first push
        let _ = messages.push(MidiMessage::ControlChange(
            channel.into(),
            BANK_SELECT.into(),
            bank.into(),
        ));
    }
    let program = (patch % 128) as u8;
    let _ = messages.push(MidiMessage::ProgramChange(channel.into(), program.into()));
    messages
}

/// Wire bytes for `message`. Every message carries its own status byte, receivers must
/// never see running status.
pub fn message_bytes(message: &MidiMessage) -> Vec<u8, 3> {
    let mut bytes = Vec::new();
    match message {
        MidiMessage::ControlChange(midi_channel, control, value) => {
            let midi_channel: u8 = (*midi_channel).into();
            let _ = bytes.extend_from_slice(&[
                0xB0 | midi_channel,
                (*control).into(),
                (*value).into(),
            ]);
        }
        MidiMessage::ProgramChange(midi_channel, program) => {
            let midi_channel: u8 = (*midi_channel).into();
            let _ = bytes.extend_from_slice(&[0xC0 | midi_channel, (*program).into()]);
        }
        _ => (),
    }
    bytes
}

/// Write every message, blocking on the transport. Stops at the first transport error.
pub fn send_patch<W: Write<u8>>(
    serial: &mut W,
    channel: u8,
    patch: u16,
    range: PatchRange,
    send_bank_select: bool,
) -> Result<(), W::Error> {
    for message in program_change_messages(channel, patch, range, send_bank_select) {
        log_message(&message);
        for byte in message_bytes(&message) {
            block!(serial.write(byte))?;
        }
    }
    Ok(())
}

pub fn log_message(message: &MidiMessage) {
    match message {
        MidiMessage::ProgramChange(midi_channel, program) => {
            let midi_channel: u8 = (*midi_channel).into();
            let program: u8 = (*program).into();
            debug!(
                "[midi_send] program change midi_channel={} program={}",
                midi_channel, program
            );
        }
        MidiMessage::ControlChange(midi_channel, control, value) => {
            let midi_channel: u8 = (*midi_channel).into();
            let control: u8 = (*control).into();
            let value: u8 = (*value).into();
            debug!(
                "[midi_send] control change midi_channel={} control={} value={}",
                midi_channel, control, value
            );
        }
        _ => trace!("[midi_send] UNKNOWN"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RecordingSerial;

    fn sent_bytes(channel: u8, patch: u16, range: PatchRange, send_bank_select: bool) -> Vec<u8, 8> {
        let mut serial = RecordingSerial::default();
        send_patch(&mut serial, channel, patch, range, send_bank_select).unwrap();
        Vec::from_slice(&serial.bytes()).unwrap()
    }

    #[test]
    fn repeated_program_changes_should_each_carry_a_status_byte() {
        let mut serial = RecordingSerial::default();
        send_patch(&mut serial, 0, 0, PatchRange::DEFAULT, false).unwrap();
        send_patch(&mut serial, 0, 1, PatchRange::DEFAULT, false).unwrap();
        send_patch(&mut serial, 0, 1, PatchRange::DEFAULT, false).unwrap();
        assert_eq!(&[0xC0, 0, 0xC0, 1, 0xC0, 1], serial.bytes().as_slice());
    }

    #[test]
    fn repeated_bank_selects_should_each_carry_a_status_byte() {
        let mut serial = RecordingSerial::default();
        send_patch(&mut serial, 3, 200, PatchRange::from_stored(2), false).unwrap();
        send_patch(&mut serial, 3, 201, PatchRange::from_stored(2), false).unwrap();
        assert_eq!(
            &[0xB3, 0, 1, 0xC3, 72, 0xB3, 0, 1, 0xC3, 73],
            serial.bytes().as_slice()
        );
    }

    #[test]
    fn bank_select_should_precede_program_change() {
        let bytes = sent_bytes(5, 130, PatchRange::from_stored(1), false);
        assert_eq!(&[0xB5, 0x00, 1, 0xC5, 2], bytes.as_slice());
    }

    #[test]
    fn default_range_without_bank_select_should_send_program_change_only() {
        let bytes = sent_bytes(0, 0, PatchRange::DEFAULT, false);
        assert_eq!(&[0xC0, 0], bytes.as_slice());
    }

    #[test]
    fn bank_select_setting_should_force_control_change_in_default_range() {
        let bytes = sent_bytes(15, 127, PatchRange::DEFAULT, true);
        assert_eq!(&[0xBF, 0x00, 0, 0xCF, 127], bytes.as_slice());
    }

    #[test]
    fn highest_patch_should_split_into_bank_and_program() {
        let messages = program_change_messages(2, 998, PatchRange::from_stored(4), false);
        assert_eq!(
            &[
                MidiMessage::ControlChange(2.into(), 0.into(), 7.into()),
                MidiMessage::ProgramChange(2.into(), 102.into()),
            ],
            messages.as_slice()
        );
    }
}
