/// 24xx-series I2C EEPROM used as the configuration store.
use defmt::{trace, warn};
use embedded_hal::{
    blocking::i2c::{Write, WriteRead},
    digital::v2::OutputPin,
};
use nb::block;
use pcpedal_core::config::ByteStorage;

// a write cycle takes up to 5ms, each poll is a two byte transfer
const ACK_POLL_ATTEMPTS: u16 = 200;

#[derive(Debug)]
pub enum EepromError<E> {
    Bus(E),
    /// The device never acknowledged after a write cycle.
    WriteTimeout,
    WriteProtectPin,
}

/// Single byte addressed part (24C02 or similar) with its WP pin wired to a GPIO.
pub struct Eeprom24x<I2C, WP> {
    i2c: I2C,
    address: u8,
    write_protect: WP,
}

impl<I2C, WP, E> Eeprom24x<I2C, WP>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    WP: OutputPin,
{
    pub fn new(i2c: I2C, address: u8, mut write_protect: WP) -> Self {
        // protected unless a save is in progress
        if write_protect.set_high().is_err() {
            warn!("[eeprom] write protect pin set_high failed");
        }
        Eeprom24x {
            i2c,
            address,
            write_protect,
        }
    }

    /// The device ignores its address while an internal write cycle runs.
    fn poll_ready(&mut self, offset: u8, attempts: &mut u16) -> nb::Result<(), EepromError<E>> {
        match self.i2c.write(self.address, &[offset]) {
            Ok(()) => Ok(()),
            Err(_) if *attempts > 0 => {
                *attempts -= 1;
                Err(nb::Error::WouldBlock)
            }
            Err(_) => Err(nb::Error::Other(EepromError::WriteTimeout)),
        }
    }
}

impl<I2C, WP, E> ByteStorage for Eeprom24x<I2C, WP>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    WP: OutputPin,
{
    type Error = EepromError<E>;

    fn unlock(&mut self) -> Result<(), Self::Error> {
        self.write_protect
            .set_low()
            .map_err(|_| EepromError::WriteProtectPin)
    }

    fn lock(&mut self) -> Result<(), Self::Error> {
        self.write_protect
            .set_high()
            .map_err(|_| EepromError::WriteProtectPin)
    }

    fn read_byte(&mut self, offset: u16) -> Result<u8, Self::Error> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.address, &[offset as u8], &mut buf)
            .map_err(EepromError::Bus)?;
        Ok(buf[0])
    }

    fn program_byte(&mut self, offset: u16, value: u8) -> Result<(), Self::Error> {
        trace!("[eeprom] program offset={} value={}", offset, value);
        self.i2c
            .write(self.address, &[offset as u8, value])
            .map_err(EepromError::Bus)?;
        let mut attempts = ACK_POLL_ATTEMPTS;
        let ready = block!(self.poll_ready(offset as u8, &mut attempts));
        if ready.is_err() {
            warn!("[eeprom] no ack after write offset={}", offset);
        }
        ready
    }
}
