//! I2C master primitives on top of a [`TwiController`].
//!
//! Every primitive except STOP follows the same shape: program the
//! controller, then wait for the completion flag through the [`Waiter`],
//! servicing the USB link on each poll. The returned value is the raw bus
//! state code; the driver never interprets it, and it does not track the
//! session state either. A primitive issued out of order simply runs
//! against whatever state the bus is in.

use embedded_hal::delay::DelayNs;
use i2cterm_protocol::BusSpeed;
use log::{debug, trace, warn};
use thiserror::Error;

use crate::twi::{power_on, Control, TwiController, PRESCALER_MASK, STATUS_MASK};
use crate::wait::{WaitConfig, Waiter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("bus operation did not complete in time")]
    Timeout,
}

/// Bit-rate register value for `speed` with a prescaler of 1 and a 12 MHz
/// core clock.
pub const fn bit_rate_for(speed: BusSpeed) -> u8 {
    match speed {
        BusSpeed::Standard100k => 72,
        BusSpeed::Fast250k => 24,
        BusSpeed::Fast400k => 12,
    }
}

/// A byte received from the bus together with the resulting state code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    pub status: u8,
    pub data: u8,
}

pub struct BusDriver<T, D> {
    twi: T,
    waiter: Waiter<D>,
}

impl<T, D> BusDriver<T, D>
where
    T: TwiController,
    D: DelayNs,
{
    pub fn new(twi: T, delay: D) -> Self {
        Self::with_config(twi, delay, WaitConfig::default())
    }

    pub fn with_config(twi: T, delay: D, config: WaitConfig) -> Self {
        Self {
            twi,
            waiter: Waiter::new(delay, config),
        }
    }

    pub fn controller(&self) -> &T {
        &self.twi
    }

    pub fn waiter_mut(&mut self) -> &mut Waiter<D> {
        &mut self.waiter
    }

    /// Sets up the pins and the bus clock. `speed_code` is the INIT operand;
    /// unknown codes select 100 kHz.
    pub fn configure(&mut self, speed_code: u8) -> BusSpeed {
        let speed = BusSpeed::from_code(speed_code);
        if speed.code() != speed_code {
            debug!("speed code {speed_code} unsupported, using 100kHz");
        }

        self.twi.release_pins();
        let status = self.twi.read_status();
        self.twi.write_status(status & !PRESCALER_MASK);
        self.twi.write_bit_rate(bit_rate_for(speed));

        debug!("bus configured for {}kHz", speed.khz());
        speed
    }

    pub fn start<S: FnMut()>(&mut self, service: &mut S) -> Result<u8, BusError> {
        self.twi.write_control(Control::TWINT | Control::TWEN | Control::TWSTA);
        self.complete("start", service)
    }

    /// Transmits a 7-bit address shifted left, with the R/W flag in bit 0.
    pub fn write_address<S: FnMut()>(&mut self, address: u8, service: &mut S) -> Result<u8, BusError> {
        self.twi.write_data(address);
        self.twi.write_control(Control::TWINT | Control::TWEN);
        self.complete("address", service)
    }

    pub fn write<S: FnMut()>(&mut self, byte: u8, service: &mut S) -> Result<u8, BusError> {
        self.twi.write_data(byte);
        self.twi.write_control(Control::TWINT | Control::TWEN);
        self.complete("write", service)
    }

    /// Receives one byte, answering with ACK when `ack` is set and NACK
    /// otherwise.
    pub fn read<S: FnMut()>(&mut self, ack: bool, service: &mut S) -> Result<Received, BusError> {
        let mut control = Control::TWINT | Control::TWEN;
        if ack {
            control |= Control::TWEA;
        }
        self.twi.write_control(control);
        let status = self.complete("read", service)?;
        Ok(Received {
            status,
            data: self.twi.read_data(),
        })
    }

    /// Issues a STOP condition. The controller releases the bus on its own,
    /// there is nothing to wait for.
    pub fn stop(&mut self) {
        self.twi.write_control(Control::TWINT | Control::TWEN | Control::TWSTO);
    }

    /// Returns every controller register to its power-on value.
    pub fn reset_controller(&mut self) {
        self.twi.write_bit_rate(power_on::BIT_RATE);
        self.twi.write_control(Control::empty());
        self.twi.write_status(power_on::STATUS);
        self.twi.write_data(power_on::DATA);
        self.twi.write_own_address(power_on::OWN_ADDRESS);
    }

    fn complete<S: FnMut()>(&mut self, op: &str, service: &mut S) -> Result<u8, BusError> {
        let twi = &mut self.twi;
        match self
            .waiter
            .spin_until(|| twi.read_control().contains(Control::TWINT), service)
        {
            Ok(()) => {
                let status = twi.read_status() & STATUS_MASK;
                trace!("{op}: status 0x{status:02X}");
                Ok(status)
            }
            Err(e) => {
                warn!("{op}: no completion after {} polls", self.waiter.config().budget);
                Err(e)
            }
        }
    }
}
