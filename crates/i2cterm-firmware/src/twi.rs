//! Register-level view of a two-wire (TWI) master controller.
//!
//! The layout follows the classic AVR TWI block: a control register whose
//! interrupt flag signals completion, a status register whose upper five
//! bits carry the bus state code, a data register and a bit-rate register.

use bitflags::bitflags;

bitflags! {
    /// TWI control register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u8 {
        /// Operation complete. Writing a one clears it and starts the next operation.
        const TWINT = 1 << 7;
        /// Acknowledge received bytes.
        const TWEA = 1 << 6;
        const TWSTA = 1 << 5;
        const TWSTO = 1 << 4;
        /// Write collision.
        const TWWC = 1 << 3;
        const TWEN = 1 << 2;
        const TWIE = 1 << 0;
    }
}

/// Mask selecting the bus state code from the status register.
pub const STATUS_MASK: u8 = 0xF8;

/// Prescaler bits of the status register.
pub const PRESCALER_MASK: u8 = 0x03;

/// Status register value when no bus state is relevant.
pub const STATUS_NO_INFO: u8 = 0xF8;

/// Register values after a power-on reset.
pub mod power_on {
    pub const BIT_RATE: u8 = 0x00;
    pub const STATUS: u8 = 0xF8;
    pub const DATA: u8 = 0xFF;
    pub const OWN_ADDRESS: u8 = 0xFE;
}

/// Raw access to a TWI controller.
///
/// Reads take `&mut self` because polling the control register is what
/// advances a simulated controller.
pub trait TwiController {
    fn write_control(&mut self, control: Control);
    fn read_control(&mut self) -> Control;

    fn write_data(&mut self, byte: u8);
    fn read_data(&mut self) -> u8;

    fn write_status(&mut self, value: u8);
    fn read_status(&mut self) -> u8;

    fn write_bit_rate(&mut self, value: u8);
    fn write_own_address(&mut self, value: u8);

    /// Pulse SCL/SDA high through the internal pull-ups, then hand the pins
    /// back to the controller.
    fn release_pins(&mut self);
}
