//! Wire format of the USB I2C bridge.
//!
//! Requests and responses travel as HID feature reports. A request is four
//! bytes, a response five; both are framed by [`SIGNATURE`] and
//! [`END_SIGNATURE`].

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod frame;
pub mod params;
pub mod status;

pub use command::Command;
pub use frame::{FrameError, RequestFrame, ResponseFrame, REQUEST_LEN, RESPONSE_LEN};
pub use params::{BusSpeed, Voltage};
pub use status::Status;

/// First byte of every well-formed frame.
pub const SIGNATURE: u8 = 0x5D;

/// Last byte of every well-formed frame.
pub const END_SIGNATURE: u8 = 0x5A;

/// USB vendor id of the bridge (shared V-USB id pool).
pub const DEVICE_VID: u16 = 0x16C0;

/// USB product id of the bridge.
pub const DEVICE_PID: u16 = 0x1231;
