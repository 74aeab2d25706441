//! Device side of the USB I2C bridge.
//!
//! The firmware is a single cooperative loop: [`device::Device`] checks the
//! host connection, lets the [`dispatcher::Dispatcher`] execute at most one
//! request, then services USB. Anything that waits on hardware goes through
//! [`wait::Waiter`], which services USB on every poll so the link never
//! stalls.
//!
//! Hardware is reached through three traits: [`twi::TwiController`] for the
//! I2C block, [`board::Board`] for rails, LED, host sense and watchdog, and
//! [`registers::UsbLink`] for the USB stack. [`sim`] provides simulated
//! implementations of all three.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod board;
pub mod device;
pub mod dispatcher;
pub mod driver;
pub mod registers;
pub mod sim;
pub mod twi;
pub mod wait;

#[cfg(feature = "std")]
pub mod hosted;

pub use board::{Board, Rails};
pub use device::{Device, HostLost};
pub use dispatcher::Dispatcher;
pub use driver::{BusDriver, BusError, Received};
pub use registers::{Registers, UsbLink};
pub use twi::{Control, TwiController};
pub use wait::{WaitConfig, Waiter};
