//! Start-up sequence and main service loop.

use embedded_hal::delay::DelayNs;
use i2cterm_protocol::{ResponseFrame, Voltage};
use log::{info, warn};
use thiserror::Error;

use crate::board::Board;
use crate::dispatcher::Dispatcher;
use crate::driver::BusDriver;
use crate::registers::UsbLink;
use crate::twi::TwiController;

/// LED blink period while waiting for the host, in milliseconds.
pub const HOST_WAIT_BLINK_MS: u32 = 250;

/// Time the device stays detached before connecting, in milliseconds.
pub const CONNECT_DELAY_MS: u32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("USB host sense lost")]
pub struct HostLost;

pub struct Device<T, D, B, L> {
    dispatcher: Dispatcher<T, D, B>,
    link: L,
}

impl<T, D, B, L> Device<T, D, B, L>
where
    T: TwiController,
    D: DelayNs,
    B: Board,
    L: UsbLink,
{
    pub fn new(driver: BusDriver<T, D>, board: B, link: L) -> Self {
        Self {
            dispatcher: Dispatcher::new(driver, board),
            link,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<T, D, B> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<T, D, B> {
        &mut self.dispatcher
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Waits for the host, attaches to USB and energises the 3.3V rail.
    pub fn boot(&mut self) {
        let mut led = false;
        while !self.dispatcher.board_mut().host_present() {
            led = !led;
            self.dispatcher.board_mut().set_status_led(led);
            self.dispatcher.driver_mut().waiter_mut().pause_ms(HOST_WAIT_BLINK_MS);
        }
        self.dispatcher.board_mut().set_status_led(true);

        self.dispatcher.driver_mut().waiter_mut().pause_ms(CONNECT_DELAY_MS);
        self.link.connect();
        info!("attached to USB host");

        self.dispatcher.apply_voltage(Voltage::SAFE_DEFAULT, &mut self.link);
    }

    /// One iteration of the main loop: check the host, dispatch the pending
    /// request, service USB once.
    pub fn step(&mut self) -> Result<Option<ResponseFrame>, HostLost> {
        if !self.dispatcher.board_mut().host_present() {
            return Err(HostLost);
        }
        let response = self.dispatcher.service(&mut self.link);
        self.link.poll(self.dispatcher.registers_mut());
        Ok(response)
    }

    /// Runs the main loop forever; call [`boot`](Self::boot) first. Losing
    /// the host is unrecoverable here, the watchdog restarts the device.
    pub fn run(mut self) -> ! {
        loop {
            if let Err(e) = self.step() {
                warn!("{e}, rebooting");
                let board = self.dispatcher.board_mut();
                board.set_status_led(false);
                board.reboot();
            }
        }
    }
}
