//! Runs the firmware on a host thread, reachable through in-process
//! feature reports.
//!
//! The device side is the unmodified [`Device`] loop; only the USB link is
//! replaced by a channel. GET reports issued while a bus primitive is
//! waiting are answered from inside the wait loop, exactly as on hardware.

use std::thread::{self, JoinHandle};
use std::time::Duration;
use std::vec::Vec;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use embedded_hal::delay::DelayNs;
use i2cterm_protocol::RESPONSE_LEN;
use log::{debug, trace};
use thiserror::Error;

use crate::board::Board;
use crate::device::Device;
use crate::driver::BusDriver;
use crate::registers::{Registers, UsbLink};
use crate::sim::SimBoard;
use crate::twi::TwiController;

/// Pause between idle loop iterations.
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("hosted device has stopped")]
pub struct Detached;

enum HostRequest {
    SetReport(Vec<u8>),
    GetReport(Sender<Vec<u8>>),
}

/// USB link backed by a channel from [`HostedDevice`].
pub struct ChannelLink {
    rx: Receiver<HostRequest>,
    detached: bool,
}

impl ChannelLink {
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

impl UsbLink for ChannelLink {
    fn poll(&mut self, registers: &mut Registers) {
        loop {
            match self.rx.try_recv() {
                Ok(HostRequest::SetReport(report)) => {
                    trace!("set report {report:02X?}");
                    registers.accept_set_report(&report);
                }
                Ok(HostRequest::GetReport(reply)) => {
                    let mut buf = [0u8; RESPONSE_LEN];
                    let len = registers.fill_get_report(&mut buf);
                    let _ = reply.send(buf[..len].to_vec());
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.detached = true;
                    break;
                }
            }
        }
    }
}

/// Sleeps for real, so simulated waits take as long as on hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

/// Firmware running on its own thread until dropped.
pub struct HostedDevice {
    tx: Option<Sender<HostRequest>>,
    thread: Option<JoinHandle<()>>,
}

impl HostedDevice {
    pub fn spawn<T, D>(twi: T, delay: D) -> Self
    where
        T: TwiController + Send + 'static,
        D: DelayNs + Send + 'static,
    {
        Self::spawn_with(BusDriver::new(twi, delay), SimBoard::new())
    }

    pub fn spawn_with<T, D, B>(driver: BusDriver<T, D>, board: B) -> Self
    where
        T: TwiController + Send + 'static,
        D: DelayNs + Send + 'static,
        B: Board + Send + 'static,
    {
        let (tx, rx) = unbounded::<HostRequest>();
        let link = ChannelLink {
            rx,
            detached: false,
        };

        let thread = thread::spawn(move || {
            let mut device = Device::new(driver, board, link);
            device.boot();
            while !device.link().is_detached() {
                match device.step() {
                    Ok(Some(rsp)) => debug!("completed {:02X?}", rsp.encode()),
                    Ok(None) => thread::sleep(IDLE_BACKOFF),
                    Err(e) => {
                        debug!("hosted device stopping: {e}");
                        break;
                    }
                }
            }
        });

        Self {
            tx: Some(tx),
            thread: Some(thread),
        }
    }

    /// Delivers a SET feature report (without report id).
    pub fn set_report(&self, report: &[u8]) -> Result<(), Detached> {
        self.sender()?
            .send(HostRequest::SetReport(report.to_vec()))
            .map_err(|_| Detached)
    }

    /// Reads a GET feature report (without report id) into `buf`.
    pub fn get_report(&self, buf: &mut [u8]) -> Result<usize, Detached> {
        let (reply_tx, reply_rx) = bounded(1);
        self.sender()?
            .send(HostRequest::GetReport(reply_tx))
            .map_err(|_| Detached)?;
        let report = reply_rx.recv().map_err(|_| Detached)?;
        let len = report.len().min(buf.len());
        buf[..len].copy_from_slice(&report[..len]);
        Ok(len)
    }

    fn sender(&self) -> Result<&Sender<HostRequest>, Detached> {
        self.tx.as_ref().ok_or(Detached)
    }
}

impl Drop for HostedDevice {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
