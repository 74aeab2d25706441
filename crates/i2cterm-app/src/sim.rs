//! Feature-report transport backed by the firmware running in-process.

use std::io;

use i2cterm_core::FeatureTransport;
use i2cterm_firmware::hosted::{HostedDevice, StdDelay};
use i2cterm_firmware::sim::{SimSlave, SimTwi};

/// Address of the memory-style slave attached to the simulated bus.
pub const SIM_SLAVE_ADDRESS: u8 = 0x50;

pub struct SimulatedTransport {
    device: HostedDevice,
}

impl SimulatedTransport {
    /// Boots the firmware against a simulated bus with one slave at
    /// [`SIM_SLAVE_ADDRESS`]. Waits take real time.
    pub fn spawn() -> Self {
        let twi = SimTwi::with_slave(SimSlave::new(SIM_SLAVE_ADDRESS));
        Self {
            device: HostedDevice::spawn(twi, StdDelay),
        }
    }
}

impl FeatureTransport for SimulatedTransport {
    fn set_feature(&mut self, report: &[u8]) -> io::Result<()> {
        let payload = report.get(1..).unwrap_or_default();
        self.device
            .set_report(payload)
            .map_err(|e| io::Error::new(io::ErrorKind::NotConnected, e))
    }

    fn get_feature(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(payload) = buf.get_mut(1..) else {
            return Ok(0);
        };
        let len = self
            .device
            .get_report(payload)
            .map_err(|e| io::Error::new(io::ErrorKind::NotConnected, e))?;
        Ok(len + 1)
    }
}
