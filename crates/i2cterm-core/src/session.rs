//! Terminal session state kept on the host: the device's current output
//! voltage and the rules for changing it.

use i2cterm_protocol::{Command, RequestFrame, ResponseFrame, Status, Voltage};
use log::info;

use crate::client::BridgeClient;
use crate::error::{BridgeError, Result};
use crate::transport::FeatureTransport;

/// Outcome of [`Session::set_voltage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoltageChange {
    /// The rail already had the requested level; nothing was sent.
    Unchanged(Voltage),
    /// The operator did not confirm; nothing was sent.
    Declined,
    /// SET_VOLTAGE was submitted. `voltage` is the level read back afterwards.
    Applied { status: Status, voltage: Voltage },
}

pub struct Session<T> {
    client: BridgeClient<T>,
    voltage: Voltage,
}

impl<T: FeatureTransport + 'static> Session<T> {
    /// Opens a session by asking the device for its current voltage. A
    /// device that cannot answer this is not usable.
    pub fn open(mut client: BridgeClient<T>) -> Result<Self> {
        let voltage = fetch_voltage(&mut client)?;
        info!("output voltage is {voltage}V");
        Ok(Self { client, voltage })
    }

    pub fn voltage(&self) -> Voltage {
        self.voltage
    }

    pub fn client(&self) -> &BridgeClient<T> {
        &self.client
    }

    /// Submits a request as-is. Voltage changes should go through
    /// [`set_voltage`](Self::set_voltage) so the cached level stays correct.
    pub fn execute(&mut self, request: RequestFrame) -> Result<ResponseFrame> {
        self.client.submit(request)
    }

    pub fn refresh_voltage(&mut self) -> Result<Voltage> {
        self.voltage = fetch_voltage(&mut self.client)?;
        Ok(self.voltage)
    }

    /// Switches the output rail to `target`.
    ///
    /// `confirm` is asked with `(current, target)` only when the level would
    /// actually change. After submission the voltage is read back from the
    /// device whatever the reported status.
    pub fn set_voltage<F>(&mut self, target: Voltage, confirm: F) -> Result<VoltageChange>
    where
        F: FnOnce(Voltage, Voltage) -> bool,
    {
        if target == self.voltage {
            return Ok(VoltageChange::Unchanged(target));
        }
        if !confirm(self.voltage, target) {
            return Ok(VoltageChange::Declined);
        }

        let response = self.client.send(Command::SetVoltage, target.code())?;
        let voltage = self.refresh_voltage()?;
        info!("output voltage switched to {voltage}V");
        Ok(VoltageChange::Applied { status: response.status, voltage })
    }
}

fn fetch_voltage<T: FeatureTransport + 'static>(client: &mut BridgeClient<T>) -> Result<Voltage> {
    let response = client.send(Command::GetVoltage, 0)?;
    Voltage::from_code(response.data).ok_or(BridgeError::InvalidVoltage(response.data))
}
