//! Feature-report transport over a real HID device.

use std::io;

use anyhow::{Context, Result};
use hidapi::{HidApi, HidDevice, HidError};
use i2cterm_core::FeatureTransport;
use log::{debug, info};

pub struct HidTransport {
    device: HidDevice,
}

impl HidTransport {
    /// Opens the first attached device with the given vendor/product id.
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self> {
        let api = HidApi::new().context("initialising HID access")?;
        for info in api.device_list() {
            debug!(
                "found HID device {:04x}:{:04x} at {:?}",
                info.vendor_id(),
                info.product_id(),
                info.path()
            );
        }

        let device = api
            .open(vendor_id, product_id)
            .with_context(|| format!("I2C bridge {vendor_id:04x}:{product_id:04x} is not connected or not functioning"))?;
        info!("opened HID device {vendor_id:04x}:{product_id:04x}");
        Ok(Self { device })
    }
}

fn to_io(e: HidError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

impl FeatureTransport for HidTransport {
    fn set_feature(&mut self, report: &[u8]) -> io::Result<()> {
        self.device.send_feature_report(report).map_err(to_io)
    }

    fn get_feature(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.device.get_feature_report(buf).map_err(to_io)
    }
}
