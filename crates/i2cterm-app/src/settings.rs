//! Persisted terminal settings.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use i2cterm_core::ClientConfig;
use i2cterm_protocol::{DEVICE_PID, DEVICE_VID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub vendor_id: u16,
    pub product_id: u16,
    pub poll_interval_ms: u64,
    /// `None` polls until the device answers.
    pub response_timeout_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vendor_id: DEVICE_VID,
            product_id: DEVICE_PID,
            poll_interval_ms: 250,
            response_timeout_ms: Some(10_000),
        }
    }
}

impl Settings {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("i2cterm").join("settings.json"))
    }

    /// Loads the settings file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path().context("no configuration directory on this system")?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(&path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            response_timeout: self.response_timeout_ms.map(Duration::from_millis),
            ..ClientConfig::default()
        }
    }
}
