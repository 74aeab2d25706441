//! Error types for the host side of the bridge.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The feature-report exchange itself failed.
    #[error("communication failure: {0}")]
    Transport(#[from] std::io::Error),

    /// The device did not produce a final response in time.
    #[error("no response after {polls} polls ({elapsed:?})")]
    Timeout { polls: u32, elapsed: Duration },

    #[error("request cancelled")]
    Cancelled,

    /// The submission worker panicked or could not be started.
    #[error("submission worker lost")]
    WorkerLost,

    /// GET_VOLTAGE answered with a code that is not a voltage.
    #[error("device reported unknown voltage code 0x{0:02X}")]
    InvalidVoltage(u8),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
