//! Host side of the I2C bridge: feature-report transport, request/response
//! client, voltage session, status rendering, frame log.

pub mod client;
pub mod error;
pub mod logbuf;
pub mod session;
pub mod status_text;
pub mod transport;

pub use client::{BridgeClient, CancelToken, ClientConfig};
pub use error::{BridgeError, Result};
pub use logbuf::{Direction, FrameLog, LogEntry};
pub use session::{Session, VoltageChange};
pub use status_text::{describe, render, Severity, StatusMessage};
pub use transport::FeatureTransport;
