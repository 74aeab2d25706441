//! Operator-facing rendering of response statuses.

use std::fmt;

use i2cterm_protocol::{Command, ResponseFrame, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Status,
    Error,
    /// A value read from the bus, printed without decoration.
    Data,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub severity: Severity,
    pub text: String,
}

impl StatusMessage {
    fn status(text: &str) -> Self {
        Self { severity: Severity::Status, text: text.to_owned() }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { severity: Severity::Error, text: text.into() }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

const UNKNOWN: &str = "Unknown I2C error.";

/// Message for a final status, or `None` when plain success needs no report.
pub fn describe(status: Status) -> Option<StatusMessage> {
    let message = match status {
        Status::Success => return None,
        Status::Timeout => StatusMessage::error("I2C timeout occur, slave device is not responding."),
        Status::Unsupported => StatusMessage::error(UNKNOWN),
        Status::Pending => StatusMessage::error(format!("0x{:x}: {UNKNOWN}", status.code())),
        Status::Bus(code) => match bus_text(code) {
            Some(text) => StatusMessage::status(text),
            None => StatusMessage::error(format!("0x{code:x}: {UNKNOWN}")),
        },
    };
    Some(message)
}

fn bus_text(code: u8) -> Option<&'static str> {
    Some(match code {
        0x08 => "A START condition has been transmitted.",
        0x10 => "A repeated START condition has been transmitted.",
        0x18 => "Slave address with WRITE flag has been transmitted, ACK has been received.",
        0x20 => "Slave address with WRITE flag has been transmitted, NOT ACK has been received.",
        0x28 => "Data byte has been transmitted, ACK has been received.",
        0x30 => "Data byte has been transmitted, NOT ACK has been received.",
        0x38 => "Arbitration lost in slave address or data bytes.",
        0x40 => "Slave address with READ flag has been transmitted, ACK has been received.",
        0x48 => "Slave address with READ flag has been transmitted, NOT ACK has been received.",
        0x50 => "Data byte has been received, ACK has been returned.",
        0x58 => "Data byte has been received, NOT ACK has been returned.",
        _ => return None,
    })
}

/// Every line the terminal prints for a final response: the status message
/// if any, then the data byte for READ.
pub fn render(response: &ResponseFrame) -> Vec<StatusMessage> {
    let mut lines: Vec<_> = describe(response.status).into_iter().collect();
    if response.command == Command::I2cRead.id() {
        lines.push(StatusMessage {
            severity: Severity::Data,
            text: format!("Data: 0x{:x}", response.data),
        });
    }
    lines
}
