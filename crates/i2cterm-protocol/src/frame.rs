use crate::{Command, Status, END_SIGNATURE, SIGNATURE};
use thiserror::Error;

/// Encoded size of a request frame.
pub const REQUEST_LEN: usize = 4;

/// Encoded size of a response frame.
pub const RESPONSE_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short: {0} bytes")]
    TooShort(usize),
    #[error("bad frame signature 0x{0:02X}")]
    BadSignature(u8),
}

/// Host to device: `[SIGNATURE, command, operand, END_SIGNATURE]`.
///
/// The command byte is kept raw so that ids unknown to this build can still
/// be carried to the device and answered with `UNSUPPORTED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame {
    pub command: u8,
    pub data: u8,
}

impl RequestFrame {
    pub const fn new(command: Command, data: u8) -> Self {
        Self { command: command.id(), data }
    }

    pub const fn encode(&self) -> [u8; REQUEST_LEN] {
        [SIGNATURE, self.command, self.data, END_SIGNATURE]
    }

    /// Decodes a request. Only the leading signature is checked; the end
    /// signature is informational.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < REQUEST_LEN {
            return Err(FrameError::TooShort(bytes.len()));
        }
        if bytes[0] != SIGNATURE {
            return Err(FrameError::BadSignature(bytes[0]));
        }
        Ok(Self { command: bytes[1], data: bytes[2] })
    }

    pub const fn known_command(&self) -> Option<Command> {
        Command::from_id(self.command)
    }
}

/// Device to host: `[SIGNATURE, last-command, status, data, END_SIGNATURE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame {
    pub command: u8,
    pub status: Status,
    pub data: u8,
}

impl ResponseFrame {
    pub const fn encode(&self) -> [u8; RESPONSE_LEN] {
        [SIGNATURE, self.command, self.status.code(), self.data, END_SIGNATURE]
    }

    /// Decodes a response. Hosts must tolerate a missing end signature, so
    /// only the first four bytes are required.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < RESPONSE_LEN - 1 {
            return Err(FrameError::TooShort(bytes.len()));
        }
        if bytes[0] != SIGNATURE {
            return Err(FrameError::BadSignature(bytes[0]));
        }
        Ok(Self {
            command: bytes[1],
            status: Status::from_code(bytes[2]),
            data: bytes[3],
        })
    }

    /// True when this response is the final answer to `command`.
    pub fn completes(&self, command: u8) -> bool {
        self.command == command && self.status.is_final()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout() {
        let req = RequestFrame::new(Command::I2cWrite, 0xA5);
        assert_eq!(req.encode(), [0x5D, 0x05, 0xA5, 0x5A]);
    }

    #[test]
    fn request_decode_rejects_bad_frames() {
        assert_eq!(RequestFrame::decode(&[0x5D, 0x01]), Err(FrameError::TooShort(2)));
        assert_eq!(
            RequestFrame::decode(&[0x00, 0x01, 0x00, 0x5A]),
            Err(FrameError::BadSignature(0x00))
        );
    }

    #[test]
    fn request_decode_ignores_end_signature() {
        let req = RequestFrame::decode(&[0x5D, 0x0C, 0x01, 0x00, 0x00]).unwrap();
        assert_eq!(req.command, 0x0C);
        assert_eq!(req.known_command(), None);
    }

    #[test]
    fn response_layout() {
        let rsp = ResponseFrame { command: 0x06, status: Status::Bus(0x58), data: 0x42 };
        assert_eq!(rsp.encode(), [0x5D, 0x06, 0x58, 0x42, 0x5A]);
    }

    #[test]
    fn response_decode_accepts_truncated_tail() {
        let rsp = ResponseFrame::decode(&[0x5D, 0x08, 0x00, 0x02]).unwrap();
        assert_eq!(rsp.status, Status::Success);
        assert_eq!(rsp.data, 0x02);
    }

    #[test]
    fn completion_requires_matching_final_response() {
        let pending = ResponseFrame { command: 0x02, status: Status::Pending, data: 0 };
        let stale = ResponseFrame { command: 0x01, status: Status::Success, data: 0 };
        let done = ResponseFrame { command: 0x02, status: Status::Bus(0x08), data: 0 };
        assert!(!pending.completes(0x02));
        assert!(!stale.completes(0x02));
        assert!(done.completes(0x02));
    }
}
