//! Request and response registers shared between the dispatcher and the
//! USB stack.

use i2cterm_protocol::{Command, RequestFrame, ResponseFrame, Status, REQUEST_LEN, SIGNATURE};
use log::debug;

/// Holds the single live request and the response the host reads back.
///
/// A new request overwrites the previous one; there is no queue.
#[derive(Debug, Clone)]
pub struct Registers {
    request: [u8; REQUEST_LEN],
    response: ResponseFrame,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub const fn new() -> Self {
        Self {
            request: [0; REQUEST_LEN],
            response: ResponseFrame {
                command: Command::None.id(),
                status: Status::Success,
                data: 0,
            },
        }
    }

    /// Handles a SET feature report. Returns `false` when the report is not
    /// a well-formed request and was ignored.
    pub fn accept_set_report(&mut self, report: &[u8]) -> bool {
        let Ok(frame) = RequestFrame::decode(report) else {
            debug!("ignoring malformed set report ({} bytes)", report.len());
            return false;
        };
        self.response = ResponseFrame {
            command: frame.command,
            status: Status::Pending,
            data: 0,
        };
        self.request.copy_from_slice(&report[..REQUEST_LEN]);
        true
    }

    /// Handles a GET feature report, returning the number of bytes written.
    pub fn fill_get_report(&self, buf: &mut [u8]) -> usize {
        let frame = self.response.encode();
        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        len
    }

    /// Removes the pending request, if any. The register is cleared before
    /// the request is returned so it is never dispatched twice.
    pub fn take_request(&mut self) -> Option<RequestFrame> {
        let raw = self.request;
        if raw[0] != SIGNATURE || raw[1] == Command::None.id() {
            return None;
        }
        self.request = [0; REQUEST_LEN];
        RequestFrame::decode(&raw).ok()
    }

    pub fn has_request(&self) -> bool {
        self.request[0] == SIGNATURE && self.request[1] != Command::None.id()
    }

    pub fn complete(&mut self, command: u8, status: Status, data: u8) {
        self.response = ResponseFrame {
            command,
            status,
            data,
        };
    }

    pub fn response(&self) -> ResponseFrame {
        self.response
    }
}

/// The device's USB stack, as seen from the dispatcher.
pub trait UsbLink {
    /// Services pending USB traffic. Feature reports from the host are
    /// applied to `registers` from inside this call.
    fn poll(&mut self, registers: &mut Registers);

    /// Attaches the device to the bus after start-up.
    fn connect(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_response_is_idle_success() {
        let regs = Registers::new();
        let mut buf = [0u8; 8];
        assert_eq!(regs.fill_get_report(&mut buf), 5);
        assert_eq!(buf[..5], [0x5D, 0x00, 0x00, 0x00, 0x5A]);
    }

    #[test]
    fn accepted_request_marks_response_pending() {
        let mut regs = Registers::new();
        regs.complete(0x08, Status::Success, 0x02);
        assert!(regs.accept_set_report(&[0x5D, 0x02, 0x00, 0x5A]));
        assert_eq!(
            regs.response(),
            ResponseFrame { command: 0x02, status: Status::Pending, data: 0 }
        );
        assert!(regs.has_request());
    }

    #[test]
    fn malformed_reports_are_ignored() {
        let mut regs = Registers::new();
        assert!(!regs.accept_set_report(&[0x5D, 0x02]));
        assert!(!regs.accept_set_report(&[0x00, 0x02, 0x00, 0x5A]));
        assert!(!regs.has_request());
        assert_eq!(regs.response().status, Status::Success);
    }

    #[test]
    fn take_clears_the_register() {
        let mut regs = Registers::new();
        regs.accept_set_report(&[0x5D, 0x06, 0x01, 0x5A]);
        let req = regs.take_request().unwrap();
        assert_eq!((req.command, req.data), (0x06, 0x01));
        assert_eq!(regs.take_request(), None);
    }

    #[test]
    fn none_command_is_never_taken() {
        let mut regs = Registers::new();
        assert!(regs.accept_set_report(&[0x5D, 0x00, 0x00, 0x5A]));
        assert_eq!(regs.take_request(), None);
    }

    #[test]
    fn short_buffer_gets_truncated_response() {
        let regs = Registers::new();
        let mut buf = [0u8; 4];
        assert_eq!(regs.fill_get_report(&mut buf), 4);
        assert_eq!(buf, [0x5D, 0x00, 0x00, 0x00]);
    }
}
