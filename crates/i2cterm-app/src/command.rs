//! Parsing of terminal input lines.

use std::str::FromStr;

use i2cterm_protocol::{BusSpeed, Command, RequestFrame, Voltage};
use thiserror::Error;

/// Names accepted at the prompt, in help order.
pub const COMMANDS: [&str; 10] = [
    "help",
    "init",
    "start",
    "stop",
    "write",
    "write-address",
    "read",
    "output-voltage",
    "reset",
    "exit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Help(Option<String>),
    Exit,
    Init(BusSpeed),
    Start,
    Stop,
    Write(u8),
    WriteAddress(u8),
    Read { ack: bool },
    OutputVoltage(Voltage),
    Reset,
}

impl Action {
    /// The device request for this action; `None` for local commands.
    pub fn request(&self) -> Option<RequestFrame> {
        let (command, data) = match *self {
            Action::Help(_) | Action::Exit => return None,
            Action::Init(speed) => (Command::I2cInit, speed.code()),
            Action::Start => (Command::I2cStart, 0),
            Action::Stop => (Command::I2cStop, 0),
            Action::Write(byte) => (Command::I2cWrite, byte),
            Action::WriteAddress(byte) => (Command::I2cWriteAddr, byte),
            Action::Read { ack } => (Command::I2cRead, u8::from(ack)),
            Action::OutputVoltage(v) => (Command::SetVoltage, v.code()),
            Action::Reset => (Command::Reset, 0),
        };
        Some(RequestFrame::new(command, data))
    }
}

/// A parsed line. `ignored` is set when the command takes no parameter but
/// one was given anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub action: Action,
    pub ignored: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty input.")]
    Empty,
    #[error("Unknown command.")]
    Unknown(String),
    #[error("Required parameter(s) are missing.")]
    MissingParameter(&'static str),
    #[error("Specified parameter is out of range.")]
    OutOfRange,
    #[error("Unsupported I2C speed, only 100kHz, 250kHz and 400kHz are supported by the device.")]
    UnsupportedSpeed,
    #[error("Unsupported read flag, only ack, nack, 1 and 0 are allowed as parameters.")]
    BadReadFlag,
    #[error("Invalid voltage level, only 3.3V or 5V output is available with the device.")]
    BadVoltage,
}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut tokens = input.split_whitespace();
        let name = tokens.next().ok_or(ParseError::Empty)?;
        let param = tokens.next();

        let (action, takes_param) = match name {
            "help" => (Action::Help(param.map(str::to_owned)), true),
            "exit" => (Action::Exit, false),
            "start" => (Action::Start, false),
            "stop" => (Action::Stop, false),
            "reset" => (Action::Reset, false),
            "init" => (Action::Init(parse_speed(required("init", param)?)?), true),
            "write" => (Action::Write(parse_byte(required("write", param)?)?), true),
            "write-address" => (Action::WriteAddress(parse_byte(required("write-address", param)?)?), true),
            "read" => {
                let ack = match param {
                    Some(flag) => parse_read_flag(flag)?,
                    None => false,
                };
                (Action::Read { ack }, true)
            }
            "output-voltage" => (Action::OutputVoltage(parse_voltage(required("output-voltage", param)?)?), true),
            _ => return Err(ParseError::Unknown(name.to_owned())),
        };

        Ok(Line {
            action,
            ignored: !takes_param && param.is_some(),
        })
    }
}

fn required<'a>(command: &'static str, param: Option<&'a str>) -> Result<&'a str, ParseError> {
    param.ok_or(ParseError::MissingParameter(command))
}

fn parse_speed(text: &str) -> Result<BusSpeed, ParseError> {
    u32::try_from(parse_number(text))
        .ok()
        .and_then(BusSpeed::from_khz)
        .ok_or(ParseError::UnsupportedSpeed)
}

fn parse_byte(text: &str) -> Result<u8, ParseError> {
    u8::try_from(parse_number(text)).map_err(|_| ParseError::OutOfRange)
}

fn parse_read_flag(text: &str) -> Result<bool, ParseError> {
    match text {
        "ack" | "1" => Ok(true),
        "nack" | "0" => Ok(false),
        _ => Err(ParseError::BadReadFlag),
    }
}

fn parse_voltage(text: &str) -> Result<Voltage, ParseError> {
    match text {
        "3.3" | "3.3V" | "3.3v" => Ok(Voltage::ThreeVolt3),
        "5" | "5.0" | "5V" | "5v" | "5.0V" | "5.0v" => Ok(Voltage::FiveVolt),
        _ => Err(ParseError::BadVoltage),
    }
}

/// Reads an integer the way C's `strtol(.., 0)` does: optional sign, `0x`
/// for hex, a leading `0` for octal, otherwise decimal. Parsing stops at the
/// first character that is not a digit of the base; no digits yields 0.
pub fn parse_number(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        if hex.starts_with(|c: char| c.is_ascii_hexdigit()) {
            (16, hex)
        } else {
            (8, rest)
        }
    } else if rest.starts_with('0') {
        (8, rest)
    } else {
        (10, rest)
    };

    let mut value: i64 = 0;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else { break };
        value = value.saturating_mul(i64::from(radix)).saturating_add(i64::from(d));
    }
    if negative {
        -value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Line, ParseError> {
        line.parse()
    }

    fn action(line: &str) -> Action {
        parse(line).unwrap().action
    }

    #[test]
    fn numbers_follow_c_conventions() {
        assert_eq!(parse_number("42"), 42);
        assert_eq!(parse_number("0x2A"), 42);
        assert_eq!(parse_number("052"), 42);
        assert_eq!(parse_number("-1"), -1);
        assert_eq!(parse_number("12abc"), 12);
        assert_eq!(parse_number("zz"), 0);
        assert_eq!(parse_number("0x"), 0);
    }

    #[test]
    fn init_accepts_three_speeds() {
        assert_eq!(action("init 100"), Action::Init(BusSpeed::Standard100k));
        assert_eq!(action("init 250"), Action::Init(BusSpeed::Fast250k));
        assert_eq!(action("init 400"), Action::Init(BusSpeed::Fast400k));
        assert_eq!(parse("init 300"), Err(ParseError::UnsupportedSpeed));
        assert_eq!(parse("init"), Err(ParseError::MissingParameter("init")));
    }

    #[test]
    fn byte_parameters() {
        assert_eq!(action("write 0xA5"), Action::Write(0xA5));
        assert_eq!(action("write-address 160"), Action::WriteAddress(0xA0));
        assert_eq!(parse("write 256"), Err(ParseError::OutOfRange));
        assert_eq!(parse("write -1"), Err(ParseError::OutOfRange));
        assert_eq!(parse("write-address"), Err(ParseError::MissingParameter("write-address")));
    }

    #[test]
    fn read_defaults_to_nack() {
        assert_eq!(action("read"), Action::Read { ack: false });
        assert_eq!(action("read ack"), Action::Read { ack: true });
        assert_eq!(action("read 1"), Action::Read { ack: true });
        assert_eq!(action("read nack"), Action::Read { ack: false });
        assert_eq!(parse("read yes"), Err(ParseError::BadReadFlag));
    }

    #[test]
    fn voltage_spellings() {
        for text in ["3.3", "3.3V", "3.3v"] {
            assert_eq!(action(&format!("output-voltage {text}")), Action::OutputVoltage(Voltage::ThreeVolt3));
        }
        for text in ["5", "5.0", "5V", "5v", "5.0V", "5.0v"] {
            assert_eq!(action(&format!("output-voltage {text}")), Action::OutputVoltage(Voltage::FiveVolt));
        }
        assert_eq!(parse("output-voltage 12"), Err(ParseError::BadVoltage));
    }

    #[test]
    fn surplus_parameters_are_flagged() {
        let line = parse("start now").unwrap();
        assert_eq!(line.action, Action::Start);
        assert!(line.ignored);
        assert!(!parse("stop").unwrap().ignored);
        assert!(!parse("write 1 2").unwrap().ignored);
    }

    #[test]
    fn local_and_unknown_commands() {
        assert_eq!(action("help"), Action::Help(None));
        assert_eq!(action("help read"), Action::Help(Some("read".into())));
        assert_eq!(action("  exit  "), Action::Exit);
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert_eq!(parse("scan"), Err(ParseError::Unknown("scan".into())));
    }

    #[test]
    fn actions_map_to_requests() {
        assert_eq!(action("read ack").request(), Some(RequestFrame::new(Command::I2cRead, 1)));
        assert_eq!(action("init 400").request(), Some(RequestFrame::new(Command::I2cInit, 2)));
        assert_eq!(
            action("output-voltage 5").request(),
            Some(RequestFrame::new(Command::SetVoltage, 0x01))
        );
        assert_eq!(action("help").request(), None);
    }
}
