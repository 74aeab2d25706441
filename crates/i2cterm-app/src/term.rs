//! VT100 output helpers and fixed terminal texts.

use std::io::{self, BufRead, Write};

use i2cterm_core::{Severity, StatusMessage};

const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD_WHITE: &str = "\x1b[1m\x1b[37m";
const RESET: &str = "\x1b[0m";

pub const INTRO: &str = "I2C Terminal";
pub const HELP_REFERENCE: &str = "Type \"help\" to list the available commands, or \"help [COMMAND]\" for details on one of them.";

pub fn bold(text: &str) -> String {
    format!("{BOLD_WHITE}{text}{RESET}")
}

pub fn error(text: &str) {
    println!("{RED}{text}{RESET}");
}

/// Error tied to the command that caused it, e.g. `init: Required ...`.
pub fn command_error(command: &str, text: &str) {
    println!("{RED}{command}: {text}{RESET}");
}

pub fn warning(text: &str) {
    println!("{text}");
}

pub fn status(text: &str) {
    println!("{YELLOW}{text}{RESET}");
}

pub fn message(msg: &StatusMessage) {
    match msg.severity {
        Severity::Status => status(&msg.text),
        Severity::Error => error(&msg.text),
        Severity::Data => println!("{}", msg.text),
    }
}

pub fn voltage(level: impl std::fmt::Display) {
    println!("Current I2C output voltage: {}", bold(&format!("{level}V")));
}

/// Asks a yes/no question until the answer is one of `y`, `Y`, `n`, `N`.
/// End of input counts as no.
pub fn confirm(question: &str, input: &mut impl BufRead) -> io::Result<bool> {
    loop {
        print!("{question} (Y/N) ? ");
        io::stdout().flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            println!();
            return Ok(false);
        }
        match answer.trim() {
            "y" | "Y" => return Ok(true),
            "n" | "N" => return Ok(false),
            _ => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn confirm_repeats_until_answered() {
        let mut input = Cursor::new("maybe\n\ny\n");
        assert!(confirm("continue", &mut input).unwrap());

        let mut input = Cursor::new("N\n");
        assert!(!confirm("continue", &mut input).unwrap());
    }

    #[test]
    fn end_of_input_declines() {
        let mut input = Cursor::new("");
        assert!(!confirm("continue", &mut input).unwrap());
    }
}
