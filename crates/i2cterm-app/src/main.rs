mod command;
mod help;
#[cfg(feature = "hidapi")]
mod hid;
mod settings;
mod sim;
mod term;

use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use i2cterm_core::{describe, render, BridgeClient, BridgeError, FeatureTransport, Session, VoltageChange};
use i2cterm_protocol::{RequestFrame, Voltage};
use log::{info, warn};

use crate::command::{parse_number, Action, Line, ParseError};
use crate::settings::Settings;
use crate::sim::SimulatedTransport;

const VOLTAGE_PROMPT: &str =
    "Selected voltage level is different from the current output voltage, continue the voltage change";

/// Interactive terminal for the USB I2C bridge.
#[derive(Debug, Parser)]
#[command(name = "i2cterm", version, about)]
struct Args {
    /// Run against a simulated bridge instead of USB hardware.
    #[arg(long)]
    simulate: bool,

    /// Interval between response polls, in milliseconds.
    #[arg(long, value_name = "MS")]
    poll_ms: Option<u64>,

    /// Give up on a command after this many milliseconds.
    #[arg(long, value_name = "MS", conflicts_with = "no_timeout")]
    timeout_ms: Option<u64>,

    /// Wait for the device indefinitely.
    #[arg(long)]
    no_timeout: bool,

    /// USB vendor id of the bridge.
    #[arg(long, value_parser = parse_usb_id)]
    vid: Option<u16>,

    /// USB product id of the bridge.
    #[arg(long, value_parser = parse_usb_id)]
    pid: Option<u16>,

    /// Store the effective settings as the new defaults and exit.
    #[arg(long)]
    save_settings: bool,

    /// Print the exchanged frames when the session ends.
    #[arg(long)]
    transcript: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(ms) = self.poll_ms {
            settings.poll_interval_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            settings.response_timeout_ms = Some(ms);
        }
        if self.no_timeout {
            settings.response_timeout_ms = None;
        }
        if let Some(vid) = self.vid {
            settings.vendor_id = vid;
        }
        if let Some(pid) = self.pid {
            settings.product_id = pid;
        }
    }
}

fn parse_usb_id(text: &str) -> Result<u16, String> {
    u16::try_from(parse_number(text)).map_err(|_| format!("{text} is not a 16-bit id"))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = Settings::load()?;
    args.apply(&mut settings);
    if args.save_settings {
        let path = settings.save()?;
        println!("Settings saved to {}", path.display());
        return Ok(());
    }

    let transport = match open_transport(&args, &settings) {
        Ok(t) => t,
        Err(e) => {
            term::error("I2C Terminal device is not connected to the system or not functioning properly.");
            return Err(e);
        }
    };
    let client = BridgeClient::new(transport, settings.client_config());

    println!("{}", term::INTRO);
    println!("{}", term::HELP_REFERENCE);

    let mut session = Session::open(client).map_err(|e| {
        term::error("Unable to get I2C output voltage from the device.");
        anyhow::Error::new(e)
    })?;
    term::voltage(session.voltage());

    let stdin = io::stdin();
    let result = run(&mut session, &mut stdin.lock());

    if args.transcript {
        print!("{}", session.client().log().to_text(true));
    }
    result
}

fn open_transport(args: &Args, settings: &Settings) -> Result<Box<dyn FeatureTransport>> {
    if args.simulate {
        info!("using simulated bridge");
        return Ok(Box::new(SimulatedTransport::spawn()));
    }
    open_hid(settings)
}

#[cfg(feature = "hidapi")]
fn open_hid(settings: &Settings) -> Result<Box<dyn FeatureTransport>> {
    let transport = hid::HidTransport::open(settings.vendor_id, settings.product_id)?;
    Ok(Box::new(transport))
}

#[cfg(not(feature = "hidapi"))]
fn open_hid(settings: &Settings) -> Result<Box<dyn FeatureTransport>> {
    anyhow::bail!(
        "cannot open {:04x}:{:04x}: built without the `hidapi` feature, use --simulate",
        settings.vendor_id,
        settings.product_id
    )
}

/// Reads commands until `exit` or end of input.
fn run<T, R>(session: &mut Session<T>, input: &mut R) -> Result<()>
where
    T: FeatureTransport + 'static,
    R: BufRead,
{
    let mut text = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        text.clear();
        if input.read_line(&mut text)? == 0 {
            println!();
            return Ok(());
        }

        let line = match text.parse::<Line>() {
            Ok(line) => line,
            Err(ParseError::Empty) => continue,
            Err(e @ ParseError::MissingParameter(command)) => {
                term::command_error(command, &e.to_string());
                continue;
            }
            Err(e) => {
                term::error(&e.to_string());
                continue;
            }
        };
        if line.ignored {
            term::warning("Specified parameters are ignored by the command.");
        }

        match line.action {
            Action::Exit => return Ok(()),
            Action::Help(topic) => print!("{}", topic.as_deref().map_or_else(help::general, help::topic)),
            Action::OutputVoltage(target) => change_voltage(session, target, input)?,
            action => {
                if let Some(request) = action.request() {
                    execute(session, request);
                }
            }
        }
    }
}

fn execute<T: FeatureTransport + 'static>(session: &mut Session<T>, request: RequestFrame) {
    match session.execute(request) {
        Ok(response) => render(&response).iter().for_each(term::message),
        Err(e) => report(&e),
    }
}

/// Voltage changes are confirmed first and always followed by a read-back.
/// Losing track of the output voltage ends the session.
fn change_voltage<T, R>(session: &mut Session<T>, target: Voltage, input: &mut R) -> Result<()>
where
    T: FeatureTransport + 'static,
    R: BufRead,
{
    let outcome = session.set_voltage(target, |_, _| {
        term::confirm(VOLTAGE_PROMPT, input).unwrap_or_else(|e| {
            warn!("reading confirmation failed: {e}");
            false
        })
    });

    match outcome {
        Ok(VoltageChange::Unchanged(_)) => {
            term::warning("Current output voltage is same as the specified voltage.")
        }
        Ok(VoltageChange::Declined) => {}
        Ok(VoltageChange::Applied { status, voltage }) => {
            if let Some(msg) = describe(status) {
                term::message(&msg);
            }
            term::voltage(voltage);
        }
        Err(e) => {
            report(&e);
            let voltage = session.refresh_voltage().map_err(|e| {
                term::error("Unable to get I2C output voltage from the device.");
                anyhow::Error::new(e)
            })?;
            term::voltage(voltage);
        }
    }
    Ok(())
}

fn report(e: &BridgeError) {
    warn!("{e}");
    match e {
        BridgeError::Transport(_) => term::error("Communication failure has occurred while talking to the device."),
        other => term::error(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_settings() {
        let args = Args::parse_from(["i2cterm", "--poll-ms", "20", "--no-timeout", "--vid", "0x1234"]);
        let mut settings = Settings::default();
        args.apply(&mut settings);
        assert_eq!(settings.poll_interval_ms, 20);
        assert_eq!(settings.response_timeout_ms, None);
        assert_eq!(settings.vendor_id, 0x1234);
        assert_eq!(settings.product_id, 0x1231);
    }

    #[test]
    fn timeout_flags_conflict() {
        assert!(Args::try_parse_from(["i2cterm", "--timeout-ms", "5", "--no-timeout"]).is_err());
    }

    #[test]
    fn usb_ids_accept_hex() {
        assert_eq!(parse_usb_id("0x16C0"), Ok(0x16C0));
        assert!(parse_usb_id("0x10000").is_err());
    }
}
