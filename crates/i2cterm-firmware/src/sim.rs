//! Simulated hardware for tests and for running the firmware on a host.
//!
//! [`SimTwi`] behaves like a TWI master with at most one memory-style slave
//! attached: the first byte written after SLA+W sets the register pointer,
//! later bytes are stored there, and reads stream out from the pointer.
//! Completion can be delayed by a number of control-register polls, or
//! withheld entirely to provoke timeouts.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::board::{Board, Rails};
use crate::registers::{Registers, UsbLink};
use crate::twi::{power_on, Control, TwiController, PRESCALER_MASK, STATUS_NO_INFO};

/// A memory-style I2C slave with 256 byte registers.
#[derive(Debug, Clone)]
pub struct SimSlave {
    address: u8,
    memory: [u8; 256],
    pointer: u8,
    pointer_set: bool,
}

impl SimSlave {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            memory: [0; 256],
            pointer: 0,
            pointer_set: false,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn memory(&self) -> &[u8; 256] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8; 256] {
        &mut self.memory
    }

    fn begin_write(&mut self) {
        self.pointer_set = false;
    }

    fn receive(&mut self, byte: u8) {
        if self.pointer_set {
            self.memory[usize::from(self.pointer)] = byte;
            self.pointer = self.pointer.wrapping_add(1);
        } else {
            self.pointer = byte;
            self.pointer_set = true;
        }
    }

    fn transmit(&mut self) -> u8 {
        let byte = self.memory[usize::from(self.pointer)];
        self.pointer = self.pointer.wrapping_add(1);
        byte
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusState {
    Idle,
    Started,
    Transmit { acked: bool },
    Receive { acked: bool },
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    status: u8,
    data: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct SimTwi {
    control: Control,
    status: u8,
    data: u8,
    bit_rate: u8,
    own_address: u8,
    pins_released: bool,
    bus: BusState,
    slave: Option<SimSlave>,
    latency: Option<u16>,
    countdown: Option<u16>,
    outcome: Option<Outcome>,
    injected: Option<u8>,
}

impl Default for SimTwi {
    fn default() -> Self {
        Self::new()
    }
}

impl SimTwi {
    /// An empty bus that completes every operation on the first poll.
    pub fn new() -> Self {
        Self {
            control: Control::empty(),
            status: power_on::STATUS,
            data: power_on::DATA,
            bit_rate: power_on::BIT_RATE,
            own_address: power_on::OWN_ADDRESS,
            pins_released: false,
            bus: BusState::Idle,
            slave: None,
            latency: Some(0),
            countdown: None,
            outcome: None,
            injected: None,
        }
    }

    pub fn with_slave(slave: SimSlave) -> Self {
        Self {
            slave: Some(slave),
            ..Self::new()
        }
    }

    /// Polls of the control register before an operation completes. `None`
    /// means operations never complete.
    pub fn set_latency(&mut self, latency: Option<u16>) {
        self.latency = latency;
    }

    /// Forces the status code reported by the next completed operation.
    pub fn inject_status(&mut self, code: u8) {
        self.injected = Some(code);
    }

    pub fn slave(&self) -> Option<&SimSlave> {
        self.slave.as_ref()
    }

    pub fn last_control(&self) -> Control {
        self.control
    }

    pub fn bit_rate(&self) -> u8 {
        self.bit_rate
    }

    pub fn prescaler(&self) -> u8 {
        self.status & PRESCALER_MASK
    }

    pub fn status_register(&self) -> u8 {
        self.status
    }

    pub fn data_register(&self) -> u8 {
        self.data
    }

    pub fn own_address(&self) -> u8 {
        self.own_address
    }

    pub fn pins_released(&self) -> bool {
        self.pins_released
    }

    fn execute(&mut self, control: Control) -> Outcome {
        if control.contains(Control::TWSTA) {
            let status = if self.bus == BusState::Idle { 0x08 } else { 0x10 };
            self.bus = BusState::Started;
            return Outcome { status, data: None };
        }

        match self.bus {
            BusState::Started => self.address(self.data),
            BusState::Transmit { acked: true } => {
                if let Some(slave) = self.slave.as_mut() {
                    slave.receive(self.data);
                }
                Outcome { status: 0x28, data: None }
            }
            BusState::Transmit { acked: false } => Outcome { status: 0x30, data: None },
            BusState::Receive { acked } => {
                let byte = match self.slave.as_mut() {
                    Some(slave) if acked => slave.transmit(),
                    _ => 0xFF,
                };
                let status = if control.contains(Control::TWEA) { 0x50 } else { 0x58 };
                Outcome { status, data: Some(byte) }
            }
            BusState::Idle => Outcome { status: STATUS_NO_INFO, data: None },
        }
    }

    fn address(&mut self, byte: u8) -> Outcome {
        let target = byte >> 1;
        let read = byte & 1 == 1;
        let slave = self.slave.as_mut().filter(|s| s.address == target);
        let acked = slave.is_some();

        let status = if read {
            self.bus = BusState::Receive { acked };
            if acked { 0x40 } else { 0x48 }
        } else {
            if let Some(slave) = slave {
                slave.begin_write();
            }
            self.bus = BusState::Transmit { acked };
            if acked { 0x18 } else { 0x20 }
        };
        Outcome { status, data: None }
    }
}

impl TwiController for SimTwi {
    fn write_control(&mut self, control: Control) {
        self.control = control - Control::TWINT;
        self.outcome = None;

        if !control.contains(Control::TWEN) {
            self.bus = BusState::Idle;
            return;
        }
        if control.contains(Control::TWSTO) {
            self.bus = BusState::Idle;
            self.control.remove(Control::TWSTO);
            return;
        }
        if !control.contains(Control::TWINT) {
            return;
        }

        let mut outcome = self.execute(control);
        if let Some(code) = self.injected.take() {
            outcome.status = code;
        }
        self.outcome = Some(outcome);
        self.countdown = self.latency;
    }

    fn read_control(&mut self) -> Control {
        if let Some(outcome) = self.outcome {
            match self.countdown {
                Some(0) => {
                    self.status = (self.status & PRESCALER_MASK) | (outcome.status & !PRESCALER_MASK);
                    if let Some(byte) = outcome.data {
                        self.data = byte;
                    }
                    self.control |= Control::TWINT;
                    self.outcome = None;
                }
                Some(n) => self.countdown = Some(n - 1),
                None => {}
            }
        }
        self.control
    }

    fn write_data(&mut self, byte: u8) {
        self.data = byte;
    }

    fn read_data(&mut self) -> u8 {
        self.data
    }

    fn write_status(&mut self, value: u8) {
        self.status = value;
    }

    fn read_status(&mut self) -> u8 {
        self.status
    }

    fn write_bit_rate(&mut self, value: u8) {
        self.bit_rate = value;
    }

    fn write_own_address(&mut self, value: u8) {
        self.own_address = value;
    }

    fn release_pins(&mut self) {
        self.pins_released = true;
    }
}

/// Delay that only accounts for the time it was asked to wait.
#[derive(Debug, Clone, Default)]
pub struct SimDelay {
    elapsed_ns: u64,
}

impl SimDelay {
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}

const RAIL_HISTORY: usize = 32;

/// Board with a recorded rail history and a host that is always present
/// unless told otherwise.
#[derive(Debug, Clone)]
pub struct SimBoard {
    host_present: bool,
    led: bool,
    rails: Rails,
    history: Vec<Rails, RAIL_HISTORY>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    pub fn new() -> Self {
        Self {
            host_present: true,
            led: false,
            rails: Rails::OFF,
            history: Vec::new(),
        }
    }

    pub fn set_host_present(&mut self, present: bool) {
        self.host_present = present;
    }

    pub fn led(&self) -> bool {
        self.led
    }

    pub fn rails(&self) -> Rails {
        self.rails
    }

    /// Every rail state applied so far, oldest first. Only the most recent
    /// entries are kept.
    pub fn rail_history(&self) -> &[Rails] {
        &self.history
    }

    pub fn clear_rail_history(&mut self) {
        self.history.clear();
    }
}

impl Board for SimBoard {
    fn host_present(&mut self) -> bool {
        self.host_present
    }

    fn set_status_led(&mut self, on: bool) {
        self.led = on;
    }

    fn set_rails(&mut self, rails: Rails) {
        assert!(
            !(rails.five_volt && rails.three_volt3),
            "both output rails energised"
        );
        if self.history.is_full() {
            self.history.remove(0);
        }
        // Capacity was just ensured above.
        let _ = self.history.push(rails);
        self.rails = rails;
    }

    fn reboot(&mut self) -> ! {
        panic!("watchdog reboot");
    }
}

const QUEUE_DEPTH: usize = 4;

/// USB link that counts how often it is serviced and delivers queued SET
/// reports one per poll.
#[derive(Debug, Default)]
pub struct RecordingLink {
    polls: u32,
    connected: bool,
    queued: Vec<[u8; 4], QUEUE_DEPTH>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Queues a SET report for delivery on a later poll. Reports beyond the
    /// queue depth are dropped.
    pub fn queue(&mut self, report: &[u8; 4]) {
        let _ = self.queued.push(*report);
    }
}

impl UsbLink for RecordingLink {
    fn poll(&mut self, registers: &mut Registers) {
        self.polls += 1;
        if !self.queued.is_empty() {
            let report = self.queued.remove(0);
            registers.accept_set_report(&report);
        }
    }

    fn connect(&mut self) {
        self.connected = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_counts_control_polls() {
        let mut twi = SimTwi::new();
        twi.set_latency(Some(2));
        twi.write_control(Control::TWINT | Control::TWEN | Control::TWSTA);
        assert!(!twi.read_control().contains(Control::TWINT));
        assert!(!twi.read_control().contains(Control::TWINT));
        assert!(twi.read_control().contains(Control::TWINT));
        assert_eq!(twi.read_status() & 0xF8, 0x08);
    }

    #[test]
    fn data_without_start_reports_no_state() {
        let mut twi = SimTwi::new();
        twi.write_data(0x10);
        twi.write_control(Control::TWINT | Control::TWEN);
        assert!(twi.read_control().contains(Control::TWINT));
        assert_eq!(twi.read_status() & 0xF8, STATUS_NO_INFO);
    }

    #[test]
    fn read_without_slave_sees_idle_bus() {
        let mut twi = SimTwi::new();
        twi.write_control(Control::TWINT | Control::TWEN | Control::TWSTA);
        twi.read_control();
        twi.write_data(0xA1);
        twi.write_control(Control::TWINT | Control::TWEN);
        twi.read_control();
        assert_eq!(twi.read_status() & 0xF8, 0x48);
        twi.write_control(Control::TWINT | Control::TWEN | Control::TWEA);
        twi.read_control();
        assert_eq!(twi.read_data(), 0xFF);
        assert_eq!(twi.read_status() & 0xF8, 0x50);
    }

    #[test]
    #[should_panic(expected = "both output rails energised")]
    fn board_rejects_both_rails() {
        let mut board = SimBoard::new();
        board.set_rails(Rails {
            five_volt: true,
            three_volt3: true,
        });
    }
}
