//! Translates requests into bus primitives and local actions.

use embedded_hal::delay::DelayNs;
use i2cterm_protocol::{Command, RequestFrame, ResponseFrame, Status, Voltage};
use log::{debug, info, warn};

use crate::board::{Board, Rails};
use crate::driver::{BusDriver, BusError};
use crate::registers::{Registers, UsbLink};
use crate::twi::TwiController;

/// Countdown the rails are held off for while switching voltage.
pub const VOLTAGE_SETTLE_COUNTDOWN: u16 = 0xFF;

/// Countdown the rails are held off for during RESET.
pub const RESET_SETTLE_COUNTDOWN: u16 = 0x96;

/// Owns the request/response registers and everything a request can touch.
pub struct Dispatcher<T, D, B> {
    driver: BusDriver<T, D>,
    board: B,
    registers: Registers,
    voltage: Voltage,
}

impl<T, D, B> Dispatcher<T, D, B>
where
    T: TwiController,
    D: DelayNs,
    B: Board,
{
    /// The rail state starts at the safe default; nothing is energised until
    /// [`apply_voltage`](Self::apply_voltage) runs.
    pub fn new(driver: BusDriver<T, D>, board: B) -> Self {
        Self {
            driver,
            board,
            registers: Registers::new(),
            voltage: Voltage::SAFE_DEFAULT,
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn driver(&self) -> &BusDriver<T, D> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut BusDriver<T, D> {
        &mut self.driver
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn voltage(&self) -> Voltage {
        self.voltage
    }

    /// Dispatches the pending request, if there is one, and publishes its
    /// outcome. Returns the published response.
    pub fn service<L: UsbLink>(&mut self, link: &mut L) -> Option<ResponseFrame> {
        let request = self.registers.take_request()?;
        let (status, data) = self.execute(request, link);
        self.registers.complete(request.command, status, data);
        Some(self.registers.response())
    }

    /// Switches the output to `voltage` without ever energising both rails.
    pub fn apply_voltage<L: UsbLink>(&mut self, voltage: Voltage, link: &mut L) {
        self.board.set_rails(Rails::OFF);
        self.settle(VOLTAGE_SETTLE_COUNTDOWN, link);
        self.board.set_rails(Rails::only(voltage));
        self.voltage = voltage;
        info!("output rail set to {voltage}V");
    }

    fn execute<L: UsbLink>(&mut self, request: RequestFrame, link: &mut L) -> (Status, u8) {
        let Some(command) = request.known_command() else {
            warn!("unsupported command 0x{:02X}", request.command);
            return (Status::Unsupported, 0);
        };
        debug!("dispatching {command} operand 0x{:02X}", request.data);

        let Self {
            driver,
            registers,
            ..
        } = &mut *self;
        let mut service = || link.poll(registers);

        match command {
            Command::None => (Status::Success, 0),
            Command::I2cInit => {
                driver.configure(request.data);
                (Status::Success, 0)
            }
            Command::I2cStart => (bus_status(driver.start(&mut service)), 0),
            Command::I2cStop => {
                driver.stop();
                (Status::Success, 0)
            }
            Command::I2cWriteAddr => (bus_status(driver.write_address(request.data, &mut service)), 0),
            Command::I2cWrite => (bus_status(driver.write(request.data, &mut service)), 0),
            Command::I2cRead => match driver.read(request.data != 0, &mut service) {
                Ok(received) => (Status::from_code(received.status), received.data),
                Err(BusError::Timeout) => (Status::Timeout, 0),
            },
            Command::SetVoltage => match Voltage::from_code(request.data) {
                Some(voltage) => {
                    self.apply_voltage(voltage, link);
                    (Status::Success, 0)
                }
                None => {
                    warn!("unsupported voltage code 0x{:02X}", request.data);
                    (Status::Unsupported, 0)
                }
            },
            Command::GetVoltage => (Status::Success, self.voltage.code()),
            Command::Reset => {
                self.reset(link);
                (Status::Success, 0)
            }
        }
    }

    /// Power-cycles the target: rails off, controller registers back to
    /// their power-on values, then the previous rail restored.
    fn reset<L: UsbLink>(&mut self, link: &mut L) {
        self.board.set_rails(Rails::OFF);
        self.driver.reset_controller();
        self.settle(RESET_SETTLE_COUNTDOWN, link);
        self.board.set_rails(Rails::only(self.voltage));
        info!("target reset, rail restored to {}V", self.voltage);
    }

    fn settle<L: UsbLink>(&mut self, countdown: u16, link: &mut L) {
        let registers = &mut self.registers;
        self.driver.waiter_mut().settle(countdown, &mut || link.poll(registers));
    }
}

fn bus_status(result: Result<u8, BusError>) -> Status {
    match result {
        Ok(code) => Status::from_code(code),
        Err(BusError::Timeout) => Status::Timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RecordingLink, SimBoard, SimDelay, SimSlave, SimTwi};
    use crate::wait::DEFAULT_BUDGET;

    type SimDispatcher = Dispatcher<SimTwi, SimDelay, SimBoard>;

    fn dispatcher(twi: SimTwi) -> SimDispatcher {
        Dispatcher::new(BusDriver::new(twi, SimDelay::default()), SimBoard::new())
    }

    fn submit(d: &mut SimDispatcher, link: &mut RecordingLink, command: u8, data: u8) -> ResponseFrame {
        assert!(d.registers_mut().accept_set_report(&[0x5D, command, data, 0x5A]));
        d.service(link).expect("request dispatched")
    }

    #[test]
    fn init_always_succeeds() {
        let mut d = dispatcher(SimTwi::new());
        let mut link = RecordingLink::new();
        for code in [0u8, 1, 2, 7, 0xFF] {
            let rsp = submit(&mut d, &mut link, 0x01, code);
            assert_eq!(rsp.status, Status::Success);
        }
        assert_eq!(d.driver().controller().bit_rate(), 72);
    }

    #[test]
    fn start_reports_hardware_code() {
        let mut d = dispatcher(SimTwi::new());
        let mut link = RecordingLink::new();
        submit(&mut d, &mut link, 0x01, 0x00);
        let rsp = submit(&mut d, &mut link, 0x02, 0x00);
        assert_eq!(rsp, ResponseFrame { command: 0x02, status: Status::Bus(0x08), data: 0 });
    }

    #[test]
    fn start_without_bus_activity_times_out_while_servicing() {
        let mut twi = SimTwi::new();
        twi.set_latency(None);
        let mut d = dispatcher(twi);
        let mut link = RecordingLink::new();
        let rsp = submit(&mut d, &mut link, 0x02, 0x00);
        assert_eq!(rsp.status, Status::Timeout);
        assert_eq!(link.polls(), u32::from(DEFAULT_BUDGET));
    }

    #[test]
    fn stop_always_succeeds() {
        let mut twi = SimTwi::new();
        twi.set_latency(None);
        let mut d = dispatcher(twi);
        let mut link = RecordingLink::new();
        assert_eq!(submit(&mut d, &mut link, 0x03, 0).status, Status::Success);
        assert_eq!(link.polls(), 0);
    }

    #[test]
    fn write_transaction_reaches_the_slave() {
        let mut d = dispatcher(SimTwi::with_slave(SimSlave::new(0x50)));
        let mut link = RecordingLink::new();
        submit(&mut d, &mut link, 0x01, 0x02);
        assert_eq!(submit(&mut d, &mut link, 0x02, 0).status, Status::Bus(0x08));
        assert_eq!(submit(&mut d, &mut link, 0x04, 0xA0).status, Status::Bus(0x18));
        assert_eq!(submit(&mut d, &mut link, 0x05, 0x10).status, Status::Bus(0x28));
        assert_eq!(submit(&mut d, &mut link, 0x05, 0x5A).status, Status::Bus(0x28));
        submit(&mut d, &mut link, 0x03, 0);

        let slave = d.driver().controller().slave().unwrap();
        assert_eq!(slave.memory()[0x10], 0x5A);
    }

    #[test]
    fn read_returns_data_byte() {
        let mut slave = SimSlave::new(0x50);
        slave.memory_mut()[0] = 0xC3;
        let mut d = dispatcher(SimTwi::with_slave(slave));
        let mut link = RecordingLink::new();
        submit(&mut d, &mut link, 0x02, 0);
        assert_eq!(submit(&mut d, &mut link, 0x04, 0xA1).status, Status::Bus(0x40));
        let rsp = submit(&mut d, &mut link, 0x06, 0x00);
        assert_eq!(rsp, ResponseFrame { command: 0x06, status: Status::Bus(0x58), data: 0xC3 });
    }

    #[test]
    fn read_timeout_reports_zero_data() {
        let mut twi = SimTwi::new();
        twi.set_latency(None);
        let mut d = dispatcher(twi);
        let mut link = RecordingLink::new();
        let rsp = submit(&mut d, &mut link, 0x06, 0x01);
        assert_eq!((rsp.status, rsp.data), (Status::Timeout, 0));
    }

    #[test]
    fn get_voltage_after_boot_is_3v3() {
        let mut d = dispatcher(SimTwi::new());
        let mut link = RecordingLink::new();
        let rsp = submit(&mut d, &mut link, 0x08, 0);
        assert_eq!((rsp.status, rsp.data), (Status::Success, 0x02));
    }

    #[test]
    fn set_voltage_switches_break_before_make() {
        let mut d = dispatcher(SimTwi::new());
        let mut link = RecordingLink::new();
        assert_eq!(submit(&mut d, &mut link, 0x07, 0x01).status, Status::Success);
        assert_eq!(d.voltage(), Voltage::FiveVolt);
        assert_eq!(d.board().rail_history(), &[Rails::OFF, Rails::only(Voltage::FiveVolt)]);
        assert_eq!(link.polls(), u32::from(VOLTAGE_SETTLE_COUNTDOWN - 1));

        let rsp = submit(&mut d, &mut link, 0x08, 0);
        assert_eq!(rsp.data, 0x01);
    }

    #[test]
    fn invalid_voltage_leaves_rail_untouched() {
        let mut d = dispatcher(SimTwi::new());
        let mut link = RecordingLink::new();
        submit(&mut d, &mut link, 0x07, 0x01);
        let history = d.board().rail_history().len();

        for code in [0x00u8, 0x03, 0xFF] {
            assert_eq!(submit(&mut d, &mut link, 0x07, code).status, Status::Unsupported);
        }
        assert_eq!(d.voltage(), Voltage::FiveVolt);
        assert_eq!(d.board().rail_history().len(), history);
        assert_eq!(d.board().rails(), Rails::only(Voltage::FiveVolt));
    }

    #[test]
    fn reset_restores_previous_rail() {
        let mut d = dispatcher(SimTwi::new());
        let mut link = RecordingLink::new();
        submit(&mut d, &mut link, 0x07, 0x01);
        submit(&mut d, &mut link, 0x01, 0x02);
        d.board_mut().clear_rail_history();

        let mut link = RecordingLink::new();
        assert_eq!(submit(&mut d, &mut link, 0x09, 0).status, Status::Success);
        assert_eq!(d.board().rail_history(), &[Rails::OFF, Rails::only(Voltage::FiveVolt)]);
        assert_eq!(link.polls(), u32::from(RESET_SETTLE_COUNTDOWN - 1));
        assert_eq!(d.driver().controller().bit_rate(), 0);
        assert_eq!(d.voltage(), Voltage::FiveVolt);
    }

    #[test]
    fn unknown_commands_are_unsupported() {
        let mut d = dispatcher(SimTwi::new());
        let mut link = RecordingLink::new();
        for id in [0x0Au8, 0x42, 0xFF] {
            let rsp = submit(&mut d, &mut link, id, 0);
            assert_eq!(rsp, ResponseFrame { command: id, status: Status::Unsupported, data: 0 });
        }
    }

    #[test]
    fn cleared_register_is_not_redispatched() {
        let mut d = dispatcher(SimTwi::new());
        let mut link = RecordingLink::new();
        let rsp = submit(&mut d, &mut link, 0x08, 0);
        assert_eq!(d.service(&mut link), None);
        assert_eq!(d.registers().response(), rsp);
    }

    #[test]
    fn request_arriving_mid_wait_is_kept_for_next_iteration() {
        let mut twi = SimTwi::new();
        twi.set_latency(Some(3));
        let mut d = dispatcher(twi);
        let mut link = RecordingLink::new();
        link.queue(&[0x5D, 0x08, 0x00, 0x5A]);

        submit(&mut d, &mut link, 0x02, 0);
        assert!(d.registers().has_request());
        let rsp = d.service(&mut link).unwrap();
        assert_eq!((rsp.command, rsp.data), (0x08, 0x02));
    }
}
