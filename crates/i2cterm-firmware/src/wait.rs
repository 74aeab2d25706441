//! Bounded waits that keep the USB link serviced.
//!
//! The device has a single thread of control, so a hardware wait may only
//! block if it hands control to the USB stack on every iteration. All
//! waiting in the firmware goes through [`Waiter`].

use embedded_hal::delay::DelayNs;

use crate::driver::BusError;

/// Polls allowed before a bus primitive gives up.
pub const DEFAULT_BUDGET: u16 = 0x7FF;

/// Delay between two polls, in microseconds.
pub const DEFAULT_STEP_US: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub budget: u16,
    pub step_us: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            step_us: DEFAULT_STEP_US,
        }
    }
}

pub struct Waiter<D> {
    delay: D,
    config: WaitConfig,
}

impl<D: DelayNs> Waiter<D> {
    pub fn new(delay: D, config: WaitConfig) -> Self {
        Self { delay, config }
    }

    pub fn config(&self) -> WaitConfig {
        self.config
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Spins until `done` reports completion or the budget runs out.
    ///
    /// Each unsuccessful poll is followed by one step delay and one call to
    /// `service`, so a timed-out wait services the link exactly `budget`
    /// times.
    pub fn spin_until<P, S>(&mut self, mut done: P, service: &mut S) -> Result<(), BusError>
    where
        P: FnMut() -> bool,
        S: FnMut(),
    {
        for _ in 0..self.config.budget {
            if done() {
                return Ok(());
            }
            self.delay.delay_us(self.config.step_us);
            service();
        }
        Err(BusError::Timeout)
    }

    /// Holds for `countdown - 1` steps, servicing the link on each of them.
    pub fn settle<S: FnMut()>(&mut self, countdown: u16, service: &mut S) {
        for _ in 1..countdown {
            service();
            self.delay.delay_us(self.config.step_us);
        }
    }

    /// Plain delay, for use before the USB stack is running.
    pub fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimDelay;

    #[test]
    fn completes_without_servicing_when_already_done() {
        let mut waiter = Waiter::new(SimDelay::default(), WaitConfig::default());
        let mut serviced = 0;
        assert_eq!(waiter.spin_until(|| true, &mut || serviced += 1), Ok(()));
        assert_eq!(serviced, 0);
    }

    #[test]
    fn services_once_per_failed_poll() {
        let mut waiter = Waiter::new(SimDelay::default(), WaitConfig::default());
        let mut polls = 0;
        let mut serviced = 0;
        let result = waiter.spin_until(
            || {
                polls += 1;
                polls > 5
            },
            &mut || serviced += 1,
        );
        assert_eq!(result, Ok(()));
        assert_eq!(serviced, 5);
    }

    #[test]
    fn timeout_services_exactly_budget_times() {
        let mut waiter = Waiter::new(SimDelay::default(), WaitConfig::default());
        let mut serviced = 0u32;
        let result = waiter.spin_until(|| false, &mut || serviced += 1);
        assert_eq!(result, Err(BusError::Timeout));
        assert_eq!(serviced, u32::from(DEFAULT_BUDGET));
        assert_eq!(waiter.delay().elapsed_us(), u64::from(DEFAULT_BUDGET) * u64::from(DEFAULT_STEP_US));
    }

    #[test]
    fn settle_counts_down_like_a_predecrement_loop() {
        let mut waiter = Waiter::new(SimDelay::default(), WaitConfig::default());
        let mut serviced = 0;
        waiter.settle(0x96, &mut || serviced += 1);
        assert_eq!(serviced, 0x95);
    }
}
