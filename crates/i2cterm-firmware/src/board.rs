//! Board-level I/O the dispatcher and the service loop depend on.

use i2cterm_protocol::Voltage;

/// State of the two switched output rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rails {
    pub five_volt: bool,
    pub three_volt3: bool,
}

impl Rails {
    pub const OFF: Self = Self {
        five_volt: false,
        three_volt3: false,
    };

    /// Exactly one rail energised.
    pub const fn only(voltage: Voltage) -> Self {
        match voltage {
            Voltage::FiveVolt => Self {
                five_volt: true,
                three_volt3: false,
            },
            Voltage::ThreeVolt3 => Self {
                five_volt: false,
                three_volt3: true,
            },
        }
    }
}

pub trait Board {
    /// Level of the USB host sense input.
    fn host_present(&mut self) -> bool;

    fn set_status_led(&mut self, on: bool);

    fn set_rails(&mut self, rails: Rails);

    /// Arms the watchdog and waits for it to reset the device.
    fn reboot(&mut self) -> !;
}
