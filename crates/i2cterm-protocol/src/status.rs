/// Status byte of a response frame.
///
/// Four values are reserved by the bridge itself; every other value is the
/// raw TWI status register as left by the hardware, passed through without
/// interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Pending,
    Unsupported,
    Timeout,
    Bus(u8),
}

impl Status {
    pub const SUCCESS: u8 = 0x00;
    pub const PENDING: u8 = 0x01;
    pub const UNSUPPORTED: u8 = 0x02;
    pub const TIMEOUT: u8 = 0xFF;

    pub const fn from_code(code: u8) -> Self {
        match code {
            Self::SUCCESS => Self::Success,
            Self::PENDING => Self::Pending,
            Self::UNSUPPORTED => Self::Unsupported,
            Self::TIMEOUT => Self::Timeout,
            other => Self::Bus(other),
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Success => Self::SUCCESS,
            Self::Pending => Self::PENDING,
            Self::Unsupported => Self::UNSUPPORTED,
            Self::Timeout => Self::TIMEOUT,
            Self::Bus(code) => code,
        }
    }

    /// A pending status must never be treated as the outcome of a command.
    pub const fn is_final(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<u8> for Status {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.code()
    }
}
