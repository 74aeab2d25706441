//! Operand encodings for INIT and the voltage commands.

/// Bus clock selection sent as the INIT operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BusSpeed {
    #[default]
    Standard100k = 0,
    Fast250k = 1,
    Fast400k = 2,
}

impl BusSpeed {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes an INIT operand. Unknown codes fall back to 100 kHz.
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Fast250k,
            2 => Self::Fast400k,
            _ => Self::Standard100k,
        }
    }

    pub const fn from_khz(khz: u32) -> Option<Self> {
        match khz {
            100 => Some(Self::Standard100k),
            250 => Some(Self::Fast250k),
            400 => Some(Self::Fast400k),
            _ => None,
        }
    }

    pub const fn khz(self) -> u32 {
        match self {
            Self::Standard100k => 100,
            Self::Fast250k => 250,
            Self::Fast400k => 400,
        }
    }
}

/// Output rail selection used by SET_VOLTAGE and reported by GET_VOLTAGE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Voltage {
    FiveVolt = 0x01,
    ThreeVolt3 = 0x02,
}

impl Voltage {
    /// Rail selected after every boot.
    pub const SAFE_DEFAULT: Self = Self::ThreeVolt3;

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::FiveVolt),
            0x02 => Some(Self::ThreeVolt3),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Voltage {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

impl core::fmt::Display for Voltage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::FiveVolt => f.write_str("5.0"),
            Self::ThreeVolt3 => f.write_str("3.3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_codes_fall_back_to_standard() {
        assert_eq!(BusSpeed::from_code(0), BusSpeed::Standard100k);
        assert_eq!(BusSpeed::from_code(1), BusSpeed::Fast250k);
        assert_eq!(BusSpeed::from_code(2), BusSpeed::Fast400k);
        for code in 3..=u8::MAX {
            assert_eq!(BusSpeed::from_code(code), BusSpeed::Standard100k);
        }
    }

    #[test]
    fn speed_from_khz() {
        assert_eq!(BusSpeed::from_khz(250).map(BusSpeed::code), Some(1));
        assert_eq!(BusSpeed::from_khz(1000), None);
    }

    #[test]
    fn voltage_codes() {
        assert_eq!(Voltage::try_from(0x01), Ok(Voltage::FiveVolt));
        assert_eq!(Voltage::try_from(0x02), Ok(Voltage::ThreeVolt3));
        assert_eq!(Voltage::try_from(0x03), Err(0x03));
        assert_eq!(Voltage::SAFE_DEFAULT, Voltage::ThreeVolt3);
    }
}
