/// Command ids carried in byte 1 of a request and echoed in byte 1 of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    None = 0x00,
    I2cInit = 0x01,
    I2cStart = 0x02,
    I2cStop = 0x03,
    I2cWriteAddr = 0x04,
    I2cWrite = 0x05,
    I2cRead = 0x06,
    SetVoltage = 0x07,
    GetVoltage = 0x08,
    Reset = 0x09,
}

impl Command {
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Maps a raw id to a command, `None` for ids the device does not know.
    pub const fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0x00 => Self::None,
            0x01 => Self::I2cInit,
            0x02 => Self::I2cStart,
            0x03 => Self::I2cStop,
            0x04 => Self::I2cWriteAddr,
            0x05 => Self::I2cWrite,
            0x06 => Self::I2cRead,
            0x07 => Self::SetVoltage,
            0x08 => Self::GetVoltage,
            0x09 => Self::Reset,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::I2cInit => "I2C_INIT",
            Self::I2cStart => "I2C_START",
            Self::I2cStop => "I2C_STOP",
            Self::I2cWriteAddr => "I2C_WRITE_ADDR",
            Self::I2cWrite => "I2C_WRITE",
            Self::I2cRead => "I2C_READ",
            Self::SetVoltage => "SET_VOLTAGE",
            Self::GetVoltage => "GET_VOLTAGE",
            Self::Reset => "RESET",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or(id)
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd.id()
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_wire_table() {
        assert_eq!(Command::None.id(), 0x00);
        assert_eq!(Command::I2cWriteAddr.id(), 0x04);
        assert_eq!(Command::Reset.id(), 0x09);
        for id in 0x00..=0x09u8 {
            assert_eq!(Command::from_id(id).map(Command::id), Some(id));
        }
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert_eq!(Command::try_from(0x0A), Err(0x0A));
        assert_eq!(Command::try_from(0xFF), Err(0xFF));
    }
}
