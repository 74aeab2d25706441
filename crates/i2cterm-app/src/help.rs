use crate::command::COMMANDS;
use crate::term::bold;

pub fn general() -> String {
    let mut text = String::from("The following commands are available:\n");
    for name in COMMANDS {
        text.push_str(&format!("- {name}\n"));
    }
    text.push_str(&format!(
        "\nFor details, enter help followed by one of the commands above.\nFor example:\n\n {}\n",
        bold("help reset")
    ));
    text
}

/// Help for one command. Unknown topics, and `help` itself, fall back to the
/// general help.
pub fn topic(name: &str) -> String {
    match name {
        "init" => format!(
            "Format: init [SPEED]\n\n\
             Initializes the I2C bus. {} is one of:\n\n\
             100: 100kHz\n250: 250kHz\n400: 400kHz\n\n\
             Issue this before any other I2C request.\n",
            bold("[SPEED]")
        ),
        "start" => "Format: start\n\n\
             Raises the I2C START condition. Every I2C session begins with a START.\n"
            .to_owned(),
        "stop" => "Format: stop\n\n\
             Raises the I2C STOP condition, which ends a transmission.\n"
            .to_owned(),
        "write" => format!(
            "Format: write [VALUE]\n\n\
             Sends {v} on the I2C bus. {v} is an 8-bit decimal, hexadecimal ({hex}) or\n\
             octal (leading 0) value.\n",
            v = bold("[VALUE]"),
            hex = bold("0x")
        ),
        "write-address" => format!(
            "Format: write-address [VALUE]\n\n\
             Sends a slave address on the I2C bus. {v} is the 7-bit address shifted left\n\
             with the read/write flag in bit 0, given in decimal, hexadecimal ({hex}) or octal.\n",
            v = bold("[VALUE]"),
            hex = bold("0x")
        ),
        "read" => format!(
            "Format: read {{FLAG}}\n\n\
             Reads one byte from the I2C bus. {f} selects whether the byte is acknowledged:\n\
             ack or 1 returns ACK, nack or 0 returns NOT ACK. Without {f} NOT ACK is sent.\n",
            f = bold("{FLAG}")
        ),
        "output-voltage" => format!(
            "Format: output-voltage [VOLTAGE]\n\n\
             Sets the output voltage of the bridge. {} is 3.3, 3.3V, 5, 5.0, 5V or 5.0V.\n\n\
             Change the voltage before starting an I2C session, not in the middle of one.\n",
            bold("[VOLTAGE]")
        ),
        "reset" => "Format: reset\n\n\
             Resets the bridge's I2C controller and power-cycles the output.\n\n\
             The output voltage level is kept across the reset.\n"
            .to_owned(),
        "exit" => "Format: exit\n\nCloses the terminal session.\n".to_owned(),
        _ => general(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_lists_every_command() {
        let text = general();
        for name in COMMANDS {
            assert!(text.contains(&format!("- {name}\n")), "{name}");
        }
    }

    #[test]
    fn topics_show_format() {
        assert!(topic("read").starts_with("Format: read {FLAG}"));
        assert!(topic("reset").starts_with("Format: reset"));
        assert_eq!(topic("help"), general());
        assert_eq!(topic("nonsense"), general());
    }
}
