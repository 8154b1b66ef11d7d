use crate::domain::error::{RelayError, RelayResult};
use nix::sys::termios::BaudRate;
use std::str::FromStr;

/// Line speed request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Speed {
    /// Keep whatever the device is currently configured with
    #[default]
    Unchanged,
    Rate(BaudRate),
}

impl Speed {
    pub fn from_bps(bps: u32) -> RelayResult<Self> {
        let rate = match bps {
            // B0 would hang up the line
            0 => return Ok(Speed::Unchanged),
            50 => BaudRate::B50,
            75 => BaudRate::B75,
            110 => BaudRate::B110,
            134 => BaudRate::B134,
            150 => BaudRate::B150,
            200 => BaudRate::B200,
            300 => BaudRate::B300,
            600 => BaudRate::B600,
            1200 => BaudRate::B1200,
            1800 => BaudRate::B1800,
            2400 => BaudRate::B2400,
            4800 => BaudRate::B4800,
            9600 => BaudRate::B9600,
            19200 => BaudRate::B19200,
            38400 => BaudRate::B38400,
            57600 => BaudRate::B57600,
            115200 => BaudRate::B115200,
            230400 => BaudRate::B230400,
            other => return Err(RelayError::UnsupportedBaud(other)),
        };
        Ok(Speed::Rate(rate))
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Speed::Unchanged)
    }
}

impl FromStr for Speed {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bps = s
            .trim()
            .parse::<u32>()
            .map_err(|_| RelayError::config(format!("Invalid baud rate '{}'", s)))?;
        Self::from_bps(bps)
    }
}
