//! Modem control line pulse requests.

use crate::domain::error::{RelayError, RelayResult};
use std::fmt;
use std::time::Duration;

/// Modem control line that can be pulsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Dtr,
    Rts,
}

/// State a line is driven to for the duration of a pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Assert,
    Deassert,
}

impl Polarity {
    pub fn opposite(self) -> Self {
        match self {
            Polarity::Assert => Polarity::Deassert,
            Polarity::Deassert => Polarity::Assert,
        }
    }
}

/// A single timed pulse on one line.
///
/// Positive milliseconds assert the line for the duration and deassert it
/// afterwards, negative milliseconds do the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseSpec {
    pub polarity: Polarity,
    pub duration: Duration,
}

impl PulseSpec {
    /// Build from signed milliseconds. Zero means "leave the line alone".
    pub fn from_millis(ms: i64) -> Option<Self> {
        if ms == 0 {
            return None;
        }
        let polarity = if ms > 0 {
            Polarity::Assert
        } else {
            Polarity::Deassert
        };
        Some(Self {
            polarity,
            duration: Duration::from_millis(ms.unsigned_abs()),
        })
    }

    /// Parse `+`, `-` or a signed integer of milliseconds.
    ///
    /// The bare sign tokens use `default_len` as magnitude.
    pub fn parse(token: &str, default_len: Duration) -> RelayResult<Option<Self>> {
        match token.trim() {
            "+" => Ok(Some(Self {
                polarity: Polarity::Assert,
                duration: default_len,
            })),
            "-" => Ok(Some(Self {
                polarity: Polarity::Deassert,
                duration: default_len,
            })),
            other => other
                .parse::<i64>()
                .map(Self::from_millis)
                .map_err(|_| RelayError::InvalidPulse(other.to_string())),
        }
    }
}

impl fmt::Display for PulseSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.polarity {
            Polarity::Assert => '+',
            Polarity::Deassert => '-',
        };
        write!(f, "{}{}ms", sign, self.duration.as_millis())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Dtr => write!(f, "DTR"),
            Line::Rts => write!(f, "RTS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: Duration = Duration::from_millis(1);

    #[test]
    fn test_sign_tokens_use_default_length() {
        let plus = PulseSpec::parse("+", DEFAULT).unwrap().unwrap();
        assert_eq!(plus.polarity, Polarity::Assert);
        assert_eq!(plus.duration, DEFAULT);

        let minus = PulseSpec::parse("-", DEFAULT).unwrap().unwrap();
        assert_eq!(minus.polarity, Polarity::Deassert);
    }

    #[test]
    fn test_signed_integer() {
        let spec = PulseSpec::parse("-50", DEFAULT).unwrap().unwrap();
        assert_eq!(spec.polarity, Polarity::Deassert);
        assert_eq!(spec.duration, Duration::from_millis(50));

        let spec = PulseSpec::parse("120", DEFAULT).unwrap().unwrap();
        assert_eq!(spec.polarity, Polarity::Assert);
        assert_eq!(spec.duration, Duration::from_millis(120));
    }

    #[test]
    fn test_zero_means_no_change() {
        assert_eq!(PulseSpec::parse("0", DEFAULT).unwrap(), None);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            PulseSpec::parse("fast", DEFAULT),
            Err(RelayError::InvalidPulse(_))
        ));
    }

    #[test]
    fn test_display() {
        let spec = PulseSpec::from_millis(-50).unwrap();
        assert_eq!(spec.to_string(), "-50ms");
    }
}
