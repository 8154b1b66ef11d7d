use thiserror::Error;

/// Unified error type for the relay and its setup phase
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unknown baud rate {0}")]
    UnsupportedBaud(u32),

    #[error("Invalid pulse specification: {0}")]
    InvalidPulse(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{device} is used by PID {pid}")]
    DeviceLocked { device: String, pid: i32 },

    #[error("{device} is being locked by another process")]
    LockBusy { device: String },

    #[error("{op}: {source}")]
    Io {
        op: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not all data written to {target} ({written}/{expected})")]
    ShortWrite {
        target: String,
        written: usize,
        expected: usize,
    },

    #[error("Unexpected end of input")]
    InputClosed,

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl RelayError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Errors that end the process with a failure status but print nothing.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::InputClosed)
    }
}

pub type RelayResult<T> = Result<T, RelayError>;

/// Attach the failing operation to an I/O or errno result.
pub trait IoContext<T> {
    fn op(self, op: impl Into<String>) -> RelayResult<T>;
}

impl<T> IoContext<T> for Result<T, std::io::Error> {
    fn op(self, op: impl Into<String>) -> RelayResult<T> {
        self.map_err(|source| RelayError::Io {
            op: op.into(),
            source,
        })
    }
}

impl<T> IoContext<T> for Result<T, nix::errno::Errno> {
    fn op(self, op: impl Into<String>) -> RelayResult<T> {
        self.map_err(|errno| RelayError::Io {
            op: op.into(),
            source: std::io::Error::from(errno),
        })
    }
}
