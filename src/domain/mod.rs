// Domain module - Value types shared by every layer
pub mod baud;
pub mod config;
pub mod error;
pub mod pulse;

pub use baud::Speed;
pub use config::RelayConfig;
pub use error::{IoContext, RelayError, RelayResult};
pub use pulse::{Line, Polarity, PulseSpec};
