// Relay module - Console/device duplexing
pub mod engine;
pub mod escape;
pub mod pacer;

pub use engine::{Relay, RelayExit, RelayOptions};
pub use escape::{EscapeDetector, ESCAPE_SEQUENCE};
pub use pacer::{Pacing, TransmitPacer};
