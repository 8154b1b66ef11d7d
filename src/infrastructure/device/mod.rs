// Device module - Serial device access
pub mod modem;
pub mod session;

pub use session::{DeviceOptions, DeviceSession};
