use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration file contents
///
/// Every key is optional. Command line flags take precedence over the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Log level used when `-v` is not given and `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Terminate on `<CR>~.` typed on the console
    #[serde(default = "default_escape")]
    pub escape: bool,
    /// Put the console into raw mode while relaying
    #[serde(default = "default_raw_console")]
    pub raw_console: bool,
    /// Pulse length used for `+`/`-` tokens, in milliseconds
    #[serde(default = "default_pulse_ms")]
    pub pulse_ms: u64,
    /// Minimum inter-byte interval when `-t` is not given
    #[serde(default)]
    pub pace_ms: Option<u64>,
    /// Directory holding UUCP style `LCK..` files
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,
    /// Size of a single read from either endpoint
    #[serde(default = "default_read_chunk")]
    pub read_chunk: usize,
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_escape() -> bool {
    true
}

fn default_raw_console() -> bool {
    true
}

fn default_pulse_ms() -> u64 {
    1
}

fn default_lock_dir() -> PathBuf {
    PathBuf::from("/var/lock")
}

fn default_read_chunk() -> usize {
    4096
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            escape: default_escape(),
            raw_console: default_raw_console(),
            pulse_ms: default_pulse_ms(),
            pace_ms: None,
            lock_dir: default_lock_dir(),
            read_chunk: default_read_chunk(),
        }
    }
}
