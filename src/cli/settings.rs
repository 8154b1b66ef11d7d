use crate::cli::args::Args;
use crate::core::relay::{Pacing, RelayOptions};
use crate::domain::baud::Speed;
use crate::domain::config::RelayConfig;
use crate::domain::error::{RelayError, RelayResult};
use crate::domain::pulse::PulseSpec;
use crate::infrastructure::device::DeviceOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Everything a run needs, merged from flags and the configuration file.
/// Flags win.
#[derive(Debug, Clone)]
pub struct Settings {
    pub device: PathBuf,
    pub speed: Speed,
    pub dtr: Option<PulseSpec>,
    pub rts: Option<PulseSpec>,
    pub break_ms: Option<u32>,
    pub pacing: Pacing,
    pub commands: bool,
    pub escape: bool,
    pub raw_console: bool,
    pub default_pulse: Duration,
    pub lock_dir: PathBuf,
    pub read_chunk: usize,
}

impl Settings {
    pub fn resolve(args: &Args, config: &RelayConfig) -> RelayResult<Self> {
        let device = args
            .device
            .clone()
            .ok_or_else(|| RelayError::config("No device specified"))?;
        if config.read_chunk == 0 {
            return Err(RelayError::config("read_chunk must be at least 1"));
        }

        let default_pulse = Duration::from_millis(config.pulse_ms);
        let pulse = |token: &Option<String>| -> RelayResult<Option<PulseSpec>> {
            match token {
                Some(token) => PulseSpec::parse(token, default_pulse),
                None => Ok(None),
            }
        };

        Ok(Self {
            device,
            speed: args.speed.unwrap_or_default(),
            dtr: pulse(&args.dtr)?,
            rts: pulse(&args.rts)?,
            break_ms: args.break_ms,
            pacing: Pacing::from_millis(args.pace_ms.or(config.pace_ms).unwrap_or(0)),
            commands: args.commands,
            escape: config.escape && !args.no_escape,
            raw_console: config.raw_console && !args.no_raw,
            default_pulse,
            lock_dir: config.lock_dir.clone(),
            read_chunk: config.read_chunk,
        })
    }

    pub fn device_options(&self) -> DeviceOptions {
        DeviceOptions {
            speed: self.speed,
            control_lines: self.dtr.is_some() || self.rts.is_some() || self.break_ms.is_some(),
        }
    }

    pub fn relay_options(&self) -> RelayOptions {
        RelayOptions {
            escape: self.escape,
            pacing: self.pacing,
            read_chunk: self.read_chunk,
        }
    }
}
