use crate::domain::baud::Speed;
use clap::Parser;
use std::path::PathBuf;

/// Command line arguments for serelay
#[derive(Parser, Debug)]
#[command(
    name = "serelay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Minimal serial terminal relaying stdin/stdout to a device",
    long_about = "Connects standard input and output to a serial device in both directions. \
                  Can set the line speed, pulse DTR/RTS, send breaks and pace transmission for \
                  slow receivers. Type <Enter>~. to exit."
)]
pub struct Args {
    /// Serial device, e.g. /dev/ttyUSB0
    #[arg(value_name = "DEVICE", required_unless_present = "list")]
    pub device: Option<PathBuf>,

    /// Set line speed in baud
    #[arg(short = 's', long = "speed", value_name = "BAUD")]
    pub speed: Option<Speed>,

    /// Pulse DTR after opening: +, - or signed milliseconds (bare flag means -)
    #[arg(
        short = 'd',
        long = "dtr",
        value_name = "SPEC",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "-",
        allow_hyphen_values = true
    )]
    pub dtr: Option<String>,

    /// Pulse RTS after opening: +, - or signed milliseconds (bare flag means -)
    #[arg(
        short = 'r',
        long = "rts",
        value_name = "SPEC",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "-",
        allow_hyphen_values = true
    )]
    pub rts: Option<String>,

    /// Send a break of this many milliseconds after opening (0 = default break)
    #[arg(short = 'b', long = "break", value_name = "MS")]
    pub break_ms: Option<u32>,

    /// Transmit one byte at a time, at least this many milliseconds apart
    #[arg(short = 't', long = "pace", value_name = "MS")]
    pub pace_ms: Option<u64>,

    /// Read dtr/rts/break/go/exit commands from stdin before relaying
    #[arg(short = 'c', long = "commands")]
    pub commands: bool,

    /// Ignore the <Enter>~. escape sequence
    #[arg(short = 'e', long = "no-escape")]
    pub no_escape: bool,

    /// Do not switch the console to raw mode
    #[arg(short = 'n', long = "no-raw")]
    pub no_raw: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List available serial ports and exit
    #[arg(short = 'l', long)]
    pub list: bool,
}
