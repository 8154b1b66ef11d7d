// Logging module - Logging infrastructure
use crate::domain::error::{RelayError, RelayResult};
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Stderr writer that emits `\r\n` line endings.
///
/// The console is in raw mode while the relay runs, where a bare `\n` only
/// moves the cursor down.
pub struct CrlfWriter<W: Write> {
    inner: W,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (i, &byte) in buf.iter().enumerate() {
            if byte == b'\n' && (i == 0 || buf[i - 1] != b'\r') {
                self.inner.write_all(&buf[start..i])?;
                self.inner.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RawConsoleStderr;

impl<'a> MakeWriter<'a> for RawConsoleStderr {
    type Writer = CrlfWriter<io::StderrLock<'static>>;

    fn make_writer(&'a self) -> Self::Writer {
        CrlfWriter::new(io::stderr().lock())
    }
}

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool, level: &str) -> String {
    if verbose {
        "serelay=info".to_string()
    } else {
        format!("serelay={}", level)
    }
}

/// Initialize logging system
pub fn init_logging(verbose: bool, level: &str) -> RelayResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(RawConsoleStderr)
                .without_time()
                .with_target(false)
                .with_level(true),
        )
        .try_init()
        .map_err(|e| RelayError::config(format!("Failed to initialize logging: {}", e)))
}
