use crate::core::clock::Clock;
use crate::core::relay::escape::EscapeDetector;
use crate::core::relay::pacer::{Pacing, TransmitPacer};
use crate::domain::error::{IoContext, RelayError, RelayResult};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::AsFd;
use std::time::Duration;
use tracing::{debug, info};

/// Relay tuning, resolved from flags and the configuration file
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub escape: bool,
    pub pacing: Pacing,
    pub read_chunk: usize,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            escape: true,
            pacing: Pacing::Unthrottled,
            read_chunk: 4096,
        }
    }
}

/// Why the relay stopped. All of these are clean terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayExit {
    ConsoleClosed,
    ConsoleHangup,
    DeviceClosed,
    EscapeSequence,
}

impl fmt::Display for RelayExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayExit::ConsoleClosed => write!(f, "EOF on stdin"),
            RelayExit::ConsoleHangup => write!(f, "stdin hung up"),
            RelayExit::DeviceClosed => write!(f, "EOF on device"),
            RelayExit::EscapeSequence => write!(f, "escape sequence"),
        }
    }
}

/// Duplexes bytes between the console and the device.
///
/// Console input passes through the escape detector and the transmit pacer
/// on its way to the device; device output is copied to the console as it
/// arrives. Console reads are suspended while a staged chunk is still being
/// drained, which is the only flow control between the two directions.
pub struct Relay<I, O, D, C: Clock> {
    console_in: I,
    console_out: O,
    device: D,
    device_name: String,
    escape: Option<EscapeDetector>,
    pacer: TransmitPacer<C>,
    buf: Vec<u8>,
}

impl<I, O, D, C> Relay<I, O, D, C>
where
    I: Read + AsFd,
    O: Write,
    D: Read + Write + AsFd,
    C: Clock,
{
    pub fn new(
        console_in: I,
        console_out: O,
        device: D,
        device_name: impl Into<String>,
        options: &RelayOptions,
        clock: C,
    ) -> Self {
        Self {
            console_in,
            console_out,
            device,
            device_name: device_name.into(),
            escape: options.escape.then(EscapeDetector::new),
            pacer: TransmitPacer::new(options.pacing, clock),
            buf: vec![0u8; options.read_chunk.max(1)],
        }
    }

    /// Run until either side closes or the escape sequence is typed.
    pub fn run(&mut self) -> RelayResult<RelayExit> {
        loop {
            if let Some(exit) = self.step()? {
                debug!("Relay finished: {}", exit);
                return Ok(exit);
            }
        }
    }

    /// One wait-and-service round.
    pub fn step(&mut self) -> RelayResult<Option<RelayExit>> {
        let watch_console = !self.pacer.is_pending();
        let timeout = to_poll_timeout(self.pacer.poll_timeout());

        let (console_events, device_events) = {
            let mut fds = Vec::with_capacity(2);
            if watch_console {
                fds.push(PollFd::new(self.console_in.as_fd(), PollFlags::POLLIN));
            }
            fds.push(PollFd::new(self.device.as_fd(), PollFlags::POLLIN));

            match poll(&mut fds, timeout) {
                Err(Errno::EINTR) => return Ok(None),
                other => other.op("poll")?,
            };

            let device_events = fds.pop().and_then(|fd| fd.revents()).unwrap_or(PollFlags::empty());
            let console_events = fds.pop().and_then(|fd| fd.revents()).unwrap_or(PollFlags::empty());
            (console_events, device_events)
        };

        if console_events.contains(PollFlags::POLLNVAL) {
            return Err(invalid_fd("poll stdin"));
        }
        if device_events.contains(PollFlags::POLLNVAL) {
            return Err(invalid_fd(&format!("poll {}", self.device_name)));
        }

        let console_readable = console_events.intersects(PollFlags::POLLIN | PollFlags::POLLERR);
        if console_readable {
            let n = read_retrying(&mut self.console_in, &mut self.buf).op("read stdin")?;
            if n == 0 {
                info!("EOF on stdin");
                return Ok(Some(RelayExit::ConsoleClosed));
            }
            if let Some(detector) = self.escape.as_mut() {
                if detector.scan(&self.buf[..n]) {
                    info!("Escape sequence detected");
                    return Ok(Some(RelayExit::EscapeSequence));
                }
            }
            self.pacer.stage(&self.buf[..n]);
        }

        if self.pacer.is_pending() {
            self.pacer.transmit(&mut self.device, &self.device_name)?;
        }

        if !console_readable && console_events.contains(PollFlags::POLLHUP) {
            info!("Hang-up on stdin");
            return Ok(Some(RelayExit::ConsoleHangup));
        }

        if device_events.intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR) {
            let n = read_retrying(&mut self.device, &mut self.buf)
                .op(format!("read {}", self.device_name))?;
            if n == 0 {
                info!("EOF on {}", self.device_name);
                return Ok(Some(RelayExit::DeviceClosed));
            }
            let written = self.console_out.write(&self.buf[..n]).op("write stdout")?;
            if written != n {
                return Err(RelayError::ShortWrite {
                    target: "stdout".to_string(),
                    written,
                    expected: n,
                });
            }
            self.console_out.flush().op("flush stdout")?;
        }

        Ok(None)
    }

    /// Give back the endpoints, e.g. to inspect test doubles.
    pub fn into_parts(self) -> (I, O, D) {
        (self.console_in, self.console_out, self.device)
    }
}

/// Round up so the pacer is never woken before its deadline.
fn to_poll_timeout(timeout: Option<Duration>) -> PollTimeout {
    match timeout {
        None => PollTimeout::NONE,
        Some(d) => {
            let ms = u64::try_from(d.as_micros().div_ceil(1000)).unwrap_or(u64::MAX);
            PollTimeout::try_from(Duration::from_millis(ms)).unwrap_or(PollTimeout::MAX)
        }
    }
}

fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

fn invalid_fd(op: &str) -> RelayError {
    RelayError::Io {
        op: op.to_string(),
        source: std::io::Error::from(Errno::EBADF),
    }
}
