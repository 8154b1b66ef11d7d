use crate::core::clock::Clock;
use crate::domain::error::{IoContext, RelayError, RelayResult};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::trace;

/// How staged console input is released to the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Whole chunk in a single write
    Unthrottled,
    /// One byte at a time, at least this far apart
    Paced(Duration),
}

impl Pacing {
    /// Zero milliseconds disables pacing.
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            Pacing::Unthrottled
        } else {
            Pacing::Paced(Duration::from_millis(ms))
        }
    }
}

/// Holds at most one chunk of console input until the device has taken it.
pub struct TransmitPacer<C: Clock> {
    pacing: Pacing,
    clock: C,
    pending: Vec<u8>,
    next: usize,
    last_tx: Option<Instant>,
}

impl<C: Clock> TransmitPacer<C> {
    pub fn new(pacing: Pacing, clock: C) -> Self {
        Self {
            pacing,
            clock,
            pending: Vec::new(),
            next: 0,
            last_tx: None,
        }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// True while staged bytes remain unsent.
    pub fn is_pending(&self) -> bool {
        self.next < self.pending.len()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len() - self.next
    }

    /// Stage a chunk for transmission. Only valid once the previous chunk
    /// has been fully drained.
    pub fn stage(&mut self, chunk: &[u8]) {
        debug_assert!(!self.is_pending(), "staged over an undrained buffer");
        self.pending.clear();
        self.pending.extend_from_slice(chunk);
        self.next = 0;
    }

    /// Instant at which the next byte may go out, `None` when idle.
    pub fn next_wake_time(&self) -> Option<Instant> {
        if !self.is_pending() {
            return None;
        }
        let now = self.clock.now();
        match (self.pacing, self.last_tx) {
            (Pacing::Paced(interval), Some(last)) => Some((last + interval).max(now)),
            _ => Some(now),
        }
    }

    /// How long the relay may block waiting for I/O before the pacer needs
    /// to run again. `None` means no deadline.
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.next_wake_time()
            .map(|wake| wake.saturating_duration_since(self.clock.now()))
    }

    /// Push staged bytes to `device` according to the pacing mode.
    ///
    /// Returns the number of bytes written this call, which may be zero when
    /// pacing holds the next byte back.
    pub fn transmit<W: Write>(&mut self, device: &mut W, target: &str) -> RelayResult<usize> {
        if !self.is_pending() {
            return Ok(0);
        }
        let end = match self.pacing {
            Pacing::Unthrottled => self.pending.len(),
            Pacing::Paced(interval) => {
                let now = self.clock.now();
                if let Some(last) = self.last_tx {
                    if now.saturating_duration_since(last) < interval {
                        return Ok(0);
                    }
                }
                self.last_tx = Some(now);
                self.next + 1
            }
        };

        let expected = end - self.next;
        let written = device
            .write(&self.pending[self.next..end])
            .op(format!("write {}", target))?;
        if written != expected {
            return Err(RelayError::ShortWrite {
                target: target.to_string(),
                written,
                expected,
            });
        }
        trace!("Sent {} bytes to {}", written, target);

        self.next = end;
        if !self.is_pending() {
            self.pending.clear();
            self.next = 0;
        }
        Ok(written)
    }
}
