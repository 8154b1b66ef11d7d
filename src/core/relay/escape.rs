/// Bytes that end the session when typed consecutively on the console.
pub const ESCAPE_SEQUENCE: &[u8; 3] = b"\r~.";

/// Scans console input for [`ESCAPE_SEQUENCE`].
///
/// The match position survives between calls, so a sequence split over
/// several reads is still recognised. Once the sequence has been seen the
/// detector stays spent and never fires again.
///
/// The start of the session counts as the start of a line, so `~.` typed
/// as the very first input is enough.
#[derive(Debug)]
pub struct EscapeDetector {
    matched: usize,
    fired: bool,
}

impl Default for EscapeDetector {
    fn default() -> Self {
        Self {
            matched: 1,
            fired: false,
        }
    }
}

impl EscapeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `buf` completes the escape sequence.
    pub fn scan(&mut self, buf: &[u8]) -> bool {
        self.find(buf).is_some()
    }

    /// Offset within `buf` of the byte completing the escape sequence.
    pub fn find(&mut self, buf: &[u8]) -> Option<usize> {
        if self.fired {
            return None;
        }
        for (i, &byte) in buf.iter().enumerate() {
            if byte == ESCAPE_SEQUENCE[self.matched] {
                self.matched += 1;
                if self.matched == ESCAPE_SEQUENCE.len() {
                    self.matched = 0;
                    self.fired = true;
                    return Some(i);
                }
            } else {
                // a mismatching CR may still start a new sequence
                self.matched = usize::from(byte == ESCAPE_SEQUENCE[0]);
            }
        }
        None
    }

    /// Number of sequence bytes matched so far.
    pub fn progress(&self) -> usize {
        self.matched
    }
}
