use crate::domain::error::{IoContext, RelayResult};
use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, SetArg, Termios};
use std::fs::File;
use std::io::IsTerminal;
use std::os::fd::{AsFd, OwnedFd};
use tracing::debug;

/// Console attributes captured at startup
///
/// Holds nothing when stdin is not a terminal, in which case every method
/// is a no-op.
pub struct ConsoleMode {
    saved: Option<(OwnedFd, Termios)>,
}

impl ConsoleMode {
    pub fn capture() -> RelayResult<Self> {
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            return Ok(Self::detached());
        }
        let fd = stdin.as_fd().try_clone_to_owned().op("dup(stdin)")?;
        let termios = tcgetattr(&fd).op("tcgetattr(stdin)")?;
        Ok(Self {
            saved: Some((fd, termios)),
        })
    }

    /// Mode object for a console that is not a terminal.
    pub fn detached() -> Self {
        Self { saved: None }
    }

    pub fn is_terminal(&self) -> bool {
        self.saved.is_some()
    }

    /// Apply the relay's console settings, raw unless told otherwise.
    pub fn enter_relay_mode(&self, raw: bool) -> RelayResult<()> {
        if let Some((fd, saved)) = &self.saved {
            let mut tio = saved.clone();
            if raw {
                cfmakeraw(&mut tio);
            }
            tcsetattr(fd, SetArg::TCSANOW, &tio).op("tcsetattr(stdin)")?;
            debug!("Console switched to {} mode", if raw { "raw" } else { "cooked" });
        }
        Ok(())
    }

    pub fn restore(&self) -> RelayResult<()> {
        if let Some((fd, saved)) = &self.saved {
            tcsetattr(fd, SetArg::TCSANOW, saved).op("tcsetattr(stdin)")?;
        }
        Ok(())
    }
}

/// Unbuffered handles on stdin and stdout.
///
/// Reads and writes go straight to the descriptors so that readiness
/// reported by poll matches what a read will return.
pub fn streams() -> RelayResult<(File, File)> {
    let input = std::io::stdin().as_fd().try_clone_to_owned().op("dup(stdin)")?;
    let output = std::io::stdout().as_fd().try_clone_to_owned().op("dup(stdout)")?;
    Ok((File::from(input), File::from(output)))
}
