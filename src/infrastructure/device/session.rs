use crate::core::control::ControlLines;
use crate::domain::baud::Speed;
use crate::domain::error::{IoContext, RelayError, RelayResult};
use crate::domain::pulse::Polarity;
use crate::infrastructure::device::modem::{self, ModemStatus};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::termios::{
    cfgetospeed, cfmakeraw, cfsetspeed, tcgetattr, tcsendbreak, tcsetattr, BaudRate, ControlFlags,
    InputFlags, SetArg, Termios,
};
use std::fs::{File, OpenOptions};
use std::io::{IsTerminal, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What the caller intends to do with the line
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceOptions {
    pub speed: Speed,
    /// DTR/RTS will be driven or a break sent; only meaningful on a terminal
    pub control_lines: bool,
}

/// An opened device and its line settings
///
/// For terminals the session holds an exclusive claim on the line and keeps
/// a copy of the attributes it committed, so later changes are applied on
/// top of them.
pub struct DeviceSession {
    file: File,
    path: PathBuf,
    termios: Option<Termios>,
}

impl DeviceSession {
    pub fn open(path: &Path, options: DeviceOptions) -> RelayResult<Self> {
        // Don't wait for carrier detect while opening
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(path)
            .op(path.display().to_string())?;

        let flags = fcntl(file.as_raw_fd(), FcntlArg::F_GETFL).op("fcntl(F_GETFL)")?;
        let mut flags = OFlag::from_bits_retain(flags);
        flags.remove(OFlag::O_NONBLOCK);
        fcntl(file.as_raw_fd(), FcntlArg::F_SETFL(flags)).op("fcntl(F_SETFL)")?;

        let mut session = Self {
            file,
            path: path.to_path_buf(),
            termios: None,
        };

        if session.file.is_terminal() {
            modem::claim_exclusive(session.file.as_fd()).op("ioctl(TIOCEXCL)")?;

            let mut tio = tcgetattr(&session.file).op("tcgetattr")?;
            cfmakeraw(&mut tio);
            tio.control_flags.insert(ControlFlags::CREAD | ControlFlags::CLOCAL);
            tio.control_flags.remove(ControlFlags::CRTSCTS);
            tio.input_flags
                .remove(InputFlags::IXON | InputFlags::IXOFF | InputFlags::IXANY);
            if let Speed::Rate(rate) = options.speed {
                cfsetspeed(&mut tio, rate).op("cfsetspeed")?;
            }
            session.termios = Some(tio);
            session.commit()?;

            info!(
                "Opened {} ({:?})",
                session.path.display(),
                session.current_speed()
            );
        } else if !options.speed.is_unchanged() || options.control_lines {
            return Err(RelayError::config(format!(
                "Cannot set speed, DTR, RTS or break on non-terminal {}",
                session.path.display()
            )));
        } else {
            debug!("{} is not a terminal, relaying as is", session.path.display());
        }

        Ok(session)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_terminal(&self) -> bool {
        self.termios.is_some()
    }

    /// Output speed currently committed, `None` for non-terminals
    pub fn current_speed(&self) -> Option<BaudRate> {
        self.termios.as_ref().map(cfgetospeed)
    }

    pub fn set_speed(&mut self, speed: Speed) -> RelayResult<()> {
        let Speed::Rate(rate) = speed else {
            return Ok(());
        };
        let tio = self.terminal_attrs_mut()?;
        cfsetspeed(tio, rate).op("cfsetspeed")?;
        self.commit()
    }

    fn terminal_attrs_mut(&mut self) -> RelayResult<&mut Termios> {
        let path = &self.path;
        self.termios.as_mut().ok_or_else(|| {
            RelayError::config(format!(
                "Cannot set speed, DTR, RTS or break on non-terminal {}",
                path.display()
            ))
        })
    }

    fn commit(&self) -> RelayResult<()> {
        if let Some(tio) = &self.termios {
            tcsetattr(&self.file, SetArg::TCSANOW, tio).op("tcsetattr")?;
        }
        Ok(())
    }
}

impl ControlLines for DeviceSession {
    fn set_lines(&mut self, dtr: Option<Polarity>, rts: Option<Polarity>) -> RelayResult<()> {
        self.terminal_attrs_mut()?;
        let mut status = modem::get_status(self.file.as_fd()).op("ioctl(TIOCMGET)")?;
        if let Some(polarity) = dtr {
            status.drive(ModemStatus::DTR, polarity);
        }
        if let Some(polarity) = rts {
            status.drive(ModemStatus::RTS, polarity);
        }
        modem::set_status(self.file.as_fd(), status).op("ioctl(TIOCMSET)")
    }

    fn send_break(&mut self, duration_ms: u32) -> RelayResult<()> {
        self.terminal_attrs_mut()?;
        let duration = libc::c_int::try_from(duration_ms)
            .map_err(|_| RelayError::config(format!("Break duration {} ms is too long", duration_ms)))?;
        tcsendbreak(&self.file, duration).op("tcsendbreak")
    }
}

impl Read for DeviceSession {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        (&self.file).read(buf)
    }
}

impl Write for DeviceSession {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        (&self.file).write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl AsFd for DeviceSession {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}
