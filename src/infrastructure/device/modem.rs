//! Raw modem-control ioctls.

use crate::domain::pulse::Polarity;
use bitflags::bitflags;
use std::os::fd::{AsRawFd, BorrowedFd};

nix::ioctl_none_bad!(tiocexcl, libc::TIOCEXCL);
nix::ioctl_read_bad!(tiocmget, libc::TIOCMGET, libc::c_int);
nix::ioctl_write_ptr_bad!(tiocmset, libc::TIOCMSET, libc::c_int);

bitflags! {
    /// Modem status word as returned by `TIOCMGET`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModemStatus: libc::c_int {
        const DTR = libc::TIOCM_DTR;
        const RTS = libc::TIOCM_RTS;
        const _ = !0;
    }
}

impl ModemStatus {
    pub fn drive(&mut self, line: ModemStatus, polarity: Polarity) {
        match polarity {
            Polarity::Assert => self.insert(line),
            Polarity::Deassert => self.remove(line),
        }
    }
}

/// Refuse further opens of the terminal by other processes.
pub fn claim_exclusive(fd: BorrowedFd<'_>) -> nix::Result<()> {
    // SAFETY: TIOCEXCL takes no argument
    unsafe { tiocexcl(fd.as_raw_fd()) }.map(drop)
}

pub fn get_status(fd: BorrowedFd<'_>) -> nix::Result<ModemStatus> {
    let mut raw: libc::c_int = 0;
    // SAFETY: `raw` outlives the call and has the type TIOCMGET writes
    unsafe { tiocmget(fd.as_raw_fd(), &mut raw) }?;
    Ok(ModemStatus::from_bits_retain(raw))
}

pub fn set_status(fd: BorrowedFd<'_>, status: ModemStatus) -> nix::Result<()> {
    let raw = status.bits();
    // SAFETY: `raw` outlives the call and has the type TIOCMSET reads
    unsafe { tiocmset(fd.as_raw_fd(), &raw) }.map(drop)
}
