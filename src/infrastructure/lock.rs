//! UUCP style advisory lock files (`LCK..ttyS0`).
//!
//! The lock file holds the owner's PID as ten right-aligned ASCII digits
//! followed by a newline. It is written to a private file first and then
//! hard-linked into place, so it never exists without its content. A lock
//! whose owner no longer exists is stale and is replaced.

use crate::domain::error::{IoContext, RelayError, RelayResult};
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const ACQUIRE_ATTEMPTS: usize = 5;

/// Unreadable lock files younger than this may still be being written by a
/// locker that creates first and writes afterwards
const CREATION_GRACE: Duration = Duration::from_secs(5);

const RETRY_DELAY: Duration = Duration::from_millis(50);

/// What an existing lock file says about its holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Pid(i32),
    /// Empty or not a PID; `age` is the time since it was last modified
    Unreadable { age: Duration },
    Gone,
}

/// Held advisory lock on a device path. Released on drop.
#[derive(Debug)]
pub struct DeviceLock {
    path: PathBuf,
    pid: i32,
    held: bool,
}

impl DeviceLock {
    pub fn acquire(lock_dir: &Path, device: &Path) -> RelayResult<Self> {
        let path = lock_dir.join(lock_file_name(device));
        let pid = std::process::id() as i32;

        let staging = lock_dir.join(format!("LTMP.{}", pid));
        fs::write(&staging, format!("{:>10}\n", pid))
            .op(format!("write {}", staging.display()))?;
        let result = Self::link_into_place(&staging, path, device, pid);
        if let Err(e) = fs::remove_file(&staging) {
            warn!("Failed to remove {}: {}", staging.display(), e);
        }
        result
    }

    fn link_into_place(staging: &Path, path: PathBuf, device: &Path, pid: i32) -> RelayResult<Self> {
        for _ in 0..ACQUIRE_ATTEMPTS {
            match fs::hard_link(staging, &path) {
                Ok(()) => {
                    debug!("Locked {} via {}", device.display(), path.display());
                    return Ok(Self {
                        path,
                        pid,
                        held: true,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => match read_owner(&path)? {
                    Owner::Pid(owner) if owner == pid => {
                        return Ok(Self {
                            path,
                            pid,
                            held: true,
                        })
                    }
                    Owner::Pid(owner) if is_alive(owner) => {
                        return Err(RelayError::DeviceLocked {
                            device: device.display().to_string(),
                            pid: owner,
                        })
                    }
                    Owner::Unreadable { age } if age < CREATION_GRACE => {
                        debug!("{} is still being written, waiting", path.display());
                        thread::sleep(RETRY_DELAY);
                    }
                    Owner::Gone => {}
                    _ => {
                        warn!("Removing stale lock {}", path.display());
                        match fs::remove_file(&path) {
                            Err(e) if e.kind() != ErrorKind::NotFound => {
                                return Err(e).op(format!("remove {}", path.display()))
                            }
                            _ => {}
                        }
                    }
                },
                Err(e) => return Err(e).op(format!("link {}", path.display())),
            }
        }

        Err(RelayError::LockBusy {
            device: device.display().to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file if it still names this process. Idempotent.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        match read_owner(&self.path) {
            Ok(Owner::Pid(owner)) if owner == self.pid => {
                if let Err(e) = fs::remove_file(&self.path) {
                    warn!("Failed to remove {}: {}", self.path.display(), e);
                }
            }
            Ok(_) => warn!("{} no longer belongs to us, leaving it", self.path.display()),
            Err(e) => warn!("{}", e),
        }
    }
}

impl Drop for DeviceLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// `LCK..` followed by the device's file name.
pub fn lock_file_name(device: &Path) -> String {
    let name = device
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| device.to_string_lossy().replace('/', "_"));
    format!("LCK..{}", name)
}

fn read_owner(path: &Path) -> RelayResult<Owner> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Owner::Gone),
        Err(e) => return Err(e).op(format!("read {}", path.display())),
    };
    if let Some(pid) = content.trim().parse::<i32>().ok().filter(|pid| *pid > 0) {
        return Ok(Owner::Pid(pid));
    }

    let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Owner::Gone),
        Err(e) => return Err(e).op(format!("stat {}", path.display())),
    };
    // a timestamp in the future counts as brand new
    let age = modified.elapsed().unwrap_or_default();
    Ok(Owner::Unreadable { age })
}

fn is_alive(pid: i32) -> bool {
    matches!(kill(Pid::from_raw(pid), None), Ok(()) | Err(Errno::EPERM))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_file_name() {
        assert_eq!(lock_file_name(Path::new("/dev/ttyUSB0")), "LCK..ttyUSB0");
        assert_eq!(lock_file_name(Path::new("ttyS1")), "LCK..ttyS1");
    }

    #[test]
    fn test_acquire_writes_pid_and_release_removes() {
        let dir = TempDir::new().unwrap();
        let mut lock = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyUSB0")).unwrap();

        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.len(), 11);
        assert_eq!(content.trim().parse::<u32>().unwrap(), std::process::id());

        lock.release();
        assert!(!dir.path().join("LCK..ttyUSB0").exists());
    }

    #[test]
    fn test_drop_releases() {
        let dir = TempDir::new().unwrap();
        {
            let _lock = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyS3")).unwrap();
            assert!(dir.path().join("LCK..ttyS3").exists());
        }
        assert!(!dir.path().join("LCK..ttyS3").exists());
    }

    #[test]
    fn test_live_owner_is_reported() {
        let dir = TempDir::new().unwrap();
        // PID 1 always exists
        fs::write(dir.path().join("LCK..ttyS0"), "         1\n").unwrap();

        let err = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyS0")).unwrap_err();
        assert!(matches!(err, RelayError::DeviceLocked { pid: 1, .. }));
        assert_eq!(err.to_string(), "/dev/ttyS0 is used by PID 1");
        assert!(dir.path().join("LCK..ttyS0").exists());
    }

    #[test]
    fn test_stale_lock_is_replaced() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("LCK..ttyS0"), " 999999999\n").unwrap();

        let lock = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyS0")).unwrap();
        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim().parse::<u32>().unwrap(), std::process::id());
    }

    #[test]
    fn test_lock_being_written_is_not_taken() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("LCK..ttyS0");
        fs::write(&lock_path, "").unwrap();

        let err = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyS0")).unwrap_err();
        assert!(matches!(err, RelayError::LockBusy { .. }));
        assert_eq!(fs::read_to_string(&lock_path).unwrap(), "");
    }

    #[test]
    fn test_old_unreadable_lock_is_replaced() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("LCK..ttyS0");
        fs::write(&lock_path, "garbage").unwrap();
        let an_hour_ago = std::time::SystemTime::now() - Duration::from_secs(3600);
        fs::File::options()
            .write(true)
            .open(&lock_path)
            .unwrap()
            .set_modified(an_hour_ago)
            .unwrap();

        let lock = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyS0")).unwrap();
        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim().parse::<u32>().unwrap(), std::process::id());
    }

    #[test]
    fn test_only_lock_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let _lock = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyUSB1")).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["LCK..ttyUSB1".to_string()]);
    }

    #[test]
    fn test_release_leaves_foreign_lock() {
        let dir = TempDir::new().unwrap();
        let mut lock = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyS0")).unwrap();
        fs::write(lock.path(), "         1\n").unwrap();

        lock.release();
        assert!(dir.path().join("LCK..ttyS0").exists());
    }

    #[test]
    fn test_missing_lock_dir_is_io_error() {
        let err = DeviceLock::acquire(Path::new("/nonexistent/lockdir"), Path::new("/dev/ttyS0"))
            .unwrap_err();
        assert!(matches!(err, RelayError::Io { .. }));
    }
}
