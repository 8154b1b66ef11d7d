//! Ordered teardown shared by the normal exit path and the signal handler.

use crate::domain::error::{RelayError, RelayResult};
use crate::infrastructure::console::ConsoleMode;
use crate::infrastructure::lock::DeviceLock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Resources that must be given back before the process ends
#[derive(Default)]
struct Teardown {
    console: Option<ConsoleMode>,
    lock: Option<DeviceLock>,
}

impl Teardown {
    /// Restore the console first, then drop the device lock.
    fn run(&mut self) {
        if let Some(console) = self.console.take() {
            if let Err(e) = console.restore() {
                warn!("Failed to restore console: {}", e);
            }
        }
        if let Some(mut lock) = self.lock.take() {
            lock.release();
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.run();
    }
}

/// Handle on the process-wide teardown. Clones share the same resources and
/// the teardown runs at most once.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<Mutex<Teardown>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    fn teardown(&self) -> MutexGuard<'_, Teardown> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_console(&self, console: ConsoleMode) {
        self.teardown().console = Some(console);
    }

    pub fn register_lock(&self, lock: DeviceLock) {
        self.teardown().lock = Some(lock);
    }

    /// Switch the registered console into relay mode.
    pub fn enter_relay_mode(&self, raw: bool) -> RelayResult<()> {
        match &self.teardown().console {
            Some(console) => console.enter_relay_mode(raw),
            None => Ok(()),
        }
    }

    pub fn is_armed(&self) -> bool {
        let teardown = self.teardown();
        teardown.console.is_some() || teardown.lock.is_some()
    }

    pub fn run(&self) {
        self.teardown().run();
    }

    /// Turn SIGINT, SIGTERM and SIGHUP into teardown followed by exit(0).
    pub fn install_signal_handler(&self) -> RelayResult<()> {
        let shutdown = self.clone();
        ctrlc::set_handler(move || {
            info!("Termination signal received");
            shutdown.run();
            std::process::exit(0);
        })
        .map_err(|e| RelayError::Io {
            op: "install signal handler".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_run_releases_lock_once() {
        let dir = TempDir::new().unwrap();
        let lock = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyACM0")).unwrap();
        let lock_path = lock.path().to_path_buf();

        let shutdown = Shutdown::new();
        shutdown.register_console(ConsoleMode::detached());
        shutdown.register_lock(lock);
        assert!(shutdown.is_armed());

        let handle = shutdown.clone();
        handle.run();
        assert!(!lock_path.exists());
        assert!(!shutdown.is_armed());

        // second run is a no-op
        shutdown.run();
    }

    #[test]
    fn test_dropping_last_handle_tears_down() {
        let dir = TempDir::new().unwrap();
        let lock = DeviceLock::acquire(dir.path(), Path::new("/dev/ttyACM1")).unwrap();
        let lock_path = lock.path().to_path_buf();

        {
            let shutdown = Shutdown::new();
            shutdown.register_lock(lock);
        }
        assert!(!lock_path.exists());
    }
}
