use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{trace, warn};

use super::Result;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory lock guarding the gauge against other processes on this host.
///
/// Every handle opens its own file description, so two handles on the same
/// path exclude each other even inside one process. Callers sharing one
/// handle queue on a local mutex, as the file lock would admit them all.
#[derive(Debug, Default)]
pub struct InterProcessLock {
    file: Option<File>,
    local: Mutex<()>,
}

/// Held for the duration of one exchange; unlocks on drop.
pub struct InterProcessGuard<'a> {
    file: Option<&'a File>,
    // Released after the file is unlocked.
    _local: Option<MutexGuard<'a, ()>>,
}

impl InterProcessLock {
    /// A lock that never blocks, for single-process deployments.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path.as_ref())?;
        Ok(Self {
            file: Some(file),
            local: Mutex::new(()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub async fn acquire(&self) -> Result<InterProcessGuard<'_>> {
        let Some(file) = &self.file else {
            return Ok(InterProcessGuard {
                file: None,
                _local: None,
            });
        };
        let local = self.local.lock().await;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    trace!("Inter-process lock acquired");
                    return Ok(InterProcessGuard {
                        file: Some(file),
                        _local: Some(local),
                    });
                }
                Err(err) if is_contended(&err) => tokio::time::sleep(POLL_INTERVAL).await,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Drop for InterProcessGuard<'_> {
    fn drop(&mut self) {
        if let Some(file) = self.file {
            if let Err(err) = FileExt::unlock(file) {
                warn!("Failed to release inter-process lock: {}", err);
            }
        }
    }
}
