//! Advisory file locks serializing writers of shared state files across
//! `sift` processes (the recent-search cache in particular).

use crate::error::ErrorCode;
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// Poll interval while waiting on a contended lock.
const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory lock errors.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("{}: lock timed out after {waited:?} at {}", ErrorCode::LockContention.code(), path.display())]
    Timeout { path: PathBuf, waited: Duration },
    #[error("{}: {0}", ErrorCode::InternalUnexpected.code())]
    Io(#[from] io::Error),
}

impl LockError {
    /// The [`ErrorCode`] reported for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::InternalUnexpected,
        }
    }
}

#[derive(Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

/// RAII guard over an advisory lock file. Released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquire an exclusive lock, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if another holder keeps the lock past
    /// `timeout`, or [`LockError::Io`] if the lock file cannot be opened.
    pub fn exclusive(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, LockKind::Exclusive)
    }

    /// Acquire a shared (reader) lock, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// Same as [`FileLock::exclusive`].
    pub fn shared(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Self::acquire(path, timeout, LockKind::Shared)
    }

    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            let acquired = match kind {
                LockKind::Shared => file.try_lock_shared().is_ok(),
                LockKind::Exclusive => file.try_lock_exclusive().is_ok(),
            };

            if acquired {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(RETRY_INTERVAL);
        }
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_lock_blocks_second_exclusive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.lock");

        let first = FileLock::exclusive(&path, Duration::from_millis(100)).expect("first lock");
        let second = FileLock::exclusive(&path, Duration::from_millis(50));
        assert!(matches!(second, Err(LockError::Timeout { .. })));

        drop(first);
        FileLock::exclusive(&path, Duration::from_millis(100)).expect("lock after release");
    }

    #[test]
    fn shared_locks_coexist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.lock");

        let a = FileLock::shared(&path, Duration::from_millis(100)).expect("shared a");
        let b = FileLock::shared(&path, Duration::from_millis(100)).expect("shared b");
        assert_eq!(a.path(), b.path());
    }

    #[test]
    fn timeout_error_carries_code() {
        let err = LockError::Timeout {
            path: PathBuf::from("/tmp/x.lock"),
            waited: Duration::from_millis(5),
        };
        assert_eq!(err.code(), ErrorCode::LockContention);
        assert!(err.to_string().starts_with("E5003"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("deeper").join("x.lock");
        let lock = FileLock::exclusive(&path, Duration::from_millis(100)).expect("lock");
        assert!(lock.path().exists());
    }
}
