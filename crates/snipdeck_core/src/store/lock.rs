//! Writer lock held for the lifetime of a data directory store.

use crate::constants::STORE_LOCK_FILE_NAME;
use crate::error::AppError;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Keeping this value alive holds an exclusive OS lock on `snipdeck.lock`.
#[derive(Debug)]
pub struct StoreLockGuard {
    file: File,
    lock_path: PathBuf,
}

impl StoreLockGuard {
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!(
                "Failed to release store lock {:?} during drop: {}",
                self.lock_path,
                err
            );
        }
    }
}

/// Acquire the exclusive writer lock for `data_dir`, creating the
/// directory if needed.
///
/// # Errors
/// Returns [`AppError::Locked`] when another writer holds the lock and
/// [`AppError::Storage`] when the lock file cannot be prepared.
pub fn acquire_store_lock(data_dir: &Path) -> Result<StoreLockGuard, AppError> {
    fs::create_dir_all(data_dir).map_err(|err| {
        AppError::Storage(format!(
            "Failed to prepare data directory '{}': {}",
            data_dir.display(),
            err
        ))
    })?;
    let lock_path = data_dir.join(STORE_LOCK_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|err| {
            AppError::Storage(format!(
                "Failed to open store lock '{}': {}",
                lock_path.display(),
                err
            ))
        })?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(StoreLockGuard { file, lock_path }),
        Err(err)
            if matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::PermissionDenied
            ) =>
        {
            Err(AppError::Locked(format!(
                "Store lock '{}' is already held by another snipdeck writer.",
                lock_path.display()
            )))
        }
        Err(err) => Err(AppError::Storage(format!(
            "Failed to acquire store lock '{}': {}",
            lock_path.display(),
            err
        ))),
    }
}
