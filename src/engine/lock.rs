//! Cross-process resource locking
//!
//! Serializes edit/create/delete operations against one logical
//! container. The token is an exclusively-locked file whose name is
//! derived deterministically from the resource URI, so independent
//! processes mutating the same resource serialize correctly.

use super::{EngineError, EngineResult};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// File names longer than this are replaced by a digest to respect OS
/// naming limits.
const MAX_NAME_LEN: usize = 120;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Manager of named lock files under one directory.
#[derive(Debug)]
pub struct LockManager {
    dir: PathBuf,
}

impl LockManager {
    /// Create a manager, creating the lock directory if needed
    pub fn new(dir: impl AsRef<Path>) -> EngineResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "lock manager initialized");
        Ok(Self { dir })
    }

    fn path_for(&self, uri: &str) -> PathBuf {
        let sanitized: String = uri
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let name = if sanitized.len() > MAX_NAME_LEN {
            format!("{:x}", Sha256::digest(uri.as_bytes()))
        } else {
            sanitized
        };
        self.dir.join(format!("{}.lock", name))
    }

    /// Acquire the named lock for a URI, blocking up to `timeout`.
    ///
    /// Fails with [`EngineError::Contention`] when the deadline passes;
    /// a timed-out acquire leaves no token held. The returned guard
    /// releases on drop.
    pub fn acquire(&self, uri: &str, timeout: Duration) -> EngineResult<LockGuard> {
        let path = self.path_for(uri);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(uri, "lock acquired");
                    return Ok(LockGuard {
                        file: Some(file),
                        uri: uri.to_string(),
                    });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        warn!(uri, "lock acquisition timed out");
                        return Err(EngineError::Contention(uri.to_string()));
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => return Err(EngineError::LockIo(e)),
            }
        }
    }

    /// Destroy the named token of a deleted resource so it does not
    /// leak across resource lifetimes. A later resource at the same
    /// URI starts with a fresh, uncontended token.
    pub fn destroy(&self, uri: &str) -> EngineResult<()> {
        let path = self.path_for(uri);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EngineError::LockIo(e)),
        }
    }
}

/// Held lock on one resource; releasing is idempotent and always
/// happens on drop, even when the protected body fails.
#[derive(Debug)]
pub struct LockGuard {
    file: Option<File>,
    uri: String,
}

impl LockGuard {
    /// The locked resource URI
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Release the lock; further calls are no-ops
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
            debug!(uri = %self.uri, "lock released");
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}
