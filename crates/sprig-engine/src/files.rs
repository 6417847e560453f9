//! File access used by resource creation and shader hot reload.
//!
//! Failures are not errors at this layer: an unreadable file reads as empty
//! and has no modify time. Callers decide what an empty result means.

use std::path::Path;
use std::time::SystemTime;

/// File service consumed by the renderer.
pub trait FileService {
    /// Reads the whole file. Returns an empty vector on any failure.
    fn read(&self, path: &Path) -> Vec<u8>;

    /// Last modification time, or `None` if the file cannot be stat'ed.
    fn modified(&self, path: &Path) -> Option<SystemTime>;
}

/// [`FileService`] backed by the local filesystem.
#[derive(Debug, Default, Copy, Clone)]
pub struct DiskFiles;

impl FileService for DiskFiles {
    fn read(&self, path: &Path) -> Vec<u8> {
        match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("failed to read {}: {e}", path.display());
                Vec::new()
            }
        }
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}
