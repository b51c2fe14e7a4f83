//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::{Path, PathBuf};
use tracing::trace;

/// A native OS file system implementation.
///
/// Wraps `std::fs`. With a base directory, relative paths are resolved
/// against it; absolute paths pass through unchanged. Every call opens and
/// closes its own handle, so nothing stays open on an error path.
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem {
    base: Option<PathBuf>,
}

impl NativeFileSystem {
    /// Create a new native file system using the process working directory.
    pub fn new() -> Self {
        Self { base: None }
    }

    /// Create a native file system rooted at `base`.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    /// The base directory, if any
    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let full = self.resolve(path);
        trace!(target: "ki::vfs", path = %full.display(), "read_file");
        std::fs::read(&full).map_err(|e| VfsError::from_io(e, &full))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        let full = self.resolve(path);
        trace!(target: "ki::vfs", path = %full.display(), bytes = content.len(), "write_file");
        std::fs::write(&full, content).map_err(|e| VfsError::from_io(e, &full))
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        let full = self.resolve(path);
        std::fs::create_dir_all(&full).map_err(|e| VfsError::from_io(e, &full))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}
