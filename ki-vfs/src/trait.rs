//! VirtualFileSystem trait definition

use crate::error::{VfsError, VfsResult};
use std::path::Path;

/// Virtual File System trait
///
/// Every resource read and source-map write in Ki goes through this trait,
/// so the loader never touches `std::fs` directly.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system
/// - `NativeFileSystem`: Native OS file system, optionally rooted
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents as bytes
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents, creating or truncating the file
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> VfsResult<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Read a file and decode it as UTF-8
    fn read_to_string(&self, path: &Path) -> VfsResult<String> {
        let bytes = self.read_file(path)?;
        String::from_utf8(bytes).map_err(|_| VfsError::InvalidUtf8 {
            path: path.display().to_string(),
        })
    }
}
