//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct Entries {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

/// An in-memory file system implementation.
///
/// Files live in a `BTreeMap` keyed by normalized path. Clones share the same
/// storage. A read-only instance rejects every write, which is how tests
/// exercise best-effort persistence paths.
///
/// # Example
/// ```
/// use ki_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::with_files([("/text/C", "hi")]);
/// assert_eq!(fs.read_to_string(Path::new("/text/C")).unwrap(), "hi");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    entries: Arc<RwLock<Entries>>,
    read_only: bool,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory file system pre-populated with `(path, content)` pairs.
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<[u8]>,
    {
        let fs = Self::new();
        if let Ok(mut entries) = fs.entries.write() {
            for (path, content) in files {
                let key = normalize(Path::new(path.as_ref()));
                entries.files.insert(key, content.as_ref().to_vec());
            }
        }
        fs
    }

    /// A view over the same storage that refuses writes.
    pub fn read_only(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            read_only: true,
        }
    }

    /// Number of stored files
    pub fn file_count(&self) -> usize {
        self.entries.read().map(|e| e.files.len()).unwrap_or(0)
    }

    fn guard_writable(&self, path: &Path) -> VfsResult<()> {
        if self.read_only {
            return Err(VfsError::PermissionDenied {
                path: normalize(path),
            });
        }
        Ok(())
    }
}

/// Forward slashes everywhere so keys are stable across platforms.
fn normalize(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn poisoned() -> VfsError {
    VfsError::Io {
        message: "memory file system lock poisoned".to_string(),
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let key = normalize(path);
        let entries = self.entries.read().map_err(|_| poisoned())?;
        entries
            .files
            .get(&key)
            .cloned()
            .ok_or(VfsError::NotFound { path: key })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        self.guard_writable(path)?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.files.insert(normalize(path), content.to_vec());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> VfsResult<()> {
        self.guard_writable(path)?;
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            entries.dirs.insert(normalize(ancestor));
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let key = normalize(path);
        match self.entries.read() {
            Ok(entries) => entries.files.contains_key(&key) || entries.dirs.contains(&key),
            Err(_) => false,
        }
    }
}
