//! Resource reader: module and text names to file content

use crate::error::{LoaderError, LoaderResult};
use ki_config::LoaderConfig;
use ki_vfs::{VfsError, VirtualFileSystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maps names to files below a resource root.
///
/// - module `name` → `<root>/<name><ext>` (default `.js`)
/// - text `name` → `<root>/<name>`
#[derive(Clone)]
pub struct ResourceReader {
    vfs: Arc<dyn VirtualFileSystem>,
    root: PathBuf,
    module_extension: String,
}

impl std::fmt::Debug for ResourceReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceReader")
            .field("root", &self.root)
            .field("module_extension", &self.module_extension)
            .finish_non_exhaustive()
    }
}

impl ResourceReader {
    pub fn new(vfs: Arc<dyn VirtualFileSystem>, config: &LoaderConfig) -> Self {
        Self {
            vfs,
            root: config.resource_root.clone(),
            module_extension: config.module_extension.clone(),
        }
    }

    /// Reader rooted at `root` with the default `.js` extension
    pub fn with_root(vfs: Arc<dyn VirtualFileSystem>, root: impl Into<PathBuf>) -> Self {
        let config = LoaderConfig {
            resource_root: root.into(),
            ..LoaderConfig::default()
        };
        Self::new(vfs, &config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vfs(&self) -> &Arc<dyn VirtualFileSystem> {
        &self.vfs
    }

    pub fn module_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}{}", name, self.module_extension))
    }

    pub fn text_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read a module's source, returning the path it came from
    pub fn read_module(&self, name: &str) -> LoaderResult<(PathBuf, String)> {
        let path = self.module_path(name);
        let source = self.read(name, &path)?;
        Ok((path, source))
    }

    /// Read a text resource
    pub fn read_text(&self, name: &str) -> LoaderResult<String> {
        let path = self.text_path(name);
        self.read(name, &path)
    }

    fn read(&self, name: &str, path: &Path) -> LoaderResult<String> {
        self.vfs.read_to_string(path).map_err(|err| match err {
            VfsError::NotFound { .. } => LoaderError::ResourceNotFound {
                name: name.to_string(),
                path: path.to_path_buf(),
            },
            VfsError::InvalidUtf8 { .. } => LoaderError::InvalidUtf8 {
                name: name.to_string(),
                path: path.to_path_buf(),
            },
            other => LoaderError::Io {
                name: name.to_string(),
                source: other,
            },
        })
    }
}
