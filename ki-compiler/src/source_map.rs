//! Source map layout for the asset pipeline
//!
//! A compiled asset at `<source_root>/<dir>/<name>.<ext...>` gets its map at
//! `<assets_root>/source_maps/<dir>/<name>.map` and a copy of its original
//! source at `<assets_root>/source_maps/<dir>/<name>.js.ki`. The compiler is
//! told the URL forms of both so the emitted map points back at them.

use ki_config::AssetConfig;
use ki_vfs::{VfsError, VirtualFileSystem};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

const SOURCE_MAPS_DIR: &str = "source_maps";

/// A failed best-effort write; logged, never returned from `compile`
#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to write {}: {source}", .path.display())]
pub struct SourceMapWriteError {
    pub path: PathBuf,
    #[source]
    pub source: VfsError,
}

/// Derives source map locations from asset pathnames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapLayout {
    assets_root: PathBuf,
    source_root: PathBuf,
}

/// Where one asset's source map and original source go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapPaths {
    pub map_path: PathBuf,
    pub source_path: PathBuf,
    pub map_url: String,
    pub source_url: String,
}

impl SourceMapLayout {
    pub fn new(assets_root: impl Into<PathBuf>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
            source_root: source_root.into(),
        }
    }

    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(&config.assets_root, &config.source_root)
    }

    /// Paths for `pathname`, or `None` when it is not under the source root
    pub fn paths_for(&self, pathname: &Path) -> Option<SourceMapPaths> {
        let relative = pathname.strip_prefix(&self.source_root).ok()?;
        let file_name = relative.file_name()?.to_str()?;
        let basename = file_name.split('.').next().filter(|b| !b.is_empty())?;

        let mut url_dir = String::new();
        let mut dir = self.assets_root.join(SOURCE_MAPS_DIR);
        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                // `..` would escape the source map directory
                let Component::Normal(part) = component else {
                    return None;
                };
                let part = part.to_str()?;
                dir.push(part);
                url_dir.push('/');
                url_dir.push_str(part);
            }
        }

        Some(SourceMapPaths {
            map_path: dir.join(format!("{}.map", basename)),
            source_path: dir.join(format!("{}.js.ki", basename)),
            map_url: format!("/{}{}/{}.map", SOURCE_MAPS_DIR, url_dir, basename),
            source_url: format!("/{}{}/{}.js.ki", SOURCE_MAPS_DIR, url_dir, basename),
        })
    }
}

impl SourceMapPaths {
    /// Write the map and the original source, creating the directory first.
    pub fn persist(
        &self,
        vfs: &dyn VirtualFileSystem,
        source_map: &str,
        original_source: &str,
    ) -> Result<(), SourceMapWriteError> {
        if let Some(dir) = self.map_path.parent() {
            vfs.create_dir_all(dir).map_err(|source| SourceMapWriteError {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        write(vfs, &self.map_path, source_map)?;
        write(vfs, &self.source_path, original_source)
    }
}

fn write(vfs: &dyn VirtualFileSystem, path: &Path, content: &str) -> Result<(), SourceMapWriteError> {
    vfs.write_file(path, content.as_bytes())
        .map_err(|source| SourceMapWriteError {
            path: path.to_path_buf(),
            source,
        })
}
