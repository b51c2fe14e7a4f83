//! Loader error types

use ki_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised while discovering or instantiating modules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoaderError {
    /// A module file or text resource does not exist
    #[error("resource '{name}' not found at {}", .path.display())]
    ResourceNotFound { name: String, path: PathBuf },

    /// A resource exists but could not be read
    #[error("failed to read resource '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: VfsError,
    },

    /// A resource is not valid UTF-8
    #[error("resource '{name}' is not valid UTF-8 ({})", .path.display())]
    InvalidUtf8 { name: String, path: PathBuf },

    /// A dependency names a module with no record
    #[error("module '{name}' not found{}", required_by_suffix(.required_by))]
    ModuleNotFound {
        name: String,
        required_by: Option<String>,
    },

    /// A `text!` dependency names a resource that was never loaded
    #[error("text resource '{name}' not found{}", required_by_suffix(.required_by))]
    TextNotFound {
        name: String,
        required_by: Option<String>,
    },

    /// A module transitively depends on itself
    #[error("cyclic module dependency: {}", .chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },

    /// The script runtime failed evaluating a file or running a factory
    #[error("module '{module}' failed: {message}")]
    Runtime { module: String, message: String },
}

fn required_by_suffix(required_by: &Option<String>) -> String {
    match required_by {
        Some(parent) => format!(" (required by '{}')", parent),
        None => String::new(),
    }
}

impl LoaderError {
    /// Short machine-readable kind, used in error reports
    pub fn kind(&self) -> &'static str {
        match self {
            LoaderError::ResourceNotFound { .. } => "ResourceNotFound",
            LoaderError::Io { .. } => "Io",
            LoaderError::InvalidUtf8 { .. } => "InvalidUtf8",
            LoaderError::ModuleNotFound { .. } => "ModuleNotFound",
            LoaderError::TextNotFound { .. } => "TextNotFound",
            LoaderError::CycleDetected { .. } => "CycleDetected",
            LoaderError::Runtime { .. } => "Runtime",
        }
    }
}
