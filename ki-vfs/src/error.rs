//! VFS Error Types

use thiserror::Error;

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Error type for VFS operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VfsError {
    /// File or directory not found
    #[error("Path not found: {path}")]
    NotFound { path: String },

    /// Permission denied
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// Invalid path
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// File content is not valid UTF-8
    #[error("Invalid UTF-8 in '{path}'")]
    InvalidUtf8 { path: String },

    /// IO error
    #[error("IO error: {message}")]
    Io { message: String },
}

impl VfsError {
    /// Whether this error means the path does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound { .. })
    }

    /// Map an `std::io::Error` for `path`, keeping the not-found and
    /// permission cases distinguishable.
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            std::io::ErrorKind::NotFound => VfsError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => VfsError::PermissionDenied { path },
            _ => VfsError::Io {
                message: format!("{}: {}", path, err),
            },
        }
    }
}
