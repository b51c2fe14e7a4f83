//! 编译错误类型
//!
//! One error type for everything `compile` can surface, plus a structured
//! report that callers can print or serialize.

use ki_amd::LoaderError;
use ki_vfs::VfsError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for compile operations
pub type CompileResult<T> = Result<T, CompileError>;

/// Ki 编译错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Module loading failed while bootstrapping the compiler
    #[error("{0}")]
    Loader(#[from] LoaderError),

    /// A macro dependency file does not exist
    #[error("dependency not found: {}", .path.display())]
    ResourceNotFound { path: PathBuf },

    /// A macro dependency file exists but could not be read
    #[error("failed to read dependency {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    /// Macro extraction or expansion failed inside the external compiler
    #[error("Macro expansion error: {0}")]
    MacroExpansion(String),

    /// The external compiler rejected the source
    #[error("Compile error: {0}")]
    Compile(String),

    /// The compiler modules do not expose what the compiler needs
    #[error("Bootstrap error: {0}")]
    Bootstrap(String),
}

impl CompileError {
    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            CompileError::Loader(_) => "loader",
            CompileError::ResourceNotFound { .. } | CompileError::Io { .. } => "resource",
            CompileError::MacroExpansion(_) => "macro",
            CompileError::Compile(_) => "compiler",
            CompileError::Bootstrap(_) => "bootstrap",
        }
    }

    /// 转换为结构化错误报告
    ///
    /// `Display` gives the human-readable form; `to_json` the serialized one.
    pub fn to_report(&self) -> ErrorReport {
        let (error_kind, path) = match self {
            CompileError::Loader(err) => (err.kind().to_string(), loader_path(err)),
            CompileError::ResourceNotFound { path } => {
                ("ResourceNotFound".to_string(), Some(path.display().to_string()))
            }
            CompileError::Io { path, .. } => ("Io".to_string(), Some(path.display().to_string())),
            CompileError::MacroExpansion(_) => ("MacroExpansionError".to_string(), None),
            CompileError::Compile(_) => ("CompileError".to_string(), None),
            CompileError::Bootstrap(_) => ("BootstrapError".to_string(), None),
        };
        ErrorReport {
            phase: self.phase(),
            error_kind,
            message: self.to_string(),
            path,
        }
    }
}

fn loader_path(err: &LoaderError) -> Option<String> {
    match err {
        LoaderError::ResourceNotFound { path, .. } | LoaderError::InvalidUtf8 { path, .. } => {
            Some(path.display().to_string())
        }
        _ => None,
    }
}

/// 结构化错误报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// 错误阶段: loader, resource, macro, compiler, bootstrap
    pub phase: &'static str,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    /// 人类可读的错误消息
    pub message: String,
    /// Offending file, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "[{}] {} ({})", self.phase, self.message, path),
            None => write!(f, "[{}] {}", self.phase, self.message),
        }
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"phase":"{}","error_kind":"{}"}}"#, self.phase, self.error_kind)
        })
    }
}
