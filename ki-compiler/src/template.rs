//! Asset pipeline template glue

use crate::compiler::MacroCompiler;
use crate::error::CompileResult;
use crate::orchestrator::{CompileOptions, CompileOrchestrator};
use std::path::{Path, PathBuf};

/// What the asset pipeline knows about the asset being rendered
pub trait AssetScope {
    /// Logical path of the asset, when it has one
    fn pathname(&self) -> Option<&Path>;

    /// Assets this one depends on; their contents are the macro source
    fn dependency_assets(&self) -> Vec<PathBuf>;
}

/// Fixed scope, for callers that are not an asset pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticScope {
    pub pathname: Option<PathBuf>,
    pub dependencies: Vec<PathBuf>,
}

impl AssetScope for StaticScope {
    fn pathname(&self) -> Option<&Path> {
        self.pathname.as_deref()
    }

    fn dependency_assets(&self) -> Vec<PathBuf> {
        self.dependencies.clone()
    }
}

/// Compile a template body for `scope`. The output ends with a newline so
/// concatenated assets stay separated.
pub fn render<C: MacroCompiler>(
    orchestrator: &mut CompileOrchestrator<C>,
    data: &str,
    scope: &dyn AssetScope,
) -> CompileResult<String> {
    let options = CompileOptions {
        pathname: scope.pathname().map(Path::to_path_buf),
        dependencies: scope.dependency_assets(),
    };
    let output = orchestrator.compile(data, &options)?;
    Ok(output.code + "\n")
}
