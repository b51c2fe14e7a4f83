//! 测试辅助工具
//!
//! `FakeCompiler` stands in for the external compiler: macro definitions are
//! the lines starting with `macro `, expansion echoes its input, and compiled
//! code is the upper-cased source tagged with the module set it used.

#![allow(dead_code)]

use ki_amd::{RuntimeError, RuntimeResult};
use ki_compiler::{CompileOrchestrator, CompileRequest, CompiledOutput, MacroCompiler, SourceMapLayout};
use ki_vfs::MemoryFileSystem;
use std::sync::Arc;

pub const CORE_MACROS: &str = "// core\n/*__macros__*/\n// end";
pub const ASSETS_ROOT: &str = "/site/public/assets";
pub const SOURCE_ROOT: &str = "/site/app/assets/javascripts";

#[derive(Debug, Default)]
pub struct FakeCompiler {
    pub core: String,
    pub expansions: usize,
    pub expanded: Vec<String>,
    pub requests: Vec<RecordedRequest>,
}

/// Owned copy of a `CompileRequest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub source: String,
    pub modules: String,
    pub filename: Option<String>,
    pub mapfile: Option<String>,
    pub source_map: bool,
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self::with_core(CORE_MACROS)
    }

    pub fn with_core(core: &str) -> Self {
        Self {
            core: core.to_string(),
            ..Self::default()
        }
    }
}

impl MacroCompiler for FakeCompiler {
    type Modules = String;

    fn core_macros(&self) -> &str {
        &self.core
    }

    fn parse_macros(&mut self, macro_source: &str) -> RuntimeResult<String> {
        if macro_source.contains("@@bad-macro") {
            return Err(RuntimeError::new("Line 1: unexpected token @@"));
        }
        Ok(macro_source
            .lines()
            .filter(|line| line.trim_start().starts_with("macro "))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn load_module(&mut self, macro_text: &str) -> RuntimeResult<String> {
        self.expansions += 1;
        self.expanded.push(macro_text.to_string());
        Ok(format!("modules#{}", self.expansions))
    }

    fn compile(&mut self, request: CompileRequest<'_, String>) -> RuntimeResult<CompiledOutput> {
        self.requests.push(RecordedRequest {
            source: request.source.to_string(),
            modules: request.modules.clone(),
            filename: request.filename.map(str::to_string),
            mapfile: request.mapfile.map(str::to_string),
            source_map: request.source_map,
        });
        if request.source.contains("@@bad-source") {
            return Err(RuntimeError::new("Line 2: unexpected identifier"));
        }
        let code = format!("/* {} */ {}", request.modules, request.source.to_uppercase());
        let source_map = if request.source_map {
            Some(format!(
                "{{\"file\":\"{}\",\"sources\":[\"{}\"]}}",
                request.mapfile.unwrap_or_default(),
                request.filename.unwrap_or_default()
            ))
        } else {
            None
        };
        Ok(CompiledOutput { code, source_map })
    }
}

/// Orchestrator over `fs` with the test asset layout
pub fn orchestrator(fs: &MemoryFileSystem) -> CompileOrchestrator<FakeCompiler> {
    CompileOrchestrator::new(FakeCompiler::new(), Arc::new(fs.clone()))
        .with_layout(SourceMapLayout::new(ASSETS_ROOT, SOURCE_ROOT))
}

pub fn asset(relative: &str) -> String {
    format!("{}/{}", SOURCE_ROOT, relative)
}
