//! External compiler seam

use ki_amd::RuntimeResult;

/// Inputs of one compile call
#[derive(Debug)]
pub struct CompileRequest<'a, M> {
    pub source: &'a str,
    /// Expanded macro modules, as returned by `load_module`
    pub modules: &'a M,
    /// URL of the original source, for the source map
    pub filename: Option<&'a str>,
    /// URL the source map will be served from
    pub mapfile: Option<&'a str>,
    /// Whether a source map should be produced
    pub source_map: bool,
}

/// What the external compiler produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    pub code: String,
    pub source_map: Option<String>,
}

/// The macro-aware compiler the orchestrator drives.
///
/// Errors are engine errors, surfaced verbatim by the orchestrator.
pub trait MacroCompiler {
    /// Parsed macro module set, the value stored in the macro cache
    type Modules: Clone;

    /// Core macro preamble every macro module set is built on
    fn core_macros(&self) -> &str;

    /// Extract the macro definitions from a macro source text
    fn parse_macros(&mut self, macro_source: &str) -> RuntimeResult<String>;

    /// Parse a full macro text (preamble plus definitions) into modules
    fn load_module(&mut self, macro_text: &str) -> RuntimeResult<Self::Modules>;

    fn compile(&mut self, request: CompileRequest<'_, Self::Modules>) -> RuntimeResult<CompiledOutput>;
}
