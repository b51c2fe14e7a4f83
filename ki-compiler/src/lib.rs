//! Ki Compiler
//!
//! Turns a source text plus a list of macro dependency files into compiled
//! output by driving an external macro compiler:
//! - `cache`: content-addressed cache of macro expansion results
//! - `compiler`: the seam to the external compiler (`MacroCompiler`)
//! - `orchestrator`: macro source assembly, cache lookup, compile call
//! - `source_map`: asset-pipeline source map paths and best-effort writes
//! - `bootstrap`: a `MacroCompiler` backed by modules loaded through `ki-amd`
//! - `template`: asset-pipeline template glue
//! - `logging`: `tracing-subscriber` setup with per-phase levels
//!
//! # Example
//! ```ignore
//! let compiler = RuntimeCompiler::new(resolver, &config.compiler)?;
//! let mut orchestrator = CompileOrchestrator::from_config(compiler, vfs, &config);
//! let output = orchestrator.compile(source, &CompileOptions::default())?;
//! println!("{}", output.code);
//! ```

pub mod bootstrap;
pub mod cache;
pub mod compiler;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod source_map;
pub mod template;

pub use bootstrap::RuntimeCompiler;
pub use cache::{CacheStats, MacroCache, MacroDigest};
pub use compiler::{CompileRequest, CompiledOutput, MacroCompiler};
pub use error::{CompileError, CompileResult, ErrorReport};
pub use orchestrator::{CompileOptions, CompileOrchestrator, CompileOutput};
pub use source_map::{SourceMapLayout, SourceMapPaths, SourceMapWriteError};
pub use template::{render, AssetScope, StaticScope};

// Re-export the config vocabulary for callers that only depend on this crate
pub use ki_config::{AssetConfig, CompilerConfig, KiConfig, LogConfig, LogLevel};
