//! Compile orchestration
//!
//! `compile` assembles the macro source, looks its normalized definitions up
//! in the macro cache (expanding on a miss), hands the source to the external
//! compiler and persists the source map when the asset has a layout.

use crate::cache::{CacheStats, MacroCache, MacroDigest};
use crate::compiler::{CompileRequest, MacroCompiler};
use crate::error::{CompileError, CompileResult};
use crate::source_map::{SourceMapLayout, SourceMapPaths};
use ki_config::KiConfig;
use ki_vfs::{VfsError, VirtualFileSystem};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_PLACEHOLDER: &str = "/*__macros__*/";

/// Per-call options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Asset path; drives source map generation
    pub pathname: Option<PathBuf>,
    /// Files whose contents, joined by newlines, are the macro source
    pub dependencies: Vec<PathBuf>,
}

impl CompileOptions {
    pub fn with_pathname(mut self, pathname: impl Into<PathBuf>) -> Self {
        self.pathname = Some(pathname.into());
        self
    }

    pub fn with_dependencies<I, P>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of one compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutput {
    pub code: String,
    pub source_map: Option<String>,
}

/// Owns the compiler, the macro cache and the file system for one pipeline.
///
/// Single owner, not thread-safe: `compile` takes `&mut self`.
pub struct CompileOrchestrator<C: MacroCompiler> {
    compiler: C,
    cache: MacroCache<C::Modules>,
    vfs: Arc<dyn VirtualFileSystem>,
    layout: Option<SourceMapLayout>,
    placeholder: String,
}

impl<C: MacroCompiler> CompileOrchestrator<C> {
    /// Orchestrator without source map support
    pub fn new(compiler: C, vfs: Arc<dyn VirtualFileSystem>) -> Self {
        Self {
            compiler,
            cache: MacroCache::new(),
            vfs,
            layout: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// Orchestrator using the configured asset layout and macro placeholder
    pub fn from_config(compiler: C, vfs: Arc<dyn VirtualFileSystem>, config: &KiConfig) -> Self {
        Self::new(compiler, vfs)
            .with_layout(SourceMapLayout::from_config(&config.assets))
            .with_placeholder(config.compiler.macros_placeholder.clone())
    }

    pub fn with_layout(mut self, layout: SourceMapLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn cache(&self) -> &MacroCache<C::Modules> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Compile `source` with the macros found in `options.dependencies`
    /// (or in `source` itself when there are none).
    pub fn compile(&mut self, source: &str, options: &CompileOptions) -> CompileResult<CompileOutput> {
        let macro_source = self.macro_source(source, &options.dependencies)?;

        let normalized = self
            .compiler
            .parse_macros(&macro_source)
            .map_err(|err| CompileError::MacroExpansion(err.message))?;
        let key = MacroDigest::digest(&normalized);

        let modules = match self.cache.get(&key) {
            Some(modules) => modules.clone(),
            None => {
                let macro_text = expand_preamble(self.compiler.core_macros(), &self.placeholder, &normalized);
                debug!(target: "ki::compiler", digest = %key.short(), bytes = macro_text.len(), "expanding macros");
                let modules = self
                    .compiler
                    .load_module(&macro_text)
                    .map_err(|err| CompileError::MacroExpansion(err.message))?;
                self.cache.put(key.clone(), modules.clone());
                modules
            }
        };

        let paths = match (&options.pathname, &self.layout) {
            (Some(pathname), Some(layout)) => layout.paths_for(pathname),
            _ => None,
        };

        let request = CompileRequest {
            source,
            modules: &modules,
            filename: paths.as_ref().map(|p| p.source_url.as_str()),
            mapfile: paths.as_ref().map(|p| p.map_url.as_str()),
            source_map: paths.is_some(),
        };
        let output = self
            .compiler
            .compile(request)
            .map_err(|err| CompileError::Compile(err.message))?;

        info!(
            target: "ki::compiler",
            pathname = ?options.pathname,
            digest = %key.short(),
            bytes = output.code.len(),
            source_map = output.source_map.is_some(),
            "compiled"
        );

        if let (Some(map), Some(paths)) = (&output.source_map, &paths) {
            self.persist_source_map(paths, map, source);
        }

        Ok(CompileOutput {
            code: output.code,
            source_map: output.source_map,
        })
    }

    fn macro_source(&self, source: &str, dependencies: &[PathBuf]) -> CompileResult<String> {
        if dependencies.is_empty() {
            return Ok(source.to_string());
        }
        let mut parts = Vec::with_capacity(dependencies.len());
        for path in dependencies {
            let content = self.vfs.read_to_string(path).map_err(|err| match err {
                VfsError::NotFound { .. } => CompileError::ResourceNotFound { path: path.clone() },
                other => CompileError::Io {
                    path: path.clone(),
                    source: other,
                },
            })?;
            parts.push(content);
        }
        Ok(parts.join("\n"))
    }

    /// Write failures are logged and dropped; the compile already succeeded.
    fn persist_source_map(&self, paths: &SourceMapPaths, map: &str, source: &str) {
        match paths.persist(self.vfs.as_ref(), map, source) {
            Ok(()) => debug!(
                target: "ki::compiler",
                map = %paths.map_path.display(),
                "source map written"
            ),
            Err(err) => warn!(target: "ki::compiler", error = %err, "source map not written"),
        }
    }
}

/// The core macro preamble with `macros` spliced in at `placeholder`, or
/// appended after it when the preamble has no placeholder.
fn expand_preamble(preamble: &str, placeholder: &str, macros: &str) -> String {
    if !placeholder.is_empty() && preamble.contains(placeholder) {
        preamble.replacen(placeholder, macros, 1)
    } else {
        format!("{}\n{}", preamble, macros)
    }
}
