//! Runtime-backed macro compiler
//!
//! The compiler, macro expander and source map support are script modules.
//! `RuntimeCompiler` loads them through a [`DependencyResolver`] and drives
//! their exports:
//! - `ki.parseMacros(text)` extracts macro definitions
//! - `sweet.loadModule(text)` expands a macro text into a module set
//! - `ki.compile(source, options)` compiles against that module set

use crate::compiler::{CompileRequest, CompiledOutput, MacroCompiler};
use crate::error::{CompileError, CompileResult};
use ki_amd::{DependencyResolver, RuntimeError, RuntimeResult, ScriptRuntime};
use ki_config::CompilerConfig;
use tracing::{debug, info};

/// `MacroCompiler` over modules loaded into a script runtime
pub struct RuntimeCompiler<R: ScriptRuntime> {
    resolver: DependencyResolver<R>,
    ki: R::Value,
    sweet: R::Value,
    core_macros: String,
}

impl<R: ScriptRuntime> RuntimeCompiler<R> {
    /// Load the compiler modules and read the core macro preamble.
    ///
    /// The source map module is not an AMD module and expects a browser
    /// `window`; the global object is exposed under that name only while it
    /// loads. Both compiler modules are discovered before either is blessed,
    /// so a missing file fails before any factory runs.
    pub fn new(mut resolver: DependencyResolver<R>, config: &CompilerConfig) -> CompileResult<Self> {
        for module in [&config.root_module, &config.expander_module] {
            let report = resolver.discover(module)?;
            debug!(target: "ki::compiler", module = %module, rounds = report.rounds, "discovered");
        }
        let ki = resolver.load(&config.root_module)?;
        let sweet = resolver.load(&config.expander_module)?;
        let core_macros = resolver.resources().read_text(&config.core_macros)?;

        {
            let runtime = resolver.runtime_mut();
            let global = runtime.global_object();
            runtime.set_global("window", global);
        }
        let source_map = resolver.load(&config.source_map_module);
        resolver.runtime_mut().remove_global("window");
        source_map?;

        let runtime = resolver.runtime();
        for method in ["parseMacros", "compile"] {
            require_method(runtime, &ki, &config.root_module, method)?;
        }
        require_method(runtime, &sweet, &config.expander_module, "loadModule")?;

        info!(
            target: "ki::compiler",
            modules = resolver.registry().len(),
            core_macros = core_macros.len(),
            "compiler ready"
        );

        Ok(Self {
            resolver,
            ki,
            sweet,
            core_macros,
        })
    }

    pub fn resolver(&self) -> &DependencyResolver<R> {
        &self.resolver
    }

    pub fn runtime(&self) -> &R {
        self.resolver.runtime()
    }
}

fn require_method<R: ScriptRuntime>(
    runtime: &R,
    exports: &R::Value,
    module: &str,
    method: &str,
) -> CompileResult<()> {
    match runtime.get_property(exports, method) {
        Some(_) => Ok(()),
        None => Err(CompileError::Bootstrap(format!(
            "module '{}' does not export '{}'",
            module, method
        ))),
    }
}

impl<R: ScriptRuntime> MacroCompiler for RuntimeCompiler<R> {
    type Modules = R::Value;

    fn core_macros(&self) -> &str {
        &self.core_macros
    }

    fn parse_macros(&mut self, macro_source: &str) -> RuntimeResult<String> {
        let runtime = self.resolver.runtime_mut();
        let arg = runtime.string(macro_source);
        let result = runtime.call_method(&self.ki, "parseMacros", &[arg])?;
        runtime
            .as_string(&result)
            .ok_or_else(|| RuntimeError::new("parseMacros did not return a string"))
    }

    fn load_module(&mut self, macro_text: &str) -> RuntimeResult<R::Value> {
        debug!(target: "ki::compiler", bytes = macro_text.len(), "sweet.loadModule");
        let runtime = self.resolver.runtime_mut();
        let arg = runtime.string(macro_text);
        runtime.call_method(&self.sweet, "loadModule", &[arg])
    }

    fn compile(&mut self, request: CompileRequest<'_, R::Value>) -> RuntimeResult<CompiledOutput> {
        let runtime = self.resolver.runtime_mut();

        let options = runtime.new_object();
        runtime.set_property(&options, "modules", request.modules.clone())?;
        if let Some(filename) = request.filename {
            let value = runtime.string(filename);
            runtime.set_property(&options, "filename", value)?;
        }
        if let Some(mapfile) = request.mapfile {
            let value = runtime.string(mapfile);
            runtime.set_property(&options, "mapfile", value)?;
        }
        if request.source_map {
            let value = runtime.boolean(true);
            runtime.set_property(&options, "sourceMap", value)?;
        }

        let source = runtime.string(request.source);
        let result = runtime.call_method(&self.ki, "compile", &[source, options])?;

        // ki.compile returns plain code, or { code, map } with source maps on
        if let Some(code) = runtime.as_string(&result) {
            return Ok(CompiledOutput {
                code,
                source_map: None,
            });
        }
        let code = runtime
            .get_property(&result, "code")
            .and_then(|v| runtime.as_string(&v))
            .ok_or_else(|| RuntimeError::new("compile result has no code"))?;
        let source_map = ["map", "sourceMap"]
            .iter()
            .filter_map(|key| runtime.get_property(&result, key))
            .find_map(|v| runtime.as_string(&v));

        Ok(CompiledOutput { code, source_map })
    }
}
