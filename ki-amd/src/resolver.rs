//! Dependency resolver
//!
//! Two phases, always in this order:
//!
//! 1. **Discovery**: starting from a root module, scan every known record's
//!    dependencies in full passes, reading text resources and evaluating
//!    module files, until a pass adds no new record. Nothing is instantiated.
//! 2. **Bless**: depth-first over the discovered graph: every dependency is
//!    blessed before its dependent, each factory runs at most once, and a
//!    node seen again while still `Visiting` is reported as a cycle. A
//!    factory that raised leaves its record `Failed`, and every later visit
//!    reports the same error.

use crate::compat::CompatTable;
use crate::error::{LoaderError, LoaderResult};
use crate::registry::{ModuleRegistry, ModuleState};
use crate::resources::ResourceReader;
use crate::runtime::{Definition, ScriptRuntime};
use crate::spec::{ModuleSpec, SpecKind};
use tracing::{debug, trace, warn};

/// Outcome of a discovery run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Scan passes performed, including the final pass that found nothing
    pub rounds: usize,
    /// Modules whose files were evaluated, in load order
    pub loaded: Vec<String>,
    /// Text resources read
    pub texts: Vec<String>,
}

/// Discovers and instantiates AMD modules for one script runtime.
///
/// Owns the runtime, the registry and the resource reader for its whole
/// lifetime. Not thread-safe: every operation takes `&mut self`.
pub struct DependencyResolver<R: ScriptRuntime> {
    runtime: R,
    registry: ModuleRegistry<R::Value, R::Factory>,
    resources: ResourceReader,
    compat: CompatTable<R>,
    /// Modules currently being blessed, outermost first
    bless_stack: Vec<String>,
}

impl<R: ScriptRuntime> DependencyResolver<R> {
    /// Resolver with the default compatibility table
    pub fn new(runtime: R, resources: ResourceReader) -> Self {
        Self::with_compat(runtime, resources, CompatTable::with_defaults())
    }

    pub fn with_compat(runtime: R, resources: ResourceReader, compat: CompatTable<R>) -> Self {
        Self {
            runtime,
            registry: ModuleRegistry::new(),
            resources,
            compat,
            bless_stack: Vec::new(),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn registry(&self) -> &ModuleRegistry<R::Value, R::Factory> {
        &self.registry
    }

    pub fn resources(&self) -> &ResourceReader {
        &self.resources
    }

    /// Exports of a blessed module
    pub fn exports(&self, name: &str) -> Option<&R::Value> {
        self.registry.exports(name)
    }

    /// Discover and bless `root`, returning its exports.
    pub fn load(&mut self, root: &str) -> LoaderResult<R::Value> {
        self.discover(root)?;
        self.bless(root)?;
        self.registry
            .exports(root)
            .cloned()
            .ok_or_else(|| LoaderError::ModuleNotFound {
                name: root.to_string(),
                required_by: None,
            })
    }

    /// Discover the transitive module graph reachable from `root`.
    ///
    /// Each pass works on a snapshot of the dependencies known when it
    /// starts and loads every unknown module it names, so a chain of `n`
    /// modules takes `n` passes (the last one finds nothing new).
    pub fn discover(&mut self, root: &str) -> LoaderResult<DiscoveryReport> {
        let mut report = DiscoveryReport::default();

        if !self.registry.has(root) {
            self.load_module(root)?;
            report.loaded.push(root.to_string());
        }

        loop {
            report.rounds += 1;
            let mut new_records = 0;

            for spec in self.registry.all_deps() {
                match spec.kind() {
                    SpecKind::Exports => {}
                    SpecKind::Text(name) => {
                        if !self.registry.has_text(name) {
                            let content = self.resources.read_text(name)?;
                            self.registry.put_text(name.as_str(), content);
                            report.texts.push(name.clone());
                        }
                    }
                    SpecKind::Module(name) => {
                        if !self.registry.has(name) {
                            self.load_module(name)?;
                            report.loaded.push(name.clone());
                            new_records += 1;
                        }
                    }
                }
            }

            debug!(
                target: "ki::discovery",
                round = report.rounds,
                new_records,
                known = self.registry.len(),
                "discovery pass"
            );

            if new_records == 0 {
                break;
            }
        }

        Ok(report)
    }

    /// Read and evaluate one module file, capturing its `define` calls.
    ///
    /// If the file leaves its own name undefined, a zero-dependency record
    /// without a factory stands in for it.
    fn load_module(&mut self, name: &str) -> LoaderResult<()> {
        let (path, source) = self.resources.read_module(name)?;
        debug!(target: "ki::discovery", module = %name, path = %path.display(), "loading");

        let mut captured: Vec<Definition<R::Factory>> = Vec::new();
        self.runtime
            .load_file(&path, &source, &mut |definition| captured.push(definition))
            .map_err(|err| LoaderError::Runtime {
                module: name.to_string(),
                message: err.message,
            })?;

        for definition in captured {
            let module = definition.name.unwrap_or_else(|| name.to_string());
            let deps = definition
                .deps
                .iter()
                .map(|token| ModuleSpec::parse(token))
                .collect();
            self.registry.define(module, deps, definition.factory);
        }

        if !self.registry.has(name) {
            debug!(target: "ki::discovery", module = %name, "no define call, installing empty record");
            self.registry.define(name, Vec::new(), None);
        }
        Ok(())
    }

    /// Instantiate the module named by `token` and everything it depends on.
    ///
    /// The exports placeholder and text tokens need no instantiation.
    pub fn bless(&mut self, token: &str) -> LoaderResult<()> {
        let spec = ModuleSpec::parse(token);
        let Some(name) = spec.module_name() else {
            return Ok(());
        };

        let result = self.bless_module(name, None);
        if result.is_err() {
            for visiting in self.bless_stack.drain(..) {
                if self.registry.state(&visiting) == Some(ModuleState::Visiting) {
                    self.registry.set_state(&visiting, ModuleState::Discovered);
                }
            }
        }
        result
    }

    fn bless_module(&mut self, name: &str, required_by: Option<&str>) -> LoaderResult<()> {
        match self.registry.state(name) {
            None => {
                return Err(LoaderError::ModuleNotFound {
                    name: name.to_string(),
                    required_by: required_by.map(str::to_string),
                })
            }
            Some(ModuleState::Blessed) => return Ok(()),
            Some(ModuleState::Failed) => {
                let failure = self.registry.record(name).and_then(|r| r.failure().cloned());
                return Err(failure.unwrap_or_else(|| LoaderError::Runtime {
                    module: name.to_string(),
                    message: "factory failed".to_string(),
                }));
            }
            Some(ModuleState::Visiting) => {
                let mut chain = self.bless_stack.clone();
                chain.push(name.to_string());
                return Err(LoaderError::CycleDetected { chain });
            }
            Some(ModuleState::Discovered) => {}
        }

        self.registry.set_state(name, ModuleState::Visiting);
        self.bless_stack.push(name.to_string());

        let (deps, has_factory) = self
            .registry
            .record(name)
            .map(|r| (r.deps().to_vec(), r.has_factory()))
            .unwrap_or_default();

        for dep in &deps {
            if let Some(dep_name) = dep.module_name() {
                trace!(target: "ki::bless", module = %name, dep = %dep_name, "dependency");
                self.bless_module(dep_name, Some(name))?;
            }
        }

        if has_factory {
            let exports = self.runtime.new_object();
            // the factory stays on the record until its arguments resolve
            let args = self.resolve_args(name, &exports, &deps)?;
            let Some(factory) = self.registry.take_factory(name) else {
                return Err(LoaderError::ModuleNotFound {
                    name: name.to_string(),
                    required_by: required_by.map(str::to_string),
                });
            };

            debug!(target: "ki::bless", module = %name, args = args.len(), "calling factory");
            if let Err(err) = self.runtime.invoke(&factory, &args) {
                let error = LoaderError::Runtime {
                    module: name.to_string(),
                    message: err.message,
                };
                warn!(target: "ki::bless", module = %name, error = %error, "factory failed");
                self.registry.set_failed(name, error.clone());
                return Err(error);
            }
            self.registry.set_exports(name, exports);
        } else {
            let exports = match self.compat.exports_for(name, &self.runtime) {
                Some(value) => {
                    debug!(target: "ki::bless", module = %name, "exports from compatibility adapter");
                    value
                }
                None => self.runtime.new_object(),
            };
            self.registry.set_exports(name, exports);
        }
        self.registry.set_state(name, ModuleState::Blessed);

        self.bless_stack.pop();
        Ok(())
    }

    /// Factory arguments, positionally matching `deps`
    fn resolve_args(
        &mut self,
        name: &str,
        own_exports: &R::Value,
        deps: &[ModuleSpec],
    ) -> LoaderResult<Vec<R::Value>> {
        let mut args = Vec::with_capacity(deps.len());
        for dep in deps {
            let value = match dep.kind() {
                SpecKind::Exports => own_exports.clone(),
                SpecKind::Text(text) => {
                    let content = self.registry.get_text(text).map_err(|_| {
                        LoaderError::TextNotFound {
                            name: text.clone(),
                            required_by: Some(name.to_string()),
                        }
                    })?;
                    self.runtime.string(content)
                }
                SpecKind::Module(module) => self
                    .registry
                    .exports(module)
                    .cloned()
                    .ok_or_else(|| LoaderError::ModuleNotFound {
                        name: module.clone(),
                        required_by: Some(name.to_string()),
                    })?,
            };
            args.push(value);
        }
        Ok(args)
    }
}
