//! Compatibility table for non-AMD scripts
//!
//! Some third-party scripts never call `define`; they assign a global
//! instead. For those names an adapter reads the global out of the runtime
//! and it becomes the module's exports.

use crate::runtime::ScriptRuntime;
use std::collections::BTreeMap;

type Adapter<R> = Box<dyn Fn(&R) -> Option<<R as ScriptRuntime>::Value>>;

/// Declarative `module name -> adapter(runtime) -> exports` table
pub struct CompatTable<R: ScriptRuntime> {
    adapters: BTreeMap<String, Adapter<R>>,
}

impl<R: ScriptRuntime> CompatTable<R> {
    /// Empty table
    pub fn new() -> Self {
        Self {
            adapters: BTreeMap::new(),
        }
    }

    /// Table with the known legacy scripts: `underscore` exposes `_`.
    pub fn with_defaults() -> Self {
        Self::new().with_global("underscore", "_")
    }

    /// Module `module` exports the global `global`
    pub fn with_global(self, module: impl Into<String>, global: impl Into<String>) -> Self {
        let global = global.into();
        self.with_adapter(module, move |runtime: &R| runtime.global(&global))
    }

    /// Register a custom adapter
    pub fn with_adapter<A>(mut self, module: impl Into<String>, adapter: A) -> Self
    where
        A: Fn(&R) -> Option<R::Value> + 'static,
    {
        self.adapters.insert(module.into(), Box::new(adapter));
        self
    }

    pub fn contains(&self, module: &str) -> bool {
        self.adapters.contains_key(module)
    }

    /// Exports for `module`, if it has an adapter and the adapter finds a value
    pub fn exports_for(&self, module: &str, runtime: &R) -> Option<R::Value> {
        self.adapters.get(module).and_then(|adapter| adapter(runtime))
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl<R: ScriptRuntime> Default for CompatTable<R> {
    fn default() -> Self {
        Self::with_defaults()
    }
}
