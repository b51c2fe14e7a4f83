//! Module registry
//!
//! Holds every discovered module record and text resource for one loader.
//! Generic over the runtime's value (`V`) and factory (`F`) types so it never
//! needs to know about the engine.

use crate::error::{LoaderError, LoaderResult};
use crate::spec::ModuleSpec;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Instantiation state of a module record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Known, factory not yet run
    Discovered,
    /// Dependencies are being blessed; seeing it again means a cycle
    Visiting,
    /// Factory has run (or there was none)
    Blessed,
    /// Factory ran and raised; the error is kept on the record
    Failed,
}

/// A module declared through `define`
pub struct ModuleRecord<V, F> {
    deps: Vec<ModuleSpec>,
    factory: Option<F>,
    exports: Option<V>,
    state: ModuleState,
    failure: Option<LoaderError>,
}

impl<V, F> ModuleRecord<V, F> {
    fn new(deps: Vec<ModuleSpec>, factory: Option<F>) -> Self {
        Self {
            deps,
            factory,
            exports: None,
            state: ModuleState::Discovered,
            failure: None,
        }
    }

    /// Dependencies in declared order
    pub fn deps(&self) -> &[ModuleSpec] {
        &self.deps
    }

    /// Whether a factory is still pending invocation
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// The exports container, once the record has been blessed
    pub fn exports(&self) -> Option<&V> {
        self.exports.as_ref()
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Error raised by the factory of a `Failed` record
    pub fn failure(&self) -> Option<&LoaderError> {
        self.failure.as_ref()
    }
}

impl<V: std::fmt::Debug, F> std::fmt::Debug for ModuleRecord<V, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("deps", &self.deps)
            .field("has_factory", &self.factory.is_some())
            .field("exports", &self.exports)
            .field("state", &self.state)
            .field("failure", &self.failure)
            .finish()
    }
}

/// A raw text resource pulled in by a `text!` dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResource {
    pub name: String,
    pub content: String,
}

/// Registry of module records and text resources
pub struct ModuleRegistry<V, F> {
    modules: BTreeMap<String, ModuleRecord<V, F>>,
    texts: BTreeMap<String, TextResource>,
}

impl<V, F> Default for ModuleRegistry<V, F> {
    fn default() -> Self {
        Self {
            modules: BTreeMap::new(),
            texts: BTreeMap::new(),
        }
    }
}

impl<V, F> ModuleRegistry<V, F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a Discovered record, replacing any previous definition.
    pub fn define(&mut self, name: impl Into<String>, deps: Vec<ModuleSpec>, factory: Option<F>) {
        let name = name.into();
        debug!(
            target: "ki::discovery",
            module = %name,
            deps = deps.len(),
            factory = factory.is_some(),
            "define"
        );
        if let Some(previous) = self.modules.get(&name) {
            warn!(
                target: "ki::discovery",
                module = %name,
                previous_state = ?previous.state,
                "module redefined"
            );
        }
        self.modules.insert(name, ModuleRecord::new(deps, factory));
    }

    pub fn has(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn record(&self, name: &str) -> Option<&ModuleRecord<V, F>> {
        self.modules.get(name)
    }

    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.modules.get(name).map(|r| r.state)
    }

    /// Exports of a blessed module
    pub fn exports(&self, name: &str) -> Option<&V> {
        self.modules.get(name).and_then(|r| r.exports.as_ref())
    }

    /// Module names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Every dependency of every known record, in registry order
    pub fn all_deps(&self) -> Vec<ModuleSpec> {
        self.modules
            .values()
            .flat_map(|r| r.deps.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn has_text(&self, name: &str) -> bool {
        self.texts.contains_key(name)
    }

    /// Content of a loaded text resource
    pub fn get_text(&self, name: &str) -> LoaderResult<&str> {
        self.texts
            .get(name)
            .map(|t| t.content.as_str())
            .ok_or_else(|| LoaderError::TextNotFound {
                name: name.to_string(),
                required_by: None,
            })
    }

    /// Insert a text resource. Text is immutable once inserted, so a second
    /// insert under the same name is ignored.
    pub fn put_text(&mut self, name: impl Into<String>, content: impl Into<String>) {
        let name = name.into();
        if self.texts.contains_key(&name) {
            return;
        }
        let content = content.into();
        debug!(target: "ki::discovery", text = %name, bytes = content.len(), "text resource");
        self.texts.insert(name.clone(), TextResource { name, content });
    }

    pub fn text_count(&self) -> usize {
        self.texts.len()
    }

    pub(crate) fn set_state(&mut self, name: &str, state: ModuleState) {
        if let Some(record) = self.modules.get_mut(name) {
            record.state = state;
        }
    }

    pub(crate) fn set_exports(&mut self, name: &str, exports: V) {
        if let Some(record) = self.modules.get_mut(name) {
            record.exports = Some(exports);
        }
    }

    /// Mark a record `Failed`, keeping the error for later visits
    pub(crate) fn set_failed(&mut self, name: &str, error: LoaderError) {
        if let Some(record) = self.modules.get_mut(name) {
            record.state = ModuleState::Failed;
            record.failure = Some(error);
        }
    }

    /// Remove the factory so it can be invoked exactly once
    pub(crate) fn take_factory(&mut self, name: &str) -> Option<F> {
        self.modules.get_mut(name).and_then(|r| r.factory.take())
    }
}

impl<V, F> std::fmt::Debug for ModuleRegistry<V, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .field("texts", &self.texts.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Registry = ModuleRegistry<u32, &'static str>;

    fn specs(tokens: &[&str]) -> Vec<ModuleSpec> {
        tokens.iter().map(|t| ModuleSpec::parse(t)).collect()
    }

    #[test]
    fn test_define_and_has() {
        let mut reg = Registry::new();
        assert!(!reg.has("a"));

        reg.define("a", specs(&["exports", "./b"]), Some("factory-a"));
        assert!(reg.has("a"));
        assert_eq!(reg.len(), 1);

        let record = reg.record("a").unwrap();
        assert_eq!(record.deps().len(), 2);
        assert!(record.has_factory());
        assert_eq!(record.state(), ModuleState::Discovered);
        assert!(record.exports().is_none());
    }

    #[test]
    fn test_define_overwrites() {
        let mut reg = Registry::new();
        reg.define("a", specs(&["b"]), Some("first"));
        reg.set_state("a", ModuleState::Blessed);

        reg.define("a", Vec::new(), None);
        let record = reg.record("a").unwrap();
        assert!(record.deps().is_empty());
        assert!(!record.has_factory());
        assert_eq!(record.state(), ModuleState::Discovered);
    }

    #[test]
    fn test_text_roundtrip_and_missing() {
        let mut reg = Registry::new();
        reg.put_text("C", "hi");
        assert!(reg.has_text("C"));
        assert_eq!(reg.get_text("C").unwrap(), "hi");

        let err = reg.get_text("D").unwrap_err();
        assert!(matches!(err, LoaderError::TextNotFound { ref name, .. } if name == "D"));
    }

    #[test]
    fn test_text_is_write_once() {
        let mut reg = Registry::new();
        reg.put_text("C", "first");
        reg.put_text("C", "second");
        assert_eq!(reg.get_text("C").unwrap(), "first");
        assert_eq!(reg.text_count(), 1);
    }

    #[test]
    fn test_take_factory_once() {
        let mut reg = Registry::new();
        reg.define("a", Vec::new(), Some("fa"));
        assert_eq!(reg.take_factory("a"), Some("fa"));
        assert_eq!(reg.take_factory("a"), None);
        assert!(!reg.record("a").unwrap().has_factory());
    }

    #[test]
    fn test_failed_record_keeps_error_until_redefined() {
        let mut reg = Registry::new();
        reg.define("a", Vec::new(), Some("fa"));
        let err = LoaderError::Runtime {
            module: "a".to_string(),
            message: "boom".to_string(),
        };
        reg.set_failed("a", err.clone());

        assert_eq!(reg.state("a"), Some(ModuleState::Failed));
        assert_eq!(reg.record("a").unwrap().failure(), Some(&err));

        reg.define("a", Vec::new(), Some("fa2"));
        assert_eq!(reg.state("a"), Some(ModuleState::Discovered));
        assert!(reg.record("a").unwrap().failure().is_none());
    }

    #[test]
    fn test_exports_after_set() {
        let mut reg = Registry::new();
        reg.define("a", Vec::new(), None);
        assert_eq!(reg.exports("a"), None);
        reg.set_exports("a", 7);
        assert_eq!(reg.exports("a"), Some(&7));
        assert_eq!(reg.exports("missing"), None);
    }

    #[test]
    fn test_names_sorted_and_all_deps() {
        let mut reg = Registry::new();
        reg.define("b", specs(&["text!c"]), None);
        reg.define("a", specs(&["exports", "b"]), None);

        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["a", "b"]);
        let deps = reg.all_deps();
        assert_eq!(deps, specs(&["exports", "b", "text!c"]));
    }
}
