//! Script runtime seam
//!
//! The loader never evaluates script text itself. A `ScriptRuntime` owns the
//! engine, its global namespace and every value handle; the loader only moves
//! opaque `Value` handles between factories.

use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Result type for runtime calls
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// An error raised inside the script engine, surfaced verbatim
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One `define(...)` call captured while a file was evaluated.
///
/// Mirrors `define(nameOrDeps, depsOrFactory, factory?)`: when `name` is
/// `None` the module takes the name of the file being loaded.
pub struct Definition<F> {
    pub name: Option<String>,
    pub deps: Vec<String>,
    pub factory: Option<F>,
}

impl<F> Definition<F> {
    /// `define(deps, factory)`
    pub fn anonymous<I, S>(deps: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            deps: deps.into_iter().map(Into::into).collect(),
            factory: Some(factory),
        }
    }

    /// `define(name, deps, factory)`
    pub fn named<I, S>(name: impl Into<String>, deps: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            deps: deps.into_iter().map(Into::into).collect(),
            factory: Some(factory),
        }
    }
}

impl<F> fmt::Debug for Definition<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

/// The script execution environment, consumed as an opaque service.
///
/// Values are handles: cloning one must alias the same underlying object,
/// since factories populate the exports container they were handed.
pub trait ScriptRuntime {
    /// Handle to a value living in the engine
    type Value: Clone + fmt::Debug;
    /// Invocable captured from a `define` call
    type Factory;

    /// Evaluate a piece of script text
    fn evaluate(&mut self, source: &str) -> RuntimeResult<Self::Value>;

    /// Evaluate a file's contents, keeping `path` as its identity for
    /// diagnostics. `define` receives every `define(...)` call the file
    /// makes; it is only valid for the duration of this call.
    fn load_file(
        &mut self,
        path: &Path,
        source: &str,
        define: &mut dyn FnMut(Definition<Self::Factory>),
    ) -> RuntimeResult<()>;

    /// Call a factory with positional arguments. Return values are dropped.
    fn invoke(&mut self, factory: &Self::Factory, args: &[Self::Value]) -> RuntimeResult<()>;

    /// A fresh, empty object (used as an exports container)
    fn new_object(&mut self) -> Self::Value;

    /// A string value
    fn string(&mut self, text: &str) -> Self::Value;

    /// A boolean value
    fn boolean(&mut self, value: bool) -> Self::Value;

    /// Read a value back as a string, if it is one
    fn as_string(&self, value: &Self::Value) -> Option<String>;

    /// Property lookup on an object
    fn get_property(&self, target: &Self::Value, key: &str) -> Option<Self::Value>;

    /// Property assignment on an object
    fn set_property(
        &mut self,
        target: &Self::Value,
        key: &str,
        value: Self::Value,
    ) -> RuntimeResult<()>;

    /// `target[method](...args)`
    fn call_method(
        &mut self,
        target: &Self::Value,
        method: &str,
        args: &[Self::Value],
    ) -> RuntimeResult<Self::Value>;

    /// The global object itself
    fn global_object(&self) -> Self::Value;

    /// Global namespace lookup
    fn global(&self, name: &str) -> Option<Self::Value>;

    fn set_global(&mut self, name: &str, value: Self::Value);

    fn remove_global(&mut self, name: &str);
}
