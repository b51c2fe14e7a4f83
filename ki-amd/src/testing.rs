//! In-process mock script runtime
//!
//! Scripts are Rust closures registered per file path; values are shared,
//! interior-mutable handles so factories can populate exports in place like
//! a real engine would. Enabled for this crate's tests and, through the
//! `testing` feature, for downstream crates.

use crate::runtime::{Definition, RuntimeError, RuntimeResult, ScriptRuntime};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Native function stored in a mock value
pub type NativeFn = Rc<dyn Fn(&mut MockRuntime, &[MockValue]) -> RuntimeResult<MockValue>>;

/// Factory captured from a mock `define` call
pub type MockFactory = Rc<dyn Fn(&mut MockRuntime, &[MockValue]) -> RuntimeResult<()>>;

type MockScript = Rc<dyn Fn(&mut ScriptScope<'_>) -> RuntimeResult<()>>;

enum Slot {
    Undefined,
    Bool(bool),
    Str(String),
    Object(BTreeMap<String, MockValue>),
    Function(NativeFn),
}

/// Handle to a mock value; clones alias the same slot
#[derive(Clone)]
pub struct MockValue(Rc<RefCell<Slot>>);

impl MockValue {
    fn from_slot(slot: Slot) -> Self {
        Self(Rc::new(RefCell::new(slot)))
    }

    pub fn undefined() -> Self {
        Self::from_slot(Slot::Undefined)
    }

    pub fn object() -> Self {
        Self::from_slot(Slot::Object(BTreeMap::new()))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::from_slot(Slot::Str(text.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::from_slot(Slot::Bool(value))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut MockRuntime, &[MockValue]) -> RuntimeResult<MockValue> + 'static,
    {
        Self::from_slot(Slot::Function(Rc::new(f)))
    }

    /// Same underlying slot
    pub fn ptr_eq(&self, other: &MockValue) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_string(&self) -> Option<String> {
        match &*self.0.borrow() {
            Slot::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &*self.0.borrow() {
            Slot::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(&*self.0.borrow(), Slot::Undefined)
    }

    /// Property read; `None` for non-objects and missing keys
    pub fn get(&self, key: &str) -> Option<MockValue> {
        match &*self.0.borrow() {
            Slot::Object(props) => props.get(key).cloned(),
            _ => None,
        }
    }

    /// Property write; returns false if this is not an object
    pub fn set(&self, key: &str, value: MockValue) -> bool {
        match &mut *self.0.borrow_mut() {
            Slot::Object(props) => {
                props.insert(key.to_string(), value);
                true
            }
            _ => false,
        }
    }

    /// Property names of an object, sorted
    pub fn keys(&self) -> Vec<String> {
        match &*self.0.borrow() {
            Slot::Object(props) => props.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn as_function(&self) -> Option<NativeFn> {
        match &*self.0.borrow() {
            Slot::Function(f) => Some(Rc::clone(f)),
            _ => None,
        }
    }
}

impl fmt::Debug for MockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0.borrow() {
            Slot::Undefined => write!(f, "undefined"),
            Slot::Bool(b) => write!(f, "{}", b),
            Slot::Str(s) => write!(f, "{:?}", s),
            Slot::Object(props) => f.debug_set().entries(props.keys()).finish(),
            Slot::Function(_) => write!(f, "[function]"),
        }
    }
}

/// What a mock script sees while it is being evaluated
pub struct ScriptScope<'a> {
    pub runtime: &'a mut MockRuntime,
    define: &'a mut dyn FnMut(Definition<MockFactory>),
}

impl ScriptScope<'_> {
    /// `define(deps, factory)`
    pub fn define<D>(&mut self, deps: &[&str], factory: D)
    where
        D: Fn(&mut MockRuntime, &[MockValue]) -> RuntimeResult<()> + 'static,
    {
        let factory: MockFactory = Rc::new(factory);
        (self.define)(Definition::anonymous(deps.iter().copied(), factory));
    }

    /// `define(name, deps, factory)`
    pub fn define_named<D>(&mut self, name: &str, deps: &[&str], factory: D)
    where
        D: Fn(&mut MockRuntime, &[MockValue]) -> RuntimeResult<()> + 'static,
    {
        let factory: MockFactory = Rc::new(factory);
        (self.define)(Definition::named(name, deps.iter().copied(), factory));
    }

    /// Assign a global, like a non-AMD script would
    pub fn set_global(&mut self, name: &str, value: MockValue) {
        self.runtime.set_global_value(name, value);
    }

    pub fn global(&self, name: &str) -> Option<MockValue> {
        self.runtime.global(name)
    }
}

/// Mock `ScriptRuntime` driven by registered closures
pub struct MockRuntime {
    scripts: HashMap<PathBuf, MockScript>,
    globals: MockValue,
    loaded: Vec<PathBuf>,
    evaluated: Vec<String>,
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRuntime {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            globals: MockValue::object(),
            loaded: Vec::new(),
            evaluated: Vec::new(),
        }
    }

    /// Register the behaviour of the file at `path`. Files without a
    /// registered script evaluate to nothing and never call `define`.
    pub fn with_script<S>(mut self, path: impl Into<PathBuf>, script: S) -> Self
    where
        S: Fn(&mut ScriptScope<'_>) -> RuntimeResult<()> + 'static,
    {
        self.scripts.insert(path.into(), Rc::new(script));
        self
    }

    pub fn set_global_value(&mut self, name: &str, value: MockValue) {
        self.globals.set(name, value);
    }

    /// Files evaluated so far, in order
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Text passed to `evaluate`, in order
    pub fn evaluated(&self) -> &[String] {
        &self.evaluated
    }
}

impl ScriptRuntime for MockRuntime {
    type Value = MockValue;
    type Factory = MockFactory;

    fn evaluate(&mut self, source: &str) -> RuntimeResult<MockValue> {
        self.evaluated.push(source.to_string());
        Ok(MockValue::undefined())
    }

    fn load_file(
        &mut self,
        path: &Path,
        _source: &str,
        define: &mut dyn FnMut(Definition<MockFactory>),
    ) -> RuntimeResult<()> {
        self.loaded.push(path.to_path_buf());
        let Some(script) = self.scripts.get(path).cloned() else {
            return Ok(());
        };
        let mut scope = ScriptScope {
            runtime: self,
            define,
        };
        script(&mut scope)
    }

    fn invoke(&mut self, factory: &MockFactory, args: &[MockValue]) -> RuntimeResult<()> {
        factory(self, args)
    }

    fn new_object(&mut self) -> MockValue {
        MockValue::object()
    }

    fn string(&mut self, text: &str) -> MockValue {
        MockValue::string(text)
    }

    fn boolean(&mut self, value: bool) -> MockValue {
        MockValue::boolean(value)
    }

    fn as_string(&self, value: &MockValue) -> Option<String> {
        value.as_string()
    }

    fn get_property(&self, target: &MockValue, key: &str) -> Option<MockValue> {
        target.get(key)
    }

    fn set_property(&mut self, target: &MockValue, key: &str, value: MockValue) -> RuntimeResult<()> {
        if target.set(key, value) {
            Ok(())
        } else {
            Err(RuntimeError::new(format!(
                "TypeError: cannot set property '{}' on {:?}",
                key, target
            )))
        }
    }

    fn call_method(
        &mut self,
        target: &MockValue,
        method: &str,
        args: &[MockValue],
    ) -> RuntimeResult<MockValue> {
        let function = target
            .get(method)
            .and_then(|v| v.as_function())
            .ok_or_else(|| RuntimeError::new(format!("TypeError: {} is not a function", method)))?;
        function(self, args)
    }

    fn global_object(&self) -> MockValue {
        self.globals.clone()
    }

    fn global(&self, name: &str) -> Option<MockValue> {
        self.globals.get(name)
    }

    fn set_global(&mut self, name: &str, value: MockValue) {
        self.set_global_value(name, value);
    }

    fn remove_global(&mut self, name: &str) {
        if let Slot::Object(props) = &mut *self.globals.0.borrow_mut() {
            props.remove(name);
        }
    }
}
