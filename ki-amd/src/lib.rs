//! Ki AMD loader
//!
//! Loads a graph of file-backed script modules that follow the AMD
//! `define(name?, deps, factory)` contract:
//! - `spec`: dependency token parsing (`text!`, `./`, `exports`)
//! - `registry`: module records, text resources and instantiation state
//! - `resolver`: fixed-point discovery, then dependency-first instantiation
//! - `runtime`: the seam to the script engine that evaluates module files
//! - `compat`: exports adapters for scripts that only assign a global
//!
//! The script engine is never implemented here; it is consumed through
//! [`ScriptRuntime`].

pub mod compat;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod resources;
pub mod runtime;
pub mod spec;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use compat::CompatTable;
pub use error::{LoaderError, LoaderResult};
pub use registry::{ModuleRecord, ModuleRegistry, ModuleState, TextResource};
pub use resolver::{DependencyResolver, DiscoveryReport};
pub use resources::ResourceReader;
pub use runtime::{Definition, RuntimeError, RuntimeResult, ScriptRuntime};
pub use spec::{ModuleSpec, SpecKind};
