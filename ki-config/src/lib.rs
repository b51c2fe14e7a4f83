//! Ki Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Ki crates.
//! Every struct deserializes with defaults, so a partial JSON document is
//! enough to override a single field.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where module and text resources live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory every module and text name is resolved against
    pub resource_root: PathBuf,
    /// Extension appended to module names (text names are used verbatim)
    pub module_extension: String,
}

/// Names and files the compiler bootstrap depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Root module exposing `parseMacros` and `compile`
    pub root_module: String,
    /// Module exposing `loadModule` (the macro expander)
    pub expander_module: String,
    /// Source map support module, loaded with the `window` shim
    pub source_map_module: String,
    /// Text resource holding the core macro preamble
    pub core_macros: String,
    /// Marker inside the preamble that user macros replace
    pub macros_placeholder: String,
}

/// Asset pipeline locations used for source map persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Public assets directory; maps go under `<assets_root>/source_maps`
    pub assets_root: PathBuf,
    /// Directory compiled pathnames are made relative to
    pub source_root: PathBuf,
}

/// Log level, independent of any logging backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name; "silent" maps to errors only
    pub fn parse(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "silent" | "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Log configuration: a global level plus optional per-phase overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub global: LogLevel,
    pub discovery: Option<LogLevel>,
    pub bless: Option<LogLevel>,
    pub cache: Option<LogLevel>,
    pub compiler: Option<LogLevel>,
    pub vfs: Option<LogLevel>,
}

impl LogConfig {
    /// Effective level for a phase
    pub fn level_for(&self, phase: Phase) -> LogLevel {
        let specific = match phase {
            Phase::Discovery => self.discovery,
            Phase::Bless => self.bless,
            Phase::Cache => self.cache,
            Phase::Compiler => self.compiler,
            Phase::Vfs => self.vfs,
        };
        specific.unwrap_or(self.global)
    }
}

/// Execution phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Discovery,
    Bless,
    Cache,
    Compiler,
    Vfs,
}

impl Phase {
    /// All phases, in pipeline order
    pub const ALL: [Phase; 5] = [
        Phase::Vfs,
        Phase::Discovery,
        Phase::Bless,
        Phase::Cache,
        Phase::Compiler,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Bless => "bless",
            Phase::Cache => "cache",
            Phase::Compiler => "compiler",
            Phase::Vfs => "vfs",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("ki::{}", self.as_str())
    }
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KiConfig {
    pub loader: LoaderConfig,
    pub compiler: CompilerConfig,
    pub assets: AssetConfig,
    pub log: LogConfig,
}

impl KiConfig {
    /// Parse a JSON configuration document, filling gaps with defaults
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            resource_root: PathBuf::from("resources"),
            module_extension: ".js".to_string(),
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            root_module: "ki".to_string(),
            expander_module: "sweet".to_string(),
            source_map_module: "source-map".to_string(),
            core_macros: "ki.sjs".to_string(),
            macros_placeholder: "/*__macros__*/".to_string(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("public/assets"),
            source_root: PathBuf::from("app/assets/javascripts"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: LogLevel::Info,
            discovery: None,
            bless: None,
            cache: None,
            compiler: None,
            vfs: None,
        }
    }
}
