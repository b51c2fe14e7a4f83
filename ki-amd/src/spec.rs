//! Dependency token parsing
//!
//! Grammar: `("text!")? ("./")? <name>`.
//!
//! - `text!foo` names a raw text resource instead of a module
//! - a leading `./` is stripped and carries no meaning
//! - `exports` is the self-exports placeholder and never names a file

use std::fmt;
use std::hash::{Hash, Hasher};

const TEXT_PREFIX: &str = "text!";
const RELATIVE_PREFIX: &str = "./";
const EXPORTS: &str = "exports";

/// What a dependency token refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecKind {
    /// A module file, `<name>.js`
    Module(String),
    /// A raw text resource
    Text(String),
    /// The current module's own exports container
    Exports,
}

/// A parsed dependency token.
///
/// Equality and hashing ignore the raw token, so `./foo` and `foo` are
/// interchangeable.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    raw: String,
    kind: SpecKind,
}

impl ModuleSpec {
    /// Parse a dependency token. Total: every string yields a spec.
    pub fn parse(token: &str) -> Self {
        let (is_text, rest) = match token.strip_prefix(TEXT_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, token),
        };
        let name = rest.strip_prefix(RELATIVE_PREFIX).unwrap_or(rest);

        let kind = if name == EXPORTS {
            SpecKind::Exports
        } else if is_text {
            SpecKind::Text(name.to_string())
        } else {
            SpecKind::Module(name.to_string())
        };

        Self {
            raw: token.to_string(),
            kind,
        }
    }

    /// Spec for a bare module name, as if written without prefixes
    pub fn module(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            raw: name.clone(),
            kind: SpecKind::Module(name),
        }
    }

    /// The token as written in the `define` call
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &SpecKind {
        &self.kind
    }

    /// Module or resource name; `exports` for the placeholder
    pub fn name(&self) -> &str {
        match &self.kind {
            SpecKind::Module(name) | SpecKind::Text(name) => name,
            SpecKind::Exports => EXPORTS,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, SpecKind::Text(_))
    }

    pub fn is_exports(&self) -> bool {
        matches!(self.kind, SpecKind::Exports)
    }

    /// Module name if this token names a loadable module file
    pub fn module_name(&self) -> Option<&str> {
        match &self.kind {
            SpecKind::Module(name) => Some(name),
            _ => None,
        }
    }
}

impl PartialEq for ModuleSpec {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for ModuleSpec {}

impl Hash for ModuleSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

impl fmt::Display for ModuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SpecKind::Module(name) => write!(f, "{}", name),
            SpecKind::Text(name) => write!(f, "text!{}", name),
            SpecKind::Exports => write!(f, "{}", EXPORTS),
        }
    }
}

impl From<&str> for ModuleSpec {
    fn from(token: &str) -> Self {
        ModuleSpec::parse(token)
    }
}
