//! Ki Virtual File System
//!
//! Resource and asset access for the loader and compiler, with an in-memory
//! backend for tests and a native backend that can be rooted at a directory.
//!
//! # Usage
//! ```rust
//! use ki_vfs::{MemoryFileSystem, VirtualFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/lib/ki.js"), b"define([], function () {});").unwrap();
//! let content = fs.read_to_string(Path::new("/lib/ki.js")).unwrap();
//! assert!(content.starts_with("define"));
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

