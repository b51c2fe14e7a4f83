//! 测试辅助工具
//!
//! Builds resolvers over an in-memory resource tree and a mock runtime whose
//! factories append to a shared call log.

#![allow(dead_code)]

use ki_amd::testing::{MockRuntime, MockValue};
use ki_amd::{DependencyResolver, ResourceReader};
use ki_vfs::MemoryFileSystem;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

pub const ROOT: &str = "/res";

/// Order in which factories ran
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Path of a module file under the test root
pub fn module_path(name: &str) -> String {
    format!("{}/{}.js", ROOT, name)
}

/// Register a module `name` with `deps` whose factory records its name in
/// `log` and stores `name` under the `id` key of its exports, when it
/// asked for them.
pub fn logged_module(runtime: MockRuntime, name: &str, deps: &[&str], log: &CallLog) -> MockRuntime {
    let module = name.to_string();
    let deps: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
    let log = Rc::clone(log);
    runtime.with_script(module_path(name), move |scope| {
        let module = module.clone();
        let log = Rc::clone(&log);
        let dep_refs: Vec<&str> = deps.iter().map(String::as_str).collect();
        let exports_index = deps.iter().position(|d| d == "exports");
        scope.define(&dep_refs, move |_rt, args| {
            log.borrow_mut().push(module.clone());
            if let Some(i) = exports_index {
                args[i].set("id", MockValue::string(module.clone()));
            }
            Ok(())
        });
        Ok(())
    })
}

/// Resolver over `files` (path, content) rooted at `/res`
pub fn resolver(files: &[(String, String)], runtime: MockRuntime) -> DependencyResolver<MockRuntime> {
    let fs = MemoryFileSystem::with_files(files.iter().map(|(p, c)| (p.as_str(), c.as_bytes())));
    DependencyResolver::new(runtime, ResourceReader::with_root(Arc::new(fs), ROOT))
}

/// Placeholder file entries for the given module names
pub fn module_files(names: &[&str]) -> Vec<(String, String)> {
    names
        .iter()
        .map(|n| (module_path(n), format!("/* {} */", n)))
        .collect()
}
