//! 编译编排测试
//!
//! Macro cache behaviour, error surfacing and source maps.

mod common;

use common::*;
use ki_compiler::{
    render, CacheStats, CompileError, CompileOptions, CompileOrchestrator, MacroDigest, SourceMapLayout,
    StaticScope,
};
use ki_vfs::{MemoryFileSystem, VirtualFileSystem};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn deps_fs() -> MemoryFileSystem {
    MemoryFileSystem::with_files([
        ("/deps/swap.sjs", "macro swap { rule { ($a, $b) } => { $b, $a } }"),
        ("/deps/unless.sjs", "// helpers\nmacro unless { rule { $c } => { if (!$c) } }"),
    ])
}

fn both_deps() -> CompileOptions {
    CompileOptions::default().with_dependencies(["/deps/swap.sjs", "/deps/unless.sjs"])
}

#[test]
fn test_same_inputs_expand_once() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);

    let first = orch.compile("x = 1", &both_deps()).unwrap();
    let second = orch.compile("x = 1", &both_deps()).unwrap();

    assert_eq!(first, second);
    assert_eq!(orch.compiler().expansions, 1);
    assert_eq!(orch.cache().len(), 1);
    assert_eq!(orch.cache_stats(), CacheStats { hits: 1, misses: 1 });
}

#[test]
fn test_one_char_dependency_change_expands_again() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);
    orch.compile("x = 1", &both_deps()).unwrap();

    fs.write_file(
        Path::new("/deps/swap.sjs"),
        b"macro swap { rule { ($a, $b) } => { $b,$a } }",
    )
    .unwrap();
    orch.compile("x = 1", &both_deps()).unwrap();

    assert_eq!(orch.compiler().expansions, 2);
    assert_eq!(orch.cache().len(), 2);
}

#[test]
fn test_different_sources_share_macro_parse() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);

    let a = orch.compile("alpha()", &both_deps()).unwrap();
    let b = orch.compile("beta()", &both_deps()).unwrap();

    assert_ne!(a.code, b.code);
    assert_eq!(orch.compiler().expansions, 1);
    let requests = &orch.compiler().requests;
    assert_eq!(requests[0].modules, requests[1].modules);
}

#[test]
fn test_non_macro_changes_do_not_invalidate() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);
    orch.compile("x", &both_deps()).unwrap();

    fs.write_file(
        Path::new("/deps/unless.sjs"),
        b"// helpers, reworded\nmacro unless { rule { $c } => { if (!$c) } }",
    )
    .unwrap();
    orch.compile("x", &both_deps()).unwrap();

    // the key is the normalized definitions, not the raw files
    assert_eq!(orch.compiler().expansions, 1);
}

#[test]
fn test_dependencies_joined_in_order_into_preamble() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);
    orch.compile("x", &both_deps()).unwrap();

    let expected = format!(
        "// core\n{}\n{}\n// end",
        "macro swap { rule { ($a, $b) } => { $b, $a } }",
        "macro unless { rule { $c } => { if (!$c) } }"
    );
    assert_eq!(orch.compiler().expanded, vec![expected]);
}

#[test]
fn test_without_dependencies_source_is_macro_source() {
    let fs = MemoryFileSystem::new();
    let mut orch = orchestrator(&fs);
    let source = "macro inc { rule { $x } => { $x + 1 } }\ny = inc 1";

    orch.compile(source, &CompileOptions::default()).unwrap();

    let digest = MacroDigest::digest("macro inc { rule { $x } => { $x + 1 } }");
    assert!(orch.cache().contains(&digest));
    assert_eq!(orch.compiler().requests[0].source, source);
}

#[test]
fn test_preamble_without_placeholder_appends() {
    let fs = MemoryFileSystem::new();
    let mut orch = CompileOrchestrator::new(FakeCompiler::with_core("// core only"), Arc::new(fs));

    orch.compile("macro m { rule {} => {} }", &CompileOptions::default())
        .unwrap();

    assert_eq!(
        orch.compiler().expanded,
        vec!["// core only\nmacro m { rule {} => {} }".to_string()]
    );
}

#[test]
fn test_missing_dependency_is_resource_not_found() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);
    let options = CompileOptions::default().with_dependencies(["/deps/swap.sjs", "/deps/gone.sjs"]);

    let err = orch.compile("x", &options).unwrap_err();

    assert_eq!(
        err,
        CompileError::ResourceNotFound {
            path: PathBuf::from("/deps/gone.sjs")
        }
    );
    assert_eq!(orch.compiler().expansions, 0);
    assert!(orch.compiler().requests.is_empty());
}

#[test]
fn test_macro_error_surfaces_verbatim() {
    let fs = MemoryFileSystem::with_files([("/deps/bad.sjs", "macro @@bad-macro")]);
    let mut orch = orchestrator(&fs);
    let options = CompileOptions::default().with_dependencies(["/deps/bad.sjs"]);

    let err = orch.compile("x", &options).unwrap_err();
    assert_eq!(
        err,
        CompileError::MacroExpansion("Line 1: unexpected token @@".to_string())
    );
    assert!(orch.cache().is_empty());
}

#[test]
fn test_compile_error_surfaces_verbatim_and_keeps_cache() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);

    let err = orch.compile("@@bad-source", &both_deps()).unwrap_err();
    assert_eq!(
        err,
        CompileError::Compile("Line 2: unexpected identifier".to_string())
    );
    assert_eq!(err.phase(), "compiler");

    orch.compile("ok", &both_deps()).unwrap();
    assert_eq!(orch.compiler().expansions, 1);
}

#[test]
fn test_source_map_written_for_asset_under_source_root() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);
    let options = both_deps().with_pathname(asset("app/models/user.js.ki"));

    let output = orch.compile("user = 1", &options).unwrap();

    let request = &orch.compiler().requests[0];
    assert!(request.source_map);
    assert_eq!(request.filename.as_deref(), Some("/source_maps/app/models/user.js.ki"));
    assert_eq!(request.mapfile.as_deref(), Some("/source_maps/app/models/user.map"));

    let map = output.source_map.unwrap();
    let map_path = Path::new("/site/public/assets/source_maps/app/models/user.map");
    let source_path = Path::new("/site/public/assets/source_maps/app/models/user.js.ki");
    assert_eq!(fs.read_to_string(map_path).unwrap(), map);
    assert_eq!(fs.read_to_string(source_path).unwrap(), "user = 1");
}

#[test]
fn test_asset_outside_source_root_gets_no_source_map() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);
    let options = both_deps().with_pathname("/vendor/lib.ki");

    let output = orch.compile("lib = 1", &options).unwrap();

    assert!(output.source_map.is_none());
    let request = &orch.compiler().requests[0];
    assert!(!request.source_map);
    assert!(request.filename.is_none());
    assert_eq!(fs.file_count(), 2);
}

#[test]
fn test_no_layout_means_no_source_map() {
    let fs = deps_fs();
    let mut orch = CompileOrchestrator::new(FakeCompiler::new(), Arc::new(fs.clone()));
    let options = both_deps().with_pathname(asset("main.ki"));

    let output = orch.compile("main()", &options).unwrap();
    assert!(output.source_map.is_none());
    assert_eq!(fs.file_count(), 2);
}

#[test]
fn test_source_map_write_failure_does_not_fail_compile() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs.read_only());
    let options = both_deps().with_pathname(asset("main.ki"));

    let output = orch.compile("main()", &options).unwrap();

    assert_eq!(output.code, "/* modules#1 */ MAIN()");
    assert!(output.source_map.is_some());
    assert!(!fs.exists(Path::new("/site/public/assets/source_maps/main.map")));
}

#[test]
fn test_render_appends_newline_and_uses_scope() {
    let fs = deps_fs();
    let mut orch = orchestrator(&fs);
    let scope = StaticScope {
        pathname: Some(PathBuf::from(asset("views/list.ki"))),
        dependencies: vec![PathBuf::from("/deps/swap.sjs")],
    };

    let out = render(&mut orch, "list()", &scope).unwrap();

    assert_eq!(out, "/* modules#1 */ LIST()\n");
    assert!(fs.exists(Path::new("/site/public/assets/source_maps/views/list.map")));
}

#[test]
fn test_render_propagates_errors() {
    let fs = MemoryFileSystem::new();
    let mut orch = orchestrator(&fs);
    let scope = StaticScope {
        pathname: None,
        dependencies: vec![PathBuf::from("/deps/none.sjs")],
    };

    let err = render(&mut orch, "x", &scope).unwrap_err();
    assert!(matches!(err, CompileError::ResourceNotFound { .. }));
}

#[test]
fn test_native_file_system_round_trip() {
    use ki_vfs::NativeFileSystem;

    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("deps")).unwrap();
    std::fs::write(dir.path().join("deps/swap.sjs"), "macro swap {}").unwrap();

    let fs = NativeFileSystem::with_base(dir.path());
    let mut orch = CompileOrchestrator::new(FakeCompiler::new(), Arc::new(fs))
        .with_layout(SourceMapLayout::new("public", "src"));
    let options = CompileOptions::default()
        .with_dependencies(["deps/swap.sjs"])
        .with_pathname("src/pages/home.ki");

    let output = orch.compile("home()", &options).unwrap();

    let written = std::fs::read_to_string(dir.path().join("public/source_maps/pages/home.map")).unwrap();
    assert_eq!(Some(written), output.source_map);
    let original = std::fs::read_to_string(dir.path().join("public/source_maps/pages/home.js.ki")).unwrap();
    assert_eq!(original, "home()");
}
