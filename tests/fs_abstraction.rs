// tests/fs_abstraction.rs

use std::path::Path;
use std::sync::Arc;

use bundlegate::compiler::Compiler;
use bundlegate::config::CompilerConfig;
use bundlegate::fingerprint::compute_file_hash;
use bundlegate::fs::FileSystem;
use bundlegate::fs::mock::MockFileSystem;
use bundlegate_test_utils::fake_runner::FakeRunner;
use bundlegate_test_utils::init_tracing;

fn mock_project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/proj/app/javascript/packs/application.js", b"import './a'");
    fs.add_file("/proj/app/javascript/a.js", b"export default 1");
    fs.add_file("/proj/package.json", b"{}");
    fs.add_file("/proj/node_modules/lib/index.js", b"ignored");
    fs
}

fn mock_compiler(fs: &MockFileSystem, runner: &Arc<FakeRunner>) -> Compiler {
    Compiler::new(CompilerConfig::for_root("/proj").with_environment("test"))
        .with_fs(Arc::new(fs.clone()))
        .with_runner(runner.clone())
        .with_env_lookup(Arc::new(|_: &str| None))
}

#[test]
fn mock_fs_hashing() {
    let fs = MockFileSystem::new();
    fs.add_file("test.txt", b"hello world");

    let hash = compute_file_hash(&fs, Path::new("test.txt")).unwrap();
    // blake3 of "hello world"
    assert_eq!(hash, "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24");
}

#[test]
fn compiler_runs_entirely_on_the_mock() {
    init_tracing();
    let fs = mock_project();
    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = mock_compiler(&fs, &runner);

    let ids: Vec<String> = compiler
        .file_fingerprints()
        .unwrap()
        .into_iter()
        .map(|fp| fp.identifier)
        .collect();
    assert_eq!(
        ids,
        vec!["app/javascript/a.js", "app/javascript/packs/application.js", "package.json"]
    );

    assert!(compiler.compile().unwrap());
    let recorded = fs
        .read_to_string(Path::new(
            "/proj/tmp/cache/bundlegate/last-compilation-digest-test",
        ))
        .unwrap();
    assert_eq!(recorded, compiler.current_digest().unwrap().as_str());

    fs.add_file("/proj/node_modules/lib/index.js", b"still ignored");
    assert!(compiler.is_fresh().unwrap());

    fs.add_file("/proj/yarn.lock", b"# yarn lockfile v1");
    assert!(compiler.is_stale().unwrap());
    assert!(compiler.compile().unwrap());
    assert_eq!(runner.calls(), 2);
}

#[test]
fn unreadable_file_fails_the_check_without_building() {
    init_tracing();
    let fs = mock_project();
    fs.deny_read("/proj/app/javascript/a.js");
    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = mock_compiler(&fs, &runner);

    assert!(compiler.compile().is_err());
    assert!(compiler.current_digest().is_err());
    assert_eq!(runner.calls(), 0);
    assert!(!fs.exists(Path::new(
        "/proj/tmp/cache/bundlegate/last-compilation-digest-test"
    )));
}
