// tests/compile_scenarios.rs

use std::error::Error;
use std::fs;
use std::sync::Arc;

use bundlegate::compiler::Compiler;
use bundlegate::exec::{ASSET_HOST_VAR, CONFIG_VAR, RELATIVE_URL_ROOT_VAR, StaticAssetHost};
use bundlegate::store::MemoryDigestStore;
use bundlegate::types::{DigestStorageMode, ProcessStatus};
use bundlegate_test_utils::builders::TempProject;
use bundlegate_test_utils::fake_runner::{FakeRunner, output};
use bundlegate_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn no_process_env() -> bundlegate::exec::EnvLookup {
    Arc::new(|_: &str| None)
}

fn project_with_sources() -> TempProject {
    let project = TempProject::new();
    project.write("app/javascript/a.js", "x");
    project.write("app/javascript/b.js", "y");
    project
}

fn compiler(project: &TempProject, runner: &Arc<FakeRunner>) -> Compiler {
    Compiler::new(project.config())
        .with_runner(runner.clone())
        .with_env_lookup(no_process_env())
}

#[test]
fn builds_once_then_again_after_a_change() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = compiler(&project, &runner);

    assert!(compiler.compile()?);
    assert_eq!(runner.calls(), 1);
    assert!(project.digest_path("test").exists());

    assert!(compiler.compile()?);
    assert_eq!(runner.calls(), 1, "no build expected without changes");

    project.write("app/javascript/a.js", "z");
    assert!(compiler.compile()?);
    assert_eq!(runner.calls(), 2);

    Ok(())
}

#[test]
fn failed_build_returns_false_but_records_digest() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::failing(2));
    let compiler = compiler(&project, &runner);

    assert!(compiler.is_stale()?);
    assert!(!compiler.compile()?);
    assert_eq!(runner.calls(), 1);

    assert!(compiler.is_fresh()?);
    let recorded = project.read("tmp/cache/bundlegate/last-compilation-digest-test");
    assert_eq!(recorded.as_deref(), Some(compiler.current_digest()?.as_str()));

    // The same broken sources are not rebuilt until they change.
    assert!(compiler.compile()?);
    assert_eq!(runner.calls(), 1);

    Ok(())
}

#[test]
fn fixing_a_failed_build_triggers_a_new_build() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(
        FakeRunner::succeeding().then(output(ProcessStatus::Failed(1), "", "SyntaxError")),
    );
    let compiler = compiler(&project, &runner);

    assert!(!compiler.compile()?);
    project.write("app/javascript/a.js", "x // fixed");
    assert!(compiler.compile()?);
    assert_eq!(runner.calls(), 2);

    Ok(())
}

#[test]
fn up_to_date_compile_does_not_rewrite_digest() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = compiler(&project, &runner);

    compiler.compile()?;
    let digest_file = project.digest_path("test");
    let before = fs::metadata(&digest_file)?.modified()?;

    assert!(compiler.compile()?);
    let after = fs::metadata(&digest_file)?.modified()?;
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn invocation_runs_in_root_with_config_path_in_env() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding());
    let config = project
        .config()
        .with_config_path(project.path("config/bundlegate.toml"))
        .with_command(["./bin/webpack", "--progress"])
        .with_env_var("FRONTEND_API_KEY", "secret");
    let compiler = Compiler::new(config)
        .with_runner(runner.clone())
        .with_env_lookup(no_process_env());

    compiler.compile()?;

    let inv = runner.last_invocation().expect("bundler was invoked");
    assert_eq!(inv.cwd, project.root());
    assert_eq!(inv.program, project.root().join("./bin/webpack"));
    assert_eq!(inv.args, vec!["--progress".to_string()]);

    let config_path = project.path("config/bundlegate.toml");
    assert_eq!(
        inv.env.get(CONFIG_VAR).map(String::as_str),
        Some(config_path.to_string_lossy().as_ref())
    );
    assert_eq!(inv.env.get("FRONTEND_API_KEY").map(String::as_str), Some("secret"));
    assert!(!inv.env.contains_key(ASSET_HOST_VAR));

    Ok(())
}

#[test]
fn asset_host_resolver_and_process_env_reach_the_bundler() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding());
    let resolver = StaticAssetHost {
        host: Some("https://cdn.example.com".into()),
        relative_url_root: Some("/shop".into()),
    };
    let compiler = Compiler::new(project.config())
        .with_runner(runner.clone())
        .with_asset_host_resolver(Arc::new(resolver))
        .with_env_lookup(Arc::new(|key: &str| {
            (key == RELATIVE_URL_ROOT_VAR).then(|| "/from-env".to_string())
        }));

    compiler.compile()?;

    let inv = runner.last_invocation().expect("bundler was invoked");
    assert_eq!(inv.env.get(ASSET_HOST_VAR).map(String::as_str), Some("https://cdn.example.com"));
    assert_eq!(inv.env.get(RELATIVE_URL_ROOT_VAR).map(String::as_str), Some("/from-env"));

    Ok(())
}

#[test]
fn environments_keep_separate_digests() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding());

    let test_compiler = compiler(&project, &runner);
    let prod_compiler = Compiler::new(project.config().with_environment("production"))
        .with_runner(runner.clone())
        .with_env_lookup(no_process_env());

    assert!(test_compiler.compile()?);
    assert!(prod_compiler.is_stale()?, "production has never compiled");
    assert!(prod_compiler.compile()?);
    assert_eq!(runner.calls(), 2);

    assert!(project.digest_path("test").exists());
    assert!(project.digest_path("production").exists());
    assert!(test_compiler.is_fresh()?);

    Ok(())
}

#[test]
fn missing_manifest_forces_rebuild() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let manifest = "public/packs/manifest.json";
    project.write(manifest, "{}");

    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = Compiler::new(project.config().with_manifest_path(manifest))
        .with_runner(runner.clone())
        .with_env_lookup(no_process_env());

    assert!(compiler.compile()?);
    assert!(compiler.is_fresh()?);

    project.remove(manifest);
    assert!(compiler.is_stale()?);
    assert!(compiler.compile()?);
    assert_eq!(runner.calls(), 2);

    Ok(())
}

#[test]
fn changes_during_build_are_picked_up_next_time() -> TestResult {
    init_tracing();
    let project = Arc::new(project_with_sources());
    let touched = Arc::clone(&project);
    let runner = Arc::new(FakeRunner::succeeding().on_run(move |_| {
        touched.write("app/javascript/a.js", "edited while building");
    }));
    let compiler = compiler(&project, &runner);

    assert!(compiler.compile()?);
    assert!(compiler.is_stale()?);
    assert!(compiler.compile()?);
    assert_eq!(runner.calls(), 2);

    Ok(())
}

#[test]
fn warnings_on_stderr_do_not_fail_the_build() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding().then(output(
        ProcessStatus::Success,
        "asset application.js 1 KiB",
        "WARNING in ./app/javascript/a.js",
    )));
    let compiler = compiler(&project, &runner);

    assert!(compiler.compile()?);
    assert!(compiler.is_fresh()?);

    Ok(())
}

#[test]
fn memory_storage_never_touches_the_cache_dir() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = Compiler::new(project.config().with_digest_storage(DigestStorageMode::Memory))
        .with_runner(runner.clone())
        .with_env_lookup(no_process_env());

    assert!(compiler.compile()?);
    assert!(compiler.compile()?);
    assert_eq!(runner.calls(), 1);
    assert!(!project.path("tmp/cache").exists());

    Ok(())
}

#[test]
fn injected_store_is_used() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = compiler(&project, &runner).with_store(Box::new(MemoryDigestStore::new()));

    assert_eq!(compiler.last_compilation_digest()?, None);
    compiler.compile()?;
    assert_eq!(compiler.last_compilation_digest()?, Some(compiler.current_digest()?));
    assert!(!project.digest_path("test").exists());

    Ok(())
}

#[test]
fn concurrent_compiles_share_one_build() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = Arc::new(compiler(&project, &runner));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = Arc::clone(&compiler);
            std::thread::spawn(move || c.compile().map_err(|e| e.to_string()))
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().expect("compile thread panicked"), Ok(true));
    }

    assert_eq!(runner.calls(), 1);
    Ok(())
}

#[test]
fn digest_path_that_is_a_directory_is_an_error() -> TestResult {
    init_tracing();
    let project = project_with_sources();
    fs::create_dir_all(project.digest_path("test"))?;

    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = compiler(&project, &runner);

    assert!(compiler.compile().is_err());
    assert!(compiler.is_fresh().is_err());
    assert_eq!(runner.calls(), 0);

    Ok(())
}

#[test]
fn missing_root_is_an_error() -> TestResult {
    init_tracing();
    let project = TempProject::new();
    let runner = Arc::new(FakeRunner::succeeding());
    let compiler = Compiler::new(project.config()).with_runner(runner.clone());
    let gone = Compiler::new(bundlegate::config::CompilerConfig::for_root(project.path("nope")))
        .with_runner(runner.clone());

    assert!(compiler.compile()?, "empty project still compiles");
    assert!(gone.compile().is_err());
    assert_eq!(runner.calls(), 1);

    Ok(())
}
