//! Integration tests for the Barracuda shell

use barracuda_shell::{
    core::mime_for_path,
    models::{ExportCall, WasmValue},
    AssetResolver, ComputeModule, ErrorCode, HeadlessHost, LifecycleEvent, LifecycleState,
    ModuleSource, Shell, ShellConfig, WindowSpec,
};
use std::fs;

const PLACEHOLDER_WAT: &str = r#"
(module
  (import "imports" "imported_func" (func $log (param i32)))
  (func (export "square") (param i32) (result i32)
    local.get 0
    local.get 0
    i32.mul)
  (func (export "hello_world") (param i32) (result i32)
    local.get 0
    call $log
    local.get 0
    i32.const 1
    i32.add)
  (func (export "tada")))
"#;

fn app_root() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    fs::write(dir.path().join("data.json"), "{}").unwrap();
    fs::write(dir.path().join("my file.js"), "console.log(1)").unwrap();
    fs::write(dir.path().join("notes.xyz"), "?").unwrap();
    fs::create_dir(dir.path().join("wasm")).unwrap();
    fs::write(
        dir.path().join("wasm/deno.wasm"),
        wat::parse_str(PLACEHOLDER_WAT).unwrap(),
    )
    .unwrap();
    dir
}

// ============================================
// Asset protocol
// ============================================

#[test]
fn test_json_asset_mime() {
    let root = app_root();
    let resolver = AssetResolver::new(root.path(), "app");

    let asset = resolver.resolve("app://localhost/data.json").unwrap();

    assert_eq!(asset.mime_type, "application/json");
    assert_eq!(asset.data, b"{}");
}

#[test]
fn test_unknown_extension_has_empty_mime() {
    let root = app_root();
    let resolver = AssetResolver::new(root.path(), "app");

    let asset = resolver.resolve("app://localhost/notes.xyz").unwrap();

    assert_eq!(asset.mime_type, "");
    assert_eq!(mime_for_path("module.wasm"), "");
}

#[test]
fn test_percent_encoded_path_is_decoded() {
    let root = app_root();
    let resolver = AssetResolver::new(root.path(), "app");

    let asset = resolver.resolve("app://localhost/my%20file.js").unwrap();

    assert_eq!(asset.mime_type, "text/javascript");
    assert!(asset.path.ends_with("my file.js"));
}

#[test]
fn test_windows_webview_form_resolves() {
    let root = app_root();
    let resolver = AssetResolver::new(root.path(), "app");

    let asset = resolver.resolve("http://app.localhost/index.html").unwrap();

    assert_eq!(asset.mime_type, "text/html");
}

#[test]
fn test_traversal_rejected_without_reading() {
    let outer = tempfile::tempdir().unwrap();
    fs::write(outer.path().join("secret.txt"), "top secret").unwrap();
    let root = outer.path().join("ui");
    fs::create_dir(&root).unwrap();
    let resolver = AssetResolver::new(&root, "app");

    let err = resolver.resolve("/%2E%2E/secret.txt").unwrap_err();
    assert_eq!(err.code, ErrorCode::AssetPathRejected);

    // An encoded slash names a file inside the root, not a separator.
    let err = resolver.resolve("app://localhost/..%2Fsecret.txt").unwrap_err();
    assert_eq!(err.code, ErrorCode::AssetNotFound);

    let response = resolver.respond("/../secret.txt");
    assert!(response.data.is_empty());
}

#[test]
fn test_respond_swallows_missing_file() {
    let root = app_root();
    let resolver = AssetResolver::new(root.path(), "app");

    let response = resolver.respond("app://localhost/missing.css");

    assert!(response.data.is_empty());
    assert_eq!(response.mime_type, "text/css");
}

// ============================================
// Shell lifecycle
// ============================================

#[test]
fn test_headless_shell_lifecycle() {
    let root = app_root();
    let config = ShellConfig {
        app_root: root.path().to_path_buf(),
        window: WindowSpec::inspector(),
        quit_on_last_window: true,
        ..ShellConfig::default()
    };
    let mut shell = Shell::new(&config);
    let mut host = HeadlessHost::new("127.0.0.1:8088");

    assert_eq!(shell.state(), LifecycleState::Starting);
    assert_eq!(shell.start(&mut host).unwrap(), LifecycleState::Running);
    assert_eq!(host.window_urls(), vec!["http://127.0.0.1:8088/index.html"]);

    // Activation with a window open does nothing.
    shell.activate(&mut host).unwrap();
    assert_eq!(shell.open_windows(), 1);

    assert_eq!(
        shell.window_closed(1, &mut host).unwrap(),
        LifecycleState::Closing
    );
    assert!(host.is_quit());

    // Closing ignores further quit requests.
    assert_eq!(
        shell
            .dispatch(LifecycleEvent::QuitRequested, &mut host)
            .unwrap(),
        LifecycleState::Closing
    );
}

#[test]
fn test_ready_twice_rejected() {
    let mut shell = Shell::new(&ShellConfig::default());
    let mut host = HeadlessHost::new("127.0.0.1:8088");
    shell.start(&mut host).unwrap();

    let err = shell.dispatch(LifecycleEvent::Ready, &mut host).unwrap_err();

    assert_eq!(err.code, ErrorCode::LifecycleInvalidTransition);
    assert_eq!(shell.state(), LifecycleState::Running);
}

// ============================================
// Compute module
// ============================================

#[tokio::test]
async fn test_square_of_three_is_nine() {
    let root = app_root();
    let resolver = AssetResolver::new(root.path(), "app");

    let module = ComputeModule::fetch(&ModuleSource::parse("wasm/deno.wasm"), &resolver)
        .await
        .unwrap();
    let mut instance = module.instantiate().unwrap();

    let result = instance
        .invoke(&ExportCall::parse("square:3").unwrap())
        .unwrap();

    assert_eq!(result, Some(WasmValue::I32(9)));
}

#[tokio::test]
async fn test_hello_world_calls_host_import() {
    let root = app_root();
    let resolver = AssetResolver::new(root.path(), "app");
    let module = ComputeModule::fetch(&ModuleSource::parse("/wasm/deno.wasm"), &resolver)
        .await
        .unwrap();

    let mut first = module.instantiate().unwrap();
    let mut second = module.instantiate().unwrap();
    first.call("hello_world", &[WasmValue::I32(1011)]).unwrap();

    assert_eq!(first.host_log(), &[1011]);
    assert!(second.host_log().is_empty());
    assert_eq!(second.call("tada", &[]).unwrap(), None);
}

#[tokio::test]
async fn test_fetch_missing_module() {
    let root = app_root();
    let resolver = AssetResolver::new(root.path(), "app");

    let err = ComputeModule::fetch(&ModuleSource::parse("wasm/none.wasm"), &resolver)
        .await
        .err()
        .unwrap();

    assert_eq!(err.code, ErrorCode::ComputeFetchFailed);
}
