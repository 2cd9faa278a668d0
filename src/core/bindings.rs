//! Click bindings: UI element id -> compute export call

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::asset_protocol::AssetResolver;
use super::compute::{ComputeInstance, ComputeModule, ModuleSource};
use crate::models::config::{ClickBinding, ExportCall, ShellConfig};
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::WasmValue;

/// Result of dispatching one click
#[derive(Debug, Clone, PartialEq)]
pub struct ClickOutcome {
    pub element_id: String,
    pub export: String,
    pub result: Option<WasmValue>,
}

/// Owns the compute instance that bound clicks run against.
///
/// Shared between the webview IPC handler and the HTTP click endpoint, so the
/// instance sits behind a mutex.
pub struct ClickBindings {
    instance: Mutex<ComputeInstance>,
    bindings: HashMap<String, ExportCall>,
}

impl ClickBindings {
    pub fn new(instance: ComputeInstance, bindings: Vec<ClickBinding>) -> Self {
        let bindings = bindings
            .into_iter()
            .map(|b| (b.element_id, b.call))
            .collect();
        Self {
            instance: Mutex::new(instance),
            bindings,
        }
    }

    /// Fetch the configured module, run the startup calls once and bind
    /// clicks. `Ok(None)` when no module is configured.
    pub async fn load(config: &ShellConfig, resolver: &AssetResolver) -> AppResult<Option<Self>> {
        let Some(spec) = config.compute_module.as_deref() else {
            debug!("No compute module configured");
            return Ok(None);
        };

        let module = ComputeModule::fetch(&ModuleSource::parse(spec), resolver).await?;
        debug!(module = module.name(), exports = ?module.exports(), "Binding compute module");
        let mut instance = module.instantiate()?;

        for call in &config.startup_calls {
            // A failing startup call doesn't take the bindings down with it.
            if let Err(e) = instance.invoke(call) {
                warn!("⚠️ Startup call {} failed: {}", call.export, e);
            }
        }

        let bindings = Self::new(instance, config.bindings.clone());
        info!("🔗 {} click bindings ready", bindings.bindings.len());
        Ok(Some(bindings))
    }

    pub fn is_bound(&self, element_id: &str) -> bool {
        self.bindings.contains_key(element_id)
    }

    pub fn element_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Run the call bound to `element_id`. Unbound elements yield `Ok(None)`.
    pub fn dispatch(&self, element_id: &str) -> AppResult<Option<ClickOutcome>> {
        let Some(call) = self.bindings.get(element_id) else {
            debug!("Click on unbound element {}", element_id);
            return Ok(None);
        };

        let mut instance = self.instance.lock().map_err(|_| {
            AppError::new(
                ErrorCode::ComputeCallFailed,
                "Compute instance poisoned by an earlier panic",
            )
        })?;
        info!("🖱️ {} -> {}::{}", element_id, instance.name(), call.export);
        let result = instance.invoke(call)?;

        Ok(Some(ClickOutcome {
            element_id: element_id.to_string(),
            export: call.export.clone(),
            result,
        }))
    }

    /// Run one-off calls against the bound instance (startup hooks)
    pub fn invoke(&self, call: &ExportCall) -> AppResult<Option<WasmValue>> {
        let mut instance = self.instance.lock().map_err(|_| {
            AppError::new(
                ErrorCode::ComputeCallFailed,
                "Compute instance poisoned by an earlier panic",
            )
        })?;
        instance.invoke(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute::ComputeModule;

    fn bindings(spec: &str) -> ClickBindings {
        let bytes = wat::parse_str(
            r#"(module
                 (func (export "square") (param i32) (result i32)
                   local.get 0
                   local.get 0
                   i32.mul)
                 (func (export "tada")))"#,
        )
        .unwrap();
        let instance = ComputeModule::from_bytes("test", &bytes)
            .unwrap()
            .instantiate()
            .unwrap();
        ClickBindings::new(instance, ClickBinding::parse_list(spec).unwrap())
    }

    #[test]
    fn test_dispatch_bound_click() {
        let b = bindings("ok_button=square:3,but=tada");
        let outcome = b.dispatch("ok_button").unwrap().unwrap();
        assert_eq!(outcome.export, "square");
        assert_eq!(outcome.result, Some(WasmValue::I32(9)));

        let tada = b.dispatch("but").unwrap().unwrap();
        assert_eq!(tada.result, None);
    }

    #[test]
    fn test_unbound_click_is_ignored() {
        let b = bindings("ok_button=square:3");
        assert!(b.dispatch("cancel_button").unwrap().is_none());
        assert!(!b.is_bound("cancel_button"));
    }

    #[test]
    fn test_binding_to_missing_export_errors() {
        let b = bindings("x=cube:2");
        let err = b.dispatch("x").unwrap_err();
        assert_eq!(err.code, ErrorCode::ComputeExportNotFound);
    }

    #[tokio::test]
    async fn test_load_runs_startup_calls() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("wasm")).unwrap();
        let bytes = wat::parse_str(
            r#"(module
                 (import "imports" "imported_func" (func $log (param i32)))
                 (func (export "hello_world") (param i32) (result i32)
                   local.get 0
                   call $log
                   local.get 0
                   i32.const 1
                   i32.add)
                 (func (export "tada")))"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("wasm/deno.wasm"), bytes).unwrap();

        let config = ShellConfig {
            compute_module: Some("wasm/deno.wasm".into()),
            startup_calls: ExportCall::parse_list("hello_world:1011;missing").unwrap(),
            bindings: ClickBinding::parse_list("but=tada").unwrap(),
            ..ShellConfig::default()
        };
        let resolver = AssetResolver::new(dir.path(), "app");

        let b = ClickBindings::load(&config, &resolver).await.unwrap().unwrap();

        assert_eq!(b.instance.lock().unwrap().host_log(), &[1011]);
        assert!(b.is_bound("but"));
    }

    #[tokio::test]
    async fn test_load_without_module() {
        let config = ShellConfig {
            compute_module: None,
            ..ShellConfig::default()
        };
        let resolver = AssetResolver::new("ui", "app");
        assert!(ClickBindings::load(&config, &resolver).await.unwrap().is_none());
    }

    #[test]
    fn test_element_ids_sorted() {
        let b = bindings("ok_button=square:3,but=tada");
        assert_eq!(b.element_ids(), vec!["but", "ok_button"]);
    }
}
