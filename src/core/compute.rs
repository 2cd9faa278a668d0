//! Compute Module Host
//!
//! Fetches a precompiled WebAssembly module, instantiates it with wasmtime
//! and invokes its exports with primitive numeric arguments. The host offers
//! one import, `imports.imported_func(i32)`, which logs its argument.
//!
//! A compiled [`ComputeModule`] can be instantiated any number of times; each
//! [`ComputeInstance`] owns its own store.

use lazy_static::lazy_static;
use std::fmt;
use tracing::{debug, info};
use wasmtime::{Caller, Engine, Instance, Linker, Module, Store, Val, ValType};

use super::asset_protocol::AssetResolver;
use crate::models::config::ExportCall;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::WasmValue;
use crate::utils::constants::{HOST_IMPORT_LOG, HOST_IMPORT_MODULE, USER_AGENT};

lazy_static! {
    /// Process-wide engine; modules compiled on it can be shared freely.
    static ref ENGINE: Engine = Engine::default();
}

// ============================================
// MODULE SOURCE
// ============================================

/// Where module bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    /// Path relative to the app root, fetched through the asset resolver
    Path(String),
    /// Remote http(s) URL
    Url(String),
}

impl ModuleSource {
    pub fn parse(spec: &str) -> Self {
        if spec.starts_with("http://") || spec.starts_with("https://") {
            ModuleSource::Url(spec.to_string())
        } else {
            ModuleSource::Path(spec.to_string())
        }
    }
}

impl fmt::Display for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSource::Path(p) => write!(f, "{}", p),
            ModuleSource::Url(u) => write!(f, "{}", u),
        }
    }
}

// ============================================
// MODULE
// ============================================

/// Host-side state visible to imports
#[derive(Debug, Default)]
pub struct HostState {
    /// Arguments passed to `imported_func`, in call order
    pub logged: Vec<i32>,
}

/// A compiled compute module
#[derive(Clone)]
pub struct ComputeModule {
    name: String,
    module: Module,
}

impl ComputeModule {
    /// Fetch and compile a module
    pub async fn fetch(source: &ModuleSource, resolver: &AssetResolver) -> AppResult<Self> {
        info!("📦 Fetching compute module {}", source);

        let bytes = match source {
            ModuleSource::Path(path) => {
                let request = format!("/{}", path.trim_start_matches('/'));
                resolver
                    .resolve_async(&request)
                    .await
                    .map_err(|e| {
                        AppError::new(
                            ErrorCode::ComputeFetchFailed,
                            format!("Cannot fetch {}: {}", path, e),
                        )
                    })?
                    .data
            }
            ModuleSource::Url(url) => {
                let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
                client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?
                    .to_vec()
            }
        };

        Self::from_bytes(source.to_string(), &bytes)
    }

    /// Compile module bytes (binary or text format)
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> AppResult<Self> {
        let name = name.into();
        let module = Module::new(&ENGINE, bytes).map_err(|e| {
            AppError::new(
                ErrorCode::ComputeCompileFailed,
                format!("Cannot compile {}: {:#}", name, e),
            )
        })?;
        debug!(module = %name, exports = ?Self::list_exports(&module), "Compute module compiled");
        Ok(Self { name, module })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of exported functions
    pub fn exports(&self) -> Vec<String> {
        Self::list_exports(&self.module)
    }

    fn list_exports(module: &Module) -> Vec<String> {
        module
            .exports()
            .filter(|export| export.ty().func().is_some())
            .map(|export| export.name().to_string())
            .collect()
    }

    /// Create a fresh instance with its own store
    pub fn instantiate(&self) -> AppResult<ComputeInstance> {
        let mut store = Store::new(&ENGINE, HostState::default());
        let mut linker: Linker<HostState> = Linker::new(&ENGINE);

        linker
            .func_wrap(
                HOST_IMPORT_MODULE,
                HOST_IMPORT_LOG,
                |mut caller: Caller<'_, HostState>, arg: i32| {
                    info!("📝 {}", arg);
                    caller.data_mut().logged.push(arg);
                },
            )
            .map_err(|e| {
                AppError::new(
                    ErrorCode::ComputeInstantiateFailed,
                    format!("Cannot define host import: {:#}", e),
                )
            })?;

        let instance = linker.instantiate(&mut store, &self.module).map_err(|e| {
            AppError::new(
                ErrorCode::ComputeInstantiateFailed,
                format!("Cannot instantiate {}: {:#}", self.name, e),
            )
        })?;

        info!("✅ Compute module {} instantiated", self.name);
        Ok(ComputeInstance {
            name: self.name.clone(),
            store,
            instance,
        })
    }
}

// ============================================
// INSTANCE
// ============================================

/// A live instance of a compute module
pub struct ComputeInstance {
    name: String,
    store: Store<HostState>,
    instance: Instance,
}

impl ComputeInstance {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments the module passed to `imported_func`
    pub fn host_log(&self) -> &[i32] {
        &self.store.data().logged
    }

    /// Invoke an export. Returns its first result, if any.
    pub fn call(&mut self, export: &str, args: &[WasmValue]) -> AppResult<Option<WasmValue>> {
        let func = self
            .instance
            .get_func(&mut self.store, export)
            .ok_or_else(|| AppError::export_not_found(export))?;

        let func_ty = func.ty(&self.store);
        let params: Vec<ValType> = func_ty.params().collect();
        if params.len() != args.len() {
            return Err(AppError::argument_mismatch(format!(
                "{} takes {} argument(s), got {}",
                export,
                params.len(),
                args.len()
            )));
        }

        let params = params
            .iter()
            .zip(args)
            .map(|(ty, arg)| to_val(ty, arg))
            .collect::<AppResult<Vec<Val>>>()?;
        let mut results = vec![Val::I32(0); func_ty.results().len()];

        func.call(&mut self.store, &params, &mut results)
            .map_err(|e| {
                AppError::new(
                    ErrorCode::ComputeCallFailed,
                    format!("{} trapped: {:#}", export, e),
                )
            })?;

        let value = results.first().map(from_val).transpose()?;
        match value {
            Some(v) => info!("{}: {}", export, v),
            None => info!("{}: no value", export),
        }
        Ok(value)
    }

    /// Invoke a configured call
    pub fn invoke(&mut self, call: &ExportCall) -> AppResult<Option<WasmValue>> {
        self.call(&call.export, &call.args)
    }
}

fn to_val(ty: &ValType, arg: &WasmValue) -> AppResult<Val> {
    let val = match (ty, *arg) {
        (ValType::I32, WasmValue::I32(v)) => Val::I32(v),
        (ValType::I32, WasmValue::I64(v)) => i32::try_from(v).map(Val::I32).map_err(|_| {
            AppError::argument_mismatch(format!("{} does not fit in i32", v))
        })?,
        (ValType::I64, WasmValue::I32(v)) => Val::I64(v as i64),
        (ValType::I64, WasmValue::I64(v)) => Val::I64(v),
        (ValType::F32, v) => Val::F32((v.as_f64() as f32).to_bits()),
        (ValType::F64, v) => Val::F64(v.as_f64().to_bits()),
        (ty, v) => {
            return Err(AppError::argument_mismatch(format!(
                "Cannot pass {} {} as {:?}",
                v.type_name(),
                v,
                ty
            )));
        }
    };
    Ok(val)
}

fn from_val(val: &Val) -> AppResult<WasmValue> {
    match val {
        Val::I32(v) => Ok(WasmValue::I32(*v)),
        Val::I64(v) => Ok(WasmValue::I64(*v)),
        Val::F32(bits) => Ok(WasmValue::F32(f32::from_bits(*bits))),
        Val::F64(bits) => Ok(WasmValue::F64(f64::from_bits(*bits))),
        _ => Err(AppError::argument_mismatch("Export returned a non-numeric value")),
    }
}
