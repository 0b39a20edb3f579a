//! # Worker Components Native Pipeline
//!
//! Build-time transform pipeline that offloads designated UI components to a
//! worker thread while keeping call sites source-compatible:
//!
//! 1. Import sites referencing `*.worker` modules are rewritten into
//!    runtime-wrapped proxy bindings (`wrap(factory, name)`).
//! 2. The worker-side module is rewritten to `expose` its component exports
//!    for cross-context invocation.
//! 3. Ordinary project modules `register` their component exports so
//!    worker-side proxies can resolve them by name.
//! 4. A worker entry resolves to a factory module: a dev url in serve mode,
//!    a bundled, content-addressed asset (or inline blob) in build mode.
//!
//! The host bundler drives the pipeline through `transform_module`, one call
//! per module visit; the same file is re-requested under different query tags
//! as it moves through the stages. Module resolution, code splitting and the
//! worker primitive itself belong to external collaborators.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod asset_cache;
mod error;
mod identifier;
mod imports;
mod magic;
mod module_lexer;
mod registrar;
mod runtime;
mod transform;
mod warnings;
mod worker_entry;
mod worker_file;


pub use asset_cache::{
    get_asset_hash, posix_join, resolve_file_name, AssetNameInput, AssetNaming, BuildCommand,
    BuildContext, EmittedAsset, ASSET_PLACEHOLDER_PREFIX,
};
pub use error::PluginError;
pub use identifier::{
    clean_url, inject_query, is_componentish_name, is_worker_component, WorkerKind, WorkerRequest,
    ENV_PUBLIC_PATH, FS_PREFIX, INLINE_QUERY, SHARED_WORKER_QUERY, WORKER_FILE_QUERY, WORKER_QUERY,
};
pub use imports::rewrite_worker_imports;
pub use magic::MagicString;
pub use module_lexer::{lex_module, ExportRecord, ImportBinding, ImportRecord, ModuleRecord};
pub use registrar::register_components;
pub use runtime::RUNTIME_SPECIFIER;
pub use transform::{transform_module, TransformOutput};
pub use warnings::{handle_bundle_warning, log_warning, BundleWarning};
pub use worker_entry::{
    resolve_worker_entry, BundleFailure, BundleOutput, EntryBundler, Stage, StageSet,
};
pub use worker_file::expose_worker_exports;

#[cfg(feature = "napi")]
pub use transform::{
    expose_worker_exports_native, get_asset_hash_native, register_components_native,
    rewrite_worker_imports_native, TransformResultNative,
};

#[cfg(feature = "napi")]
#[napi]
pub fn worker_components_bridge() -> String {
    "Worker Components Native Bridge Connected".to_string()
}
