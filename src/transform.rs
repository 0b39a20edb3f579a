//! Pipeline dispatcher.
//!
//! Each module visit runs exactly one stage. The identifier is parsed into a
//! `WorkerRequest` once and matched exhaustively; modules no stage recognizes
//! pass through unchanged (a no-op result, never an error).

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use crate::asset_cache::BuildContext;
use crate::error::PluginError;
use crate::identifier::WorkerRequest;
use crate::imports::rewrite_worker_imports;
use crate::registrar::register_components;
use crate::warnings::{log_warning, BundleWarning};
use crate::worker_entry::{resolve_worker_entry, EntryBundler, Stage, StageSet};
use crate::worker_file::expose_worker_exports;

/// Rewritten source plus its source map. `None` from the pipeline means the
/// module was left untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub code: String,
    pub map: Option<serde_json::Value>,
}

/// Transform one module. Safe to call concurrently for distinct identifiers;
/// the only shared state is the context's asset bookkeeping, which the
/// context synchronizes internally.
pub fn transform_module(
    source: &str,
    id: &str,
    ctx: &BuildContext,
    stages: StageSet,
    bundler: Option<&dyn EntryBundler>,
    warn: Option<&mut dyn FnMut(&BundleWarning)>,
) -> Result<Option<TransformOutput>, PluginError> {
    let mut default_warn = log_warning;
    let warn: &mut dyn FnMut(&BundleWarning) = match warn {
        Some(warn) => warn,
        None => &mut default_warn,
    };

    match WorkerRequest::parse(id)? {
        // The worker's own entry, re-requested to expose its exports.
        WorkerRequest::WorkerEntryMarker => {
            if stages.contains(Stage::WorkerFile) {
                Ok(expose_worker_exports(source, id, ctx))
            } else {
                Ok(None)
            }
        }
        WorkerRequest::WorkerSource { kind, inline } => {
            if stages.contains(Stage::WorkerEntry) {
                resolve_worker_entry(id, kind, inline, ctx, bundler, warn).map(Some)
            } else if stages.contains(Stage::WorkerFile) {
                // Inside the recursive sub-bundle the resolver is excluded,
                // so this visit is the worker entry itself: expose it before
                // it gets bundled.
                Ok(expose_worker_exports(source, id, ctx))
            } else {
                Ok(None)
            }
        }
        WorkerRequest::Plain => {
            if stages.contains(Stage::HandleImports) {
                if let Some(output) = rewrite_worker_imports(source, id) {
                    return Ok(Some(output));
                }
            }
            if stages.contains(Stage::RegisterComponents) {
                return Ok(register_components(source, id, &ctx.root));
            }
            Ok(None)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI BRIDGE
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[napi(object)]
pub struct TransformResultNative {
    pub code: String,
    /// JSON-serialized source map.
    pub map: Option<String>,
}

#[cfg(feature = "napi")]
fn to_native(output: Option<TransformOutput>) -> Option<TransformResultNative> {
    output.map(|o| TransformResultNative {
        code: o.code,
        map: o.map.map(|m| m.to_string()),
    })
}

#[cfg(feature = "napi")]
#[napi]
pub fn rewrite_worker_imports_native(source: String, id: String) -> Option<TransformResultNative> {
    to_native(rewrite_worker_imports(&source, &id))
}

#[cfg(feature = "napi")]
#[napi]
pub fn register_components_native(
    source: String,
    id: String,
    root: String,
) -> Option<TransformResultNative> {
    to_native(register_components(&source, &id, &root))
}

#[cfg(feature = "napi")]
#[napi]
pub fn expose_worker_exports_native(
    source: String,
    id: String,
    is_build: bool,
) -> Option<TransformResultNative> {
    use crate::asset_cache::BuildCommand;
    let command = if is_build {
        BuildCommand::Build
    } else {
        BuildCommand::Serve
    };
    let ctx = BuildContext::new(command, "");
    to_native(expose_worker_exports(&source, &id, &ctx))
}

#[cfg(feature = "napi")]
#[napi]
pub fn get_asset_hash_native(content: String) -> String {
    crate::asset_cache::get_asset_hash(content.as_bytes())
}
