//! Worker entry resolution.
//!
//! Turns a worker-component source into a factory module whose default export
//! constructs the platform worker. In serve mode the factory points at the
//! file's dev url with the entry marker appended; in build mode the worker's
//! subgraph is bundled through the host's bundler first, hashed, registered
//! with the asset cache, and referenced through a deferred placeholder token
//! (or embedded as a base64 blob for `?inline` requests).

use crate::asset_cache::{get_asset_hash, posix_join, BuildContext, ASSET_PLACEHOLDER_PREFIX};
use crate::error::{PluginError, ERR_BUNDLE_FAILED};
use crate::identifier::{clean_url, inject_query, WorkerKind, WORKER_FILE_QUERY};
use crate::magic::MagicString;
use crate::runtime::{inline_worker_factory_module, worker_factory_module};
use crate::transform::TransformOutput;
use crate::warnings::{handle_bundle_warning, BundleWarning};
use std::path::Path;

// ═══════════════════════════════════════════════════════════════════════════════
// STAGES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RegisterComponents,
    WorkerEntry,
    WorkerFile,
    HandleImports,
}

impl Stage {
    const ALL: [Stage; 4] = [
        Stage::RegisterComponents,
        Stage::WorkerEntry,
        Stage::WorkerFile,
        Stage::HandleImports,
    ];

    fn bit(self) -> u8 {
        match self {
            Stage::RegisterComponents => 1,
            Stage::WorkerEntry => 1 << 1,
            Stage::WorkerFile => 1 << 2,
            Stage::HandleImports => 1 << 3,
        }
    }
}

/// Statically known set of pipeline stages active for one (sub-)build. The
/// recursion guard for worker bundling is `all().without(Stage::WorkerEntry)`:
/// the excluded stage can never re-enter itself through a nested bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSet(u8);

impl StageSet {
    pub fn all() -> StageSet {
        StageSet(Stage::ALL.iter().fold(0, |acc, s| acc | s.bit()))
    }

    pub fn without(self, stage: Stage) -> StageSet {
        StageSet(self.0 & !stage.bit())
    }

    pub fn contains(self, stage: Stage) -> bool {
        self.0 & stage.bit() != 0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXTERNAL BUNDLER BOUNDARY
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure surfaced by the external bundler for a whole sub-bundle.
#[derive(Debug, Clone)]
pub struct BundleFailure {
    pub message: String,
}

/// Output of a completed sub-bundle: the single generated chunk plus any
/// diagnostics collected along the way.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub code: String,
    pub warnings: Vec<BundleWarning>,
}

/// The host bundler, reinvoked recursively with the worker's file as a
/// synthetic entry point. The call is awaited to completion by the host
/// before the outer transform resolves, and the host is responsible for
/// tearing the sub-bundle down if the outer build is aborted.
pub trait EntryBundler {
    fn bundle(&self, entry: &str, stages: StageSet) -> Result<BundleOutput, BundleFailure>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn resolve_worker_entry(
    id: &str,
    kind: WorkerKind,
    inline: bool,
    ctx: &BuildContext,
    bundler: Option<&dyn EntryBundler>,
    warn: &mut dyn FnMut(&BundleWarning),
) -> Result<TransformOutput, PluginError> {
    let file = clean_url(id);

    let code = if ctx.is_build() {
        let bundler = bundler.ok_or_else(|| {
            PluginError::new(
                ERR_BUNDLE_FAILED,
                "build-mode worker resolution requires an entry bundler",
                &file,
            )
        })?;

        // Bundle the file as an entry so the worker's own imports resolve,
        // with this stage excluded from the nested chain.
        let stages = StageSet::all().without(Stage::WorkerEntry);
        let output = bundler.bundle(&file, stages).map_err(|failure| {
            PluginError::new(
                ERR_BUNDLE_FAILED,
                &format!("failed to bundle worker entry: {}", failure.message),
                &file,
            )
        })?;
        for warning in &output.warnings {
            handle_bundle_warning(warning, warn)?;
        }

        if inline {
            inline_worker_factory_module(kind, output.code.as_bytes())
        } else {
            let content = output.code.as_bytes();
            let content_hash = get_asset_hash(content);
            let basename = Path::new(&file)
                .file_stem()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let file_name = posix_join(
                &ctx.assets_dir,
                &format!("{}.{}.js", basename, content_hash),
            );
            ctx.emit_once(&content_hash, &file_name, content);
            let url = format!("{}{}__", ASSET_PLACEHOLDER_PREFIX, content_hash);
            worker_factory_module(kind, &url)
        }
    } else {
        let url = inject_query(&ctx.file_to_dev_url(&file), WORKER_FILE_QUERY);
        worker_factory_module(kind, &url)
    };

    // The factory module is fully generated; its map points at itself.
    let s = MagicString::new(&code);
    Ok(TransformOutput {
        code,
        map: Some(s.generate_map(id)),
    })
}
