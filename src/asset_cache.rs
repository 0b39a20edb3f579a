//! Content-addressed asset cache.
//!
//! All asset identity is scoped to one `BuildContext` (one dev session or one
//! production build). The context owns the digest and emission bookkeeping
//! behind a single mutex so concurrently transforming modules get an atomic
//! check-and-set for the emit-once guarantee; nothing here is ambient global
//! state.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use crate::error::{PluginError, ERR_ASSET_READ, ERR_NAME_NON_STRING, ERR_NAME_PLACEHOLDER};
use crate::identifier::{clean_url, FS_PREFIX};

/// Prefix of the deferred placeholder token the host bundler rewrites to the
/// final emitted path at the end of the build.
pub const ASSET_PLACEHOLDER_PREFIX: &str = "__WC_ASSET__";

const DEFAULT_ASSETS_INLINE_LIMIT: usize = 4096;

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\[\w+\]").unwrap();
}

/// Short content digest: sha256, hex, truncated to 8 chars. Stable across
/// runs for identical bytes.
pub fn get_asset_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())[..8].to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET NAMING
// ═══════════════════════════════════════════════════════════════════════════════

pub struct AssetNameInput<'a> {
    pub name: &'a str,
    pub content: &'a [u8],
}

/// Output file naming: either a placeholder template or a caller-supplied
/// function. The function variant crosses the host boundary, so its result is
/// an untyped JSON value that must turn out to be a string.
pub enum AssetNaming {
    Pattern(String),
    Custom(Box<dyn Fn(&AssetNameInput) -> Value + Send + Sync>),
}

/// Expand an asset naming template for one file. Unknown placeholders and
/// non-string results from a naming function are fatal configuration errors.
pub fn resolve_file_name(
    naming: &AssetNaming,
    file: &str,
    content_hash: &str,
    content: &[u8],
) -> Result<String, PluginError> {
    let basename = Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let extname = Path::new(&basename)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let ext = extname.strip_prefix('.').unwrap_or("").to_string();
    let name = basename
        .strip_suffix(&extname)
        .unwrap_or(&basename)
        .to_string();

    let pattern = match naming {
        AssetNaming::Pattern(pattern) => pattern.clone(),
        AssetNaming::Custom(naming_fn) => {
            let result = naming_fn(&AssetNameInput {
                name: file,
                content,
            });
            match result {
                Value::String(s) => s,
                other => {
                    return Err(PluginError::new(
                        ERR_NAME_NON_STRING,
                        &format!("asset naming function returned {} instead of a string", other),
                        file,
                    ))
                }
            }
        }
    };

    let mut out = String::with_capacity(pattern.len());
    let mut cursor = 0usize;
    for m in PLACEHOLDER_RE.find_iter(&pattern) {
        out.push_str(&pattern[cursor..m.start()]);
        match m.as_str() {
            "[ext]" => out.push_str(&ext),
            "[extname]" => out.push_str(&extname),
            "[hash]" => out.push_str(content_hash),
            "[name]" => out.push_str(&name),
            placeholder => {
                return Err(PluginError::new(
                    ERR_NAME_PLACEHOLDER,
                    &format!("invalid placeholder {} in asset file names \"{}\"", placeholder, pattern),
                    file,
                ))
            }
        }
        cursor = m.end();
    }
    out.push_str(&pattern[cursor..]);
    Ok(out)
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILD CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildCommand {
    Serve,
    Build,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    pub file_name: String,
    pub source: Vec<u8>,
}

#[derive(Default)]
struct AssetState {
    /// (source identifier) -> resolved url, memoized per context.
    url_cache: HashMap<String, String>,
    /// content hash -> chosen output file name.
    hash_to_filename: HashMap<String, String>,
    /// hashes already registered for physical output.
    emitted: HashSet<String>,
    assets: Vec<EmittedAsset>,
}

/// One dev-server session or one production build. Owns every piece of asset
/// state so concurrent builds in one process never interfere.
pub struct BuildContext {
    pub command: BuildCommand,
    pub root: String,
    /// Public base path, default `/`.
    pub base: String,
    /// Dev server origin, prepended to serve urls when set.
    pub origin: Option<String>,
    pub public_dir: Option<String>,
    pub assets_dir: String,
    pub assets_inline_limit: usize,
    /// Library targets always inline assets.
    pub lib_mode: bool,
    pub sourcemap: bool,
    pub asset_naming: Option<AssetNaming>,
    state: Mutex<AssetState>,
}

impl BuildContext {
    pub fn new(command: BuildCommand, root: &str) -> Self {
        BuildContext {
            command,
            root: root.to_string(),
            base: "/".to_string(),
            origin: None,
            public_dir: None,
            assets_dir: "assets".to_string(),
            assets_inline_limit: DEFAULT_ASSETS_INLINE_LIMIT,
            lib_mode: false,
            sourcemap: false,
            asset_naming: None,
            state: Mutex::new(AssetState::default()),
        }
    }

    pub fn is_build(&self) -> bool {
        self.command == BuildCommand::Build
    }

    /// Register an asset for physical output, at most once per digest per
    /// context. Returns the output file name the digest resolved to, which is
    /// the first registered name when byte-identical content arrives from
    /// several source files.
    pub fn emit_once(&self, content_hash: &str, file_name: &str, source: &[u8]) -> String {
        let mut state = self.state.lock().unwrap();
        let file_name = state
            .hash_to_filename
            .entry(content_hash.to_string())
            .or_insert_with(|| file_name.to_string())
            .clone();
        if state.emitted.insert(content_hash.to_string()) {
            state.assets.push(EmittedAsset {
                file_name: file_name.clone(),
                source: source.to_vec(),
            });
        }
        file_name
    }

    /// Snapshot of everything registered for physical output so far.
    pub fn emitted_assets(&self) -> Vec<EmittedAsset> {
        self.state.lock().unwrap().assets.clone()
    }

    pub fn emitted_count(&self) -> usize {
        self.state.lock().unwrap().assets.len()
    }

    /// Resolve a url to a file under the public/static directory, if any.
    fn check_public_file(&self, url: &str) -> Option<String> {
        let public_dir = self.public_dir.as_deref()?;
        if !url.starts_with('/') {
            return None;
        }
        let candidate = Path::new(public_dir).join(clean_url(url).trim_start_matches('/'));
        if candidate.exists() {
            Some(candidate.to_string_lossy().to_string())
        } else {
            None
        }
    }

    /// Origin-relative dev url for a file: as-is for public files, a short
    /// root-relative path for files under the project root, and the reserved
    /// filesystem-escape prefix for everything else.
    pub fn file_to_dev_url(&self, id: &str) -> String {
        let url = if self.check_public_file(id).is_some() {
            id.to_string()
        } else if id.starts_with(&self.root) {
            format!("/{}", id[self.root.len()..].trim_start_matches('/'))
        } else {
            format!("{}{}", FS_PREFIX, id.trim_start_matches('/'))
        };
        let origin = self.origin.as_deref().unwrap_or("");
        format!("{}{}{}", origin, self.base, url.trim_start_matches('/'))
    }

    /// Build-mode url for a file: an inlined data uri for small non-svg
    /// assets (always, in lib mode), otherwise a deferred placeholder token
    /// backed by an emit-once registration. Memoized per source identifier.
    pub fn file_to_built_url(&self, id: &str) -> Result<String, PluginError> {
        if self.check_public_file(id).is_some() {
            return Ok(format!("{}{}", self.base, id.trim_start_matches('/')));
        }

        if let Some(cached) = self.state.lock().unwrap().url_cache.get(id) {
            return Ok(cached.clone());
        }

        let file = clean_url(id);
        let content = fs::read(&file)
            .map_err(|e| PluginError::new(ERR_ASSET_READ, &format!("failed to read asset: {}", e), &file))?;

        let url = self.built_url_for_content(&file, &content)?;
        self.state
            .lock()
            .unwrap()
            .url_cache
            .insert(id.to_string(), url.clone());
        Ok(url)
    }

    /// The build-mode resolution policy for content already in memory.
    pub fn built_url_for_content(&self, file: &str, content: &[u8]) -> Result<String, PluginError> {
        if self.lib_mode || (!file.ends_with(".svg") && content.len() < self.assets_inline_limit) {
            return Ok(format!(
                "data:{};base64,{}",
                mime_for_path(file),
                STANDARD.encode(content)
            ));
        }

        let content_hash = get_asset_hash(content);
        let file_name = match &self.asset_naming {
            Some(naming) => resolve_file_name(naming, file, &content_hash, content)?,
            None => resolve_file_name(
                &AssetNaming::Pattern(posix_join(&self.assets_dir, "[name].[hash][extname]")),
                file,
                &content_hash,
                content,
            )?,
        };
        self.emit_once(&content_hash, &file_name, content);
        Ok(format!("{}{}__", ASSET_PLACEHOLDER_PREFIX, content_hash))
    }

    /// Serve/build dispatch for the runtime url of a file.
    pub fn file_to_url(&self, id: &str) -> Result<String, PluginError> {
        match self.command {
            BuildCommand::Serve => Ok(self.file_to_dev_url(id)),
            BuildCommand::Build => self.file_to_built_url(id),
        }
    }
}

pub fn posix_join(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), file)
    }
}

fn mime_for_path(file: &str) -> &'static str {
    match Path::new(file).extension().and_then(|e| e.to_str()) {
        Some("js") | Some("mjs") | Some("cjs") => "text/javascript",
        Some("json") => "application/json",
        Some("css") => "text/css",
        Some("html") => "text/html",
        Some("svg") => "image/svg+xml",
        Some("wasm") => "application/wasm",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
