//! Module identifier parsing.
//!
//! The host bundler re-requests the same file under different identifiers as it
//! moves through the pipeline; the query string is the state tag. Tags are
//! added, never removed: `Hello.worker.tsx` is first resolved as a worker
//! source, then re-requested as `Hello.worker.tsx?react_worker_component` to be
//! rewritten into its cross-context exposure form.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{PluginError, ERR_QUERY_CONFLICT};

pub const WORKER_QUERY: &str = "worker";
pub const SHARED_WORKER_QUERY: &str = "sharedworker";
pub const WORKER_FILE_QUERY: &str = "react_worker_component";
pub const INLINE_QUERY: &str = "inline";

/// Reserved dev-server prefix for files outside the project root.
pub const FS_PREFIX: &str = "/@fs/";
/// Side-effect import that bootstraps the worker environment in dev.
pub const ENV_PUBLIC_PATH: &str = "/@vite/env";

lazy_static! {
    static ref QUERY_RE: Regex = Regex::new(r"(?s)\?.*$").unwrap();
    static ref HASH_RE: Regex = Regex::new(r"(?s)#.*$").unwrap();
}

/// Strip the query string and fragment from a module identifier.
pub fn clean_url(url: &str) -> String {
    let no_hash = HASH_RE.replace(url, "");
    QUERY_RE.replace(&no_hash, "").to_string()
}

/// Append a presence-style query tag to an identifier. The injected tag goes
/// first so downstream stages can match on it without re-sorting, and any
/// existing query keys are preserved after it.
pub fn inject_query(url: &str, query: &str) -> String {
    let (without_hash, hash) = match url.find('#') {
        Some(i) => (&url[..i], &url[i..]),
        None => (url, ""),
    };
    match without_hash.find('?') {
        Some(i) => format!(
            "{}?{}&{}{}",
            &without_hash[..i],
            query,
            &without_hash[i + 1..],
            hash
        ),
        None => format!("{}?{}{}", without_hash, query, hash),
    }
}

/// Parse the query portion of an identifier into its presence keys.
/// Returns None when the identifier carries no query at all.
pub fn parse_request_query(id: &str) -> Option<Vec<String>> {
    let without_hash = match id.find('#') {
        Some(i) => &id[..i],
        None => id,
    };
    let search = &without_hash[without_hash.find('?')? + 1..];
    Some(
        search
            .split('&')
            .filter(|part| !part.is_empty())
            .map(|part| match part.find('=') {
                Some(i) => part[..i].to_string(),
                None => part.to_string(),
            })
            .collect(),
    )
}

/// Does this path follow the worker-component file naming convention?
pub fn is_worker_component(id: &str) -> bool {
    clean_url(id).contains(".worker.")
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORKER REQUEST STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    Dedicated,
    Shared,
}

impl WorkerKind {
    /// Constructor name in the generated factory module.
    pub fn constructor(self) -> &'static str {
        match self {
            WorkerKind::Dedicated => "Worker",
            WorkerKind::Shared => "SharedWorker",
        }
    }
}

/// Closed classification of a module identifier, computed once per visit and
/// matched exhaustively by the pipeline dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRequest {
    /// Not a worker request at all.
    Plain,
    /// A worker-component source being resolved into a factory module.
    WorkerSource { kind: WorkerKind, inline: bool },
    /// The worker's own entry, re-requested to expose its exports.
    WorkerEntryMarker,
}

impl WorkerRequest {
    /// Classify an identifier. Both path convention (`*.worker.*`) and the
    /// explicit `worker`/`sharedworker` tags mark a worker source; the
    /// `react_worker_component` tag wins over either since the marker is only
    /// ever added by the resolver itself. Conflicting worker tags are rejected.
    pub fn parse(id: &str) -> Result<WorkerRequest, PluginError> {
        let keys = parse_request_query(id).unwrap_or_default();
        if keys.iter().any(|k| k == WORKER_FILE_QUERY) {
            return Ok(WorkerRequest::WorkerEntryMarker);
        }

        let dedicated = keys.iter().any(|k| k == WORKER_QUERY);
        let shared = keys.iter().any(|k| k == SHARED_WORKER_QUERY);
        if dedicated && shared {
            return Err(PluginError::new(
                ERR_QUERY_CONFLICT,
                "module requested as both `worker` and `sharedworker`",
                &clean_url(id),
            ));
        }

        let inline = keys.iter().any(|k| k == INLINE_QUERY);
        if shared {
            return Ok(WorkerRequest::WorkerSource {
                kind: WorkerKind::Shared,
                inline,
            });
        }
        if dedicated || is_worker_component(id) {
            return Ok(WorkerRequest::WorkerSource {
                kind: WorkerKind::Dedicated,
                inline,
            });
        }

        Ok(WorkerRequest::Plain)
    }
}

/// Component-like export convention: first character is an uppercase ASCII
/// letter, same check React tooling applies to component identifiers.
pub fn is_componentish_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url_strips_query_and_hash() {
        assert_eq!(clean_url("/a/b.worker.tsx?worker#frag"), "/a/b.worker.tsx");
        assert_eq!(clean_url("/a/b.tsx"), "/a/b.tsx");
    }

    #[test]
    fn test_inject_query_plain() {
        assert_eq!(
            inject_query("/a/Hello.worker.tsx", WORKER_FILE_QUERY),
            "/a/Hello.worker.tsx?react_worker_component"
        );
    }

    #[test]
    fn test_inject_query_preserves_existing() {
        assert_eq!(
            inject_query("/a.tsx?v=1#h", "worker"),
            "/a.tsx?worker&v=1#h"
        );
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(WorkerRequest::parse("/src/App.tsx").unwrap(), WorkerRequest::Plain);
    }

    #[test]
    fn test_parse_worker_source_by_convention() {
        assert_eq!(
            WorkerRequest::parse("/src/Hello.worker.tsx").unwrap(),
            WorkerRequest::WorkerSource {
                kind: WorkerKind::Dedicated,
                inline: false
            }
        );
    }

    #[test]
    fn test_parse_worker_source_by_tag() {
        assert_eq!(
            WorkerRequest::parse("/src/heavy.ts?worker").unwrap(),
            WorkerRequest::WorkerSource {
                kind: WorkerKind::Dedicated,
                inline: false
            }
        );
        assert_eq!(
            WorkerRequest::parse("/src/heavy.ts?sharedworker&inline").unwrap(),
            WorkerRequest::WorkerSource {
                kind: WorkerKind::Shared,
                inline: true
            }
        );
    }

    #[test]
    fn test_parse_entry_marker_wins() {
        assert_eq!(
            WorkerRequest::parse("/src/Hello.worker.tsx?react_worker_component").unwrap(),
            WorkerRequest::WorkerEntryMarker
        );
    }

    #[test]
    fn test_parse_rejects_conflicting_tags() {
        let err = WorkerRequest::parse("/src/a.ts?worker&sharedworker").unwrap_err();
        assert_eq!(err.code, crate::error::ERR_QUERY_CONFLICT);
    }

    #[test]
    fn test_componentish_names() {
        assert!(is_componentish_name("Hello"));
        assert!(!is_componentish_name("useThing"));
        assert!(!is_componentish_name("_Private"));
        assert!(!is_componentish_name(""));
    }
}
