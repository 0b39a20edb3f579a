use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_QUERY_CONFLICT: &str = "WC-ERR-QUERY-001";
pub const ERR_NAME_PLACEHOLDER: &str = "WC-ERR-NAME-001";
pub const ERR_NAME_NON_STRING: &str = "WC-ERR-NAME-002";
pub const ERR_BUNDLE_FAILED: &str = "WC-ERR-BUNDLE-001";
pub const ERR_UNRESOLVED_IMPORT: &str = "WC-ERR-BUNDLE-002";
pub const ERR_ASSET_READ: &str = "WC-ERR-IO-001";

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_QUERY_CONFLICT => {
            "A module identifier carries at most one worker tag: `worker` or `sharedworker`."
        }
        ERR_NAME_PLACEHOLDER => {
            "Asset naming templates only use [name], [hash], [ext] and [extname]."
        }
        ERR_NAME_NON_STRING => "Asset naming functions must return a string file name.",
        ERR_BUNDLE_FAILED => "Every worker entry bundles to a single runnable chunk.",
        ERR_UNRESOLVED_IMPORT => {
            "Imports reachable from a worker entry resolve at build time or are declared external."
        }
        ERR_ASSET_READ => "Asset sources are readable when their url is resolved.",
        _ => "Unknown error.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PLUGIN ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// Structured error surfaced to the host bundler. Configuration and
/// sub-bundle failures are fatal; nothing in the pipeline retries them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginError {
    pub code: String,
    pub error_type: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
}

impl PluginError {
    pub fn new(code: &str, message: &str, file: &str) -> Self {
        PluginError {
            code: code.to_string(),
            error_type: "WORKER_COMPONENTS_ERROR".to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
        }
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "[{}] {}", self.code, self.message)
        } else {
            write!(f, "[{}] {} ({})", self.code, self.message, self.file)
        }
    }
}

impl std::error::Error for PluginError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_carries_guarantee() {
        let err = PluginError::new(ERR_NAME_NON_STRING, "naming fn returned 42", "");
        assert_eq!(err.code, ERR_NAME_NON_STRING);
        assert!(err.guarantee.contains("string"));
    }

    #[test]
    fn test_display_includes_file() {
        let err = PluginError::new(ERR_BUNDLE_FAILED, "bundle failed", "/src/Hello.worker.tsx");
        let text = err.to_string();
        assert!(text.contains("WC-ERR-BUNDLE-001"));
        assert!(text.contains("Hello.worker.tsx"));
    }
}
