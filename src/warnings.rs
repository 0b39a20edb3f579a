//! Warning policy for recursive worker sub-bundles.
//!
//! Known-benign diagnostics are swallowed, unresolved imports are escalated to
//! fatal errors, everything else is forwarded to the host's warning sink (or
//! logged to stderr when the host did not install one).

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PluginError, ERR_UNRESOLVED_IMPORT};

const WARNING_IGNORE_LIST: [&str; 2] = ["CIRCULAR_DEPENDENCY", "THIS_IS_UNDEFINED"];
const DYNAMIC_IMPORT_WARNING_IGNORE_LIST: [&str; 2] =
    ["Unsupported expression", "statically analyzed"];
const DYNAMIC_IMPORT_PLUGIN: &str = "dynamic-import-variables";

lazy_static! {
    static ref COMMONJS_EXTERNAL_RE: Regex = Regex::new(r"\?commonjs-external$").unwrap();
}

/// A diagnostic surfaced by the external bundler during a sub-bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleWarning {
    pub code: Option<String>,
    pub plugin: Option<String>,
    pub message: String,
    /// Offending specifier, for unresolved imports.
    pub source: Option<String>,
    pub importer: Option<String>,
}

impl BundleWarning {
    pub fn with_code(code: &str, message: &str) -> Self {
        BundleWarning {
            code: Some(code.to_string()),
            plugin: None,
            message: message.to_string(),
            source: None,
            importer: None,
        }
    }
}

/// Filter one sub-bundle warning. Returns Err for unresolved imports (which
/// abort the outer build), swallows the ignore lists, and hands the rest to
/// `warn`.
pub fn handle_bundle_warning(
    warning: &BundleWarning,
    warn: &mut dyn FnMut(&BundleWarning),
) -> Result<(), PluginError> {
    if warning.code.as_deref() == Some("UNRESOLVED_IMPORT") {
        let importer = warning.importer.as_deref().unwrap_or("");
        // commonjs externals resolve at runtime; everything else is broken.
        if !COMMONJS_EXTERNAL_RE.is_match(importer) {
            let specifier = warning.source.as_deref().unwrap_or("<unknown>");
            return Err(PluginError::new(
                ERR_UNRESOLVED_IMPORT,
                &format!(
                    "failed to resolve import \"{}\" from \"{}\"; add it to the build's external list if this is intended",
                    specifier, importer
                ),
                importer,
            ));
        }
        return Ok(());
    }

    if warning
        .plugin
        .as_deref()
        .is_some_and(|p| p.contains(DYNAMIC_IMPORT_PLUGIN))
        && DYNAMIC_IMPORT_WARNING_IGNORE_LIST
            .iter()
            .any(|msg| warning.message.contains(msg))
    {
        return Ok(());
    }

    if let Some(code) = warning.code.as_deref() {
        if WARNING_IGNORE_LIST.contains(&code) {
            return Ok(());
        }
    }

    warn(warning);
    Ok(())
}

/// Default warning sink: tagged stderr.
pub fn log_warning(warning: &BundleWarning) {
    match warning.plugin.as_deref() {
        Some(plugin) => eprintln!("[rwc] [plugin:{}] {}", plugin, warning.message),
        None => eprintln!("[rwc] warning: {}", warning.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(warning: &BundleWarning) -> (Result<(), PluginError>, Vec<String>) {
        let mut seen = Vec::new();
        let result = handle_bundle_warning(warning, &mut |w| seen.push(w.message.clone()));
        (result, seen)
    }

    #[test]
    fn test_ignore_list_is_suppressed() {
        let (result, seen) = collect(&BundleWarning::with_code(
            "CIRCULAR_DEPENDENCY",
            "circular dependency: a -> b -> a",
        ));
        assert!(result.is_ok());
        assert!(seen.is_empty());
    }

    #[test]
    fn test_unknown_warning_is_forwarded() {
        let (result, seen) = collect(&BundleWarning::with_code("EVAL", "eval is harmful"));
        assert!(result.is_ok());
        assert_eq!(seen, vec!["eval is harmful".to_string()]);
    }

    #[test]
    fn test_unresolved_import_is_fatal() {
        let mut warning = BundleWarning::with_code("UNRESOLVED_IMPORT", "could not resolve");
        warning.source = Some("missing-pkg".to_string());
        warning.importer = Some("/src/Hello.worker.tsx".to_string());
        let (result, seen) = collect(&warning);
        let err = result.unwrap_err();
        assert_eq!(err.code, ERR_UNRESOLVED_IMPORT);
        assert!(err.message.contains("missing-pkg"));
        assert!(err.message.contains("/src/Hello.worker.tsx"));
        assert!(seen.is_empty());
    }

    #[test]
    fn test_unresolved_commonjs_external_is_allowed() {
        let mut warning = BundleWarning::with_code("UNRESOLVED_IMPORT", "could not resolve");
        warning.importer = Some("lodash?commonjs-external".to_string());
        let (result, seen) = collect(&warning);
        assert!(result.is_ok());
        assert!(seen.is_empty());
    }

    #[test]
    fn test_dynamic_import_analyzer_noise_is_suppressed() {
        let mut warning = BundleWarning {
            code: None,
            plugin: Some("rollup-plugin-dynamic-import-variables".to_string()),
            message: "Unsupported expression in dynamic import".to_string(),
            source: None,
            importer: None,
        };
        let (result, seen) = collect(&warning);
        assert!(result.is_ok());
        assert!(seen.is_empty());
        warning.message = "something else entirely".to_string();
        let (_, seen) = collect(&warning);
        assert_eq!(seen.len(), 1);
    }
}
