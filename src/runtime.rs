//! Generated-code contract with the runtime library.
//!
//! Every string the pipeline injects into user modules is built here, so the
//! exact shapes the runtime consumes (`wrap(factory, name)`,
//! `expose(component, name)`, `register(component, name)`, and the factory
//! default export `() => PlatformWorkerHandle`) live in one place.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::identifier::WorkerKind;

/// Import specifier of the runtime library consumed by generated code.
pub const RUNTIME_SPECIFIER: &str = "react-worker-components-plugin/rwc";

pub fn wrap_import() -> String {
    format!("import {{ wrap }} from '{}';\n", RUNTIME_SPECIFIER)
}

pub fn expose_import() -> String {
    format!("import {{ expose }} from '{}';\n", RUNTIME_SPECIFIER)
}

pub fn register_import() -> String {
    format!("import {{ register }} from '{}';\n", RUNTIME_SPECIFIER)
}

/// Factory module pointing a platform worker at a url. The url is either a
/// dev url (serve) or a deferred asset placeholder (build).
pub fn worker_factory_module(kind: WorkerKind, url: &str) -> String {
    format!(
        "export default function WorkerWrapper() {{\n  return new {}({}, {{ type: \"module\" }});\n}}\n",
        kind.constructor(),
        js_string(url),
    )
}

/// Factory module embedding the bundled worker as a base64 blob, for targets
/// where a separate network-addressable asset is undesirable. Falls back to a
/// data uri when Blob construction is unavailable.
pub fn inline_worker_factory_module(kind: WorkerKind, code: &[u8]) -> String {
    let encoded = STANDARD.encode(code);
    format!(
        r#"const encodedJs = "{encoded}";
const blob = typeof window !== "undefined" && window.Blob && new Blob([atob(encodedJs)], {{ type: "text/javascript;charset=utf-8" }});
export default function WorkerWrapper() {{
  const objURL = blob && (window.URL || window.webkitURL).createObjectURL(blob);
  try {{
    return objURL ? new {ctor}(objURL) : new {ctor}("data:application/javascript;base64," + encodedJs, {{ type: "module" }});
  }} finally {{
    objURL && (window.URL || window.webkitURL).revokeObjectURL(objURL);
  }}
}}
"#,
        encoded = encoded,
        ctor = kind.constructor(),
    )
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_module_shape() {
        let code = worker_factory_module(WorkerKind::Dedicated, "/src/Hello.worker.tsx?react_worker_component");
        assert!(code.contains("export default function WorkerWrapper()"));
        assert!(code.contains("new Worker(\"/src/Hello.worker.tsx?react_worker_component\", { type: \"module\" })"));
    }

    #[test]
    fn test_shared_worker_constructor() {
        let code = worker_factory_module(WorkerKind::Shared, "/w.js");
        assert!(code.contains("new SharedWorker("));
    }

    #[test]
    fn test_inline_factory_embeds_base64() {
        let code = inline_worker_factory_module(WorkerKind::Dedicated, b"console.log(1)");
        assert!(code.contains(&STANDARD.encode(b"console.log(1)")));
        assert!(code.contains("createObjectURL"));
        assert!(code.contains("revokeObjectURL"));
    }

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
    }
}
