//! Worker-side export exposure stage.
//!
//! Runs when a module is being loaded as the worker's own entry: under the
//! `react_worker_component` marker in dev, or inside the recursive sub-bundle
//! in build (where the entry is visited without the resolver stage). Rewrites
//! component exports into cross-context `expose` registrations; this must
//! happen before the worker subgraph is bundled so the calls are part of the
//! bundled output.

use crate::asset_cache::{BuildCommand, BuildContext};
use crate::identifier::{is_componentish_name, ENV_PUBLIC_PATH};
use crate::magic::MagicString;
use crate::module_lexer::lex_module;
use crate::runtime::expose_import;
use crate::transform::TransformOutput;

pub fn expose_worker_exports(source: &str, id: &str, ctx: &BuildContext) -> Option<TransformOutput> {
    let record = lex_module(source, id);
    let components: Vec<&str> = record
        .exports
        .iter()
        .filter(|e| !e.is_default && is_componentish_name(&e.name))
        .map(|e| e.name.as_str())
        .collect();
    if components.is_empty() {
        return None;
    }

    let mut s = MagicString::new(source);
    s.prepend(&expose_import());
    if ctx.command == BuildCommand::Serve {
        // The dev worker boots cold; make sure the environment shim loads
        // before any component code runs.
        s.prepend(&format!("import '{}';\n", ENV_PUBLIC_PATH));
    }
    for component in components {
        s.append(&format!("\nexpose({}, '{}');", component, component));
    }

    Some(TransformOutput {
        code: s.to_code(),
        map: Some(s.generate_map(id)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKER_SRC: &str = "export const Hello = () => null;\nexport const Hey = () => null;\n";

    #[test]
    fn test_exposes_components_in_export_order() {
        let ctx = BuildContext::new(BuildCommand::Serve, "/project");
        let out = expose_worker_exports(
            WORKER_SRC,
            "/project/src/Hello.worker.tsx?react_worker_component",
            &ctx,
        )
        .unwrap();
        assert!(out.code.contains("expose(Hello, 'Hello');"));
        assert!(out.code.contains("expose(Hey, 'Hey');"));
        let hello = out.code.find("expose(Hello").unwrap();
        let hey = out.code.find("expose(Hey").unwrap();
        assert!(hello < hey);
    }

    #[test]
    fn test_serve_prepends_env_bootstrap_first() {
        let ctx = BuildContext::new(BuildCommand::Serve, "/project");
        let out = expose_worker_exports(
            WORKER_SRC,
            "/project/src/Hello.worker.tsx?react_worker_component",
            &ctx,
        )
        .unwrap();
        assert!(out.code.starts_with("import '/@vite/env';\n"));
        assert!(out.code.contains("import { expose } from 'react-worker-components-plugin/rwc';"));
    }

    #[test]
    fn test_build_skips_env_bootstrap() {
        let ctx = BuildContext::new(BuildCommand::Build, "/project");
        let out =
            expose_worker_exports(WORKER_SRC, "/project/src/Hello.worker.tsx", &ctx).unwrap();
        assert!(!out.code.contains(ENV_PUBLIC_PATH));
        assert!(out.code.starts_with("import { expose }"));
    }

    #[test]
    fn test_no_componentish_exports_is_noop() {
        let ctx = BuildContext::new(BuildCommand::Serve, "/project");
        let src = "export const fib = (n) => n;\n";
        assert!(expose_worker_exports(src, "/project/src/math.worker.ts?react_worker_component", &ctx).is_none());
    }
}
