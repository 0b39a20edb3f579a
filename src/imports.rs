//! Import-site rewriting.
//!
//! A statement like `import { Hello, Hey as Hey1 } from './Hello.worker'` is
//! removed atomically and replaced with wrapped-proxy bindings that defer
//! worker construction to the runtime:
//!
//! ```js
//! import { wrap } from 'react-worker-components-plugin/rwc';
//! import __RWC_WORKER_0 from './Hello.worker';
//! const create__RWC_WORKER_0 = () => new __RWC_WORKER_0();
//! const Hello = wrap(create__RWC_WORKER_0, 'Hello');
//! const Hey1 = wrap(create__RWC_WORKER_0, 'Hey');
//! ```
//!
//! The synthetic factory names carry a strictly increasing per-module index,
//! so several worker imports in one module never collide. Statements that
//! reference the same specifier twice each get their own factory; sharing the
//! underlying worker, if desired, is the runtime `wrap`'s decision.

use crate::magic::MagicString;
use crate::module_lexer::{lex_module, ImportRecord};
use crate::runtime::wrap_import;
use crate::transform::TransformOutput;

const WORKER_SPECIFIER_MARKER: &str = ".worker";

fn imports_worker_component<'a>(imports: &'a [ImportRecord]) -> Vec<&'a ImportRecord> {
    imports
        .iter()
        .filter(|i| i.specifier.contains(WORKER_SPECIFIER_MARKER))
        .collect()
}

pub fn rewrite_worker_imports(source: &str, id: &str) -> Option<TransformOutput> {
    let record = lex_module(source, id);
    let worker_imports = imports_worker_component(&record.imports);
    if worker_imports.is_empty() {
        return None;
    }

    let mut s = MagicString::new(source);
    let mut blocks = Vec::with_capacity(worker_imports.len());
    for (index, import) in worker_imports.iter().enumerate() {
        s.remove(import.statement_start, import.statement_end);

        let worker_name = format!("__RWC_WORKER_{}", index);
        let creator_name = format!("create__RWC_WORKER_{}", index);
        let mut block = String::new();
        block.push_str(&format!(
            "import {} from '{}';\n",
            worker_name, import.specifier
        ));
        block.push_str(&format!(
            "const {} = () => new {}();\n",
            creator_name, worker_name
        ));
        for binding in &import.bindings {
            block.push_str(&format!(
                "const {} = wrap({}, '{}');\n",
                binding.local, creator_name, binding.imported
            ));
        }
        blocks.push(block);
    }

    // One runtime import per module, then the factory blocks in statement
    // order. Rendering is prepend-to-front, so push in reverse.
    for block in blocks.iter().rev() {
        s.prepend(block);
    }
    s.prepend(&wrap_import());

    Some(TransformOutput {
        code: s.to_code(),
        map: Some(s.generate_map(id)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_named_bindings() {
        let src = "import { Hello, Hey as Hey1 } from './Hello.worker';\nexport const App = () => null;\n";
        let out = rewrite_worker_imports(src, "/project/src/App.tsx").unwrap();

        assert!(out.code.starts_with("import { wrap } from 'react-worker-components-plugin/rwc';"));
        assert!(out.code.contains("import __RWC_WORKER_0 from './Hello.worker';"));
        assert!(out.code.contains("const create__RWC_WORKER_0 = () => new __RWC_WORKER_0();"));
        assert!(out.code.contains("const Hello = wrap(create__RWC_WORKER_0, 'Hello');"));
        assert!(out.code.contains("const Hey1 = wrap(create__RWC_WORKER_0, 'Hey');"));
        // Original statement removed atomically.
        assert!(!out.code.contains("import { Hello, Hey as Hey1 }"));
        // Untouched statements survive.
        assert!(out.code.contains("export const App = () => null;"));
    }

    #[test]
    fn test_exactly_two_wrap_bindings_for_two_imports() {
        let src = "import { a, b as c } from './math.worker';\n";
        let out = rewrite_worker_imports(src, "/project/src/use.ts").unwrap();
        assert_eq!(out.code.matches("= wrap(").count(), 2);
        assert!(out.code.contains("const a = wrap(create__RWC_WORKER_0, 'a');"));
        assert!(out.code.contains("const c = wrap(create__RWC_WORKER_0, 'b');"));
    }

    #[test]
    fn test_multiple_worker_imports_get_increasing_indices() {
        let src = "import { Hello } from './Hello.worker';\nimport { World } from './World.worker';\n";
        let out = rewrite_worker_imports(src, "/project/src/App.tsx").unwrap();
        assert!(out.code.contains("import __RWC_WORKER_0 from './Hello.worker';"));
        assert!(out.code.contains("import __RWC_WORKER_1 from './World.worker';"));
        assert!(out.code.contains("wrap(create__RWC_WORKER_0, 'Hello')"));
        assert!(out.code.contains("wrap(create__RWC_WORKER_1, 'World')"));
        // The runtime import appears once.
        assert_eq!(out.code.matches("import { wrap }").count(), 1);
    }

    #[test]
    fn test_duplicate_specifiers_each_get_a_factory() {
        let src = "import { Hello } from './Hello.worker';\nimport { Hey } from './Hello.worker';\n";
        let out = rewrite_worker_imports(src, "/project/src/App.tsx").unwrap();
        assert!(out.code.contains("__RWC_WORKER_0"));
        assert!(out.code.contains("__RWC_WORKER_1"));
    }

    #[test]
    fn test_non_worker_imports_untouched() {
        let src = "import React from 'react';\nimport { useState } from 'react';\n";
        assert!(rewrite_worker_imports(src, "/project/src/App.tsx").is_none());
    }

    #[test]
    fn test_factory_blocks_in_statement_order() {
        let src = "import { A } from './A.worker';\nimport { B } from './B.worker';\n";
        let out = rewrite_worker_imports(src, "/project/src/App.tsx").unwrap();
        let a = out.code.find("__RWC_WORKER_0").unwrap();
        let b = out.code.find("__RWC_WORKER_1").unwrap();
        assert!(a < b);
    }
}
