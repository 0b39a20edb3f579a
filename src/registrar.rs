//! Component registration stage.
//!
//! Every non-worker module inside the project root gets one `register` call
//! appended per component-like export, so the worker-side proxy lookup can
//! resolve main-thread components by name at runtime. Registration order
//! equals export declaration order; a later module registering the same name
//! overwrites the earlier binding (last-registration-wins).

use crate::identifier::{is_componentish_name, is_worker_component};
use crate::magic::MagicString;
use crate::module_lexer::lex_module;
use crate::runtime::register_import;
use crate::transform::TransformOutput;

pub fn register_components(source: &str, id: &str, root: &str) -> Option<TransformOutput> {
    if is_worker_component(id) {
        return None;
    }
    if !id.contains(root) {
        return None;
    }

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
    s.prepend(&register_import());
    for component in components {
        s.append(&format!("\nregister({}, '{}');", component, component));
    }

    Some(TransformOutput {
        code: s.to_code(),
        map: Some(s.generate_map(id)),
    })
}
