//! Import/export extraction.
//!
//! A lightweight pass over the oxc AST that records just enough of a module's
//! surface for the rewrite stages: import statements with their bindings and
//! statement spans, and exports in declaration order. Nothing here mutates the
//! AST; every rewrite is textual and span-based.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPattern, Declaration, ImportDeclarationSpecifier, Statement,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBinding {
    /// Name in the source module's export list.
    pub imported: String,
    /// Name bound locally (`x as y` binds `y`).
    pub local: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub specifier: String,
    pub bindings: Vec<ImportBinding>,
    pub has_default: bool,
    /// Byte span of the whole import statement in the original source.
    pub statement_start: u32,
    pub statement_end: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    pub name: String,
    pub is_default: bool,
}

/// Per-transform view of one module. Built fresh on every visit and dropped
/// when the transform returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub identifier: String,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
}

/// Lex a module's imports and exports. Parse failures yield an empty record:
/// a module the pipeline cannot understand passes through untouched rather
/// than aborting the build.
pub fn lex_module(source: &str, id: &str) -> ModuleRecord {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_typescript(true)
        .with_jsx(true)
        .with_module(true);

    let parser_ret = Parser::new(&allocator, source, source_type).parse();
    if parser_ret.panicked {
        eprintln!("[rwc] failed to lex module {}", id);
        return ModuleRecord {
            identifier: id.to_string(),
            ..ModuleRecord::default()
        };
    }

    let mut record = ModuleRecord {
        identifier: id.to_string(),
        ..ModuleRecord::default()
    };

    for stmt in &parser_ret.program.body {
        match stmt {
            Statement::ImportDeclaration(import_decl) => {
                let mut bindings = Vec::new();
                let mut has_default = false;
                if let Some(specifiers) = &import_decl.specifiers {
                    for specifier in specifiers {
                        match specifier {
                            ImportDeclarationSpecifier::ImportSpecifier(s) => {
                                bindings.push(ImportBinding {
                                    imported: s.imported.name().to_string(),
                                    local: s.local.name.to_string(),
                                });
                            }
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(_) => {
                                has_default = true;
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => {}
                        }
                    }
                }
                record.imports.push(ImportRecord {
                    specifier: import_decl.source.value.to_string(),
                    bindings,
                    has_default,
                    statement_start: import_decl.span.start,
                    statement_end: import_decl.span.end,
                });
            }
            Statement::ExportNamedDeclaration(export_decl) => {
                if let Some(declaration) = &export_decl.declaration {
                    collect_declaration_names(declaration, &mut record.exports);
                }
                for specifier in &export_decl.specifiers {
                    record.exports.push(ExportRecord {
                        name: specifier.exported.name().to_string(),
                        is_default: false,
                    });
                }
            }
            Statement::ExportDefaultDeclaration(_) => {
                record.exports.push(ExportRecord {
                    name: "default".to_string(),
                    is_default: true,
                });
            }
            _ => {}
        }
    }

    record
}

fn collect_declaration_names(declaration: &Declaration, exports: &mut Vec<ExportRecord>) {
    match declaration {
        Declaration::VariableDeclaration(var_decl) => {
            for d in &var_decl.declarations {
                if let BindingPattern::BindingIdentifier(id) = &d.id {
                    exports.push(ExportRecord {
                        name: id.name.to_string(),
                        is_default: false,
                    });
                }
            }
        }
        Declaration::FunctionDeclaration(func_decl) => {
            if let Some(id) = &func_decl.id {
                exports.push(ExportRecord {
                    name: id.name.to_string(),
                    is_default: false,
                });
            }
        }
        Declaration::ClassDeclaration(class_decl) => {
            if let Some(id) = &class_decl.id {
                exports.push(ExportRecord {
                    name: id.name.to_string(),
                    is_default: false,
                });
            }
        }
        _ => {}
    }
}
