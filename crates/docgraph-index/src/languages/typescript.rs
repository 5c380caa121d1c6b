//! TypeScript/JavaScript language extractor using tree-sitter-typescript.

use crate::extractor::{children, file_extension, node_line, node_text, parse_source, unquote};
use crate::extractor::SymbolExtractor;
use docgraph_core::{DocgraphError, ExportFact, ExportKind, FileFacts, ImportFact};
use tree_sitter::Node;

/// TypeScript/JavaScript extractor.
///
/// `.ts`, `.mts` and `.cts` files use the plain TypeScript grammar so that
/// angle-bracket casts and generic arrows parse; everything else uses the TSX
/// grammar, which is a superset of JavaScript with JSX.
pub struct TypeScriptExtractor;

impl TypeScriptExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TypeScriptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolExtractor for TypeScriptExtractor {
    fn language_name(&self) -> &str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&str] {
        &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"]
    }

    fn extract(&self, text: &str, path: &str) -> Result<FileFacts, DocgraphError> {
        let language: tree_sitter::Language = match file_extension(path) {
            Some("ts" | "mts" | "cts") => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            _ => tree_sitter_typescript::LANGUAGE_TSX.into(),
        };
        let tree = parse_source(&language, text, path)?;
        let source = text.as_bytes();
        let root = tree.root_node();

        let mut facts = FileFacts::default();
        for node in children(root) {
            match node.kind() {
                "import_statement" => {
                    if let Some(import) = extract_import(node, source, path) {
                        facts.imports.push(import);
                    }
                }
                "export_statement" => extract_export(node, source, path, &mut facts),
                _ => {}
            }
        }
        extract_dynamic_imports(root, source, path, &mut facts.imports);

        Ok(facts)
    }
}

// ── Imports ─────────────────────────────────────────────────────────────────

/// Extract one `import` statement.
///
/// Default, namespace and named shapes are unified into a single name list:
/// `default` for the default binding, `*` for a namespace binding, and the
/// exported name (not the local alias) for each named specifier.
/// `import x = require('y')` binds the whole module and carries no names.
fn extract_import(node: Node, source: &[u8], path: &str) -> Option<ImportFact> {
    let source_node = match node.child_by_field_name("source") {
        Some(found) => found,
        None => children(node)
            .into_iter()
            .find(|c| c.kind() == "import_require_clause")
            .and_then(require_clause_source)?,
    };
    let specifier = unquote(&node_text(source_node, source));

    let mut names = Vec::new();
    let mut statement_type_only = false;
    let mut named_total = 0usize;
    let mut named_type_only = 0usize;
    let mut has_value_binding = false;

    for child in children(node) {
        match child.kind() {
            "type" => statement_type_only = true,
            "import_clause" => {
                for part in children(child) {
                    match part.kind() {
                        "identifier" => {
                            names.push("default".to_string());
                            has_value_binding = true;
                        }
                        "namespace_import" => {
                            names.push("*".to_string());
                            has_value_binding = true;
                        }
                        "named_imports" => {
                            for spec in children(part) {
                                if spec.kind() != "import_specifier" {
                                    continue;
                                }
                                let Some(name) = spec.child_by_field_name("name") else {
                                    continue;
                                };
                                named_total += 1;
                                if children(spec).iter().any(|c| c.kind() == "type") {
                                    named_type_only += 1;
                                }
                                names.push(unquote(&node_text(name, source)));
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let type_only = statement_type_only
        || (!has_value_binding && named_total > 0 && named_type_only == named_total);

    Some(ImportFact {
        file: path.to_string(),
        specifier,
        names,
        type_only,
        line: node_line(node),
    })
}

fn require_clause_source(clause: Node) -> Option<Node> {
    clause
        .child_by_field_name("source")
        .or_else(|| children(clause).into_iter().find(|c| c.kind() == "string"))
}

/// Collect CommonJS `require('x')` calls and dynamic `import('x')` anywhere in the file.
fn extract_dynamic_imports(node: Node, source: &[u8], path: &str, imports: &mut Vec<ImportFact>) {
    if node.kind() == "call_expression" {
        if let Some(import) = extract_call_import(node, source, path) {
            imports.push(import);
        }
    }
    for child in children(node) {
        extract_dynamic_imports(child, source, path, imports);
    }
}

fn extract_call_import(node: Node, source: &[u8], path: &str) -> Option<ImportFact> {
    let function = node.child_by_field_name("function")?;
    let is_loader = match function.kind() {
        "import" => true,
        "identifier" => node_text(function, source) == "require",
        _ => false,
    };
    if !is_loader {
        return None;
    }

    let arguments = node.child_by_field_name("arguments")?;
    let first = children(arguments)
        .into_iter()
        .find(|c| c.is_named() && c.kind() != "comment")?;
    if first.kind() != "string" {
        return None;
    }

    // `const { a, b } = require('x')` binds named members.
    let mut names = Vec::new();
    if let Some(parent) = node.parent() {
        if parent.kind() == "variable_declarator" {
            if let Some(pattern) = parent.child_by_field_name("name") {
                if pattern.kind() == "object_pattern" {
                    collect_pattern_names(pattern, source, &mut names);
                }
            }
        }
    }

    Some(ImportFact {
        file: path.to_string(),
        specifier: unquote(&node_text(first, source)),
        names,
        type_only: false,
        line: node_line(node),
    })
}

// ── Exports ─────────────────────────────────────────────────────────────────

fn extract_export(node: Node, source: &[u8], path: &str, facts: &mut FileFacts) {
    let parts = children(node);
    let is_default = parts.iter().any(|c| c.kind() == "default");
    let type_only = parts.iter().any(|c| c.kind() == "type");

    // Re-exports (`export { a } from './x'`, `export * from './x'`) are imports too.
    if let Some(source_node) = node.child_by_field_name("source") {
        let mut names = Vec::new();
        for part in &parts {
            match part.kind() {
                "export_clause" => {
                    for spec in children(*part) {
                        if let Some(name) = spec.child_by_field_name("name") {
                            names.push(unquote(&node_text(name, source)));
                        }
                    }
                }
                "*" | "namespace_export" => names.push("*".to_string()),
                _ => {}
            }
        }
        facts.imports.push(ImportFact {
            file: path.to_string(),
            specifier: unquote(&node_text(source_node, source)),
            names,
            type_only,
            line: node_line(node),
        });
    }

    if let Some(declaration) = node.child_by_field_name("declaration") {
        extract_declaration_exports(declaration, source, path, is_default, &mut facts.exports);
        return;
    }

    if let Some(value) = node.child_by_field_name("value") {
        let (name, kind) = match value.kind() {
            "identifier" => (node_text(value, source), ExportKind::Value),
            "function_expression" | "function" | "arrow_function" | "generator_function" => {
                let name = value
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source))
                    .unwrap_or_else(|| "default".to_string());
                (name, ExportKind::Function)
            }
            "class" => {
                let name = value
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source))
                    .unwrap_or_else(|| "default".to_string());
                (name, ExportKind::Class)
            }
            _ => ("default".to_string(), ExportKind::Value),
        };
        facts.exports.push(ExportFact {
            file: path.to_string(),
            name,
            kind,
            is_default: true,
            line: node_line(node),
        });
        return;
    }

    for part in parts {
        match part.kind() {
            "export_clause" => {
                for spec in children(part) {
                    if spec.kind() != "export_specifier" {
                        continue;
                    }
                    let Some(name) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let exported = spec
                        .child_by_field_name("alias")
                        .map(|alias| unquote(&node_text(alias, source)))
                        .unwrap_or_else(|| unquote(&node_text(name, source)));
                    let spec_type_only =
                        type_only || children(spec).iter().any(|c| c.kind() == "type");
                    facts.exports.push(ExportFact {
                        file: path.to_string(),
                        is_default: exported == "default",
                        name: exported,
                        kind: if spec_type_only {
                            ExportKind::Type
                        } else {
                            ExportKind::Value
                        },
                        line: node_line(spec),
                    });
                }
            }
            "namespace_export" => {
                if let Some(alias) = children(part).into_iter().rev().find(|c| c.is_named()) {
                    facts.exports.push(ExportFact {
                        file: path.to_string(),
                        name: unquote(&node_text(alias, source)),
                        kind: ExportKind::Value,
                        is_default: false,
                        line: node_line(part),
                    });
                }
            }
            _ => {}
        }
    }
}

/// Exports introduced by `export <declaration>`.
fn extract_declaration_exports(
    node: Node,
    source: &[u8],
    path: &str,
    is_default: bool,
    exports: &mut Vec<ExportFact>,
) {
    let kind = match node.kind() {
        "function_declaration" | "generator_function_declaration" | "function_signature" => {
            ExportKind::Function
        }
        "class_declaration" | "abstract_class_declaration" => ExportKind::Class,
        "interface_declaration" | "type_alias_declaration" | "enum_declaration" => ExportKind::Type,
        "module" | "internal_module" => ExportKind::Value,
        "lexical_declaration" | "variable_declaration" => {
            for declarator in children(node) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let Some(pattern) = declarator.child_by_field_name("name") else {
                    continue;
                };
                let kind = match declarator.child_by_field_name("value").map(|v| v.kind()) {
                    Some("arrow_function" | "function_expression" | "function") => {
                        ExportKind::Function
                    }
                    Some("class") => ExportKind::Class,
                    _ => ExportKind::Value,
                };
                let mut names = Vec::new();
                collect_pattern_names(pattern, source, &mut names);
                for name in names {
                    exports.push(ExportFact {
                        file: path.to_string(),
                        name,
                        kind,
                        is_default,
                        line: node_line(declarator),
                    });
                }
            }
            return;
        }
        "ambient_declaration" => {
            // `export declare ...`: the real declaration is a child.
            for child in children(node) {
                if child.is_named() {
                    extract_declaration_exports(child, source, path, is_default, exports);
                }
            }
            return;
        }
        _ => return,
    };

    let name = node
        .child_by_field_name("name")
        .map(|n| unquote(&node_text(n, source)))
        .unwrap_or_else(|| "default".to_string());

    exports.push(ExportFact {
        file: path.to_string(),
        name,
        kind,
        is_default,
        line: node_line(node),
    });
}

/// Binding names in an identifier or destructuring pattern.
fn collect_pattern_names(node: Node, source: &[u8], names: &mut Vec<String>) {
    match node.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            names.push(node_text(node, source));
        }
        // `{ key: local }`: only the local binding is a name.
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                collect_pattern_names(value, source, names);
            }
        }
        _ => {
            for child in children(node) {
                collect_pattern_names(child, source, names);
            }
        }
    }
}
