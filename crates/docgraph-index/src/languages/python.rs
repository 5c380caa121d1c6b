//! Python language extractor using tree-sitter-python.

use crate::extractor::{children, node_line, node_text, parse_source, unquote, SymbolExtractor};
use crate::resolver::{normalize_path, parent_dir};
use docgraph_core::{DocgraphError, ExportFact, ExportKind, FileFacts, ImportFact};
use tree_sitter::Node;

/// Python extractor.
///
/// Python has no export statement: every top-level function, class and
/// assignment target is exported unless its name starts with `_`. A
/// top-level `__all__` list of string literals narrows that set.
pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolExtractor for PythonExtractor {
    fn language_name(&self) -> &str {
        "python"
    }

    fn file_extensions(&self) -> &[&str] {
        &["py", "pyi"]
    }

    fn extract(&self, text: &str, path: &str) -> Result<FileFacts, DocgraphError> {
        let tree = parse_source(&tree_sitter_python::LANGUAGE.into(), text, path)?;
        let source = text.as_bytes();
        let root = tree.root_node();

        let mut facts = FileFacts::default();
        extract_imports_recursive(root, source, path, false, &mut facts.imports);

        let mut dunder_all: Option<Vec<String>> = None;
        for node in children(root) {
            extract_top_level(node, source, path, &mut facts.exports, &mut dunder_all);
        }

        if let Some(allowed) = dunder_all {
            facts.exports.retain(|e| allowed.contains(&e.name));
        } else {
            facts.exports.retain(|e| !e.name.starts_with('_'));
        }

        // Re-assignment at top level yields one export per name.
        let mut seen = std::collections::HashSet::new();
        facts.exports.retain(|e| seen.insert(e.name.clone()));

        Ok(facts)
    }

    /// Dotted module paths become `/` paths; leading dots climb from the
    /// importer's package. Absolute modules are tried from the root and from
    /// a conventional `src/` layout.
    fn module_bases(&self, specifier: &str, importer: &str) -> Vec<String> {
        let dots = specifier.chars().take_while(|c| *c == '.').count();
        let module = specifier[dots..].replace('.', "/");

        if dots == 0 {
            if module.is_empty() {
                return Vec::new();
            }
            return vec![module.clone(), format!("src/{module}")];
        }

        let mut dir = parent_dir(importer).to_string();
        for _ in 1..dots {
            if dir.is_empty() {
                return Vec::new();
            }
            dir = parent_dir(&dir).to_string();
        }

        let joined = match (dir.is_empty(), module.is_empty()) {
            (true, _) => module,
            (false, true) => dir,
            (false, false) => format!("{dir}/{module}"),
        };
        normalize_path(&joined).into_iter().collect()
    }

    fn is_relative(&self, specifier: &str) -> bool {
        specifier.starts_with('.')
    }

    /// `from pkg import mod` may name submodules rather than attributes.
    fn member_modules(&self, import: &ImportFact, base: &str) -> Vec<String> {
        import
            .names
            .iter()
            .filter(|name| name.as_str() != "*")
            .map(|name| {
                if base.is_empty() {
                    name.clone()
                } else {
                    format!("{base}/{name}")
                }
            })
            .collect()
    }
}

// ── Imports ─────────────────────────────────────────────────────────────────

/// Walk the whole tree for imports; those guarded by `if TYPE_CHECKING:` are type-only.
fn extract_imports_recursive(
    node: Node,
    source: &[u8],
    path: &str,
    type_checking: bool,
    imports: &mut Vec<ImportFact>,
) {
    match node.kind() {
        "import_statement" => {
            for name in named_children_by_field(node, "name") {
                let module = match name.kind() {
                    "aliased_import" => name.child_by_field_name("name"),
                    _ => Some(name),
                };
                if let Some(module) = module {
                    imports.push(ImportFact {
                        file: path.to_string(),
                        specifier: node_text(module, source),
                        names: Vec::new(),
                        type_only: type_checking,
                        line: node_line(node),
                    });
                }
            }
            return;
        }
        "import_from_statement" => {
            let Some(module) = node.child_by_field_name("module_name") else {
                return;
            };
            let mut names: Vec<String> = named_children_by_field(node, "name")
                .into_iter()
                .filter_map(|name| match name.kind() {
                    "aliased_import" => name.child_by_field_name("name"),
                    _ => Some(name),
                })
                .map(|name| node_text(name, source))
                .collect();
            if children(node).iter().any(|c| c.kind() == "wildcard_import") {
                names.push("*".to_string());
            }
            imports.push(ImportFact {
                file: path.to_string(),
                specifier: node_text(module, source),
                names,
                type_only: type_checking,
                line: node_line(node),
            });
            return;
        }
        "if_statement" => {
            let guarded = node
                .child_by_field_name("condition")
                .is_some_and(|c| is_type_checking_guard(&node_text(c, source)));
            if guarded {
                if let Some(body) = node.child_by_field_name("consequence") {
                    extract_imports_recursive(body, source, path, true, imports);
                }
                for child in children(node) {
                    if matches!(child.kind(), "else_clause" | "elif_clause") {
                        extract_imports_recursive(child, source, path, type_checking, imports);
                    }
                }
                return;
            }
        }
        _ => {}
    }

    for child in children(node) {
        extract_imports_recursive(child, source, path, type_checking, imports);
    }
}

fn is_type_checking_guard(condition: &str) -> bool {
    matches!(condition.trim(), "TYPE_CHECKING" | "typing.TYPE_CHECKING")
}

fn named_children_by_field<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

// ── Top-level definitions ───────────────────────────────────────────────────

fn extract_top_level(
    node: Node,
    source: &[u8],
    path: &str,
    exports: &mut Vec<ExportFact>,
    dunder_all: &mut Option<Vec<String>>,
) {
    match node.kind() {
        "function_definition" => push_named(node, source, path, ExportKind::Function, exports),
        "class_definition" => push_named(node, source, path, ExportKind::Class, exports),
        "decorated_definition" => {
            if let Some(definition) = node.child_by_field_name("definition") {
                extract_top_level(definition, source, path, exports, dunder_all);
            }
        }
        "expression_statement" => {
            for child in children(node) {
                match child.kind() {
                    "assignment" => extract_assignment(child, source, path, exports, dunder_all),
                    "augmented_assignment" => {
                        let is_all = child
                            .child_by_field_name("left")
                            .is_some_and(|l| node_text(l, source) == "__all__");
                        if is_all {
                            if let Some(right) = child.child_by_field_name("right") {
                                dunder_all
                                    .get_or_insert_with(Vec::new)
                                    .extend(string_list(right, source));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn push_named(node: Node, source: &[u8], path: &str, kind: ExportKind, exports: &mut Vec<ExportFact>) {
    if let Some(name) = node.child_by_field_name("name") {
        exports.push(ExportFact {
            file: path.to_string(),
            name: node_text(name, source),
            kind,
            is_default: false,
            line: node_line(node),
        });
    }
}

fn extract_assignment(
    node: Node,
    source: &[u8],
    path: &str,
    exports: &mut Vec<ExportFact>,
    dunder_all: &mut Option<Vec<String>>,
) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };

    if left.kind() == "identifier" && node_text(left, source) == "__all__" {
        if let Some(right) = node.child_by_field_name("right") {
            *dunder_all = Some(string_list(right, source));
        }
        return;
    }

    let mut names = Vec::new();
    collect_targets(left, source, &mut names);
    for name in names {
        exports.push(ExportFact {
            file: path.to_string(),
            name,
            kind: ExportKind::Value,
            is_default: false,
            line: node_line(node),
        });
    }

    // `a = b = 1` nests the second assignment on the right.
    if let Some(right) = node.child_by_field_name("right") {
        if right.kind() == "assignment" {
            extract_assignment(right, source, path, exports, dunder_all);
        }
    }
}

/// Plain names bound by an assignment target; attribute and subscript targets bind nothing new.
fn collect_targets(node: Node, source: &[u8], names: &mut Vec<String>) {
    match node.kind() {
        "identifier" => names.push(node_text(node, source)),
        "pattern_list" | "tuple_pattern" | "list_pattern" => {
            for child in children(node) {
                collect_targets(child, source, names);
            }
        }
        _ => {}
    }
}

/// String literals of a list or tuple expression.
fn string_list(node: Node, source: &[u8]) -> Vec<String> {
    children(node)
        .into_iter()
        .filter(|c| c.kind() == "string")
        .map(|c| unquote(&node_text(c, source)))
        .collect()
}
