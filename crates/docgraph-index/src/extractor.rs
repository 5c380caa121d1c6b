//! SymbolExtractor trait for per-language import/export extraction.

use crate::resolver::{normalize_path, parent_dir};
use docgraph_core::{DocgraphError, FileFacts, ImportFact};
use tree_sitter::{Language, Node, Parser, Tree};

/// Trait for per-language extraction of import and export facts.
///
/// Implementations are registered with an
/// [`ExtractorRegistry`](crate::ExtractorRegistry); adding a language needs
/// nothing beyond an implementation of this trait and one `register` call.
pub trait SymbolExtractor: Send + Sync {
    /// Returns the human-readable language name (e.g., "typescript", "python").
    fn language_name(&self) -> &str;

    /// Returns the file extensions this extractor handles, without the dot.
    fn file_extensions(&self) -> &[&str];

    /// Whether this extractor understands the given path.
    fn can_handle(&self, path: &str) -> bool {
        file_extension(path).is_some_and(|ext| self.file_extensions().contains(&ext))
    }

    /// Extract imports and exports from source text.
    ///
    /// Malformed input is reported as [`DocgraphError::Extraction`]; callers
    /// downgrade it to a warning for that single file.
    fn extract(&self, text: &str, path: &str) -> Result<FileFacts, DocgraphError>;

    /// Root-relative candidate base paths for a specifier, most likely first.
    ///
    /// An empty list marks the specifier as external. The default handles
    /// `./` and `../` specifiers relative to the importer and `/` specifiers
    /// relative to the root; bare specifiers are packages.
    fn module_bases(&self, specifier: &str, importer: &str) -> Vec<String> {
        relative_module_base(specifier, importer).into_iter().collect()
    }

    /// Whether a specifier names a path rather than a package. Relative
    /// imports that resolve to nothing are dangling, never external.
    fn is_relative(&self, specifier: &str) -> bool {
        is_relative_specifier(specifier)
    }

    /// Extra modules an import pulls in beyond its resolved base, such as the
    /// submodules named in Python's `from pkg import mod`.
    fn member_modules(&self, _import: &ImportFact, _base: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Extension of a path, without the dot.
pub fn file_extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext)
}

/// `.`, `..`, `./x`, `../x` and `/x`.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

/// Resolve `./x`, `../x` and `/x` style specifiers to a root-relative base.
pub fn relative_module_base(specifier: &str, importer: &str) -> Option<String> {
    if let Some(rooted) = specifier.strip_prefix('/') {
        return normalize_path(rooted);
    }
    if is_relative_specifier(specifier) {
        let dir = parent_dir(importer);
        let joined = if dir.is_empty() {
            specifier.to_string()
        } else {
            format!("{dir}/{specifier}")
        };
        return normalize_path(&joined);
    }
    None
}

// ── Tree-sitter helpers ─────────────────────────────────────────────────────

/// Parse source text, failing when the tree contains syntax errors.
pub fn parse_source(language: &Language, text: &str, path: &str) -> Result<Tree, DocgraphError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| DocgraphError::Internal(format!("grammar rejected: {e}")))?;

    let tree = parser
        .parse(text, None)
        .ok_or_else(|| DocgraphError::extraction(path, "parser produced no tree"))?;

    let root = tree.root_node();
    if root.has_error() {
        let message = match first_error(root) {
            Some(node) => format!(
                "syntax error at line {}, column {}",
                node.start_position().row + 1,
                node.start_position().column + 1
            ),
            None => "syntax error".to_string(),
        };
        return Err(DocgraphError::extraction(path, message));
    }

    Ok(tree)
}

/// Depth-first search for the first error or missing node.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Get the text content of a tree-sitter node.
pub fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// 1-based line of a node.
pub fn node_line(node: Node) -> usize {
    node.start_position().row + 1
}

/// All direct children of a node.
pub fn children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Strip the quotes from a string literal's source text.
pub fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '\'' || c == '"' || c == '`')
        .to_string()
}
