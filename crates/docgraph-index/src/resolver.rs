//! Import specifier resolution.
//!
//! Maps an import's specifier onto a file of the current scan by trying the
//! exact path, then each configured extension suffix, then each configured
//! directory index file. The first match wins. Unmatched package imports are
//! external; unmatched relative imports are dangling.

use crate::extractor::SymbolExtractor;
use docgraph_core::{ImportFact, ResolveConfig};
use std::collections::HashSet;

/// Outcome of resolving one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Files within the scanned set. The module itself comes first when it
    /// resolves, followed by any member modules.
    Internal(Vec<String>),
    /// A package outside the scanned set.
    External,
    /// A relative import naming no scanned file.
    Unresolved,
}

/// Resolves import specifiers against the set of scanned files.
pub struct ImportResolver {
    files: HashSet<String>,
    config: ResolveConfig,
}

impl ImportResolver {
    /// Create a resolver over root-relative file paths.
    pub fn new<I, S>(files: I, config: ResolveConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            config,
        }
    }

    /// Find the scanned file a root-relative base path refers to.
    pub fn resolve_base(&self, base: &str) -> Option<String> {
        if !base.is_empty() && self.files.contains(base) {
            return Some(base.to_string());
        }

        for ext in &self.config.extensions {
            let candidate = format!("{base}{ext}");
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }

        // ESM-style TypeScript imports name the emitted `.js` file.
        if let Some(stem) = [".js", ".jsx", ".mjs", ".cjs"]
            .iter()
            .find_map(|ext| base.strip_suffix(ext))
        {
            for ext in &self.config.extensions {
                let candidate = format!("{stem}{ext}");
                if self.files.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }

        for index in &self.config.index_files {
            let candidate = if base.is_empty() {
                index.clone()
            } else {
                format!("{base}/{index}")
            };
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }

        None
    }

    /// Resolve an import using the owning language's specifier rules.
    pub fn resolve(&self, extractor: &dyn SymbolExtractor, import: &ImportFact) -> Resolution {
        for base in extractor.module_bases(&import.specifier, &import.file) {
            // A namespace package has no index file, but its members still resolve.
            let mut targets: Vec<String> = self.resolve_base(&base).into_iter().collect();
            for member in extractor.member_modules(import, &base) {
                if let Some(resolved) = self.resolve_base(&member) {
                    if !targets.contains(&resolved) {
                        targets.push(resolved);
                    }
                }
            }
            if !targets.is_empty() {
                return Resolution::Internal(targets);
            }
        }

        if extractor.is_relative(&import.specifier) {
            Resolution::Unresolved
        } else {
            Resolution::External
        }
    }

    /// Whether a path is part of the scanned set.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }
}

// ── Path helpers ────────────────────────────────────────────────────────────

/// Collapse `.` and `..` segments of a `/`-separated relative path.
///
/// Returns `None` when the path climbs above the root.
pub fn normalize_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Directory part of a `/`-separated path; empty for files at the root.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::python::PythonExtractor;
    use crate::languages::typescript::TypeScriptExtractor;

    fn resolver(files: &[&str]) -> ImportResolver {
        ImportResolver::new(files.iter().copied(), ResolveConfig::default())
    }

    fn import(file: &str, specifier: &str, names: &[&str]) -> ImportFact {
        ImportFact {
            file: file.to_string(),
            specifier: specifier.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            type_only: false,
            line: 1,
        }
    }

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(normalize_path("src/./a/../b").as_deref(), Some("src/b"));
        assert_eq!(normalize_path("a/b/").as_deref(), Some("a/b"));
        assert_eq!(normalize_path("../x"), None);
    }

    #[test]
    fn parent_dir_of_root_file_is_empty() {
        assert_eq!(parent_dir("app.ts"), "");
        assert_eq!(parent_dir("src/a/app.ts"), "src/a");
    }

    #[test]
    fn exact_path_wins_over_suffixes() {
        let r = resolver(&["src/data.json", "src/data.json.ts"]);
        assert_eq!(r.resolve_base("src/data.json").as_deref(), Some("src/data.json"));
    }

    #[test]
    fn suffixes_are_tried_in_order() {
        let r = resolver(&["src/util.tsx", "src/util.ts"]);
        assert_eq!(r.resolve_base("src/util").as_deref(), Some("src/util.ts"));
    }

    #[test]
    fn directory_index_is_last_resort() {
        let r = resolver(&["src/lib/index.ts", "src/pkg/__init__.py"]);
        assert_eq!(r.resolve_base("src/lib").as_deref(), Some("src/lib/index.ts"));
        assert_eq!(
            r.resolve_base("src/pkg").as_deref(),
            Some("src/pkg/__init__.py")
        );
        assert_eq!(r.resolve_base("src/missing"), None);
    }

    #[test]
    fn js_suffix_maps_onto_ts_source() {
        let r = resolver(&["src/util.ts"]);
        assert_eq!(r.resolve_base("src/util.js").as_deref(), Some("src/util.ts"));
    }

    #[test]
    fn typescript_relative_import_resolves() {
        let r = resolver(&["src/app.ts", "src/util.ts"]);
        let ts = TypeScriptExtractor::new();
        assert_eq!(
            r.resolve(&ts, &import("src/app.ts", "./util", &["helper"])),
            Resolution::Internal(vec!["src/util.ts".to_string()])
        );
    }

    #[test]
    fn typescript_package_import_is_external() {
        let r = resolver(&["src/app.ts"]);
        let ts = TypeScriptExtractor::new();
        assert_eq!(
            r.resolve(&ts, &import("src/app.ts", "react", &["useState"])),
            Resolution::External
        );
    }

    #[test]
    fn python_from_package_import_pulls_submodules() {
        let r = resolver(&["pkg/__init__.py", "pkg/a.py", "pkg/b.py", "pkg/main.py"]);
        let py = PythonExtractor::new();
        let resolution = r.resolve(&py, &import("pkg/main.py", ".", &["a", "b"]));
        assert_eq!(
            resolution,
            Resolution::Internal(vec![
                "pkg/__init__.py".to_string(),
                "pkg/a.py".to_string(),
                "pkg/b.py".to_string(),
            ])
        );
    }

    #[test]
    fn python_namespace_package_resolves_members() {
        let r = resolver(&["pkg/main.py", "pkg/helper.py"]);
        let py = PythonExtractor::new();
        assert_eq!(
            r.resolve(&py, &import("pkg/main.py", ".", &["helper"])),
            Resolution::Internal(vec!["pkg/helper.py".to_string()])
        );
    }

    #[test]
    fn dangling_relative_imports_are_not_packages() {
        let r = resolver(&["pkg/main.py", "src/app.ts"]);
        let py = PythonExtractor::new();
        let ts = TypeScriptExtractor::new();
        assert_eq!(
            r.resolve(&py, &import("pkg/main.py", ".", &["gone"])),
            Resolution::Unresolved
        );
        assert_eq!(
            r.resolve(&py, &import("pkg/main.py", "..missing", &[])),
            Resolution::Unresolved
        );
        assert_eq!(
            r.resolve(&ts, &import("src/app.ts", "./missing", &["x"])),
            Resolution::Unresolved
        );
        assert_eq!(
            r.resolve(&ts, &import("src/app.ts", "../../outside", &[])),
            Resolution::Unresolved
        );
    }

    #[test]
    fn python_absolute_import_resolves_from_root() {
        let r = resolver(&["app/models/user.py", "app/main.py"]);
        let py = PythonExtractor::new();
        assert_eq!(
            r.resolve(&py, &import("app/main.py", "app.models.user", &[])),
            Resolution::Internal(vec!["app/models/user.py".to_string()])
        );
        assert_eq!(
            r.resolve(&py, &import("app/main.py", "requests", &[])),
            Resolution::External
        );
    }
}
