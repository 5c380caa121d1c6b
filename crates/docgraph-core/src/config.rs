//! Persistent configuration for docgraph.
//!
//! Loads a TOML config from `<root>/.docgraph/config.toml`, falling back to
//! `~/.docgraph/config.toml` and then to built-in defaults.

use crate::{DocgraphError, RuleLevel, TermScope};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the tool-local hidden directory.
pub const DOCGRAPH_DIR: &str = ".docgraph";

/// Top-level docgraph configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocgraphConfig {
    pub scan: ScanConfig,
    pub resolve: ResolveConfig,
    pub terms: TermsConfig,
    pub index: IndexConfig,
    pub orphans: OrphanConfig,
}

impl DocgraphConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, DocgraphError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| DocgraphError::Config(e.to_string()))
    }

    /// Load the config that applies to a project root.
    ///
    /// The project file wins over the user file; when neither exists the
    /// defaults are returned. A file that exists but does not parse is an error.
    pub fn load_for_root(root: &Path) -> Result<Self, DocgraphError> {
        let project = Self::project_path(root);
        if project.exists() {
            return Self::load(&project);
        }
        if let Some(user) = Self::user_path() {
            if user.exists() {
                return Self::load(&user);
            }
        }
        Ok(Self::default())
    }

    /// `<root>/.docgraph/config.toml`.
    pub fn project_path(root: &Path) -> PathBuf {
        root.join(DOCGRAPH_DIR).join("config.toml")
    }

    /// `~/.docgraph/config.toml`, if a home directory is known.
    pub fn user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DOCGRAPH_DIR).join("config.toml"))
    }

    /// Absolute snapshot location for a project root.
    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        root.join(&self.index.snapshot_path)
    }
}

/// Which files a scan looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directories holding documentation. Empty means the whole root.
    pub docs_dirs: Vec<String>,
    /// Extensions treated as documentation.
    pub doc_extensions: Vec<String>,
    /// Root-relative path prefixes skipped in addition to `.gitignore`.
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            docs_dirs: Vec::new(),
            doc_extensions: vec!["md".to_string(), "markdown".to_string()],
            exclude: vec!["node_modules".to_string(), "target".to_string()],
        }
    }
}

impl ScanConfig {
    /// Whether a root-relative path is a documentation file.
    pub fn is_doc(&self, path: &str) -> bool {
        let ext = match path.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => return false,
        };
        if !self.doc_extensions.iter().any(|e| e == ext) {
            return false;
        }
        self.docs_dirs.is_empty()
            || self
                .docs_dirs
                .iter()
                .any(|dir| is_under(path, dir.trim_end_matches('/')))
    }

    /// Whether a root-relative path falls under an excluded prefix.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude
            .iter()
            .any(|prefix| is_under(path, prefix.trim_end_matches('/')))
    }
}

fn is_under(path: &str, dir: &str) -> bool {
    dir.is_empty()
        || dir == "."
        || path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// How import specifiers are matched to scanned files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Suffixes tried, in order, after the exact path.
    pub extensions: Vec<String>,
    /// Directory index file names tried, in order, last.
    pub index_files: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: [".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".py"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            index_files: ["index.ts", "index.tsx", "index.js", "index.jsx", "__init__.py"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Term parsing and validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermsConfig {
    /// Heading level (number of `#`) that introduces a definition.
    pub definition_heading_level: usize,
    /// Files whose definitions are always global unless marked otherwise.
    pub glossary_paths: Vec<String>,
    /// Scope of definitions elsewhere that carry no `scope:` line.
    pub default_scope: TermScope,
    pub rules: TermRules,
}

impl Default for TermsConfig {
    fn default() -> Self {
        Self {
            definition_heading_level: 3,
            glossary_paths: vec!["glossary.md".to_string(), "docs/glossary.md".to_string()],
            default_scope: TermScope::Global,
            rules: TermRules::default(),
        }
    }
}

impl TermsConfig {
    pub fn is_glossary(&self, path: &str) -> bool {
        self.glossary_paths.iter().any(|g| g == path)
    }

    /// Scope a definition in `path` gets without an explicit `scope:` line.
    pub fn scope_for(&self, path: &str) -> TermScope {
        if self.is_glossary(path) {
            TermScope::Global
        } else {
            self.default_scope
        }
    }
}

/// Severity of each term validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermRules {
    pub uniqueness: RuleLevel,
    pub completeness: RuleLevel,
    pub scope: RuleLevel,
    pub acyclicity: RuleLevel,
    pub liveness: RuleLevel,
}

impl Default for TermRules {
    fn default() -> Self {
        Self {
            uniqueness: RuleLevel::Error,
            completeness: RuleLevel::Error,
            scope: RuleLevel::Warning,
            acyclicity: RuleLevel::Warning,
            liveness: RuleLevel::Warning,
        }
    }
}

/// Where the reference index snapshot lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Root-relative snapshot path.
    pub snapshot_path: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            snapshot_path: format!("{DOCGRAPH_DIR}/index.json"),
        }
    }
}

/// Orphan detection settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrphanConfig {
    /// Report exports of test files too.
    pub include_tests: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let config = DocgraphConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).expect("default config should serialize to TOML");
        let parsed: DocgraphConfig =
            toml::from_str(&toml_str).expect("serialized TOML should parse back");
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_toml_uses_defaults_for_missing_fields() {
        let partial = r#"
[terms]
definition_heading_level = 2

[terms.rules]
scope = "error"
liveness = "off"
"#;
        let config: DocgraphConfig = toml::from_str(partial).expect("partial TOML should parse");
        assert_eq!(config.terms.definition_heading_level, 2);
        assert_eq!(config.terms.rules.scope, RuleLevel::Error);
        assert_eq!(config.terms.rules.liveness, RuleLevel::Off);
        assert_eq!(config.terms.rules.uniqueness, RuleLevel::Error);
        assert_eq!(config.index.snapshot_path, ".docgraph/index.json");
        assert_eq!(config.resolve.extensions[0], ".ts");
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let result = DocgraphConfig::load(Path::new("/tmp/nonexistent_docgraph_config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn project_config_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = DocgraphConfig::default();
        config.orphans.include_tests = true;
        let path = DocgraphConfig::project_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = DocgraphConfig::load_for_root(dir.path()).expect("load should succeed");
        assert!(loaded.orphans.include_tests);
    }

    #[test]
    fn malformed_project_config_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = DocgraphConfig::project_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[terms\nbroken").unwrap();
        assert!(matches!(
            DocgraphConfig::load_for_root(dir.path()),
            Err(DocgraphError::Config(_))
        ));
    }

    #[test]
    fn doc_detection_honours_docs_dirs() {
        let mut scan = ScanConfig::default();
        assert!(scan.is_doc("README.md"));
        assert!(!scan.is_doc("src/app.ts"));

        scan.docs_dirs = vec!["docs/".to_string()];
        assert!(scan.is_doc("docs/auth/login.md"));
        assert!(!scan.is_doc("README.md"));
        assert!(!scan.is_doc("docsite/page.md"));
    }

    #[test]
    fn exclusion_matches_whole_segments() {
        let scan = ScanConfig::default();
        assert!(scan.is_excluded("node_modules/react/index.js"));
        assert!(!scan.is_excluded("src/node_modules_shim.ts"));
    }
}
