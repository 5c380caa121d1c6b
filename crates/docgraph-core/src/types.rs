use serde::{Deserialize, Serialize};

use crate::DocgraphError;

// ── Source Files ────────────────────────────────────────────────────────────

/// Role a scanned file plays in the project, inferred from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Source,
    Test,
    Config,
}

impl FileRole {
    /// Infer the role from a root-relative, `/`-separated path.
    pub fn detect(path: &str) -> Self {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let in_test_dir = path
            .split('/')
            .any(|segment| matches!(segment, "test" | "tests" | "__tests__" | "spec"));

        if in_test_dir
            || file_name.contains(".test.")
            || file_name.contains(".spec.")
            || (file_name.starts_with("test_") && file_name.ends_with(".py"))
            || file_name.ends_with("_test.py")
        {
            return Self::Test;
        }

        if file_name.contains(".config.") || matches!(file_name, "conftest.py" | "setup.py") {
            return Self::Config;
        }

        Self::Source
    }
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Test => write!(f, "test"),
            Self::Config => write!(f, "config"),
        }
    }
}

/// A file picked up by a scan pass. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Root-relative path with `/` separators.
    pub path: String,
    /// Name of the extractor language that handles this file.
    pub language: String,
    pub role: FileRole,
}

// ── Extracted Facts ─────────────────────────────────────────────────────────

/// One import statement as seen by an extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFact {
    /// File containing the import.
    pub file: String,
    /// Module specifier exactly as written (`./util`, `..models`, `react`).
    pub specifier: String,
    /// Imported names. Empty for whole-module and side-effect imports.
    pub names: Vec<String>,
    /// `import type` in TypeScript, `if TYPE_CHECKING:` imports in Python.
    pub type_only: bool,
    /// 1-based line of the statement.
    pub line: usize,
}

/// Coarse classification of an exported symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Type,
    Class,
    Function,
    Value,
}

impl std::fmt::Display for ExportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Type => write!(f, "type"),
            Self::Class => write!(f, "class"),
            Self::Function => write!(f, "function"),
            Self::Value => write!(f, "value"),
        }
    }
}

impl std::str::FromStr for ExportKind {
    type Err = DocgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "type" => Ok(Self::Type),
            "class" => Ok(Self::Class),
            "function" => Ok(Self::Function),
            "value" => Ok(Self::Value),
            _ => Err(DocgraphError::InvalidExportKind(s.to_string())),
        }
    }
}

/// One exported symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFact {
    pub file: String,
    pub name: String,
    pub kind: ExportKind,
    pub is_default: bool,
    /// 1-based line of the declaration.
    pub line: usize,
}

/// Everything an extractor reports for a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFacts {
    pub imports: Vec<ImportFact>,
    pub exports: Vec<ExportFact>,
}

// ── Terms ───────────────────────────────────────────────────────────────────

/// What kind of thing a glossary term names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    #[default]
    Concept,
    Entity,
    Process,
    Attribute,
    Relationship,
    Abbreviation,
}

impl std::fmt::Display for TermKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concept => write!(f, "concept"),
            Self::Entity => write!(f, "entity"),
            Self::Process => write!(f, "process"),
            Self::Attribute => write!(f, "attribute"),
            Self::Relationship => write!(f, "relationship"),
            Self::Abbreviation => write!(f, "abbreviation"),
        }
    }
}

impl std::str::FromStr for TermKind {
    type Err = DocgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "concept" => Ok(Self::Concept),
            "entity" => Ok(Self::Entity),
            "process" => Ok(Self::Process),
            "attribute" => Ok(Self::Attribute),
            "relationship" => Ok(Self::Relationship),
            "abbreviation" => Ok(Self::Abbreviation),
            _ => Err(DocgraphError::InvalidTermKind(s.to_string())),
        }
    }
}

/// Visibility of a term definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermScope {
    /// Referenceable from any document.
    Global,
    /// Referenceable only from the defining document.
    Document,
}

impl std::fmt::Display for TermScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Document => write!(f, "document"),
        }
    }
}

impl std::str::FromStr for TermScope {
    type Err = DocgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "document" | "local" => Ok(Self::Document),
            _ => Err(DocgraphError::InvalidTermScope(s.to_string())),
        }
    }
}

/// A term defined under a definition heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDefinition {
    /// Authoritative spelling.
    pub name: String,
    /// Stable slug, derived from the name unless given explicitly.
    pub id: String,
    pub kind: TermKind,
    pub scope: TermScope,
    pub aliases: Vec<String>,
    /// Canonical names of related terms (the edges cycle detection walks).
    pub related: Vec<String>,
    /// Whitespace-normalized definition body.
    pub definition: String,
    pub file: String,
    /// 1-based line of the definition heading.
    pub line: usize,
}

/// A bracket reference to a term found in body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermReference {
    /// Text inside the brackets, as written.
    pub text: String,
    /// Canonical name, filled in once the reference is resolved.
    pub canonical: Option<String>,
    pub file: String,
    pub line: usize,
    /// Trimmed source line the reference sits on.
    pub context: String,
}

/// Turn a display name into a lowercase, dash-separated identifier.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_detection() {
        assert_eq!(FileRole::detect("src/app.ts"), FileRole::Source);
        assert_eq!(FileRole::detect("src/app.test.ts"), FileRole::Test);
        assert_eq!(FileRole::detect("src/__tests__/app.ts"), FileRole::Test);
        assert_eq!(FileRole::detect("pkg/test_models.py"), FileRole::Test);
        assert_eq!(FileRole::detect("pkg/models_test.py"), FileRole::Test);
        assert_eq!(FileRole::detect("tests/helpers.py"), FileRole::Test);
        assert_eq!(FileRole::detect("vite.config.ts"), FileRole::Config);
        assert_eq!(FileRole::detect("conftest.py"), FileRole::Config);
        assert_eq!(FileRole::detect("pkg/testing_utils.py"), FileRole::Source);
    }

    #[test]
    fn term_kind_parses_case_insensitively() {
        assert_eq!("Entity".parse::<TermKind>().unwrap(), TermKind::Entity);
        assert_eq!(
            " abbreviation ".parse::<TermKind>().unwrap(),
            TermKind::Abbreviation
        );
        assert!("widget".parse::<TermKind>().is_err());
    }

    #[test]
    fn term_scope_accepts_local_alias() {
        assert_eq!("local".parse::<TermScope>().unwrap(), TermScope::Document);
        assert_eq!("GLOBAL".parse::<TermScope>().unwrap(), TermScope::Global);
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Access Token"), "access-token");
        assert_eq!(slugify("  HTTP/2 -- Stream "), "http-2-stream");
        assert_eq!(slugify("Widget"), "widget");
    }

    #[test]
    fn export_kind_display_roundtrips() {
        for kind in [
            ExportKind::Type,
            ExportKind::Class,
            ExportKind::Function,
            ExportKind::Value,
        ] {
            assert_eq!(kind.to_string().parse::<ExportKind>().unwrap(), kind);
        }
    }
}
