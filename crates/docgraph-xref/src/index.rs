//! The reference index: one bidirectional map over features, code files,
//! interfaces and terms.
//!
//! Keys are stable strings (feature ids, root-relative paths, interface
//! names, term keys) so the index serializes as-is and every relation can be
//! checked against its reverse.

use chrono::{DateTime, Utc};
use docgraph_core::{DocgraphError, ExportKind, FileRole, TermKind, TermScope};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Snapshot format version. Bump on incompatible layout changes.
pub const INDEX_VERSION: u32 = 1;

// ── Entries ─────────────────────────────────────────────────────────────────

/// A documented feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEntry {
    pub doc_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_point: Option<String>,
    /// Scanned files the feature documents directly.
    pub code_used: BTreeSet<String>,
    /// Files outside `code_used` that import something in it.
    pub code_used_by: BTreeSet<String>,
    /// Related feature ids, symmetric.
    pub related: BTreeSet<String>,
    pub interfaces_provided: BTreeSet<String>,
    pub interfaces_used: BTreeSet<String>,
    pub shared_types: BTreeSet<String>,
    /// Keys of terms defined in the feature's document.
    pub terms_defined: BTreeSet<String>,
    /// Keys of terms referenced from the feature's document.
    pub terms_used: BTreeSet<String>,
}

/// An exported symbol of a code file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub name: String,
    pub kind: ExportKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_default: bool,
    pub line: usize,
}

/// A scanned source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub language: String,
    pub role: FileRole,
    /// Features whose `code_used` contains this file.
    pub documented_in: BTreeSet<String>,
    pub imports: BTreeSet<String>,
    pub imported_by: BTreeSet<String>,
    pub exports: Vec<ExportEntry>,
    /// Unresolved specifiers, sorted and deduplicated.
    pub external_imports: BTreeSet<String>,
}

/// An interface named in feature metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceEntry {
    /// Providing features.
    pub from: BTreeSet<String>,
    /// Consuming features.
    pub to: BTreeSet<String>,
    /// Union of the providers' shared types.
    pub shared_types: BTreeSet<String>,
}

/// One place a term is referenced.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermRefEntry {
    pub file: String,
    pub line: usize,
    /// Text inside the brackets, as written.
    pub text: String,
}

/// A defined term with its references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    pub name: String,
    pub id: String,
    pub kind: TermKind,
    pub scope: TermScope,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
    pub definition: String,
    pub file: String,
    pub line: usize,
    pub references: Vec<TermRefEntry>,
    pub usage_count: usize,
}

/// Headline numbers for an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub features: usize,
    pub code_files: usize,
    pub documented_code_files: usize,
    pub import_edges: usize,
    pub exports: usize,
    pub interfaces: usize,
    pub terms: usize,
    pub term_references: usize,
    pub external_dependencies: usize,
}

// ── Index ───────────────────────────────────────────────────────────────────

/// The persisted aggregate of every cross-reference in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceIndex {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub features: BTreeMap<String, FeatureEntry>,
    pub code: BTreeMap<String, CodeEntry>,
    pub interfaces: BTreeMap<String, InterfaceEntry>,
    pub terms: BTreeMap<String, TermEntry>,
    /// Unresolved specifier to the files importing it.
    #[serde(default)]
    pub external_dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl ReferenceIndex {
    /// An empty index stamped with the current time.
    pub fn new() -> Self {
        Self {
            version: INDEX_VERSION,
            generated_at: Utc::now(),
            features: BTreeMap::new(),
            code: BTreeMap::new(),
            interfaces: BTreeMap::new(),
            terms: BTreeMap::new(),
            external_dependencies: BTreeMap::new(),
        }
    }

    pub fn feature(&self, id: &str) -> Option<&FeatureEntry> {
        self.features.get(id)
    }

    pub fn code(&self, path: &str) -> Option<&CodeEntry> {
        self.code.get(path.trim_start_matches("./"))
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceEntry> {
        self.interfaces.get(name)
    }

    /// Look a term up by key, name or alias (case-insensitive).
    ///
    /// Global terms win over document-scoped ones with the same spelling.
    pub fn term(&self, name: &str) -> Option<(&str, &TermEntry)> {
        if let Some((key, entry)) = self.terms.get_key_value(name) {
            return Some((key.as_str(), entry));
        }
        let needle = name.trim().to_lowercase();
        let matches = |entry: &TermEntry| {
            entry.name.to_lowercase() == needle
                || entry.aliases.iter().any(|a| a.to_lowercase() == needle)
        };
        self.terms
            .iter()
            .filter(|(_, entry)| matches(*entry))
            .min_by_key(|(key, entry)| (entry.scope != TermScope::Global, *key))
            .map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            features: self.features.len(),
            code_files: self.code.len(),
            documented_code_files: self
                .code
                .values()
                .filter(|c| !c.documented_in.is_empty())
                .count(),
            import_edges: self.code.values().map(|c| c.imports.len()).sum(),
            exports: self.code.values().map(|c| c.exports.len()).sum(),
            interfaces: self.interfaces.len(),
            terms: self.terms.len(),
            term_references: self.terms.values().map(|t| t.usage_count).sum(),
            external_dependencies: self.external_dependencies.len(),
        }
    }

    // ── Snapshot ────────────────────────────────────────────────────────────

    /// Write the index as pretty JSON, replacing any previous snapshot whole.
    ///
    /// The JSON goes to a temporary file in the target directory which is
    /// then renamed over `path`, so readers never observe a partial file.
    /// Concurrent writers are not coordinated.
    pub fn save(&self, path: &Path) -> Result<(), DocgraphError> {
        use std::io::Write;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| DocgraphError::Io(e.error))?;

        tracing::debug!("Wrote snapshot to {}", path.display());
        Ok(())
    }

    /// Read a snapshot written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, DocgraphError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocgraphError::NotFound(format!(
                    "snapshot {} (run `docgraph build` first)",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let index: Self = serde_json::from_str(&content)
            .map_err(|e| DocgraphError::Snapshot(format!("{}: {e}", path.display())))?;
        if index.version != INDEX_VERSION {
            return Err(DocgraphError::Snapshot(format!(
                "{} has version {}, expected {INDEX_VERSION}; rebuild the index",
                path.display(),
                index.version
            )));
        }
        Ok(index)
    }
}

impl Default for ReferenceIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn term_entry(name: &str, scope: TermScope, aliases: &[&str]) -> TermEntry {
        TermEntry {
            name: name.to_string(),
            id: docgraph_core::slugify(name),
            kind: TermKind::Concept,
            scope,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            related: Vec::new(),
            definition: String::new(),
            file: "glossary.md".to_string(),
            line: 1,
            references: Vec::new(),
            usage_count: 0,
        }
    }

    #[test]
    fn term_query_resolves_aliases_and_prefers_global() {
        let mut index = ReferenceIndex::new();
        index
            .terms
            .insert("Widget".to_string(), term_entry("Widget", TermScope::Global, &["gizmo"]));
        index.terms.insert(
            "docs/a.md#Widget".to_string(),
            term_entry("Widget", TermScope::Document, &[]),
        );

        assert_eq!(index.term("Widget").map(|(k, _)| k), Some("Widget"));
        assert_eq!(index.term("GIZMO").map(|(k, _)| k), Some("Widget"));
        assert_eq!(
            index.term("docs/a.md#Widget").map(|(_, e)| e.scope),
            Some(TermScope::Document)
        );
        assert!(index.term("nothing").is_none());
    }

    #[test]
    fn save_replaces_and_load_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".docgraph/index.json");

        let mut index = ReferenceIndex::new();
        index.interfaces.insert("orders.create".to_string(), InterfaceEntry::default());
        index.save(&path).unwrap();

        index.interfaces.insert("orders.cancel".to_string(), InterfaceEntry::default());
        index.save(&path).unwrap();

        let loaded = ReferenceIndex::load(&path).unwrap();
        assert_eq!(loaded, index);
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn missing_snapshot_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = ReferenceIndex::load(&dir.path().join("index.json")).unwrap_err();
        assert!(matches!(err, DocgraphError::NotFound(_)));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        let mut index = ReferenceIndex::new();
        index.version = INDEX_VERSION + 1;
        std::fs::write(&path, serde_json::to_string(&index).unwrap()).unwrap();
        assert!(matches!(
            ReferenceIndex::load(&path),
            Err(DocgraphError::Snapshot(_))
        ));
    }

    #[test]
    fn garbage_snapshot_is_a_snapshot_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ReferenceIndex::load(&path),
            Err(DocgraphError::Snapshot(_))
        ));
    }
}
