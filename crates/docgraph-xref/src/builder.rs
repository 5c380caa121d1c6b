//! Two-pass reference index construction.
//!
//! Pass one reads every feature document's metadata and records forward
//! relations only (feature to code, related features, interfaces, terms).
//! Pass two inverts each forward map into its reverse counterpart. Both
//! passes address entries by string key; no entry points at another.

use crate::index::{
    CodeEntry, ExportEntry, FeatureEntry, InterfaceEntry, ReferenceIndex, TermEntry, TermRefEntry,
};
use crate::metadata::FeatureMeta;
use docgraph_core::{Finding, FindingKind, Location, Severity, TermDefinition, TermScope};
use docgraph_graph::DependencyGraph;
use docgraph_index::ScanResult;
use docgraph_terms::{TermAnalysis, TermId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Index key of a term: its name when global, `file#name` when document-scoped.
pub fn term_key(def: &TermDefinition) -> String {
    match def.scope {
        TermScope::Global => def.name.clone(),
        TermScope::Document => format!("{}#{}", def.file, def.name),
    }
}

/// A finished index plus the metadata problems met while building it.
#[derive(Debug, Clone)]
pub struct IndexBuild {
    pub index: ReferenceIndex,
    /// Malformed front matter, duplicate feature ids, dangling references.
    pub warnings: Vec<Finding>,
}

/// Builds a [`ReferenceIndex`] from a scan, its dependency graph and its terms.
pub struct IndexBuilder<'a> {
    scan: &'a ScanResult,
    graph: &'a DependencyGraph,
    terms: &'a TermAnalysis,
    warnings: Vec<Finding>,
}

/// Forward relations a feature declares, before inversion.
struct FeatureDraft {
    entry: FeatureEntry,
    related: Vec<String>,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(scan: &'a ScanResult, graph: &'a DependencyGraph, terms: &'a TermAnalysis) -> Self {
        Self {
            scan,
            graph,
            terms,
            warnings: Vec::new(),
        }
    }

    pub fn build(mut self) -> IndexBuild {
        let term_keys: HashMap<TermId, String> = self
            .terms
            .registry
            .definitions()
            .map(|(id, def)| (id, term_key(def)))
            .collect();

        // Pass one: forward maps.
        let drafts = self.read_features(&term_keys);

        // Pass two: reverse maps.
        let mut index = ReferenceIndex::new();
        index.code = self.code_entries();
        index.terms = self.term_entries(&term_keys);
        index.external_dependencies = self.graph.external_dependencies();

        let known: BTreeSet<String> = drafts.keys().cloned().collect();
        let mut related_pairs: Vec<(String, String)> = Vec::new();

        for (id, draft) in drafts {
            let FeatureDraft { mut entry, related } = draft;

            for file in &entry.code_used {
                if let Some(code) = index.code.get_mut(file) {
                    code.documented_in.insert(id.clone());
                }
                for dependent in self.graph.dependents(file) {
                    if !entry.code_used.contains(dependent) {
                        entry.code_used_by.insert(dependent.to_string());
                    }
                }
            }

            for name in &entry.interfaces_provided {
                let interface = index.interfaces.entry(name.clone()).or_default();
                interface.from.insert(id.clone());
                interface.shared_types.extend(entry.shared_types.iter().cloned());
            }
            for name in &entry.interfaces_used {
                index
                    .interfaces
                    .entry(name.clone())
                    .or_insert_with(InterfaceEntry::default)
                    .to
                    .insert(id.clone());
            }

            for other in related {
                if other == id {
                    continue;
                }
                if known.contains(&other) {
                    related_pairs.push((id.clone(), other));
                } else {
                    self.warn(
                        format!("feature '{id}' relates to unknown feature '{other}'"),
                        Location::file(&entry.doc_path),
                    );
                }
            }

            index.features.insert(id, entry);
        }

        for (a, b) in related_pairs {
            if let Some(feature) = index.features.get_mut(&a) {
                feature.related.insert(b.clone());
            }
            if let Some(feature) = index.features.get_mut(&b) {
                feature.related.insert(a);
            }
        }

        tracing::info!(
            "Reference index: {} features, {} code files, {} interfaces, {} terms",
            index.features.len(),
            index.code.len(),
            index.interfaces.len(),
            index.terms.len()
        );

        IndexBuild {
            index,
            warnings: self.warnings,
        }
    }

    fn warn(&mut self, message: String, location: Location) {
        tracing::warn!("{}: {}", location, message);
        self.warnings.push(
            Finding::new(FindingKind::MalformedMetadata, Severity::Warning, message).at(location),
        );
    }

    fn read_features(&mut self, term_keys: &HashMap<TermId, String>) -> BTreeMap<String, FeatureDraft> {
        let mut defined: HashMap<&str, BTreeSet<String>> = HashMap::new();
        for (id, def) in self.terms.registry.definitions() {
            defined
                .entry(def.file.as_str())
                .or_default()
                .insert(term_keys[&id].clone());
        }
        let mut used: HashMap<&str, BTreeSet<String>> = HashMap::new();
        for (id, reference) in self.terms.report.resolved() {
            used.entry(reference.file.as_str())
                .or_default()
                .insert(term_keys[&id].clone());
        }

        let mut drafts: BTreeMap<String, FeatureDraft> = BTreeMap::new();
        for doc in &self.scan.docs {
            let meta = match FeatureMeta::parse(&doc.path, &doc.content) {
                Ok(Some(meta)) => meta,
                Ok(None) => continue,
                Err(err) => {
                    self.warn(err.to_string(), Location::file(&doc.path));
                    continue;
                }
            };

            let id = meta.feature_id(&doc.path);
            if let Some(existing) = drafts.get(&id) {
                let message = format!(
                    "feature id '{id}' is already used by {}",
                    existing.entry.doc_path
                );
                self.warn(message, Location::file(&doc.path));
                continue;
            }

            let mut code_used = BTreeSet::new();
            for reference in meta.entry_point.iter().chain(&meta.code_refs) {
                let matched = self.expand_code_ref(reference);
                if matched.is_empty() {
                    self.warn(
                        format!("code reference '{reference}' matches no scanned source file"),
                        Location::file(&doc.path),
                    );
                }
                code_used.extend(matched);
            }

            let entry = FeatureEntry {
                doc_path: doc.path.clone(),
                title: meta.title.clone(),
                entry_point: meta.entry_point.clone(),
                code_used,
                code_used_by: BTreeSet::new(),
                related: BTreeSet::new(),
                interfaces_provided: meta.interfaces.provides.iter().cloned().collect(),
                interfaces_used: meta.interfaces.uses.iter().cloned().collect(),
                shared_types: meta.shared_types.iter().cloned().collect(),
                terms_defined: defined.get(doc.path.as_str()).cloned().unwrap_or_default(),
                terms_used: used.get(doc.path.as_str()).cloned().unwrap_or_default(),
            };
            drafts.insert(
                id,
                FeatureDraft {
                    entry,
                    related: meta.related,
                },
            );
        }
        drafts
    }

    /// Files a code reference names: the file itself, or every scanned file
    /// under it when it names a directory.
    fn expand_code_ref(&self, reference: &str) -> Vec<String> {
        let path = reference.trim().trim_start_matches("./").trim_end_matches('/');
        if path.is_empty() {
            return Vec::new();
        }
        if self.graph.contains(path) {
            return vec![path.to_string()];
        }
        let prefix = format!("{path}/");
        self.graph
            .files()
            .filter(|file| file.starts_with(&prefix))
            .map(str::to_string)
            .collect()
    }

    fn code_entries(&self) -> BTreeMap<String, CodeEntry> {
        self.graph
            .files()
            .filter_map(|file| {
                let source = self.graph.source(file)?;
                let entry = CodeEntry {
                    language: source.language.clone(),
                    role: source.role,
                    documented_in: BTreeSet::new(),
                    imports: self.graph.dependencies(file).into_iter().map(str::to_string).collect(),
                    imported_by: self.graph.dependents(file).into_iter().map(str::to_string).collect(),
                    exports: self
                        .graph
                        .exports(file)
                        .iter()
                        .map(|export| ExportEntry {
                            name: export.name.clone(),
                            kind: export.kind,
                            is_default: export.is_default,
                            line: export.line,
                        })
                        .collect(),
                    external_imports: self
                        .graph
                        .external_imports(file)
                        .iter()
                        .map(|e| e.specifier.clone())
                        .collect(),
                };
                Some((file.to_string(), entry))
            })
            .collect()
    }

    fn term_entries(&self, term_keys: &HashMap<TermId, String>) -> BTreeMap<String, TermEntry> {
        let mut terms: BTreeMap<String, TermEntry> = BTreeMap::new();
        for (id, def) in self.terms.registry.definitions() {
            let mut references: Vec<TermRefEntry> = self
                .terms
                .report
                .references_to(id)
                .map(|r| TermRefEntry {
                    file: r.file.clone(),
                    line: r.line,
                    text: r.text.clone(),
                })
                .collect();
            references.sort();

            terms.insert(
                term_keys[&id].clone(),
                TermEntry {
                    name: def.name.clone(),
                    id: def.id.clone(),
                    kind: def.kind,
                    scope: def.scope,
                    aliases: def.aliases.clone(),
                    related: def.related.clone(),
                    definition: def.definition.clone(),
                    file: def.file.clone(),
                    line: def.line,
                    usage_count: references.len(),
                    references,
                },
            );
        }
        terms
    }
}
