//! docgraph-graph: File-level dependency graph with petgraph algorithms.
//!
//! Resolves every extracted import against the scanned file set, keeping
//! forward and reverse adjacency in step, and answers reachability questions
//! used to find undocumented ("orphaned") exports.

mod cycles;
mod reachability;

pub use reachability::{OrphanExport, ReachabilityAnalyzer, ReachabilityReport};

use docgraph_core::{ExportFact, FileFacts, ResolveConfig, SourceFile};
use docgraph_index::{ExtractorRegistry, ImportResolver, Resolution, ScanResult};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// An import that did not resolve to a scanned file: a package, or a
/// dangling relative path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalImport {
    pub specifier: String,
    pub line: usize,
}

/// Import graph over the files of one scan.
///
/// Nodes are root-relative file paths. An edge `a -> b` means `a` imports
/// `b`. Both adjacency maps are filled from the same loop, so every forward
/// edge has exactly one reverse counterpart.
pub struct DependencyGraph {
    pub(crate) graph: DiGraph<String, ()>,
    /// Map from file path to petgraph NodeIndex.
    pub(crate) id_to_index: HashMap<String, NodeIndex>,
    files: BTreeMap<String, SourceFile>,
    forward: BTreeMap<String, BTreeSet<String>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
    external: BTreeMap<String, Vec<ExternalImport>>,
    unresolved: BTreeMap<String, Vec<ExternalImport>>,
    exports: BTreeMap<String, Vec<ExportFact>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_to_index: HashMap::new(),
            files: BTreeMap::new(),
            forward: BTreeMap::new(),
            reverse: BTreeMap::new(),
            external: BTreeMap::new(),
            unresolved: BTreeMap::new(),
            exports: BTreeMap::new(),
        }
    }

    /// Build the graph from a finished scan.
    pub fn from_scan(scan: &ScanResult, registry: &ExtractorRegistry, config: &ResolveConfig) -> Self {
        Self::build(&scan.sources, &scan.facts, registry, config)
    }

    /// Build the graph from source files and their extracted facts.
    ///
    /// Files without facts (failed extraction) still become nodes, with no
    /// outgoing edges and no exports.
    pub fn build(
        sources: &[SourceFile],
        facts: &BTreeMap<String, FileFacts>,
        registry: &ExtractorRegistry,
        config: &ResolveConfig,
    ) -> Self {
        let mut graph = Self::new();
        for source in sources {
            graph.add_file(source.clone());
        }

        let resolver = ImportResolver::new(sources.iter().map(|s| s.path.clone()), config.clone());

        for (file, file_facts) in facts {
            if !graph.contains(file) {
                continue;
            }
            graph
                .exports
                .insert(file.clone(), file_facts.exports.clone());

            // Resolve with the language that produced the facts.
            let Some(extractor) = graph
                .files
                .get(file)
                .and_then(|source| registry.by_language(&source.language))
            else {
                continue;
            };

            for import in &file_facts.imports {
                match resolver.resolve(extractor, import) {
                    Resolution::Internal(targets) => {
                        for target in targets {
                            graph.add_import(file, &target);
                        }
                    }
                    Resolution::External => {
                        graph
                            .external
                            .entry(file.clone())
                            .or_default()
                            .push(ExternalImport {
                                specifier: import.specifier.clone(),
                                line: import.line,
                            });
                    }
                    Resolution::Unresolved => {
                        tracing::debug!(
                            "{}:{}: '{}' matches no scanned file",
                            file,
                            import.line,
                            import.specifier
                        );
                        graph
                            .unresolved
                            .entry(file.clone())
                            .or_default()
                            .push(ExternalImport {
                                specifier: import.specifier.clone(),
                                line: import.line,
                            });
                    }
                }
            }
        }

        tracing::debug!(
            "Dependency graph: {} files, {} import edges, {} files with external imports",
            graph.node_count(),
            graph.edge_count(),
            graph.external.len()
        );
        graph
    }

    /// Add a file node. Re-adding a known path replaces its metadata only.
    pub fn add_file(&mut self, source: SourceFile) {
        if !self.id_to_index.contains_key(&source.path) {
            let idx = self.graph.add_node(source.path.clone());
            self.id_to_index.insert(source.path.clone(), idx);
        }
        self.files.insert(source.path.clone(), source);
    }

    /// Record `from` importing `to`. Both files must already be nodes.
    pub fn add_import(&mut self, from: &str, to: &str) -> bool {
        let (Some(&src), Some(&dst)) = (self.id_to_index.get(from), self.id_to_index.get(to)) else {
            return false;
        };
        if !self
            .forward
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string())
        {
            return false;
        }
        self.reverse
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
        self.graph.add_edge(src, dst, ());
        true
    }

    /// Whether a file is a node of this graph.
    pub fn contains(&self, file: &str) -> bool {
        self.id_to_index.contains_key(file)
    }

    /// Files `file` imports, sorted.
    pub fn dependencies(&self, file: &str) -> Vec<&str> {
        self.forward
            .get(file)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Files importing `file`, sorted.
    pub fn dependents(&self, file: &str) -> Vec<&str> {
        self.reverse
            .get(file)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Every file path, sorted.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn source(&self, file: &str) -> Option<&SourceFile> {
        self.files.get(file)
    }

    /// Exports extracted from `file`; empty for unknown or failed files.
    pub fn exports(&self, file: &str) -> &[ExportFact] {
        self.exports.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Package imports of `file`, in source order.
    pub fn external_imports(&self, file: &str) -> &[ExternalImport] {
        self.external.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Relative imports of `file` that name no scanned file, in source order.
    pub fn unresolved_imports(&self, file: &str) -> &[ExternalImport] {
        self.unresolved.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every package specifier with the files that import it.
    pub fn external_dependencies(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut deps: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (file, imports) in &self.external {
            for import in imports {
                deps.entry(import.specifier.clone())
                    .or_default()
                    .insert(file.clone());
            }
        }
        deps
    }

    /// All `(importer, imported)` pairs, sorted.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from.as_str(), to.as_str())))
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::graph_of;
    use super::*;

    #[test]
    fn forward_and_reverse_edges_agree() {
        let graph = graph_of(&[
            ("src/a.ts", "export class Foo {}\n"),
            ("src/b.ts", "import { Foo } from './a';\nexport const b = new Foo();\n"),
            ("src/c.ts", "import { Foo } from './a';\nimport { b } from './b';\n"),
        ]);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        for (from, to) in graph.edges() {
            assert!(
                graph.dependents(to).contains(&from),
                "{to} does not list {from} as a dependent"
            );
        }
        for file in graph.files() {
            for dependent in graph.dependents(file) {
                assert!(graph.dependencies(dependent).contains(&file));
            }
        }
        assert_eq!(graph.dependents("src/a.ts"), vec!["src/b.ts", "src/c.ts"]);
    }

    #[test]
    fn external_imports_are_metadata_not_edges() {
        let graph = graph_of(&[(
            "src/app.ts",
            "import React from 'react';\nimport { x } from './missing';\n",
        )]);

        assert_eq!(graph.edge_count(), 0);
        let external: Vec<_> = graph
            .external_imports("src/app.ts")
            .iter()
            .map(|e| e.specifier.as_str())
            .collect();
        assert_eq!(external, vec!["react"]);
        assert_eq!(graph.unresolved_imports("src/app.ts")[0].specifier, "./missing");
        let deps = graph.external_dependencies();
        assert!(deps.contains_key("react"));
        assert!(!deps.contains_key("./missing"));
    }

    #[test]
    fn import_equals_require_is_an_edge() {
        let graph = graph_of(&[
            ("src/app.ts", "import util = require('./util');\n"),
            ("src/util.ts", "export function go() {}\n"),
        ]);
        assert_eq!(graph.dependencies("src/app.ts"), vec!["src/util.ts"]);
        assert!(graph.external_imports("src/app.ts").is_empty());
    }

    #[test]
    fn duplicate_imports_make_one_edge() {
        let graph = graph_of(&[
            ("src/a.ts", "export const a = 1;\nexport const b = 2;\n"),
            ("src/b.ts", "import { a } from './a';\nimport { b } from './a.js';\n"),
        ]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn failed_files_remain_nodes() {
        let graph = graph_of(&[
            ("src/ok.ts", "import { x } from './bad';\n"),
            ("src/bad.ts", "export const = ;;\n"),
        ]);
        assert!(graph.contains("src/bad.ts"));
        assert!(graph.exports("src/bad.ts").is_empty());
        assert_eq!(graph.dependencies("src/ok.ts"), vec!["src/bad.ts"]);
    }

    #[test]
    fn add_import_requires_known_nodes() {
        let mut graph = DependencyGraph::new();
        assert!(!graph.add_import("a.ts", "b.ts"));
        assert_eq!(graph.edge_count(), 0);
    }
}
