//! Transitive documentation coverage.
//!
//! A file is documented when a feature names it directly (a seed) or when a
//! documented file imports it, directly or transitively. Exports of files
//! that are neither are orphans.

use crate::DependencyGraph;
use docgraph_core::{ExportKind, FileRole, OrphanConfig};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// An exported symbol no documentation reaches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrphanExport {
    pub file: String,
    pub name: String,
    pub kind: ExportKind,
    pub line: usize,
}

/// Outcome of one reachability pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityReport {
    /// Directly documented files, including ones missing from the graph.
    pub seeds: BTreeSet<String>,
    /// Files reached through imports that are not seeds themselves.
    pub reachable: BTreeSet<String>,
    /// Sorted by file, then name.
    pub orphans: Vec<OrphanExport>,
}

impl ReachabilityReport {
    /// Distinct files that contribute at least one orphan.
    pub fn orphan_files(&self) -> BTreeSet<&str> {
        self.orphans.iter().map(|o| o.file.as_str()).collect()
    }
}

/// Computes documentation reachability over a [`DependencyGraph`].
#[derive(Debug, Clone, Default)]
pub struct ReachabilityAnalyzer {
    include_tests: bool,
}

impl ReachabilityAnalyzer {
    pub fn new(include_tests: bool) -> Self {
        Self { include_tests }
    }

    pub fn from_config(config: &OrphanConfig) -> Self {
        Self::new(config.include_tests)
    }

    /// Breadth-first traversal from the seeds along import edges.
    ///
    /// Never fails. Seeds unknown to the graph stay in the seed set and
    /// reach nothing. The visited set makes repeated runs on the same graph
    /// produce the same report.
    pub fn analyze<I, S>(&self, graph: &DependencyGraph, seeds: I) -> ReachabilityReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let seeds: BTreeSet<String> = seeds.into_iter().map(Into::into).collect();

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        for seed in &seeds {
            if let Some(&idx) = graph.id_to_index.get(seed) {
                if visited.insert(idx) {
                    queue.push_back(idx);
                }
            }
        }

        while let Some(current) = queue.pop_front() {
            for neighbor in graph.graph.neighbors_directed(current, Direction::Outgoing) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        let reachable: BTreeSet<String> = visited
            .into_iter()
            .filter_map(|idx| graph.graph.node_weight(idx))
            .filter(|file| !seeds.contains(*file))
            .cloned()
            .collect();

        let mut orphans = Vec::new();
        for file in graph.files() {
            if seeds.contains(file) || reachable.contains(file) {
                continue;
            }
            let is_test = graph
                .source(file)
                .is_some_and(|s| s.role == FileRole::Test);
            if is_test && !self.include_tests {
                continue;
            }
            orphans.extend(graph.exports(file).iter().map(|export| OrphanExport {
                file: file.to_string(),
                name: export.name.clone(),
                kind: export.kind,
                line: export.line,
            }));
        }
        orphans.sort_by(|a, b| (&a.file, &a.name).cmp(&(&b.file, &b.name)));

        tracing::debug!(
            "Reachability: {} seeds, {} reachable, {} orphaned exports",
            seeds.len(),
            reachable.len(),
            orphans.len()
        );

        ReachabilityReport {
            seeds,
            reachable,
            orphans,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::graph_of;

    #[test]
    fn export_reached_through_documented_importer_is_not_orphaned() {
        let graph = graph_of(&[
            ("src/a.ts", "export class Foo {}\n"),
            ("src/b.ts", "import { Foo } from './a';\nexport const b = new Foo();\n"),
        ]);
        let report = ReachabilityAnalyzer::default().analyze(&graph, ["src/b.ts"]);

        assert!(report.reachable.contains("src/a.ts"));
        assert!(report.orphans.iter().all(|o| o.name != "Foo"));
        assert!(report.orphans.is_empty());
    }

    #[test]
    fn unimported_undeclared_export_is_orphaned() {
        let graph = graph_of(&[
            ("src/b.ts", "export const b = 1;\n"),
            ("src/c.ts", "export function Bar() {}\n"),
        ]);
        let report = ReachabilityAnalyzer::default().analyze(&graph, ["src/b.ts"]);

        assert_eq!(
            report.orphans,
            vec![OrphanExport {
                file: "src/c.ts".to_string(),
                name: "Bar".to_string(),
                kind: ExportKind::Function,
                line: 1,
            }]
        );
    }

    #[test]
    fn analysis_is_idempotent() {
        let graph = graph_of(&[
            ("src/a.ts", "import './b';\nexport const a = 1;\n"),
            ("src/b.ts", "import './a';\nexport const b = 1;\n"),
            ("src/c.ts", "export const c = 1;\n"),
            ("src/d.ts", "import './c';\nexport const d = 1;\n"),
        ]);
        let analyzer = ReachabilityAnalyzer::default();
        let first = analyzer.analyze(&graph, ["src/a.ts"]);
        let second = analyzer.analyze(&graph, ["src/a.ts"]);
        assert_eq!(first, second);
        assert_eq!(first.orphan_files(), BTreeSet::from(["src/c.ts", "src/d.ts"]));
    }

    #[test]
    fn cycles_terminate() {
        let graph = graph_of(&[
            ("src/a.ts", "import './b';\n"),
            ("src/b.ts", "import './c';\n"),
            ("src/c.ts", "import './a';\nexport const c = 1;\n"),
        ]);
        let report = ReachabilityAnalyzer::default().analyze(&graph, ["src/a.ts"]);
        assert_eq!(
            report.reachable,
            BTreeSet::from(["src/b.ts".to_string(), "src/c.ts".to_string()])
        );
        assert!(report.orphans.is_empty());
    }

    #[test]
    fn unknown_seed_is_kept_but_reaches_nothing() {
        let graph = graph_of(&[("src/a.ts", "export const a = 1;\n")]);
        let report = ReachabilityAnalyzer::default().analyze(&graph, ["src/gone.ts"]);
        assert!(report.seeds.contains("src/gone.ts"));
        assert!(report.reachable.is_empty());
        assert_eq!(report.orphans.len(), 1);
    }

    #[test]
    fn test_files_are_skipped_unless_requested() {
        let graph = graph_of(&[("src/a.test.ts", "export const helper = 1;\n")]);
        let seeds: [&str; 0] = [];

        let default = ReachabilityAnalyzer::default().analyze(&graph, seeds);
        assert!(default.orphans.is_empty());

        let with_tests = ReachabilityAnalyzer::new(true).analyze(&graph, seeds);
        assert_eq!(with_tests.orphans.len(), 1);
    }
}
