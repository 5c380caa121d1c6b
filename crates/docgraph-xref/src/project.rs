//! End-to-end pipeline: scan, graph, terms, index.

use crate::builder::IndexBuilder;
use crate::consistency::ConsistencyValidator;
use crate::index::ReferenceIndex;
use docgraph_core::{DocgraphConfig, DocgraphError, Finding, ValidationReport};
use docgraph_graph::{DependencyGraph, ReachabilityAnalyzer, ReachabilityReport};
use docgraph_index::{ExtractorRegistry, ProjectScanner, ScanResult};
use docgraph_terms::TermAnalysis;
use std::path::{Path, PathBuf};

/// Everything one analysis run produces.
pub struct ProjectAnalysis {
    pub index: ReferenceIndex,
    pub graph: DependencyGraph,
    pub scan: ScanResult,
    pub terms: TermAnalysis,
    pub reachability: ReachabilityReport,
    /// Front matter problems found while building the index.
    pub metadata_warnings: Vec<Finding>,
}

impl ProjectAnalysis {
    /// Analyze an already-scanned project.
    pub fn from_scan(config: &DocgraphConfig, registry: &ExtractorRegistry, scan: ScanResult) -> Self {
        let graph = DependencyGraph::from_scan(&scan, registry, &config.resolve);
        let terms = TermAnalysis::run(
            &config.terms,
            scan.docs.iter().map(|d| (d.path.as_str(), d.content.as_str())),
        );

        let build = IndexBuilder::new(&scan, &graph, &terms).build();

        let seeds = build
            .index
            .features
            .values()
            .flat_map(|f| f.code_used.iter().cloned());
        let reachability = ReachabilityAnalyzer::from_config(&config.orphans).analyze(&graph, seeds);

        Self {
            index: build.index,
            graph,
            scan,
            terms,
            reachability,
            metadata_warnings: build.warnings,
        }
    }

    /// Every finding of the run in one report, errors first.
    ///
    /// Extraction failures and metadata problems are warnings; term rules
    /// report at their configured severity; index consistency problems
    /// follow [`ConsistencyValidator`].
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        for finding in self.scan.failure_findings() {
            report.push(finding);
        }
        for warning in &self.metadata_warnings {
            report.push(warning.clone());
        }
        report.merge(self.terms.report.findings.clone());
        report.merge(ConsistencyValidator::new().validate(&self.index));
        report.sort();
        report
    }
}

/// A project root with its configuration.
pub struct Project {
    root: PathBuf,
    config: DocgraphConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: DocgraphConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Open a project, loading its configuration from the usual places.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DocgraphError> {
        let root = root.into();
        let config = DocgraphConfig::load_for_root(&root)?;
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &DocgraphConfig {
        &self.config
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.config.snapshot_path(&self.root)
    }

    /// Scan the tree and analyze it from scratch.
    pub fn analyze(&self, registry: &ExtractorRegistry) -> Result<ProjectAnalysis, DocgraphError> {
        let scan = ProjectScanner::new(registry, &self.config.scan).scan(&self.root)?;
        Ok(ProjectAnalysis::from_scan(&self.config, registry, scan))
    }

    /// Analyze and validate in one step.
    pub fn validate(&self, registry: &ExtractorRegistry) -> Result<ValidationReport, DocgraphError> {
        Ok(self.analyze(registry)?.validate())
    }

    /// Analyze and write the snapshot.
    pub fn build(&self, registry: &ExtractorRegistry) -> Result<ProjectAnalysis, DocgraphError> {
        let analysis = self.analyze(registry)?;
        let path = self.snapshot_path();
        analysis.index.save(&path)?;
        tracing::info!("Snapshot written to {}", path.display());
        Ok(analysis)
    }

    /// Read the last written snapshot.
    pub fn load_index(&self) -> Result<ReferenceIndex, DocgraphError> {
        ReferenceIndex::load(&self.snapshot_path())
    }
}
