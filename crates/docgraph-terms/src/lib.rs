//! docgraph-terms: Glossary terms across a documentation tree.
//!
//! # Architecture
//!
//! - **parser**: `[[Name]]` definition headings, attribute lines and references
//! - **registry**: canonical names, aliases and scopes with fuzzy search
//! - **validator**: uniqueness, completeness, scope, acyclicity, liveness

pub mod parser;
pub mod registry;
pub mod validator;

pub use parser::{ParsedDocument, TermParser};
pub use registry::{ConflictKind, TermConflict, TermId, TermLookup, TermRegistry};
pub use validator::{TermReport, TermValidator};

use docgraph_core::TermsConfig;

/// Parsed, registered and validated terms of a set of documents.
#[derive(Debug)]
pub struct TermAnalysis {
    pub documents: Vec<ParsedDocument>,
    pub registry: TermRegistry,
    pub report: TermReport,
}

impl TermAnalysis {
    /// Run parser, registry and validator over `(path, text)` pairs.
    ///
    /// Attribute warnings from the parser are merged into the report.
    pub fn run<'a, I>(config: &TermsConfig, docs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let parser = TermParser::new(config);
        let documents: Vec<ParsedDocument> = docs
            .into_iter()
            .map(|(path, text)| parser.parse(path, text))
            .collect();

        let registry = TermRegistry::from_definitions(
            documents
                .iter()
                .flat_map(|doc| doc.definitions.iter().cloned()),
        );
        let references = documents
            .iter()
            .flat_map(|doc| doc.references.iter().cloned())
            .collect();

        let mut report = TermValidator::new(config.rules).validate(&registry, references);
        for doc in &documents {
            for warning in &doc.warnings {
                report.findings.push(warning.clone());
            }
        }

        tracing::info!(
            "Terms: {} definitions, {} references across {} documents",
            registry.len(),
            report.references.len(),
            documents.len()
        );

        Self {
            documents,
            registry,
            report,
        }
    }
}
