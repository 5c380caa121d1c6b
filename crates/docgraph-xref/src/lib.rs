//! docgraph-xref: The bidirectional reference index.
//!
//! Joins feature-document metadata, the dependency graph and glossary terms
//! into one persisted [`ReferenceIndex`], and checks that every relation in it
//! has its reverse.
//!
//! # Architecture
//!
//! - **metadata**: YAML front matter of feature documents
//! - **builder**: two-pass construction (forward maps, then inversion)
//! - **index**: entry types, queries and atomic snapshot persistence
//! - **consistency**: relation symmetry and interface coverage checks
//! - **project**: scan → graph → terms → index pipeline

pub mod builder;
pub mod consistency;
pub mod index;
pub mod metadata;
pub mod project;

pub use builder::{term_key, IndexBuild, IndexBuilder};
pub use consistency::ConsistencyValidator;
pub use index::{
    CodeEntry, ExportEntry, FeatureEntry, IndexStats, InterfaceEntry, ReferenceIndex, TermEntry,
    TermRefEntry, INDEX_VERSION,
};
pub use metadata::{FeatureMeta, InterfaceDecl};
pub use project::{Project, ProjectAnalysis};
