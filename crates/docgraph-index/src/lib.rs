//! docgraph-index: Tree-sitter based import/export extraction.
//!
//! Turns source files into language-neutral [`FileFacts`](docgraph_core::FileFacts)
//! and walks a project to collect them.
//!
//! # Architecture
//!
//! - **extractor**: `SymbolExtractor` trait plus shared tree-sitter helpers
//! - **languages**: built-in extractors (TypeScript/JavaScript, Python)
//! - **registry**: extension-keyed `ExtractorRegistry`, constructed explicitly
//! - **resolver**: maps import specifiers onto scanned files
//! - **scanner**: directory walking, file classification, per-file failure downgrade

pub mod extractor;
pub mod languages;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use extractor::SymbolExtractor;
pub use registry::ExtractorRegistry;
pub use resolver::{ImportResolver, Resolution};
pub use scanner::{DocFile, ExtractionFailure, ProjectScanner, ScanResult};
