//! Extension-keyed registry of language extractors.

use crate::extractor::{file_extension, SymbolExtractor};
use crate::languages;
use docgraph_core::{DocgraphError, FileFacts};
use std::collections::HashMap;

/// Maps file extensions to the extractor responsible for them.
///
/// Constructed explicitly and handed to whoever scans, so tests and
/// concurrent builds each get an isolated instance.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn SymbolExtractor>>,
    by_extension: HashMap<String, usize>,
}

impl ExtractorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// A registry holding the built-in TypeScript and Python extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for extractor in languages::default_extractors() {
            registry.register(extractor);
        }
        registry
    }

    /// Register an extractor for each of its extensions.
    ///
    /// A later registration takes over extensions claimed earlier.
    pub fn register(&mut self, extractor: Box<dyn SymbolExtractor>) {
        let slot = self.extractors.len();
        for ext in extractor.file_extensions() {
            if let Some(previous) = self.by_extension.insert(ext.to_string(), slot) {
                tracing::debug!(
                    "Extension .{} moved from {} to {}",
                    ext,
                    self.extractors[previous].language_name(),
                    extractor.language_name()
                );
            }
        }
        self.extractors.push(extractor);
    }

    /// The extractor for a path, if any language handles it.
    pub fn extractor_for(&self, path: &str) -> Option<&dyn SymbolExtractor> {
        if let Some(slot) = file_extension(path).and_then(|ext| self.by_extension.get(ext)) {
            let extractor = self.extractors[*slot].as_ref();
            if extractor.can_handle(path) {
                return Some(extractor);
            }
        }

        // Extractors may claim paths their extension list does not cover.
        self.extractors
            .iter()
            .rev()
            .find(|e| e.can_handle(path))
            .map(|e| e.as_ref())
    }

    /// The extractor registered under a language name.
    pub fn by_language(&self, language: &str) -> Option<&dyn SymbolExtractor> {
        self.extractors
            .iter()
            .rev()
            .find(|e| e.language_name() == language)
            .map(|e| e.as_ref())
    }

    pub fn can_handle(&self, path: &str) -> bool {
        self.extractor_for(path).is_some()
    }

    /// Extract facts for one file.
    ///
    /// `None` means no extractor handles the path, which is not an error.
    pub fn extract(&self, path: &str, text: &str) -> Option<Result<FileFacts, DocgraphError>> {
        self.extractor_for(path).map(|e| e.extract(text, path))
    }

    /// Every registered extension, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
