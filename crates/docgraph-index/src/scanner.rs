//! Project scanning pipeline.
//!
//! Walks a directory, splits documentation from source files, and runs the
//! registered extractor on every source file. A file that fails to read or
//! parse is recorded and skipped; the scan itself always completes.

use crate::registry::ExtractorRegistry;
use docgraph_core::{
    DocgraphError, FileFacts, FileRole, Finding, FindingKind, Location, ScanConfig, Severity,
    SourceFile,
};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::Path;

/// A documentation file and its raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocFile {
    pub path: String,
    pub content: String,
}

/// A supported file whose facts could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    pub path: String,
    pub message: String,
}

impl ExtractionFailure {
    /// Downgrade to a warning finding.
    pub fn to_finding(&self) -> Finding {
        Finding::new(
            FindingKind::ExtractionFailure,
            Severity::Warning,
            format!("could not extract {}: {}", self.path, self.message),
        )
        .at(Location::file(&self.path))
    }
}

/// Result of scanning a project.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Every file some extractor handles, sorted by path.
    pub sources: Vec<SourceFile>,
    /// Facts for each source file that extracted cleanly.
    pub facts: BTreeMap<String, FileFacts>,
    /// Documentation files, sorted by path.
    pub docs: Vec<DocFile>,
    pub failures: Vec<ExtractionFailure>,
    /// Files neither documentation nor handled by any extractor.
    pub files_skipped: usize,
}

impl ScanResult {
    pub fn source(&self, path: &str) -> Option<&SourceFile> {
        self.sources
            .binary_search_by(|s| s.path.as_str().cmp(path))
            .ok()
            .map(|i| &self.sources[i])
    }

    pub fn total_imports(&self) -> usize {
        self.facts.values().map(|f| f.imports.len()).sum()
    }

    pub fn total_exports(&self) -> usize {
        self.facts.values().map(|f| f.exports.len()).sum()
    }

    /// Extraction failures as warning findings.
    pub fn failure_findings(&self) -> Vec<Finding> {
        self.failures.iter().map(ExtractionFailure::to_finding).collect()
    }
}

/// Walks a project and extracts facts with a given registry.
pub struct ProjectScanner<'a> {
    registry: &'a ExtractorRegistry,
    config: &'a ScanConfig,
}

impl<'a> ProjectScanner<'a> {
    pub fn new(registry: &'a ExtractorRegistry, config: &'a ScanConfig) -> Self {
        Self { registry, config }
    }

    /// Scan a directory tree.
    ///
    /// Walks the directory respecting `.gitignore` rules (via the `ignore`
    /// crate) and skipping hidden entries, which keeps `.docgraph/` out of
    /// the scan.
    pub fn scan(&self, root: &Path) -> Result<ScanResult, DocgraphError> {
        if !root.is_dir() {
            return Err(DocgraphError::NotFound(format!(
                "project root {}",
                root.display()
            )));
        }

        tracing::debug!(
            "Scanning {} for extensions: {}",
            root.display(),
            self.registry.supported_extensions().join(", ")
        );
        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .build();

        let mut files: Vec<(String, Result<String, String>)> = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("Walk error: {}", err);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Some(rel_path) = relative_path(root, entry.path()) else {
                continue;
            };
            if self.config.is_excluded(&rel_path) {
                continue;
            }
            if !self.config.is_doc(&rel_path) && !self.registry.can_handle(&rel_path) {
                files.push((rel_path, Err(String::new())));
                continue;
            }

            let content = std::fs::read(entry.path())
                .map_err(|e| e.to_string())
                .and_then(|bytes| String::from_utf8(bytes).map_err(|_| "not valid UTF-8".to_string()));
            files.push((rel_path, content));
        }

        let result = self.classify(files);
        tracing::info!(
            "Scanned {}: {} sources, {} docs, {} failures, {} imports, {} exports",
            root.display(),
            result.sources.len(),
            result.docs.len(),
            result.failures.len(),
            result.total_imports(),
            result.total_exports(),
        );
        Ok(result)
    }

    /// Scan in-memory files given as `(root-relative path, content)` pairs.
    pub fn scan_files<I, P, C>(&self, files: I) -> ScanResult
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|(path, content)| (path.into(), Ok(content.into())))
            .filter(|(path, _): &(String, _)| !self.config.is_excluded(path))
            .collect();
        self.classify(files)
    }

    fn classify(&self, mut files: Vec<(String, Result<String, String>)>) -> ScanResult {
        files.sort_by(|a, b| a.0.cmp(&b.0));
        let mut result = ScanResult::default();

        for (path, content) in files {
            if self.config.is_doc(&path) {
                match content {
                    Ok(content) => result.docs.push(DocFile { path, content }),
                    Err(message) => {
                        tracing::warn!("Failed to read {}: {}", path, message);
                    }
                }
                continue;
            }

            let Some(extractor) = self.registry.extractor_for(&path) else {
                result.files_skipped += 1;
                continue;
            };

            result.sources.push(SourceFile {
                path: path.clone(),
                language: extractor.language_name().to_string(),
                role: FileRole::detect(&path),
            });

            let outcome = content
                .map_err(|message| DocgraphError::extraction(&path, message))
                .and_then(|text| extractor.extract(&text, &path));

            match outcome {
                Ok(facts) => {
                    tracing::debug!(
                        "Extracted {}: {} imports, {} exports",
                        path,
                        facts.imports.len(),
                        facts.exports.len()
                    );
                    result.facts.insert(path, facts);
                }
                Err(err) => {
                    tracing::warn!("{}", err);
                    let message = match err {
                        DocgraphError::Extraction { message, .. } => message,
                        other => other.to_string(),
                    };
                    result.failures.push(ExtractionFailure { path, message });
                }
            }
        }

        result
    }
}

/// Root-relative path with `/` separators.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
