//! Aggregated validation results.
//!
//! Consistency problems are collected as [`Finding`]s rather than returned as
//! errors, so one validation run reports everything it found.

use serde::{Deserialize, Serialize};

use crate::DocgraphError;

/// How a finding affects the outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Configured severity of a validation rule; `Off` disables the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleLevel {
    Error,
    Warning,
    Off,
}

impl RuleLevel {
    /// The severity findings of this rule are reported with, if enabled.
    pub fn severity(self) -> Option<Severity> {
        match self {
            Self::Error => Some(Severity::Error),
            Self::Warning => Some(Severity::Warning),
            Self::Off => None,
        }
    }
}

impl std::str::FromStr for RuleLevel {
    type Err = DocgraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "off" => Ok(Self::Off),
            _ => Err(DocgraphError::InvalidSeverity(s.to_string())),
        }
    }
}

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A supported file that could not be parsed.
    ExtractionFailure,
    /// Front matter that could not be read.
    MalformedMetadata,
    /// Two global definitions of one name, or an alias claimed twice.
    TermConflict,
    /// A reference to a term nobody defines.
    UndefinedTerm,
    /// A document-scope term referenced from another file.
    ScopeViolation,
    /// A definition no document refers to.
    UnusedDefinition,
    /// A cycle through `related` links.
    CircularReference,
    /// A forward relation in the index without its reverse.
    IndexInconsistency,
    /// An interface used by a feature but provided by none.
    MissingProvider,
    /// An interface provided but used by no other feature.
    UnconsumedInterface,
    /// A feature that provides and uses the same interface.
    SelfReference,
    /// A feature documenting only part of an interface namespace.
    PartialNamespaceCoverage,
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ExtractionFailure => "extraction-failure",
            Self::MalformedMetadata => "malformed-metadata",
            Self::TermConflict => "term-conflict",
            Self::UndefinedTerm => "undefined-term",
            Self::ScopeViolation => "scope-violation",
            Self::UnusedDefinition => "unused-definition",
            Self::CircularReference => "circular-reference",
            Self::IndexInconsistency => "index-inconsistency",
            Self::MissingProvider => "missing-provider",
            Self::UnconsumedInterface => "unconsumed-interface",
            Self::SelfReference => "self-reference",
            Self::PartialNamespaceCoverage => "partial-namespace-coverage",
        };
        f.write_str(name)
    }
}

/// A place in the project a finding points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }

    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.file, line),
            None => write!(f, "{}", self.file),
        }
    }
}

/// One problem found by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
}

impl Finding {
    pub fn new(kind: FindingKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            locations: Vec::new(),
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.kind, self.message)?;
        for location in &self.locations {
            write!(f, "\n    at {location}")?;
        }
        Ok(())
    }
}

/// Every finding produced by one or more validators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Record a finding for a rule unless the rule is switched off.
    pub fn push_rule(
        &mut self,
        level: RuleLevel,
        kind: FindingKind,
        message: impl Into<String>,
        locations: Vec<Location>,
    ) {
        if let Some(severity) = level.severity() {
            self.findings.push(Finding {
                kind,
                severity,
                message: message.into(),
                locations,
            });
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.findings.extend(other.findings);
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    /// True when no finding is an error.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    pub fn count_of(&self, kind: FindingKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Errors first, then by kind, then by message.
    pub fn sort(&mut self) {
        self.findings.sort_by(|a, b| {
            (a.severity, a.kind, &a.message).cmp(&(b.severity, b.kind, &b.message))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_by_severity() {
        let mut report = ValidationReport::new();
        report.push(Finding::new(
            FindingKind::UndefinedTerm,
            Severity::Error,
            "no definition for Foo",
        ));
        report.push(Finding::new(
            FindingKind::UnusedDefinition,
            Severity::Warning,
            "Bar is never referenced",
        ));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(!report.is_ok());
    }

    #[test]
    fn push_rule_respects_off() {
        let mut report = ValidationReport::new();
        report.push_rule(RuleLevel::Off, FindingKind::ScopeViolation, "x", vec![]);
        assert!(report.findings.is_empty());
        report.push_rule(RuleLevel::Warning, FindingKind::ScopeViolation, "x", vec![]);
        assert_eq!(report.warning_count(), 1);
        assert!(report.is_ok());
    }

    #[test]
    fn sort_puts_errors_first() {
        let mut report = ValidationReport::new();
        report.push(Finding::new(FindingKind::UnusedDefinition, Severity::Warning, "b"));
        report.push(Finding::new(FindingKind::TermConflict, Severity::Error, "a"));
        report.sort();
        assert_eq!(report.findings[0].severity, Severity::Error);
    }

    #[test]
    fn finding_display_lists_locations() {
        let finding = Finding::new(FindingKind::TermConflict, Severity::Error, "Gadget")
            .at(Location::new("docs/a.md", 3))
            .at(Location::file("docs/b.md"));
        let text = finding.to_string();
        assert!(text.contains("docs/a.md:3"));
        assert!(text.contains("docs/b.md"));
        assert!(text.starts_with("error [term-conflict]"));
    }

    #[test]
    fn rule_level_parses() {
        assert_eq!("warn".parse::<RuleLevel>().unwrap(), RuleLevel::Warning);
        assert_eq!("OFF".parse::<RuleLevel>().unwrap(), RuleLevel::Off);
        assert!("fatal".parse::<RuleLevel>().is_err());
    }
}
