//! Bidirectional-consistency checks over a finished [`ReferenceIndex`].

use crate::index::ReferenceIndex;
use docgraph_core::{Finding, FindingKind, Location, Severity, ValidationReport};
use std::collections::{BTreeMap, BTreeSet};

/// Walks a completed index and reports every relation that lacks its reverse,
/// plus interface coverage problems.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyValidator;

impl ConsistencyValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, index: &ReferenceIndex) -> ValidationReport {
        let mut report = ValidationReport::new();
        check_feature_code(index, &mut report);
        check_imports(index, &mut report);
        check_related(index, &mut report);
        check_interface_links(index, &mut report);
        check_terms(index, &mut report);
        check_providers(index, &mut report);
        check_namespace_coverage(index, &mut report);
        report
    }
}

fn inconsistency(report: &mut ValidationReport, message: String, location: Option<&str>) {
    let mut finding = Finding::new(FindingKind::IndexInconsistency, Severity::Error, message);
    if let Some(file) = location {
        finding = finding.at(Location::file(file));
    }
    report.push(finding);
}

fn feature_location<'i>(index: &'i ReferenceIndex, id: &str) -> Option<&'i str> {
    index.features.get(id).map(|f| f.doc_path.as_str())
}

// ── Relation symmetry ───────────────────────────────────────────────────────

fn check_feature_code(index: &ReferenceIndex, report: &mut ValidationReport) {
    for (id, feature) in &index.features {
        for file in &feature.code_used {
            let listed = index
                .code
                .get(file)
                .is_some_and(|code| code.documented_in.contains(id));
            if !listed {
                inconsistency(
                    report,
                    format!("feature '{id}' uses {file}, but {file} does not list it"),
                    Some(feature.doc_path.as_str()),
                );
            }
        }
    }
    for (file, code) in &index.code {
        for id in &code.documented_in {
            let listed = index
                .features
                .get(id)
                .is_some_and(|feature| feature.code_used.contains(file));
            if !listed {
                inconsistency(
                    report,
                    format!("{file} claims feature '{id}', which does not use it"),
                    Some(file.as_str()),
                );
            }
        }
    }
}

fn check_imports(index: &ReferenceIndex, report: &mut ValidationReport) {
    for (file, code) in &index.code {
        for target in &code.imports {
            let listed = index
                .code
                .get(target)
                .is_some_and(|t| t.imported_by.contains(file));
            if !listed {
                inconsistency(
                    report,
                    format!("{file} imports {target}, but {target} does not list it as importer"),
                    Some(file.as_str()),
                );
            }
        }
        for importer in &code.imported_by {
            let listed = index
                .code
                .get(importer)
                .is_some_and(|i| i.imports.contains(file));
            if !listed {
                inconsistency(
                    report,
                    format!("{file} lists {importer} as importer, but {importer} does not import it"),
                    Some(file.as_str()),
                );
            }
        }
    }
}

fn check_related(index: &ReferenceIndex, report: &mut ValidationReport) {
    for (id, feature) in &index.features {
        for other in &feature.related {
            let symmetric = index
                .features
                .get(other)
                .is_some_and(|o| o.related.contains(id));
            if !symmetric {
                inconsistency(
                    report,
                    format!("feature '{id}' relates to '{other}', but not the other way round"),
                    Some(feature.doc_path.as_str()),
                );
            }
        }
    }
}

fn check_interface_links(index: &ReferenceIndex, report: &mut ValidationReport) {
    for (name, interface) in &index.interfaces {
        for id in &interface.from {
            let declared = index
                .features
                .get(id)
                .is_some_and(|f| f.interfaces_provided.contains(name));
            if !declared {
                inconsistency(
                    report,
                    format!("interface '{name}' lists provider '{id}', which does not provide it"),
                    feature_location(index, id),
                );
            }
        }
        for id in &interface.to {
            let declared = index
                .features
                .get(id)
                .is_some_and(|f| f.interfaces_used.contains(name));
            if !declared {
                inconsistency(
                    report,
                    format!("interface '{name}' lists consumer '{id}', which does not use it"),
                    feature_location(index, id),
                );
            }
        }
    }
    for (id, feature) in &index.features {
        for name in &feature.interfaces_provided {
            if !index.interfaces.get(name).is_some_and(|i| i.from.contains(id)) {
                inconsistency(
                    report,
                    format!("feature '{id}' provides '{name}', but the interface does not list it"),
                    Some(feature.doc_path.as_str()),
                );
            }
        }
        for name in &feature.interfaces_used {
            if !index.interfaces.get(name).is_some_and(|i| i.to.contains(id)) {
                inconsistency(
                    report,
                    format!("feature '{id}' uses '{name}', but the interface does not list it"),
                    Some(feature.doc_path.as_str()),
                );
            }
        }
    }
}

fn check_terms(index: &ReferenceIndex, report: &mut ValidationReport) {
    for (key, term) in &index.terms {
        if term.references.len() != term.usage_count {
            inconsistency(
                report,
                format!(
                    "term '{key}' counts {} uses but lists {} references",
                    term.usage_count,
                    term.references.len()
                ),
                Some(term.file.as_str()),
            );
        }
    }
    for (id, feature) in &index.features {
        for key in feature.terms_used.iter().chain(&feature.terms_defined) {
            if !index.terms.contains_key(key) {
                inconsistency(
                    report,
                    format!("feature '{id}' names term '{key}', which is not in the index"),
                    Some(feature.doc_path.as_str()),
                );
            }
        }
    }
}

// ── Interface coverage ──────────────────────────────────────────────────────

fn check_providers(index: &ReferenceIndex, report: &mut ValidationReport) {
    for (name, interface) in &index.interfaces {
        if interface.from.is_empty() && !interface.to.is_empty() {
            let mut finding = Finding::new(
                FindingKind::MissingProvider,
                Severity::Error,
                format!(
                    "interface '{name}' is used by {} but provided by no feature",
                    join(&interface.to)
                ),
            );
            for id in &interface.to {
                if let Some(path) = feature_location(index, id) {
                    finding = finding.at(Location::file(path));
                }
            }
            report.push(finding);
        }

        let self_referencing: BTreeSet<&String> = interface.from.intersection(&interface.to).collect();
        for id in &self_referencing {
            let mut finding = Finding::new(
                FindingKind::SelfReference,
                Severity::Warning,
                format!("feature '{id}' both provides and uses interface '{name}'"),
            );
            if let Some(path) = feature_location(index, id) {
                finding = finding.at(Location::file(path));
            }
            report.push(finding);
        }

        let consumers = interface
            .to
            .iter()
            .filter(|id| !interface.from.contains(*id))
            .count();
        if !interface.from.is_empty() && consumers == 0 {
            let mut finding = Finding::new(
                FindingKind::UnconsumedInterface,
                Severity::Warning,
                format!(
                    "interface '{name}' is provided by {} but used by no other feature",
                    join(&interface.from)
                ),
            );
            for id in &interface.from {
                if let Some(path) = feature_location(index, id) {
                    finding = finding.at(Location::file(path));
                }
            }
            report.push(finding);
        }
    }
}

/// Namespace of an interface: everything before the last `.`.
fn namespace(name: &str) -> Option<&str> {
    name.rsplit_once('.')
        .map(|(ns, _)| ns)
        .filter(|ns| !ns.is_empty())
}

fn check_namespace_coverage(index: &ReferenceIndex, report: &mut ValidationReport) {
    let mut namespaces: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for name in index.interfaces.keys() {
        if let Some(ns) = namespace(name) {
            namespaces.entry(ns).or_default().insert(name.as_str());
        }
    }

    for (ns, members) in namespaces.iter().filter(|(_, m)| m.len() >= 2) {
        for (id, feature) in &index.features {
            let touched: BTreeSet<&str> = feature
                .interfaces_provided
                .iter()
                .chain(&feature.interfaces_used)
                .map(String::as_str)
                .filter(|name| members.contains(name))
                .collect();
            if touched.is_empty() || touched.len() == members.len() {
                continue;
            }
            let missing: Vec<&str> = members.difference(&touched).copied().collect();
            report.push(
                Finding::new(
                    FindingKind::PartialNamespaceCoverage,
                    Severity::Warning,
                    format!(
                        "feature '{id}' documents {} of {} interfaces in '{ns}'; missing {}",
                        touched.len(),
                        members.len(),
                        missing.join(", ")
                    ),
                )
                .at(Location::file(&feature.doc_path)),
            );
        }
    }
}

fn join(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
