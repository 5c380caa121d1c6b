//! Term validation rules.
//!
//! Each rule reports at the severity configured in [`TermRules`]; a rule set
//! to `off` reports nothing. All problems are collected into one report.

use crate::registry::{ConflictKind, TermId, TermLookup, TermRegistry};
use docgraph_core::{FindingKind, Location, TermReference, TermRules, ValidationReport};
use std::collections::{HashMap, HashSet};

/// Outcome of validating a set of references against a registry.
#[derive(Debug, Clone, Default)]
pub struct TermReport {
    pub findings: ValidationReport,
    /// Every reference, with `canonical` filled in when it resolved.
    pub references: Vec<TermReference>,
    /// Related-term cycles, each rotated to start at its smallest name.
    pub cycles: Vec<Vec<String>>,
    usage: HashMap<TermId, Vec<usize>>,
}

impl TermReport {
    /// Number of references that resolved to a definition.
    pub fn usage_count(&self, id: TermId) -> usize {
        self.usage.get(&id).map_or(0, Vec::len)
    }

    /// Every resolved reference paired with the definition it names.
    pub fn resolved(&self) -> impl Iterator<Item = (TermId, &TermReference)> {
        self.usage
            .iter()
            .flat_map(move |(&id, refs)| refs.iter().map(move |&i| (id, &self.references[i])))
    }

    /// References that resolved to a definition, in input order.
    pub fn references_to(&self, id: TermId) -> impl Iterator<Item = &TermReference> {
        self.usage
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.references[i])
    }
}

/// Checks uniqueness, completeness, scope, acyclicity and liveness.
#[derive(Debug, Clone, Copy)]
pub struct TermValidator {
    rules: TermRules,
}

impl TermValidator {
    pub fn new(rules: TermRules) -> Self {
        Self { rules }
    }

    pub fn validate(&self, registry: &TermRegistry, references: Vec<TermReference>) -> TermReport {
        let mut report = TermReport {
            references,
            ..TermReport::default()
        };

        self.check_uniqueness(registry, &mut report);
        self.check_references(registry, &mut report);
        self.check_related(registry, &mut report);
        self.check_cycles(registry, &mut report);
        self.check_liveness(registry, &mut report);

        tracing::debug!(
            "Term validation: {} definitions, {} references, {} findings",
            registry.len(),
            report.references.len(),
            report.findings.findings.len()
        );
        report
    }

    fn check_uniqueness(&self, registry: &TermRegistry, report: &mut TermReport) {
        for conflict in registry.conflicts() {
            let message = match conflict.kind {
                ConflictKind::Definition => format!(
                    "term [[{}]] is defined twice with different text",
                    conflict.name
                ),
                ConflictKind::Alias => format!(
                    "name or alias '{}' refers to more than one term",
                    conflict.name
                ),
            };
            report.findings.push_rule(
                self.rules.uniqueness,
                FindingKind::TermConflict,
                message,
                vec![conflict.first.clone(), conflict.second.clone()],
            );
        }
    }

    fn check_references(&self, registry: &TermRegistry, report: &mut TermReport) {
        for (idx, reference) in report.references.iter_mut().enumerate() {
            let location = Location::new(&reference.file, reference.line);
            match registry.resolve_in(&reference.text, &reference.file) {
                TermLookup::Found(id) => {
                    reference.canonical = Some(registry.definition(id).name.clone());
                    report.usage.entry(id).or_default().push(idx);
                }
                TermLookup::OutOfScope(id) => {
                    let def = registry.definition(id);
                    reference.canonical = Some(def.name.clone());
                    report.usage.entry(id).or_default().push(idx);
                    report.findings.push_rule(
                        self.rules.scope,
                        FindingKind::ScopeViolation,
                        format!(
                            "[[{}]] is document-scoped to {} and not visible here",
                            reference.text, def.file
                        ),
                        vec![location, Location::new(&def.file, def.line)],
                    );
                }
                TermLookup::Undefined => {
                    report.findings.push_rule(
                        self.rules.completeness,
                        FindingKind::UndefinedTerm,
                        format!("[[{}]] is not defined", reference.text),
                        vec![location],
                    );
                }
            }
        }
    }

    fn check_related(&self, registry: &TermRegistry, report: &mut TermReport) {
        for (_, def) in registry.definitions() {
            for related in &def.related {
                let location = Location::new(&def.file, def.line);
                match registry.resolve_in(related, &def.file) {
                    TermLookup::Found(_) => {}
                    TermLookup::OutOfScope(id) => {
                        let target = registry.definition(id);
                        report.findings.push_rule(
                            self.rules.scope,
                            FindingKind::ScopeViolation,
                            format!(
                                "[[{}]] relates to [[{}]], which is document-scoped to {}",
                                def.name, related, target.file
                            ),
                            vec![location],
                        );
                    }
                    TermLookup::Undefined => {
                        report.findings.push_rule(
                            self.rules.completeness,
                            FindingKind::UndefinedTerm,
                            format!("[[{}]] relates to undefined [[{}]]", def.name, related),
                            vec![location],
                        );
                    }
                }
            }
        }
    }

    fn check_cycles(&self, registry: &TermRegistry, report: &mut TermReport) {
        let cycles = related_cycles(registry);
        for cycle in &cycles {
            let names: Vec<&str> = cycle
                .iter()
                .map(|&id| registry.definition(id).name.as_str())
                .collect();
            let locations = cycle
                .iter()
                .map(|&id| {
                    let def = registry.definition(id);
                    Location::new(&def.file, def.line)
                })
                .collect();
            let mut path = names.join(" -> ");
            path.push_str(" -> ");
            path.push_str(names[0]);
            report.findings.push_rule(
                self.rules.acyclicity,
                FindingKind::CircularReference,
                format!("circular related terms: {path}"),
                locations,
            );
            report
                .cycles
                .push(names.into_iter().map(str::to_string).collect());
        }
    }

    fn check_liveness(&self, registry: &TermRegistry, report: &mut TermReport) {
        for (id, def) in registry.definitions() {
            if report.usage_count(id) == 0 {
                report.findings.push_rule(
                    self.rules.liveness,
                    FindingKind::UnusedDefinition,
                    format!("[[{}]] is defined but never referenced", def.name),
                    vec![Location::new(&def.file, def.line)],
                );
            }
        }
    }
}

// ── Cycle detection ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Resolved `related` targets of every definition, indexed by [`TermId`].
/// Each target appears once per source, in declaration order.
fn related_edges(registry: &TermRegistry) -> Vec<Vec<TermId>> {
    registry
        .definitions()
        .map(|(_, def)| {
            let mut seen = HashSet::new();
            def.related
                .iter()
                .filter_map(|name| match registry.resolve_in(name, &def.file) {
                    TermLookup::Found(id) => Some(id),
                    _ => None,
                })
                .filter(|id| seen.insert(*id))
                .collect()
        })
        .collect()
}

/// Cycles in the related-term graph.
///
/// Depth-first search keeping the current path as an explicit stack. An edge
/// back into the stack closes a cycle; edges into finished nodes are ignored,
/// so shared descendants (diamonds) are never reported. Each cycle is rotated
/// to start at its smallest name and reported once.
fn related_cycles(registry: &TermRegistry) -> Vec<Vec<TermId>> {
    let edges = related_edges(registry);

    let mut marks = vec![Mark::Unvisited; edges.len()];
    let mut seen: HashSet<Vec<TermId>> = HashSet::new();
    let mut cycles = Vec::new();

    for (start, _) in registry.definitions() {
        if marks[start.index()] != Mark::Unvisited {
            continue;
        }
        visit(start, &edges, &mut marks, &mut |cycle: &[TermId]| {
            let rotated = rotate_to_smallest(cycle, registry);
            if seen.insert(rotated.clone()) {
                cycles.push(rotated);
            }
        });
    }

    cycles.sort_by_key(|cycle| {
        cycle
            .iter()
            .map(|&id| registry.definition(id).name.to_lowercase())
            .collect::<Vec<_>>()
    });
    cycles
}

/// Iterative DFS from `start`. `work` holds each open node with the index of
/// its next unexplored edge; `path` mirrors the open nodes for cycle slices.
fn visit(
    start: TermId,
    edges: &[Vec<TermId>],
    marks: &mut [Mark],
    on_cycle: &mut dyn FnMut(&[TermId]),
) {
    let mut work: Vec<(TermId, usize)> = vec![(start, 0)];
    let mut path: Vec<TermId> = vec![start];
    marks[start.index()] = Mark::OnStack;

    while let Some(frame) = work.last_mut() {
        let (node, edge) = *frame;
        let Some(&next) = edges[node.index()].get(edge) else {
            work.pop();
            path.pop();
            marks[node.index()] = Mark::Done;
            continue;
        };
        frame.1 += 1;

        match marks[next.index()] {
            Mark::Unvisited => {
                marks[next.index()] = Mark::OnStack;
                work.push((next, 0));
                path.push(next);
            }
            Mark::OnStack => {
                if let Some(pos) = path.iter().position(|&id| id == next) {
                    on_cycle(&path[pos..]);
                }
            }
            Mark::Done => {}
        }
    }
}

fn rotate_to_smallest(cycle: &[TermId], registry: &TermRegistry) -> Vec<TermId> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| registry.definition(**id).name.to_lowercase())
        .map_or(0, |(pos, _)| pos);
    let mut rotated = cycle.to_vec();
    rotated.rotate_left(start);
    rotated
}
