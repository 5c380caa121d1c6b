//! Commands that run a fresh analysis: validate, orphans, terms and graph.

use crate::{print_json, truncate_str};
use colored::Colorize;
use docgraph_core::Severity;
use docgraph_graph::ExternalImport;
use docgraph_index::ExtractorRegistry;
use docgraph_xref::Project;
use std::collections::BTreeMap;

/// Print the validation report. Returns `false` when any error was found.
pub(crate) fn cmd_validate(
    project: &Project,
    registry: &ExtractorRegistry,
    json: bool,
) -> anyhow::Result<bool> {
    let report = project.validate(registry)?;
    if json {
        print_json(&report)?;
        return Ok(report.is_ok());
    }

    for finding in &report.findings {
        let label = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        println!("{label} [{}] {}", finding.kind, finding.message);
        for location in &finding.locations {
            println!("    at {location}");
        }
    }
    if !report.findings.is_empty() {
        println!();
    }

    let errors = report.error_count();
    let warnings = report.warning_count();
    if errors == 0 && warnings == 0 {
        println!("{}", "No problems found.".green().bold());
    } else if errors == 0 {
        println!("{}", format!("{warnings} warning(s)").yellow());
    } else {
        println!(
            "{}",
            format!("{errors} error(s), {warnings} warning(s)").red().bold()
        );
    }
    Ok(report.is_ok())
}

pub(crate) fn cmd_orphans(
    project: &Project,
    registry: &ExtractorRegistry,
    json: bool,
) -> anyhow::Result<()> {
    let analysis = project.analyze(registry)?;
    let report = &analysis.reachability;
    if json {
        return print_json(&report.orphans);
    }

    if report.orphans.is_empty() {
        println!(
            "Every export is reachable from documentation ({} seed file(s), {} reached).",
            report.seeds.len(),
            report.reachable.len()
        );
        return Ok(());
    }

    let mut by_file: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for orphan in &report.orphans {
        by_file.entry(orphan.file.as_str()).or_default().push(orphan);
    }
    for (file, orphans) in &by_file {
        println!("{file}");
        for orphan in orphans {
            println!(
                "  {:<30} {:<10} line {}",
                orphan.name,
                orphan.kind.to_string(),
                orphan.line
            );
        }
    }
    println!(
        "\n{} orphaned export(s) in {} file(s)",
        report.orphans.len(),
        report.orphan_files().len()
    );
    Ok(())
}

pub(crate) fn cmd_terms_search(
    project: &Project,
    registry: &ExtractorRegistry,
    query: &str,
) -> anyhow::Result<()> {
    let analysis = project.analyze(registry)?;
    let matches = analysis.terms.registry.search(query);
    if matches.is_empty() {
        println!("No terms match '{query}'.");
        return Ok(());
    }

    for (i, term) in matches.iter().enumerate() {
        println!(
            "{}. {} [{}] {}:{}",
            i + 1,
            term.name,
            term.kind,
            term.file,
            term.line
        );
        println!("   {}", truncate_str(&term.definition, 120));
    }
    Ok(())
}

pub(crate) fn cmd_terms_list(project: &Project, registry: &ExtractorRegistry) -> anyhow::Result<()> {
    let analysis = project.analyze(registry)?;
    let terms = &analysis.terms;
    if terms.registry.is_empty() {
        println!("No terms defined.");
        return Ok(());
    }

    let mut rows: Vec<_> = terms
        .registry
        .definitions()
        .map(|(id, def)| (def, terms.report.usage_count(id)))
        .collect();
    rows.sort_by(|a, b| a.0.name.cmp(&b.0.name).then_with(|| a.0.file.cmp(&b.0.file)));

    println!("{:<30} {:<10} {:<9} {:>5}  DEFINED AT", "TERM", "KIND", "SCOPE", "USES");
    for (def, uses) in &rows {
        println!(
            "{:<30} {:<10} {:<9} {:>5}  {}:{}",
            def.name,
            def.kind.to_string(),
            def.scope.to_string(),
            uses,
            def.file,
            def.line
        );
    }

    let problems = terms.report.findings.error_count();
    if problems > 0 {
        println!("\n{problems} term error(s); run `docgraph validate` for details");
    }
    Ok(())
}

pub(crate) fn cmd_graph_deps(
    project: &Project,
    registry: &ExtractorRegistry,
    file: &str,
    reverse: bool,
) -> anyhow::Result<()> {
    let analysis = project.analyze(registry)?;
    let graph = &analysis.graph;
    if !graph.contains(file) {
        anyhow::bail!("No source file '{file}' in the project");
    }

    let files = if reverse {
        graph.dependents(file)
    } else {
        graph.dependencies(file)
    };
    let lines = deps_lines(
        file,
        reverse,
        &files,
        graph.external_imports(file),
        graph.unresolved_imports(file),
    );
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// Output of `graph deps` / `graph dependents`. Imports that left the graph
/// are listed only in the forward direction.
fn deps_lines(
    file: &str,
    reverse: bool,
    files: &[&str],
    external: &[ExternalImport],
    unresolved: &[ExternalImport],
) -> Vec<String> {
    let label = if reverse { "imported by" } else { "imports" };
    let (external, unresolved): (&[ExternalImport], &[ExternalImport]) = if reverse {
        (&[], &[])
    } else {
        (external, unresolved)
    };
    if files.is_empty() && external.is_empty() && unresolved.is_empty() {
        return vec![format!("{file} {label} nothing")];
    }

    let mut lines = vec![format!("{file} {label}:")];
    lines.extend(files.iter().map(|f| format!("  {f}")));
    lines.extend(
        external
            .iter()
            .map(|e| format!("  {} (external, line {})", e.specifier, e.line)),
    );
    lines.extend(
        unresolved
            .iter()
            .map(|e| format!("  {} (unresolved, line {})", e.specifier, e.line)),
    );
    lines
}

pub(crate) fn cmd_graph_cycles(project: &Project, registry: &ExtractorRegistry) -> anyhow::Result<()> {
    let analysis = project.analyze(registry)?;
    let cycles = analysis.graph.import_cycles();
    if cycles.is_empty() {
        println!("No import cycles.");
        return Ok(());
    }

    for (i, cycle) in cycles.iter().enumerate() {
        println!("{}. {}", i + 1, cycle.join(" <-> "));
    }
    println!("\n{} cycle(s)", cycles.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(specifier: &str, line: usize) -> ExternalImport {
        ExternalImport {
            specifier: specifier.to_string(),
            line,
        }
    }

    #[test]
    fn deps_lists_packages_without_internal_imports() {
        let lines = deps_lines("src/app.ts", false, &[], &[import("react", 1)], &[]);
        assert_eq!(lines, vec!["src/app.ts imports:", "  react (external, line 1)"]);
    }

    #[test]
    fn deps_lists_dangling_imports_last() {
        let lines = deps_lines(
            "src/app.ts",
            false,
            &["src/util.ts"],
            &[import("zod", 2)],
            &[import("./gone", 3)],
        );
        assert_eq!(
            lines,
            vec![
                "src/app.ts imports:",
                "  src/util.ts",
                "  zod (external, line 2)",
                "  ./gone (unresolved, line 3)",
            ]
        );
    }

    #[test]
    fn dependents_ignore_outgoing_packages() {
        let lines = deps_lines("src/util.ts", true, &[], &[import("react", 1)], &[]);
        assert_eq!(lines, vec!["src/util.ts imported by nothing"]);
    }
}
