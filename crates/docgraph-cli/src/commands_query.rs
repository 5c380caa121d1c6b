//! Query commands: read entries from the persisted reference index.

use crate::{join_or_dash, print_json, truncate_str};
use docgraph_xref::{Project, ReferenceIndex};

fn load(project: &Project) -> anyhow::Result<ReferenceIndex> {
    project.load_index().map_err(|e| {
        anyhow::anyhow!("{e}; run `docgraph build` to create the reference index")
    })
}

pub(crate) fn cmd_query_feature(project: &Project, id: &str, json: bool) -> anyhow::Result<()> {
    let index = load(project)?;
    let Some(feature) = index.feature(id) else {
        anyhow::bail!("No feature with id '{id}'");
    };
    if json {
        return print_json(feature);
    }

    println!("Feature: {id}");
    if let Some(title) = &feature.title {
        println!("  Title:        {title}");
    }
    println!("  Document:     {}", feature.doc_path);
    if let Some(entry) = &feature.entry_point {
        println!("  Entry point:  {entry}");
    }
    println!("  Code:         {}", join_or_dash(&feature.code_used));
    println!("  Reached code: {}", feature.code_used_by.len());
    println!("  Related:      {}", join_or_dash(&feature.related));
    println!("  Provides:     {}", join_or_dash(&feature.interfaces_provided));
    println!("  Uses:         {}", join_or_dash(&feature.interfaces_used));
    println!("  Terms:        {}", join_or_dash(&feature.terms_defined));
    Ok(())
}

pub(crate) fn cmd_query_code(project: &Project, path: &str, json: bool) -> anyhow::Result<()> {
    let index = load(project)?;
    let Some(code) = index.code(path) else {
        anyhow::bail!("No source file '{path}' in the reference index");
    };
    if json {
        return print_json(code);
    }

    println!("{path} ({}, {})", code.language, code.role);
    println!("  Documented in: {}", join_or_dash(&code.documented_in));
    println!("  Imports:       {}", join_or_dash(&code.imports));
    println!("  Imported by:   {}", join_or_dash(&code.imported_by));
    println!("  External:      {}", join_or_dash(&code.external_imports));
    if code.exports.is_empty() {
        println!("  Exports:       -");
    } else {
        println!("  Exports:");
        for export in &code.exports {
            let default = if export.is_default { " (default)" } else { "" };
            println!(
                "    {:<30} {:<10} line {}{default}",
                export.name,
                export.kind.to_string(),
                export.line
            );
        }
    }
    Ok(())
}

pub(crate) fn cmd_query_interface(project: &Project, name: &str, json: bool) -> anyhow::Result<()> {
    let index = load(project)?;
    let Some(interface) = index.interface(name) else {
        anyhow::bail!("No interface named '{name}'");
    };
    if json {
        return print_json(interface);
    }

    println!("Interface: {name}");
    println!("  Provided by:  {}", join_or_dash(&interface.from));
    println!("  Used by:      {}", join_or_dash(&interface.to));
    println!("  Shared types: {}", join_or_dash(&interface.shared_types));
    Ok(())
}

pub(crate) fn cmd_query_term(project: &Project, name: &str, json: bool) -> anyhow::Result<()> {
    let index = load(project)?;
    let Some((key, term)) = index.term(name) else {
        anyhow::bail!("No term named '{name}'");
    };
    if json {
        return print_json(term);
    }

    println!("{} [{}, {}]", term.name, term.kind, term.scope);
    println!("  Key:        {key}");
    println!("  Defined at: {}:{}", term.file, term.line);
    if !term.aliases.is_empty() {
        println!("  Aliases:    {}", term.aliases.join(", "));
    }
    if !term.related.is_empty() {
        println!("  Related:    {}", term.related.join(", "));
    }
    println!("  {}", truncate_str(&term.definition, 200));
    println!("  Used {} time(s)", term.usage_count);
    for reference in &term.references {
        println!("    {}:{}", reference.file, reference.line);
    }
    Ok(())
}

pub(crate) fn cmd_stats(project: &Project, json: bool) -> anyhow::Result<()> {
    let index = load(project)?;
    let stats = index.stats();
    if json {
        return print_json(&stats);
    }

    println!("Reference index (generated {})", index.generated_at.to_rfc3339());
    println!("  Features:              {}", stats.features);
    println!("  Code files:            {}", stats.code_files);
    println!("  Documented code files: {}", stats.documented_code_files);
    println!("  Import edges:          {}", stats.import_edges);
    println!("  Exports:               {}", stats.exports);
    println!("  Interfaces:            {}", stats.interfaces);
    println!("  Terms:                 {}", stats.terms);
    println!("  Term references:       {}", stats.term_references);
    println!("  External dependencies: {}", stats.external_dependencies);
    Ok(())
}
