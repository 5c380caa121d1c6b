//! Build command: analyze the project and persist the reference index.

use docgraph_index::ExtractorRegistry;
use docgraph_xref::Project;

pub(crate) fn cmd_build(project: &Project, registry: &ExtractorRegistry) -> anyhow::Result<()> {
    let analysis = project.build(registry)?;
    let stats = analysis.index.stats();

    println!("Reference index written to {}", project.snapshot_path().display());
    println!(
        "  {} features, {} code files ({} documented), {} import edges",
        stats.features, stats.code_files, stats.documented_code_files, stats.import_edges
    );
    println!(
        "  {} interfaces, {} terms, {} term references",
        stats.interfaces, stats.terms, stats.term_references
    );

    let failures = analysis.scan.failures.len();
    let warnings = analysis.metadata_warnings.len();
    if failures > 0 || warnings > 0 {
        println!(
            "  {failures} file(s) failed extraction, {warnings} metadata warning(s); run `docgraph validate` for details"
        );
    }
    Ok(())
}
