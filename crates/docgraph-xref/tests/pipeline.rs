use docgraph_core::{DocgraphConfig, FindingKind, Severity};
use docgraph_index::ExtractorRegistry;
use docgraph_xref::{Project, ReferenceIndex};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small shop: checkout documents `b.ts`, which imports `a.ts`; `c.ts` is
/// imported by nothing and documented nowhere.
fn shop() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(root, "src/a.ts", "export class Foo {}\n");
    write(
        root,
        "src/b.ts",
        "import { Foo } from './a';\nimport { z } from 'zod';\nexport function checkout() { return new Foo(); }\n",
    );
    write(root, "src/c.ts", "export const Bar = 1;\n");
    write(root, "src/orders/index.ts", "export interface Order { id: string }\n");

    write(
        root,
        "docs/glossary.md",
        "# Glossary\n\n### [[Widget]]\n- aliases: gizmo\nA thing on the shelf.\n",
    );
    write(
        root,
        "docs/checkout.md",
        "---\nid: checkout\ntitle: Checkout\ncode_refs: [src/b.ts]\nrelated: [orders]\ninterfaces:\n  uses: [orders.create]\n---\n# Checkout\n\nBuys a [[Widget]].\n",
    );
    write(
        root,
        "docs/orders.md",
        "---\ntitle: Orders\nentry_point: src/orders/\ninterfaces:\n  provides: [orders.create]\nshared_types: [Order]\n---\n# Orders\n\nEach order holds a [[gizmo]].\n",
    );
    dir
}

#[test]
fn transitive_reachability_decides_orphans() {
    let dir = shop();
    let registry = ExtractorRegistry::with_defaults();
    let project = Project::new(dir.path(), DocgraphConfig::default());
    let analysis = project.analyze(&registry).unwrap();

    let orphans: Vec<_> = analysis
        .reachability
        .orphans
        .iter()
        .map(|o| (o.file.as_str(), o.name.as_str()))
        .collect();
    assert!(!orphans.contains(&("src/a.ts", "Foo")));
    assert_eq!(orphans, vec![("src/c.ts", "Bar")]);
}

#[test]
fn index_links_features_code_interfaces_and_terms() {
    let dir = shop();
    let registry = ExtractorRegistry::with_defaults();
    let analysis = Project::new(dir.path(), DocgraphConfig::default())
        .analyze(&registry)
        .unwrap();
    let index = &analysis.index;

    let checkout = index.feature("checkout").unwrap();
    assert_eq!(checkout.doc_path, "docs/checkout.md");
    assert!(checkout.code_used.contains("src/b.ts"));
    assert!(checkout.related.contains("orders"));
    assert!(checkout.terms_used.contains("Widget"));

    let orders = index.feature("orders").unwrap();
    assert!(orders.code_used.contains("src/orders/index.ts"));
    assert!(orders.related.contains("checkout"));

    let b = index.code("src/b.ts").unwrap();
    assert!(b.documented_in.contains("checkout"));
    assert!(b.imports.contains("src/a.ts"));
    assert!(b.external_imports.contains("zod"));
    assert!(index.code("src/a.ts").unwrap().imported_by.contains("src/b.ts"));

    let create = index.interface("orders.create").unwrap();
    assert!(create.from.contains("orders"));
    assert!(create.to.contains("checkout"));
    assert!(create.shared_types.contains("Order"));

    let (key, widget) = index.term("gizmo").unwrap();
    assert_eq!(key, "Widget");
    assert_eq!(widget.usage_count, 2);

    assert!(index.external_dependencies["zod"].contains("src/b.ts"));
    let report = analysis.validate();
    assert_eq!(report.count_of(FindingKind::IndexInconsistency), 0);
    assert_eq!(report.count_of(FindingKind::MissingProvider), 0);
    assert!(report.is_ok(), "{:#?}", report.findings);
}

#[test]
fn snapshot_round_trip_preserves_keys_and_counts() {
    let dir = shop();
    let registry = ExtractorRegistry::with_defaults();
    let project = Project::new(dir.path(), DocgraphConfig::default());
    let built = project.build(&registry).unwrap().index;

    assert!(project.snapshot_path().ends_with(".docgraph/index.json"));
    let loaded = project.load_index().unwrap();

    assert!(built.features.keys().eq(loaded.features.keys()));
    assert!(built.code.keys().eq(loaded.code.keys()));
    assert!(built.interfaces.keys().eq(loaded.interfaces.keys()));
    assert!(built.terms.keys().eq(loaded.terms.keys()));
    assert_eq!(built.stats(), loaded.stats());
    assert_eq!(built, loaded);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(project.snapshot_path()).unwrap()).unwrap();
    for section in ["version", "generated_at", "features", "code", "interfaces", "terms"] {
        assert!(raw.get(section).is_some(), "missing section {section}");
    }
}

#[test]
fn rebuilding_does_not_rescan_the_snapshot_directory() {
    let dir = shop();
    let registry = ExtractorRegistry::with_defaults();
    let project = Project::new(dir.path(), DocgraphConfig::default());
    let first = project.build(&registry).unwrap().index;
    let second = project.build(&registry).unwrap().index;
    assert_eq!(first.stats(), second.stats());
}

#[test]
fn problems_are_collected_into_one_report() {
    let dir = shop();
    write(dir.path(), "src/broken.ts", "export class {{{\n");
    write(dir.path(), "docs/bad.md", "---\nid: [oops\n---\nUses [[Sprocket]].\n");
    write(
        dir.path(),
        "docs/billing.md",
        "---\ninterfaces:\n  uses: [payments.charge]\ncode_refs: [src/nowhere.ts]\n---\n",
    );

    let registry = ExtractorRegistry::with_defaults();
    let report = Project::new(dir.path(), DocgraphConfig::default())
        .validate(&registry)
        .unwrap();

    let failure = report.of_kind(FindingKind::ExtractionFailure).next().unwrap();
    assert_eq!(failure.severity, Severity::Warning);
    assert_eq!(report.count_of(FindingKind::MalformedMetadata), 2);
    assert_eq!(report.count_of(FindingKind::UndefinedTerm), 1);
    assert_eq!(report.count_of(FindingKind::MissingProvider), 1);
    assert_eq!(report.error_count(), 2);
    assert_eq!(report.findings[0].severity, Severity::Error);
}

#[test]
fn missing_snapshot_is_reported() {
    let dir = TempDir::new().unwrap();
    let project = Project::new(dir.path(), DocgraphConfig::default());
    assert!(project.load_index().is_err());
    assert!(ReferenceIndex::load(&project.snapshot_path()).is_err());
}
