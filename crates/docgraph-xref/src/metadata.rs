//! Feature-document front matter.

use docgraph_core::DocgraphError;
use serde::{Deserialize, Serialize};

mod patterns {
    use std::sync::LazyLock;

    pub static FRONT_MATTER: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n(?:---|\.\.\.)[ \t]*(?:\r?\n|\z)").unwrap()
    });
}

/// Interfaces a feature offers to, or takes from, other features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceDecl {
    pub provides: Vec<String>,
    pub uses: Vec<String>,
}

/// Structured metadata at the top of a feature document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureMeta {
    /// Defaults to the document's file stem.
    pub id: Option<String>,
    pub title: Option<String>,
    pub entry_point: Option<String>,
    /// Files or directories, relative to the project root.
    pub code_refs: Vec<String>,
    /// Ids of related features. The link is unordered.
    pub related: Vec<String>,
    pub interfaces: InterfaceDecl,
    pub shared_types: Vec<String>,
}

impl FeatureMeta {
    /// Parse the front matter of a markdown document.
    ///
    /// Returns `Ok(None)` when the document has no front matter or the block
    /// is empty; such documents are not features.
    pub fn parse(path: &str, text: &str) -> Result<Option<Self>, DocgraphError> {
        let Some(caps) = patterns::FRONT_MATTER.captures(text) else {
            return Ok(None);
        };
        let yaml = caps.get(1).map_or("", |m| m.as_str());

        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| metadata_error(path, e))?;
        match value {
            serde_yaml::Value::Null => Ok(None),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)
                .map(Some)
                .map_err(|e| metadata_error(path, e)),
            _ => Err(DocgraphError::Metadata {
                path: path.to_string(),
                message: "front matter is not a mapping".to_string(),
            }),
        }
    }

    /// The feature id, falling back to the file stem of `path`.
    pub fn feature_id(&self, path: &str) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => file_stem(path).to_string(),
        }
    }
}

fn metadata_error(path: &str, err: serde_yaml::Error) -> DocgraphError {
    DocgraphError::Metadata {
        path: path.to_string(),
        message: err.to_string(),
    }
}

fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_front_matter() {
        let text = "\
---
id: checkout
title: Checkout flow
entry_point: src/checkout/index.ts
code_refs:
  - src/checkout/cart.ts
  - src/pricing/
related: [payments]
interfaces:
  provides: [orders.create]
  uses: [payments.charge]
shared_types: [Order]
---
# Checkout
";
        let meta = FeatureMeta::parse("docs/checkout.md", text).unwrap().unwrap();
        assert_eq!(meta.feature_id("docs/checkout.md"), "checkout");
        assert_eq!(meta.title.as_deref(), Some("Checkout flow"));
        assert_eq!(meta.entry_point.as_deref(), Some("src/checkout/index.ts"));
        assert_eq!(meta.code_refs, vec!["src/checkout/cart.ts", "src/pricing/"]);
        assert_eq!(meta.related, vec!["payments"]);
        assert_eq!(meta.interfaces.provides, vec!["orders.create"]);
        assert_eq!(meta.interfaces.uses, vec!["payments.charge"]);
        assert_eq!(meta.shared_types, vec!["Order"]);
    }

    #[test]
    fn id_defaults_to_file_stem() {
        let meta = FeatureMeta::parse("docs/features/search.md", "---\ntitle: Search\n---\n")
            .unwrap()
            .unwrap();
        assert_eq!(meta.feature_id("docs/features/search.md"), "search");
    }

    #[test]
    fn documents_without_front_matter_are_not_features() {
        assert_eq!(FeatureMeta::parse("a.md", "# Title\n").unwrap(), None);
        assert_eq!(FeatureMeta::parse("a.md", "---\n# only a comment\n---\n").unwrap(), None);
        assert_eq!(FeatureMeta::parse("a.md", "text\n---\nid: x\n---\n").unwrap(), None);
    }

    #[test]
    fn malformed_yaml_is_a_metadata_error() {
        let err = FeatureMeta::parse("docs/bad.md", "---\nid: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, DocgraphError::Metadata { ref path, .. } if path == "docs/bad.md"));

        let err = FeatureMeta::parse("docs/list.md", "---\n- a\n- b\n---\n").unwrap_err();
        assert!(matches!(err, DocgraphError::Metadata { .. }));

        let err = FeatureMeta::parse("docs/typed.md", "---\ncode_refs: 3\n---\n").unwrap_err();
        assert!(matches!(err, DocgraphError::Metadata { .. }));
    }
}
