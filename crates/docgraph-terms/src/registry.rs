//! Term registry: canonical names, aliases and scopes.
//!
//! Definitions live in one arena addressed by [`TermId`]. Lookups are
//! case-insensitive and go through per-scope name and alias tables: one
//! global table plus one table per defining document.

use docgraph_core::{Location, TermDefinition, TermScope};
use std::collections::{BTreeMap, HashMap};

/// Stable handle to a definition in a [`TermRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(usize);

impl TermId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Two definitions competing for one name in the same scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermConflict {
    /// The contested name or alias, as written by the second definition.
    pub name: String,
    pub kind: ConflictKind,
    pub first: Location,
    pub second: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// Same canonical name with different definition text.
    Definition,
    /// An alias claimed by two canonicals, or shadowing another canonical name.
    Alias,
}

/// Result of looking a name up from a particular document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermLookup {
    /// Visible from the asking document.
    Found(TermId),
    /// Only defined with document scope in some other file.
    OutOfScope(TermId),
    Undefined,
}

#[derive(Debug, Default)]
struct NameTable {
    names: HashMap<String, TermId>,
    aliases: HashMap<String, TermId>,
}

impl NameTable {
    fn get(&self, key: &str) -> Option<TermId> {
        self.names
            .get(key)
            .or_else(|| self.aliases.get(key))
            .copied()
    }
}

/// All term definitions of a project.
#[derive(Debug, Default)]
pub struct TermRegistry {
    definitions: Vec<TermDefinition>,
    global: NameTable,
    documents: BTreeMap<String, NameTable>,
    conflicts: Vec<TermConflict>,
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl TermRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = TermDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.insert(definition);
        }
        registry
    }

    /// Register a definition.
    ///
    /// A repeated name in the same scope keeps the first definition. The
    /// repeat is recorded as a conflict when its text differs. Returns the
    /// id the name resolves to.
    pub fn insert(&mut self, definition: TermDefinition) -> TermId {
        let name_key = key(&definition.name);
        let table = match definition.scope {
            TermScope::Global => &mut self.global,
            TermScope::Document => self.documents.entry(definition.file.clone()).or_default(),
        };

        if let Some(existing) = table.names.get(&name_key).copied() {
            let first = &self.definitions[existing.0];
            if first.definition != definition.definition {
                self.conflicts.push(TermConflict {
                    name: definition.name.clone(),
                    kind: ConflictKind::Definition,
                    first: Location::new(&first.file, first.line),
                    second: Location::new(&definition.file, definition.line),
                });
            }
            tracing::debug!(
                "Duplicate term definition '{}' at {}:{}",
                definition.name,
                definition.file,
                definition.line
            );
            return existing;
        }

        let id = TermId(self.definitions.len());
        let mut conflicts = Vec::new();

        if let Some(other) = table.aliases.remove(&name_key) {
            conflicts.push((definition.name.clone(), other));
        }
        table.names.insert(name_key.clone(), id);

        for alias in &definition.aliases {
            let alias_key = key(alias);
            if alias_key == name_key {
                continue;
            }
            match table.get(&alias_key) {
                Some(other) if other != id => conflicts.push((alias.clone(), other)),
                Some(_) => {}
                None => {
                    table.aliases.insert(alias_key, id);
                }
            }
        }

        for (name, other) in conflicts {
            let first = &self.definitions[other.0];
            self.conflicts.push(TermConflict {
                name,
                kind: ConflictKind::Alias,
                first: Location::new(&first.file, first.line),
                second: Location::new(&definition.file, definition.line),
            });
        }

        self.definitions.push(definition);
        id
    }

    pub fn definition(&self, id: TermId) -> &TermDefinition {
        &self.definitions[id.0]
    }

    /// Every registered definition in insertion order.
    pub fn definitions(&self) -> impl Iterator<Item = (TermId, &TermDefinition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (TermId(i), def))
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn conflicts(&self) -> &[TermConflict] {
        &self.conflicts
    }

    /// Canonical name of a global term or alias.
    ///
    /// Resolving an alias yields its canonical name; resolving a canonical
    /// name yields itself.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.global
            .get(&key(name))
            .map(|id| self.definitions[id.0].name.as_str())
    }

    /// Look a name up as seen from `file`.
    ///
    /// The file's own document-scope terms shadow global ones. A name found
    /// only in another file's document scope is reported as out of scope.
    pub fn resolve_in(&self, name: &str, file: &str) -> TermLookup {
        let name_key = key(name);
        if let Some(id) = self.documents.get(file).and_then(|t| t.get(&name_key)) {
            return TermLookup::Found(id);
        }
        if let Some(id) = self.global.get(&name_key) {
            return TermLookup::Found(id);
        }
        self.documents
            .iter()
            .filter(|(other, _)| other.as_str() != file)
            .find_map(|(_, table)| table.get(&name_key))
            .map_or(TermLookup::Undefined, TermLookup::OutOfScope)
    }

    /// Case-insensitive fuzzy search.
    ///
    /// Ranks exact name matches first, then exact aliases, then name or alias
    /// substrings, then definition-text substrings. Ties are ordered by name.
    pub fn search(&self, query: &str) -> Vec<&TermDefinition> {
        let needle = key(query);
        if needle.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<(u8, &TermDefinition)> = self
            .definitions
            .iter()
            .filter_map(|def| search_rank(def, &needle).map(|rank| (rank, def)))
            .collect();

        ranked.sort_by(|(ra, a), (rb, b)| {
            ra.cmp(rb)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
                .then_with(|| a.file.cmp(&b.file))
        });
        ranked.into_iter().map(|(_, def)| def).collect()
    }
}

fn search_rank(def: &TermDefinition, needle: &str) -> Option<u8> {
    let name = def.name.to_lowercase();
    let aliases: Vec<String> = def.aliases.iter().map(|a| a.to_lowercase()).collect();

    if name == needle {
        Some(0)
    } else if aliases.iter().any(|a| a == needle) {
        Some(1)
    } else if name.contains(needle) || aliases.iter().any(|a| a.contains(needle)) {
        Some(2)
    } else if def.definition.to_lowercase().contains(needle) {
        Some(3)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docgraph_core::TermKind;

    fn term(name: &str, scope: TermScope, file: &str, aliases: &[&str], text: &str) -> TermDefinition {
        TermDefinition {
            name: name.to_string(),
            id: docgraph_core::slugify(name),
            kind: TermKind::Concept,
            scope,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            related: Vec::new(),
            definition: text.to_string(),
            file: file.to_string(),
            line: 1,
        }
    }

    #[test]
    fn aliases_resolve_to_canonical_and_canonical_to_itself() {
        let registry = TermRegistry::from_definitions([
            term("Widget", TermScope::Global, "g.md", &["gizmo", "Doohickey"], "A part."),
            term("Gadget", TermScope::Global, "g.md", &["device"], "A tool."),
        ]);

        for (_, def) in registry.definitions() {
            assert_eq!(registry.resolve(&def.name), Some(def.name.as_str()));
            for alias in &def.aliases {
                assert_eq!(registry.resolve(alias), Some(def.name.as_str()));
            }
        }
        assert_eq!(registry.resolve("GIZMO"), Some("Widget"));
        assert_eq!(registry.resolve("nothing"), None);
        assert!(registry.conflicts().is_empty());
    }

    #[test]
    fn differing_global_redefinition_conflicts() {
        let registry = TermRegistry::from_definitions([
            term("Gadget", TermScope::Global, "a.md", &[], "One thing."),
            term("Gadget", TermScope::Global, "b.md", &[], "Another thing."),
        ]);
        assert_eq!(registry.len(), 1);
        let conflicts = registry.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::Definition);
        assert_eq!(conflicts[0].first.file, "a.md");
        assert_eq!(conflicts[0].second.file, "b.md");
    }

    #[test]
    fn identical_redefinition_is_not_a_conflict() {
        let registry = TermRegistry::from_definitions([
            term("Gadget", TermScope::Global, "a.md", &[], "Same."),
            term("gadget", TermScope::Global, "b.md", &[], "Same."),
        ]);
        assert!(registry.conflicts().is_empty());
    }

    #[test]
    fn alias_claimed_twice_conflicts() {
        let registry = TermRegistry::from_definitions([
            term("Widget", TermScope::Global, "g.md", &["thing"], "A."),
            term("Gadget", TermScope::Global, "g.md", &["thing"], "B."),
        ]);
        assert_eq!(registry.conflicts().len(), 1);
        assert_eq!(registry.conflicts()[0].kind, ConflictKind::Alias);
        assert_eq!(registry.resolve("thing"), Some("Widget"));
    }

    #[test]
    fn document_scope_shadows_only_in_its_file() {
        let registry = TermRegistry::from_definitions([
            term("Widget", TermScope::Global, "glossary.md", &[], "Global."),
            term("Widget", TermScope::Document, "a.md", &[], "Local."),
            term("Secret", TermScope::Document, "a.md", &[], "Hidden."),
        ]);
        assert!(registry.conflicts().is_empty());

        let TermLookup::Found(local) = registry.resolve_in("widget", "a.md") else {
            panic!("expected a local match");
        };
        assert_eq!(registry.definition(local).definition, "Local.");

        let TermLookup::Found(global) = registry.resolve_in("Widget", "b.md") else {
            panic!("expected a global match");
        };
        assert_eq!(registry.definition(global).definition, "Global.");

        assert!(matches!(
            registry.resolve_in("Secret", "b.md"),
            TermLookup::OutOfScope(_)
        ));
        assert_eq!(registry.resolve_in("Nope", "b.md"), TermLookup::Undefined);
        assert_eq!(registry.resolve("Secret"), None);
        assert!(matches!(
            registry.resolve_in("secret", "a.md"),
            TermLookup::Found(_)
        ));
    }

    #[test]
    fn search_ranks_name_alias_substring_then_text() {
        let registry = TermRegistry::from_definitions([
            term("Cache Entry", TermScope::Global, "g.md", &[], "Stored value."),
            term("Store", TermScope::Global, "g.md", &["cache"], "Holds entries."),
            term("Eviction", TermScope::Global, "g.md", &[], "Dropping old cache data."),
            term("Cache", TermScope::Global, "h.md", &[], "Fast memory."),
        ]);
        let names: Vec<_> = registry
            .search("CACHE")
            .into_iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["Cache", "Store", "Cache Entry", "Eviction"]);
        assert!(registry.search("  ").is_empty());
    }
}
