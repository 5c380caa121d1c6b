use crate::DependencyGraph;

impl DependencyGraph {
    /// Groups of files that import each other, directly or transitively.
    ///
    /// Uses Tarjan's algorithm. A component counts when it has more than one
    /// file or its single file imports itself. Each group is sorted, and the
    /// groups are sorted by their first file.
    pub fn import_cycles(&self) -> Vec<Vec<String>> {
        let sccs = petgraph::algo::tarjan_scc(&self.graph);

        let mut cycles: Vec<Vec<String>> = sccs
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut ids: Vec<String> = component
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect();
                ids.sort();
                ids
            })
            .collect();

        cycles.sort();
        cycles
    }
}
