use std::collections::HashMap;

use migrator_shared::types::ScriptObject;

use crate::errors::OrderingError;

/// Kind of a parent → child dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Soft reference: the parent should precede the child, but the
    /// constraint yields when it conflicts with a hard one.
    Lookup,
    /// Hard reference: the parent must be fully processed before the child.
    MasterDetail,
}

/// Directed dependency graph over the ordinary migrated objects.
///
/// Edges point from parent to child and are derived once from the declared
/// relationships. Self-references and references to objects outside the
/// member set (identity, read-only, or undeclared objects) constrain nothing
/// about the ordinary-object order and are dropped at construction.
#[derive(Debug)]
pub struct DependencyGraph {
    names: Vec<String>,
    edges: Vec<(usize, usize, EdgeKind)>,
}

impl DependencyGraph {
    /// Builds the graph for the objects selected by `members` (indices into
    /// `objects`). Node positions follow the order of `members`.
    pub fn from_objects(objects: &[ScriptObject], members: &[usize]) -> Self {
        let position_of: HashMap<&str, usize> = members
            .iter()
            .enumerate()
            .map(|(position, &index)| (objects[index].name.as_str(), position))
            .collect();

        let mut edges = Vec::new();
        for (position, &index) in members.iter().enumerate() {
            let object = &objects[index];
            for parent in &object.master_detail_parents {
                if let Some(&parent_position) = position_of.get(parent.as_str()) {
                    if parent_position != position {
                        edges.push((parent_position, position, EdgeKind::MasterDetail));
                    }
                }
            }
            for parent in &object.lookup_parents {
                if let Some(&parent_position) = position_of.get(parent.as_str()) {
                    if parent_position != position {
                        edges.push((parent_position, position, EdgeKind::Lookup));
                    }
                }
            }
        }

        Self {
            names: members
                .iter()
                .map(|&index| objects[index].name.clone())
                .collect(),
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    /// Stable topological sort with two edge classes.
    ///
    /// Picks, repeatedly, the earliest-declared node with no unsatisfied
    /// in-edge of either kind; when none exists, the earliest-declared node
    /// with no unsatisfied master-detail in-edge (breaking a lookup cycle at
    /// its earliest member). When even that fails, the remaining nodes sit
    /// behind a master-detail cycle and the sort errors out.
    ///
    /// Returns node positions in placement order.
    pub fn sort(&self) -> Result<Vec<usize>, OrderingError> {
        let node_count = self.names.len();
        let mut hard_in = vec![0usize; node_count];
        let mut soft_in = vec![0usize; node_count];
        for &(_, child, kind) in &self.edges {
            match kind {
                EdgeKind::MasterDetail => hard_in[child] += 1,
                EdgeKind::Lookup => soft_in[child] += 1,
            }
        }

        let mut placed = vec![false; node_count];
        let mut order = Vec::with_capacity(node_count);
        while order.len() < node_count {
            let next = (0..node_count)
                .find(|&node| !placed[node] && hard_in[node] == 0 && soft_in[node] == 0)
                .or_else(|| (0..node_count).find(|&node| !placed[node] && hard_in[node] == 0));
            let Some(node) = next else {
                let objects = (0..node_count)
                    .filter(|&node| !placed[node])
                    .map(|node| self.names[node].clone())
                    .collect();
                return Err(OrderingError::MasterDetailCycle { objects });
            };

            placed[node] = true;
            order.push(node);
            for &(parent, child, kind) in &self.edges {
                if parent == node && !placed[child] {
                    match kind {
                        EdgeKind::MasterDetail => hard_in[child] -= 1,
                        // A soft count can already be zero when this node was
                        // itself placed through the lookup-cycle fallback.
                        EdgeKind::Lookup => soft_in[child] = soft_in[child].saturating_sub(1),
                    }
                }
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(objects: &[ScriptObject]) -> DependencyGraph {
        let members: Vec<usize> = (0..objects.len()).collect();
        DependencyGraph::from_objects(objects, &members)
    }

    fn sorted_names(objects: &[ScriptObject]) -> Vec<String> {
        let g = graph(objects);
        g.sort()
            .unwrap()
            .into_iter()
            .map(|position| objects[position].name.clone())
            .collect()
    }

    #[test]
    fn declaration_order_is_the_tie_break() {
        let objects = vec![
            ScriptObject::new("A"),
            ScriptObject::new("B"),
            ScriptObject::new("C"),
        ];
        assert_eq!(sorted_names(&objects), vec!["A", "B", "C"]);
    }

    #[test]
    fn chains_of_both_kinds_linearize() {
        let objects = vec![
            ScriptObject::new("GrandChild").with_master_detail_parent("Child"),
            ScriptObject::new("Child")
                .with_master_detail_parent("Root")
                .with_lookup_parent("Side"),
            ScriptObject::new("Side"),
            ScriptObject::new("Root"),
        ];
        let order = sorted_names(&objects);
        let position =
            |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(position("Root") < position("Child"));
        assert!(position("Child") < position("GrandChild"));
        assert!(position("Side") < position("Child"));
    }

    #[test]
    fn lookup_cycle_breaks_at_the_earliest_declared_member() {
        let objects = vec![
            ScriptObject::new("A").with_lookup_parent("B"),
            ScriptObject::new("B").with_lookup_parent("A"),
        ];
        assert_eq!(sorted_names(&objects), vec!["A", "B"]);
    }

    #[test]
    fn master_detail_cycle_is_a_hard_error() {
        let objects = vec![
            ScriptObject::new("A").with_master_detail_parent("B"),
            ScriptObject::new("B").with_master_detail_parent("A"),
            ScriptObject::new("C").with_master_detail_parent("A"),
        ];
        let g = graph(&objects);
        let err = g.sort().unwrap_err();
        let OrderingError::MasterDetailCycle { objects: unordered } = err;
        assert!(unordered.contains(&"A".to_string()));
        assert!(unordered.contains(&"B".to_string()));
        // C is not on the cycle but cannot be ordered behind it either.
        assert!(unordered.contains(&"C".to_string()));
    }

    #[test]
    fn self_references_do_not_constrain_the_order() {
        let objects = vec![
            ScriptObject::new("Employee")
                .with_lookup_parent("Employee")
                .with_lookup_parent("Department"),
            ScriptObject::new("Department"),
        ];
        assert_eq!(sorted_names(&objects), vec!["Department", "Employee"]);
    }

    #[test]
    fn mixed_cycle_with_one_soft_edge_is_broken_at_the_soft_edge() {
        // A -> B is hard, B -> A is soft: the soft edge yields and A is
        // placed first.
        let objects = vec![
            ScriptObject::new("B").with_master_detail_parent("A"),
            ScriptObject::new("A").with_lookup_parent("B"),
        ];
        assert_eq!(sorted_names(&objects), vec!["A", "B"]);
    }
}
