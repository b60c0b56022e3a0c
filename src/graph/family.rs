//! FamilyGraph - parent/child topology of the filtered relatives.
//!
//! The FamilyGraph stores one petgraph node per surviving relative and one
//! directed edge per parent-like relationship whose endpoints both survive
//! the filter. It is rebuilt on every layout pass and only answers the
//! questions the hierarchy builder asks: who are a relative's children, who
//! has a parent, and which relatives are roots.

use std::collections::HashMap;

use log::trace;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};

use super::relationship::{Relationship, RelationshipId};
use super::relative::{Relative, RelativeId};

/// Parent-like topology over a filtered relative set.
pub struct FamilyGraph {
    /// Nodes store the relative id, edges the relationship that produced them.
    graph: StableGraph<RelativeId, RelationshipId, Directed>,

    /// Map from relative id to petgraph NodeIndex
    index_of: HashMap<RelativeId, NodeIndex>,

    /// Relative ids in input order (drives root order and fallbacks)
    order: Vec<RelativeId>,
}

impl FamilyGraph {
    /// Build the graph from already-filtered relatives and the full
    /// relationship list.
    ///
    /// Relationships that are not parent-like, that reference a relative
    /// outside `relatives`, or that point a relative at itself contribute
    /// nothing.
    pub fn build(relatives: &[Relative], relationships: &[Relationship]) -> Self {
        let mut graph = StableGraph::with_capacity(relatives.len(), relationships.len());
        let mut index_of = HashMap::with_capacity(relatives.len());
        let mut order = Vec::with_capacity(relatives.len());

        for relative in relatives {
            if index_of.contains_key(&relative.id) {
                continue;
            }
            let index = graph.add_node(relative.id);
            index_of.insert(relative.id, index);
            order.push(relative.id);
        }

        for rel in relationships {
            if !rel.relationship_type.is_parent_like() {
                continue;
            }
            let (Some(&parent), Some(&child)) = (
                index_of.get(&rel.from_relative_id),
                index_of.get(&rel.to_relative_id),
            ) else {
                trace!("skipping {} with a filtered-out endpoint", rel.id);
                continue;
            };
            if rel.is_self_loop() {
                trace!("skipping self-referencing {}", rel.id);
                continue;
            }
            graph.add_edge(parent, child, rel.id);
        }

        Self {
            graph,
            index_of,
            order,
        }
    }

    /// Number of relatives in the graph.
    pub fn relative_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of parent-like edges kept.
    pub fn parent_edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: RelativeId) -> bool {
        self.index_of.contains_key(&id)
    }

    /// Relative ids in input order.
    pub fn relatives(&self) -> &[RelativeId] {
        &self.order
    }

    /// Children of a relative, in relationship input order.
    ///
    /// Duplicate parent edges yield the child more than once; the hierarchy
    /// builder's visited set collapses them.
    pub fn children_of(&self, id: RelativeId) -> Vec<RelativeId> {
        let Some(&index) = self.index_of.get(&id) else {
            return Vec::new();
        };
        // StableGraph walks adjacency newest-first; edge indices follow insertion.
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|e| (e.id().index(), e.target()))
            .collect();
        edges.sort_unstable_by_key(|&(edge_index, _)| edge_index);
        edges
            .into_iter()
            .filter_map(|(_, target)| self.graph.node_weight(target).copied())
            .collect()
    }

    /// Whether any parent-like edge targets this relative.
    pub fn has_parent(&self, id: RelativeId) -> bool {
        self.index_of.get(&id).is_some_and(|&index| {
            self.graph
                .edges_directed(index, Direction::Incoming)
                .next()
                .is_some()
        })
    }

    /// Relatives with no incoming parent-like edge, in input order.
    pub fn roots(&self) -> Vec<RelativeId> {
        self.order
            .iter()
            .copied()
            .filter(|&id| !self.has_parent(id))
            .collect()
    }
}
