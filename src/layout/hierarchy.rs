//! Rooted tree extraction from the family graph.
//!
//! The family graph may contain several roots, shared children (a child with
//! both a father and a mother edge) and even cycles. The tidy tree needs a
//! plain rooted tree, so this module walks the graph depth-first with one
//! shared visited set and attaches every relative to the first path that
//! reaches it.

use std::collections::HashSet;

use log::debug;

use crate::graph::{FamilyGraph, RelativeId};

/// Root of the extracted tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeRoot {
    /// Exactly one root relative.
    Single(RelativeId),
    /// Several roots, laid out side by side under an invisible parent.
    Forest(Vec<RelativeId>),
}

impl TreeRoot {
    /// Pick the root for a graph.
    ///
    /// Relatives with no incoming parent-like edge are roots. When every
    /// relative has a parent (a cycle), the first relative in input order is
    /// used. Returns `None` only for an empty graph.
    pub fn select(graph: &FamilyGraph) -> Option<Self> {
        let mut roots = graph.roots();
        match roots.len() {
            0 => graph.relatives().first().map(|&id| TreeRoot::Single(id)),
            1 => roots.pop().map(TreeRoot::Single),
            _ => Some(TreeRoot::Forest(roots)),
        }
    }

    /// Root relatives in layout order.
    pub fn relatives(&self) -> &[RelativeId] {
        match self {
            TreeRoot::Single(id) => std::slice::from_ref(id),
            TreeRoot::Forest(ids) => ids,
        }
    }

    pub fn is_forest(&self) -> bool {
        matches!(self, TreeRoot::Forest(_))
    }
}

/// One node of the extracted tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// `None` only for the virtual forest root.
    pub relative: Option<RelativeId>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Depth counted from the real roots (the virtual root adds no level).
    pub depth: u32,
}

/// Arena of tree nodes in depth-first pre-order. Index 0 is the root.
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    nodes: Vec<TreeNode>,
}

impl LayoutTree {
    /// Extract the rooted tree for `root` from `graph`.
    pub fn build(graph: &FamilyGraph, root: &TreeRoot) -> Self {
        let mut tree = LayoutTree {
            nodes: Vec::with_capacity(graph.relative_count() + 1),
        };
        let mut visited = HashSet::with_capacity(graph.relative_count());

        match root {
            TreeRoot::Single(id) => {
                tree.attach(graph, *id, None, 0, &mut visited);
            }
            TreeRoot::Forest(ids) => {
                tree.nodes.push(TreeNode {
                    relative: None,
                    parent: None,
                    children: Vec::with_capacity(ids.len()),
                    depth: 0,
                });
                for &id in ids {
                    tree.attach(graph, id, Some(0), 0, &mut visited);
                }
            }
        }

        debug!(
            "extracted tree with {} nodes (forest: {})",
            tree.relative_count(),
            root.is_forest()
        );
        tree
    }

    /// Depth-first attach of `start` and everything reachable from it.
    ///
    /// Iterative so that long ancestor chains cannot overflow the stack.
    /// Children are pushed in reverse so they are visited, and therefore
    /// ordered, in relationship input order.
    fn attach(
        &mut self,
        graph: &FamilyGraph,
        start: RelativeId,
        parent: Option<usize>,
        depth: u32,
        visited: &mut HashSet<RelativeId>,
    ) {
        let mut stack = vec![(start, parent, depth)];

        while let Some((id, parent, depth)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }

            let index = self.nodes.len();
            self.nodes.push(TreeNode {
                relative: Some(id),
                parent,
                children: Vec::new(),
                depth,
            });
            if let Some(p) = parent {
                self.nodes[p].children.push(index);
            }

            for child in graph.children_of(id).into_iter().rev() {
                if !visited.contains(&child) {
                    stack.push((child, Some(index), depth + 1));
                }
            }
        }
    }

    /// All arena nodes, including a virtual root if present.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether index 0 is the invisible forest parent.
    pub fn has_virtual_root(&self) -> bool {
        self.nodes.first().is_some_and(|n| n.relative.is_none())
    }

    /// Number of real relatives in the tree.
    pub fn relative_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.relative.is_some()).count()
    }

    /// Nodes in post-order (children left to right, then parent).
    pub fn post_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return order;
        }
        let mut stack = vec![(0usize, false)];
        while let Some((index, expanded)) = stack.pop() {
            if expanded {
                order.push(index);
                continue;
            }
            stack.push((index, true));
            for &child in self.nodes[index].children.iter().rev() {
                stack.push((child, false));
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Relationship, RelationshipType, Relative};

    fn graph(ids: &[i64], edges: &[(i64, i64)]) -> FamilyGraph {
        let relatives: Vec<Relative> = ids.iter().map(|&id| Relative::new(id, "R", "")).collect();
        let relationships: Vec<Relationship> = edges
            .iter()
            .enumerate()
            .map(|(i, &(from, to))| Relationship::new(i as i64, from, to, RelationshipType::Father))
            .collect();
        FamilyGraph::build(&relatives, &relationships)
    }

    fn order(tree: &LayoutTree) -> Vec<Option<i64>> {
        tree.nodes()
            .iter()
            .map(|n| n.relative.map(RelativeId::raw))
            .collect()
    }

    #[test]
    fn test_single_root_selected() {
        let g = graph(&[1, 2, 3], &[(1, 2), (1, 3)]);
        assert_eq!(TreeRoot::select(&g), Some(TreeRoot::Single(RelativeId(1))));
    }

    #[test]
    fn test_cycle_falls_back_to_first_relative() {
        let g = graph(&[5, 6], &[(5, 6), (6, 5)]);
        let root = TreeRoot::select(&g).unwrap();
        assert_eq!(root, TreeRoot::Single(RelativeId(5)));

        let tree = LayoutTree::build(&g, &root);
        assert_eq!(order(&tree), vec![Some(5), Some(6)]);
        assert_eq!(tree.node(1).depth, 1);
    }

    #[test]
    fn test_forest_gets_virtual_root() {
        let g = graph(&[1, 2, 3], &[]);
        let root = TreeRoot::select(&g).unwrap();
        assert!(root.is_forest());

        let tree = LayoutTree::build(&g, &root);
        assert!(tree.has_virtual_root());
        assert_eq!(tree.relative_count(), 3);
        assert_eq!(tree.node(0).children, vec![1, 2, 3]);
        assert!(tree.nodes()[1..].iter().all(|n| n.depth == 0));
    }

    #[test]
    fn test_shared_child_attaches_to_first_path() {
        // 1 and 2 are both parents of 3; 3 lands under 1 only.
        let g = graph(&[1, 2, 3], &[(1, 3), (2, 3)]);
        let root = TreeRoot::select(&g).unwrap();
        let tree = LayoutTree::build(&g, &root);

        assert_eq!(tree.relative_count(), 3);
        let under_one = &tree.node(1).children;
        assert_eq!(under_one.len(), 1);
        assert_eq!(tree.node(under_one[0]).relative, Some(RelativeId(3)));
        assert!(tree.node(3).children.is_empty());
    }

    #[test]
    fn test_preorder_follows_child_order() {
        let g = graph(&[1, 2, 3, 4], &[(1, 2), (1, 3), (2, 4)]);
        let tree = LayoutTree::build(&g, &TreeRoot::Single(RelativeId(1)));
        assert_eq!(order(&tree), vec![Some(1), Some(2), Some(4), Some(3)]);
        assert_eq!(tree.post_order(), vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_unreachable_relatives_are_left_out() {
        // 3 <-> 4 is a rootless cycle next to root 1.
        let g = graph(&[1, 2, 3, 4], &[(1, 2), (3, 4), (4, 3)]);
        let root = TreeRoot::select(&g).unwrap();
        let tree = LayoutTree::build(&g, &root);
        assert_eq!(tree.relative_count(), 2);
    }
}
