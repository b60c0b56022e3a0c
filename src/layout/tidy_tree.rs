//! Buchheim-Junger-Leipert tidy tree layout algorithm.
//!
//! Implements the O(n) algorithm from "Improving Walker's Algorithm to Run in
//! Linear Time" (Buchheim, Junger, Leipert, 2002) over a [`LayoutTree`] arena.
//! Output matches the classic `tree()` layout with a fixed node size: every
//! node gets an x in separation units scaled by `node_width`; depth comes from
//! the arena itself.
//!
//! # Algorithm Overview
//!
//! 1. **First walk (post-order):** assign preliminary x-coordinates (`prelim`)
//!    and modifiers, merging each subtree's left contour against the right
//!    contours of the subtrees to its left. Threads make contour traversal
//!    O(1) amortized; `shift`/`change` spread the space opened up between
//!    intermediate siblings.
//! 2. **Second walk (pre-order):** accumulate modifiers down the tree into
//!    final x-coordinates, with the root placed at 0.

use super::hierarchy::LayoutTree;

/// Configuration for the tidy tree layout.
#[derive(Debug, Clone)]
pub struct TidyTreeConfig {
    /// Separation (in node widths) between siblings sharing a parent.
    pub sibling_separation: f64,
    /// Separation (in node widths) between neighbours with different parents.
    pub subtree_separation: f64,
    /// Horizontal size of one separation unit.
    pub node_width: f64,
}

impl Default for TidyTreeConfig {
    fn default() -> Self {
        Self {
            sibling_separation: 1.1,
            subtree_separation: 1.4,
            node_width: 268.0,
        }
    }
}

/// Per-node walk state, parallel to the tree arena.
#[derive(Debug, Clone)]
struct WalkNode {
    /// Preliminary x-coordinate.
    prelim: f64,
    /// Modifier applied to the whole subtree in the second walk.
    modifier: f64,
    /// Pending shift for even spacing of intermediate children.
    shift: f64,
    /// Pending change for even spacing of intermediate children.
    change: f64,
    /// Ancestor pointer used to find the subtree that must move.
    ancestor: usize,
    /// Contour thread for leaves.
    thread: Option<usize>,
    /// Left-to-right index among siblings.
    number: usize,
    /// Default ancestor for this node's children.
    default_ancestor: Option<usize>,
}

/// Result of the tidy tree layout computation.
#[derive(Debug, Clone, Default)]
pub struct TidyTreeResult {
    /// Final x per arena node (root at 0).
    pub x: Vec<f64>,
}

impl TidyTreeResult {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// The tidy tree layout engine.
pub struct TidyTreeLayout {
    config: TidyTreeConfig,
}

impl TidyTreeLayout {
    /// Create a new tidy tree layout with the given configuration.
    pub fn new(config: TidyTreeConfig) -> Self {
        Self { config }
    }

    /// Create a tidy tree layout with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TidyTreeConfig::default())
    }

    pub fn config(&self) -> &TidyTreeConfig {
        &self.config
    }

    /// Lay out every node of `tree`.
    pub fn compute(&self, tree: &LayoutTree) -> TidyTreeResult {
        let n = tree.len();
        if n == 0 {
            return TidyTreeResult::default();
        }

        let mut walk: Vec<WalkNode> = (0..n)
            .map(|v| WalkNode {
                prelim: 0.0,
                modifier: 0.0,
                shift: 0.0,
                change: 0.0,
                ancestor: v,
                thread: None,
                number: 0,
                default_ancestor: None,
            })
            .collect();
        for node in tree.nodes() {
            for (number, &child) in node.children.iter().enumerate() {
                walk[child].number = number;
            }
        }

        let mut pass = Walk {
            tree,
            walk: &mut walk,
            config: &self.config,
        };
        for v in tree.post_order() {
            pass.first_walk(v);
        }

        // Second walk: arena order is pre-order, so parents resolve first.
        let mut x = vec![0.0; n];
        let root_parent_modifier = -walk[0].prelim;
        for v in 0..n {
            let parent_modifier = match tree.node(v).parent {
                Some(p) => walk[p].modifier,
                None => root_parent_modifier,
            };
            x[v] = (walk[v].prelim + parent_modifier) * self.config.node_width;
            walk[v].modifier += parent_modifier;
        }

        TidyTreeResult { x }
    }
}

/// Mutable state for one layout pass.
struct Walk<'a> {
    tree: &'a LayoutTree,
    walk: &'a mut [WalkNode],
    config: &'a TidyTreeConfig,
}

impl Walk<'_> {
    fn separation(&self, a: usize, b: usize) -> f64 {
        let pa = self.tree.node(a).parent;
        if pa.is_some() && pa == self.tree.node(b).parent {
            self.config.sibling_separation
        } else {
            self.config.subtree_separation
        }
    }

    fn left_sibling(&self, v: usize) -> Option<usize> {
        let number = self.walk[v].number;
        let parent = self.tree.node(v).parent?;
        (number > 0).then(|| self.tree.node(parent).children[number - 1])
    }

    /// Next node on the left contour.
    fn next_left(&self, v: usize) -> Option<usize> {
        match self.tree.node(v).children.first() {
            Some(&first) => Some(first),
            None => self.walk[v].thread,
        }
    }

    /// Next node on the right contour.
    fn next_right(&self, v: usize) -> Option<usize> {
        match self.tree.node(v).children.last() {
            Some(&last) => Some(last),
            None => self.walk[v].thread,
        }
    }

    fn first_walk(&mut self, v: usize) {
        let tree = self.tree;
        let left = self.left_sibling(v);
        let children = &tree.node(v).children;

        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            self.execute_shifts(v);
            let midpoint = (self.walk[first].prelim + self.walk[last].prelim) / 2.0;
            match left {
                Some(w) => {
                    self.walk[v].prelim = self.walk[w].prelim + self.separation(v, w);
                    self.walk[v].modifier = self.walk[v].prelim - midpoint;
                }
                None => self.walk[v].prelim = midpoint,
            }
        } else if let Some(w) = left {
            self.walk[v].prelim = self.walk[w].prelim + self.separation(v, w);
        }

        if let Some(parent) = tree.node(v).parent {
            let leftmost = tree.node(parent).children[0];
            let ancestor = self.walk[parent].default_ancestor.unwrap_or(leftmost);
            let ancestor = self.apportion(v, left, ancestor);
            self.walk[parent].default_ancestor = Some(ancestor);
        }
    }

    /// Push `v`'s subtree right until it clears every subtree to its left.
    fn apportion(&mut self, v: usize, left: Option<usize>, mut ancestor: usize) -> usize {
        let Some(w) = left else {
            return ancestor;
        };
        let Some(parent) = self.tree.node(v).parent else {
            return ancestor;
        };

        // i = inside, o = outside; p = right subtree (v), m = left subtrees.
        let mut vip = v;
        let mut vop = v;
        let mut vim = w;
        let mut vom = self.tree.node(parent).children[0];
        let mut sip = self.walk[vip].modifier;
        let mut sop = self.walk[vop].modifier;
        let mut sim = self.walk[vim].modifier;
        let mut som = self.walk[vom].modifier;

        let (next_im, next_ip) = loop {
            let (next_im, next_ip) = (self.next_right(vim), self.next_left(vip));
            let (Some(im), Some(ip)) = (next_im, next_ip) else {
                break (next_im, next_ip);
            };
            let (Some(om), Some(op)) = (self.next_left(vom), self.next_right(vop)) else {
                break (None, None);
            };
            vim = im;
            vip = ip;
            vom = om;
            vop = op;

            self.walk[vop].ancestor = v;
            let shift = self.walk[vim].prelim + sim - self.walk[vip].prelim - sip
                + self.separation(vim, vip);
            if shift > 0.0 {
                let wm = self.next_ancestor(vim, v, ancestor);
                self.move_subtree(wm, v, shift);
                sip += shift;
                sop += shift;
            }
            sim += self.walk[vim].modifier;
            sip += self.walk[vip].modifier;
            som += self.walk[vom].modifier;
            sop += self.walk[vop].modifier;
        };

        if let Some(im) = next_im
            && self.next_right(vop).is_none()
        {
            self.walk[vop].thread = Some(im);
            self.walk[vop].modifier += sim - sop;
        }
        if let Some(ip) = next_ip
            && self.next_left(vom).is_none()
        {
            self.walk[vom].thread = Some(ip);
            self.walk[vom].modifier += sip - som;
            ancestor = v;
        }
        ancestor
    }

    /// The sibling-level ancestor of `vim`, or the default one.
    fn next_ancestor(&self, vim: usize, v: usize, default_ancestor: usize) -> usize {
        let candidate = self.walk[vim].ancestor;
        if self.tree.node(candidate).parent == self.tree.node(v).parent {
            candidate
        } else {
            default_ancestor
        }
    }

    fn move_subtree(&mut self, wm: usize, wp: usize, shift: f64) {
        let subtrees = self.walk[wp].number.saturating_sub(self.walk[wm].number).max(1);
        let change = shift / subtrees as f64;
        self.walk[wp].change -= change;
        self.walk[wp].shift += shift;
        self.walk[wm].change += change;
        self.walk[wp].prelim += shift;
        self.walk[wp].modifier += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let tree = self.tree;
        let mut shift = 0.0;
        let mut change = 0.0;
        for &child in tree.node(v).children.iter().rev() {
            let node = &mut self.walk[child];
            node.prelim += shift;
            node.modifier += shift;
            change += node.change;
            shift += node.shift + change;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FamilyGraph, Relationship, RelationshipType, Relative};
    use crate::layout::TreeRoot;

    fn tree(ids: &[i64], edges: &[(i64, i64)]) -> LayoutTree {
        let relatives: Vec<Relative> = ids.iter().map(|&id| Relative::new(id, "R", "")).collect();
        let relationships: Vec<Relationship> = edges
            .iter()
            .enumerate()
            .map(|(i, &(from, to))| Relationship::new(i as i64, from, to, RelationshipType::Mother))
            .collect();
        let graph = FamilyGraph::build(&relatives, &relationships);
        let root = TreeRoot::select(&graph).unwrap();
        LayoutTree::build(&graph, &root)
    }

    fn unit_layout() -> TidyTreeLayout {
        TidyTreeLayout::new(TidyTreeConfig {
            node_width: 1.0,
            ..Default::default()
        })
    }

    /// Every pair of horizontally adjacent nodes on a level is at least the
    /// sibling separation apart.
    fn assert_levels_separated(tree: &LayoutTree, result: &TidyTreeResult, min_gap: f64) {
        let max_depth = tree.nodes().iter().map(|n| n.depth).max().unwrap_or(0);
        for depth in 0..=max_depth {
            let mut xs: Vec<f64> = (0..tree.len())
                .filter(|&i| tree.node(i).relative.is_some() && tree.node(i).depth == depth)
                .map(|i| result.x[i])
                .collect();
            xs.sort_by(f64::total_cmp);
            for pair in xs.windows(2) {
                assert!(
                    pair[1] - pair[0] >= min_gap - 1e-9,
                    "depth {depth}: {} and {} are too close",
                    pair[0],
                    pair[1]
                );
            }
        }
    }

    #[test]
    fn test_empty_tree() {
        let result = unit_layout().compute(&LayoutTree::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_single_node_at_origin() {
        let t = tree(&[1], &[]);
        let result = TidyTreeLayout::with_defaults().compute(&t);
        assert_eq!(result.x, vec![0.0]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_parent_centered_over_children() {
        let t = tree(&[1, 2, 3], &[(1, 2), (1, 3)]);
        let result = TidyTreeLayout::with_defaults().compute(&t);

        assert!(result.x[0].abs() < 1e-9);
        assert!((result.x[1] + 0.55 * 268.0).abs() < 1e-9);
        assert!((result.x[2] - 0.55 * 268.0).abs() < 1e-9);
    }

    #[test]
    fn test_cousins_use_subtree_separation() {
        // 1 -> {2, 3}; 2 -> 4; 3 -> 5. Cousins 4 and 5 need 1.4 units.
        let t = tree(&[1, 2, 3, 4, 5], &[(1, 2), (1, 3), (2, 4), (3, 5)]);
        let result = unit_layout().compute(&t);

        let x = |id: i64| {
            let i = t
                .nodes()
                .iter()
                .position(|n| n.relative.map(|r| r.raw()) == Some(id))
                .unwrap();
            result.x[i]
        };
        assert!((x(5) - x(4) - 1.4).abs() < 1e-9);
        assert!((x(3) - x(2) - 1.4).abs() < 1e-9);
        assert!(x(1).abs() < 1e-9);
    }

    #[test]
    fn test_forest_roots_are_siblings() {
        let t = tree(&[1, 2, 3], &[]);
        let result = unit_layout().compute(&t);

        assert!(t.has_virtual_root());
        assert!((result.x[2] - result.x[1] - 1.1).abs() < 1e-9);
        assert!((result.x[3] - result.x[2] - 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_asymmetric_subtrees_do_not_overlap() {
        // Deep left subtree, wide right subtree, a small middle one.
        let edges = [
            (1, 2),
            (1, 3),
            (1, 4),
            (2, 5),
            (5, 6),
            (6, 7),
            (6, 8),
            (3, 9),
            (4, 10),
            (4, 11),
            (4, 12),
            (10, 13),
            (10, 14),
            (12, 15),
        ];
        let ids: Vec<i64> = (1..=15).collect();
        let t = tree(&ids, &edges);
        let result = unit_layout().compute(&t);

        assert_eq!(t.relative_count(), 15);
        assert_levels_separated(&t, &result, 1.1);
    }

    #[test]
    fn test_intermediate_siblings_spread_evenly() {
        // A wide first and last child squeeze two leaves in the middle.
        let edges = [
            (1, 2),
            (1, 3),
            (1, 4),
            (1, 5),
            (2, 6),
            (2, 7),
            (2, 8),
            (5, 9),
            (5, 10),
            (5, 11),
        ];
        let ids: Vec<i64> = (1..=11).collect();
        let t = tree(&ids, &edges);
        let result = unit_layout().compute(&t);
        assert_levels_separated(&t, &result, 1.1);

        let children = &t.node(0).children;
        let gaps: Vec<f64> = children
            .windows(2)
            .map(|w| result.x[w[1]] - result.x[w[0]])
            .collect();
        assert!((gaps[0] - gaps[1]).abs() < 1e-9, "gaps {gaps:?}");
        assert!((gaps[1] - gaps[2]).abs() < 1e-9, "gaps {gaps:?}");
    }

    #[test]
    fn test_layout_is_deterministic() {
        let edges = [(1, 2), (1, 3), (2, 4), (2, 5), (3, 6)];
        let ids: Vec<i64> = (1..=6).collect();
        let t = tree(&ids, &edges);
        let layout = TidyTreeLayout::with_defaults();
        assert_eq!(layout.compute(&t).x, layout.compute(&t).x);
    }
}
