//! LayoutEngine - card positions for the filtered family.
//!
//! A recompute runs the whole pipeline synchronously:
//! filter -> parent graph -> root selection -> tree extraction -> tidy tree
//! -> generation rows -> x normalisation -> orphan placement -> manual
//! overrides -> same-generation collision pass.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use super::collision::resolve_collisions;
use super::hierarchy::{LayoutTree, TreeRoot};
use super::manual::ManualPositions;
use super::tidy_tree::{TidyTreeConfig, TidyTreeLayout};
use crate::filter::RelativeFilter;
use crate::geometry::{Point, Rect};
use crate::graph::{FamilyGraph, Relationship, Relative, RelativeId};

/// Card geometry and spacing constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub card_width: f64,
    pub card_height: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    /// Minimum empty space between two cards of one generation.
    pub min_node_gap: f64,
    /// Tidy tree separation between siblings (in horizontal units).
    pub sibling_separation: f64,
    /// Tidy tree separation between non-siblings (in horizontal units).
    pub subtree_separation: f64,
    /// X of the leftmost tree card.
    pub left_margin: f64,
    /// Y of the topmost generation row.
    pub start_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            card_width: 208.0,
            card_height: 280.0,
            horizontal_gap: 60.0,
            vertical_gap: 100.0,
            min_node_gap: 48.0,
            sibling_separation: 1.1,
            subtree_separation: 1.4,
            left_margin: 120.0,
            start_y: 60.0,
        }
    }
}

impl LayoutConfig {
    /// Width of one tidy tree unit.
    pub fn horizontal_unit(&self) -> f64 {
        self.card_width + self.horizontal_gap
    }

    /// Distance between generation rows.
    pub fn layer_gap(&self) -> f64 {
        self.card_height + self.vertical_gap
    }

    /// Minimum left-edge distance enforced by the collision pass.
    pub fn collision_spacing(&self) -> f64 {
        self.card_width + self.min_node_gap
    }

    /// Card rectangle with its top-left corner at `(x, y)`.
    pub fn card_rect(&self, x: f64, y: f64) -> Rect {
        Rect::new(x, y, self.card_width, self.card_height)
    }

    fn tidy_tree(&self) -> TidyTreeConfig {
        TidyTreeConfig {
            sibling_separation: self.sibling_separation,
            subtree_separation: self.subtree_separation,
            node_width: self.horizontal_unit(),
        }
    }
}

/// World position of one card's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub relative: RelativeId,
    pub x: f64,
    pub y: f64,
}

impl NodePosition {
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Computes card positions from relatives, relationships and overrides.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
    }

    /// Lay out every relative that passes `filter`.
    ///
    /// The output holds each surviving relative exactly once: tree nodes in
    /// depth-first order, then relatives the tree walk never reached.
    pub fn recompute(
        &self,
        relatives: &[Relative],
        relationships: &[Relationship],
        filter: &RelativeFilter,
        manual: &ManualPositions,
    ) -> Vec<NodePosition> {
        let filtered = filter.apply(relatives);
        if filtered.is_empty() {
            debug!("layout: filter left no relatives");
            return Vec::new();
        }

        let graph = FamilyGraph::build(&filtered, relationships);
        let Some(root) = TreeRoot::select(&graph) else {
            return Vec::new();
        };
        let tree = LayoutTree::build(&graph, &root);
        let tidy = TidyTreeLayout::new(self.config.tidy_tree()).compute(&tree);

        // First occurrence wins for duplicated ids.
        let mut generations: HashMap<RelativeId, Option<i32>> =
            HashMap::with_capacity(filtered.len());
        let relatives: Vec<&Relative> = filtered
            .iter()
            .filter(|r| {
                let first = !generations.contains_key(&r.id);
                generations.entry(r.id).or_insert(r.generation);
                first
            })
            .collect();
        let generation_of = |id: RelativeId| generations.get(&id).copied().flatten();

        let min_generation = relatives
            .iter()
            .filter_map(|r| r.generation)
            .min()
            .unwrap_or(0);
        let layer_gap = self.config.layer_gap();
        let row_y = |generation: i32| {
            let rank = i64::from(generation) - i64::from(min_generation);
            self.config.start_y + rank as f64 * layer_gap
        };

        let min_tree_x = tree
            .nodes()
            .iter()
            .zip(&tidy.x)
            .filter(|(node, _)| node.relative.is_some())
            .map(|(_, &x)| x)
            .fold(f64::INFINITY, f64::min);
        let shift_x = if min_tree_x.is_finite() {
            self.config.left_margin - min_tree_x
        } else {
            self.config.left_margin
        };

        let mut positions = Vec::with_capacity(relatives.len());
        let mut placed = HashSet::with_capacity(relatives.len());
        for (index, node) in tree.nodes().iter().enumerate() {
            let Some(id) = node.relative else {
                continue;
            };
            let generation = generation_of(id).unwrap_or(node.depth as i32);
            positions.push(NodePosition {
                relative: id,
                x: tidy.x[index] + shift_x,
                y: row_y(generation),
            });
            placed.insert(id);
        }

        let mut orphan_x = positions
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        orphan_x = if orphan_x.is_finite() {
            orphan_x + self.config.card_width + 2.0 * self.config.horizontal_gap
        } else {
            self.config.left_margin
        };
        let tree_count = positions.len();
        for relative in &relatives {
            if placed.contains(&relative.id) {
                continue;
            }
            positions.push(NodePosition {
                relative: relative.id,
                x: orphan_x,
                y: row_y(relative.generation_or_default()),
            });
            placed.insert(relative.id);
            orphan_x += self.config.horizontal_unit();
        }
        if positions.len() > tree_count {
            debug!(
                "layout: placed {} relatives outside the tree",
                positions.len() - tree_count
            );
        }

        for position in &mut positions {
            if let Some(point) = manual.get(position.relative) {
                position.x = point.x;
                position.y = point.y;
            }
        }

        let generations: Vec<i32> = positions
            .iter()
            .map(|p| generation_of(p.relative).unwrap_or(0))
            .collect();
        resolve_collisions(&mut positions, &generations, self.config.collision_spacing());

        debug!(
            "layout: {} cards, {} parent edges, forest: {}",
            positions.len(),
            graph.parent_edge_count(),
            root.is_forest()
        );
        positions
    }
}
