//! R-tree based card index using the rstar crate.
//!
//! Provides O(log n) queries for:
//! - Topmost card under a world point
//! - Cards intersecting a world rectangle

use std::collections::HashMap;

use rstar::{AABB, RTree, RTreeObject};

use crate::geometry::{Point, Rect};
use crate::graph::RelativeId;
use crate::layout::{LayoutConfig, NodePosition};

/// A card rectangle in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardRect {
    /// The relative shown on the card.
    pub id: RelativeId,
    /// World-space card bounds.
    pub rect: Rect,
    /// Paint order; later cards are drawn on top.
    pub order: usize,
}

impl RTreeObject for CardRect {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.rect.min_x(), self.rect.min_y()],
            [self.rect.max_x(), self.rect.max_y()],
        )
    }
}

/// Spatial index over the laid-out cards.
///
/// Rebuilt in bulk after every layout pass; never updated incrementally.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<CardRect>,
    by_id: HashMap<RelativeId, CardRect>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the index contents with the cards of a layout.
    pub fn rebuild(&mut self, positions: &[NodePosition], config: &LayoutConfig) {
        let cards: Vec<CardRect> = positions
            .iter()
            .enumerate()
            .map(|(order, p)| CardRect {
                id: p.relative,
                rect: config.card_rect(p.x, p.y),
                order,
            })
            .collect();

        self.by_id = cards.iter().map(|card| (card.id, *card)).collect();
        self.tree = RTree::bulk_load(cards);
    }

    /// The topmost card containing `point`, if any.
    pub fn card_at(&self, point: Point) -> Option<RelativeId> {
        let probe = AABB::from_point([point.x, point.y]);
        self.tree
            .locate_in_envelope_intersecting(&probe)
            .filter(|card| card.rect.contains(point))
            .max_by_key(|card| card.order)
            .map(|card| card.id)
    }

    /// Cards intersecting a world rectangle, in paint order.
    pub fn cards_in(&self, area: Rect) -> Vec<RelativeId> {
        let envelope = AABB::from_corners(
            [area.min_x(), area.min_y()],
            [area.max_x(), area.max_y()],
        );
        let mut cards: Vec<&CardRect> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .collect();
        cards.sort_by_key(|card| card.order);
        cards.into_iter().map(|card| card.id).collect()
    }

    /// Top-left corner of a card.
    pub fn position_of(&self, id: RelativeId) -> Option<Point> {
        self.by_id.get(&id).map(|card| card.rect.origin)
    }

    pub fn rect_of(&self, id: RelativeId) -> Option<Rect> {
        self.by_id.get(&id).map(|card| card.rect)
    }

    /// Clear all cards from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.by_id.clear();
    }

    /// Get the number of cards in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64, x: f64, y: f64) -> NodePosition {
        NodePosition {
            relative: RelativeId(id),
            x,
            y,
        }
    }

    fn index(positions: &[NodePosition]) -> SpatialIndex {
        let mut index = SpatialIndex::new();
        index.rebuild(positions, &LayoutConfig::default());
        index
    }

    #[test]
    fn test_card_at_hits_inside_bounds() {
        let index = index(&[card(1, 0.0, 0.0), card(2, 500.0, 0.0)]);

        assert_eq!(index.card_at(Point::new(10.0, 10.0)), Some(RelativeId(1)));
        assert_eq!(index.card_at(Point::new(600.0, 279.0)), Some(RelativeId(2)));
        assert_eq!(index.card_at(Point::new(300.0, 10.0)), None);
        assert_eq!(index.card_at(Point::new(10.0, 400.0)), None);
    }

    #[test]
    fn test_overlapping_cards_pick_topmost() {
        let index = index(&[card(1, 0.0, 0.0), card(2, 100.0, 100.0)]);
        assert_eq!(index.card_at(Point::new(150.0, 150.0)), Some(RelativeId(2)));
        assert_eq!(index.card_at(Point::new(50.0, 50.0)), Some(RelativeId(1)));
    }

    #[test]
    fn test_cards_in_area() {
        let index = index(&[card(1, 0.0, 0.0), card(2, 1000.0, 0.0), card(3, 2000.0, 0.0)]);
        let hits = index.cards_in(Rect::new(150.0, 100.0, 900.0, 10.0));
        assert_eq!(hits, vec![RelativeId(1), RelativeId(2)]);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut index = index(&[card(1, 0.0, 0.0)]);
        index.rebuild(&[card(2, 10.0, 20.0), card(3, 400.0, 20.0)], &LayoutConfig::default());

        assert_eq!(index.len(), 2);
        assert_eq!(index.position_of(RelativeId(1)), None);
        assert_eq!(index.position_of(RelativeId(2)), Some(Point::new(10.0, 20.0)));
        assert_eq!(index.rect_of(RelativeId(3)).map(|r| r.max_x()), Some(608.0));
    }

    #[test]
    fn test_clear() {
        let mut index = index(&[card(1, 0.0, 0.0)]);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.card_at(Point::new(1.0, 1.0)), None);
    }
}
