//! User-dragged card positions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::graph::RelativeId;

/// Sparse map of relative id to a world position chosen by dragging.
///
/// Entries are never dropped by filtering; a position for a relative that is
/// currently filtered out is simply unused until the relative comes back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManualPositions {
    positions: HashMap<RelativeId, Point>,
}

impl ManualPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: RelativeId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    /// Pin a relative's top-left corner at `position`.
    pub fn set(&mut self, id: RelativeId, position: Point) {
        self.positions.insert(id, position);
    }

    pub fn remove(&mut self, id: RelativeId) -> Option<Point> {
        self.positions.remove(&id)
    }

    pub fn contains(&self, id: RelativeId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Forget every manual position.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RelativeId, Point)> + '_ {
        self.positions.iter().map(|(&id, &p)| (id, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_previous_position() {
        let mut manual = ManualPositions::new();
        manual.set(RelativeId(1), Point::new(10.0, 20.0));
        manual.set(RelativeId(1), Point::new(30.0, 40.0));

        assert_eq!(manual.len(), 1);
        assert_eq!(manual.get(RelativeId(1)), Some(Point::new(30.0, 40.0)));
        assert_eq!(manual.get(RelativeId(2)), None);
    }

    #[test]
    fn test_clear_and_remove() {
        let mut manual = ManualPositions::new();
        manual.set(RelativeId(1), Point::ORIGIN);
        manual.set(RelativeId(2), Point::ORIGIN);

        assert_eq!(manual.remove(RelativeId(1)), Some(Point::ORIGIN));
        assert!(!manual.contains(RelativeId(1)));
        manual.clear();
        assert!(manual.is_empty());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut manual = ManualPositions::new();
        manual.set(RelativeId(7), Point::new(1.0, 2.0));
        let json = serde_json::to_value(&manual).unwrap();
        assert_eq!(json, serde_json::json!({"7": {"x": 1.0, "y": 2.0}}));

        let back: ManualPositions = serde_json::from_value(json).unwrap();
        assert_eq!(back, manual);
    }
}
