//! Same-generation overlap removal.
//!
//! Runs after manual overrides, so a dragged card can push its automatically
//! placed right-hand neighbours further right. Cards only ever move right.

use std::collections::BTreeMap;

use super::NodePosition;

/// Push cards right so that, within each generation, consecutive cards are
/// at least `min_spacing` apart in x (left edge to left edge).
///
/// `generations[i]` is the generation row of `positions[i]`. Positions keep
/// their order; only `x` changes. Ties in x keep their input order.
pub fn resolve_collisions(positions: &mut [NodePosition], generations: &[i32], min_spacing: f64) {
    debug_assert_eq!(positions.len(), generations.len());

    let mut rows: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (index, &generation) in generations.iter().enumerate().take(positions.len()) {
        rows.entry(generation).or_default().push(index);
    }

    for row in rows.values_mut() {
        row.sort_by(|&a, &b| positions[a].x.total_cmp(&positions[b].x));

        let mut cursor = f64::NEG_INFINITY;
        for &index in row.iter() {
            let x = positions[index].x.max(cursor);
            positions[index].x = x;
            cursor = x + min_spacing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RelativeId;

    fn node(id: i64, x: f64) -> NodePosition {
        NodePosition {
            relative: RelativeId(id),
            x,
            y: 0.0,
        }
    }

    #[test]
    fn test_overlapping_cards_are_pushed_right() {
        let mut positions = vec![node(1, 0.0), node(2, 100.0), node(3, 120.0)];
        resolve_collisions(&mut positions, &[0, 0, 0], 256.0);

        assert_eq!(positions[0].x, 0.0);
        assert_eq!(positions[1].x, 256.0);
        assert_eq!(positions[2].x, 512.0);
    }

    #[test]
    fn test_generations_are_independent() {
        let mut positions = vec![node(1, 0.0), node(2, 10.0)];
        resolve_collisions(&mut positions, &[0, 1], 256.0);
        assert_eq!(positions[1].x, 10.0);
    }

    #[test]
    fn test_output_order_is_preserved() {
        // Node 1 sits to the right of node 2 in x but comes first in input.
        let mut positions = vec![node(1, 300.0), node(2, 0.0)];
        resolve_collisions(&mut positions, &[2, 2], 256.0);

        assert_eq!(positions[0].relative, RelativeId(1));
        assert_eq!(positions[0].x, 300.0);
        assert_eq!(positions[1].x, 0.0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let mut positions = vec![node(5, 50.0), node(4, 50.0)];
        resolve_collisions(&mut positions, &[0, 0], 100.0);
        assert_eq!(positions[0].x, 50.0);
        assert_eq!(positions[1].x, 150.0);
    }

    #[test]
    fn test_far_apart_cards_are_untouched() {
        let mut positions = vec![node(1, -500.0), node(2, 500.0)];
        resolve_collisions(&mut positions, &[0, 0], 256.0);
        assert_eq!(positions[0].x, -500.0);
        assert_eq!(positions[1].x, 500.0);
    }
}
