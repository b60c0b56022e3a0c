//! Relationship edge routing.
//!
//! Turns each relationship into a drawable descriptor: an SVG path in canvas
//! space, label placement and stroke styling. The route shape depends on the
//! relationship category and on whether both relatives share a generation:
//!
//! | kind                 | when                                   | shape                          |
//! |----------------------|----------------------------------------|--------------------------------|
//! | `SpouseWire`         | spousal type                           | orthogonal wire over a bus     |
//! | `SiblingArc`         | sibling type, same generation          | arc bowing above both cards    |
//! | `SameGenerationArc`  | any other type, same generation        | S-curve between facing edges   |
//! | `Descent`            | different generations                  | S-curve from bottom to top     |
//!
//! Several relationships between the same two relatives are fanned out by a
//! per-pair offset so that none of them is hidden under another.

mod path;

use std::collections::HashMap;

use log::trace;
use serde::Serialize;

pub use path::{PathData, s_curve};

use crate::geometry::{Point, Size};
use crate::graph::{Relationship, RelationshipId, RelationshipType, Relative, RelativeId};
use crate::layout::NodePosition;
use crate::viewport::CanvasMetrics;

/// Spacing between fanned-out duplicate edges.
const DUPLICATE_SPACING: f64 = 40.0;

/// Route shape of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteKind {
    SpouseWire,
    SiblingArc,
    SameGenerationArc,
    Descent,
}

/// End marker of the crisp stroke.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum Marker {
    /// Filled circle, referenced by SVG id.
    Dot { id: String, radius: f64, opacity: f64 },
}

impl Marker {
    fn dot_for(kind: RelationshipType) -> Self {
        Marker::Dot {
            id: format!("arrow-{}", kind.as_str()),
            radius: 3.2,
            opacity: 0.9,
        }
    }
}

/// One stroke pass of an edge path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrokeLayer {
    pub width: f64,
    pub opacity: f64,
}

impl StrokeLayer {
    /// Wide translucent underlay.
    pub const GLOW: StrokeLayer = StrokeLayer {
        width: 8.0,
        opacity: 0.12,
    };
    /// Crisp foreground line carrying the end marker.
    pub const CRISP: StrokeLayer = StrokeLayer {
        width: 2.4,
        opacity: 1.0,
    };
}

/// Everything needed to draw one relationship edge, in canvas space.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescriptor {
    pub relationship_id: RelationshipId,
    pub relationship_type: RelationshipType,
    pub kind: RouteKind,
    /// SVG path data.
    pub path: String,
    pub start: Point,
    pub end: Point,
    /// Center of the label pill.
    pub label_position: Point,
    pub label: String,
    pub label_width: f64,
    pub color: &'static str,
    pub marker: Marker,
    /// Drawn in order: glow first, crisp on top.
    pub layers: [StrokeLayer; 2],
    /// Offset applied to fan out duplicate pairs (0 for unique pairs).
    pub duplicate_offset: f64,
}

/// Label pill width for a label of `chars` characters.
pub fn label_width(label: &str) -> f64 {
    let chars = label.chars().count() as f64;
    (chars * 8.0 + 20.0).max(70.0)
}

/// Fan-out offset of the `index`-th of `count` edges between one pair.
pub fn duplicate_offset(index: usize, count: usize) -> f64 {
    if count <= 1 {
        return 0.0;
    }
    (index as f64 - (count - 1) as f64 / 2.0) * DUPLICATE_SPACING
}

/// Routes relationship edges between laid-out cards.
#[derive(Debug, Clone)]
pub struct EdgeRouter {
    card: Size,
}

impl Default for EdgeRouter {
    fn default() -> Self {
        Self::new(Size::new(208.0, 280.0))
    }
}

/// Endpoint data resolved for one relationship.
struct Endpoint {
    position: Point,
    generation: Option<i32>,
}

impl EdgeRouter {
    pub fn new(card: Size) -> Self {
        Self { card }
    }

    /// Route every relationship whose endpoints both have a position.
    ///
    /// Output keeps relationship input order; unroutable edges are skipped.
    pub fn route(
        &self,
        relationships: &[Relationship],
        relatives: &[Relative],
        positions: &[NodePosition],
        metrics: &CanvasMetrics,
    ) -> Vec<EdgeDescriptor> {
        let mut generations: HashMap<RelativeId, Option<i32>> =
            HashMap::with_capacity(relatives.len());
        for relative in relatives {
            generations.entry(relative.id).or_insert(relative.generation);
        }
        let mut endpoints: HashMap<RelativeId, Endpoint> = HashMap::with_capacity(positions.len());
        for p in positions {
            endpoints.entry(p.relative).or_insert(Endpoint {
                position: p.point(),
                generation: generations.get(&p.relative).copied().flatten(),
            });
        }

        // Index of each relationship within its unordered pair, over the
        // full list so offsets do not depend on what is currently visible.
        let mut pair_sizes: HashMap<(RelativeId, RelativeId), usize> = HashMap::new();
        let pair_slots: Vec<usize> = relationships
            .iter()
            .map(|rel| {
                let size = pair_sizes.entry(rel.pair_key()).or_insert(0);
                *size += 1;
                *size - 1
            })
            .collect();

        let mut edges = Vec::with_capacity(relationships.len());
        for (rel, slot) in relationships.iter().zip(pair_slots) {
            let (Some(from), Some(to)) = (
                endpoints.get(&rel.from_relative_id),
                endpoints.get(&rel.to_relative_id),
            ) else {
                trace!("route: {} has an endpoint without a card", rel.id);
                continue;
            };
            let count = pair_sizes.get(&rel.pair_key()).copied().unwrap_or(1);
            let dup = duplicate_offset(slot, count);
            edges.push(self.route_one(rel, from, to, dup, metrics));
        }
        edges
    }

    fn route_one(
        &self,
        rel: &Relationship,
        from: &Endpoint,
        to: &Endpoint,
        dup: f64,
        metrics: &CanvasMetrics,
    ) -> EdgeDescriptor {
        let kind = rel.relationship_type;
        let same_generation = from.generation == to.generation;
        let (w, h) = (self.card.width, self.card.height);
        let (a, b) = (from.position, to.position);
        let canvas = |x: f64, y: f64| metrics.to_canvas(Point::new(x, y));

        // Horizontal attachment on the facing vertical card edges.
        let from_left = a.x <= b.x;
        let facing_x = |from_x: f64, to_x: f64| {
            if from_left {
                (from_x + w, to_x)
            } else {
                (from_x, to_x + w)
            }
        };

        let (route, start, end, path, label_position) = if kind.is_spousal() {
            let (sx, ex) = facing_x(a.x, b.x);
            let start = canvas(sx, a.y + h * 0.25);
            let end = canvas(ex, b.y + h * 0.25);
            let bus = start.y.min(end.y) - 40.0 - dup.abs() * 0.4;
            let path = PathData::new()
                .move_to(start)
                .vertical_to(bus)
                .horizontal_to(end.x)
                .vertical_to(end.y)
                .build();
            let label = Point::new((start.x + end.x) / 2.0, bus);
            (RouteKind::SpouseWire, start, end, path, label)
        } else if kind.is_sibling() && same_generation {
            let (sx, ex) = facing_x(a.x, b.x);
            let start = canvas(sx, a.y + h * 0.45 + dup);
            let end = canvas(ex, b.y + h * 0.45 - dup);
            let control_y = start.y.min(end.y) - 50.0 - dup.abs() * 0.5;
            let path = PathData::new()
                .move_to(start)
                .cubic_to(
                    Point::new(start.x, control_y),
                    Point::new(end.x, control_y),
                    end,
                )
                .build();
            let label = Point::new((start.x + end.x) / 2.0, control_y - 10.0);
            (RouteKind::SiblingArc, start, end, path, label)
        } else if same_generation {
            let (sx, ex) = facing_x(a.x, b.x);
            let start = canvas(sx, a.y + h / 2.0 + dup);
            let end = canvas(ex, b.y + h / 2.0 - dup);
            let path = s_curve(start, end, 60.0 + dup.abs());
            let label = Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0 - 12.0);
            (RouteKind::SameGenerationArc, start, end, path, label)
        } else {
            let (upper, lower) = if a.y < b.y { (a, b) } else { (b, a) };
            let start = canvas(upper.x + w / 2.0 + dup, upper.y + h);
            let end = canvas(lower.x + w / 2.0 + dup, lower.y);
            let path = s_curve(start, end, 80.0 + dup.abs());
            let label = Point::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0);
            (RouteKind::Descent, start, end, path, label)
        };

        let label = rel.label().to_owned();
        EdgeDescriptor {
            relationship_id: rel.id,
            relationship_type: kind,
            kind: route,
            path,
            start,
            end,
            label_position,
            label_width: label_width(&label),
            label,
            color: kind.color(),
            marker: Marker::dot_for(kind),
            layers: [StrokeLayer::GLOW, StrokeLayer::CRISP],
            duplicate_offset: dup,
        }
    }
}
