//! SVG path data builder.

use std::fmt::Write;

use crate::geometry::Point;

/// Incremental builder for the `d` attribute of an SVG `<path>`.
///
/// Coordinates are written with the shortest exact decimal form, so whole
/// numbers print without a fractional part.
#[derive(Debug, Clone, Default)]
pub struct PathData {
    data: String,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&mut self, command: char) {
        if !self.data.is_empty() {
            self.data.push(' ');
        }
        self.data.push(command);
    }

    pub fn move_to(mut self, p: Point) -> Self {
        self.command('M');
        // Writing into a String cannot fail.
        let _ = write!(self.data, " {} {}", p.x, p.y);
        self
    }

    /// Vertical line to absolute `y`.
    pub fn vertical_to(mut self, y: f64) -> Self {
        self.command('V');
        let _ = write!(self.data, " {y}");
        self
    }

    /// Horizontal line to absolute `x`.
    pub fn horizontal_to(mut self, x: f64) -> Self {
        self.command('H');
        let _ = write!(self.data, " {x}");
        self
    }

    /// Cubic Bezier to `end` with control points `c1` and `c2`.
    pub fn cubic_to(mut self, c1: Point, c2: Point, end: Point) -> Self {
        self.command('C');
        let _ = write!(
            self.data,
            " {} {}, {} {}, {} {}",
            c1.x, c1.y, c2.x, c2.y, end.x, end.y
        );
        self
    }

    pub fn build(self) -> String {
        self.data
    }
}

/// Vertical S-curve from `start` to `end`.
///
/// Control points sit `offset` away from each endpoint along y, pointing
/// toward the other endpoint (away from it when `end` is above `start`).
pub fn s_curve(start: Point, end: Point, offset: f64) -> String {
    let o = if end.y > start.y { offset } else { -offset };
    PathData::new()
        .move_to(start)
        .cubic_to(
            Point::new(start.x, start.y + o),
            Point::new(end.x, end.y - o),
            end,
        )
        .build()
}
