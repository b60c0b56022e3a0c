//! Viewport - screen/world coordinate transform under pan and zoom.
//!
//! Three coordinate spaces are involved:
//! - **world**: layout positions as produced by the layout engine
//! - **canvas**: world shifted so the padded content box starts at (0, 0);
//!   cards and edges are drawn in this space
//! - **client**: browser pixels; `client - container = offset + canvas * scale`
//!
//! The viewport also tracks the two auto-centering flags: whether the view
//! was auto-centered since the last data/filter change, and whether the user
//! has taken control of the view (pan, drag, wheel zoom, fit or center).

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};
use crate::layout::NodePosition;

/// Zoom limits, step factors and canvas padding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Wheel step toward the user (scroll up).
    pub wheel_zoom_in: f64,
    /// Wheel step away from the user (scroll down).
    pub wheel_zoom_out: f64,
    pub button_zoom_in: f64,
    pub button_zoom_out: f64,
    /// Screen padding around the content for fit-to-view.
    pub fit_padding: f64,
    pub fit_min_scale: f64,
    pub fit_max_scale: f64,
    /// World padding added around the content box.
    pub canvas_padding: f64,
    pub min_canvas_width: f64,
    pub min_canvas_height: f64,
    /// Canvas origin used while there is nothing to show.
    pub empty_origin: Point,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.15,
            max_scale: 3.0,
            wheel_zoom_in: 1.08,
            wheel_zoom_out: 0.92,
            button_zoom_in: 1.15,
            button_zoom_out: 0.85,
            fit_padding: 80.0,
            fit_min_scale: 0.2,
            fit_max_scale: 1.5,
            canvas_padding: 1000.0,
            min_canvas_width: 3200.0,
            min_canvas_height: 2600.0,
            empty_origin: Point::new(-1200.0, -900.0),
        }
    }
}

impl ViewportConfig {
    /// Reject scale bounds and step factors that cannot describe a zoom.
    ///
    /// Bounds must be finite, positive and ordered (`min <= max`); zoom steps
    /// must be finite and positive.
    pub fn validate(&self) -> Result<(), String> {
        check_range("min_scale", self.min_scale, "max_scale", self.max_scale)?;
        check_range(
            "fit_min_scale",
            self.fit_min_scale,
            "fit_max_scale",
            self.fit_max_scale,
        )?;
        for (name, factor) in [
            ("wheel_zoom_in", self.wheel_zoom_in),
            ("wheel_zoom_out", self.wheel_zoom_out),
            ("button_zoom_in", self.button_zoom_in),
            ("button_zoom_out", self.button_zoom_out),
        ] {
            check_positive(name, factor)?;
        }
        Ok(())
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        bounded(scale, self.min_scale, self.max_scale)
    }
}

fn check_positive(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{name} must be a positive finite number, got {value}"))
    }
}

fn check_range(min_name: &str, min: f64, max_name: &str, max: f64) -> Result<(), String> {
    check_positive(min_name, min)?;
    check_positive(max_name, max)?;
    if min > max {
        return Err(format!("{min_name} ({min}) exceeds {max_name} ({max})"));
    }
    Ok(())
}

/// `value` limited to `[min, max]`. Unlike `f64::clamp` this never panics;
/// with inverted bounds `max` wins.
fn bounded(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Padded bounding box of all cards, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasMetrics {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
    pub content_min_x: f64,
    pub content_max_x: f64,
    pub content_min_y: f64,
    pub content_max_y: f64,
    /// False for the fixed fallback box used with zero cards.
    pub has_content: bool,
}

impl Default for CanvasMetrics {
    fn default() -> Self {
        Self::empty(&ViewportConfig::default(), Size::new(208.0, 280.0))
    }
}

impl CanvasMetrics {
    /// Fallback box used when no card is laid out.
    pub fn empty(config: &ViewportConfig, card: Size) -> Self {
        Self {
            origin_x: config.empty_origin.x,
            origin_y: config.empty_origin.y,
            width: config.min_canvas_width,
            height: config.min_canvas_height,
            content_min_x: 0.0,
            content_max_x: card.width,
            content_min_y: 0.0,
            content_max_y: card.height,
            has_content: false,
        }
    }

    /// Metrics covering every card in `positions`.
    pub fn compute(positions: &[NodePosition], card: Size, config: &ViewportConfig) -> Self {
        if positions.is_empty() {
            return Self::empty(config, card);
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for p in positions {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x + card.width);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y + card.height);
        }

        let padding = config.canvas_padding;
        Self {
            origin_x: min_x - padding,
            origin_y: min_y - padding,
            width: (max_x - min_x + 2.0 * padding).max(config.min_canvas_width),
            height: (max_y - min_y + 2.0 * padding).max(config.min_canvas_height),
            content_min_x: min_x,
            content_max_x: max_x,
            content_min_y: min_y,
            content_max_y: max_y,
            has_content: true,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.origin_x, self.origin_y)
    }

    /// Content bounding box in world coordinates.
    pub fn content(&self) -> Rect {
        Rect::new(
            self.content_min_x,
            self.content_min_y,
            self.content_max_x - self.content_min_x,
            self.content_max_y - self.content_min_y,
        )
    }

    /// World -> canvas.
    #[inline]
    pub fn to_canvas(&self, world: Point) -> Point {
        world - self.origin()
    }

    /// Canvas -> world.
    #[inline]
    pub fn to_world(&self, canvas: Point) -> Point {
        canvas + self.origin()
    }
}

/// Direction of a single zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel convention: positive delta scrolls down and zooms out.
    pub fn from_wheel_delta(delta_y: f64) -> Self {
        if delta_y > 0.0 {
            ZoomDirection::Out
        } else {
            ZoomDirection::In
        }
    }
}

/// Pan/zoom state of the canvas.
#[derive(Debug, Clone)]
pub struct Viewport {
    scale: f64,
    /// Client-space translation of the canvas inside the container.
    offset: Point,
    metrics: CanvasMetrics,
    config: ViewportConfig,
    auto_centered: bool,
    user_panned: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportConfig::default())
    }
}

impl Viewport {
    pub fn new(config: ViewportConfig) -> Self {
        Self {
            scale: 1.0,
            offset: Point::ORIGIN,
            metrics: CanvasMetrics::default(),
            config,
            auto_centered: false,
            user_panned: false,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn metrics(&self) -> &CanvasMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ViewportConfig) {
        self.scale = config.clamp_scale(self.scale);
        self.config = config;
    }

    /// Install the metrics of a fresh layout.
    pub fn set_metrics(&mut self, metrics: CanvasMetrics) {
        self.metrics = metrics;
    }

    /// Move the canvas to an explicit client-space offset.
    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub fn is_auto_centered(&self) -> bool {
        self.auto_centered
    }

    pub fn has_user_panned(&self) -> bool {
        self.user_panned
    }

    /// Record that the user took control of the view.
    pub fn mark_user_panned(&mut self) {
        self.user_panned = true;
    }

    /// Allow the next layout to auto-center again.
    pub fn invalidate_auto_center(&mut self) {
        self.auto_centered = false;
        self.user_panned = false;
    }

    /// World -> canvas.
    #[inline]
    pub fn to_canvas(&self, world: Point) -> Point {
        self.metrics.to_canvas(world)
    }

    /// Client pixel -> world position.
    ///
    /// `container` is the client-space top-left corner of the canvas container.
    pub fn client_to_world(&self, client: Point, container: Point) -> Point {
        let canvas = (client - container - self.offset) * (1.0 / self.scale);
        self.metrics.to_world(canvas)
    }

    /// World position -> client pixel.
    pub fn world_to_client(&self, world: Point, container: Point) -> Point {
        container + self.offset + self.to_canvas(world) * self.scale
    }

    /// Wheel zoom keeping the world point under `pointer` fixed.
    ///
    /// `pointer` is relative to the container's top-left corner.
    pub fn zoom_at(&mut self, pointer: Point, direction: ZoomDirection) {
        let factor = match direction {
            ZoomDirection::In => self.config.wheel_zoom_in,
            ZoomDirection::Out => self.config.wheel_zoom_out,
        };
        let new_scale = self.config.clamp_scale(self.scale * factor);
        let ratio = new_scale / self.scale;
        self.offset = pointer - (pointer - self.offset) * ratio;
        self.scale = new_scale;
        self.user_panned = true;
    }

    /// Toolbar zoom in (no anchor).
    pub fn zoom_in(&mut self) {
        self.scale = self.config.clamp_scale(self.scale * self.config.button_zoom_in);
    }

    /// Toolbar zoom out (no anchor).
    pub fn zoom_out(&mut self) {
        self.scale = self.config.clamp_scale(self.scale * self.config.button_zoom_out);
    }

    pub fn reset_zoom(&mut self) {
        self.scale = 1.0;
    }

    /// Scale 1, no translation.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.offset = Point::ORIGIN;
    }

    /// Offset that centers the content box at the current scale.
    fn centered_offset(&self, container: Size) -> Point {
        let content = self.metrics.content();
        let min = self.to_canvas(content.origin);
        Point::new(
            (container.width - content.size.width * self.scale) / 2.0 - min.x * self.scale,
            (container.height - content.size.height * self.scale) / 2.0 - min.y * self.scale,
        )
    }

    /// Center the content once per layout change.
    ///
    /// Does nothing when already centered since the last invalidation, when
    /// the user has panned, or when there is no content. Returns whether the
    /// offset changed.
    pub fn auto_center(&mut self, container: Size) -> bool {
        if self.auto_centered || self.user_panned || !self.metrics.has_content {
            return false;
        }
        self.offset = self.centered_offset(container);
        self.auto_centered = true;
        debug!("viewport: auto-centered at offset {:?}", self.offset);
        true
    }

    /// Center the content at the current scale.
    pub fn center_view(&mut self, container: Size) {
        if !self.metrics.has_content {
            return;
        }
        self.offset = self.centered_offset(container);
        self.user_panned = true;
    }

    /// Scale and center so the whole content fits the container.
    pub fn fit_to_view(&mut self, container: Size) {
        if !self.metrics.has_content || container.is_empty() {
            return;
        }
        let padding = self.config.fit_padding;
        let content = self.metrics.content();
        let content_w = content.size.width + 2.0 * padding;
        let content_h = content.size.height + 2.0 * padding;

        let fit = (container.width / content_w).min(container.height / content_h);
        let scale = bounded(fit, self.config.fit_min_scale, self.config.fit_max_scale);

        let min = self.to_canvas(content.origin) - Point::new(padding, padding);
        self.offset = Point::new(
            (container.width - content_w * scale) / 2.0 - min.x * scale,
            (container.height - content_h * scale) / 2.0 - min.y * scale,
        );
        self.scale = scale;
        self.user_panned = true;
        debug!("viewport: fit to view at scale {scale:.3}");
    }
}
