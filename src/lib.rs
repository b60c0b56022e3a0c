//! KinTree - WASM Module
//!
//! This module provides the family tree canvas engine behind the KinTree
//! tree page: card layout, the world/canvas/client transform, relationship
//! edge routing and pan/zoom/drag interaction. It is compiled to WebAssembly
//! and exposes a JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: Relatives, relationships and the parent graph (petgraph StableGraph)
//! - `filter`: Relative filters and generation labels
//! - `layout`: Tidy tree placement, generation rows, manual overrides, collision spacing
//! - `spatial`: R-tree card index for O(log n) hit testing
//! - `viewport`: Canvas metrics, pan/zoom and auto-centering
//! - `routing`: SVG paths and styling for relationship edges
//! - `interaction`: Pointer gesture state machine
//! - `session`: Owner of all of the above, driven by the facade below
//! - `dom`: Window listeners and event decoding for the facade
//! - `error`: Errors raised back to JavaScript

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Float64Array, Function};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use web_sys::{MouseEvent, TouchEvent, WheelEvent};

pub mod dom;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod routing;
pub mod session;
pub mod spatial;
pub mod viewport;

use dom::{ChangeNotifier, DragListeners, SharedSession, WindowCapture};
use error::{CanvasError, Result};
use filter::RelativeFilter;
use geometry::{Point, Rect};
use graph::{Relationship, Relative, RelativeId};
use interaction::PointerTarget;
use layout::{LayoutConfig, NodePosition};
use session::CanvasSession;
use viewport::ViewportConfig;

/// Initialize the WASM module: panic messages and `log` output go to the
/// browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
}

fn from_js<T: DeserializeOwned>(what: &'static str, value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value).map_err(|err| CanvasError::invalid(what, err))
}

/// Like [`from_js`], but `undefined`/`null` mean "all defaults".
fn from_js_or_default<T: DeserializeOwned + Default>(what: &'static str, value: JsValue) -> Result<T> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        from_js(what, value)
    }
}

/// Decode a partial `ViewportConfig` and reject unusable zoom bounds.
fn viewport_config_from_js(value: JsValue) -> Result<ViewportConfig> {
    checked_viewport_config(from_js_or_default("viewport config", value)?)
}

fn checked_viewport_config(config: ViewportConfig) -> Result<ViewportConfig> {
    config
        .validate()
        .map_err(|message| CanvasError::invalid("viewport config", message))?;
    Ok(config)
}

/// Plain objects instead of `Map`s, so the host can read fields directly.
fn to_js<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| CanvasError::serialize(what, err))
}

/// Card positions as `[id0, x0, y0, id1, x1, y1, ...]` in canvas space.
fn canvas_triples(session: &CanvasSession) -> Vec<f64> {
    let viewport = session.viewport();
    let mut out = Vec::with_capacity(session.positions().len() * 3);
    for p in session.positions() {
        let canvas = viewport.to_canvas(p.point());
        out.push(p.relative.raw() as f64);
        out.push(canvas.x);
        out.push(canvas.y);
    }
    out
}

/// Relative ids cross the boundary as JS numbers.
fn relative_id(id: f64) -> RelativeId {
    RelativeId(id as i64)
}

/// Family tree canvas exposed to JavaScript.
///
/// All state lives in a [`CanvasSession`]; the facade decodes host values,
/// forwards DOM events and owns the window listeners used during card drags.
#[wasm_bindgen]
pub struct KinTreeCanvas {
    session: SharedSession,
    notifier: ChangeNotifier,
    listeners: Rc<DragListeners>,
}

impl KinTreeCanvas {
    fn from_session(session: CanvasSession) -> Self {
        let session = Rc::new(RefCell::new(session));
        let notifier = ChangeNotifier::default();
        let listeners = Rc::new(DragListeners::new(&session, &notifier));
        Self {
            session,
            notifier,
            listeners,
        }
    }

    fn capture(&self) -> WindowCapture {
        WindowCapture::new(Rc::clone(&self.listeners))
    }

    fn press(&self, client: Point, target: PointerTarget) {
        let effect = self
            .session
            .borrow_mut()
            .pointer_down(client, target, &mut self.capture());
        self.notifier.notify(effect);
    }

    fn touch(&self, touches: &[Point], target: PointerTarget) {
        let effect = self
            .session
            .borrow_mut()
            .touch_start(touches, target, &mut self.capture());
        self.notifier.notify(effect);
    }
}

#[wasm_bindgen]
impl KinTreeCanvas {
    /// Create a canvas with the default layout and viewport settings.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::from_session(CanvasSession::default())
    }

    /// Create a canvas with partial config overrides.
    ///
    /// # Arguments
    ///
    /// * `layout` - `LayoutConfig` fields (snake_case), or undefined
    /// * `viewport` - `ViewportConfig` fields (snake_case), or undefined
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(layout: JsValue, viewport: JsValue) -> Result<KinTreeCanvas> {
        let layout: LayoutConfig = from_js_or_default("layout config", layout)?;
        let viewport = viewport_config_from_js(viewport)?;
        Ok(Self::from_session(CanvasSession::new(layout, viewport)))
    }

    /// Register the callback run after pointer input changes the view.
    ///
    /// The callback receives `true` when card positions changed (re-read
    /// positions and edges) and `false` for a pure pan/zoom.
    #[wasm_bindgen(js_name = setOnChange)]
    pub fn set_on_change(&self, callback: Option<Function>) {
        self.notifier.set(callback);
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace relatives and relationships and lay out from scratch.
    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&self, relatives: JsValue, relationships: JsValue) -> Result<()> {
        let relatives: Vec<Relative> = from_js("relatives", relatives)?;
        let relationships: Vec<Relationship> = from_js("relationships", relationships)?;
        self.session.borrow_mut().set_data(relatives, relationships);
        Ok(())
    }

    #[wasm_bindgen(js_name = relativeCount)]
    pub fn relative_count(&self) -> usize {
        self.session.borrow().relatives().len()
    }

    /// Set the filter: `{gender, generation, alive, has_stories, search}`.
    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(&self, filter: JsValue) -> Result<()> {
        let filter: RelativeFilter = from_js_or_default("filter", filter)?;
        self.session.borrow_mut().set_filter(filter);
        Ok(())
    }

    #[wasm_bindgen(js_name = clearFilter)]
    pub fn clear_filter(&self) {
        self.session.borrow_mut().clear_filter();
    }

    #[wasm_bindgen(js_name = isFilterActive)]
    pub fn is_filter_active(&self) -> bool {
        self.session.borrow().filter().is_active()
    }

    #[wasm_bindgen(js_name = setLayoutConfig)]
    pub fn set_layout_config(&self, config: JsValue) -> Result<()> {
        let config: LayoutConfig = from_js_or_default("layout config", config)?;
        self.session.borrow_mut().set_layout_config(config);
        Ok(())
    }

    #[wasm_bindgen(js_name = setViewportConfig)]
    pub fn set_viewport_config(&self, config: JsValue) -> Result<()> {
        let config = viewport_config_from_js(config)?;
        self.session.borrow_mut().set_viewport_config(config);
        Ok(())
    }

    // =========================================================================
    // Layout Output
    // =========================================================================

    /// Card positions as a Float64Array of `[id, x, y]` triples in canvas space.
    #[wasm_bindgen(js_name = getPositions)]
    pub fn get_positions(&self) -> Float64Array {
        Float64Array::from(&canvas_triples(&self.session.borrow())[..])
    }

    /// World-space positions as `[{relative, x, y}, ...]`.
    #[wasm_bindgen(js_name = getWorldPositions)]
    pub fn get_world_positions(&self) -> Result<JsValue> {
        let session = self.session.borrow();
        let positions: &[NodePosition] = session.positions();
        to_js("positions", positions)
    }

    /// Canvas-space `[x, y]` of one card.
    #[wasm_bindgen(js_name = getCardPosition)]
    pub fn get_card_position(&self, id: f64) -> Result<Vec<f64>> {
        let id = relative_id(id);
        let p = self
            .session
            .borrow()
            .canvas_position_of(id)
            .ok_or(CanvasError::UnknownRelative(id))?;
        Ok(vec![p.x, p.y])
    }

    /// Routed relationship edges, ready for SVG rendering.
    #[wasm_bindgen(js_name = getEdges)]
    pub fn get_edges(&self) -> Result<JsValue> {
        to_js("edges", &self.session.borrow().edges())
    }

    /// Relatives that pass the current filter.
    #[wasm_bindgen(js_name = getVisibleRelatives)]
    pub fn get_visible_relatives(&self) -> Result<JsValue> {
        to_js("relatives", &self.session.borrow().visible_relatives())
    }

    /// `{generation: {order, roman}}` for every generation in the data.
    #[wasm_bindgen(js_name = getGenerationLabels)]
    pub fn get_generation_labels(&self) -> Result<JsValue> {
        to_js("generation labels", &self.session.borrow().generation_labels())
    }

    /// Canvas origin, size and content box.
    #[wasm_bindgen(js_name = getCanvasMetrics)]
    pub fn get_canvas_metrics(&self) -> Result<JsValue> {
        to_js("canvas metrics", self.session.borrow().viewport().metrics())
    }

    /// Manual positions keyed by relative id.
    #[wasm_bindgen(js_name = getManualPositions)]
    pub fn get_manual_positions(&self) -> Result<JsValue> {
        to_js("manual positions", self.session.borrow().manual_positions())
    }

    /// Relative whose card is under the client point, if any.
    #[wasm_bindgen(js_name = cardAt)]
    pub fn card_at(&self, client_x: f64, client_y: f64) -> Option<f64> {
        let session = self.session.borrow();
        let world = session
            .interaction()
            .client_to_world(Point::new(client_x, client_y));
        session.card_at(world).map(|id| id.raw() as f64)
    }

    // =========================================================================
    // View
    // =========================================================================

    /// Set the container's client rect (`getBoundingClientRect`).
    #[wasm_bindgen(js_name = setContainerRect)]
    pub fn set_container_rect(&self, x: f64, y: f64, width: f64, height: f64) {
        self.session
            .borrow_mut()
            .set_container(Rect::new(x, y, width, height));
    }

    /// CSS transform of the canvas as `[offset_x, offset_y, scale]`.
    #[wasm_bindgen(js_name = getTransform)]
    pub fn get_transform(&self) -> Vec<f64> {
        let session = self.session.borrow();
        let viewport = session.viewport();
        vec![viewport.offset().x, viewport.offset().y, viewport.scale()]
    }

    pub fn scale(&self) -> f64 {
        self.session.borrow().viewport().scale()
    }

    /// Center the content once after a data or filter change.
    ///
    /// Call after every render; returns whether the offset changed.
    #[wasm_bindgen(js_name = autoCenter)]
    pub fn auto_center(&self) -> bool {
        self.session.borrow_mut().auto_center()
    }

    #[wasm_bindgen(js_name = centerView)]
    pub fn center_view(&self) {
        self.session.borrow_mut().center_view();
    }

    #[wasm_bindgen(js_name = fitToView)]
    pub fn fit_to_view(&self) {
        self.session.borrow_mut().fit_to_view();
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        self.session.borrow_mut().viewport_mut().zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        self.session.borrow_mut().viewport_mut().zoom_out();
    }

    #[wasm_bindgen(js_name = resetZoom)]
    pub fn reset_zoom(&self) {
        self.session.borrow_mut().viewport_mut().reset_zoom();
    }

    /// Scale 1 and no translation.
    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&self) {
        self.session.borrow_mut().viewport_mut().reset();
    }

    /// Forget every dragged card position.
    #[wasm_bindgen(js_name = resetPositions)]
    pub fn reset_positions(&self) {
        self.session.borrow_mut().reset_positions();
    }

    // =========================================================================
    // Pointer Input
    // =========================================================================

    /// Canvas `mousedown`. Starts a pan unless the press hit a card or a
    /// control.
    #[wasm_bindgen(js_name = mouseDown)]
    pub fn mouse_down(&self, event: &MouseEvent) {
        if let Some(target) = dom::canvas_target(event) {
            self.press(dom::mouse_point(event), target);
        }
    }

    /// Card `mousedown`. Starts a card drag with window-level capture.
    #[wasm_bindgen(js_name = cardMouseDown)]
    pub fn card_mouse_down(&self, event: &MouseEvent, id: f64) {
        event.stop_propagation();
        event.prevent_default();
        self.press(dom::mouse_point(event), PointerTarget::Card(relative_id(id)));
    }

    #[wasm_bindgen(js_name = mouseMove)]
    pub fn mouse_move(&self, event: &MouseEvent) {
        let effect = self.session.borrow_mut().pointer_move(dom::mouse_point(event));
        self.notifier.notify(effect);
    }

    #[wasm_bindgen(js_name = mouseUp)]
    pub fn mouse_up(&self) {
        self.session.borrow_mut().pointer_up();
    }

    #[wasm_bindgen(js_name = mouseLeave)]
    pub fn mouse_leave(&self) {
        self.session.borrow_mut().pointer_leave();
    }

    /// Container `wheel`. Register with `{ passive: false }`; the default
    /// scroll is suppressed here.
    pub fn wheel(&self, event: &WheelEvent) {
        event.prevent_default();
        event.stop_propagation();
        let client = Point::new(event.client_x() as f64, event.client_y() as f64);
        let effect = self.session.borrow_mut().wheel(client, event.delta_y());
        self.notifier.notify(effect);
    }

    #[wasm_bindgen(js_name = touchStart)]
    pub fn touch_start(&self, event: &TouchEvent) {
        if let Some(target) = dom::canvas_target(event) {
            self.touch(&dom::touch_points(event), target);
        }
    }

    #[wasm_bindgen(js_name = cardTouchStart)]
    pub fn card_touch_start(&self, event: &TouchEvent, id: f64) {
        let touches = dom::touch_points(event);
        if touches.is_empty() {
            return;
        }
        event.stop_propagation();
        self.touch(&touches, PointerTarget::Card(relative_id(id)));
    }

    #[wasm_bindgen(js_name = touchMove)]
    pub fn touch_move(&self, event: &TouchEvent) {
        let effect = self
            .session
            .borrow_mut()
            .touch_move(&dom::touch_points(event));
        self.notifier.notify(effect);
    }

    #[wasm_bindgen(js_name = touchEnd)]
    pub fn touch_end(&self) {
        self.session.borrow_mut().touch_end();
    }

    /// Whether a pan or card drag is in progress.
    #[wasm_bindgen(js_name = isInteracting)]
    pub fn is_interacting(&self) -> bool {
        !self.session.borrow().interaction().gesture().is_idle()
    }

    /// Id of the card being dragged, if any.
    #[wasm_bindgen(js_name = draggedCard)]
    pub fn dragged_card(&self) -> Option<f64> {
        self.session
            .borrow()
            .interaction()
            .gesture()
            .dragged()
            .map(|id| id.raw() as f64)
    }
}

impl Default for KinTreeCanvas {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Integration Tests
// =========================================================================
