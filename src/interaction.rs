//! Pan/zoom/drag interaction state machine.
//!
//! The controller owns the viewport and the manual positions and turns raw
//! pointer input into view changes and card moves. It never touches the DOM:
//! hit-testing of host UI is expressed through [`PointerTarget`], and
//! window-level pointer capture during a card drag goes through a
//! [`CaptureProvider`] that hands back a scoped [`PointerCapture`] guard.
//!
//! Gestures are mutually exclusive: the controller is idle, panning the
//! canvas, or dragging exactly one card.

use std::fmt;

use log::{debug, trace};

use crate::geometry::{Point, Rect, Size};
use crate::graph::RelativeId;
use crate::layout::ManualPositions;
use crate::spatial::SpatialIndex;
use crate::viewport::{Viewport, ZoomDirection};

/// What the pointer went down on, as classified by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// Empty canvas, or a point the host did not classify. The controller
    /// still checks its card index, so a press on a card is never a pan.
    Canvas,
    /// A relative card.
    Card(RelativeId),
    /// Host chrome (panels, buttons, dialogs). Ignored.
    Control,
}

/// Scoped pointer capture. Releasing happens on drop.
pub struct PointerCapture {
    release: Option<Box<dyn FnOnce()>>,
}

impl PointerCapture {
    /// Capture that runs `release` when dropped.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Capture with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }
}

impl Drop for PointerCapture {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for PointerCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerCapture")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Source of window-level pointer capture for card drags.
pub trait CaptureProvider {
    fn capture(&mut self) -> PointerCapture;
}

/// Provider for hosts that deliver every pointer event anyway.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapture;

impl CaptureProvider for NoCapture {
    fn capture(&mut self) -> PointerCapture {
        PointerCapture::detached()
    }
}

/// Current gesture.
#[derive(Debug, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Canvas pan; `anchor` is the client point minus the offset at press.
    Panning { anchor: Point },
    /// Card drag; `grab_offset` is the pointer's world position minus the
    /// card's top-left corner at press.
    DraggingNode {
        id: RelativeId,
        grab_offset: Point,
        capture: PointerCapture,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    pub fn is_panning(&self) -> bool {
        matches!(self, Gesture::Panning { .. })
    }

    /// The card being dragged, if any.
    pub fn dragged(&self) -> Option<RelativeId> {
        match self {
            Gesture::DraggingNode { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// What an input event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Effect {
    /// Manual positions changed; the layout must be recomputed.
    pub relayout: bool,
    /// Scale or offset changed; the host must re-apply the transform.
    pub view_changed: bool,
}

impl Effect {
    pub const NONE: Effect = Effect {
        relayout: false,
        view_changed: false,
    };
    pub const RELAYOUT: Effect = Effect {
        relayout: true,
        view_changed: false,
    };
    pub const VIEW: Effect = Effect {
        relayout: false,
        view_changed: true,
    };

    pub fn is_none(self) -> bool {
        self == Effect::NONE
    }
}

/// Pointer interaction controller.
#[derive(Debug, Default)]
pub struct InteractionController {
    viewport: Viewport,
    manual: ManualPositions,
    gesture: Gesture,
    /// Client-space bounds of the canvas container.
    container: Rect,
}

impl InteractionController {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn manual_positions(&self) -> &ManualPositions {
        &self.manual
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn container(&self) -> Rect {
        self.container
    }

    /// Update the container's client-space bounds (on resize or scroll).
    pub fn set_container(&mut self, container: Rect) {
        self.container = container;
    }

    pub fn container_size(&self) -> Size {
        self.container.size
    }

    /// Client pixel -> world position under the current transform.
    pub fn client_to_world(&self, client: Point) -> Point {
        self.viewport.client_to_world(client, self.container.origin)
    }

    /// Press at `client` on `target`.
    pub fn pointer_down(
        &mut self,
        client: Point,
        target: PointerTarget,
        cards: &SpatialIndex,
        captures: &mut dyn CaptureProvider,
    ) -> Effect {
        // A card drag owns the pointer until it is released.
        if self.gesture.dragged().is_some() {
            trace!("gesture: press ignored during a card drag");
            return Effect::NONE;
        }
        let card = match target {
            PointerTarget::Control => return Effect::NONE,
            PointerTarget::Card(id) => Some(id),
            PointerTarget::Canvas => cards.card_at(self.client_to_world(client)),
        };

        match card {
            Some(id) => self.begin_drag(client, id, cards, captures),
            None => {
                let anchor = client - self.viewport.offset();
                self.gesture = Gesture::Panning { anchor };
                self.viewport.mark_user_panned();
                trace!("gesture: panning from {anchor:?}");
            }
        }
        Effect::NONE
    }

    fn begin_drag(
        &mut self,
        client: Point,
        id: RelativeId,
        cards: &SpatialIndex,
        captures: &mut dyn CaptureProvider,
    ) {
        let Some(card) = cards.position_of(id) else {
            debug!("gesture: ignoring press on unknown card {id}");
            return;
        };
        let grab_offset = self.client_to_world(client) - card;
        // Replace first so a previous capture is released before the new one.
        self.gesture = Gesture::Idle;
        self.gesture = Gesture::DraggingNode {
            id,
            grab_offset,
            capture: captures.capture(),
        };
        self.viewport.mark_user_panned();
        debug!("gesture: dragging {id}");
    }

    /// Pointer moved to `client`.
    pub fn pointer_move(&mut self, client: Point) -> Effect {
        match &self.gesture {
            Gesture::DraggingNode {
                id, grab_offset, ..
            } => {
                let position = self.client_to_world(client) - *grab_offset;
                self.manual.set(*id, position);
                Effect::RELAYOUT
            }
            Gesture::Panning { anchor } => {
                let offset = client - *anchor;
                self.viewport.set_offset(offset);
                Effect::VIEW
            }
            Gesture::Idle => Effect::NONE,
        }
    }

    /// Release; ends whatever gesture is active. Returns whether one was.
    pub fn pointer_up(&mut self) -> bool {
        let ended = !self.gesture.is_idle();
        if let Some(id) = self.gesture.dragged() {
            debug!("gesture: dropped {id}");
        }
        self.gesture = Gesture::Idle;
        ended
    }

    /// Pointer left the container. Ends a pan; a card drag is captured at
    /// window level and keeps going.
    pub fn pointer_leave(&mut self) -> bool {
        if self.gesture.is_panning() {
            self.gesture = Gesture::Idle;
            return true;
        }
        false
    }

    /// Wheel over the container. Always zooms toward the pointer.
    pub fn wheel(&mut self, client: Point, delta_y: f64) -> Effect {
        let pointer = client - self.container.origin;
        self.viewport
            .zoom_at(pointer, ZoomDirection::from_wheel_delta(delta_y));
        Effect::VIEW
    }

    /// First touch down. Extra fingers are ignored.
    pub fn touch_start(
        &mut self,
        touches: &[Point],
        target: PointerTarget,
        cards: &SpatialIndex,
        captures: &mut dyn CaptureProvider,
    ) -> Effect {
        match touches.first() {
            Some(&touch) => self.pointer_down(touch, target, cards, captures),
            None => Effect::NONE,
        }
    }

    pub fn touch_move(&mut self, touches: &[Point]) -> Effect {
        match touches.first() {
            Some(&touch) => self.pointer_move(touch),
            None => Effect::NONE,
        }
    }

    pub fn touch_end(&mut self) -> bool {
        self.pointer_up()
    }

    /// Forget every dragged position and let the next layout re-center.
    pub fn reset_positions(&mut self) -> Effect {
        self.gesture = Gesture::Idle;
        self.manual.clear();
        self.viewport.invalidate_auto_center();
        Effect::RELAYOUT
    }
}
