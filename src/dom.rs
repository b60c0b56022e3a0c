//! Browser event plumbing for the canvas facade.
//!
//! While a card is dragged the pointer may leave the canvas, so move and
//! release events are taken from the window. The four window listeners are
//! created once per canvas and only (de)registered per drag through a
//! [`PointerCapture`] guard.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::Function;
use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Element, Event, MouseEvent, TouchEvent, TouchList};

use crate::geometry::Point;
use crate::interaction::{CaptureProvider, Effect, PointerCapture, PointerTarget};
use crate::session::CanvasSession;

/// Elements that receive their own presses and never start a pan.
pub const CONTROL_SELECTOR: &str = ".control-panel, button, .ant-modal";

/// Card elements; their presses arrive through the card handler.
pub const CARD_SELECTOR: &str = ".relative-card";

pub type SharedSession = Rc<RefCell<CanvasSession>>;

/// Host callback invoked after a pointer event changed the view or layout.
///
/// Called with a single boolean: whether card positions changed.
#[derive(Clone, Default)]
pub struct ChangeNotifier(Rc<RefCell<Option<Function>>>);

impl ChangeNotifier {
    pub fn set(&self, callback: Option<Function>) {
        *self.0.borrow_mut() = callback;
    }

    pub fn notify(&self, effect: Effect) {
        if effect.is_none() {
            return;
        }
        // Clone out so the host may replace the callback from inside it.
        let callback = self.0.borrow().clone();
        if let Some(callback) = callback
            && let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_bool(effect.relayout))
        {
            warn!("canvas: change callback threw {err:?}");
        }
    }
}

pub fn mouse_point(event: &MouseEvent) -> Point {
    Point::new(event.client_x() as f64, event.client_y() as f64)
}

/// Client positions of the active touches, in list order.
pub fn touch_points(event: &TouchEvent) -> Vec<Point> {
    let list: TouchList = event.touches();
    (0..list.length())
        .filter_map(|i| list.get(i))
        .map(|t| Point::new(t.client_x() as f64, t.client_y() as f64))
        .collect()
}

fn closest(event: &Event, selector: &str) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(selector).ok().flatten())
        .is_some()
}

/// Classify a press that reached the canvas itself.
///
/// `None` means a card handler already took it.
pub fn canvas_target(event: &impl AsRef<Event>) -> Option<PointerTarget> {
    let event: &Event = event.as_ref();
    if closest(event, CARD_SELECTOR) {
        None
    } else if closest(event, CONTROL_SELECTOR) {
        Some(PointerTarget::Control)
    } else {
        Some(PointerTarget::Canvas)
    }
}

/// Run `step` on the session if it is still alive and not already borrowed,
/// then tell the host what changed.
fn drive(
    session: &Weak<RefCell<CanvasSession>>,
    notifier: &ChangeNotifier,
    step: impl FnOnce(&mut CanvasSession) -> Effect,
) {
    let Some(session) = session.upgrade() else {
        return;
    };
    let effect = match session.try_borrow_mut() {
        Ok(mut session) => step(&mut *session),
        Err(_) => {
            warn!("canvas: window event while the session is busy");
            return;
        }
    };
    notifier.notify(effect);
}

type Listener<E> = Closure<dyn FnMut(E)>;

/// Window listeners for an in-progress card drag.
pub struct DragListeners {
    mouse_move: Listener<MouseEvent>,
    mouse_up: Listener<MouseEvent>,
    touch_move: Listener<TouchEvent>,
    touch_end: Listener<TouchEvent>,
}

impl DragListeners {
    pub fn new(session: &SharedSession, notifier: &ChangeNotifier) -> Self {
        let weak = Rc::downgrade(session);

        let (s, n) = (weak.clone(), notifier.clone());
        let mouse_move = Listener::<MouseEvent>::new(move |event: MouseEvent| {
            event.prevent_default();
            let client = mouse_point(&event);
            drive(&s, &n, |session| session.pointer_move(client));
        });

        let (s, n) = (weak.clone(), notifier.clone());
        let mouse_up = Listener::<MouseEvent>::new(move |_: MouseEvent| {
            drive(&s, &n, |session| {
                session.pointer_up();
                Effect::NONE
            });
        });

        let (s, n) = (weak.clone(), notifier.clone());
        let touch_move = Listener::<TouchEvent>::new(move |event: TouchEvent| {
            let touches = touch_points(&event);
            drive(&s, &n, |session| session.touch_move(&touches));
        });

        let (s, n) = (weak, notifier.clone());
        let touch_end = Listener::<TouchEvent>::new(move |_: TouchEvent| {
            drive(&s, &n, |session| {
                session.touch_end();
                Effect::NONE
            });
        });

        Self {
            mouse_move,
            mouse_up,
            touch_move,
            touch_end,
        }
    }

    /// (event type, callback, passive)
    fn callbacks(&self) -> [(&'static str, &Function, bool); 4] {
        [
            ("mousemove", self.mouse_move.as_ref().unchecked_ref(), false),
            ("mouseup", self.mouse_up.as_ref().unchecked_ref(), true),
            ("touchmove", self.touch_move.as_ref().unchecked_ref(), false),
            ("touchend", self.touch_end.as_ref().unchecked_ref(), true),
        ]
    }
}

/// Window-level pointer capture backed by shared [`DragListeners`].
pub struct WindowCapture {
    listeners: Rc<DragListeners>,
}

impl WindowCapture {
    pub fn new(listeners: Rc<DragListeners>) -> Self {
        Self { listeners }
    }
}

impl CaptureProvider for WindowCapture {
    fn capture(&mut self) -> PointerCapture {
        let Some(window) = web_sys::window() else {
            warn!("canvas: no window, dragging without capture");
            return PointerCapture::detached();
        };

        for (kind, callback, passive) in self.listeners.callbacks() {
            let options = AddEventListenerOptions::new();
            options.set_passive(passive);
            if let Err(err) = window
                .add_event_listener_with_callback_and_add_event_listener_options(
                    kind, callback, &options,
                )
            {
                warn!("canvas: could not listen for {kind}: {err:?}");
            }
        }

        let listeners = Rc::clone(&self.listeners);
        PointerCapture::new(move || {
            for (kind, callback, _) in listeners.callbacks() {
                if let Err(err) = window.remove_event_listener_with_callback(kind, callback) {
                    warn!("canvas: could not stop listening for {kind}: {err:?}");
                }
            }
        })
    }
}
