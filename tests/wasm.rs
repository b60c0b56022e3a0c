//! Browser smoke tests for the JavaScript facade.
//!
//! Run with `wasm-pack test --headless --chrome`.

#![cfg(target_arch = "wasm32")]

use js_sys::JSON;
use kintree_wasm::KinTreeCanvas;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn json(text: &str) -> JsValue {
    JSON::parse(text).unwrap()
}

fn loaded() -> KinTreeCanvas {
    let canvas = KinTreeCanvas::new();
    canvas.set_container_rect(0.0, 0.0, 1280.0, 800.0);
    canvas
        .set_data(
            json(
                r#"[
                    {"id": 1, "first_name": "A", "last_name": "", "generation": 0},
                    {"id": 2, "first_name": "B", "last_name": "", "generation": 1},
                    {"id": 3, "first_name": "C", "last_name": "", "generation": 1}
                ]"#,
            ),
            json(
                r#"[
                    {"id": 1, "from_relative_id": 1, "to_relative_id": 2, "relationship_type": "father"},
                    {"id": 2, "from_relative_id": 1, "to_relative_id": 3, "relationship_type": "father"}
                ]"#,
            ),
        )
        .unwrap();
    canvas
}

#[wasm_bindgen_test]
fn set_data_produces_positions_and_edges() {
    let canvas = loaded();
    assert_eq!(canvas.relative_count(), 3);
    assert_eq!(canvas.get_positions().length(), 9);

    let edges = js_sys::Array::from(&canvas.get_edges().unwrap());
    assert_eq!(edges.length(), 2);
    let kind = js_sys::Reflect::get(&edges.get(0), &"kind".into()).unwrap();
    assert_eq!(kind.as_string().as_deref(), Some("descent"));
}

#[wasm_bindgen_test]
fn invalid_payload_is_rejected() {
    let canvas = KinTreeCanvas::new();
    assert!(canvas.set_data(json(r#"{"id": 1}"#), json("[]")).is_err());
    assert_eq!(canvas.relative_count(), 0);
}

#[wasm_bindgen_test]
fn filter_and_unknown_card() {
    let canvas = loaded();
    canvas.set_filter(json(r#"{"generation": 1}"#)).unwrap();
    assert!(canvas.is_filter_active());
    assert_eq!(canvas.get_positions().length(), 6);
    assert!(canvas.get_card_position(1.0).is_err());
    assert_eq!(canvas.get_card_position(2.0).unwrap().len(), 2);
}

#[wasm_bindgen_test]
fn auto_center_runs_once() {
    let canvas = loaded();
    assert!(canvas.auto_center());
    assert!(!canvas.auto_center());
    canvas.zoom_in();
    assert!(canvas.scale() > 1.0);
}
