use std::path::PathBuf;

use reframe_frame_model::event::parse_events;
use reframe_processing_core::gesture::GestureController;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("pointer")
        .join(name);
    std::fs::read_to_string(path).expect("fixture should be readable")
}

#[test]
fn recorded_pan_then_corner_resize() {
    let events = parse_events(&fixture("pan-and-zoom.jsonl")).expect("fixture should parse");
    assert_eq!(events.len(), 9);

    let mut controller = GestureController::with_defaults();
    controller.set_media_aspect(1920.0 / 1080.0);

    let mut committed = Vec::new();
    for event in &events {
        if let Some(t) = controller.handle_event(event).expect("controller laid out") {
            committed.push(t);
        }
    }

    let transform = controller.transform();
    assert!(!controller.is_dragging());
    assert!((transform.scale - 1.25).abs() < 1e-9);
    assert!((transform.x - 0.225).abs() < 1e-9);
    assert!((transform.y - 0.0703125).abs() < 1e-9);

    // The pan released at 10% with y snapped to center.
    assert!(committed
        .iter()
        .any(|t| t.scale == 1.0 && (t.x - 0.1).abs() < 1e-12 && t.y == 0.0));
}

#[test]
fn replaying_twice_is_deterministic() {
    let events = parse_events(&fixture("pan-and-zoom.jsonl")).expect("fixture should parse");

    let run = || {
        let mut controller = GestureController::with_defaults();
        controller.set_media_aspect(1920.0 / 1080.0);
        for event in &events {
            controller.handle_event(event).expect("controller laid out");
        }
        controller.transform()
    };

    assert_eq!(run(), run());
}
