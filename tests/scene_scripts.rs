//! End-to-end tests: scene JSON in, pixels and diagnostics out.
//!
//! These exercise the full path a saved scene takes: parse, clean, compile
//! the sketch, run the registration pass, dispatch lifecycle callbacks.

use spanimate::canvas::Rgba;
use spanimate::scene::Scene;
use spanimate::scripting::SketchHost;

fn run_scene(json: &str, width: u32, height: u32, draws: u32) -> SketchHost {
    let scene = Scene::from_json(json).expect("scene should parse");
    let mut host = SketchHost::new(width, height);
    host.start(&scene.src, scene.edit).expect("sketch should start");
    host.setup();
    for _ in 0..draws {
        host.draw();
    }
    host
}

#[test]
fn scene_with_any_string_parameter() {
    let json = r#"{
        "src": "fn draw() { if e.val() != () { throw \"root has no value\"; } if e.get(\"hi\") != \"hello!\" { throw \"bad read\"; } }",
        "edit": {
            "hi": { "value": { "type": "any", "value": "hello!" } }
        }
    }"#;
    let host = run_scene(json, 8, 8, 1);
    assert!(
        host.sketch().unwrap().diagnostics().is_empty(),
        "diagnostics: {:?}",
        host.sketch().unwrap().diagnostics()
    );
}

#[test]
fn scene_drives_drawing_from_parameters() {
    let json = r#"{
        "src": "fn draw() { s.background(0); s.no_stroke(); s.fill(e.get(\"tint\")); let p = e.get(\"pos\"); s.rect(p.x, p.y, 4.0, 4.0); }",
        "edit": {
            "tint": { "value": { "type": "Color", "value": { "r": 0, "g": 255, "b": 0, "a": 255 } } },
            "pos": { "value": { "type": "Vector2", "value": { "x": 2.0, "y": 2.0 } } }
        }
    }"#;
    let host = run_scene(json, 16, 16, 1);
    assert!(host.sketch().unwrap().diagnostics().is_empty());
    let canvas = host.canvas().borrow();
    assert_eq!(canvas.pixel(3, 3), Rgba::opaque(0, 255, 0));
    assert_eq!(canvas.pixel(10, 10), Rgba::opaque(0, 0, 0));
}

#[test]
fn scene_iterates_a_grid_namespace() {
    // count() sizes the loop, integer keys address the cells.
    let json = r#"{
        "src": "fn draw() { s.background(255); s.no_stroke(); let cells = e.from(\"cells\"); let n = cells.count(); for i in 0..n { let p = cells.get(i); s.fill(0); s.rect(p.x, p.y, 2.0, 2.0); } }",
        "edit": {
            "cells": {
                "children": {
                    "0": { "value": { "type": "Vector2", "value": { "x": 0.0, "y": 0.0 } } },
                    "1": { "value": { "type": "Vector2", "value": { "x": 4.0, "y": 0.0 } } },
                    "2": { "value": { "type": "Vector2", "value": { "x": 8.0, "y": 0.0 } } }
                }
            }
        }
    }"#;
    let host = run_scene(json, 12, 4, 1);
    assert!(
        host.sketch().unwrap().diagnostics().is_empty(),
        "diagnostics: {:?}",
        host.sketch().unwrap().diagnostics()
    );
    let canvas = host.canvas().borrow();
    assert_eq!(canvas.pixel(1, 1), Rgba::opaque(0, 0, 0));
    assert_eq!(canvas.pixel(5, 1), Rgba::opaque(0, 0, 0));
    assert_eq!(canvas.pixel(9, 1), Rgba::opaque(0, 0, 0));
    assert_eq!(canvas.pixel(3, 1), Rgba::opaque(255, 255, 255));
}

#[test]
fn failing_frame_does_not_poison_the_next() {
    // The script leaves the cursor pushed deep and then throws every other
    // frame; the alternating frames must still see a root-level read succeed.
    let json = r#"{
        "src": "let n = 0; fn draw() { n += 1; if e.get(\"ok\") != true { throw \"cursor not reset\"; } e.push(\"a\"); e.push(\"b\"); if n % 2 == 1 { throw \"odd frame\"; } }",
        "edit": {
            "ok": { "value": { "type": "Toggle", "value": true } }
        }
    }"#;
    let host = run_scene(json, 4, 4, 4);
    let diags = host.sketch().unwrap().diagnostics();
    assert_eq!(diags.len(), 2);
    for diag in diags {
        assert!(diag.message.contains("odd frame"), "unexpected: {diag:?}");
    }
}

#[test]
fn missing_parameters_read_as_unit_not_errors() {
    let json = r#"{
        "src": "fn draw() { if e.get(\"nope\") != () { throw \"expected unit\"; } e.push(\"nowhere\"); if e.val() != () { throw \"diverged val\"; } if e.count() != 0 { throw \"diverged count\"; } e.pop(); if e.count() != 1 { throw \"recovery failed\"; } }",
        "edit": {
            "hi": { "value": { "type": "any", "value": "hello!" } }
        }
    }"#;
    let host = run_scene(json, 4, 4, 1);
    assert!(
        host.sketch().unwrap().diagnostics().is_empty(),
        "diagnostics: {:?}",
        host.sketch().unwrap().diagnostics()
    );
}

#[test]
fn loaded_scene_normalizes_vector_like_records() {
    // A bare {x, y} object stored as "any" is promoted on load, so scripts
    // can use vector accessors directly.
    let json = r#"{
        "src": "fn draw() { let p = e.get(\"pos\"); if p.x != 3.0 || p.y != 4.0 { throw \"not a vector\"; } }",
        "edit": {
            "pos": { "value": { "type": "any", "value": { "x": 3.0, "y": 4.0 } } }
        }
    }"#;
    let host = run_scene(json, 4, 4, 1);
    assert!(
        host.sketch().unwrap().diagnostics().is_empty(),
        "diagnostics: {:?}",
        host.sketch().unwrap().diagnostics()
    );
}

#[test]
fn broken_scene_script_reports_compile_diagnostic() {
    let json = r#"{
        "src": "fn draw( {",
        "edit": {}
    }"#;
    let scene = Scene::from_json(json).unwrap();
    let mut host = SketchHost::new(4, 4);
    let err = host.start(&scene.src, scene.edit).unwrap_err();
    assert!(err.location.is_some());
    assert!(!host.is_running());
}
