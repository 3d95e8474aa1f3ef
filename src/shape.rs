//! Shape-collection payloads and their drawing dispatch.
//!
//! Geometry is a closed set of shape kinds; the one built-in is an
//! axis-aligned rectangle. Shapes render in ascending z-order, ties broken by
//! key order, so the editor's selection order matches what ends up on screen.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, Rgba};
use crate::param::vec2_xy;

/// Stroke styling carried by a shape (weight in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeGeometry {
    Rect {
        #[serde(with = "vec2_xy")]
        origin: Vec2,
        #[serde(with = "vec2_xy")]
        extent: Vec2,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<Rgba>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<StrokeStyle>,
    },
}

/// One named shape in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeEntry {
    pub geometry: ShapeGeometry,
    #[serde(rename = "zOrder", default)]
    pub z_order: i32,
}

/// Named shape entries. BTreeMap gives the stable key order used to break
/// z-order ties.
pub type ShapeMap = BTreeMap<String, ShapeEntry>;

/// Edit-widget flags for the shape viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeWidget {
    #[serde(rename = "showMouse", default)]
    pub show_mouse: bool,
}

/// Snapshot a collection in render order: ascending z-order, ties broken by
/// key order (BTreeMap iteration is already key-sorted, and the sort is
/// stable).
pub fn render_order(shapes: &ShapeMap) -> Vec<ShapeEntry> {
    let mut ordered: Vec<ShapeEntry> = shapes.values().cloned().collect();
    ordered.sort_by_key(|s| s.z_order);
    ordered
}

/// Draw shapes onto the canvas, scaling fill and stroke alpha by
/// `alpha / 255`. Fill applies only when a fill color with alpha > 0 is set;
/// stroke only when the stroke weight is positive.
pub fn draw_shapes(shapes: &[ShapeEntry], canvas: &mut Canvas, alpha: u8) {
    for shape in shapes {
        match &shape.geometry {
            ShapeGeometry::Rect {
                origin,
                extent,
                fill,
                stroke,
            } => {
                match fill {
                    Some(color) if color.a > 0 => canvas.set_fill(color.scale_alpha(alpha)),
                    _ => canvas.no_fill(),
                }
                match stroke {
                    Some(s) if s.weight > 0.0 => {
                        canvas.set_stroke(s.color.scale_alpha(alpha));
                        canvas.set_stroke_weight(s.weight);
                    }
                    _ => canvas.no_stroke(),
                }
                canvas.rect(origin.x, origin.y, extent.x, extent.y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(origin: Vec2, extent: Vec2, fill: Option<Rgba>, z_order: i32) -> ShapeEntry {
        ShapeEntry {
            geometry: ShapeGeometry::Rect {
                origin,
                extent,
                fill,
                stroke: None,
            },
            z_order,
        }
    }

    #[test]
    fn test_render_order_sorts_by_z_then_key() {
        let mut shapes = ShapeMap::new();
        shapes.insert("c".into(), rect(Vec2::ZERO, Vec2::ONE, None, 1));
        shapes.insert("a".into(), rect(Vec2::ZERO, Vec2::ONE, None, 1));
        shapes.insert("b".into(), rect(Vec2::ZERO, Vec2::ONE, None, 0));

        let ordered = render_order(&shapes);
        let zs: Vec<i32> = ordered.iter().map(|s| s.z_order).collect();
        assert_eq!(zs, vec![0, 1, 1]);
    }

    #[test]
    fn test_higher_z_order_draws_on_top() {
        let mut shapes = ShapeMap::new();
        shapes.insert(
            "under".into(),
            rect(
                Vec2::ZERO,
                Vec2::new(10.0, 10.0),
                Some(Rgba::opaque(255, 0, 0)),
                0,
            ),
        );
        shapes.insert(
            "over".into(),
            rect(
                Vec2::new(5.0, 5.0),
                Vec2::new(10.0, 10.0),
                Some(Rgba::opaque(0, 0, 255)),
                1,
            ),
        );

        let mut canvas = Canvas::new(20, 20);
        canvas.background(Rgba::BLACK);
        draw_shapes(&render_order(&shapes), &mut canvas, 255);

        // Overlap region belongs to the z=1 rectangle.
        assert_eq!(canvas.pixel(7, 7), Rgba::opaque(0, 0, 255));
        // Non-overlapping part of the z=0 rectangle survives.
        assert_eq!(canvas.pixel(2, 2), Rgba::opaque(255, 0, 0));
    }

    #[test]
    fn test_zero_alpha_fill_is_skipped() {
        let mut shapes = ShapeMap::new();
        shapes.insert(
            "ghost".into(),
            rect(
                Vec2::ZERO,
                Vec2::new(10.0, 10.0),
                Some(Rgba::new(255, 0, 0, 0)),
                0,
            ),
        );

        let mut canvas = Canvas::new(10, 10);
        canvas.background(Rgba::BLACK);
        draw_shapes(&render_order(&shapes), &mut canvas, 255);
        assert_eq!(canvas.pixel(5, 5), Rgba::BLACK);
    }

    #[test]
    fn test_alpha_multiplier_scales_fill() {
        let mut shapes = ShapeMap::new();
        shapes.insert(
            "half".into(),
            rect(
                Vec2::ZERO,
                Vec2::new(10.0, 10.0),
                Some(Rgba::opaque(255, 255, 255)),
                0,
            ),
        );

        let mut canvas = Canvas::new(10, 10);
        canvas.background(Rgba::BLACK);
        draw_shapes(&render_order(&shapes), &mut canvas, 128);
        let px = canvas.pixel(5, 5);
        assert!(px.r > 110 && px.r < 140, "expected ~half blend, got {px:?}");
    }

    #[test]
    fn test_shape_entry_serde_uses_z_order_tag() {
        let entry = rect(Vec2::ZERO, Vec2::ONE, None, 7);
        let text = serde_json::to_string(&entry).unwrap();
        assert!(text.contains("\"zOrder\":7"));
        let back: ShapeEntry = serde_json::from_str(&text).unwrap();
        assert_eq!(back, entry);
    }
}
