//! Typed parameter payloads.
//!
//! Every parameter entry carries at most one `ParamValue`. The set is closed:
//! `clean` and the script-side yield conversion are exhaustive matches, so
//! adding a variant forces both to be revisited.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::canvas::Rgba;
use crate::shape::{ShapeMap, ShapeWidget};

/// Serialize `glam::Vec2` as an `{x, y}` object rather than a tuple, matching
/// the scene file format.
pub(crate) mod vec2_xy {
    use glam::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Repr {
        x: f32,
        y: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vec2, s: S) -> Result<S::Ok, S::Error> {
        Repr { x: v.x, y: v.y }.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec2, D::Error> {
        let r = Repr::deserialize(d)?;
        Ok(Vec2::new(r.x, r.y))
    }
}

fn vec2_zero() -> Vec2 {
    Vec2::ZERO
}

fn default_edit_scale() -> f32 {
    1.0
}

fn default_edit_size() -> f32 {
    200.0
}

/// A typed parameter payload plus its edit metadata.
///
/// Tags and field names follow the persisted scene format, e.g.
/// `{"type": "number", "value": 3.0, "min": 0.0, "max": 10.0, "step": 0.1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParamValue {
    /// Arbitrary structured value. Must survive a JSON round trip.
    #[serde(rename = "any")]
    Any { value: serde_json::Value },

    /// Number with slider metadata. The UI clamps edits to [min, max] but a
    /// stored value may transiently exceed the range; `step` must be > 0.
    #[serde(rename = "number")]
    Number {
        value: f32,
        min: f32,
        max: f32,
        step: f32,
    },

    /// 2D point with drag-canvas metadata (`editScale` strictly positive).
    #[serde(rename = "Vector2")]
    Vector2 {
        #[serde(with = "vec2_xy")]
        value: Vec2,
        #[serde(rename = "editOrigin", with = "vec2_xy", default = "vec2_zero")]
        edit_origin: Vec2,
        #[serde(rename = "editScale", default = "default_edit_scale")]
        edit_scale: f32,
    },

    #[serde(rename = "Color")]
    Color { value: Rgba },

    #[serde(rename = "Toggle")]
    Toggle { value: bool },

    /// Named collection of shapes with edit-viewport metadata. `editSize` is
    /// the pixel extent of the shape-editing viewport.
    #[serde(rename = "Shape")]
    Shape {
        #[serde(default)]
        value: ShapeMap,
        #[serde(rename = "editOrigin", with = "vec2_xy", default = "vec2_zero")]
        edit_origin: Vec2,
        #[serde(rename = "editScale", default = "default_edit_scale")]
        edit_scale: f32,
        #[serde(rename = "editSize", default = "default_edit_size")]
        edit_size: f32,
        #[serde(default)]
        widget: ShapeWidget,
    },
}

impl ParamValue {
    pub fn any(value: impl Into<serde_json::Value>) -> Self {
        ParamValue::Any {
            value: value.into(),
        }
    }

    pub fn vector2(value: Vec2) -> Self {
        ParamValue::Vector2 {
            value,
            edit_origin: Vec2::ZERO,
            edit_scale: default_edit_scale(),
        }
    }

    /// Idempotent normalization applied after deserialization or duplication.
    ///
    /// An Any payload that is structurally a 2D point (an object with numeric
    /// `x`/`y`) is re-tagged as a Vector2 with default edit metadata. Shape
    /// collections are reset to empty: shape payloads are not faithfully
    /// restorable through this pass, so copy/paste and JSON round trips drop
    /// their contents.
    pub fn clean(&mut self) {
        match self {
            ParamValue::Any { value } => {
                if let Some(v) = vec2_from_json(value) {
                    *self = ParamValue::vector2(v);
                }
            }
            ParamValue::Number { .. } => {}
            ParamValue::Vector2 { .. } => {}
            ParamValue::Color { .. } => {}
            ParamValue::Toggle { .. } => {}
            ParamValue::Shape { value, .. } => value.clear(),
        }
    }

    /// Duplicate with normalization, the copy/paste path of the editor.
    pub fn duplicate(&self) -> ParamValue {
        let mut copy = self.clone();
        copy.clean();
        copy
    }
}

fn vec2_from_json(v: &serde_json::Value) -> Option<Vec2> {
    let obj = v.as_object()?;
    let x = obj.get("x")?.as_f64()?;
    let y = obj.get("y")?.as_f64()?;
    Some(Vec2::new(x as f32, y as f32))
}
