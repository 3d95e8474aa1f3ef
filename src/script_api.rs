//! Rhai bindings for the sketch API.
//!
//! Scripts see two injected values: `s`, the canvas handle, and `e`, the
//! parameter interface. This module registers both types (plus the `Vector2`,
//! `Color` and shape-drawer values they hand out) with the engine, and owns
//! the yield conversion from stored parameter values to what scripts consume.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use glam::Vec2;
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString};

use crate::canvas::{Canvas, Rgba};
use crate::cursor::ContextStack;
use crate::param::ParamValue;
use crate::script_log::{script_log, stringify_dynamic, LogLevel};
use crate::shape::{draw_shapes, render_order, ShapeEntry, ShapeMap};
use crate::tree::{ParamEntry, ParamTree};

/// Shared handle to the live canvas, cloned freely into the script scope and
/// into drawer objects.
#[derive(Clone)]
pub struct CanvasHandle(Rc<RefCell<Canvas>>);

impl CanvasHandle {
    pub fn new(canvas: Canvas) -> Self {
        Self(Rc::new(RefCell::new(canvas)))
    }

    pub fn borrow(&self) -> Ref<'_, Canvas> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Canvas> {
        self.0.borrow_mut()
    }
}

/// The capability interface handed to scripts: navigation over the parameter
/// tree plus yielded reads. Never errors; missing paths read as `()`.
#[derive(Clone)]
pub struct ParamInterface {
    cursor: Rc<RefCell<ContextStack>>,
    canvas: CanvasHandle,
}

impl ParamInterface {
    pub fn new(cursor: Rc<RefCell<ContextStack>>, canvas: CanvasHandle) -> Self {
        Self { cursor, canvas }
    }

    pub fn from_tree(tree: ParamTree, canvas: CanvasHandle) -> Self {
        Self::new(
            Rc::new(RefCell::new(ContextStack::from_tree(tree))),
            canvas,
        )
    }

    pub fn cursor(&self) -> Rc<RefCell<ContextStack>> {
        self.cursor.clone()
    }

    pub fn val(&self) -> Dynamic {
        match self.cursor.borrow().current() {
            Some(node) => yield_entry(&node.borrow(), &self.canvas),
            None => Dynamic::UNIT,
        }
    }

    pub fn get(&self, keys: &[String]) -> Dynamic {
        if keys.is_empty() {
            return Dynamic::UNIT;
        }
        match self.cursor.borrow().resolve_entry(keys) {
            Some(node) => yield_entry(&node.borrow(), &self.canvas),
            None => Dynamic::UNIT,
        }
    }

    /// A fresh interface over an independent cursor rooted at the resolved
    /// sub-tree, or `()` when the path does not resolve.
    pub fn from_path(&self, keys: &[String]) -> Dynamic {
        if keys.is_empty() {
            return Dynamic::UNIT;
        }
        match self.cursor.borrow().resolve_tree(keys) {
            Some(tree) => Dynamic::from(ParamInterface::from_tree(tree, self.canvas.clone())),
            None => Dynamic::UNIT,
        }
    }

    pub fn count(&self, keys: &[String]) -> i64 {
        self.cursor.borrow().count(keys) as i64
    }

    pub fn push(&self, key: String) {
        self.cursor.borrow_mut().push(key);
    }

    pub fn pop(&self) {
        self.cursor.borrow_mut().pop();
    }
}

/// Drawable snapshot of a shape collection, yielded to scripts. Shapes are
/// pre-sorted into render order; `draw` paints them through the live canvas.
#[derive(Clone)]
pub struct ShapeDrawer {
    shapes: Rc<Vec<ShapeEntry>>,
    canvas: CanvasHandle,
}

impl ShapeDrawer {
    pub fn new(shapes: &ShapeMap, canvas: CanvasHandle) -> Self {
        Self {
            shapes: Rc::new(render_order(shapes)),
            canvas,
        }
    }

    pub fn draw(&self, alpha: u8) {
        draw_shapes(&self.shapes, &mut self.canvas.borrow_mut(), alpha);
    }
}

/// Produce the value a script actually consumes for an entry.
///
/// Any/Number/Vector2/Toggle pass through; a Color becomes the canvas-native
/// color; a Shape collection becomes a drawer bound to the rendering handle.
pub fn yield_entry(entry: &ParamEntry, canvas: &CanvasHandle) -> Dynamic {
    let Some(value) = entry.value.as_ref() else {
        return Dynamic::UNIT;
    };
    match value {
        ParamValue::Any { value } => rhai::serde::to_dynamic(value).unwrap_or(Dynamic::UNIT),
        ParamValue::Number { value, .. } => Dynamic::from_float(*value),
        ParamValue::Vector2 { value, .. } => Dynamic::from(*value),
        ParamValue::Color { value } => Dynamic::from(*value),
        ParamValue::Toggle { value } => Dynamic::from_bool(*value),
        ParamValue::Shape { value, .. } => {
            Dynamic::from(ShapeDrawer::new(value, canvas.clone()))
        }
    }
}

/// Coerce a script value to f32, accepting both ints and floats.
fn as_f32(value: &Dynamic) -> Result<f32, Box<EvalAltResult>> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f32);
    }
    Err(format!("expected a number, got {}", value.type_name()).into())
}

/// Normalize a script key (string or non-negative integer) to a tree key.
/// Anything else stringifies and simply never resolves.
fn key_of(value: &Dynamic) -> String {
    if value.is_string() {
        return value
            .clone()
            .into_immutable_string()
            .map(|s: ImmutableString| s.to_string())
            .unwrap_or_default();
    }
    if let Ok(i) = value.as_int() {
        return i.to_string();
    }
    value.to_string()
}

fn keys_of(values: &[Dynamic]) -> Vec<String> {
    values.iter().map(key_of).collect()
}

fn alpha_of(value: &Dynamic) -> Result<u8, Box<EvalAltResult>> {
    Ok(as_f32(value)?.clamp(0.0, 255.0) as u8)
}

/// Register every script-visible type and function with the engine.
pub fn register_script_api(engine: &mut Engine) {
    register_logging(engine);
    register_vec2(engine);
    register_color(engine);
    register_canvas(engine);
    register_interface(engine);
    register_shape_drawer(engine);
}

fn register_logging(engine: &mut Engine) {
    engine.on_print(|text| script_log(LogLevel::Info, text));
    engine.on_debug(|text, _source, pos| {
        script_log(LogLevel::Info, &format!("{text} @ {pos}"));
    });
    engine
        .register_fn("log_info", |value: Dynamic| {
            script_log(LogLevel::Info, &stringify_dynamic(&value));
        })
        .register_fn("log_warn", |value: Dynamic| {
            script_log(LogLevel::Warn, &stringify_dynamic(&value));
        })
        .register_fn("log_error", |value: Dynamic| {
            script_log(LogLevel::Error, &stringify_dynamic(&value));
        });
}

fn register_vec2(engine: &mut Engine) {
    engine.register_type_with_name::<Vec2>("Vector2");

    engine.register_fn(
        "vec2",
        |x: Dynamic, y: Dynamic| -> Result<Vec2, Box<EvalAltResult>> {
            Ok(Vec2::new(as_f32(&x)?, as_f32(&y)?))
        },
    );

    engine.register_get_set("x", |v: &mut Vec2| v.x, |v: &mut Vec2, x: f32| v.x = x);
    engine.register_get_set("y", |v: &mut Vec2| v.y, |v: &mut Vec2, y: f32| v.y = y);
    engine.register_set("x", |v: &mut Vec2, x: i64| v.x = x as f32);
    engine.register_set("y", |v: &mut Vec2, y: i64| v.y = y as f32);

    engine.register_fn("+", |a: Vec2, b: Vec2| a + b);
    engine.register_fn("-", |a: Vec2, b: Vec2| a - b);
    engine.register_fn("*", |a: Vec2, k: f32| a * k);
    engine.register_fn("*", |k: f32, a: Vec2| a * k);

    engine.register_fn("to_string", |v: &mut Vec2| format!("<{}, {}>", v.x, v.y));
    engine.register_fn("to_debug", |v: &mut Vec2| format!("{v:?}"));
}

fn register_color(engine: &mut Engine) {
    engine.register_type_with_name::<Rgba>("Color");

    engine.register_fn("color", |gray: i64| Rgba::from_clamped(gray, gray, gray, 255));
    engine.register_fn("color", |r: i64, g: i64, b: i64| {
        Rgba::from_clamped(r, g, b, 255)
    });
    engine.register_fn("color", |r: i64, g: i64, b: i64, a: i64| {
        Rgba::from_clamped(r, g, b, a)
    });

    engine.register_get("r", |c: &mut Rgba| c.r as i64);
    engine.register_get("g", |c: &mut Rgba| c.g as i64);
    engine.register_get("b", |c: &mut Rgba| c.b as i64);
    engine.register_get("a", |c: &mut Rgba| c.a as i64);

    engine.register_fn("to_string", |c: &mut Rgba| {
        format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a)
    });
}

fn register_canvas(engine: &mut Engine) {
    engine.register_type_with_name::<CanvasHandle>("Canvas");

    engine.register_fn("create_canvas", |c: &mut CanvasHandle, w: i64, h: i64| {
        c.borrow_mut().resize(w.max(0) as u32, h.max(0) as u32);
    });

    engine.register_get("width", |c: &mut CanvasHandle| {
        c.borrow().width() as i64
    });
    engine.register_get("height", |c: &mut CanvasHandle| {
        c.borrow().height() as i64
    });

    engine.register_fn("background", |c: &mut CanvasHandle, color: Rgba| {
        c.borrow_mut().background(color);
    });
    engine.register_fn("background", |c: &mut CanvasHandle, gray: i64| {
        c.borrow_mut()
            .background(Rgba::from_clamped(gray, gray, gray, 255));
    });
    engine.register_fn(
        "background",
        |c: &mut CanvasHandle, r: i64, g: i64, b: i64| {
            c.borrow_mut().background(Rgba::from_clamped(r, g, b, 255));
        },
    );

    engine.register_fn("fill", |c: &mut CanvasHandle, color: Rgba| {
        c.borrow_mut().set_fill(color);
    });
    engine.register_fn("fill", |c: &mut CanvasHandle, gray: i64| {
        c.borrow_mut().set_fill(Rgba::from_clamped(gray, gray, gray, 255));
    });
    engine.register_fn("fill", |c: &mut CanvasHandle, r: i64, g: i64, b: i64| {
        c.borrow_mut().set_fill(Rgba::from_clamped(r, g, b, 255));
    });
    engine.register_fn(
        "fill",
        |c: &mut CanvasHandle, r: i64, g: i64, b: i64, a: i64| {
            c.borrow_mut().set_fill(Rgba::from_clamped(r, g, b, a));
        },
    );
    engine.register_fn("no_fill", |c: &mut CanvasHandle| c.borrow_mut().no_fill());

    engine.register_fn("stroke", |c: &mut CanvasHandle, color: Rgba| {
        c.borrow_mut().set_stroke(color);
    });
    engine.register_fn("stroke", |c: &mut CanvasHandle, gray: i64| {
        c.borrow_mut()
            .set_stroke(Rgba::from_clamped(gray, gray, gray, 255));
    });
    engine.register_fn("stroke", |c: &mut CanvasHandle, r: i64, g: i64, b: i64| {
        c.borrow_mut().set_stroke(Rgba::from_clamped(r, g, b, 255));
    });
    engine.register_fn(
        "stroke_weight",
        |c: &mut CanvasHandle, weight: Dynamic| -> Result<(), Box<EvalAltResult>> {
            c.borrow_mut().set_stroke_weight(as_f32(&weight)?);
            Ok(())
        },
    );
    engine.register_fn("no_stroke", |c: &mut CanvasHandle| {
        c.borrow_mut().no_stroke()
    });

    engine.register_fn(
        "rect",
        |c: &mut CanvasHandle,
         x: Dynamic,
         y: Dynamic,
         w: Dynamic,
         h: Dynamic|
         -> Result<(), Box<EvalAltResult>> {
            c.borrow_mut()
                .rect(as_f32(&x)?, as_f32(&y)?, as_f32(&w)?, as_f32(&h)?);
            Ok(())
        },
    );
    engine.register_fn("rect", |c: &mut CanvasHandle, origin: Vec2, extent: Vec2| {
        c.borrow_mut().rect(origin.x, origin.y, extent.x, extent.y);
    });

    engine.register_fn("pixel", |c: &mut CanvasHandle, x: i64, y: i64| {
        c.borrow().pixel(x as i32, y as i32)
    });
    engine.register_fn(
        "set_pixel",
        |c: &mut CanvasHandle, x: i64, y: i64, color: Rgba| {
            c.borrow_mut().set_pixel(x as i32, y as i32, color);
        },
    );
}

fn register_interface(engine: &mut Engine) {
    engine.register_type_with_name::<ParamInterface>("Params");

    engine.register_fn("val", |e: &mut ParamInterface| e.val());

    engine.register_fn("push", |e: &mut ParamInterface, key: Dynamic| {
        e.push(key_of(&key));
    });
    engine.register_fn("pop", |e: &mut ParamInterface| e.pop());

    engine.register_fn("get", |e: &mut ParamInterface, keys: Array| {
        e.get(&keys_of(&keys))
    });
    engine.register_fn("get", |e: &mut ParamInterface, k: Dynamic| {
        e.get(&keys_of(&[k]))
    });
    engine.register_fn("get", |e: &mut ParamInterface, k0: Dynamic, k1: Dynamic| {
        e.get(&keys_of(&[k0, k1]))
    });
    engine.register_fn(
        "get",
        |e: &mut ParamInterface, k0: Dynamic, k1: Dynamic, k2: Dynamic| {
            e.get(&keys_of(&[k0, k1, k2]))
        },
    );
    engine.register_fn(
        "get",
        |e: &mut ParamInterface, k0: Dynamic, k1: Dynamic, k2: Dynamic, k3: Dynamic| {
            e.get(&keys_of(&[k0, k1, k2, k3]))
        },
    );

    engine.register_fn("from", |e: &mut ParamInterface, keys: Array| {
        e.from_path(&keys_of(&keys))
    });
    engine.register_fn("from", |e: &mut ParamInterface, k: Dynamic| {
        e.from_path(&keys_of(&[k]))
    });
    engine.register_fn("from", |e: &mut ParamInterface, k0: Dynamic, k1: Dynamic| {
        e.from_path(&keys_of(&[k0, k1]))
    });
    engine.register_fn(
        "from",
        |e: &mut ParamInterface, k0: Dynamic, k1: Dynamic, k2: Dynamic| {
            e.from_path(&keys_of(&[k0, k1, k2]))
        },
    );

    engine.register_fn("count", |e: &mut ParamInterface| e.count(&[]));
    engine.register_fn("count", |e: &mut ParamInterface, keys: Array| {
        e.count(&keys_of(&keys))
    });
    engine.register_fn("count", |e: &mut ParamInterface, k: Dynamic| {
        e.count(&keys_of(&[k]))
    });
    engine.register_fn("count", |e: &mut ParamInterface, k0: Dynamic, k1: Dynamic| {
        e.count(&keys_of(&[k0, k1]))
    });
}

fn register_shape_drawer(engine: &mut Engine) {
    engine.register_type_with_name::<ShapeDrawer>("ShapeDrawer");

    engine.register_fn("draw", |d: &mut ShapeDrawer| d.draw(255));
    engine.register_fn(
        "draw",
        |d: &mut ShapeDrawer, alpha: Dynamic| -> Result<(), Box<EvalAltResult>> {
            d.draw(alpha_of(&alpha)?);
            Ok(())
        },
    );
}
