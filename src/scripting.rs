//! Rhai script hosting for sketches.
//!
//! A sketch script is the body of a program that receives two injected
//! values: `s`, the canvas handle, and `e`, the parameter interface. Scripts
//! can define:
//! - `fn setup()` - Called once when the sketch starts
//! - `fn draw()` - Called each frame by the external scheduler
//! - `fn mouse_clicked(x, y)` - Called on click events
//!
//! Compilation happens once. The top-level statements then run exactly once
//! (the registration pass); after that only the recognized lifecycle
//! functions actually defined by the script are dispatched. Every dispatch
//! resets the parameter cursor first, and any runtime error is caught into a
//! bounded diagnostic queue; nothing ever propagates to the scheduler.
//!
//! Parameter access:
//! - `e.val()`, `e.get(...)`, `e.from(...)`, `e.count(...)`, `e.push(k)`, `e.pop()`
//!
//! Drawing:
//! - `s.background(...)`, `s.fill(...)`, `s.stroke(...)`, `s.rect(x, y, w, h)`
//! - `s.pixel(x, y)` / `s.set_pixel(x, y, color)` for raw buffer access
//!
//! Logging:
//! - `print(value)` / `log_info` / `log_warn` / `log_error`, capped per frame

use std::cell::RefCell;
use std::rc::Rc;

use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST};

use crate::canvas::Canvas;
use crate::cursor::ContextStack;
use crate::script_api::{register_script_api, CanvasHandle, ParamInterface};
use crate::script_diagnostics::{from_eval_error, from_parse_error, ScriptDiagnostic, ScriptPhase};
use crate::script_log::reset_frame_log_count;
use crate::tree::ParamTree;

/// Keep a bounded queue so repeated runtime errors don't grow without limit.
const MAX_DIAGNOSTICS: usize = 32;

/// The recognized lifecycle callbacks. Names the script does not define are
/// left absent; nothing is invented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Setup,
    Draw,
    MouseClicked,
}

impl Lifecycle {
    pub const ALL: [Lifecycle; 3] = [Lifecycle::Setup, Lifecycle::Draw, Lifecycle::MouseClicked];

    pub fn name(self) -> &'static str {
        match self {
            Lifecycle::Setup => "setup",
            Lifecycle::Draw => "draw",
            Lifecycle::MouseClicked => "mouse_clicked",
        }
    }

    fn phase(self) -> ScriptPhase {
        match self {
            Lifecycle::Setup => ScriptPhase::Setup,
            Lifecycle::Draw => ScriptPhase::Draw,
            Lifecycle::MouseClicked => ScriptPhase::MouseClicked,
        }
    }
}

/// One compiled, registered sketch instance.
pub struct Sketch {
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
    cursor: Rc<RefCell<ContextStack>>,
    canvas: CanvasHandle,
    lifecycles: Vec<Lifecycle>,
    diagnostics: Vec<ScriptDiagnostic>,
}

impl Sketch {
    /// Compile a script and run its registration pass against the live tree.
    ///
    /// Any failure (parse or registration) yields a diagnostic and no sketch:
    /// no partial state is left behind.
    pub fn compile(
        source: &str,
        tree: ParamTree,
        canvas: CanvasHandle,
    ) -> Result<Sketch, ScriptDiagnostic> {
        let mut engine = Engine::new();

        // Sandbox settings
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(64);
        engine.set_max_operations(10_000_000); // Prevent infinite loops; generous for pixel work
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(10_000);
        engine.set_max_map_size(1_000);

        register_script_api(&mut engine);

        let ast = engine.compile(source).map_err(|e| from_parse_error(&e))?;

        let cursor = Rc::new(RefCell::new(ContextStack::from_tree(tree)));
        let interface = ParamInterface::new(cursor.clone(), canvas.clone());

        let mut scope = Scope::new();
        scope.push("s", canvas.clone());
        scope.push("e", interface);

        // Registration pass: top-level statements run exactly once, with the
        // injected values in scope.
        engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| from_eval_error(ScriptPhase::Register, &e))?;

        let lifecycles = Lifecycle::ALL
            .iter()
            .copied()
            .filter(|l| ast.iter_functions().any(|f| f.name == l.name()))
            .collect();

        log::info!("sketch compiled; lifecycle callbacks: {lifecycles:?}");

        Ok(Sketch {
            engine,
            ast,
            scope,
            cursor,
            canvas,
            lifecycles,
            diagnostics: Vec::new(),
        })
    }

    pub fn has_lifecycle(&self, lifecycle: Lifecycle) -> bool {
        self.lifecycles.contains(&lifecycle)
    }

    pub fn setup(&mut self) {
        self.dispatch(Lifecycle::Setup, vec![]);
    }

    pub fn draw(&mut self) {
        self.dispatch(Lifecycle::Draw, vec![]);
    }

    pub fn mouse_clicked(&mut self, x: f32, y: f32) {
        self.dispatch(
            Lifecycle::MouseClicked,
            vec![Dynamic::from_float(x), Dynamic::from_float(y)],
        );
    }

    fn dispatch(&mut self, lifecycle: Lifecycle, args: Vec<Dynamic>) {
        if !self.has_lifecycle(lifecycle) {
            return;
        }

        // The correctness invariant: every invocation starts with a fresh
        // cursor, so a cursor left dangling by a failed frame cannot leak.
        self.cursor.borrow_mut().reset();
        reset_frame_log_count();

        let options = CallFnOptions::new().eval_ast(false);
        let result: Result<Dynamic, _> = self.engine.call_fn_with_options(
            options,
            &mut self.scope,
            &self.ast,
            lifecycle.name(),
            args,
        );

        if let Err(e) = result {
            self.push_diagnostic(from_eval_error(lifecycle.phase(), &e));
        }
    }

    fn push_diagnostic(&mut self, diag: ScriptDiagnostic) {
        self.diagnostics.push(diag);
        if self.diagnostics.len() > MAX_DIAGNOSTICS {
            let excess = self.diagnostics.len() - MAX_DIAGNOSTICS;
            self.diagnostics.drain(0..excess);
        }
    }

    pub fn diagnostics(&self) -> &[ScriptDiagnostic] {
        &self.diagnostics
    }

    /// Drain and return all pending diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<ScriptDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn canvas(&self) -> &CanvasHandle {
        &self.canvas
    }

    pub fn cursor(&self) -> Rc<RefCell<ContextStack>> {
        self.cursor.clone()
    }
}

/// Owns the canvas and at most one running sketch.
///
/// Starting a new sketch always stops the previous one first; a compile
/// failure leaves the previous sketch stopped. Stop is idempotent.
pub struct SketchHost {
    canvas: CanvasHandle,
    sketch: Option<Sketch>,
}

impl SketchHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_canvas(CanvasHandle::new(Canvas::new(width, height)))
    }

    pub fn with_canvas(canvas: CanvasHandle) -> Self {
        Self {
            canvas,
            sketch: None,
        }
    }

    pub fn start(&mut self, source: &str, tree: ParamTree) -> Result<(), ScriptDiagnostic> {
        self.stop();
        let sketch = Sketch::compile(source, tree, self.canvas.clone())?;
        self.sketch = Some(sketch);
        Ok(())
    }

    /// Detach the running sketch, if any. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.sketch.take().is_some() {
            log::info!("sketch stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.sketch.is_some()
    }

    pub fn setup(&mut self) {
        if let Some(sketch) = self.sketch.as_mut() {
            sketch.setup();
        }
    }

    pub fn draw(&mut self) {
        if let Some(sketch) = self.sketch.as_mut() {
            sketch.draw();
        }
    }

    pub fn mouse_clicked(&mut self, x: f32, y: f32) {
        if let Some(sketch) = self.sketch.as_mut() {
            sketch.mouse_clicked(x, y);
        }
    }

    pub fn sketch(&self) -> Option<&Sketch> {
        self.sketch.as_ref()
    }

    pub fn sketch_mut(&mut self) -> Option<&mut Sketch> {
        self.sketch.as_mut()
    }

    pub fn canvas(&self) -> &CanvasHandle {
        &self.canvas
    }
}
