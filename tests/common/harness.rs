//! Test harness for driving the editor controller.
//!
//! Provides a complete setup with two connected-ready nodes, hook
//! recording, and helper methods for simulating pointer gestures. No UI
//! backend is involved; the harness speaks the same callback language a
//! frontend would.

#![allow(dead_code)]

use super::HookRecorder;
use gridlink::{EditorController, Point, PointerButton};

/// Harness around an [`EditorController`] with pointer-event helpers.
pub struct EditorHarness {
    pub ctrl: EditorController,
    pub hooks: HookRecorder,
    pub n1: i32,
    pub n2: i32,
    /// Right-side output connector of `n1`, anchored at (100, 30).
    pub out: i32,
    /// Left-side input connector of `n2`, anchored at (300, 130).
    pub inp: i32,
}

impl EditorHarness {
    /// Two nodes: N1 at (0, 0) with a right output, N2 at (300, 100) with a
    /// left input. Both connectors detach on drag.
    pub fn new() -> Self {
        Self::with_detach_flags(true, true)
    }

    pub fn with_detach_flags(out_detaches: bool, inp_detaches: bool) -> Self {
        let ctrl = EditorController::new();
        let hooks = HookRecorder::new();
        ctrl.set_hooks(hooks.clone());

        let (n1, n2, out, inp) = {
            let doc = ctrl.document();
            let mut doc = doc.borrow_mut();
            let n1 = doc.add_node("task", 0.0, 0.0, 100.0, 60.0);
            let n2 = doc.add_node("task", 300.0, 100.0, 100.0, 60.0);
            let out = doc.add_connector(n1, "right-output", out_detaches).unwrap();
            let inp = doc.add_connector(n2, "left-input", inp_detaches).unwrap();
            (n1, n2, out, inp)
        };
        ctrl.sync();

        Self { ctrl, hooks, n1, n2, out, inp }
    }

    /// Anchor position of a connector under the default skin.
    pub fn anchor(&self, connector: i32) -> Point {
        let doc = self.ctrl.document();
        let doc = doc.borrow();
        let c = doc.connector(connector).expect("connector exists");
        let node = doc.node(c.node).expect("node exists");
        match c.kind.side {
            gridlink::Side::Left => Point::new(node.x, node.y + node.height / 2.0),
            gridlink::Side::Right => Point::new(node.x + node.width, node.y + node.height / 2.0),
            gridlink::Side::Top => Point::new(node.x + node.width / 2.0, node.y),
            gridlink::Side::Bottom => Point::new(node.x + node.width / 2.0, node.y + node.height),
        }
    }

    // === Pointer event helpers ===

    pub fn mouse_down(&self, x: f32, y: f32) {
        self.ctrl.pointer_pressed(x, y, PointerButton::Primary, false);
    }

    pub fn mouse_down_additive(&self, x: f32, y: f32) {
        self.ctrl.pointer_pressed(x, y, PointerButton::Primary, true);
    }

    pub fn mouse_move(&self, x: f32, y: f32) {
        self.ctrl.pointer_moved(x, y);
    }

    pub fn mouse_up(&self, x: f32, y: f32) -> Option<i32> {
        self.ctrl.pointer_released(x, y, PointerButton::Primary)
    }

    /// Simulate a complete drag from start to end.
    pub fn drag(&self, start_x: f32, start_y: f32, end_x: f32, end_y: f32) -> Option<i32> {
        self.mouse_down(start_x, start_y);
        self.mouse_move((start_x + end_x) / 2.0, (start_y + end_y) / 2.0);
        self.mouse_move(end_x, end_y);
        self.mouse_up(end_x, end_y)
    }

    /// Simulate a complete click (down + up) at the given position.
    pub fn click(&self, x: f32, y: f32) {
        self.mouse_down(x, y);
        self.mouse_up(x, y);
    }

    // === State probes ===

    pub fn connection_count(&self) -> usize {
        self.ctrl.document().borrow().connection_order().len()
    }

    pub fn tail_visible(&self) -> bool {
        self.ctrl.paths().iter().any(|p| p.id == gridlink::TAIL_PATH_ID)
    }
}

impl Default for EditorHarness {
    fn default() -> Self {
        Self::new()
    }
}
