//! High-level controller for diagram editor applications.
//!
//! [`EditorController`] owns the document, the resolved geometry, the drag
//! state machine, and the scene, and wires them into the per-render `sync`
//! pass: drain queued document changes, reconcile, re-resolve affected
//! geometry, refresh shapes, and push the computed paths to the bound
//! model. Clone the controller to share it across callbacks.
//!
//! # Example
//!
//! ```ignore
//! use gridlink::{EditorController, PointerButton};
//!
//! let ctrl = EditorController::new();
//! {
//!     let mut doc = ctrl.document().borrow_mut();
//!     let n1 = doc.add_node("task", 40.0, 40.0, 120.0, 60.0);
//!     doc.add_connector(n1, "right-output", true);
//! }
//!
//! window.on_pointer_pressed(ctrl.pointer_pressed_callback());
//! window.on_pointer_moved(ctrl.pointer_moved_callback());
//! window.on_pointer_released(ctrl.pointer_released_callback());
//! window.on_before_render(ctrl.before_render_callback());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use slint::{Color, SharedString, VecModel};

use crate::document::{ChangeRecord, Document};
use crate::drag::{ConnectorDrag, DragPhase, EditorHooks, NoopHooks, PointerButton};
use crate::hit_test::{find_connection_at, find_node_at};
use crate::reconcile::Reconciler;
use crate::render::{CrossingConfig, CrossingStyle};
use crate::route::RouteConfig;
use crate::scene::{ConnectionPathData, Scene, TailPalette};
use crate::selection::{ElementId, SelectionManager};
use crate::shape::ShapeManager;
use crate::skin::{SkinRegistry, StyleRegistry};
use crate::state::GeometryCache;
use crate::tail::TailManager;
use crate::validate::{ConnectionValidator, DefaultValidator};

/// Controller tying the document, interaction, and rendering pipeline
/// together. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct EditorController {
    document: Rc<RefCell<Document>>,
    cache: Rc<RefCell<GeometryCache>>,
    skins: Rc<RefCell<SkinRegistry>>,
    styles: Rc<RefCell<StyleRegistry>>,
    shapes: Rc<RefCell<ShapeManager>>,
    scene: Rc<RefCell<Scene>>,
    drag: Rc<RefCell<ConnectorDrag>>,
    tail: Rc<RefCell<TailManager>>,
    reconciler: Rc<RefCell<Reconciler>>,
    selection: Rc<RefCell<SelectionManager>>,
    validator: Rc<RefCell<Box<dyn ConnectionValidator>>>,
    hooks: Rc<RefCell<Box<dyn EditorHooks>>>,
    route_cfg: Rc<RefCell<RouteConfig>>,
    crossing_cfg: Rc<RefCell<CrossingConfig>>,
    pick_radius: Rc<RefCell<f32>>,
}

impl Default for EditorController {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorController {
    /// Create a controller with an empty document and default policies.
    pub fn new() -> Self {
        Self {
            document: Rc::new(RefCell::new(Document::new())),
            cache: Rc::new(RefCell::new(GeometryCache::new())),
            skins: Rc::new(RefCell::new(SkinRegistry::new())),
            styles: Rc::new(RefCell::new(StyleRegistry::new())),
            shapes: Rc::new(RefCell::new(ShapeManager::new())),
            scene: Rc::new(RefCell::new(Scene::new())),
            drag: Rc::new(RefCell::new(ConnectorDrag::new())),
            tail: Rc::new(RefCell::new(TailManager::new())),
            reconciler: Rc::new(RefCell::new(Reconciler::new())),
            selection: Rc::new(RefCell::new(SelectionManager::new())),
            validator: Rc::new(RefCell::new(Box::new(DefaultValidator::new()))),
            hooks: Rc::new(RefCell::new(Box::new(NoopHooks))),
            route_cfg: Rc::new(RefCell::new(RouteConfig::default())),
            crossing_cfg: Rc::new(RefCell::new(CrossingConfig::default())),
            pick_radius: Rc::new(RefCell::new(8.0)),
        }
    }

    // === Shared state ===

    pub fn document(&self) -> Rc<RefCell<Document>> {
        self.document.clone()
    }

    pub fn skins(&self) -> Rc<RefCell<SkinRegistry>> {
        self.skins.clone()
    }

    pub fn styles(&self) -> Rc<RefCell<StyleRegistry>> {
        self.styles.clone()
    }

    pub fn selection(&self) -> Rc<RefCell<SelectionManager>> {
        self.selection.clone()
    }

    /// Current phase of the connector drag machine.
    pub fn drag_phase(&self) -> DragPhase {
        self.drag.borrow().phase()
    }

    /// Snapshot of the computed paths, in paint order, tail last.
    pub fn paths(&self) -> Vec<ConnectionPathData> {
        self.scene.borrow().paths().to_vec()
    }

    // === Configuration ===

    pub fn set_validator<V: ConnectionValidator + 'static>(&self, validator: V) {
        *self.validator.borrow_mut() = Box::new(validator);
    }

    pub fn set_hooks<H: EditorHooks + 'static>(&self, hooks: H) {
        *self.hooks.borrow_mut() = Box::new(hooks);
    }

    /// Toggle between gap and detour crossing visuals for this document.
    pub fn set_crossing_style(&self, style: CrossingStyle) {
        self.scene.borrow_mut().set_crossing_style(style);
    }

    pub fn set_route_config(&self, cfg: RouteConfig) {
        *self.route_cfg.borrow_mut() = cfg;
    }

    pub fn set_crossing_config(&self, cfg: CrossingConfig) {
        *self.crossing_cfg.borrow_mut() = cfg;
    }

    pub fn set_tail_palette(&self, palette: TailPalette) {
        self.scene.borrow_mut().set_tail_palette(palette);
    }

    /// Connector pick radius in diagram units (default: 8).
    pub fn set_pick_radius(&self, radius: f32) {
        *self.pick_radius.borrow_mut() = radius;
    }

    /// Bind a Slint model that receives one row per rendered path.
    pub fn bind_model<P, F>(&self, model: Rc<VecModel<P>>, constructor: F)
    where
        P: Clone + 'static,
        F: Fn(i32, SharedString, Color, f32) -> P + 'static,
    {
        self.scene.borrow_mut().bind_model(model, constructor);
    }

    // === Document lifecycle ===

    /// Replace the document, run the integrity validation pass, and rebuild
    /// all derived state.
    pub fn load_document(&self, document: Document) {
        document.check_integrity();
        *self.document.borrow_mut() = document;
        self.selection.borrow_mut().clear();
        self.drag.borrow_mut().cancel(&mut self.tail.borrow_mut());
        {
            let doc = self.document.borrow();
            self.cache.borrow_mut().rebuild(&doc, &self.skins.borrow());
        }
        self.shapes.borrow_mut().clear();
        self.sync();
    }

    pub fn undo(&self) -> bool {
        let undone = self.document.borrow_mut().undo();
        self.sync();
        undone
    }

    pub fn redo(&self) -> bool {
        let redone = self.document.borrow_mut().redo();
        self.sync();
        redone
    }

    // === Render pass ===

    /// The per-render reconciliation pass.
    ///
    /// Drains queued document changes in FIFO order (many small mutations
    /// coalesce into one visual update), diffs against the remembered
    /// structure, re-resolves affected geometry, refreshes shapes, and
    /// pushes the scene to the bound model. A gesture whose source vanished
    /// from the document cancels through the tail cleanup here.
    pub fn sync(&self) {
        {
            let doc = self.document.borrow();
            let mut drag = self.drag.borrow_mut();
            if !drag.is_consistent(&doc) {
                drag.cancel(&mut self.tail.borrow_mut());
            }
        }

        let changes = self.document.borrow_mut().drain_changes();
        if !changes.is_empty() {
            let diff = {
                let doc = self.document.borrow();
                self.reconciler.borrow_mut().reconcile(&doc)
            };
            {
                let doc = self.document.borrow();
                let skins = self.skins.borrow();
                let mut cache = self.cache.borrow_mut();
                for id in &diff.nodes_removed {
                    cache.forget_node(*id);
                }
                for id in &diff.connectors_removed {
                    cache.forget_connector(*id);
                }
                for id in diff.nodes_added.iter().chain(&diff.nodes_updated) {
                    cache.sync_node(&doc, &skins, *id);
                }
                // Position and size changes are not structural; pick them
                // out of the change stream.
                for record in &changes {
                    if let ChangeRecord::NodeMoved(id) | ChangeRecord::NodeResized(id) = record {
                        cache.sync_node(&doc, &skins, *id);
                    }
                }
                let mut shapes = self.shapes.borrow_mut();
                for id in &diff.connections_removed {
                    shapes.remove(*id);
                }
            }
            {
                let mut doc = self.document.borrow_mut();
                let cache = self.cache.borrow();
                self.shapes.borrow_mut().refresh_all(&mut doc, &cache, &self.route_cfg.borrow());
            }
        }

        let doc = self.document.borrow();
        let hidden = self.drag.borrow().hidden_connection();
        self.scene.borrow_mut().refresh(
            &doc,
            &self.shapes.borrow(),
            &self.styles.borrow(),
            &self.crossing_cfg.borrow(),
            &self.route_cfg.borrow(),
            hidden,
            &self.tail.borrow(),
        );
    }

    // === Pointer handling ===

    /// Handle a pointer press. Connector presses start drag gestures;
    /// otherwise the press drives selection. `additive` is the shift-held
    /// state of the click.
    pub fn pointer_pressed(&self, x: f32, y: f32, button: PointerButton, additive: bool) {
        let handled = {
            let doc = self.document.borrow();
            let cache = self.cache.borrow();
            let mut drag = self.drag.borrow_mut();
            let mut tail = self.tail.borrow_mut();
            let radius = *self.pick_radius.borrow();
            drag.pointer_pressed(&doc, &cache, &mut tail, x, y, button, radius)
        };

        if !handled && button == PointerButton::Primary {
            let target = {
                let doc = self.document.borrow();
                let cache = self.cache.borrow();
                if let Some(node) = find_node_at(&cache, doc.node_order(), x, y) {
                    Some(ElementId::Node(node))
                } else {
                    let shapes = self.shapes.borrow();
                    let routes = doc
                        .connection_order()
                        .iter()
                        .filter_map(|id| shapes.route_points(*id).map(|points| (*id, points)));
                    find_connection_at(routes, x, y, *self.pick_radius.borrow())
                        .map(ElementId::Connection)
                }
            };
            let mut selection = self.selection.borrow_mut();
            match target {
                Some(id) => selection.handle_interaction(id, additive),
                None if !additive => selection.clear(),
                None => {}
            }
        }

        self.sync();
    }

    /// Handle pointer movement; drives tail tracking and hover validation.
    pub fn pointer_moved(&self, x: f32, y: f32) {
        self.drag_moved(x, y);
        self.sync();
    }

    /// Handle a pointer release. Returns the id of a committed connection,
    /// if the gesture ended over a validated candidate.
    pub fn pointer_released(&self, x: f32, y: f32, button: PointerButton) -> Option<i32> {
        // The release position decides: refresh hover state first.
        if button == PointerButton::Primary {
            self.drag_moved(x, y);
        }
        let committed = {
            let mut doc = self.document.borrow_mut();
            let cache = self.cache.borrow();
            let validator = self.validator.borrow();
            let mut hooks = self.hooks.borrow_mut();
            let mut drag = self.drag.borrow_mut();
            let mut tail = self.tail.borrow_mut();
            let route_cfg = *self.route_cfg.borrow();
            drag.pointer_released(
                &mut doc,
                &cache,
                validator.as_ref(),
                hooks.as_mut(),
                &mut tail,
                &route_cfg,
                button,
            )
        };
        self.sync();
        committed
    }

    fn drag_moved(&self, x: f32, y: f32) {
        let doc = self.document.borrow();
        let cache = self.cache.borrow();
        let validator = self.validator.borrow();
        let mut drag = self.drag.borrow_mut();
        let mut tail = self.tail.borrow_mut();
        let radius = *self.pick_radius.borrow();
        drag.pointer_moved(&doc, &cache, validator.as_ref(), &mut tail, x, y, radius);
    }

    // === Editing helpers ===

    /// Drag a connection joint, keeping the connection rectangular.
    pub fn move_joint(&self, joint: i32, x: f32, y: f32) -> bool {
        let moved = {
            let mut doc = self.document.borrow_mut();
            let cache = self.cache.borrow();
            ShapeManager::move_joint(&mut doc, &cache, joint, x, y)
        };
        self.sync();
        moved
    }

    /// Delete every selected node and connection.
    pub fn delete_selected(&self) {
        let (nodes, connections) = {
            let selection = self.selection.borrow();
            (selection.node_ids(), selection.connection_ids())
        };
        {
            let mut doc = self.document.borrow_mut();
            for id in connections {
                doc.remove_connection(id);
            }
            for id in nodes {
                doc.remove_node(id);
            }
        }
        self.selection.borrow_mut().clear();
        self.sync();
    }

    // === Callback factories ===

    pub fn pointer_pressed_callback(&self) -> impl Fn(f32, f32, PointerButton, bool) {
        let ctrl = self.clone();
        move |x, y, button, additive| ctrl.pointer_pressed(x, y, button, additive)
    }

    pub fn pointer_moved_callback(&self) -> impl Fn(f32, f32) {
        let ctrl = self.clone();
        move |x, y| ctrl.pointer_moved(x, y)
    }

    pub fn pointer_released_callback(&self) -> impl Fn(f32, f32, PointerButton) {
        let ctrl = self.clone();
        move |x, y, button| {
            ctrl.pointer_released(x, y, button);
        }
    }

    pub fn before_render_callback(&self) -> impl Fn() {
        let ctrl = self.clone();
        move || ctrl.sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_controller() -> (EditorController, i32, i32) {
        let ctrl = EditorController::new();
        let (out, inp) = {
            let doc = ctrl.document();
            let mut doc = doc.borrow_mut();
            let n1 = doc.add_node("task", 0.0, 0.0, 100.0, 60.0);
            let n2 = doc.add_node("task", 300.0, 100.0, 100.0, 60.0);
            let out = doc.add_connector(n1, "right-output", true).unwrap();
            let inp = doc.add_connector(n2, "left-input", true).unwrap();
            (out, inp)
        };
        ctrl.sync();
        (ctrl, out, inp)
    }

    // ========================================================================
    // Sync pass
    // ========================================================================

    #[test]
    fn test_sync_resolves_geometry() {
        let (ctrl, _, _) = two_node_controller();
        assert_eq!(ctrl.cache.borrow().node_rects.len(), 2);
        assert_eq!(ctrl.cache.borrow().connectors.len(), 2);
    }

    #[test]
    fn test_sync_coalesces_mutations() {
        let (ctrl, _, _) = two_node_controller();
        {
            let doc = ctrl.document();
            let mut doc = doc.borrow_mut();
            let n1 = doc.node_order()[0];
            doc.set_node_position(n1, 10.0, 10.0);
            doc.set_node_position(n1, 20.0, 20.0);
            doc.set_node_position(n1, 30.0, 30.0);
        }
        ctrl.sync();
        // One pass applied all three moves.
        assert!(!ctrl.document().borrow().has_pending_changes());
        let rect = ctrl.cache.borrow().node_rect(ctrl.document().borrow().node_order()[0]).unwrap();
        assert_eq!((rect.x, rect.y), (30.0, 30.0));
    }

    #[test]
    fn test_programmatic_connection_gets_routed() {
        let (ctrl, out, inp) = two_node_controller();
        let conn = ctrl.document().borrow_mut().add_connection("standard", out, inp).unwrap();
        ctrl.sync();

        let paths = ctrl.paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].id, conn);
        assert!(paths[0].commands.starts_with("M "));
        // Joints were materialized with even parity for right->left.
        assert_eq!(ctrl.document().borrow().connection(conn).unwrap().joints.len(), 2);
    }

    // ========================================================================
    // Pointer-driven selection
    // ========================================================================

    #[test]
    fn test_click_selects_node() {
        let (ctrl, _, _) = two_node_controller();
        let n1 = ctrl.document().borrow().node_order()[0];
        ctrl.pointer_pressed(50.0, 30.0, PointerButton::Primary, false);
        assert!(ctrl.selection().borrow().contains(ElementId::Node(n1)));
        ctrl.pointer_released(50.0, 30.0, PointerButton::Primary);
    }

    #[test]
    fn test_click_on_empty_canvas_clears_selection() {
        let (ctrl, _, _) = two_node_controller();
        ctrl.pointer_pressed(50.0, 30.0, PointerButton::Primary, false);
        ctrl.pointer_released(50.0, 30.0, PointerButton::Primary);
        ctrl.pointer_pressed(600.0, 400.0, PointerButton::Primary, false);
        assert!(ctrl.selection().borrow().is_empty());
    }

    #[test]
    fn test_delete_selected_removes_node() {
        let (ctrl, _, _) = two_node_controller();
        let n1 = ctrl.document().borrow().node_order()[0];
        ctrl.selection().borrow_mut().handle_interaction(ElementId::Node(n1), false);
        ctrl.delete_selected();
        assert!(ctrl.document().borrow().node(n1).is_none());
        assert_eq!(ctrl.cache.borrow().node_rects.len(), 1);
    }

    // ========================================================================
    // Drag through the controller facade
    // ========================================================================

    #[test]
    fn test_full_drag_commits_connection() {
        let (ctrl, out, inp) = two_node_controller();
        ctrl.pointer_pressed(100.0, 30.0, PointerButton::Primary, false);
        assert_eq!(ctrl.drag_phase(), DragPhase::Creating);
        ctrl.pointer_moved(200.0, 80.0);
        let committed = ctrl.pointer_released(300.0, 130.0, PointerButton::Primary);

        let conn = committed.expect("commit");
        let doc = ctrl.document();
        let doc = doc.borrow();
        let connection = doc.connection(conn).unwrap();
        assert_eq!(connection.source, out);
        assert_eq!(connection.target, inp);
        assert_eq!(ctrl.drag_phase(), DragPhase::Idle);
    }

    #[test]
    fn test_tail_path_appears_during_gesture() {
        let (ctrl, _, _) = two_node_controller();
        ctrl.pointer_pressed(100.0, 30.0, PointerButton::Primary, false);
        ctrl.pointer_moved(180.0, 60.0);
        assert!(ctrl.paths().iter().any(|p| p.id == crate::scene::TAIL_PATH_ID));
        ctrl.pointer_released(180.0, 60.0, PointerButton::Primary);
        assert!(!ctrl.paths().iter().any(|p| p.id == crate::scene::TAIL_PATH_ID));
    }

    #[test]
    fn test_source_removed_mid_gesture_cancels() {
        let (ctrl, _, _) = two_node_controller();
        ctrl.pointer_pressed(100.0, 30.0, PointerButton::Primary, false);
        let n1 = ctrl.document().borrow().node_order()[0];
        ctrl.document().borrow_mut().remove_node(n1);
        ctrl.sync();
        assert_eq!(ctrl.drag_phase(), DragPhase::Idle);
        assert!(!ctrl.paths().iter().any(|p| p.id == crate::scene::TAIL_PATH_ID));
    }

    // ========================================================================
    // Undo integration
    // ========================================================================

    #[test]
    fn test_undo_updates_view_state() {
        let (ctrl, _, _) = two_node_controller();
        let n3 = ctrl.document().borrow_mut().add_node("task", 600.0, 0.0, 80.0, 40.0);
        ctrl.sync();
        assert!(ctrl.cache.borrow().node_rect(n3).is_some());

        assert!(ctrl.undo());
        assert!(ctrl.document().borrow().node(n3).is_none());
        assert!(ctrl.cache.borrow().node_rect(n3).is_none());
    }
}
