//! # Gridlink
//!
//! An engine for building rectangular-connection diagram editors: nodes
//! carry typed connectors, connections route orthogonally between them
//! through user-draggable joints, and crossings between connections render
//! as gaps or semicircular detours.
//!
//! The crate owns the algorithmic core and stays out of the widget layer:
//! the rendering surface receives SVG path-data rows (optionally synced
//! into a `slint::VecModel`), and pointer events come in through plain
//! callbacks.
//!
//! ## Core Components
//!
//! - [`EditorController`] - Glues the pipeline together and handles input
//! - [`Document`] - The mutable graph document with change queue and undo
//! - [`build_route`] - Orthogonal path synthesis between connector anchors
//! - [`find_crossings`] / [`render_route`] - Crossing detection and
//!   gap/detour rendering
//! - [`ConnectorDrag`] - The connector drag state machine
//! - [`TailManager`] - The transient preview path during a drag
//! - [`Reconciler`] - Minimal visual diffing between document states
//! - [`SkinRegistry`] / [`StyleRegistry`] - Type-tag driven layout and
//!   styling
//!
//! ## Quick Start
//!
//! ```
//! use gridlink::{EditorController, PointerButton};
//!
//! let ctrl = EditorController::new();
//! {
//!     let doc = ctrl.document();
//!     let mut doc = doc.borrow_mut();
//!     let n1 = doc.add_node("task", 0.0, 0.0, 120.0, 60.0);
//!     let n2 = doc.add_node("task", 300.0, 40.0, 120.0, 60.0);
//!     doc.add_connector(n1, "right-output", true);
//!     doc.add_connector(n2, "left-input", true);
//! }
//! ctrl.sync();
//!
//! // Drag from the output connector onto the input connector.
//! ctrl.pointer_pressed(120.0, 30.0, PointerButton::Primary, false);
//! ctrl.pointer_moved(250.0, 50.0);
//! let connection = ctrl.pointer_released(300.0, 70.0, PointerButton::Primary);
//! assert!(connection.is_some());
//! ```

pub mod controller;
pub mod document;
pub mod drag;
pub mod geometry;
pub mod hit_test;
pub mod intersect;
pub mod reconcile;
pub mod render;
pub mod route;
pub mod scene;
pub mod selection;
pub mod shape;
pub mod skin;
pub mod state;
pub mod tail;
pub mod validate;

// Re-export the public surface.
pub use controller::EditorController;
pub use document::{
    ChangeRecord, Connection, Connector, ConnectorKind, Document, Flow, IntegrityError, Joint,
    Node, UnknownConnectorKind,
};
pub use drag::{ConnectorDrag, DragPhase, EditorHooks, NoopHooks, PointerButton};
pub use geometry::{crisp, crisp_up, segment_axis, Axis, Point, Side};
pub use hit_test::{
    connections_in_box, distance_to_polyline, find_connection_at, find_connector_at, find_node_at,
    nodes_in_box,
};
pub use intersect::{find_crossings, CrossingScope, SegmentCrossings};
pub use reconcile::{DocumentDiff, Reconciler};
pub use render::{render_plain, render_route, to_svg, CrossingConfig, CrossingStyle, PathCommand};
pub use route::{build_route, RouteConfig};
pub use scene::{ConnectionPathData, Scene, TailPalette, TAIL_PATH_ID};
pub use selection::{ElementId, SelectionManager};
pub use shape::{ConnectionShape, ShapeManager};
pub use skin::{ConnectionStyle, DefaultNodeSkin, NodeSkin, SkinRegistry, StyleRegistry};
pub use state::{ConnectorLayout, GeometryCache, NodeLayout};
pub use tail::{TailFeedback, TailManager};
pub use validate::{
    CompositeValidator, ConnectionValidator, DefaultValidator, ValidationError, ValidationResult,
};
