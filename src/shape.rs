//! Connection shapes: the live joint list of each connection and the
//! waypoint polyline derived from it.
//!
//! The manager materializes joints from the route builder when a connection
//! has none, enforces the alternating-axis coupling between neighboring
//! joints with an explicit propagation pass (no observer graph), and
//! re-derives waypoints on every relayout. A joint count that breaks the
//! rectangular parity invariant is logged and rendered from a freshly built
//! route instead; the document is never refused.

use std::collections::HashMap;

use crate::document::{Document, DEFAULT_JOINT_KIND};
use crate::geometry::{Axis, Point, Side};
use crate::route::{build_route, expected_parity, RouteConfig};
use crate::state::GeometryCache;

/// Derived render state of one connection: the full waypoint polyline
/// `[source anchor, joints.., target anchor]`.
#[derive(Clone, Debug)]
pub struct ConnectionShape {
    pub id: i32,
    pub points: Vec<Point>,
}

/// Owns the [`ConnectionShape`] of every displayed connection.
#[derive(Default)]
pub struct ShapeManager {
    shapes: HashMap<i32, ConnectionShape>,
}

impl ShapeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: i32) -> Option<&ConnectionShape> {
        self.shapes.get(&id)
    }

    pub fn route_points(&self, id: i32) -> Option<&[Point]> {
        self.shapes.get(&id).map(|shape| shape.points.as_slice())
    }

    pub fn remove(&mut self, id: i32) {
        self.shapes.remove(&id);
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Refresh every connection in the document and drop shapes of
    /// connections that no longer exist.
    pub fn refresh_all(&mut self, document: &mut Document, cache: &GeometryCache, cfg: &RouteConfig) {
        let order = document.connection_order().to_vec();
        self.shapes.retain(|id, _| order.contains(id));
        for id in order {
            self.refresh(document, cache, cfg, id);
        }
    }

    /// Re-derive one connection's waypoints from its anchors and joints.
    ///
    /// Materializes joints through the route builder when the connection has
    /// none yet, and clamps the anchor-adjacent joint coordinates so the
    /// first and last segments stay perpendicular to their node edges.
    pub fn refresh(&mut self, document: &mut Document, cache: &GeometryCache, cfg: &RouteConfig, id: i32) {
        let Some(connection) = document.connection(id) else {
            self.shapes.remove(&id);
            return;
        };
        let (source, target) = (connection.source, connection.target);
        let joints = connection.joints.clone();

        let anchors = (
            cache.connector_anchor(source),
            cache.connector_side(source),
            cache.connector_anchor(target),
            cache.connector_side(target),
        );
        let (Some(from), Some(from_side), Some(to), Some(to_side)) = anchors else {
            // Stale geometry; nothing can be rendered for this connection.
            self.shapes.remove(&id);
            return;
        };

        if joints.is_empty() {
            let route = build_route(from, from_side, to, to_side, cfg);
            for (index, point) in route.iter().enumerate() {
                document.add_joint_untracked(id, index, DEFAULT_JOINT_KIND, point.x, point.y);
            }
            self.shapes.insert(id, ConnectionShape { id, points: assemble(from, &route, to) });
            return;
        }

        if joints.len() % 2 != expected_parity(from_side, to_side) {
            tracing::error!(
                connection = id,
                joints = joints.len(),
                "joint count breaks rectangular parity, re-deriving route"
            );
            let route = build_route(from, from_side, to, to_side, cfg);
            self.shapes.insert(id, ConnectionShape { id, points: assemble(from, &route, to) });
            return;
        }

        clamp_terminal_joints(document, &joints, from, from_side, to, to_side);

        let positions: Vec<Point> = joints
            .iter()
            .filter_map(|jid| document.joint(*jid).map(|j| Point::new(j.x, j.y)))
            .collect();
        self.shapes.insert(id, ConnectionShape { id, points: assemble(from, &positions, to) });
    }

    /// Move a joint, keeping the connection rectangular.
    ///
    /// One explicit propagation pass: the moved coordinate that faces an
    /// anchor is clamped to the anchor line, and each neighboring joint
    /// inherits the coordinate it shares with the moved joint through their
    /// common segment.
    pub fn move_joint(
        document: &mut Document,
        cache: &GeometryCache,
        joint_id: i32,
        x: f32,
        y: f32,
    ) -> bool {
        let Some(joint) = document.joint(joint_id) else {
            return false;
        };
        let connection_id = joint.connection;
        let Some(connection) = document.connection(connection_id) else {
            return false;
        };
        let joints = connection.joints.clone();
        let Some(index) = joints.iter().position(|j| *j == joint_id) else {
            return false;
        };
        let source_axis = match cache.connector_side(connection.source) {
            Some(side) => side.axis(),
            None => Axis::Horizontal,
        };
        let source_anchor = cache.connector_anchor(connection.source);
        let target_anchor = cache.connector_anchor(connection.target);

        let before_axis = segment_axis_at(source_axis, index);
        let after_axis = before_axis.flipped();

        let mut x = x;
        let mut y = y;
        if index == 0 {
            if let Some(anchor) = source_anchor {
                match before_axis {
                    Axis::Horizontal => y = anchor.y,
                    Axis::Vertical => x = anchor.x,
                }
            }
        }
        if index + 1 == joints.len() {
            if let Some(anchor) = target_anchor {
                match after_axis {
                    Axis::Horizontal => y = anchor.y,
                    Axis::Vertical => x = anchor.x,
                }
            }
        }
        document.set_joint_position(joint_id, x, y);

        if index > 0 {
            propagate(document, joints[index - 1], before_axis, x, y);
        }
        if index + 1 < joints.len() {
            propagate(document, joints[index + 1], after_axis, x, y);
        }
        true
    }
}

/// Axis of the polyline segment entering joint `index`, assuming strict
/// alternation from the source side outward.
fn segment_axis_at(source_axis: Axis, index: usize) -> Axis {
    if index % 2 == 0 {
        source_axis
    } else {
        source_axis.flipped()
    }
}

/// Give a neighboring joint the coordinate it shares with the moved joint
/// through the segment of the given axis.
fn propagate(document: &mut Document, neighbor: i32, axis: Axis, x: f32, y: f32) {
    let Some(joint) = document.joint(neighbor) else {
        return;
    };
    let (nx, ny) = match axis {
        Axis::Horizontal => (joint.x, y),
        Axis::Vertical => (x, joint.y),
    };
    if nx != joint.x || ny != joint.y {
        document.set_joint_position_untracked(neighbor, nx, ny);
    }
}

/// Clamp the first and last joints onto their anchor lines so the terminal
/// segments leave the nodes perpendicular to their edges.
fn clamp_terminal_joints(
    document: &mut Document,
    joints: &[i32],
    from: Point,
    from_side: Side,
    to: Point,
    to_side: Side,
) {
    if let Some(first) = joints.first().and_then(|id| document.joint(*id)) {
        let (id, jx, jy) = (first.id, first.x, first.y);
        let (nx, ny) = match from_side.axis() {
            Axis::Horizontal => (jx, from.y),
            Axis::Vertical => (from.x, jy),
        };
        if nx != jx || ny != jy {
            document.set_joint_position_untracked(id, nx, ny);
        }
    }
    if let Some(last) = joints.last().and_then(|id| document.joint(*id)) {
        let (id, jx, jy) = (last.id, last.x, last.y);
        let (nx, ny) = match to_side.axis() {
            Axis::Horizontal => (jx, to.y),
            Axis::Vertical => (to.x, jy),
        };
        if nx != jx || ny != jy {
            document.set_joint_position_untracked(id, nx, ny);
        }
    }
}

fn assemble(from: Point, interior: &[Point], to: Point) -> Vec<Point> {
    let mut points = Vec::with_capacity(interior.len() + 2);
    points.push(from);
    points.extend_from_slice(interior);
    points.push(to);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::geometry::segment_axis;
    use crate::skin::SkinRegistry;

    /// Two nodes connected right-output to left-input, geometry resolved.
    fn setup() -> (Document, GeometryCache, SkinRegistry, ShapeManager, i32) {
        let mut doc = Document::new();
        let n1 = doc.add_node("task", 0.0, 0.0, 100.0, 60.0);
        let n2 = doc.add_node("task", 300.0, 100.0, 100.0, 60.0);
        let out = doc.add_connector(n1, "right-output", true).unwrap();
        let inp = doc.add_connector(n2, "left-input", true).unwrap();
        let conn = doc.add_connection("standard", out, inp).unwrap();

        let skins = SkinRegistry::new();
        let mut cache = GeometryCache::new();
        cache.rebuild(&doc, &skins);

        let mut shapes = ShapeManager::new();
        shapes.refresh(&mut doc, &cache, &RouteConfig::default(), conn);
        (doc, cache, skins, shapes, conn)
    }

    // ========================================================================
    // Joint materialization
    // ========================================================================

    #[test]
    fn test_refresh_materializes_joints() {
        let (doc, _, _, shapes, conn) = setup();
        // Facing right->left connectors route through a shared midline.
        assert_eq!(doc.connection(conn).unwrap().joints.len(), 2);
        let points = shapes.route_points(conn).unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Point::new(100.0, 30.0));
        assert_eq!(points[3], Point::new(300.0, 130.0));
    }

    #[test]
    fn test_materialized_polyline_alternates() {
        let (_, _, _, shapes, conn) = setup();
        let points = shapes.route_points(conn).unwrap();
        let mut last = None;
        for pair in points.windows(2) {
            if let Some(axis) = segment_axis(pair[0], pair[1]) {
                assert_ne!(last, Some(axis));
                last = Some(axis);
            }
        }
    }

    #[test]
    fn test_refresh_is_stable() {
        let (mut doc, cache, _, mut shapes, conn) = setup();
        let joints_before = doc.connection(conn).unwrap().joints.clone();
        shapes.refresh(&mut doc, &cache, &RouteConfig::default(), conn);
        assert_eq!(doc.connection(conn).unwrap().joints, joints_before);
    }

    // ========================================================================
    // Relayout under node movement
    // ========================================================================

    #[test]
    fn test_node_move_clamps_terminal_joints() {
        let (mut doc, mut cache, skins, mut shapes, conn) = setup();
        let n1 = doc.node_order()[0];
        doc.set_node_position(n1, 0.0, 200.0);
        cache.sync_node(&doc, &skins, n1);
        shapes.refresh(&mut doc, &cache, &RouteConfig::default(), conn);

        let points = shapes.route_points(conn).unwrap().to_vec();
        // First segment still leaves the right edge horizontally.
        assert_eq!(points[0], Point::new(100.0, 230.0));
        assert_eq!(points[1].y, 230.0);
        // Last segment still enters the left edge horizontally.
        assert_eq!(points[points.len() - 2].y, 130.0);
    }

    // ========================================================================
    // Parity fallback
    // ========================================================================

    #[test]
    fn test_parity_mismatch_renders_derived_route() {
        let (mut doc, cache, _, mut shapes, conn) = setup();
        // Force an odd joint count on a same-orientation pair.
        doc.add_joint(conn, 0, "standard", 150.0, 80.0).unwrap();
        assert_eq!(doc.connection(conn).unwrap().joints.len() % 2, 1);

        shapes.refresh(&mut doc, &cache, &RouteConfig::default(), conn);
        let points = shapes.route_points(conn).unwrap();
        // Rendered from a re-derived route (2 joints), stored joints intact.
        assert_eq!(points.len(), 4);
        assert_eq!(doc.connection(conn).unwrap().joints.len(), 3);
    }

    // ========================================================================
    // Joint dragging and constraint propagation
    // ========================================================================

    #[test]
    fn test_move_joint_propagates_shared_coordinate() {
        let (mut doc, cache, _, _, conn) = setup();
        let joints = doc.connection(conn).unwrap().joints.clone();
        // Pair shares its x through the vertical middle segment.
        ShapeManager::move_joint(&mut doc, &cache, joints[0], 250.0, 30.0);

        let j0 = doc.joint(joints[0]).unwrap();
        let j1 = doc.joint(joints[1]).unwrap();
        assert_eq!(j0.x, 250.0);
        assert_eq!(j1.x, 250.0);
    }

    #[test]
    fn test_move_joint_clamps_to_anchor_line() {
        let (mut doc, cache, _, _, conn) = setup();
        let joints = doc.connection(conn).unwrap().joints.clone();
        // Attempt to pull the first joint off the source anchor line.
        ShapeManager::move_joint(&mut doc, &cache, joints[0], 250.0, 500.0);

        let j0 = doc.joint(joints[0]).unwrap();
        // y snaps back to the source anchor's line.
        assert_eq!(j0.y, 30.0);
        assert_eq!(j0.x, 250.0);
    }

    #[test]
    fn test_move_missing_joint_is_noop() {
        let (mut doc, cache, _, _, _) = setup();
        assert!(!ShapeManager::move_joint(&mut doc, &cache, 9999, 0.0, 0.0));
    }

    #[test]
    fn test_shape_removed_with_connection() {
        let (mut doc, cache, _, mut shapes, conn) = setup();
        doc.remove_connection(conn);
        shapes.refresh_all(&mut doc, &cache, &RouteConfig::default());
        assert!(shapes.get(conn).is_none());
    }
}
