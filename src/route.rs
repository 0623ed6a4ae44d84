//! Rectangular path builder.
//!
//! Given a start anchor and side and an end anchor and side, synthesizes the
//! intermediate waypoints of an axis-aligned path that leaves each anchor
//! perpendicular to its node edge. The sixteen side pairings reduce to three
//! canonical strategies (same side, opposite sides, perpendicular sides);
//! mirrored pairings call the canonical strategy with swapped arguments and
//! reverse the resulting point list.

use crate::geometry::{Axis, Point, Side};

/// Tunables for the rectangular path builder.
#[derive(Clone, Copy, Debug)]
pub struct RouteConfig {
    /// Distance a path travels outward from its anchor before the first
    /// turn, keeping it clear of the node body.
    pub min_extension: f32,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self { min_extension: 30.0 }
    }
}

/// Build the intermediate waypoints of a rectangular path.
///
/// The returned list excludes both anchors: the full polyline is
/// `[from, ...build_route(..), to]`. Concatenated this way the segments
/// strictly alternate between horizontal and vertical, and
/// `build_route(a, sa, b, sb)` equals the reverse of
/// `build_route(b, sb, a, sa)`.
///
/// # Arguments
/// * `from`, `from_side` - Start anchor and the node edge it sits on
/// * `to`, `to_side` - End anchor and its node edge
pub fn build_route(
    from: Point,
    from_side: Side,
    to: Point,
    to_side: Side,
    cfg: &RouteConfig,
) -> Vec<Point> {
    if from_side == to_side {
        return same_side(from, to, from_side, cfg);
    }
    match (from_side.axis(), to_side.axis()) {
        (Axis::Horizontal, Axis::Horizontal) => {
            if from_side == Side::Left {
                opposite_horizontal(from, to, cfg)
            } else {
                mirrored(from, from_side, to, to_side, cfg)
            }
        }
        (Axis::Vertical, Axis::Vertical) => {
            if from_side == Side::Top {
                opposite_vertical(from, to, cfg)
            } else {
                mirrored(from, from_side, to, to_side, cfg)
            }
        }
        (Axis::Horizontal, Axis::Vertical) => perpendicular(from, from_side, to, to_side, cfg),
        (Axis::Vertical, Axis::Horizontal) => mirrored(from, from_side, to, to_side, cfg),
    }
}

/// Mirror rule: build the canonical direction and reverse the points.
fn mirrored(from: Point, from_side: Side, to: Point, to_side: Side, cfg: &RouteConfig) -> Vec<Point> {
    let mut points = build_route(to, to_side, from, from_side, cfg);
    points.reverse();
    points
}

/// Both connectors on the same edge kind (left-left, top-top, ...).
///
/// Routes through a shared perpendicular offset beyond whichever anchor
/// extends further in the outward direction.
fn same_side(from: Point, to: Point, side: Side, cfg: &RouteConfig) -> Vec<Point> {
    let m = cfg.min_extension;
    match side {
        Side::Left => {
            let rail = from.x.min(to.x) - m;
            vec![Point::new(rail, from.y), Point::new(rail, to.y)]
        }
        Side::Right => {
            let rail = from.x.max(to.x) + m;
            vec![Point::new(rail, from.y), Point::new(rail, to.y)]
        }
        Side::Top => {
            let rail = from.y.min(to.y) - m;
            vec![Point::new(from.x, rail), Point::new(to.x, rail)]
        }
        Side::Bottom => {
            let rail = from.y.max(to.y) + m;
            vec![Point::new(from.x, rail), Point::new(to.x, rail)]
        }
    }
}

/// Canonical opposite-sides strategy: `from` exits left, `to` exits right.
///
/// When the anchors face each other with at least two extensions of
/// clearance the path folds once across a shared vertical midline;
/// otherwise it routes out, across, and back in through a horizontal fold
/// at the midpoint.
fn opposite_horizontal(from: Point, to: Point, cfg: &RouteConfig) -> Vec<Point> {
    let m = cfg.min_extension;
    if from.x - to.x >= 2.0 * m {
        if from.y == to.y {
            // Anchors already share a line; the path is a single segment.
            return Vec::new();
        }
        let mid = (from.x + to.x) / 2.0;
        vec![Point::new(mid, from.y), Point::new(mid, to.y)]
    } else {
        let fold = (from.y + to.y) / 2.0;
        vec![
            Point::new(from.x - m, from.y),
            Point::new(from.x - m, fold),
            Point::new(to.x + m, fold),
            Point::new(to.x + m, to.y),
        ]
    }
}

/// Canonical opposite-sides strategy on the vertical axis: `from` exits up,
/// `to` exits down.
fn opposite_vertical(from: Point, to: Point, cfg: &RouteConfig) -> Vec<Point> {
    let m = cfg.min_extension;
    if from.y - to.y >= 2.0 * m {
        if from.x == to.x {
            return Vec::new();
        }
        let mid = (from.y + to.y) / 2.0;
        vec![Point::new(from.x, mid), Point::new(to.x, mid)]
    } else {
        let fold = (from.x + to.x) / 2.0;
        vec![
            Point::new(from.x, from.y - m),
            Point::new(fold, from.y - m),
            Point::new(fold, to.y + m),
            Point::new(to.x, to.y + m),
        ]
    }
}

/// Canonical perpendicular strategy: `from` on a horizontal-axis edge,
/// `to` on a vertical-axis edge.
///
/// Produces an "L" with a single corner when the far anchor already clears
/// the minimum extension on both axes, otherwise a "Z" through both
/// extension stubs.
fn perpendicular(
    from: Point,
    from_side: Side,
    to: Point,
    to_side: Side,
    cfg: &RouteConfig,
) -> Vec<Point> {
    let m = cfg.min_extension;
    let (sx, _) = from_side.outward();
    let (_, sy) = to_side.outward();

    let clears_x = (to.x - from.x) * sx >= m;
    let clears_y = (from.y - to.y) * sy >= m;

    if clears_x && clears_y {
        vec![Point::new(to.x, from.y)]
    } else {
        let stub_x = from.x + sx * m;
        let stub_y = to.y + sy * m;
        vec![
            Point::new(stub_x, from.y),
            Point::new(stub_x, stub_y),
            Point::new(to.x, stub_y),
        ]
    }
}

/// Joint-count parity required for a side pairing: even when both sides
/// share an axis, odd otherwise. This is what makes the full polyline
/// alternate axes and close perpendicular at both anchors.
pub fn expected_parity(from_side: Side, to_side: Side) -> usize {
    if from_side.axis() == to_side.axis() {
        0
    } else {
        1
    }
}
