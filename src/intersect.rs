//! Crossing detection between routed connections.
//!
//! Works on the waypoint polylines of all displayed connections in paint
//! order. For one connection it reports, per segment, the sorted offsets at
//! which segments of *other* connections cross it. Whether the neighbors
//! considered are the ones painted behind or in front of the subject is the
//! caller's choice and decides gap/detour precedence.

use crate::geometry::{segment_axis, Axis, Point};

/// Which neighbors of a connection participate in crossing detection,
/// relative to paint order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossingScope {
    /// Connections painted before the subject (underneath it).
    Behind,
    /// Connections painted after the subject (on top of it).
    InFront,
}

/// Sorted crossing offsets (distance from segment start) per segment of one
/// connection's polyline. Entry `i` belongs to the segment between waypoints
/// `i` and `i + 1`.
pub type SegmentCrossings = Vec<Vec<f32>>;

/// Find where other connections' segments cross the subject's segments.
///
/// Crossings closer than `edge_tolerance` to either end of the subject's
/// segment are discarded; there is not enough room to draw a gap or detour
/// there cleanly. A connection never reports a crossing with itself.
///
/// # Arguments
/// * `subject` - Index of the subject connection within `routes`
/// * `routes` - `(connection id, waypoint polyline)` for every displayed
///   connection, in paint order
/// * `scope` - Which side of the paint order to test against
/// * `edge_tolerance` - Endpoint exclusion distance along a segment
pub fn find_crossings(
    subject: usize,
    routes: &[(i32, Vec<Point>)],
    scope: CrossingScope,
    edge_tolerance: f32,
) -> SegmentCrossings {
    let (subject_id, subject_points) = &routes[subject];
    let others: &[(i32, Vec<Point>)] = match scope {
        CrossingScope::Behind => &routes[..subject],
        CrossingScope::InFront => &routes[subject + 1..],
    };

    let segment_count = subject_points.len().saturating_sub(1);
    let mut crossings: SegmentCrossings = vec![Vec::new(); segment_count];

    for (index, slot) in crossings.iter_mut().enumerate() {
        let a = subject_points[index];
        let b = subject_points[index + 1];
        let Some(axis) = segment_axis(a, b) else {
            continue;
        };
        let length = match axis {
            Axis::Horizontal => (b.x - a.x).abs(),
            Axis::Vertical => (b.y - a.y).abs(),
        };

        for (other_id, other_points) in others {
            if other_id == subject_id {
                continue;
            }
            for pair in other_points.windows(2) {
                if let Some(offset) = crossing_offset(a, b, axis, pair[0], pair[1]) {
                    if offset > edge_tolerance && offset < length - edge_tolerance {
                        slot.push(offset);
                    }
                }
            }
        }
        slot.sort_by(|lhs, rhs| lhs.total_cmp(rhs));
    }

    crossings
}

/// Offset along the subject segment at which the other segment crosses it,
/// or `None` if the segments are parallel, degenerate, or merely touch.
fn crossing_offset(a: Point, b: Point, axis: Axis, c: Point, d: Point) -> Option<f32> {
    let other_axis = segment_axis(c, d)?;
    if other_axis == axis {
        // Parallel or collinear runs never cross; they overlap.
        return None;
    }
    match axis {
        Axis::Horizontal => {
            let (x_min, x_max) = ordered(a.x, b.x);
            let (y_min, y_max) = ordered(c.y, d.y);
            if c.x > x_min && c.x < x_max && a.y > y_min && a.y < y_max {
                Some((c.x - a.x).abs())
            } else {
                None
            }
        }
        Axis::Vertical => {
            let (y_min, y_max) = ordered(a.y, b.y);
            let (x_min, x_max) = ordered(c.x, d.x);
            if c.y > y_min && c.y < y_max && a.x > x_min && a.x < x_max {
                Some((c.y - a.y).abs())
            } else {
                None
            }
        }
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
