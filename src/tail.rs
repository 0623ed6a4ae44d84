//! The tail: the transient preview path shown while a connection is being
//! dragged.
//!
//! Exactly one tail can exist per gesture. The drag state machine creates
//! it on drag start, feeds it cursor positions, snaps it onto hovered
//! candidates, and must reach [`TailManager::clean_up`] at the end of every
//! gesture regardless of outcome.

use crate::geometry::{Point, Side};
use crate::route::{build_route, RouteConfig};

/// Visual feedback applied to the tail while hovering a candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TailFeedback {
    /// Free tracking, no candidate under the cursor.
    #[default]
    Neutral,
    /// Hovered candidate validated successfully.
    Allowed,
    /// Hovered candidate failed validation.
    Forbidden,
}

#[derive(Clone, Debug)]
struct Tail {
    source: i32,
    anchor: Point,
    anchor_side: Side,
    /// Interior waypoints inherited from a detached connection, ordered
    /// from the anchored end toward the free end.
    seeded: Vec<Point>,
    end: Point,
    /// Side of the snapped candidate, if any.
    end_side: Option<Side>,
    feedback: TailFeedback,
}

/// Owns the per-gesture preview state.
#[derive(Default)]
pub struct TailManager {
    tail: Option<Tail>,
}

impl TailManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a preview from a connector's anchor to the cursor.
    ///
    /// Idempotent within a gesture: a second call for the same source only
    /// tracks the cursor.
    pub fn create(&mut self, source: i32, anchor: Point, side: Side, cursor: Point) {
        if let Some(tail) = &self.tail {
            if tail.source == source {
                self.update_position(cursor);
                return;
            }
        }
        self.tail = Some(Tail {
            source,
            anchor,
            anchor_side: side,
            seeded: Vec::new(),
            end: cursor,
            end_side: None,
            feedback: TailFeedback::Neutral,
        });
    }

    /// Start a preview seeded with a detached connection's joint positions,
    /// ordered from the still-attached end, so the visual hand-off from the
    /// connection to the tail is seamless.
    pub fn create_from_connection(
        &mut self,
        source: i32,
        anchor: Point,
        side: Side,
        seeded: Vec<Point>,
        cursor: Point,
    ) {
        if let Some(tail) = &self.tail {
            if tail.source == source {
                self.update_position(cursor);
                return;
            }
        }
        self.tail = Some(Tail {
            source,
            anchor,
            anchor_side: side,
            seeded,
            end: cursor,
            end_side: None,
            feedback: TailFeedback::Neutral,
        });
    }

    /// Track the free end to the cursor, dropping any candidate snap.
    pub fn update_position(&mut self, cursor: Point) {
        if let Some(tail) = &mut self.tail {
            tail.end = cursor;
            tail.end_side = None;
            tail.feedback = TailFeedback::Neutral;
        }
    }

    /// Snap the free end onto a candidate's anchor and show whether the
    /// connection would be allowed.
    pub fn snap_position(&mut self, target_anchor: Point, target_side: Side, valid: bool) {
        if let Some(tail) = &mut self.tail {
            tail.end = target_anchor;
            tail.end_side = Some(target_side);
            tail.feedback = if valid { TailFeedback::Allowed } else { TailFeedback::Forbidden };
        }
    }

    /// Remove the preview and clear all per-gesture state. Safe to call
    /// more than once.
    pub fn clean_up(&mut self) {
        self.tail = None;
    }

    pub fn is_active(&self) -> bool {
        self.tail.is_some()
    }

    pub fn source(&self) -> Option<i32> {
        self.tail.as_ref().map(|tail| tail.source)
    }

    pub fn feedback(&self) -> TailFeedback {
        self.tail.as_ref().map(|tail| tail.feedback).unwrap_or_default()
    }

    /// Full preview polyline from the anchored end to the free end.
    ///
    /// Without seeds the polyline is routed rectangularly; seeded previews
    /// keep their inherited joints and track the cursor with the final
    /// segment only.
    pub fn waypoints(&self, cfg: &RouteConfig) -> Option<Vec<Point>> {
        let tail = self.tail.as_ref()?;
        let mut points = vec![tail.anchor];
        if tail.seeded.is_empty() {
            let end_side = tail.end_side.unwrap_or_else(|| tail.anchor_side.opposite());
            points.extend(build_route(tail.anchor, tail.anchor_side, tail.end, end_side, cfg));
        } else {
            points.extend_from_slice(&tail.seeded);
        }
        points.push(tail.end);
        Some(points)
    }

    /// Interior waypoints (joint candidates) of the current preview.
    pub fn interior_waypoints(&self, cfg: &RouteConfig) -> Vec<Point> {
        match self.waypoints(cfg) {
            Some(points) if points.len() > 2 => points[1..points.len() - 1].to_vec(),
            _ => Vec::new(),
        }
    }
}
