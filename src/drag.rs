//! Connector drag state machine.
//!
//! Tracks the life of a connection gesture: press on a connector starts
//! either a new tail (creating) or pulls an existing connection's endpoint
//! free (detaching); hovering a candidate runs prevalidation and validation
//! and snaps the tail; release commits or cancels. Every exit path runs the
//! tail cleanup, and non-primary buttons never transition state.

use crate::document::{Document, Flow};
use crate::geometry::Point;
use crate::hit_test::find_connector_at;
use crate::route::RouteConfig;
use crate::state::GeometryCache;
use crate::tail::TailManager;
use crate::validate::ConnectionValidator;

/// Pointer button, as far as the state machine cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Externally visible phase of the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Drawing a new tail from a creatable connector.
    Creating,
    /// Pulling an existing connection's endpoint free.
    Detaching,
    /// Cursor over a candidate connector, validation feedback showing.
    HoveringTarget,
}

/// Hooks invoked synchronously while committing or detaching a connection.
/// Implementations may append further document mutations.
pub trait EditorHooks {
    fn connection_added(&mut self, _document: &mut Document, _connection: i32) {}
    fn connection_removed(&mut self, _document: &mut Document, _connection: i32) {}
}

/// Default hooks: do nothing.
#[derive(Default)]
pub struct NoopHooks;

impl EditorHooks for NoopHooks {}

#[derive(Clone, Copy, Debug)]
enum GestureOrigin {
    Create,
    Detach {
        connection: i32,
        /// True when the pointer grabbed the connection's source end, so a
        /// reattach flips the seeded waypoint order back to source→target.
        grabbed_source_end: bool,
    },
}

#[derive(Clone, Copy, Debug)]
struct Hover {
    candidate: i32,
    valid: bool,
}

#[derive(Clone, Copy, Debug)]
struct Gesture {
    /// The connector the committed connection keeps: the pressed connector
    /// when creating, the far endpoint when detaching.
    source: i32,
    origin: GestureOrigin,
    hover: Option<Hover>,
}

/// The connector drag state machine. One pointer, one gesture at a time.
#[derive(Default)]
pub struct ConnectorDrag {
    gesture: Option<Gesture>,
}

impl ConnectorDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DragPhase {
        match &self.gesture {
            None => DragPhase::Idle,
            Some(gesture) if gesture.hover.is_some() => DragPhase::HoveringTarget,
            Some(gesture) => match gesture.origin {
                GestureOrigin::Create => DragPhase::Creating,
                GestureOrigin::Detach { .. } => DragPhase::Detaching,
            },
        }
    }

    /// The connector the active gesture validates against, if any.
    pub fn source(&self) -> Option<i32> {
        self.gesture.as_ref().map(|gesture| gesture.source)
    }

    /// Connection to suppress in the scene while its endpoint is detached.
    pub fn hidden_connection(&self) -> Option<i32> {
        match self.gesture.as_ref().map(|gesture| gesture.origin) {
            Some(GestureOrigin::Detach { connection, .. }) => Some(connection),
            _ => None,
        }
    }

    /// Handle a pointer press. Returns `true` when the press started a
    /// gesture (and was consumed).
    pub fn pointer_pressed(
        &mut self,
        document: &Document,
        cache: &GeometryCache,
        tail: &mut TailManager,
        x: f32,
        y: f32,
        button: PointerButton,
        pick_radius: f32,
    ) -> bool {
        if button != PointerButton::Primary {
            return false;
        }
        if self.gesture.is_some() {
            // One pointer: a second drag-detected event has no meaning.
            return false;
        }
        let Some(grabbed) = find_connector_at(cache, x, y, pick_radius) else {
            return false;
        };
        let Some(connector) = document.connector(grabbed) else {
            return false;
        };
        let cursor = Point::new(x, y);

        let removable = !connector.connections.is_empty() && connector.detach_on_drag;
        if removable {
            // Pull the most recently attached connection free.
            let connection_id = *connector.connections.last().expect("non-empty");
            let Some(connection) = document.connection(connection_id) else {
                return false;
            };
            let grabbed_source_end = connection.target != grabbed;
            let fixed = if grabbed_source_end { connection.target } else { connection.source };
            let (Some(anchor), Some(side)) =
                (cache.connector_anchor(fixed), cache.connector_side(fixed))
            else {
                return false;
            };

            let mut seeded: Vec<Point> = document
                .joint_positions(connection_id)
                .into_iter()
                .map(|(jx, jy)| Point::new(jx, jy))
                .collect();
            if grabbed_source_end {
                // The tail anchors at the original target; walk the joints
                // from that end.
                seeded.reverse();
            }

            tail.create_from_connection(fixed, anchor, side, seeded, cursor);
            tracing::debug!(connector = grabbed, connection = connection_id, "drag: detaching");
            self.gesture = Some(Gesture {
                source: fixed,
                origin: GestureOrigin::Detach { connection: connection_id, grabbed_source_end },
                hover: None,
            });
            return true;
        }

        // Creatable: no connection yet, or drags spawn parallel connections.
        let (Some(anchor), Some(side)) =
            (cache.connector_anchor(grabbed), cache.connector_side(grabbed))
        else {
            return false;
        };
        tail.create(grabbed, anchor, side, cursor);
        tracing::debug!(connector = grabbed, "drag: creating");
        self.gesture = Some(Gesture { source: grabbed, origin: GestureOrigin::Create, hover: None });
        true
    }

    /// Handle pointer movement during a gesture: track the tail, and run
    /// prevalidate/validate when a candidate connector is under the cursor.
    pub fn pointer_moved(
        &mut self,
        document: &Document,
        cache: &GeometryCache,
        validator: &dyn ConnectionValidator,
        tail: &mut TailManager,
        x: f32,
        y: f32,
        pick_radius: f32,
    ) {
        let Some(gesture) = &mut self.gesture else {
            return;
        };
        let cursor = Point::new(x, y);

        let candidate = find_connector_at(cache, x, y, pick_radius)
            .filter(|candidate| validator.prevalidate(document, gesture.source, *candidate).is_valid());

        match candidate {
            Some(candidate) => {
                let valid = validator.validate(document, gesture.source, candidate).is_valid();
                let (Some(anchor), Some(side)) =
                    (cache.connector_anchor(candidate), cache.connector_side(candidate))
                else {
                    gesture.hover = None;
                    tail.update_position(cursor);
                    return;
                };
                gesture.hover = Some(Hover { candidate, valid });
                tail.snap_position(anchor, side, valid);
            }
            None => {
                gesture.hover = None;
                tail.update_position(cursor);
            }
        }
    }

    /// Handle pointer release: commit over a validated candidate, cancel
    /// anywhere else. The tail is cleaned up on every path.
    ///
    /// Returns the id of a newly created connection, if any.
    #[allow(clippy::too_many_arguments)]
    pub fn pointer_released(
        &mut self,
        document: &mut Document,
        cache: &GeometryCache,
        validator: &dyn ConnectionValidator,
        hooks: &mut dyn EditorHooks,
        tail: &mut TailManager,
        route_cfg: &RouteConfig,
        button: PointerButton,
    ) -> Option<i32> {
        if button != PointerButton::Primary {
            return None;
        }
        let gesture = self.gesture.take()?;

        let committed = match gesture.hover {
            Some(hover) if hover.valid
                // Validation may have gone stale since the hover was entered.
                && validator.validate(document, gesture.source, hover.candidate).is_valid() =>
            {
                self.commit(document, cache, validator, hooks, tail, route_cfg, &gesture, hover.candidate)
            }
            _ => {
                tracing::debug!("drag: cancelled");
                None
            }
        };

        tail.clean_up();
        committed
    }

    /// Cancel the active gesture, e.g. when its source vanished from the
    /// document mid-drag. Unconditionally reaches the tail cleanup.
    pub fn cancel(&mut self, tail: &mut TailManager) {
        if self.gesture.take().is_some() {
            tracing::debug!("drag: cancelled externally");
        }
        tail.clean_up();
    }

    /// True when the gesture can still resolve its document references.
    pub fn is_consistent(&self, document: &Document) -> bool {
        match &self.gesture {
            None => true,
            Some(gesture) => {
                let source_ok = document.connector(gesture.source).is_some();
                let origin_ok = match gesture.origin {
                    GestureOrigin::Create => true,
                    GestureOrigin::Detach { connection, .. } => {
                        document.connection(connection).is_some()
                    }
                };
                source_ok && origin_ok
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn commit(
        &self,
        document: &mut Document,
        _cache: &GeometryCache,
        validator: &dyn ConnectionValidator,
        hooks: &mut dyn EditorHooks,
        tail: &TailManager,
        route_cfg: &RouteConfig,
        gesture: &Gesture,
        candidate: i32,
    ) -> Option<i32> {
        let kind = validator.connection_kind(document, gesture.source, candidate);
        let joint_kind = validator.joint_kind(document, gesture.source, candidate);
        let mut waypoints = tail.interior_waypoints(route_cfg);

        // Tail waypoints run from the anchored end to the candidate; orient
        // them source→target along the committed connection.
        let (source, target) = match gesture.origin {
            GestureOrigin::Create => {
                // Normalize so the connection's source is the output side.
                let grabbed_is_input = document
                    .connector(gesture.source)
                    .is_some_and(|c| c.kind.flow == Flow::Input);
                if grabbed_is_input {
                    waypoints.reverse();
                    (candidate, gesture.source)
                } else {
                    (gesture.source, candidate)
                }
            }
            GestureOrigin::Detach { connection, grabbed_source_end } => {
                // Remove the original first; its hook may mutate further.
                if document.remove_connection(connection) {
                    hooks.connection_removed(document, connection);
                }
                if grabbed_source_end {
                    // The candidate takes over the source role; seeded
                    // points ran target→source.
                    waypoints.reverse();
                    (candidate, gesture.source)
                } else {
                    (gesture.source, candidate)
                }
            }
        };

        let connection = document.add_connection(&kind, source, target)?;
        // Allocated outside the history: undoing the gesture removes the
        // connection and its joints as one step.
        for (index, point) in waypoints.iter().enumerate() {
            document.add_joint_untracked(connection, index, &joint_kind, point.x, point.y);
        }
        hooks.connection_added(document, connection);
        tracing::debug!(connection, source, target, "drag: committed");
        Some(connection)
    }
}
