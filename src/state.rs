//! Resolved geometry cache.
//!
//! Stores, per node, the rendered rectangle and per-connector layout
//! produced by a relayout pass through the skin registry, so anchor lookups
//! during routing and hit testing are O(1) and never touch skin code. All
//! lookups return `Option`: a stale id yields `None` and the caller no-ops.

use std::collections::HashMap;

use crate::document::{Document, Flow};
use crate::geometry::{Point, Side};
use crate::skin::SkinRegistry;

/// Resolved layout of one connector, relative to its node's origin.
#[derive(Clone, Copy, Debug)]
pub struct ConnectorLayout {
    pub node: i32,
    pub side: Side,
    pub flow: Flow,
    pub rel_x: f32,
    pub rel_y: f32,
    pub width: f32,
    pub height: f32,
}

/// Resolved rectangle of one node.
#[derive(Clone, Copy, Debug)]
pub struct NodeLayout {
    pub id: i32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Spatial state of the editor: node rectangles and connector layouts.
#[derive(Default)]
pub struct GeometryCache {
    pub node_rects: HashMap<i32, NodeLayout>,
    pub connectors: HashMap<i32, ConnectorLayout>,
}

impl GeometryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-resolve one node and all of its connectors through the registry.
    pub fn sync_node(&mut self, document: &Document, skins: &SkinRegistry, node_id: i32) {
        let Some(node) = document.node(node_id) else {
            self.forget_node(node_id);
            return;
        };
        let skin = skins.resolve(&node.kind);
        let (width, height) = skin.size(node);
        self.node_rects.insert(
            node_id,
            NodeLayout { id: node_id, x: node.x, y: node.y, width, height },
        );

        // Index/count are per side, in connector-list order.
        let kinds: Vec<(i32, crate::document::ConnectorKind)> = node
            .connectors
            .iter()
            .filter_map(|id| document.connector(*id).map(|c| (*id, c.kind)))
            .collect();
        let mut side_totals: HashMap<Side, usize> = HashMap::new();
        for (_, kind) in &kinds {
            *side_totals.entry(kind.side).or_insert(0) += 1;
        }

        let mut side_seen: HashMap<Side, usize> = HashMap::new();
        for (connector_id, kind) in &kinds {
            let index = side_seen.entry(kind.side).or_insert(0);
            let count = side_totals[&kind.side];
            let (rel_x, rel_y) = skin.connector_offset(node, *kind, *index, count);
            let (width, height) = skin.connector_size(*kind);
            *index += 1;
            self.connectors.insert(
                *connector_id,
                ConnectorLayout {
                    node: node_id,
                    side: kind.side,
                    flow: kind.flow,
                    rel_x,
                    rel_y,
                    width,
                    height,
                },
            );
        }

        // Drop layouts of connectors the node no longer owns.
        let live: Vec<i32> = kinds.iter().map(|(id, _)| *id).collect();
        self.connectors
            .retain(|id, layout| layout.node != node_id || live.contains(id));
    }

    /// Drop a node's rectangle and every connector layout it owned.
    pub fn forget_node(&mut self, node_id: i32) {
        self.node_rects.remove(&node_id);
        self.connectors.retain(|_, layout| layout.node != node_id);
    }

    pub fn forget_connector(&mut self, connector_id: i32) {
        self.connectors.remove(&connector_id);
    }

    /// Resolve every node in the document. Used after load/replace.
    pub fn rebuild(&mut self, document: &Document, skins: &SkinRegistry) {
        self.node_rects.clear();
        self.connectors.clear();
        for id in document.node_order().to_vec() {
            self.sync_node(document, skins, id);
        }
    }

    /// Absolute anchor position of a connector: node origin plus the
    /// connector's layout offset plus half its own size.
    pub fn connector_anchor(&self, connector_id: i32) -> Option<Point> {
        let layout = self.connectors.get(&connector_id)?;
        let rect = self.node_rects.get(&layout.node)?;
        Some(Point::new(
            rect.x + layout.rel_x + layout.width / 2.0,
            rect.y + layout.rel_y + layout.height / 2.0,
        ))
    }

    /// Side of the node edge a connector sits on.
    pub fn connector_side(&self, connector_id: i32) -> Option<Side> {
        self.connectors.get(&connector_id).map(|layout| layout.side)
    }

    /// Absolute position of a point expressed in a connector's local
    /// coordinate space.
    pub fn cursor_position(&self, connector_id: i32, local_x: f32, local_y: f32) -> Option<Point> {
        let layout = self.connectors.get(&connector_id)?;
        let rect = self.node_rects.get(&layout.node)?;
        Some(Point::new(
            rect.x + layout.rel_x + local_x,
            rect.y + layout.rel_y + local_y,
        ))
    }

    pub fn node_rect(&self, node_id: i32) -> Option<NodeLayout> {
        self.node_rects.get(&node_id).copied()
    }
}
