//! Model diff reconciler.
//!
//! Compares the previous remembered document structure against the current
//! one and produces the minimal add/remove/update sets the view needs, so
//! visual elements survive unrelated edits. The snapshot is independent
//! storage (copies, not live references); after each diff it is overwritten
//! with the current structure.

use std::collections::HashMap;

use crate::document::Document;

/// Remembered structure of one node.
#[derive(Clone, Debug, PartialEq)]
struct NodeSnapshot {
    kind: String,
    connectors: Vec<i32>,
}

/// Minimal visual change set between two reconcile passes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentDiff {
    pub nodes_added: Vec<i32>,
    pub nodes_removed: Vec<i32>,
    /// Same node, same kind, changed connector list: re-layout the
    /// connectors without destroying the node's visual element.
    pub nodes_updated: Vec<i32>,
    /// Connectors lost from nodes that still exist. Connectors of removed
    /// nodes are torn down with their parent and not reported.
    pub connectors_removed: Vec<i32>,
    pub connections_added: Vec<i32>,
    pub connections_removed: Vec<i32>,
    /// `(connection, joint)` pairs for surviving connections only.
    pub joints_added: Vec<(i32, i32)>,
    pub joints_removed: Vec<(i32, i32)>,
}

impl DocumentDiff {
    pub fn is_empty(&self) -> bool {
        self.nodes_added.is_empty()
            && self.nodes_removed.is_empty()
            && self.nodes_updated.is_empty()
            && self.connectors_removed.is_empty()
            && self.connections_added.is_empty()
            && self.connections_removed.is_empty()
            && self.joints_added.is_empty()
            && self.joints_removed.is_empty()
    }
}

/// Snapshot-and-diff reconciler.
#[derive(Default)]
pub struct Reconciler {
    nodes: HashMap<i32, NodeSnapshot>,
    connections: HashMap<i32, Vec<i32>>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the snapshot; the next pass reports everything as added.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    /// Diff the document against the snapshot, then remember the current
    /// structure for the next pass.
    ///
    /// A node whose type tag changed needs a different skin: it appears in
    /// both `nodes_removed` and `nodes_added`, never in `nodes_updated`.
    pub fn reconcile(&mut self, document: &Document) -> DocumentDiff {
        let mut diff = DocumentDiff::default();

        let current_nodes: HashMap<i32, NodeSnapshot> = document
            .nodes()
            .map(|node| {
                (node.id, NodeSnapshot { kind: node.kind.clone(), connectors: node.connectors.clone() })
            })
            .collect();

        for (id, node) in &current_nodes {
            match self.nodes.get(id) {
                None => diff.nodes_added.push(*id),
                Some(previous) if previous.kind != node.kind => {
                    // Different skin: full teardown and rebuild.
                    diff.nodes_removed.push(*id);
                    diff.nodes_added.push(*id);
                }
                Some(previous) if previous.connectors != node.connectors => {
                    diff.nodes_updated.push(*id);
                    for connector in &previous.connectors {
                        if !node.connectors.contains(connector) {
                            diff.connectors_removed.push(*connector);
                        }
                    }
                }
                Some(_) => {}
            }
        }
        for id in self.nodes.keys() {
            if !current_nodes.contains_key(id) {
                diff.nodes_removed.push(*id);
            }
        }

        let current_connections: HashMap<i32, Vec<i32>> = document
            .connections()
            .map(|connection| (connection.id, connection.joints.clone()))
            .collect();

        for (id, joints) in &current_connections {
            match self.connections.get(id) {
                None => diff.connections_added.push(*id),
                Some(previous) => {
                    for joint in joints {
                        if !previous.contains(joint) {
                            diff.joints_added.push((*id, *joint));
                        }
                    }
                    for joint in previous {
                        if !joints.contains(joint) {
                            diff.joints_removed.push((*id, *joint));
                        }
                    }
                }
            }
        }
        for id in self.connections.keys() {
            if !current_connections.contains_key(id) {
                diff.connections_removed.push(*id);
            }
        }

        // Deterministic output regardless of map iteration order.
        diff.nodes_added.sort_unstable();
        diff.nodes_removed.sort_unstable();
        diff.nodes_updated.sort_unstable();
        diff.connectors_removed.sort_unstable();
        diff.connections_added.sort_unstable();
        diff.connections_removed.sort_unstable();
        diff.joints_added.sort_unstable();
        diff.joints_removed.sort_unstable();

        self.nodes = current_nodes;
        self.connections = current_connections;
        diff
    }
}
