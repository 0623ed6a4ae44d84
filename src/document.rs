//! The graph document: nodes, connectors, connections, and joints.
//!
//! All mutation goes through command-style operations that are atomic from
//! the reconciler's point of view. Every operation appends typed
//! [`ChangeRecord`]s to a FIFO queue drained before each render pass, and
//! records its inverse in an [`EditHistory`] owned by the document, so
//! undo/redo needs no ambient editing-domain state.

use std::collections::HashMap;
use std::fmt;

use crate::geometry::Side;

/// Default type tag for joints materialized outside a drag gesture.
pub const DEFAULT_JOINT_KIND: &str = "standard";

/// Data-flow direction of a connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flow {
    Input,
    Output,
}

/// Parsed connector type: the node edge it sits on plus its direction.
///
/// The wire format is `"<side>-<flow>"`, e.g. `"left-input"` or
/// `"right-output"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectorKind {
    pub side: Side,
    pub flow: Flow,
}

/// A connector type string that does not match `"<side>-<flow>"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized connector type {0:?}")]
pub struct UnknownConnectorKind(pub String);

impl ConnectorKind {
    pub const fn new(side: Side, flow: Flow) -> Self {
        Self { side, flow }
    }

    pub fn parse(kind: &str) -> Result<Self, UnknownConnectorKind> {
        let Some((side, flow)) = kind.split_once('-') else {
            return Err(UnknownConnectorKind(kind.to_string()));
        };
        let side = match side {
            "top" => Side::Top,
            "right" => Side::Right,
            "bottom" => Side::Bottom,
            "left" => Side::Left,
            _ => return Err(UnknownConnectorKind(kind.to_string())),
        };
        let flow = match flow {
            "input" => Flow::Input,
            "output" => Flow::Output,
            _ => return Err(UnknownConnectorKind(kind.to_string())),
        };
        Ok(Self { side, flow })
    }

    /// Parse a connector type, falling back to left/input on unrecognized
    /// input. The error is logged; rendering continues.
    pub fn parse_lossy(kind: &str) -> Self {
        Self::parse(kind).unwrap_or_else(|err| {
            tracing::error!("{err}, treating as left-input");
            Self::new(Side::Left, Flow::Input)
        })
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        };
        let flow = match self.flow {
            Flow::Input => "input",
            Flow::Output => "output",
        };
        write!(f, "{side}-{flow}")
    }
}

/// A node with a position, a size, and an ordered list of owned connectors.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: i32,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub connectors: Vec<i32>,
}

/// A typed attachment point owned by exactly one node.
#[derive(Clone, Debug)]
pub struct Connector {
    pub id: i32,
    pub node: i32,
    pub kind: ConnectorKind,
    /// When set, dragging from this connector detaches an existing
    /// connection instead of starting a new one.
    pub detach_on_drag: bool,
    pub connections: Vec<i32>,
}

/// A connection between a source and a target connector, owning its joints.
#[derive(Clone, Debug)]
pub struct Connection {
    pub id: i32,
    pub kind: String,
    pub source: i32,
    pub target: i32,
    pub joints: Vec<i32>,
}

/// A user-draggable waypoint owned by exactly one connection.
#[derive(Clone, Debug)]
pub struct Joint {
    pub id: i32,
    pub connection: i32,
    pub kind: String,
    pub x: f32,
    pub y: f32,
}

/// One structural change, queued at mutation time and drained in FIFO order
/// before each render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeRecord {
    NodeAdded(i32),
    NodeRemoved(i32),
    NodeMoved(i32),
    NodeResized(i32),
    NodeKindChanged(i32),
    ConnectorAdded(i32),
    ConnectorRemoved(i32),
    ConnectionAdded(i32),
    ConnectionRemoved(i32),
    JointAdded(i32),
    JointRemoved(i32),
    JointMoved(i32),
}

/// A structural invariant violation found by [`Document::check_integrity`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityError {
    #[error("connection {connection} references missing connector {connector}")]
    MissingEndpoint { connection: i32, connector: i32 },
    #[error("connection {connection} is not registered on connector {connector}")]
    MissingBackReference { connection: i32, connector: i32 },
    #[error("connector {connector} lists connection {connection} which does not reference it")]
    DanglingConnectionRef { connector: i32, connection: i32 },
    #[error("node {node} lists missing connector {connector}")]
    DanglingConnectorRef { node: i32, connector: i32 },
    #[error("node {node} has negative size {width}x{height}")]
    NegativeSize { node: i32, width: f32, height: f32 },
    #[error("connector {connector} references missing node {node}")]
    OrphanConnector { connector: i32, node: i32 },
    #[error("joint {joint} references missing connection {connection}")]
    OrphanJoint { joint: i32, connection: i32 },
}

/// A reversible primitive mutation. Public operations are built from these;
/// applying one returns its inverse, which is what the history stores.
#[derive(Clone, Debug)]
enum Command {
    InsertNode { node: Node, order_index: usize },
    DeleteNode { id: i32 },
    InsertConnector { connector: Connector, node_index: usize },
    DeleteConnector { id: i32 },
    InsertConnection { connection: Connection, order_index: usize, joints: Vec<Joint> },
    DeleteConnection { id: i32 },
    InsertJoint { joint: Joint, index: usize },
    DeleteJoint { id: i32 },
    SetNodePosition { id: i32, x: f32, y: f32 },
    SetNodeSize { id: i32, width: f32, height: f32 },
    SetNodeKind { id: i32, kind: String },
    SetJointPosition { id: i32, x: f32, y: f32 },
}

/// Undo/redo stacks of inverse-command groups, one group per public
/// operation (cascades collapse into a single entry).
#[derive(Default)]
struct EditHistory {
    undo: Vec<Vec<Command>>,
    redo: Vec<Vec<Command>>,
}

impl EditHistory {
    fn record(&mut self, group: Vec<Command>) {
        if !group.is_empty() {
            self.undo.push(group);
            self.redo.clear();
        }
    }
}

/// The mutable graph document.
#[derive(Default)]
pub struct Document {
    nodes: HashMap<i32, Node>,
    connectors: HashMap<i32, Connector>,
    connections: HashMap<i32, Connection>,
    joints: HashMap<i32, Joint>,
    node_order: Vec<i32>,
    /// Paint order of connections; later entries draw on top.
    connection_order: Vec<i32>,
    next_id: i32,
    changes: Vec<ChangeRecord>,
    history: EditHistory,
}

impl Document {
    pub fn new() -> Self {
        Self { next_id: 1, ..Self::default() }
    }

    fn alloc_id(&mut self) -> i32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    // === Accessors ===

    pub fn node(&self, id: i32) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn connector(&self, id: i32) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    pub fn connection(&self, id: i32) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn joint(&self, id: i32) -> Option<&Joint> {
        self.joints.get(&id)
    }

    /// Node ids in insertion order.
    pub fn node_order(&self) -> &[i32] {
        &self.node_order
    }

    /// Connection ids in paint order (later entries draw on top).
    pub fn connection_order(&self) -> &[i32] {
        &self.connection_order
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connection_order.iter().filter_map(|id| self.connections.get(id))
    }

    /// Joint positions of a connection in path order.
    pub fn joint_positions(&self, connection: i32) -> Vec<(f32, f32)> {
        let Some(connection) = self.connections.get(&connection) else {
            return Vec::new();
        };
        connection
            .joints
            .iter()
            .filter_map(|id| self.joints.get(id).map(|j| (j.x, j.y)))
            .collect()
    }

    // === Change queue ===

    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Drain queued change records in FIFO order.
    pub fn drain_changes(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.changes)
    }

    // === Operations ===

    pub fn add_node(&mut self, kind: &str, x: f32, y: f32, width: f32, height: f32) -> i32 {
        let id = self.alloc_id();
        let node = Node {
            id,
            kind: kind.to_string(),
            x,
            y,
            width,
            height,
            connectors: Vec::new(),
        };
        let order_index = self.node_order.len();
        let inverse = self.apply(Command::InsertNode { node, order_index });
        self.history.record(vec![inverse]);
        id
    }

    /// Remove a node together with its connectors, their connections, and
    /// those connections' joints.
    pub fn remove_node(&mut self, id: i32) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        let connector_ids = node.connectors.clone();
        let mut inverses = Vec::new();
        for connector in connector_ids {
            self.cascade_remove_connector(connector, &mut inverses);
        }
        inverses.push(self.apply(Command::DeleteNode { id }));
        self.history.record(inverses);
        true
    }

    pub fn set_node_position(&mut self, id: i32, x: f32, y: f32) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        let inverse = self.apply(Command::SetNodePosition { id, x, y });
        self.history.record(vec![inverse]);
        true
    }

    pub fn set_node_size(&mut self, id: i32, width: f32, height: f32) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        let inverse = self.apply(Command::SetNodeSize { id, width, height });
        self.history.record(vec![inverse]);
        true
    }

    /// Change a node's type tag. The view treats this as a full
    /// remove-and-re-add, since a different skin applies.
    pub fn set_node_kind(&mut self, id: i32, kind: &str) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        let inverse = self.apply(Command::SetNodeKind { id, kind: kind.to_string() });
        self.history.record(vec![inverse]);
        true
    }

    /// Add a connector to a node. Unrecognized type strings fall back to
    /// left/input (logged).
    pub fn add_connector(&mut self, node: i32, kind: &str, detach_on_drag: bool) -> Option<i32> {
        let node_index = self.nodes.get(&node)?.connectors.len();
        let id = self.alloc_id();
        let connector = Connector {
            id,
            node,
            kind: ConnectorKind::parse_lossy(kind),
            detach_on_drag,
            connections: Vec::new(),
        };
        let inverse = self.apply(Command::InsertConnector { connector, node_index });
        self.history.record(vec![inverse]);
        Some(id)
    }

    /// Remove a connector and every connection attached to it.
    pub fn remove_connector(&mut self, id: i32) -> bool {
        if !self.connectors.contains_key(&id) {
            return false;
        }
        let mut inverses = Vec::new();
        self.cascade_remove_connector(id, &mut inverses);
        self.history.record(inverses);
        true
    }

    /// Create a connection between two existing connectors and register it
    /// on both of them.
    pub fn add_connection(&mut self, kind: &str, source: i32, target: i32) -> Option<i32> {
        if !self.connectors.contains_key(&source) || !self.connectors.contains_key(&target) {
            tracing::warn!(source, target, "refusing connection with missing endpoint");
            return None;
        }
        let id = self.alloc_id();
        let connection = Connection {
            id,
            kind: kind.to_string(),
            source,
            target,
            joints: Vec::new(),
        };
        let order_index = self.connection_order.len();
        let inverse = self.apply(Command::InsertConnection {
            connection,
            order_index,
            joints: Vec::new(),
        });
        self.history.record(vec![inverse]);
        Some(id)
    }

    /// Remove a connection and its joints, unregistering it from both
    /// connectors.
    pub fn remove_connection(&mut self, id: i32) -> bool {
        if !self.connections.contains_key(&id) {
            return false;
        }
        let mut inverses = Vec::new();
        self.cascade_remove_connection(id, &mut inverses);
        self.history.record(inverses);
        true
    }

    /// Insert a joint into a connection's joint list at `index` (clamped).
    pub fn add_joint(&mut self, connection: i32, index: usize, kind: &str, x: f32, y: f32) -> Option<i32> {
        let joint = self.build_joint(connection, kind, x, y)?;
        let index = index.min(self.connections[&connection].joints.len());
        let id = joint.id;
        let inverse = self.apply(Command::InsertJoint { joint, index });
        self.history.record(vec![inverse]);
        Some(id)
    }

    /// Like [`add_joint`](Self::add_joint), but not recorded in the edit
    /// history. Used for joints derived by a relayout rather than placed by
    /// the user.
    pub(crate) fn add_joint_untracked(
        &mut self,
        connection: i32,
        index: usize,
        kind: &str,
        x: f32,
        y: f32,
    ) -> Option<i32> {
        let joint = self.build_joint(connection, kind, x, y)?;
        let index = index.min(self.connections[&connection].joints.len());
        let id = joint.id;
        self.apply(Command::InsertJoint { joint, index });
        Some(id)
    }

    fn build_joint(&mut self, connection: i32, kind: &str, x: f32, y: f32) -> Option<Joint> {
        if !self.connections.contains_key(&connection) {
            return None;
        }
        let id = self.alloc_id();
        Some(Joint { id, connection, kind: kind.to_string(), x, y })
    }

    pub fn remove_joint(&mut self, id: i32) -> bool {
        if !self.joints.contains_key(&id) {
            return false;
        }
        let inverse = self.apply(Command::DeleteJoint { id });
        self.history.record(vec![inverse]);
        true
    }

    pub fn set_joint_position(&mut self, id: i32, x: f32, y: f32) -> bool {
        if !self.joints.contains_key(&id) {
            return false;
        }
        let inverse = self.apply(Command::SetJointPosition { id, x, y });
        self.history.record(vec![inverse]);
        true
    }

    /// Constraint-propagation variant of
    /// [`set_joint_position`](Self::set_joint_position): emits a change
    /// record but no history entry.
    pub(crate) fn set_joint_position_untracked(&mut self, id: i32, x: f32, y: f32) -> bool {
        if !self.joints.contains_key(&id) {
            return false;
        }
        self.apply(Command::SetJointPosition { id, x, y });
        true
    }

    // === Undo / redo ===

    pub fn can_undo(&self) -> bool {
        !self.history.undo.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(group) = self.history.undo.pop() else {
            return false;
        };
        let redo: Vec<Command> = group.into_iter().rev().map(|cmd| self.apply(cmd)).collect();
        self.history.redo.push(redo);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(group) = self.history.redo.pop() else {
            return false;
        };
        let undo: Vec<Command> = group.into_iter().rev().map(|cmd| self.apply(cmd)).collect();
        self.history.undo.push(undo);
        true
    }

    // === Cascades ===

    fn cascade_remove_connector(&mut self, id: i32, inverses: &mut Vec<Command>) {
        let Some(connector) = self.connectors.get(&id) else {
            return;
        };
        for connection in connector.connections.clone() {
            self.cascade_remove_connection(connection, inverses);
        }
        inverses.push(self.apply(Command::DeleteConnector { id }));
    }

    fn cascade_remove_connection(&mut self, id: i32, inverses: &mut Vec<Command>) {
        if self.connections.contains_key(&id) {
            // DeleteConnection captures and removes the joints too.
            inverses.push(self.apply(Command::DeleteConnection { id }));
        }
    }

    // === Command application ===

    /// Apply a primitive mutation, queue its change record, and return its
    /// inverse.
    fn apply(&mut self, command: Command) -> Command {
        match command {
            Command::InsertNode { node, order_index } => {
                let id = node.id;
                self.next_id = self.next_id.max(id + 1);
                self.nodes.insert(id, node);
                let index = order_index.min(self.node_order.len());
                self.node_order.insert(index, id);
                self.changes.push(ChangeRecord::NodeAdded(id));
                Command::DeleteNode { id }
            }
            Command::DeleteNode { id } => {
                let node = self.nodes.remove(&id).expect("delete of missing node");
                let order_index = self.node_order.iter().position(|n| *n == id).unwrap_or(0);
                self.node_order.retain(|n| *n != id);
                self.changes.push(ChangeRecord::NodeRemoved(id));
                Command::InsertNode { node, order_index }
            }
            Command::InsertConnector { connector, node_index } => {
                let id = connector.id;
                let node = connector.node;
                self.next_id = self.next_id.max(id + 1);
                self.connectors.insert(id, connector);
                if let Some(owner) = self.nodes.get_mut(&node) {
                    if !owner.connectors.contains(&id) {
                        let index = node_index.min(owner.connectors.len());
                        owner.connectors.insert(index, id);
                    }
                }
                self.changes.push(ChangeRecord::ConnectorAdded(id));
                Command::DeleteConnector { id }
            }
            Command::DeleteConnector { id } => {
                let connector = self.connectors.remove(&id).expect("delete of missing connector");
                let mut node_index = 0;
                if let Some(owner) = self.nodes.get_mut(&connector.node) {
                    node_index = owner.connectors.iter().position(|c| *c == id).unwrap_or(0);
                    owner.connectors.retain(|c| *c != id);
                }
                self.changes.push(ChangeRecord::ConnectorRemoved(id));
                Command::InsertConnector { connector, node_index }
            }
            Command::InsertConnection { connection, order_index, joints } => {
                let id = connection.id;
                let endpoints = [connection.source, connection.target];
                self.next_id = self.next_id.max(id + 1);
                self.connections.insert(id, connection);
                for endpoint in endpoints {
                    if let Some(connector) = self.connectors.get_mut(&endpoint) {
                        if !connector.connections.contains(&id) {
                            connector.connections.push(id);
                        }
                    }
                }
                let index = order_index.min(self.connection_order.len());
                self.connection_order.insert(index, id);
                self.changes.push(ChangeRecord::ConnectionAdded(id));
                for joint in joints {
                    let joint_id = joint.id;
                    self.next_id = self.next_id.max(joint_id + 1);
                    self.joints.insert(joint_id, joint);
                    self.changes.push(ChangeRecord::JointAdded(joint_id));
                }
                Command::DeleteConnection { id }
            }
            Command::DeleteConnection { id } => {
                let connection = self.connections.remove(&id).expect("delete of missing connection");
                // The joints belong to the connection; capture and remove
                // them with it so the inverse restores both.
                let mut joints = Vec::with_capacity(connection.joints.len());
                for joint_id in &connection.joints {
                    if let Some(joint) = self.joints.remove(joint_id) {
                        joints.push(joint);
                        self.changes.push(ChangeRecord::JointRemoved(*joint_id));
                    }
                }
                for endpoint in [connection.source, connection.target] {
                    if let Some(connector) = self.connectors.get_mut(&endpoint) {
                        connector.connections.retain(|c| *c != id);
                    }
                }
                let order_index = self.connection_order.iter().position(|c| *c == id).unwrap_or(0);
                self.connection_order.retain(|c| *c != id);
                self.changes.push(ChangeRecord::ConnectionRemoved(id));
                Command::InsertConnection { connection, order_index, joints }
            }
            Command::InsertJoint { joint, index } => {
                let id = joint.id;
                let connection = joint.connection;
                self.next_id = self.next_id.max(id + 1);
                self.joints.insert(id, joint);
                if let Some(owner) = self.connections.get_mut(&connection) {
                    if !owner.joints.contains(&id) {
                        let index = index.min(owner.joints.len());
                        owner.joints.insert(index, id);
                    }
                }
                self.changes.push(ChangeRecord::JointAdded(id));
                Command::DeleteJoint { id }
            }
            Command::DeleteJoint { id } => {
                let joint = self.joints.remove(&id).expect("delete of missing joint");
                let mut index = 0;
                if let Some(owner) = self.connections.get_mut(&joint.connection) {
                    index = owner.joints.iter().position(|j| *j == id).unwrap_or(0);
                    owner.joints.retain(|j| *j != id);
                }
                self.changes.push(ChangeRecord::JointRemoved(id));
                Command::InsertJoint { joint, index }
            }
            Command::SetNodePosition { id, x, y } => {
                let node = self.nodes.get_mut(&id).expect("move of missing node");
                let inverse = Command::SetNodePosition { id, x: node.x, y: node.y };
                node.x = x;
                node.y = y;
                self.changes.push(ChangeRecord::NodeMoved(id));
                inverse
            }
            Command::SetNodeSize { id, width, height } => {
                let node = self.nodes.get_mut(&id).expect("resize of missing node");
                let inverse = Command::SetNodeSize { id, width: node.width, height: node.height };
                node.width = width;
                node.height = height;
                self.changes.push(ChangeRecord::NodeResized(id));
                inverse
            }
            Command::SetNodeKind { id, kind } => {
                let node = self.nodes.get_mut(&id).expect("retag of missing node");
                let inverse = Command::SetNodeKind { id, kind: std::mem::replace(&mut node.kind, kind) };
                self.changes.push(ChangeRecord::NodeKindChanged(id));
                inverse
            }
            Command::SetJointPosition { id, x, y } => {
                let joint = self.joints.get_mut(&id).expect("move of missing joint");
                let inverse = Command::SetJointPosition { id, x: joint.x, y: joint.y };
                joint.x = x;
                joint.y = y;
                self.changes.push(ChangeRecord::JointMoved(id));
                inverse
            }
        }
    }

    // === Integrity ===

    /// Structural validation pass, run after document load/replace.
    ///
    /// Violations are logged and returned; the model is left untouched. A
    /// visibly wrong diagram beats a hard failure mid-edit.
    pub fn check_integrity(&self) -> Vec<IntegrityError> {
        let mut errors = Vec::new();

        for node in self.nodes.values() {
            if node.width < 0.0 || node.height < 0.0 {
                errors.push(IntegrityError::NegativeSize {
                    node: node.id,
                    width: node.width,
                    height: node.height,
                });
            }
            for connector in &node.connectors {
                if !self.connectors.contains_key(connector) {
                    errors.push(IntegrityError::DanglingConnectorRef {
                        node: node.id,
                        connector: *connector,
                    });
                }
            }
        }

        for connector in self.connectors.values() {
            if !self.nodes.contains_key(&connector.node) {
                errors.push(IntegrityError::OrphanConnector {
                    connector: connector.id,
                    node: connector.node,
                });
            }
            for connection in &connector.connections {
                let references_back = self
                    .connections
                    .get(connection)
                    .is_some_and(|c| c.source == connector.id || c.target == connector.id);
                if !references_back {
                    errors.push(IntegrityError::DanglingConnectionRef {
                        connector: connector.id,
                        connection: *connection,
                    });
                }
            }
        }

        for connection in self.connections.values() {
            for endpoint in [connection.source, connection.target] {
                match self.connectors.get(&endpoint) {
                    None => errors.push(IntegrityError::MissingEndpoint {
                        connection: connection.id,
                        connector: endpoint,
                    }),
                    Some(connector) if !connector.connections.contains(&connection.id) => {
                        errors.push(IntegrityError::MissingBackReference {
                            connection: connection.id,
                            connector: endpoint,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        for joint in self.joints.values() {
            if !self.connections.contains_key(&joint.connection) {
                errors.push(IntegrityError::OrphanJoint {
                    joint: joint.id,
                    connection: joint.connection,
                });
            }
        }

        for error in &errors {
            tracing::error!("integrity violation: {error}");
        }
        errors
    }

    /// Test/import hook: break a back-reference or otherwise poke internals.
    #[cfg(test)]
    pub(crate) fn connector_mut(&mut self, id: i32) -> Option<&mut Connector> {
        self.connectors.get_mut(&id)
    }
}
