//! Skin registries: node layout and connection styling by type tag.
//!
//! Skins are selected through a registry mapping a type tag to a factory
//! function, resolved at registration time, with a default fallback for
//! unknown tags. Node skins decide the rendered size of a node and where
//! its connectors sit; connection styles decide stroke color and width.

use std::collections::HashMap;

use slint::Color;

use crate::document::{ConnectorKind, Node};
use crate::geometry::Side;

/// Layout policy for one node type.
pub trait NodeSkin {
    /// Rendered size of the node. Defaults to the document size.
    fn size(&self, node: &Node) -> (f32, f32) {
        (node.width, node.height)
    }

    /// Offset of a connector's top-left corner within the node.
    ///
    /// # Arguments
    /// * `node` - The owning node
    /// * `kind` - The connector's side and flow
    /// * `index` - Position among the connectors sharing the same side
    /// * `count` - Number of connectors on that side
    fn connector_offset(&self, node: &Node, kind: ConnectorKind, index: usize, count: usize) -> (f32, f32);

    /// Rendered size of a connector of the given kind.
    fn connector_size(&self, _kind: ConnectorKind) -> (f32, f32) {
        (8.0, 8.0)
    }
}

/// Default skin: connectors distributed evenly along their edge, centered on
/// the node border.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNodeSkin;

impl NodeSkin for DefaultNodeSkin {
    fn connector_offset(&self, node: &Node, kind: ConnectorKind, index: usize, count: usize) -> (f32, f32) {
        let (width, height) = self.size(node);
        let (cw, ch) = self.connector_size(kind);
        let fraction = (index + 1) as f32 / (count + 1) as f32;
        match kind.side {
            Side::Left => (-cw / 2.0, height * fraction - ch / 2.0),
            Side::Right => (width - cw / 2.0, height * fraction - ch / 2.0),
            Side::Top => (width * fraction - cw / 2.0, -ch / 2.0),
            Side::Bottom => (width * fraction - cw / 2.0, height - ch / 2.0),
        }
    }
}

type SkinFactory = Box<dyn Fn() -> Box<dyn NodeSkin>>;

/// Maps node type tags to skin factories.
pub struct SkinRegistry {
    factories: HashMap<String, SkinFactory>,
    fallback: SkinFactory,
}

impl Default for SkinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SkinRegistry {
    /// Registry with [`DefaultNodeSkin`] as the fallback.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            fallback: Box::new(|| Box::new(DefaultNodeSkin)),
        }
    }

    /// Register a skin factory for a node type tag.
    pub fn register<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn() -> Box<dyn NodeSkin> + 'static,
    {
        self.factories.insert(kind.to_string(), Box::new(factory));
    }

    /// Replace the fallback factory used for unregistered tags.
    pub fn set_fallback<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn NodeSkin> + 'static,
    {
        self.fallback = Box::new(factory);
    }

    /// Resolve a skin for a type tag. Unregistered tags use the fallback.
    pub fn resolve(&self, kind: &str) -> Box<dyn NodeSkin> {
        match self.factories.get(kind) {
            Some(factory) => factory(),
            None => {
                tracing::debug!(kind, "no skin registered, using fallback");
                (self.fallback)()
            }
        }
    }
}

/// Stroke styling for one connection type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionStyle {
    pub color: Color,
    pub line_width: f32,
}

impl Default for ConnectionStyle {
    fn default() -> Self {
        Self {
            color: Color::from_rgb_u8(220, 220, 220),
            line_width: 2.0,
        }
    }
}

/// Maps connection type tags to stroke styles.
pub struct StyleRegistry {
    styles: HashMap<String, ConnectionStyle>,
    fallback: ConnectionStyle,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self {
            styles: HashMap::new(),
            fallback: ConnectionStyle::default(),
        }
    }

    pub fn register(&mut self, kind: &str, style: ConnectionStyle) {
        self.styles.insert(kind.to_string(), style);
    }

    pub fn set_fallback(&mut self, style: ConnectionStyle) {
        self.fallback = style;
    }

    pub fn resolve(&self, kind: &str) -> ConnectionStyle {
        self.styles.get(kind).copied().unwrap_or(self.fallback)
    }
}
