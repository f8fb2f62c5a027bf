//! Optional per-node-type interaction hooks.
//!
//! Node types that want to react to pointer input implement
//! [`InteractiveNode`] and register it once in [`NodeBehaviors`]. Every hook
//! has a no-op default, so a node type implements only what it needs and
//! the controller never has to check for individual callbacks.

use crate::geometry::Vector2;
use crate::types::Node;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Pointer hooks for one node type. Positions are node-local.
pub trait InteractiveNode {
    /// Press on the node body. Returning `true` consumes it and blocks dragging.
    fn on_mouse_down(&self, _node: &mut Node, _local: Vector2) -> bool {
        false
    }

    /// Pointer moved over the node.
    fn on_mouse_move(&self, _node: &mut Node, _local: Vector2) {}

    /// Release over the node.
    fn on_mouse_up(&self, _node: &mut Node, _local: Vector2) {}

    /// Pointer entered the node.
    fn on_mouse_enter(&self, _node: &mut Node) {}

    /// Pointer left the node.
    fn on_mouse_leave(&self, _node: &mut Node) {}

    /// Double click on an already selected node.
    fn on_dbl_click(&self, _node: &mut Node, _local: Vector2) {}

    /// Press on a slot connector.
    fn on_slot_click(&self, _node: &mut Node, _slot: usize, _is_input: bool, _double: bool) {}

    /// The node was resized by its handle.
    fn on_resize(&self, _node: &mut Node) {}

    /// The node was collapsed or expanded.
    fn on_collapse(&self, _node: &mut Node, _collapsed: bool) {}

    /// The node joined the selection.
    fn on_selected(&self, _node: &mut Node) {}

    /// The node left the selection.
    fn on_deselected(&self, _node: &mut Node) {}
}

/// Registry of interaction hooks keyed by node type.
#[derive(Default, Clone)]
pub struct NodeBehaviors {
    by_type: HashMap<String, Rc<dyn InteractiveNode>>,
}

impl fmt::Debug for NodeBehaviors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBehaviors")
            .field("types", &self.by_type.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NodeBehaviors {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers hooks for a node type, replacing any previous ones.
    pub fn register(
        &mut self,
        node_type: impl Into<String>,
        behavior: impl InteractiveNode + 'static,
    ) {
        self.by_type.insert(node_type.into(), Rc::new(behavior));
    }

    /// Hooks for a node type, if registered.
    pub fn get(&self, node_type: &str) -> Option<Rc<dyn InteractiveNode>> {
        self.by_type.get(node_type).cloned()
    }

    /// Whether a node type has hooks.
    pub fn contains(&self, node_type: &str) -> bool {
        self.by_type.contains_key(node_type)
    }
}
