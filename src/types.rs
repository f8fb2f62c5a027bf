//! Core data types for the node graph.
//!
//! Nodes, slots, links and groups are plain serde structs. Slots refer to links
//! by id and links refer to nodes by id; the [`crate::graph::Graph`] owns the
//! canonical tables so there are no ownership cycles.

use crate::constants::*;
use crate::geometry::{vec2, Rect, Vector2};
use crate::widgets::Widget;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for graph nodes.
pub type NodeId = Uuid;

/// Unique identifier for links.
pub type LinkId = Uuid;

/// Unique identifier for groups.
pub type GroupId = Uuid;

/// Wildcard slot type that accepts any other type.
pub const ANY_TYPE: &str = "*";

/// Per-node display flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFlags {
    /// Only the title bar is shown
    pub collapsed: bool,
    /// The node cannot be dragged or resized
    pub pinned: bool,
}

/// Execution mode of a node. The editor only uses it to gate widget input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeMode {
    /// Runs every step
    #[default]
    Always,
    /// Runs when an event arrives
    OnEvent,
    /// Muted
    Never,
    /// Runs when triggered
    OnTrigger,
    /// Passes inputs through unchanged
    Bypass,
    /// Runs only when a downstream node asks for its output
    OnRequest,
}

impl NodeMode {
    /// Whether widgets on a node in this mode accept pointer input.
    pub fn accepts_widget_input(self) -> bool {
        !matches!(self, NodeMode::Never | NodeMode::Bypass)
    }

    /// Whether the node's DOM elements are shown faded and inert.
    pub fn dims_dom_widgets(self) -> bool {
        matches!(self, NodeMode::Never | NodeMode::OnRequest)
    }
}

/// An input connection point. Holds at most one link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSlot {
    /// Display label
    pub name: String,
    /// Type name; `"*"` or empty accepts anything
    pub slot_type: String,
    /// Link currently feeding this input
    pub link: Option<LinkId>,
}

impl InputSlot {
    /// Creates an unconnected input.
    pub fn new(name: impl Into<String>, slot_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            link: None,
        }
    }
}

/// An output connection point. May fan out to many links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    /// Display label
    pub name: String,
    /// Type name; `"*"` or empty feeds anything
    pub slot_type: String,
    /// Links leaving this output
    pub links: Vec<LinkId>,
}

impl OutputSlot {
    /// Creates an unconnected output.
    pub fn new(name: impl Into<String>, slot_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot_type: slot_type.into(),
            links: Vec::new(),
        }
    }
}

/// A positioned box with typed slots and widgets.
///
/// `pos` is the top-left corner of the body; the title bar is drawn above it,
/// from `pos.y - NODE_TITLE_HEIGHT` to `pos.y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Text shown in the title bar
    pub title: String,
    /// Type tag used to look up behaviors and templates
    pub node_type: String,
    /// Graph-space top-left of the body
    pub pos: Vector2,
    /// Body size (title bar excluded)
    pub size: Vector2,
    /// Display flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Execution mode
    #[serde(default)]
    pub mode: NodeMode,
    /// Ordered inputs
    pub inputs: Vec<InputSlot>,
    /// Ordered outputs
    pub outputs: Vec<OutputSlot>,
    /// Ordered widget stack
    #[serde(default)]
    pub widgets: Vec<Widget>,
    /// Whether the bottom-right handle may resize the node
    #[serde(default = "default_true")]
    pub resizable: bool,
    /// Whether the title bar shows an "open subgraph" button
    #[serde(default)]
    pub has_subgraph: bool,
    /// Free-form per-node properties
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl Node {
    /// Creates a node with default size and no slots.
    ///
    /// # Arguments
    ///
    /// * `title` - Title bar text
    /// * `node_type` - Type tag
    /// * `pos` - Graph-space top-left of the body
    pub fn new(title: impl Into<String>, node_type: impl Into<String>, pos: Vector2) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            node_type: node_type.into(),
            pos,
            size: vec2(NODE_DEFAULT_SIZE.0, NODE_DEFAULT_SIZE.1),
            flags: NodeFlags::default(),
            mode: NodeMode::default(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            widgets: Vec::new(),
            resizable: true,
            has_subgraph: false,
            properties: serde_json::Map::new(),
        }
    }

    /// Adds an input and returns `self` for chaining.
    pub fn with_input(mut self, name: &str, slot_type: &str) -> Self {
        self.inputs.push(InputSlot::new(name, slot_type));
        self
    }

    /// Adds an output and returns `self` for chaining.
    pub fn with_output(mut self, name: &str, slot_type: &str) -> Self {
        self.outputs.push(OutputSlot::new(name, slot_type));
        self
    }

    /// Adds a widget and returns `self` for chaining.
    pub fn with_widget(mut self, widget: impl Into<Widget>) -> Self {
        self.widgets.push(widget.into());
        self
    }

    /// Width actually drawn, which differs from `size.x` when collapsed.
    pub fn visible_width(&self) -> f64 {
        if self.flags.collapsed {
            NODE_COLLAPSED_WIDTH
        } else {
            self.size.x
        }
    }

    /// Visual bounds including the title bar.
    pub fn bounding(&self) -> Rect {
        if self.flags.collapsed {
            Rect::new(
                self.pos.x,
                self.pos.y - NODE_TITLE_HEIGHT,
                NODE_COLLAPSED_WIDTH,
                NODE_TITLE_HEIGHT,
            )
        } else {
            Rect::new(
                self.pos.x,
                self.pos.y - NODE_TITLE_HEIGHT,
                self.size.x,
                self.size.y + NODE_TITLE_HEIGHT,
            )
        }
    }

    /// Whether a graph point falls inside the node's pick box grown by `margin`.
    ///
    /// Expanded nodes get 4 extra units on each side so slot dots on the
    /// border remain pickable.
    pub fn is_point_inside(&self, p: Vector2, margin: f64) -> bool {
        let area = if self.flags.collapsed {
            self.bounding().inflate(margin)
        } else {
            let b = self.bounding();
            Rect::new(b.x - 4.0, b.y, b.width + 8.0, b.height).inflate(margin)
        };
        area.contains(p)
    }

    /// Rectangle of the title bar.
    pub fn title_rect(&self) -> Rect {
        Rect::new(
            self.pos.x,
            self.pos.y - NODE_TITLE_HEIGHT,
            self.visible_width(),
            NODE_TITLE_HEIGHT,
        )
    }

    /// Graph-space anchor of an input or output slot.
    pub fn connection_pos(&self, is_input: bool, slot: usize) -> Vector2 {
        if self.flags.collapsed {
            let y = self.pos.y - NODE_TITLE_HEIGHT * 0.5;
            return if is_input {
                vec2(self.pos.x, y)
            } else {
                vec2(self.pos.x + NODE_COLLAPSED_WIDTH, y)
            };
        }
        let offset = NODE_SLOT_HEIGHT * 0.5;
        let y = self.pos.y + (slot as f64 + 0.7) * NODE_SLOT_HEIGHT;
        if is_input {
            vec2(self.pos.x + offset, y)
        } else {
            vec2(self.pos.x + self.size.x + 1.0 - offset, y)
        }
    }

    /// Type of an input or output slot, if it exists.
    pub fn slot_type(&self, is_input: bool, slot: usize) -> Option<&str> {
        if is_input {
            self.inputs.get(slot).map(|s| s.slot_type.as_str())
        } else {
            self.outputs.get(slot).map(|s| s.slot_type.as_str())
        }
    }

    /// Node-local y where the widget stack begins (below the slot rows).
    pub fn widgets_start_y(&self) -> f64 {
        let rows = self.inputs.len().max(self.outputs.len());
        if rows == 0 {
            WIDGET_SPACING
        } else {
            rows as f64 * NODE_SLOT_HEIGHT + WIDGET_SPACING
        }
    }

    /// Smallest body size that still fits every slot row and widget.
    pub fn compute_min_size(&self) -> Vector2 {
        let rows = self.inputs.len().max(self.outputs.len()).max(1);
        let mut height = rows as f64 * NODE_SLOT_HEIGHT;
        if !self.widgets.is_empty() {
            height = self.widgets_start_y();
            for widget in &self.widgets {
                height += widget.min_row_height();
            }
            height += 8.0;
        }
        let title_width = self.title.chars().count() as f64 * 8.0 + NODE_TITLE_HEIGHT + 10.0;
        vec2(title_width.max(NODE_MIN_WIDTH), height)
    }

    /// Records where each widget row was last drawn.
    ///
    /// Rows already placed by the DOM layout keep their `y`; the rest stack
    /// below the slot area. Layout only runs once the first row is recorded.
    pub fn record_widget_rows(&mut self) {
        let mut pos_y = self.widgets_start_y();
        for widget in &mut self.widgets {
            let y = widget.y().unwrap_or(pos_y);
            widget.set_last_y(y);
            pos_y = y + widget.row_advance();
        }
    }

    /// Number of links attached to this node.
    pub fn link_count(&self) -> usize {
        self.inputs.iter().filter(|s| s.link.is_some()).count()
            + self.outputs.iter().map(|s| s.links.len()).sum::<usize>()
    }
}

/// A directed typed connection from an output slot to an input slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique identifier for this link
    pub id: LinkId,
    /// Node owning the output
    pub origin_id: NodeId,
    /// Output index on the origin node
    pub origin_slot: usize,
    /// Node owning the input
    pub target_id: NodeId,
    /// Input index on the target node
    pub target_slot: usize,
    /// Type carried by the link (the origin output's type)
    pub link_type: String,
}

/// A labeled rectangle that visually clusters nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier for this group
    pub id: GroupId,
    /// Label drawn in the header
    pub title: String,
    /// Graph-space top-left
    pub pos: Vector2,
    /// Extent
    pub size: Vector2,
    /// Header font size; the draggable header is 1.4x this tall
    pub font_size: f64,
    /// Fill color (RGB)
    pub color: [u8; 3],
}

impl Group {
    /// Creates a group covering the given rectangle.
    pub fn new(title: impl Into<String>, rect: Rect) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            pos: rect.min(),
            size: rect.size(),
            font_size: GROUP_FONT_SIZE,
            color: [51, 85, 136],
        }
    }

    /// Bounds of the group.
    pub fn bounding(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    /// Draggable header band along the top edge.
    pub fn header_rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size.x, self.font_size * 1.4)
    }

    /// Whether a graph point lies inside the group grown by `margin`.
    pub fn is_point_inside(&self, p: Vector2, margin: f64) -> bool {
        self.bounding().inflate(margin).contains(p)
    }

    /// Resizes the group, never below [`GROUP_MIN_SIZE`].
    pub fn resize_to(&mut self, size: Vector2) {
        self.size = size.max(vec2(GROUP_MIN_SIZE.0, GROUP_MIN_SIZE.1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> Node {
        let mut node = Node::new("Add", "math/add", vec2(100.0, 100.0))
            .with_input("a", "number")
            .with_input("b", "number")
            .with_output("sum", "number");
        node.size = vec2(180.0, 80.0);
        node
    }

    #[test]
    fn node_new_has_unique_id_and_defaults() {
        let a = Node::new("A", "t", Vector2::ZERO);
        let b = Node::new("A", "t", Vector2::ZERO);
        assert_ne!(a.id, b.id);
        assert!(a.resizable);
        assert_eq!(a.mode, NodeMode::Always);
        assert!(!a.flags.collapsed);
    }

    #[test]
    fn bounding_includes_title_bar() {
        let node = sample_node();
        assert_eq!(node.bounding(), Rect::new(100.0, 70.0, 180.0, 110.0));
    }

    #[test]
    fn collapsed_bounding_is_title_only() {
        let mut node = sample_node();
        node.flags.collapsed = true;
        assert_eq!(
            node.bounding(),
            Rect::new(100.0, 70.0, NODE_COLLAPSED_WIDTH, NODE_TITLE_HEIGHT)
        );
        assert!(!node.is_point_inside(vec2(150.0, 150.0), 0.0));
        assert!(node.is_point_inside(vec2(150.0, 80.0), 0.0));
    }

    #[test]
    fn pick_box_reaches_past_side_edges() {
        let node = sample_node();
        assert!(node.is_point_inside(vec2(98.0, 120.0), 0.0));
        assert!(node.is_point_inside(vec2(282.0, 120.0), 0.0));
        assert!(!node.is_point_inside(vec2(90.0, 120.0), 0.0));
        assert!(node.is_point_inside(vec2(90.0, 120.0), 7.0));
    }

    #[test]
    fn connection_positions_follow_slot_rows() {
        let node = sample_node();
        assert_eq!(node.connection_pos(true, 0), vec2(110.0, 114.0));
        assert_eq!(node.connection_pos(true, 1), vec2(110.0, 134.0));
        assert_eq!(node.connection_pos(false, 0), vec2(271.0, 114.0));
    }

    #[test]
    fn collapsed_connection_positions_sit_on_title() {
        let mut node = sample_node();
        node.flags.collapsed = true;
        assert_eq!(node.connection_pos(true, 1), vec2(100.0, 85.0));
        assert_eq!(node.connection_pos(false, 0), vec2(180.0, 85.0));
    }

    #[test]
    fn min_size_covers_slot_rows() {
        let node = sample_node();
        let min = node.compute_min_size();
        assert_eq!(min.y, 40.0);
        assert!(min.x >= NODE_MIN_WIDTH);
    }

    #[test]
    fn node_mode_gates_widget_input() {
        assert!(NodeMode::Always.accepts_widget_input());
        assert!(NodeMode::OnEvent.accepts_widget_input());
        assert!(!NodeMode::Never.accepts_widget_input());
        assert!(!NodeMode::Bypass.accepts_widget_input());
    }

    #[test]
    fn group_resize_respects_minimum() {
        let mut group = Group::new("G", Rect::new(0.0, 0.0, 300.0, 200.0));
        group.resize_to(vec2(10.0, 500.0));
        assert_eq!(group.size, vec2(GROUP_MIN_SIZE.0, 500.0));
        assert_eq!(group.header_rect().height, GROUP_FONT_SIZE * 1.4);
    }

    #[test]
    fn node_round_trips_through_json() {
        let node = sample_node();
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
