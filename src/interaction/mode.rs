//! Interaction modes and pointer bookkeeping.

use super::event::LinkAnchor;
use crate::geometry::{Rect, Vector2};
use crate::types::{GroupId, NodeId};

/// A link being dragged from a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLink {
    /// Slot the drag started from
    pub anchor: LinkAnchor,
    /// Graph-space anchor of that slot
    pub start: Vector2,
    /// Graph-space pointer position
    pub pointer: Vector2,
    /// Compatible slot under the pointer, as (node, slot index)
    pub highlight: Option<(NodeId, usize)>,
}

/// The primary interaction mode. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionMode {
    /// Nothing is being dragged
    #[default]
    Idle,
    /// Dragging the canvas
    PanningCanvas,
    /// Dragging the selection; `node` is the one that was pressed
    DraggingNodes {
        /// Pressed node
        node: NodeId,
    },
    /// Dragging a node's resize handle
    ResizingNode {
        /// Node being resized
        node: NodeId,
    },
    /// Dragging a new link
    ConnectingLink(PendingLink),
    /// Dragging out a selection rectangle (graph space)
    RectSelecting {
        /// Where the drag started
        anchor: Vector2,
        /// Current pointer position
        current: Vector2,
    },
    /// Dragging a group by its header
    MovingGroup {
        /// Group being moved
        group: GroupId,
        /// Nodes that move with it, fixed when the drag started
        members: Vec<NodeId>,
    },
    /// Dragging a group's bottom-right corner
    ResizingGroup {
        /// Group being resized
        group: GroupId,
    },
}

impl InteractionMode {
    /// Whether no drag is active.
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionMode::Idle)
    }

    /// Short name for logs and tests.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionMode::Idle => "idle",
            InteractionMode::PanningCanvas => "panning-canvas",
            InteractionMode::DraggingNodes { .. } => "dragging-nodes",
            InteractionMode::ResizingNode { .. } => "resizing-node",
            InteractionMode::ConnectingLink(_) => "connecting-link",
            InteractionMode::RectSelecting { .. } => "rect-selecting",
            InteractionMode::MovingGroup { .. } => "moving-group",
            InteractionMode::ResizingGroup { .. } => "resizing-group",
        }
    }

    /// Current selection rectangle, normalized, while rect-selecting.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self {
            InteractionMode::RectSelecting { anchor, current } => Some(
                Rect::new(anchor.x, anchor.y, current.x - anchor.x, current.y - anchor.y)
                    .normalized(),
            ),
            _ => None,
        }
    }
}

/// Cursor the host should show over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanvasCursor {
    /// Plain arrow
    #[default]
    Default,
    /// Over a node
    Crosshair,
    /// Over or dragging a resize handle
    ResizeSe,
}

/// A canvas widget holding the pointer capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetCapture {
    /// Owner node
    pub node: NodeId,
    /// Widget index
    pub widget: usize,
}

/// Button state, timing and positions of the pointer.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    /// A button is held
    pub is_down: bool,
    /// A second touch point joined while the first is down
    pub is_double: bool,
    /// Move/up events must keep flowing even outside the canvas
    pub captured: bool,
    /// Time of the previous press
    pub last_press_ms: Option<f64>,
    /// Time of the current press
    pub press_ms: f64,
    /// Graph-space position of the current press
    pub press_graph: Vector2,
    /// Last canvas-local screen position
    pub last_screen: Vector2,
    /// Last graph-space position
    pub graph_pos: Vector2,
}
