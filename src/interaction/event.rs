//! Inputs and outputs of the pointer state machine.

use crate::geometry::Vector2;
use crate::types::{GroupId, LinkId, NodeId};
use serde_json::Value;

/// Mouse button or touch role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button or single finger
    Primary,
    /// Wheel button
    Middle,
    /// Right button
    Secondary,
}

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift
    pub shift: bool,
    /// Control
    pub ctrl: bool,
    /// Alt / Option
    pub alt: bool,
    /// Meta / Command
    pub meta: bool,
}

impl Modifiers {
    /// Only Shift held.
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };
    /// Only Ctrl held.
    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };
    /// Only Alt held.
    pub const ALT: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: true,
        meta: false,
    };

    /// Whether any modifier asks for additive selection.
    pub fn additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Kind of pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Button pressed
    Down,
    /// Pointer moved
    Move,
    /// Button released
    Up,
    /// Wheel scrolled
    Wheel,
}

/// A platform-independent pointer event in canvas-local screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// What happened
    pub kind: PointerKind,
    /// Canvas-local screen position
    pub pos: Vector2,
    /// Button involved (ignored for moves)
    pub button: PointerButton,
    /// Held modifiers
    pub modifiers: Modifiers,
    /// Timestamp in milliseconds
    pub time_ms: f64,
    /// False for secondary touch points
    pub is_primary: bool,
    /// Positive when scrolling up/away
    pub wheel_delta: f64,
}

impl PointerEvent {
    fn new(kind: PointerKind, pos: Vector2, button: PointerButton, time_ms: f64) -> Self {
        Self {
            kind,
            pos,
            button,
            modifiers: Modifiers::default(),
            time_ms,
            is_primary: true,
            wheel_delta: 0.0,
        }
    }

    /// A button press.
    pub fn down(pos: Vector2, button: PointerButton, time_ms: f64) -> Self {
        Self::new(PointerKind::Down, pos, button, time_ms)
    }

    /// A pointer move.
    pub fn moved(pos: Vector2, time_ms: f64) -> Self {
        Self::new(PointerKind::Move, pos, PointerButton::Primary, time_ms)
    }

    /// A button release.
    pub fn up(pos: Vector2, button: PointerButton, time_ms: f64) -> Self {
        Self::new(PointerKind::Up, pos, button, time_ms)
    }

    /// A wheel scroll.
    pub fn wheel(pos: Vector2, delta: f64, time_ms: f64) -> Self {
        Self {
            wheel_delta: delta,
            ..Self::new(PointerKind::Wheel, pos, PointerButton::Middle, time_ms)
        }
    }

    /// Same event with modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Same event from a secondary touch point.
    pub fn secondary_touch(mut self) -> Self {
        self.is_primary = false;
        self
    }
}

/// One end of a link being dragged.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnchor {
    /// Node owning the slot
    pub node: NodeId,
    /// Slot index
    pub slot: usize,
    /// True when dragging from an output
    pub is_output: bool,
    /// Type of the slot
    pub slot_type: String,
}

/// What a context menu was opened on.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextTarget {
    /// Empty canvas
    Canvas,
    /// A node
    Node(NodeId),
    /// A link midpoint
    Link(LinkId),
    /// A group
    Group(GroupId),
}

/// What a text prompt edits.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptTarget {
    /// A canvas widget's value
    Widget {
        /// Owner node
        node: NodeId,
        /// Widget index
        widget: usize,
    },
    /// A group's title
    GroupTitle(GroupId),
}

/// Notifications for observers of the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// The hovered node changed
    HoverChanged {
        /// Node now under the pointer
        current: Option<NodeId>,
        /// Node previously under the pointer
        previous: Option<NodeId>,
    },
    /// The pointer entered a node
    NodeEnter(NodeId),
    /// The pointer left a node
    NodeLeave(NodeId),
    /// A node drag finished
    NodeMoved(NodeId),
    /// A node was resized with its handle
    NodeResized(NodeId),
    /// An already selected node was double-clicked
    NodeDoubleClicked(NodeId),
    /// A node was collapsed or expanded
    NodeCollapsed {
        /// The node
        node: NodeId,
        /// New state
        collapsed: bool,
    },
    /// The selection changed; carries the new selection
    SelectionChanged(Vec<NodeId>),
    /// A button was pressed (graph-space position)
    MouseDown {
        /// Graph-space position
        pos: Vector2,
        /// Button
        button: PointerButton,
    },
    /// A button was released (graph-space position)
    MouseUp {
        /// Graph-space position
        pos: Vector2,
        /// Button
        button: PointerButton,
    },
    /// A widget's value changed
    WidgetValueChanged {
        /// Owner node
        node: NodeId,
        /// Widget index
        widget: usize,
        /// New value
        value: Value,
    },
    /// A button widget fired
    WidgetTriggered {
        /// Owner node
        node: NodeId,
        /// Widget index
        widget: usize,
    },
    /// A link was created by a gesture
    LinkCreated(LinkId),
}

/// Work the canvas asks its host (menus, search box, navigation) to do.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasRequest {
    /// Close any open menu or search box
    CloseMenus,
    /// Open the context menu
    ContextMenu {
        /// What was clicked
        target: ContextTarget,
        /// Canvas-local screen position
        screen_pos: Vector2,
        /// Graph-space position
        graph_pos: Vector2,
    },
    /// Open the menu for a link midpoint
    LinkMenu {
        /// The link
        link: LinkId,
        /// Canvas-local screen position
        screen_pos: Vector2,
    },
    /// Open the node search box
    SearchBox {
        /// Canvas-local screen position
        screen_pos: Vector2,
        /// Where a created node should go
        graph_pos: Vector2,
        /// Link end the new node should connect to, filtering by type
        from: Option<LinkAnchor>,
    },
    /// Offer node types that can continue a dropped link
    ConnectionMenu {
        /// Link end being dropped
        from: LinkAnchor,
        /// Canvas-local screen position
        screen_pos: Vector2,
        /// Where a created node should go
        graph_pos: Vector2,
    },
    /// Navigate into a node's subgraph
    OpenSubgraph(NodeId),
    /// Create and wire a default node for a slot
    CreateDefaultNodeForSlot {
        /// Slot to wire
        anchor: LinkAnchor,
        /// Suggested position for the new node
        graph_pos: Vector2,
    },
    /// Open a combo widget's list
    ComboMenu {
        /// Owner node
        node: NodeId,
        /// Widget index
        widget: usize,
        /// Choices
        values: Vec<String>,
        /// Canvas-local screen position
        screen_pos: Vector2,
    },
    /// Ask for a text value
    Prompt {
        /// What is being edited
        target: PromptTarget,
        /// Prompt label
        title: String,
        /// Current value
        value: String,
        /// Canvas-local screen position
        screen_pos: Vector2,
    },
}
