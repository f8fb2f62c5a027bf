//! Shared application-wide constants.
//! Centralizes node geometry and tweakable values used across hit-testing,
//! interaction and rendering. Values that users may want to tune live in
//! [`crate::config::CanvasConfig`] instead.

// Node geometry (graph units)
/// Height of the title bar drawn above a node's `pos`.
pub const NODE_TITLE_HEIGHT: f64 = 30.0;
/// Vertical spacing between consecutive slot rows.
pub const NODE_SLOT_HEIGHT: f64 = 20.0;
/// Default height of a canvas-drawn widget row.
pub const NODE_WIDGET_HEIGHT: f64 = 20.0;
/// Gap added after every canvas-drawn widget.
pub const WIDGET_SPACING: f64 = 4.0;
/// Horizontal inset of widget rows from the node edges.
pub const WIDGET_MARGIN_X: f64 = 15.0;
/// Width of a collapsed node.
pub const NODE_COLLAPSED_WIDTH: f64 = 80.0;
/// Minimum width reported by `Node::compute_min_size`.
pub const NODE_MIN_WIDTH: f64 = 140.0;
/// Default size for freshly created nodes.
pub const NODE_DEFAULT_SIZE: (f64, f64) = (180.0, 60.0);
/// Side length of the bottom-right resize handle.
pub const RESIZE_HANDLE_SIZE: f64 = 15.0;
/// Half width of the rectangular hotspot around a slot connection point.
pub const SLOT_HOTSPOT_HALF_WIDTH: f64 = 15.0;
/// Half height of the slot hotspot.
pub const SLOT_HOTSPOT_HALF_HEIGHT: f64 = 10.0;
/// Extra pick margin used when a pointer press looks for a node.
pub const NODE_PICK_MARGIN: f64 = 5.0;
/// Offset applied to clones made by Alt-dragging.
pub const CLONE_OFFSET: f64 = 5.0;

// Links
/// Half size of the square hit box around a link's midpoint.
pub const LINK_CENTER_TOLERANCE: f64 = 5.0;
/// Fraction of the endpoint distance used for bezier control points.
pub const LINK_CURVE_FACTOR: f64 = 0.25;

// Groups
/// Default title font size for groups; the move header is 1.4x this.
pub const GROUP_FONT_SIZE: f64 = 24.0;
/// Screen-space distance to the bottom-right corner that starts a group resize.
pub const GROUP_RESIZE_DISTANCE: f64 = 10.0;
/// Smallest size a group can be resized to.
pub const GROUP_MIN_SIZE: (f64, f64) = (140.0, 80.0);
/// Margin used when picking a group.
pub const GROUP_PICK_MARGIN: f64 = 2.0;

// DOM widgets
/// Minimum height for DOM widgets that do not declare one.
pub const DOM_DEFAULT_MIN_HEIGHT: f64 = 50.0;
/// Inner margin between a DOM widget row and its element.
pub const DOM_WIDGET_MARGIN: f64 = 10.0;
/// Margin inflating a selected node's bounds when clipping DOM widgets behind it.
pub const DOM_CLIP_MARGIN: f64 = 7.0;
/// Zoom level under which `hide_on_zoom` widgets are hidden.
pub const DOM_HIDE_ZOOM_THRESHOLD: f64 = 0.5;

// Deferred work
/// Delay before a freshly opened menu accepts pointer input.
pub const MENU_POINTER_GUARD_MS: f64 = 100.0;

// Grid/drawing
/// Grid cell size in graph units (used for drawing; snapping uses the config).
pub const GRID_SIZE: f64 = 20.0;

// Undo/redo
/// Maximum number of undo history entries to retain.
pub const MAX_UNDO_HISTORY: usize = 100;

// Rendering (screen pixels unless noted)
/// Corner radius of node bodies.
pub const NODE_CORNER_RADIUS: f32 = 6.0;
/// Radius of a slot's connection dot at zoom 1.
pub const SLOT_DOT_RADIUS: f32 = 4.0;
/// Link stroke width at zoom 1.
pub const LINK_WIDTH: f32 = 3.0;
/// Corner radius of group rectangles.
pub const GROUP_CORNER_RADIUS: f32 = 4.0;
/// Grid lines are skipped when cells would be smaller than this on screen.
pub const MIN_GRID_SPACING_PX: f64 = 4.0;
/// Fallback size used to keep a popup on screen before it has been measured.
pub const MENU_ESTIMATED_SIZE: (f32, f32) = (200.0, 240.0);
