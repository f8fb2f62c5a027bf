//! Pointer-driven canvas interaction.
//!
//! [`CanvasController`] turns platform-independent [`PointerEvent`]s into
//! edits on a [`Graph`]. The controller never owns the graph; each handler
//! borrows it for the duration of one event. Exactly one
//! [`InteractionMode`] is active at a time. Hover, selection, widget capture
//! and pointer timing are tracked alongside it.
//!
//! The handlers for each event kind live in their own files:
//! `pointer_down.rs`, `pointer_move.rs`, `pointer_up.rs` and `wheel.rs`.

pub mod behavior;
pub mod event;
pub mod mode;
mod pointer_down;
mod pointer_move;
mod pointer_up;
mod wheel;


pub use behavior::{InteractiveNode, NodeBehaviors};
pub use event::{
    CanvasEvent, CanvasRequest, ContextTarget, LinkAnchor, Modifiers, PointerButton, PointerEvent,
    PointerKind, PromptTarget,
};
pub use mode::{CanvasCursor, InteractionMode, PendingLink, PointerTracker, WidgetCapture};

use crate::config::CanvasConfig;
use crate::geometry::Vector2;
use crate::graph::Graph;
use crate::transform::Transform;
use crate::types::{GroupId, LinkId, Node, NodeId};
use crate::widgets::registry::{DomFeedback, DomSignal};
use crate::widgets::{Widget, WidgetAction, WidgetPointer};
use std::rc::Rc;

/// Pointer state machine for one canvas.
#[derive(Debug)]
pub struct CanvasController {
    /// Behavior switches
    pub config: CanvasConfig,
    /// Pan and zoom
    pub transform: Transform,
    mode: InteractionMode,
    selection: Vec<NodeId>,
    selected_group: Option<GroupId>,
    node_over: Option<NodeId>,
    over_link_center: Option<LinkId>,
    widget_capture: Option<WidgetCapture>,
    pointer: PointerTracker,
    input_locked: bool,
    cursor: CanvasCursor,
    dirty_fg: bool,
    dirty_bg: bool,
    visible_nodes: Option<Vec<NodeId>>,
    behaviors: NodeBehaviors,
    events: Vec<CanvasEvent>,
    requests: Vec<CanvasRequest>,
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl CanvasController {
    /// Creates an idle controller.
    pub fn new(config: CanvasConfig) -> Self {
        let transform = Transform::with_limits(config.min_scale, config.max_scale);
        Self {
            config,
            transform,
            mode: InteractionMode::Idle,
            selection: Vec::new(),
            selected_group: None,
            node_over: None,
            over_link_center: None,
            widget_capture: None,
            pointer: PointerTracker::default(),
            input_locked: false,
            cursor: CanvasCursor::Default,
            dirty_fg: true,
            dirty_bg: true,
            visible_nodes: None,
            behaviors: NodeBehaviors::new(),
            events: Vec::new(),
            requests: Vec::new(),
        }
    }

    /// Replaces the config and applies its zoom limits.
    pub fn set_config(&mut self, config: CanvasConfig) {
        self.transform.min_scale = config.min_scale;
        self.transform.max_scale = config.max_scale;
        let scale = self.transform.scale();
        self.transform.change_scale(scale, Vector2::ZERO);
        self.config = config;
    }

    /// Dispatches one pointer event.
    pub fn handle_event(&mut self, graph: &mut Graph, ev: &PointerEvent) {
        match ev.kind {
            PointerKind::Down => self.pointer_down(graph, ev),
            PointerKind::Move => self.pointer_move(graph, ev),
            PointerKind::Up => self.pointer_up(graph, ev),
            PointerKind::Wheel => self.wheel(graph, ev),
        }
    }

    // ---- accessors ----

    /// Active interaction mode.
    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    /// Selected nodes in selection order.
    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    /// Whether a node is selected.
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selection.contains(&id)
    }

    /// Group pressed by the current gesture.
    pub fn selected_group(&self) -> Option<GroupId> {
        self.selected_group
    }

    /// Node under the pointer.
    pub fn node_over(&self) -> Option<NodeId> {
        self.node_over
    }

    /// Link whose midpoint is under the pointer.
    pub fn over_link_center(&self) -> Option<LinkId> {
        self.over_link_center
    }

    /// Widget holding the pointer capture.
    pub fn widget_capture(&self) -> Option<WidgetCapture> {
        self.widget_capture
    }

    /// Pointer button and timing state.
    pub fn pointer(&self) -> &PointerTracker {
        &self.pointer
    }

    /// Whether move/up events should keep flowing while outside the canvas.
    pub fn pointer_captured(&self) -> bool {
        self.pointer.captured
    }

    /// Cursor to show.
    pub fn cursor(&self) -> CanvasCursor {
        self.cursor
    }

    /// Whether pointer handling is suspended.
    pub fn input_locked(&self) -> bool {
        self.input_locked
    }

    /// Suspends pointer handling, for example while a submenu is open.
    pub fn set_input_locked(&mut self, locked: bool) {
        self.input_locked = locked;
    }

    /// Restricts node picking to the given nodes; `None` allows all.
    pub fn set_visible_nodes(&mut self, visible: Option<Vec<NodeId>>) {
        self.visible_nodes = visible;
    }

    /// Per-type interaction hooks.
    pub fn behaviors_mut(&mut self) -> &mut NodeBehaviors {
        &mut self.behaviors
    }

    /// Returns and clears the (foreground, background) redraw flags.
    pub fn take_dirty(&mut self) -> (bool, bool) {
        let flags = (self.dirty_fg, self.dirty_bg);
        self.dirty_fg = false;
        self.dirty_bg = false;
        flags
    }

    /// Marks layers for redraw.
    pub fn set_dirty(&mut self, fg: bool, bg: bool) {
        self.dirty_fg |= fg;
        self.dirty_bg |= bg;
    }

    /// Takes the notifications emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    /// Takes the host requests emitted since the last call.
    pub fn drain_requests(&mut self) -> Vec<CanvasRequest> {
        std::mem::take(&mut self.requests)
    }

    fn emit(&mut self, event: CanvasEvent) {
        log::trace!("canvas event {:?}", event);
        self.events.push(event);
    }

    fn request(&mut self, request: CanvasRequest) {
        self.requests.push(request);
    }

    /// Runs a hook of the node's registered behavior, if any.
    fn with_behavior<R>(
        &self,
        graph: &mut Graph,
        id: NodeId,
        f: impl FnOnce(&dyn InteractiveNode, &mut Node) -> R,
    ) -> Option<R> {
        let node = graph.node_mut(id)?;
        let behavior = self.behaviors.get(&node.node_type)?;
        Some(f(Rc::as_ref(&behavior), node))
    }

    fn node_at(&self, graph: &Graph, pos: Vector2, margin: f64) -> Option<NodeId> {
        graph.get_node_on_pos(pos, self.visible_nodes.as_deref(), margin)
    }

    // ---- selection ----

    /// Selects `ids`, replacing the selection unless `additive`.
    pub fn select_nodes(&mut self, graph: &mut Graph, ids: &[NodeId], additive: bool) {
        if !additive {
            self.clear_selection(graph);
        }
        for &id in ids {
            if graph.node(id).is_none() || self.selection.contains(&id) {
                continue;
            }
            self.selection.push(id);
            self.with_behavior(graph, id, |b, n| b.on_selected(n));
        }
        self.emit(CanvasEvent::SelectionChanged(self.selection.clone()));
        self.set_dirty(true, false);
    }

    /// Clears the selection.
    pub fn deselect_all(&mut self, graph: &mut Graph) {
        if self.selection.is_empty() {
            return;
        }
        self.clear_selection(graph);
        self.emit(CanvasEvent::SelectionChanged(Vec::new()));
        self.set_dirty(true, false);
    }

    fn clear_selection(&mut self, graph: &mut Graph) {
        for id in std::mem::take(&mut self.selection) {
            self.with_behavior(graph, id, |b, n| b.on_deselected(n));
        }
    }

    /// Drops selection and hover references to nodes no longer in `graph`.
    pub fn forget_missing(&mut self, graph: &Graph) {
        self.selection.retain(|id| graph.node(*id).is_some());
        if self.node_over.is_some_and(|id| graph.node(id).is_none()) {
            self.node_over = None;
        }
        if self
            .widget_capture
            .is_some_and(|c| graph.node(c.node).is_none())
        {
            self.widget_capture = None;
        }
    }

    /// Deletes the selected nodes as one undoable change.
    pub fn delete_selected(&mut self, graph: &mut Graph) -> Vec<Node> {
        if self.selection.is_empty() || !self.config.can_edit() {
            return Vec::new();
        }
        graph.before_change();
        let removed: Vec<Node> = std::mem::take(&mut self.selection)
            .into_iter()
            .filter_map(|id| graph.remove_node(id).ok())
            .collect();
        graph.after_change();
        self.forget_missing(graph);
        self.emit(CanvasEvent::SelectionChanged(Vec::new()));
        self.set_dirty(true, true);
        removed
    }

    /// Selects and raises the node owning a DOM widget the user focused.
    pub fn activate_dom_widget(&mut self, graph: &mut Graph, node: NodeId) {
        if graph.node(node).is_none() {
            return;
        }
        if !(self.selection.len() == 1 && self.selection[0] == node) {
            self.select_nodes(graph, &[node], false);
        }
        graph.bring_to_front(node);
        self.set_dirty(true, false);
    }

    /// Applies what DOM elements reported since the last sync.
    pub fn apply_dom_feedback(&mut self, graph: &mut Graph, feedback: Vec<DomFeedback>) {
        for item in feedback {
            let Some(Widget::Dom(widget)) = graph
                .node(item.node)
                .and_then(|n| n.widgets.get(item.widget))
            else {
                continue;
            };
            let selects = item.selects(widget);
            match item.signal {
                DomSignal::Input(text) => {
                    if let Some(Widget::Dom(widget)) = graph
                        .node_mut(item.node)
                        .and_then(|n| n.widgets.get_mut(item.widget))
                    {
                        widget.value = text.clone();
                    }
                    graph.change();
                    self.emit(CanvasEvent::WidgetValueChanged {
                        node: item.node,
                        widget: item.widget,
                        value: serde_json::Value::String(text),
                    });
                }
                DomSignal::Focus | DomSignal::Click if selects => {
                    self.activate_dom_widget(graph, item.node)
                }
                DomSignal::Focus | DomSignal::Click => {}
            }
        }
    }

    // ---- node state ----

    /// Collapses or expands a node.
    pub fn toggle_collapse(&mut self, graph: &mut Graph, id: NodeId) {
        let Some(node) = graph.node_mut(id) else {
            return;
        };
        node.flags.collapsed = !node.flags.collapsed;
        let collapsed = node.flags.collapsed;
        self.with_behavior(graph, id, |b, n| b.on_collapse(n, collapsed));
        self.emit(CanvasEvent::NodeCollapsed { node: id, collapsed });
        self.set_dirty(true, true);
    }

    /// Sets a canvas widget's value from prompt or combo text.
    pub fn set_widget_value(&mut self, graph: &mut Graph, node: NodeId, widget: usize, text: &str) {
        graph.before_change();
        let changed = match graph
            .node_mut(node)
            .and_then(|n| n.widgets.get_mut(widget))
        {
            Some(Widget::Canvas(w)) => w.set_value_from_text(text).then(|| w.value.clone()),
            _ => None,
        };
        graph.after_change();
        if let Some(value) = changed {
            self.emit(CanvasEvent::WidgetValueChanged {
                node,
                widget,
                value,
            });
            self.set_dirty(true, false);
        }
    }

    /// Renames a group.
    pub fn rename_group(&mut self, graph: &mut Graph, group: GroupId, title: &str) {
        graph.before_change();
        if let Some(g) = graph.group_mut(group) {
            g.title = title.to_string();
        }
        graph.after_change();
        self.set_dirty(false, true);
    }

    /// Routes a pointer phase to a canvas widget and acts on the result.
    fn route_widget(
        &mut self,
        graph: &mut Graph,
        capture: WidgetCapture,
        phase: WidgetPointer,
        screen_pos: Vector2,
    ) {
        let Some(node) = graph.node_mut(capture.node) else {
            return;
        };
        let width = node.size.x;
        let local_x = self.pointer.graph_pos.x - node.pos.x;
        let Some(Widget::Canvas(widget)) = node.widgets.get_mut(capture.widget) else {
            return;
        };
        if widget.disabled {
            return;
        }
        let action = widget.handle_pointer(phase, local_x, width);
        let value = widget.value.clone();
        let (node, widget) = (capture.node, capture.widget);
        match action {
            WidgetAction::None => {}
            WidgetAction::ValueChanged => {
                self.emit(CanvasEvent::WidgetValueChanged {
                    node,
                    widget,
                    value,
                });
            }
            WidgetAction::Triggered => self.emit(CanvasEvent::WidgetTriggered { node, widget }),
            WidgetAction::OpenCombo { values } => self.request(CanvasRequest::ComboMenu {
                node,
                widget,
                values,
                screen_pos,
            }),
            WidgetAction::Prompt { value } => self.request(CanvasRequest::Prompt {
                target: PromptTarget::Widget { node, widget },
                title: "Value".to_string(),
                value,
                screen_pos,
            }),
        }
        self.set_dirty(true, false);
    }
}
