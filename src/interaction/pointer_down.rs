use super::*;
use crate::constants::{CLONE_OFFSET, LINK_CENTER_TOLERANCE, NODE_DEFAULT_SIZE, NODE_PICK_MARGIN};
use crate::geometry::vec2;
use crate::hit_test;

/// Gap between a slot's node and a node created from it with the middle button.
const DEFAULT_NODE_GAP: f64 = 30.0;

impl CanvasController {
    pub(super) fn pointer_down(&mut self, graph: &mut Graph, ev: &PointerEvent) {
        if self.input_locked || !self.transform.is_inside(ev.pos) {
            return;
        }
        let graph_pos = self.transform.to_graph(ev.pos);
        let is_double_click = ev.is_primary
            && self
                .pointer
                .last_press_ms
                .is_some_and(|last| ev.time_ms - last < self.config.double_click_ms);

        self.pointer.is_double = self.pointer.is_down && !ev.is_primary;
        if !self.pointer.is_double {
            self.finish_gesture(graph);
        }
        self.pointer.is_down = true;
        self.pointer.captured = true;
        self.pointer.press_ms = ev.time_ms;
        self.pointer.press_graph = graph_pos;
        self.pointer.last_screen = ev.pos;
        self.pointer.graph_pos = graph_pos;

        self.request(CanvasRequest::CloseMenus);
        let node = self.node_at(graph, graph_pos, NODE_PICK_MARGIN);

        match ev.button {
            PointerButton::Primary if !self.pointer.is_double => {
                self.primary_down(graph, ev, graph_pos, node, is_double_click)
            }
            PointerButton::Primary => {}
            PointerButton::Middle => self.middle_down(graph, graph_pos, node),
            PointerButton::Secondary => self.secondary_down(graph, ev, graph_pos, node),
        }

        self.pointer.last_press_ms = Some(ev.time_ms);
        self.set_dirty(true, true);
        graph.change();
        self.emit(CanvasEvent::MouseDown {
            pos: graph_pos,
            button: ev.button,
        });
    }

    /// Ends the active gesture without applying its release.
    ///
    /// Gestures that opened an undo step close it here, so a press that
    /// interrupts them (a middle click during a drag) leaves history usable.
    fn finish_gesture(&mut self, graph: &mut Graph) {
        if self.widget_capture.take().is_some() {
            graph.after_change();
        }
        match std::mem::take(&mut self.mode) {
            InteractionMode::Idle => {}
            InteractionMode::PanningCanvas | InteractionMode::RectSelecting { .. } => {}
            mode @ (InteractionMode::DraggingNodes { .. }
            | InteractionMode::ResizingNode { .. }
            | InteractionMode::ConnectingLink(_)
            | InteractionMode::MovingGroup { .. }
            | InteractionMode::ResizingGroup { .. }) => {
                log::debug!("press interrupted {}", mode.name());
                graph.after_change();
            }
        }
    }

    fn primary_down(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        pos: Vector2,
        node: Option<NodeId>,
        is_double_click: bool,
    ) {
        let can_edit = self.config.can_edit();

        if ev.modifiers.ctrl && can_edit {
            self.mode = InteractionMode::RectSelecting {
                anchor: pos,
                current: pos,
            };
            return;
        }

        if let Some(id) = node {
            let clone_on_drag = self.config.alt_drag_do_clone_nodes && !is_double_click;
            if ev.modifiers.alt && can_edit && clone_on_drag {
                graph.before_change();
                match graph.clone_node(id, vec2(CLONE_OFFSET, CLONE_OFFSET)) {
                    Ok(clone) => {
                        log::debug!("cloned node {} as {}", id, clone);
                        self.select_nodes(graph, &[clone], false);
                        if self.config.allow_dragnodes {
                            self.mode = InteractionMode::DraggingNodes { node: clone };
                        } else {
                            graph.after_change();
                        }
                        return;
                    }
                    Err(err) => {
                        log::debug!("clone on alt-drag failed: {}", err);
                        graph.after_change();
                    }
                }
            }
        }

        match node {
            Some(id) if can_edit => self.press_node(graph, ev, pos, id, is_double_click),
            _ => self.press_canvas(graph, ev, pos, node, is_double_click),
        }
    }

    fn press_node(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        pos: Vector2,
        id: NodeId,
        is_double_click: bool,
    ) {
        let Some(node) = graph.node(id) else {
            return;
        };
        if !self.config.live_mode && !node.flags.pinned {
            graph.bring_to_front(id);
        }

        let Some(node) = graph.node(id) else {
            return;
        };
        if !node.flags.collapsed && !self.config.live_mode {
            if hit_test::resize_handle_at(node, pos) {
                graph.before_change();
                self.mode = InteractionMode::ResizingNode { node: id };
                self.cursor = CanvasCursor::ResizeSe;
                return;
            }
            if let Some(slot) = hit_test::slot_at(node, pos, true) {
                self.press_output(graph, ev, id, slot, is_double_click);
                return;
            }
            if let Some(slot) = hit_test::slot_at(node, pos, false) {
                self.press_input(graph, ev, id, slot, is_double_click);
                return;
            }
        }

        self.press_node_body(graph, ev, pos, id, is_double_click);
    }

    fn press_output(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        id: NodeId,
        slot: usize,
        is_double_click: bool,
    ) {
        self.with_behavior(graph, id, |b, n| b.on_slot_click(n, slot, false, is_double_click));
        graph.before_change();
        if ev.modifiers.shift && self.config.shift_click_do_break_link_from {
            if let Err(err) = graph.disconnect_output(id, slot) {
                log::debug!("break output link failed: {}", err);
            }
        }
        self.begin_link(graph, id, slot, true);
        if !matches!(self.mode, InteractionMode::ConnectingLink(_)) {
            graph.after_change();
        }
    }

    fn press_input(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        id: NodeId,
        slot: usize,
        is_double_click: bool,
    ) {
        self.with_behavior(graph, id, |b, n| b.on_slot_click(n, slot, true, is_double_click));
        graph.before_change();

        let existing = graph
            .node(id)
            .and_then(|n| n.inputs.get(slot))
            .and_then(|input| input.link)
            .and_then(|link| graph.link(link))
            .cloned();

        match existing {
            Some(link) => {
                let break_to = self.config.click_do_break_link_to;
                if break_to {
                    self.break_input(graph, id, slot);
                }
                if self.config.allow_reconnect_links || ev.modifiers.shift {
                    if !break_to {
                        self.break_input(graph, id, slot);
                    }
                    // pick the link up again from its origin output
                    self.begin_link(graph, link.origin_id, link.origin_slot, true);
                } else if !break_to {
                    // the old link stays until the new one lands
                    self.begin_link(graph, id, slot, false);
                }
            }
            None => self.begin_link(graph, id, slot, false),
        }

        if !matches!(self.mode, InteractionMode::ConnectingLink(_)) {
            graph.after_change();
        }
    }

    fn break_input(&mut self, graph: &mut Graph, id: NodeId, slot: usize) {
        if let Err(err) = graph.disconnect_input(id, slot) {
            log::debug!("break input link failed: {}", err);
        }
    }

    fn begin_link(&mut self, graph: &Graph, id: NodeId, slot: usize, is_output: bool) {
        let Some(node) = graph.node(id) else {
            return;
        };
        let Some(slot_type) = node.slot_type(!is_output, slot) else {
            return;
        };
        let start = node.connection_pos(!is_output, slot);
        self.mode = InteractionMode::ConnectingLink(PendingLink {
            anchor: LinkAnchor {
                node: id,
                slot,
                is_output,
                slot_type: slot_type.to_string(),
            },
            start,
            pointer: self.pointer.graph_pos,
            highlight: None,
        });
    }

    fn press_node_body(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        pos: Vector2,
        id: NodeId,
        is_double_click: bool,
    ) {
        let Some(node) = graph.node(id) else {
            return;
        };
        let local = pos - node.pos;
        let mut block_drag = node.flags.pinned;
        let mut pan_instead = false;

        if node.mode.accepts_widget_input() {
            if let Some(index) = hit_test::widget_at(node, pos) {
                if matches!(node.widgets.get(index), Some(Widget::Canvas(_))) {
                    graph.before_change();
                    let capture = WidgetCapture {
                        node: id,
                        widget: index,
                    };
                    self.widget_capture = Some(capture);
                    self.route_widget(graph, capture, WidgetPointer::Down, ev.pos);
                    block_drag = true;
                }
            }
        }

        if is_double_click && self.is_selected(id) {
            self.with_behavior(graph, id, |b, n| b.on_dbl_click(n, local));
            self.emit(CanvasEvent::NodeDoubleClicked(id));
            block_drag = true;
        }

        if self
            .with_behavior(graph, id, |b, n| b.on_mouse_down(n, local))
            .unwrap_or(false)
        {
            block_drag = true;
        } else {
            if graph
                .node(id)
                .is_some_and(|n| hit_test::subgraph_button_at(n, pos))
            {
                self.request(CanvasRequest::OpenSubgraph(id));
            }
            if self.config.live_mode {
                pan_instead = true;
                block_drag = true;
            }
        }

        if !block_drag {
            if self.config.allow_dragnodes {
                graph.before_change();
                self.mode = InteractionMode::DraggingNodes { node: id };
            }
            if !self.is_selected(id) {
                self.select_nodes(graph, &[id], ev.modifiers.additive());
            }
        }

        if pan_instead && self.config.allow_dragcanvas {
            self.mode = InteractionMode::PanningCanvas;
        }
    }

    fn press_canvas(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        pos: Vector2,
        node: Option<NodeId>,
        is_double_click: bool,
    ) {
        let can_edit = self.config.can_edit();

        // subgraphs stay navigable when editing is off
        if let Some(id) = node {
            if graph
                .node(id)
                .is_some_and(|n| hit_test::subgraph_button_at(n, pos))
            {
                self.request(CanvasRequest::OpenSubgraph(id));
                return;
            }
        }

        if can_edit {
            let scale = self.transform.scale();
            if let Some(link) = hit_test::link_center_at(graph, pos, LINK_CENTER_TOLERANCE, scale) {
                self.over_link_center = None;
                self.request(CanvasRequest::LinkMenu {
                    link,
                    screen_pos: ev.pos,
                });
                return;
            }

            self.selected_group = graph.get_group_on_pos(pos);
            if let Some(group_id) = self.selected_group {
                if self.press_group(graph, ev, pos, group_id, is_double_click) {
                    return;
                }
            }

            if is_double_click && self.config.allow_searchbox {
                self.request(CanvasRequest::SearchBox {
                    screen_pos: ev.pos,
                    graph_pos: pos,
                    from: None,
                });
                return;
            }
        }

        if self.config.allow_dragcanvas {
            self.mode = InteractionMode::PanningCanvas;
        }
    }

    /// Starts a group gesture. Returns false when the press should pan instead.
    fn press_group(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        pos: Vector2,
        group_id: GroupId,
        is_double_click: bool,
    ) -> bool {
        let Some(group) = graph.group(group_id) else {
            return false;
        };
        if hit_test::group_resize_corner(group, pos, self.transform.scale()) {
            graph.before_change();
            self.mode = InteractionMode::ResizingGroup { group: group_id };
            return true;
        }
        if !hit_test::group_header_at(group, pos) {
            return false;
        }
        if is_double_click {
            let title = group.title.clone();
            self.request(CanvasRequest::Prompt {
                target: PromptTarget::GroupTitle(group_id),
                title: "Title".to_string(),
                value: title,
                screen_pos: ev.pos,
            });
            return true;
        }
        let members = graph.nodes_inside_group(group_id);
        graph.before_change();
        self.mode = InteractionMode::MovingGroup {
            group: group_id,
            members,
        };
        true
    }

    fn middle_down(&mut self, graph: &mut Graph, pos: Vector2, node: Option<NodeId>) {
        let can_edit = self.config.can_edit();
        if self.config.middle_click_slot_add_default_node && can_edit && !self.config.live_mode {
            if let Some(request) = node.and_then(|id| default_node_request(graph, id, pos)) {
                self.request(request);
                return;
            }
        }
        if self.config.middle_button_pans && self.config.allow_dragcanvas {
            self.mode = InteractionMode::PanningCanvas;
        }
    }

    fn secondary_down(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        pos: Vector2,
        node: Option<NodeId>,
    ) {
        if !self.config.can_edit() {
            return;
        }
        let target = if let Some(id) = node {
            let keep = !self.selection.is_empty()
                && (self.is_selected(id) || ev.modifiers.additive());
            if !keep {
                self.select_nodes(graph, &[id], false);
            } else if !self.is_selected(id) {
                self.select_nodes(graph, &[id], true);
            }
            ContextTarget::Node(id)
        } else if let Some(link) = hit_test::link_center_at(
            graph,
            pos,
            LINK_CENTER_TOLERANCE,
            self.transform.scale(),
        ) {
            self.over_link_center = None;
            ContextTarget::Link(link)
        } else if let Some(group) = graph.get_group_on_pos(pos) {
            ContextTarget::Group(group)
        } else {
            ContextTarget::Canvas
        };
        self.request(CanvasRequest::ContextMenu {
            target,
            screen_pos: ev.pos,
            graph_pos: pos,
        });
    }
}

/// Request to create a default node wired to the slot under `pos`.
///
/// The new node is placed beside the slot's side of the node: to the right
/// of an output, to the left of an input.
fn default_node_request(graph: &Graph, id: NodeId, pos: Vector2) -> Option<CanvasRequest> {
    let node = graph.node(id)?;
    if node.flags.collapsed {
        return None;
    }
    let bounds = node.bounding();
    let (slot, is_output) = hit_test::slot_at(node, pos, true)
        .map(|slot| (slot, true))
        .or_else(|| hit_test::slot_at(node, pos, false).map(|slot| (slot, false)))?;
    let slot_type = node.slot_type(!is_output, slot)?.to_string();
    let x = if is_output {
        bounds.x + bounds.width + DEFAULT_NODE_GAP
    } else {
        bounds.x - DEFAULT_NODE_GAP - NODE_DEFAULT_SIZE.0
    };
    Some(CanvasRequest::CreateDefaultNodeForSlot {
        anchor: LinkAnchor {
            node: id,
            slot,
            is_output,
            slot_type,
        },
        graph_pos: vec2(x, node.connection_pos(!is_output, slot).y),
    })
}
