use super::*;
use crate::graph::is_valid_connection;
use crate::hit_test;
use crate::widgets::layout::compute_widget_layout;

impl CanvasController {
    pub(super) fn pointer_move(&mut self, graph: &mut Graph, ev: &PointerEvent) {
        let graph_pos = self.transform.to_graph(ev.pos);
        let screen_delta = ev.pos - self.pointer.last_screen;
        let delta = screen_delta / self.transform.scale();
        self.pointer.last_screen = ev.pos;
        self.pointer.graph_pos = graph_pos;

        if self.input_locked {
            return;
        }

        if let Some(capture) = self.widget_capture {
            self.route_widget(
                graph,
                capture,
                WidgetPointer::Move { delta_x: delta.x },
                ev.pos,
            );
        }

        let can_edit = self.config.can_edit();
        let live = self.config.live_mode;
        let mut mode = std::mem::take(&mut self.mode);
        match &mut mode {
            InteractionMode::Idle => {}
            InteractionMode::RectSelecting { current, .. } => {
                *current = graph_pos;
                self.set_dirty(true, false);
            }
            InteractionMode::PanningCanvas => {
                self.transform.pan_by(screen_delta);
                self.set_dirty(true, true);
            }
            InteractionMode::MovingGroup { group, members } if can_edit => {
                if let Some(g) = graph.group_mut(*group) {
                    g.pos += delta;
                }
                if !ev.modifiers.ctrl {
                    for id in members.iter() {
                        if let Some(n) = graph.node_mut(*id) {
                            n.pos += delta;
                        }
                    }
                }
                self.set_dirty(true, true);
            }
            InteractionMode::ResizingGroup { group } if can_edit => {
                if let Some(g) = graph.group_mut(*group) {
                    let size = graph_pos - g.pos;
                    g.resize_to(size);
                }
                self.set_dirty(true, true);
            }
            InteractionMode::ConnectingLink(pending) => {
                pending.pointer = graph_pos;
                pending.highlight = self.link_drop_target(graph, pending, graph_pos);
                self.set_dirty(true, false);
            }
            InteractionMode::DraggingNodes { .. } if !live => {
                for id in self.selection.iter() {
                    if let Some(n) = graph.node_mut(*id) {
                        n.pos += delta;
                    }
                }
                self.set_dirty(true, true);
            }
            InteractionMode::ResizingNode { node } if !live => {
                let id = *node;
                if let Some(n) = graph.node_mut(id) {
                    let min = n.compute_min_size();
                    n.size = (graph_pos - n.pos).max(min);
                    let Node { widgets, size, .. } = n;
                    compute_widget_layout(widgets, size);
                }
                self.with_behavior(graph, id, |b, n| b.on_resize(n));
                self.emit(CanvasEvent::NodeResized(id));
                self.cursor = CanvasCursor::ResizeSe;
                self.set_dirty(true, true);
            }
            _ => {}
        }
        self.mode = mode;

        if can_edit {
            self.update_hover(graph, graph_pos);
        }
        self.update_cursor(graph, graph_pos);
    }

    /// Compatible slot under the pointer while dragging a link.
    fn link_drop_target(
        &self,
        graph: &Graph,
        pending: &PendingLink,
        pos: Vector2,
    ) -> Option<(NodeId, usize)> {
        let id = self.node_at(graph, pos, 0.0)?;
        let node = graph.node(id)?;
        if hit_test::collapse_box_at(node, pos) {
            return pending.highlight;
        }
        let anchor = &pending.anchor;
        // dragging from an output looks for inputs and vice versa
        let slot = hit_test::slot_at(node, pos, !anchor.is_output)?;
        let candidate = node.slot_type(anchor.is_output, slot)?;
        let compatible = if anchor.is_output {
            is_valid_connection(&anchor.slot_type, candidate)
        } else {
            is_valid_connection(candidate, &anchor.slot_type)
        };
        (compatible && id != anchor.node).then_some((id, slot))
    }

    fn update_hover(&mut self, graph: &mut Graph, pos: Vector2) {
        let over = self.node_at(graph, pos, 0.0);
        if over != self.node_over {
            let previous = self.node_over.take();
            if let Some(old) = previous {
                self.with_behavior(graph, old, |b, n| b.on_mouse_leave(n));
                self.emit(CanvasEvent::NodeLeave(old));
            }
            if let Some(new) = over {
                self.with_behavior(graph, new, |b, n| b.on_mouse_enter(n));
                self.emit(CanvasEvent::NodeEnter(new));
            }
            self.node_over = over;
            self.emit(CanvasEvent::HoverChanged {
                current: over,
                previous,
            });
            self.set_dirty(true, false);
        }
        if let Some(id) = over {
            let local = graph.node(id).map(|n| pos - n.pos).unwrap_or_default();
            self.with_behavior(graph, id, |b, n| b.on_mouse_move(n, local));
        }
    }

    fn update_cursor(&mut self, graph: &Graph, pos: Vector2) {
        if matches!(self.mode, InteractionMode::ResizingNode { .. }) {
            return;
        }
        match self.node_over.and_then(|id| graph.node(id)) {
            Some(node) => {
                self.cursor = if hit_test::resize_handle_at(node, pos) {
                    CanvasCursor::ResizeSe
                } else {
                    CanvasCursor::Crosshair
                };
            }
            None => {
                self.cursor = CanvasCursor::Default;
                if self.mode.is_idle() && self.config.can_edit() {
                    let over = hit_test::link_center_at(
                        graph,
                        pos,
                        crate::constants::LINK_CENTER_TOLERANCE,
                        self.transform.scale(),
                    );
                    if over != self.over_link_center {
                        self.over_link_center = over;
                        self.set_dirty(true, false);
                    }
                }
            }
        }
    }
}
