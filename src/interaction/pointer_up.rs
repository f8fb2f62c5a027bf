use super::*;
use crate::geometry::Rect;
use crate::hit_test;

impl CanvasController {
    pub(super) fn pointer_up(&mut self, graph: &mut Graph, ev: &PointerEvent) {
        if !ev.is_primary {
            return;
        }
        let graph_pos = self.transform.to_graph(ev.pos);
        self.pointer.last_screen = ev.pos;
        self.pointer.graph_pos = graph_pos;
        self.pointer.captured = false;

        if self.input_locked {
            self.pointer.is_down = false;
            self.pointer.is_double = false;
            return;
        }

        let click_ms = ev.time_ms - self.pointer.press_ms;
        match ev.button {
            PointerButton::Primary => self.primary_up(graph, ev, graph_pos, click_ms),
            PointerButton::Middle | PointerButton::Secondary => {
                if matches!(self.mode, InteractionMode::PanningCanvas) {
                    self.mode = InteractionMode::Idle;
                }
            }
        }

        self.pointer.is_down = false;
        self.pointer.is_double = false;
        self.set_dirty(true, true);
        graph.change();
        self.emit(CanvasEvent::MouseUp {
            pos: graph_pos,
            button: ev.button,
        });
    }

    fn primary_up(&mut self, graph: &mut Graph, ev: &PointerEvent, pos: Vector2, click_ms: f64) {
        if let Some(capture) = self.widget_capture.take() {
            self.route_widget(graph, capture, WidgetPointer::Up { click_ms }, ev.pos);
            graph.after_change();
        }
        self.selected_group = None;

        match std::mem::take(&mut self.mode) {
            InteractionMode::RectSelecting { anchor, current } => {
                self.finish_rect_select(graph, anchor, current, ev.modifiers)
            }
            InteractionMode::ConnectingLink(pending) => {
                self.finish_link(graph, ev, pos, pending);
                graph.after_change();
            }
            InteractionMode::ResizingNode { node } => {
                graph.after_change();
                self.emit(CanvasEvent::NodeResized(node));
            }
            InteractionMode::DraggingNodes { node } => self.finish_drag(graph, node, pos, click_ms),
            InteractionMode::MovingGroup { group, members } => {
                // snap the group to whole units and carry its members along
                if let Some(g) = graph.group_mut(group) {
                    let before = g.pos;
                    g.pos = g.pos.round();
                    let shift = g.pos - before;
                    if !ev.modifiers.ctrl {
                        for id in members {
                            if let Some(n) = graph.node_mut(id) {
                                n.pos += shift;
                            }
                        }
                    }
                }
                graph.after_change();
            }
            InteractionMode::ResizingGroup { group } => {
                if let Some(g) = graph.group_mut(group) {
                    let size = g.size.round();
                    g.resize_to(size);
                }
                graph.after_change();
            }
            InteractionMode::Idle | InteractionMode::PanningCanvas => {
                let over = self.node_at(graph, pos, 0.0);
                if over.is_none() && click_ms < self.config.double_click_ms {
                    self.deselect_all(graph);
                }
                if let Some(id) = self.node_over {
                    let local = graph.node(id).map(|n| pos - n.pos).unwrap_or_default();
                    self.with_behavior(graph, id, |b, n| b.on_mouse_up(n, local));
                }
            }
        }
    }

    fn finish_rect_select(
        &mut self,
        graph: &mut Graph,
        anchor: Vector2,
        current: Vector2,
        modifiers: Modifiers,
    ) {
        let rect = Rect::new(anchor.x, anchor.y, current.x - anchor.x, current.y - anchor.y)
            .normalized();
        let threshold = self.config.rect_select_threshold;
        let degenerate = rect.width <= threshold && rect.height <= threshold;

        match self.node_at(graph, anchor, 0.0) {
            // a tiny drag over a node is a click on that node
            Some(id) if degenerate => {
                self.select_nodes(graph, &[id], modifiers.shift || modifiers.ctrl)
            }
            _ => {
                let hits: Vec<NodeId> = graph
                    .nodes()
                    .iter()
                    .filter(|n| n.bounding().overlaps(&rect))
                    .map(|n| n.id)
                    .collect();
                if !hits.is_empty() {
                    self.select_nodes(graph, &hits, modifiers.shift);
                }
            }
        }
    }

    fn finish_link(
        &mut self,
        graph: &mut Graph,
        ev: &PointerEvent,
        pos: Vector2,
        pending: PendingLink,
    ) {
        let anchor = pending.anchor;
        let Some(target) = self.node_at(graph, pos, 0.0) else {
            self.drop_link_on_empty(ev, pos, anchor);
            return;
        };
        let Some(node) = graph.node(target) else {
            return;
        };

        let result = if anchor.is_output {
            match hit_test::slot_at(node, pos, false) {
                Some(slot) => graph.connect(anchor.node, anchor.slot, target, slot),
                None => graph.connect_by_type_input(anchor.node, anchor.slot, target),
            }
        } else {
            match hit_test::slot_at(node, pos, true) {
                Some(slot) => graph.connect(target, slot, anchor.node, anchor.slot),
                None => graph.connect_by_type_output(anchor.node, anchor.slot, target),
            }
        };

        match result {
            Ok(link) => self.emit(CanvasEvent::LinkCreated(link)),
            Err(err) => log::debug!("link drop ignored: {}", err),
        }
    }

    fn drop_link_on_empty(&mut self, ev: &PointerEvent, pos: Vector2, anchor: LinkAnchor) {
        if !self.config.release_link_on_empty_shows_menu {
            return;
        }
        if ev.modifiers.shift && self.config.allow_searchbox {
            self.request(CanvasRequest::SearchBox {
                screen_pos: ev.pos,
                graph_pos: pos,
                from: Some(anchor),
            });
        } else {
            self.request(CanvasRequest::ConnectionMenu {
                from: anchor,
                screen_pos: ev.pos,
                graph_pos: pos,
            });
        }
    }

    fn finish_drag(&mut self, graph: &mut Graph, pressed: NodeId, pos: Vector2, click_ms: f64) {
        let quick = click_ms < self.config.double_click_ms;
        if quick
            && graph
                .node(pressed)
                .is_some_and(|n| hit_test::collapse_box_at(n, pos))
        {
            self.toggle_collapse(graph, pressed);
        }

        let grid = self.config.align_to_grid.then_some(self.config.grid_size);
        let dragged = self.selection.clone();
        for id in &dragged {
            if let Some(node) = graph.node_mut(*id) {
                node.pos = match grid {
                    Some(size) => (node.pos / size).round() * size,
                    None => node.pos.round(),
                };
            }
        }
        graph.after_change();
        for id in dragged {
            self.emit(CanvasEvent::NodeMoved(id));
        }
    }
}
