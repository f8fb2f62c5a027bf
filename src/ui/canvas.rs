//! Canvas input: egui events in, controller requests out.
//!
//! Raw egui pointer events are converted into [`PointerEvent`]s in
//! canvas-local coordinates and fed to the [`crate::interaction::CanvasController`] in arrival
//! order. Whatever the controller asks for afterwards (menus, prompts, new
//! nodes) is handled here.

use super::dom_overlay::OverlayHost;
use super::state::{EditorApp, MenuKind, PromptState};
use crate::geometry::{vec2, Rect, Vector2};
use crate::interaction::{
    CanvasCursor, CanvasEvent, CanvasRequest, Modifiers, PointerButton, PointerEvent,
};
use crate::widgets::layout::compute_widget_layout;
use crate::widgets::projection::CanvasMetrics;
use crate::types::Node;
use eframe::egui;

fn to_modifiers(m: egui::Modifiers) -> Modifiers {
    Modifiers {
        shift: m.shift,
        ctrl: m.ctrl,
        alt: m.alt,
        meta: m.mac_cmd,
    }
}

fn to_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        _ => None,
    }
}

impl EditorApp {
    /// Draws the canvas and runs its interaction for this frame.
    ///
    /// Pointer input is applied before painting so the frame shows the
    /// result of this frame's gestures.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let rect = response.rect;
        self.canvas_rect = Some(rect);
        self.controller.transform.viewport = Some(Rect::new(
            0.0,
            0.0,
            rect.width() as f64,
            rect.height() as f64,
        ));
        self.controller.set_input_locked(self.prompt.is_some());

        self.layout_widgets();
        self.update_visible_nodes(rect);

        for event in self.collect_pointer_events(ui, rect) {
            self.controller.handle_event(&mut self.graph, &event);
        }
        self.handle_requests(ui.ctx());
        self.handle_canvas_events();

        self.render_canvas(&painter, rect);
        self.sync_dom_widgets(ui.ctx(), rect);

        if response.hovered() {
            ui.ctx().set_cursor_icon(match self.controller.cursor() {
                CanvasCursor::Default => egui::CursorIcon::Default,
                CanvasCursor::Crosshair => egui::CursorIcon::Crosshair,
                CanvasCursor::ResizeSe => egui::CursorIcon::ResizeSouthEast,
            });
        }

        let (fg, bg) = self.controller.take_dirty();
        if fg || bg {
            ui.ctx().request_repaint();
        }
    }

    /// Whether a press at `pos` belongs to something drawn over the canvas.
    fn blocks_pointer(&self, pos: egui::Pos2) -> bool {
        let over_menu = self
            .menu
            .as_ref()
            .and_then(|m| m.rect)
            .is_some_and(|r| r.contains(pos));
        let over_dom = self.dom_host.as_ref().is_some_and(|h| h.covers(pos));
        over_menu || over_dom
    }

    /// Whether a button edge at `pos` may reach the canvas.
    ///
    /// Withheld presses are tracked per button, so releasing one button
    /// never swallows the release of another.
    pub(super) fn admit_button(
        &mut self,
        pos: egui::Pos2,
        button: PointerButton,
        pressed: bool,
    ) -> bool {
        if pressed {
            if self.blocks_pointer(pos) {
                if !self.withheld.contains(&button) {
                    self.withheld.push(button);
                }
                return false;
            }
            return true;
        }
        match self.withheld.iter().position(|b| *b == button) {
            Some(i) => {
                self.withheld.swap_remove(i);
                false
            }
            None => true,
        }
    }

    /// Converts this frame's egui pointer input into controller events.
    ///
    /// A press that lands on a menu or a DOM widget is withheld from the
    /// canvas together with its release.
    fn collect_pointer_events(&mut self, ui: &egui::Ui, rect: egui::Rect) -> Vec<PointerEvent> {
        let local = |p: egui::Pos2| vec2((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);
        ui.input(|i| {
            let now = i.time * 1000.0;
            let mut out = Vec::new();
            for event in &i.events {
                match event {
                    egui::Event::PointerMoved(pos) => out.push(
                        PointerEvent::moved(local(*pos), now)
                            .with_modifiers(to_modifiers(i.modifiers)),
                    ),
                    egui::Event::PointerButton {
                        pos,
                        button,
                        pressed,
                        modifiers,
                    } => {
                        let Some(button) = to_button(*button) else {
                            continue;
                        };
                        if !self.admit_button(*pos, button, *pressed) {
                            continue;
                        }
                        let event = if *pressed {
                            PointerEvent::down(local(*pos), button, now)
                        } else {
                            PointerEvent::up(local(*pos), button, now)
                        };
                        out.push(event.with_modifiers(to_modifiers(*modifiers)));
                    }
                    _ => {}
                }
            }

            let scroll = i.raw_scroll_delta.y;
            if scroll != 0.0 {
                if let Some(pos) = i.pointer.hover_pos().filter(|p| !self.blocks_pointer(*p)) {
                    out.push(PointerEvent::wheel(local(pos), scroll as f64, now));
                }
            }
            out
        })
    }

    /// Re-stacks widget rows and resolves DOM widget heights.
    pub(super) fn layout_widgets(&mut self) {
        for node in self.graph.nodes_mut() {
            if node.widgets.is_empty() {
                continue;
            }
            node.record_widget_rows();
            let Node { widgets, size, .. } = node;
            compute_widget_layout(widgets, size);
        }
    }

    fn update_visible_nodes(&mut self, rect: egui::Rect) {
        let area = self
            .controller
            .transform
            .visible_area(vec2(rect.width() as f64, rect.height() as f64));
        let visible = self
            .graph
            .nodes()
            .iter()
            .filter(|n| n.bounding().overlaps(&area))
            .map(|n| n.id)
            .collect();
        self.controller.set_visible_nodes(Some(visible));
    }

    fn sync_dom_widgets(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let Some(host) = self.dom_host.as_mut() else {
            return;
        };
        host.begin_frame();
        let metrics = CanvasMetrics {
            origin: vec2(rect.min.x as f64, rect.min.y as f64),
            ..CanvasMetrics::default()
        };
        let feedback = self.dom.sync(
            host,
            self.graph.nodes(),
            &self.controller.transform,
            &metrics,
            self.controller.selection(),
        );
        if !feedback.is_empty() {
            self.controller.apply_dom_feedback(&mut self.graph, feedback);
        }
        host.show(ctx);
    }

    fn handle_requests(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time) * 1000.0;
        for request in self.controller.drain_requests() {
            log::debug!("canvas request: {:?}", request);
            match request {
                CanvasRequest::CloseMenus => self.close_menu(),
                CanvasRequest::ContextMenu {
                    target,
                    screen_pos,
                    graph_pos,
                } => self.open_menu(MenuKind::Context(target), screen_pos, graph_pos, now),
                CanvasRequest::LinkMenu { link, screen_pos } => {
                    let graph_pos = self.controller.transform.to_graph(screen_pos);
                    self.open_menu(MenuKind::Link(link), screen_pos, graph_pos, now);
                }
                CanvasRequest::SearchBox {
                    screen_pos,
                    graph_pos,
                    from,
                } => self.open_menu(
                    MenuKind::Search {
                        filter: String::new(),
                        from,
                    },
                    screen_pos,
                    graph_pos,
                    now,
                ),
                CanvasRequest::ConnectionMenu {
                    from,
                    screen_pos,
                    graph_pos,
                } => self.open_menu(MenuKind::Connection(from), screen_pos, graph_pos, now),
                CanvasRequest::OpenSubgraph(id) => {
                    let title = self.graph.node(id).map(|n| n.title.clone()).unwrap_or_default();
                    log::info!("subgraph requested for `{title}`");
                    self.status = format!("Subgraph of \"{title}\" requested");
                }
                CanvasRequest::CreateDefaultNodeForSlot { anchor, graph_pos } => {
                    self.create_default_for_slot(&anchor, graph_pos)
                }
                CanvasRequest::ComboMenu {
                    node,
                    widget,
                    values,
                    screen_pos,
                } => {
                    let graph_pos = self.controller.transform.to_graph(screen_pos);
                    self.open_menu(
                        MenuKind::Combo {
                            node,
                            widget,
                            values,
                        },
                        screen_pos,
                        graph_pos,
                        now,
                    );
                }
                CanvasRequest::Prompt {
                    target,
                    title,
                    value,
                    screen_pos,
                } => {
                    self.close_menu();
                    self.prompt = Some(PromptState {
                        target,
                        title,
                        value,
                        screen_pos: self.local_to_screen(screen_pos),
                    });
                }
            }
        }
    }

    fn handle_canvas_events(&mut self) {
        for event in self.controller.drain_events() {
            match event {
                CanvasEvent::SelectionChanged(ids) => {
                    self.status = match ids.len() {
                        0 => String::new(),
                        1 => "1 node selected".to_string(),
                        n => format!("{n} nodes selected"),
                    };
                }
                CanvasEvent::LinkCreated(id) => log::info!("link {id} created"),
                CanvasEvent::NodeDoubleClicked(id) => {
                    if let Some(node) = self.graph.node(id) {
                        self.status = format!("{} ({})", node.title, node.node_type);
                    }
                }
                other => log::trace!("canvas event: {:?}", other),
            }
        }
    }

    /// Centers the view on the middle of all nodes.
    pub fn fit_view(&mut self) {
        let Some(rect) = self.canvas_rect else {
            return;
        };
        let nodes = self.graph.nodes();
        if nodes.is_empty() {
            self.controller.transform.reset();
            return;
        }
        let sum = nodes
            .iter()
            .fold(Vector2::ZERO, |acc, n| acc + n.bounding().center());
        let center = sum / nodes.len() as f64;
        self.controller
            .transform
            .center_on(center, vec2(rect.width() as f64, rect.height() as f64));
        self.controller.set_dirty(true, true);
    }
}
