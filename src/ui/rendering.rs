//! Painting the graph: grid, groups, links, nodes and their widgets.
//!
//! Everything is painted back to front in one pass per frame. Node order in
//! the graph is render order, so the last node is drawn on top.

use super::state::EditorApp;
use crate::constants::*;
use crate::geometry::{vec2, Rect, Vector2};
use crate::hit_test;
use crate::interaction::{InteractionMode, PendingLink};
use crate::types::{Group, Link, Node, NodeMode};
use crate::widgets::{CanvasWidget, CanvasWidgetKind, Widget};
use eframe::egui;
use eframe::epaint::{CubicBezierShape, StrokeKind};

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(100, 150, 255);
const HIGHLIGHT_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 200, 80);

/// Stroke color for a link of the given type.
fn link_color(link_type: &str) -> egui::Color32 {
    match link_type {
        "number" => egui::Color32::from_rgb(120, 170, 220),
        "string" => egui::Color32::from_rgb(130, 200, 120),
        "boolean" => egui::Color32::from_rgb(220, 140, 90),
        _ => egui::Color32::from_gray(170),
    }
}

struct Palette {
    node_body: egui::Color32,
    node_title: egui::Color32,
    text: egui::Color32,
    widget_bg: egui::Color32,
    outline: egui::Color32,
}

impl Palette {
    fn new(dark: bool) -> Self {
        if dark {
            Self {
                node_body: egui::Color32::from_gray(53),
                node_title: egui::Color32::from_gray(34),
                text: egui::Color32::from_gray(220),
                widget_bg: egui::Color32::from_gray(30),
                outline: egui::Color32::from_gray(90),
            }
        } else {
            Self {
                node_body: egui::Color32::from_gray(235),
                node_title: egui::Color32::from_gray(200),
                text: egui::Color32::from_gray(30),
                widget_bg: egui::Color32::from_gray(250),
                outline: egui::Color32::from_gray(150),
            }
        }
    }
}

impl EditorApp {
    fn screen_rect_of(&self, rect: &Rect) -> egui::Rect {
        egui::Rect::from_min_max(
            self.graph_to_screen(rect.min()),
            self.graph_to_screen(rect.max()),
        )
    }

    fn zoom(&self) -> f32 {
        self.controller.transform.scale() as f32
    }

    /// Paints everything on the canvas, back to front.
    pub fn render_canvas(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let palette = Palette::new(self.prefs.dark_mode);
        if self.prefs.show_grid {
            self.draw_grid(painter, canvas_rect);
        }
        for group in self.graph.groups() {
            self.draw_group(painter, group, &palette);
        }
        for link in self.graph.links() {
            self.draw_link(painter, link);
        }
        if let InteractionMode::ConnectingLink(pending) = self.controller.mode() {
            self.draw_pending_link(painter, pending);
        }
        for node in self.graph.nodes() {
            self.draw_node(painter, node, &palette);
        }
        if let Some(rect) = self.controller.mode().selection_rect() {
            let rect = self.screen_rect_of(&rect);
            painter.rect_filled(
                rect,
                0.0,
                egui::Color32::from_rgba_unmultiplied(100, 150, 255, 40),
            );
            painter.rect_stroke(
                rect,
                0.0,
                egui::Stroke::new(1.5, SELECTION_COLOR),
                StrokeKind::Inside,
            );
        }
    }

    /// Grid lines every [`GRID_SIZE`] graph units, skipped when too dense.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let scale = self.controller.transform.scale();
        if GRID_SIZE * scale < MIN_GRID_SPACING_PX {
            return;
        }
        let line = egui::Color32::from_rgba_unmultiplied(128, 128, 128, 32);
        let stroke = egui::Stroke::new(1.0, line);
        let area = self.controller.transform.visible_area(vec2(
            canvas_rect.width() as f64,
            canvas_rect.height() as f64,
        ));

        let mut x = (area.x / GRID_SIZE).floor() * GRID_SIZE;
        while x <= area.x + area.width {
            let sx = self.graph_to_screen(vec2(x, 0.0)).x;
            painter.line_segment(
                [
                    egui::pos2(sx, canvas_rect.min.y),
                    egui::pos2(sx, canvas_rect.max.y),
                ],
                stroke,
            );
            x += GRID_SIZE;
        }
        let mut y = (area.y / GRID_SIZE).floor() * GRID_SIZE;
        while y <= area.y + area.height {
            let sy = self.graph_to_screen(vec2(0.0, y)).y;
            painter.line_segment(
                [
                    egui::pos2(canvas_rect.min.x, sy),
                    egui::pos2(canvas_rect.max.x, sy),
                ],
                stroke,
            );
            y += GRID_SIZE;
        }
    }

    fn draw_group(&self, painter: &egui::Painter, group: &Group, palette: &Palette) {
        let [r, g, b] = group.color;
        let selected = self.controller.selected_group() == Some(group.id);
        let rect = self.screen_rect_of(&group.bounding());
        let fill = egui::Color32::from_rgba_unmultiplied(r, g, b, 40);
        let stroke_color = if selected {
            SELECTION_COLOR
        } else {
            egui::Color32::from_rgba_unmultiplied(r, g, b, 160)
        };
        painter.rect_filled(rect, GROUP_CORNER_RADIUS, fill);
        painter.rect_stroke(
            rect,
            GROUP_CORNER_RADIUS,
            egui::Stroke::new(1.5, stroke_color),
            StrokeKind::Inside,
        );

        let header = self.screen_rect_of(&group.header_rect());
        painter.rect_filled(header, 0.0, egui::Color32::from_rgba_unmultiplied(r, g, b, 60));
        let font = egui::FontId::proportional((group.font_size as f32 * self.zoom()).max(6.0));
        painter.text(
            header.left_center() + egui::vec2(6.0 * self.zoom(), 0.0),
            egui::Align2::LEFT_CENTER,
            &group.title,
            font,
            palette.text,
        );

        // resize grip
        let corner = rect.max;
        let grip = GROUP_RESIZE_DISTANCE as f32;
        painter.line_segment(
            [corner - egui::vec2(grip, 0.0), corner - egui::vec2(0.0, grip)],
            egui::Stroke::new(1.0, stroke_color),
        );
    }

    fn bezier(&self, start: Vector2, end: Vector2, stroke: egui::Stroke) -> CubicBezierShape {
        let points = hit_test::link_control_points(start, end).map(|p| self.graph_to_screen(p));
        CubicBezierShape::from_points_stroke(points, false, egui::Color32::TRANSPARENT, stroke)
    }

    fn draw_link(&self, painter: &egui::Painter, link: &Link) {
        let Some((start, end)) = hit_test::link_endpoints(&self.graph, link) else {
            return;
        };
        let stroke = egui::Stroke::new(LINK_WIDTH * self.zoom(), link_color(&link.link_type));
        painter.add(self.bezier(start, end, stroke));

        if let Some(mid) = hit_test::link_midpoint(&self.graph, link) {
            let hovered = self.controller.over_link_center() == Some(link.id);
            let radius = if hovered { 6.0 } else { 4.0 } * self.zoom();
            let color = if hovered {
                HIGHLIGHT_COLOR
            } else {
                link_color(&link.link_type)
            };
            painter.circle_filled(self.graph_to_screen(mid), radius, color);
        }
    }

    fn draw_pending_link(&self, painter: &egui::Painter, pending: &PendingLink) {
        let stroke = egui::Stroke::new(
            LINK_WIDTH * self.zoom(),
            link_color(&pending.anchor.slot_type),
        );
        // curves always run output to input
        let (start, end) = if pending.anchor.is_output {
            (pending.start, pending.pointer)
        } else {
            (pending.pointer, pending.start)
        };
        painter.add(self.bezier(start, end, stroke));
    }

    fn draw_node(&self, painter: &egui::Painter, node: &Node, palette: &Palette) {
        let zoom = self.zoom();
        let selected = self.controller.is_selected(node.id);
        let alpha = match node.mode {
            NodeMode::Never | NodeMode::OnRequest => 0.4,
            NodeMode::Bypass => 0.7,
            _ => 1.0,
        };
        let body = self.screen_rect_of(&node.bounding());
        let title = self.screen_rect_of(&node.title_rect());
        let radius = NODE_CORNER_RADIUS * zoom;

        painter.rect_filled(body, radius, palette.node_body.gamma_multiply(alpha));
        painter.rect_filled(
            title,
            egui::CornerRadius {
                nw: radius as u8,
                ne: radius as u8,
                sw: 0,
                se: 0,
            },
            palette.node_title.gamma_multiply(alpha),
        );
        let outline = if selected {
            egui::Stroke::new(2.0, SELECTION_COLOR)
        } else if self.controller.node_over() == Some(node.id) {
            egui::Stroke::new(1.0, palette.text)
        } else {
            egui::Stroke::new(1.0, palette.outline)
        };
        painter.rect_stroke(body, radius, outline, StrokeKind::Outside);

        // collapse box
        let box_center =
            title.left_center() + egui::vec2(NODE_TITLE_HEIGHT as f32 * 0.5 * zoom, 0.0);
        let box_size = egui::vec2(10.0, 10.0) * zoom;
        let marker = egui::Rect::from_center_size(box_center, box_size);
        if node.flags.collapsed {
            let stroke = egui::Stroke::new(1.0, palette.text);
            painter.rect_stroke(marker, 0.0, stroke, StrokeKind::Inside);
        } else {
            painter.rect_filled(marker, 0.0, palette.text);
        }

        let font = egui::FontId::proportional((14.0 * zoom).max(4.0));
        painter.text(
            title.left_center() + egui::vec2(NODE_TITLE_HEIGHT as f32 * zoom, 0.0),
            egui::Align2::LEFT_CENTER,
            &node.title,
            font.clone(),
            palette.text.gamma_multiply(alpha),
        );
        if node.has_subgraph && !node.flags.collapsed {
            painter.text(
                title.right_center() - egui::vec2(NODE_TITLE_HEIGHT as f32 * 0.5 * zoom, 0.0),
                egui::Align2::CENTER_CENTER,
                "⧉",
                font,
                palette.text,
            );
        }

        self.draw_slots(painter, node, palette);
        if node.flags.collapsed {
            return;
        }
        for widget in &node.widgets {
            if let Widget::Canvas(w) = widget {
                self.draw_canvas_widget(painter, node, w, palette, alpha);
            }
        }
        if node.resizable {
            let corner = body.max;
            let handle = RESIZE_HANDLE_SIZE as f32 * zoom * 0.6;
            painter.line_segment(
                [corner - egui::vec2(handle, 2.0), corner - egui::vec2(2.0, handle)],
                egui::Stroke::new(1.0, palette.outline),
            );
        }
    }

    fn draw_slots(&self, painter: &egui::Painter, node: &Node, palette: &Palette) {
        let zoom = self.zoom();
        let highlight = match self.controller.mode() {
            InteractionMode::ConnectingLink(pending) => pending.highlight,
            _ => None,
        };
        let font = egui::FontId::proportional((12.0 * zoom).max(4.0));
        let dot = SLOT_DOT_RADIUS * zoom;

        for (i, slot) in node.inputs.iter().enumerate() {
            let center = self.graph_to_screen(node.connection_pos(true, i));
            let lit = highlight == Some((node.id, i));
            let color = if lit { HIGHLIGHT_COLOR } else { link_color(&slot.slot_type) };
            if slot.link.is_some() || lit {
                painter.circle_filled(center, dot, color);
            } else {
                painter.circle_stroke(center, dot, egui::Stroke::new(1.5, color));
            }
            if !node.flags.collapsed {
                painter.text(
                    center + egui::vec2(dot * 2.5, 0.0),
                    egui::Align2::LEFT_CENTER,
                    &slot.name,
                    font.clone(),
                    palette.text,
                );
            }
        }
        for (i, slot) in node.outputs.iter().enumerate() {
            let center = self.graph_to_screen(node.connection_pos(false, i));
            let color = link_color(&slot.slot_type);
            if slot.links.is_empty() {
                painter.circle_stroke(center, dot, egui::Stroke::new(1.5, color));
            } else {
                painter.circle_filled(center, dot, color);
            }
            if !node.flags.collapsed {
                painter.text(
                    center - egui::vec2(dot * 2.5, 0.0),
                    egui::Align2::RIGHT_CENTER,
                    &slot.name,
                    font.clone(),
                    palette.text,
                );
            }
        }
    }

    fn draw_canvas_widget(
        &self,
        painter: &egui::Painter,
        node: &Node,
        widget: &CanvasWidget,
        palette: &Palette,
        alpha: f32,
    ) {
        let Some(top) = widget.y.or(widget.last_y) else {
            return;
        };
        let zoom = self.zoom();
        let row = Rect::new(
            node.pos.x + WIDGET_MARGIN_X,
            node.pos.y + top,
            node.size.x - WIDGET_MARGIN_X * 2.0,
            widget.height(),
        );
        let rect = self.screen_rect_of(&row);
        let alpha = if widget.disabled { alpha * 0.5 } else { alpha };
        let fill = if widget.clicked {
            SELECTION_COLOR.gamma_multiply(0.6)
        } else {
            palette.widget_bg
        };
        let rounding = rect.height() * 0.5;
        painter.rect_filled(rect, rounding, fill.gamma_multiply(alpha));
        painter.rect_stroke(
            rect,
            rounding,
            egui::Stroke::new(1.0, palette.outline),
            StrokeKind::Inside,
        );

        let font = egui::FontId::proportional((12.0 * zoom).max(4.0));
        let text = palette.text.gamma_multiply(alpha);
        let pad = egui::vec2(8.0 * zoom, 0.0);
        match &widget.kind {
            CanvasWidgetKind::Button => {
                painter.text(rect.center(), egui::Align2::CENTER_CENTER, &widget.name, font, text);
            }
            CanvasWidgetKind::Slider { min, max } => {
                let value = widget.value.as_f64().unwrap_or(*min);
                let span = (max - min).max(f64::EPSILON);
                let t = ((value - min) / span).clamp(0.0, 1.0) as f32;
                let filled = egui::Rect::from_min_max(
                    rect.min,
                    egui::pos2(rect.min.x + rect.width() * t, rect.max.y),
                );
                painter.rect_filled(filled, rounding, SELECTION_COLOR.gamma_multiply(0.5 * alpha));
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    format!("{}  {}", widget.name, widget.value_text()),
                    font,
                    text,
                );
            }
            CanvasWidgetKind::Number { .. } | CanvasWidgetKind::Combo { .. } => {
                let left = rect.left_center() + pad;
                let right = rect.right_center() - pad;
                painter.text(left, egui::Align2::LEFT_CENTER, "◀", font.clone(), text);
                painter.text(right, egui::Align2::RIGHT_CENTER, "▶", font.clone(), text);
                painter.text(
                    rect.left_center() + pad * 3.0,
                    egui::Align2::LEFT_CENTER,
                    &widget.name,
                    font.clone(),
                    text,
                );
                painter.text(
                    rect.right_center() - pad * 3.0,
                    egui::Align2::RIGHT_CENTER,
                    widget.value_text(),
                    font,
                    text,
                );
            }
            CanvasWidgetKind::Toggle | CanvasWidgetKind::Text => {
                painter.text(
                    rect.left_center() + pad,
                    egui::Align2::LEFT_CENTER,
                    &widget.name,
                    font.clone(),
                    text,
                );
                if matches!(widget.kind, CanvasWidgetKind::Toggle) {
                    let on = widget.value.as_bool().unwrap_or(false);
                    let knob = rect.right_center() - pad * 1.5;
                    let r = rect.height() * 0.3;
                    if on {
                        painter.circle_filled(knob, r, SELECTION_COLOR);
                    } else {
                        painter.circle_stroke(knob, r, egui::Stroke::new(1.0, text));
                    }
                } else {
                    painter.text(
                        rect.right_center() - pad,
                        egui::Align2::RIGHT_CENTER,
                        widget.value_text(),
                        font,
                        text,
                    );
                }
            }
        }
    }
}
