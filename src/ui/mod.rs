//! egui front end for the node canvas.
//!
//! # Module Organization
//!
//! - `state` - [`EditorApp`] and the persisted [`ViewPrefs`]
//! - `canvas` - egui input to controller events, request handling
//! - `rendering` - painting groups, links, nodes and widgets
//! - `menus` - popups and the text prompt
//! - `dom_overlay` - egui-drawn stand-ins for DOM widget elements

mod canvas;
mod dom_overlay;
mod menus;
mod rendering;
mod state;


pub use dom_overlay::{EguiDomHost, OverlayHost};
pub use menus::MenuAction;
pub use state::{EditorApp, MenuKind, ViewPrefs, PREFS_KEY};

use crate::demo::{self, TemplateKind};
use crate::geometry::vec2;
use eframe::egui;

impl eframe::App for EditorApp {
    /// Persists view preferences and the canvas config.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        self.prefs.config = self.controller.config.clone();
        match self.prefs.to_json() {
            Ok(json) => storage.set_string(PREFS_KEY, json),
            Err(err) => log::error!("failed to serialize preferences: {err}"),
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.prefs.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });
        self.show(ctx);
    }
}

impl EditorApp {
    /// Runs one frame of the editor: shortcuts, toolbar, canvas and popups.
    pub fn show(&mut self, ctx: &egui::Context) {
        self.handle_history_keys(ctx);
        self.handle_delete_key(ctx);
        self.run_deferred(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        self.show_menu(ctx);
        self.show_prompt(ctx);
    }

    /// Undoes the last graph change.
    pub fn perform_undo(&mut self) {
        if self.graph.undo() {
            self.controller.forget_missing(&self.graph);
            self.controller.set_dirty(true, true);
        }
    }

    /// Redoes the last undone graph change.
    pub fn perform_redo(&mut self) {
        if self.graph.redo() {
            self.controller.forget_missing(&self.graph);
            self.controller.set_dirty(true, true);
        }
    }

    fn handle_history_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() || self.prompt.is_some() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Z) && i.modifiers.command && !i.modifiers.shift) {
            self.perform_undo();
        } else if ctx.input(|i| {
            (i.key_pressed(egui::Key::Z) && i.modifiers.command && i.modifiers.shift)
                || (i.key_pressed(egui::Key::Y) && i.modifiers.command)
        }) {
            self.perform_redo();
        }
    }

    fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() || !self.controller.config.can_edit() {
            return;
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            self.delete_selection();
        }
    }

    fn add_template_at_view_center(&mut self, kind: TemplateKind) {
        let size = self
            .canvas_rect
            .map(|r| vec2(r.width() as f64, r.height() as f64))
            .unwrap_or_default();
        let center = self.controller.transform.visible_area(size).center();
        self.create_node(kind, center, None);
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let can_undo = self.graph.can_undo();
            let can_redo = self.graph.can_redo();
            if ui
                .add_enabled_ui(can_undo, |ui| ui.button("⟲ Undo"))
                .inner
                .clicked()
            {
                self.perform_undo();
            }
            if ui
                .add_enabled_ui(can_redo, |ui| ui.button("⟳ Redo"))
                .inner
                .clicked()
            {
                self.perform_redo();
            }
            ui.separator();

            ui.menu_button("➕ Node", |ui| {
                for template in demo::all_templates() {
                    if ui.button(template.name).clicked() {
                        self.add_template_at_view_center(template.kind);
                        ui.close();
                    }
                }
            });
            ui.separator();

            if ui.button("Reset view").clicked() {
                self.controller.transform.reset();
                self.controller.set_dirty(true, true);
            }
            if ui.button("Fit").clicked() {
                self.fit_view();
            }
            ui.label(format!(
                "{:.0}%",
                self.controller.transform.scale() * 100.0
            ));
            ui.separator();

            ui.checkbox(&mut self.prefs.show_grid, "Grid");
            let mut config = self.controller.config.clone();
            ui.checkbox(&mut config.align_to_grid, "Snap");
            ui.menu_button("Options", |ui| {
                ui.checkbox(&mut config.read_only, "Read only");
                ui.checkbox(&mut config.live_mode, "Live mode");
                ui.checkbox(&mut config.allow_dragnodes, "Drag nodes");
                ui.checkbox(&mut config.allow_dragcanvas, "Drag canvas");
                ui.checkbox(&mut config.allow_reconnect_links, "Reconnect links");
                ui.checkbox(&mut config.click_do_break_link_to, "Click breaks input link");
                ui.checkbox(&mut config.alt_drag_do_clone_nodes, "Alt-drag clones");
                ui.checkbox(&mut config.release_link_on_empty_shows_menu, "Menu on link drop");
                ui.checkbox(
                    &mut config.middle_click_slot_add_default_node,
                    "Middle-click adds node",
                );
            });
            if config != self.controller.config {
                self.controller.set_config(config);
            }

            let theme = if self.prefs.dark_mode { "☀ Light" } else { "🌙 Dark" };
            if ui.button(theme).clicked() {
                self.prefs.dark_mode = !self.prefs.dark_mode;
            }

            if !self.status.is_empty() {
                ui.separator();
                ui.label(&self.status);
            }
        });
    }
}
