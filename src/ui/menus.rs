//! Popups opened by the canvas: context, link, connection, combo and search
//! menus, plus the modal text prompt.
//!
//! A popup ignores clicks for [`MENU_POINTER_GUARD_MS`] after opening, so
//! the release of the click that opened it cannot pick an entry. Once its
//! size is known it is nudged back inside the window on the next frame.

use super::state::{DeferredTask, EditorApp, MenuKind, OpenMenu};
use crate::constants::{CLONE_OFFSET, MENU_ESTIMATED_SIZE, MENU_POINTER_GUARD_MS};
use crate::deferred::CancellationToken;
use crate::demo::{self, TemplateInfo, TemplateKind};
use crate::geometry::{vec2, Rect, Vector2};
use crate::interaction::{ContextTarget, LinkAnchor, PromptTarget};
use crate::types::{Group, GroupId, LinkId, Node, NodeId, NodeMode};
use eframe::egui;

/// Something picked from a popup.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    /// Create a node from a template, wired to the menu's link end if any
    Create(TemplateKind),
    /// Create an empty group at the menu position
    CreateGroup,
    /// Reset pan and zoom
    ResetView,
    /// Collapse or expand a node
    ToggleCollapse(NodeId),
    /// Pin or unpin a node
    TogglePin(NodeId),
    /// Change a node's mode
    SetMode(NodeId, NodeMode),
    /// Duplicate a node
    CloneNode(NodeId),
    /// Delete a node
    RemoveNode(NodeId),
    /// Delete a link
    RemoveLink(LinkId),
    /// Ask for a new group title
    RenameGroup(GroupId),
    /// Delete a group, keeping its nodes
    RemoveGroup(GroupId),
    /// Set a combo widget to one of its values
    PickCombo {
        /// Owner node
        node: NodeId,
        /// Widget index
        widget: usize,
        /// Chosen value
        value: String,
    },
    /// Replace the connection menu with a type-filtered search box
    OpenSearch(LinkAnchor),
    /// Close without doing anything
    Dismiss,
}

fn template_buttons(
    ui: &mut egui::Ui,
    templates: &[&'static TemplateInfo],
    action: &mut Option<MenuAction>,
) {
    for template in templates {
        if ui.button(template.name).clicked() {
            *action = Some(MenuAction::Create(template.kind));
        }
    }
}

impl EditorApp {
    /// Opens a popup at a canvas-local position, replacing any open one.
    pub fn open_menu(&mut self, kind: MenuKind, local: Vector2, graph_pos: Vector2, now_ms: f64) {
        self.close_menu();
        let token = CancellationToken::new();
        self.deferred.schedule_at(
            now_ms + MENU_POINTER_GUARD_MS,
            DeferredTask::AcceptMenuPointer,
            &token,
        );
        self.deferred
            .schedule_next_frame(DeferredTask::RepositionMenu, &token);
        self.menu = Some(OpenMenu {
            kind,
            screen_pos: self.local_to_screen(local),
            graph_pos,
            accepts_pointer: false,
            rect: None,
            token,
        });
    }

    /// Closes the open popup and cancels its pending work.
    pub fn close_menu(&mut self) {
        if let Some(menu) = self.menu.take() {
            menu.token.cancel();
        }
    }

    /// Runs deferred tasks that are due.
    pub fn run_deferred(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time) * 1000.0;
        for task in self.deferred.run_due(now) {
            match task {
                DeferredTask::AcceptMenuPointer => {
                    if let Some(menu) = self.menu.as_mut() {
                        menu.accepts_pointer = true;
                    }
                }
                DeferredTask::RepositionMenu => {
                    let bounds = ctx.input(|i| i.screen_rect());
                    self.reposition_menu(bounds);
                }
            }
        }
        if !self.deferred.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        }
    }

    /// Moves the popup so it fits inside `bounds`.
    pub fn reposition_menu(&mut self, bounds: egui::Rect) {
        let Some(menu) = self.menu.as_mut() else {
            return;
        };
        let size = menu
            .rect
            .map(|r| r.size())
            .unwrap_or(egui::vec2(MENU_ESTIMATED_SIZE.0, MENU_ESTIMATED_SIZE.1));
        let max = (bounds.max - size).max(bounds.min);
        menu.screen_pos = egui::pos2(
            menu.screen_pos.x.clamp(bounds.min.x, max.x),
            menu.screen_pos.y.clamp(bounds.min.y, max.y),
        );
    }

    /// Adds a node from a template, optionally wiring it to a dragged link end.
    pub fn create_node(
        &mut self,
        kind: TemplateKind,
        pos: Vector2,
        from: Option<&LinkAnchor>,
    ) -> NodeId {
        self.graph.before_change();
        let id = self.graph.add_node(demo::build_node(kind, pos));
        if let Some(anchor) = from {
            let linked = if anchor.is_output {
                self.graph.connect_by_type_input(anchor.node, anchor.slot, id)
            } else {
                self.graph.connect_by_type_output(anchor.node, anchor.slot, id)
            };
            if let Err(err) = linked {
                log::warn!("new node left unconnected: {err}");
            }
        }
        self.graph.after_change();
        self.controller.select_nodes(&mut self.graph, &[id], false);
        id
    }

    /// Creates the default node type for a slot and links it.
    pub(super) fn create_default_for_slot(&mut self, anchor: &LinkAnchor, pos: Vector2) {
        match demo::default_template_for_slot(&anchor.slot_type, anchor.is_output) {
            Some(kind) => {
                self.create_node(kind, pos, Some(anchor));
            }
            None => log::info!("no node type accepts `{}`", anchor.slot_type),
        }
    }

    /// Deletes nodes and the elements behind their DOM widgets.
    pub fn remove_nodes(&mut self, ids: &[NodeId]) {
        self.graph.before_change();
        for id in ids {
            if let Err(err) = self.graph.remove_node(*id) {
                log::warn!("{err}");
            }
        }
        self.graph.after_change();
        self.controller.forget_missing(&self.graph);
        self.release_dom(ids);
    }

    /// Deletes the selected nodes.
    pub fn delete_selection(&mut self) {
        let removed: Vec<NodeId> = self
            .controller
            .delete_selected(&mut self.graph)
            .into_iter()
            .map(|node| node.id)
            .collect();
        self.release_dom(&removed);
    }

    fn release_dom(&mut self, ids: &[NodeId]) {
        if let Some(host) = self.dom_host.as_mut() {
            for id in ids {
                self.dom.release_node(host, *id);
            }
        }
    }

    fn edit_node(&mut self, id: NodeId, edit: impl FnOnce(&mut Node)) {
        self.graph.before_change();
        if let Some(node) = self.graph.node_mut(id) {
            edit(node);
        }
        self.graph.after_change();
    }

    /// Applies a popup choice. `now_ms` is the current frame time.
    pub fn apply_menu_action(&mut self, action: MenuAction, now_ms: f64) {
        let graph_pos = self.menu.as_ref().map(|m| m.graph_pos).unwrap_or_default();
        let from = self.menu.as_ref().and_then(|m| match &m.kind {
            MenuKind::Search { from, .. } => from.clone(),
            MenuKind::Connection(anchor) => Some(anchor.clone()),
            _ => None,
        });
        let screen_pos = self.menu.as_ref().map(|m| m.screen_pos);
        self.close_menu();

        match action {
            MenuAction::Create(kind) => {
                self.create_node(kind, graph_pos, from.as_ref());
            }
            MenuAction::CreateGroup => {
                self.graph.before_change();
                let rect = Rect::new(graph_pos.x, graph_pos.y, 300.0, 200.0);
                self.graph.add_group(Group::new("Group", rect));
                self.graph.after_change();
            }
            MenuAction::ResetView => {
                self.controller.transform.reset();
                self.controller.set_dirty(true, true);
            }
            MenuAction::ToggleCollapse(id) => self.controller.toggle_collapse(&mut self.graph, id),
            MenuAction::TogglePin(id) => self.edit_node(id, |n| n.flags.pinned = !n.flags.pinned),
            MenuAction::SetMode(id, mode) => self.edit_node(id, |n| n.mode = mode),
            MenuAction::CloneNode(id) => {
                self.graph.before_change();
                let offset = vec2(CLONE_OFFSET * 4.0, CLONE_OFFSET * 4.0);
                match self.graph.clone_node(id, offset) {
                    Ok(copy) => {
                        self.graph.after_change();
                        self.controller.select_nodes(&mut self.graph, &[copy], false);
                    }
                    Err(err) => {
                        self.graph.after_change();
                        log::warn!("{err}");
                    }
                }
            }
            MenuAction::RemoveNode(id) => self.remove_nodes(&[id]),
            MenuAction::RemoveLink(id) => {
                self.graph.before_change();
                if let Err(err) = self.graph.remove_link(id) {
                    log::warn!("{err}");
                }
                self.graph.after_change();
            }
            MenuAction::RenameGroup(id) => {
                if let Some(group) = self.graph.group(id) {
                    self.prompt = Some(super::state::PromptState {
                        target: PromptTarget::GroupTitle(id),
                        title: "Title".to_string(),
                        value: group.title.clone(),
                        screen_pos: screen_pos.unwrap_or(egui::Pos2::ZERO),
                    });
                }
            }
            MenuAction::RemoveGroup(id) => {
                self.graph.before_change();
                self.graph.remove_group(id);
                self.graph.after_change();
            }
            MenuAction::PickCombo {
                node,
                widget,
                value,
            } => self
                .controller
                .set_widget_value(&mut self.graph, node, widget, &value),
            MenuAction::OpenSearch(anchor) => {
                let pos = screen_pos.unwrap_or(egui::Pos2::ZERO);
                let origin = self.canvas_rect.map(|r| r.min).unwrap_or(egui::Pos2::ZERO);
                let local = vec2((pos.x - origin.x) as f64, (pos.y - origin.y) as f64);
                self.open_menu(
                    MenuKind::Search {
                        filter: String::new(),
                        from: Some(anchor),
                    },
                    local,
                    graph_pos,
                    now_ms,
                );
            }
            MenuAction::Dismiss => {}
        }
        self.controller.set_dirty(true, true);
    }

    /// Draws the open popup and applies whatever was picked.
    pub fn show_menu(&mut self, ctx: &egui::Context) {
        let Some(mut menu) = self.menu.take() else {
            return;
        };
        // a press outside a settled popup closes it
        let pressed_outside = ctx.input(|i| {
            i.pointer.any_pressed()
                && i
                    .pointer
                    .interact_pos()
                    .zip(menu.rect)
                    .is_some_and(|(pos, rect)| !rect.contains(pos))
        });
        if pressed_outside {
            menu.token.cancel();
            return;
        }

        let mut action = None;
        let mut filter_changed = false;
        let first_frame = menu.rect.is_none();
        let response = egui::Area::new(egui::Id::new("canvas_menu"))
            .order(egui::Order::Foreground)
            .fixed_pos(menu.screen_pos)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(160.0);
                    match &mut menu.kind {
                        MenuKind::Context(target) => self.context_entries(ui, target, &mut action),
                        MenuKind::Link(link) => {
                            ui.label("Link");
                            ui.separator();
                            if ui.button("Delete").clicked() {
                                action = Some(MenuAction::RemoveLink(*link));
                            }
                        }
                        MenuKind::Connection(anchor) => {
                            ui.label(format!("Continue `{}`", anchor.slot_type));
                            ui.separator();
                            if ui.button("Search…").clicked() {
                                action = Some(MenuAction::OpenSearch(anchor.clone()));
                            }
                            ui.separator();
                            let templates =
                                demo::templates_for_slot(&anchor.slot_type, anchor.is_output);
                            template_buttons(ui, &templates, &mut action);
                        }
                        MenuKind::Combo {
                            node,
                            widget,
                            values,
                        } => {
                            for value in values.iter() {
                                if ui.button(value.as_str()).clicked() {
                                    action = Some(MenuAction::PickCombo {
                                        node: *node,
                                        widget: *widget,
                                        value: value.clone(),
                                    });
                                }
                            }
                        }
                        MenuKind::Search { filter, from } => {
                            let edit = ui.text_edit_singleline(filter);
                            if first_frame {
                                edit.request_focus();
                            }
                            filter_changed = edit.changed();
                            let needle = filter.to_lowercase();
                            let results: Vec<&'static TemplateInfo> = match from {
                                Some(anchor) => {
                                    demo::templates_for_slot(&anchor.slot_type, anchor.is_output)
                                        .into_iter()
                                        .filter(|t| t.name.to_lowercase().contains(&needle))
                                        .collect()
                                }
                                None => demo::search_templates(filter),
                            };
                            ui.separator();
                            if results.is_empty() {
                                ui.weak("No matches");
                            }
                            template_buttons(ui, &results, &mut action);
                            if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                                if let Some(first) = results.first() {
                                    action = Some(MenuAction::Create(first.kind));
                                }
                            }
                        }
                    }
                    if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        action = Some(MenuAction::Dismiss);
                    }
                });
            });
        menu.rect = Some(response.response.rect);

        if filter_changed {
            self.deferred
                .schedule_next_frame(DeferredTask::RepositionMenu, &menu.token);
        }
        let accepts = menu.accepts_pointer;
        self.menu = Some(menu);
        match action {
            // keyboard dismissal is always honored
            Some(MenuAction::Dismiss) => self.close_menu(),
            Some(action) if accepts => {
                let now = ctx.input(|i| i.time) * 1000.0;
                self.apply_menu_action(action, now);
            }
            Some(action) => log::debug!("menu not ready, ignoring {:?}", action),
            None => {}
        }
    }

    fn context_entries(
        &self,
        ui: &mut egui::Ui,
        target: &ContextTarget,
        action: &mut Option<MenuAction>,
    ) {
        match target {
            ContextTarget::Canvas => {
                ui.label("Add node");
                ui.separator();
                let all: Vec<&'static TemplateInfo> = demo::all_templates().iter().collect();
                template_buttons(ui, &all, action);
                ui.separator();
                if ui.button("Add group").clicked() {
                    *action = Some(MenuAction::CreateGroup);
                }
                if ui.button("Reset view").clicked() {
                    *action = Some(MenuAction::ResetView);
                }
            }
            ContextTarget::Node(id) => {
                let Some(node) = self.graph.node(*id) else {
                    ui.weak("Node removed");
                    return;
                };
                ui.label(&node.title);
                ui.separator();
                let collapse = if node.flags.collapsed { "Expand" } else { "Collapse" };
                if ui.button(collapse).clicked() {
                    *action = Some(MenuAction::ToggleCollapse(*id));
                }
                let pin = if node.flags.pinned { "Unpin" } else { "Pin" };
                if ui.button(pin).clicked() {
                    *action = Some(MenuAction::TogglePin(*id));
                }
                ui.horizontal(|ui| {
                    ui.label("Mode");
                    for (mode, label) in [
                        (NodeMode::Always, "Always"),
                        (NodeMode::Never, "Never"),
                        (NodeMode::OnRequest, "On request"),
                        (NodeMode::Bypass, "Bypass"),
                    ] {
                        if ui.selectable_label(node.mode == mode, label).clicked() {
                            *action = Some(MenuAction::SetMode(*id, mode));
                        }
                    }
                });
                if ui.button("Clone").clicked() {
                    *action = Some(MenuAction::CloneNode(*id));
                }
                if ui.button("Remove").clicked() {
                    *action = Some(MenuAction::RemoveNode(*id));
                }
            }
            ContextTarget::Link(id) => {
                if ui.button("Delete link").clicked() {
                    *action = Some(MenuAction::RemoveLink(*id));
                }
            }
            ContextTarget::Group(id) => {
                if ui.button("Edit title").clicked() {
                    *action = Some(MenuAction::RenameGroup(*id));
                }
                if ui.button("Remove group").clicked() {
                    *action = Some(MenuAction::RemoveGroup(*id));
                }
            }
        }
    }

    /// Draws the modal prompt and applies its value on confirm.
    pub fn show_prompt(&mut self, ctx: &egui::Context) {
        let Some(mut prompt) = self.prompt.take() else {
            return;
        };
        let mut confirmed = false;
        let mut cancelled = false;
        egui::Window::new(prompt.title.clone())
            .id(egui::Id::new("canvas_prompt"))
            .collapsible(false)
            .resizable(false)
            .fixed_pos(prompt.screen_pos)
            .show(ctx, |ui| {
                let edit = ui.text_edit_singleline(&mut prompt.value);
                edit.request_focus();
                if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    confirmed = true;
                }
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() {
                        confirmed = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancelled = true;
                    }
                });
                if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    cancelled = true;
                }
            });

        if confirmed {
            self.apply_prompt(&prompt.target, &prompt.value);
        } else if !cancelled {
            self.prompt = Some(prompt);
        }
    }

    /// Writes a prompt's value to its target.
    pub fn apply_prompt(&mut self, target: &PromptTarget, value: &str) {
        match target {
            PromptTarget::Widget { node, widget } => {
                self.controller
                    .set_widget_value(&mut self.graph, *node, *widget, value)
            }
            PromptTarget::GroupTitle(group) => {
                self.controller.rename_group(&mut self.graph, *group, value)
            }
        }
        self.controller.set_dirty(true, false);
    }
}
