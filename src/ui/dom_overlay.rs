//! Native stand-in for DOM widget elements.
//!
//! On the desktop there is no document to mount elements into, so each DOM
//! widget becomes an egui [`egui::Area`] drawn over the canvas at the
//! placement the registry computed. Edits made in those areas are queued as
//! [`DomSignal`]s and handed back on the next sync, the same way browser
//! listeners feed the web host.

use crate::error::DomError;
use crate::widgets::projection::{DomPlacement, DomVisibility};
use crate::widgets::registry::{DomHost, DomKey, DomSignal};
use crate::widgets::{DomElementKind, DomWidget};
use eframe::egui;
use std::collections::HashMap;

/// Host used by the editor on this platform.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformDomHost = EguiDomHost;
/// Host used by the editor on this platform.
#[cfg(target_arch = "wasm32")]
pub type PlatformDomHost = crate::widgets::web::WebDomHost;

/// Creates the platform host, or `None` when the platform has nowhere to
/// put elements.
#[cfg(not(target_arch = "wasm32"))]
pub fn new_platform_host() -> Option<PlatformDomHost> {
    Some(EguiDomHost::default())
}

/// Creates the platform host, or `None` when the platform has nowhere to
/// put elements.
#[cfg(target_arch = "wasm32")]
pub fn new_platform_host() -> Option<PlatformDomHost> {
    match crate::widgets::web::WebDomHost::for_body() {
        Ok(host) => Some(host),
        Err(err) => {
            log::warn!("DOM widgets disabled: {err}");
            None
        }
    }
}

/// Per-frame hooks the editor needs beyond [`DomHost`].
pub trait OverlayHost: DomHost {
    /// Called before the registry reapplies placements.
    fn begin_frame(&mut self) {}

    /// Draws whatever the host renders itself.
    fn show(&mut self, _ctx: &egui::Context) {}

    /// Whether an element sits under `pos`, so the canvas must not see the press.
    fn covers(&self, _pos: egui::Pos2) -> bool {
        false
    }
}

#[cfg(target_arch = "wasm32")]
impl OverlayHost for crate::widgets::web::WebDomHost {}

/// Handle for one egui-drawn element.
#[derive(Debug)]
pub struct EguiElement {
    key: DomKey,
    text: String,
}

#[derive(Debug, Clone)]
struct OverlayItem {
    key: DomKey,
    kind: DomElementKind,
    text: String,
    rect: egui::Rect,
    clip: Option<egui::Rect>,
    dimmed: bool,
    z_index: usize,
}

/// Draws DOM widgets as egui areas.
#[derive(Debug, Default)]
pub struct EguiDomHost {
    items: Vec<OverlayItem>,
    signals: HashMap<DomKey, Vec<DomSignal>>,
    covered: Vec<egui::Rect>,
    mounted: usize,
}

fn to_egui(rect: crate::geometry::Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        egui::pos2(rect.x as f32, rect.y as f32),
        egui::vec2(rect.width as f32, rect.height as f32),
    )
}

/// Largest part of the element left uncovered by its clip hole, in screen space.
fn visible_part(placement: &DomPlacement) -> Option<egui::Rect> {
    let clip = placement.clip?;
    let size = crate::geometry::vec2(placement.width, placement.height);
    let best = clip
        .visible_rects(size)
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))?;
    Some(egui::Rect::from_min_size(
        egui::pos2(
            (placement.left + best.x * placement.scale_x) as f32,
            (placement.top + best.y * placement.scale_y) as f32,
        ),
        egui::vec2(
            (best.width * placement.scale_x) as f32,
            (best.height * placement.scale_y) as f32,
        ),
    ))
}

impl EguiDomHost {
    /// Number of elements currently mounted.
    pub fn mounted(&self) -> usize {
        self.mounted
    }

    /// Elements scheduled for drawing this frame.
    pub fn visible_count(&self) -> usize {
        self.items.len()
    }

    /// Queues a signal as if the element at `key` produced it.
    pub fn push_signal(&mut self, key: DomKey, signal: DomSignal) {
        self.signals.entry(key).or_default().push(signal);
    }

    fn pending_text(&self, key: &DomKey) -> Option<String> {
        self.signals.get(key)?.iter().rev().find_map(|s| match s {
            DomSignal::Input(text) => Some(text.clone()),
            _ => None,
        })
    }

    fn show_item(ui: &mut egui::Ui, item: &mut OverlayItem) -> Vec<DomSignal> {
        let mut out = Vec::new();
        let size = item.rect.size();
        match &item.kind {
            DomElementKind::TextArea { placeholder } => {
                let edit = egui::TextEdit::multiline(&mut item.text)
                    .hint_text(placeholder.as_str())
                    .desired_width(size.x);
                let response = ui.add_sized(size, edit);
                if response.gained_focus() {
                    out.push(DomSignal::Focus);
                }
                if response.clicked() {
                    out.push(DomSignal::Click);
                }
                if response.changed() {
                    out.push(DomSignal::Input(item.text.clone()));
                }
            }
            DomElementKind::FileInput { accept } => {
                let label = if item.text.is_empty() {
                    "Choose file…".to_string()
                } else {
                    item.text.clone()
                };
                if ui.add_sized(size, egui::Button::new(label)).clicked() {
                    out.push(DomSignal::Click);
                    if let Some(name) = pick_file(accept) {
                        item.text = name.clone();
                        out.push(DomSignal::Input(name));
                    }
                }
            }
            DomElementKind::Embed { url } => {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_min_size(size - egui::vec2(12.0, 12.0));
                    ui.label("Embedded page");
                    ui.hyperlink(url);
                });
            }
        }
        out
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn pick_file(accept: &str) -> Option<String> {
    let extensions: Vec<&str> = accept
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .collect();
    let mut dialog = rfd::FileDialog::new();
    if !extensions.is_empty() {
        dialog = dialog.add_filter("Accepted files", &extensions);
    }
    let path = dialog.pick_file()?;
    let name = path.file_name()?.to_string_lossy().into_owned();
    log::info!("picked `{}`", path.display());
    Some(name)
}

#[cfg(target_arch = "wasm32")]
fn pick_file(_accept: &str) -> Option<String> {
    None
}

impl DomHost for EguiDomHost {
    type Element = EguiElement;

    fn mount(&mut self, key: DomKey, widget: &DomWidget) -> Result<EguiElement, DomError> {
        self.mounted += 1;
        Ok(EguiElement {
            key,
            text: widget.value.clone(),
        })
    }

    fn apply(&mut self, element: &mut EguiElement, widget: &DomWidget, visibility: &DomVisibility) {
        let DomVisibility::Visible(placement) = visibility else {
            return;
        };
        // local edits not yet reported win over the stored value
        element.text = self
            .pending_text(&element.key)
            .unwrap_or_else(|| widget.value.clone());
        self.items.push(OverlayItem {
            key: element.key,
            kind: widget.kind.clone(),
            text: element.text.clone(),
            rect: to_egui(placement.screen_rect()),
            clip: visible_part(placement),
            dimmed: placement.dimmed,
            z_index: placement.z_index,
        });
    }

    fn poll(&mut self, element: &mut EguiElement) -> Vec<DomSignal> {
        self.signals.remove(&element.key).unwrap_or_default()
    }

    fn unmount(&mut self, element: EguiElement) {
        self.mounted = self.mounted.saturating_sub(1);
        self.signals.remove(&element.key);
        self.items.retain(|item| item.key != element.key);
    }
}

impl OverlayHost for EguiDomHost {
    fn begin_frame(&mut self) {
        self.items.clear();
    }

    fn show(&mut self, ctx: &egui::Context) {
        self.items.sort_by_key(|item| item.z_index);
        self.covered.clear();
        let mut items = std::mem::take(&mut self.items);
        for item in &mut items {
            let id = egui::Id::new(("dom_widget", item.key.0, item.key.1));
            let signals = egui::Area::new(id)
                .fixed_pos(item.rect.min)
                .show(ctx, |ui| {
                    if let Some(clip) = item.clip {
                        ui.set_clip_rect(clip);
                    }
                    ui.add_enabled_ui(!item.dimmed, |ui| Self::show_item(ui, item))
                        .inner
                })
                .inner;
            for signal in signals {
                self.push_signal(item.key, signal);
            }
            self.covered.push(item.clip.unwrap_or(item.rect));
        }
        self.items = items;
    }

    fn covers(&self, pos: egui::Pos2) -> bool {
        self.covered.iter().any(|r| r.contains(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2;
    use crate::transform::Transform;
    use crate::types::Node;
    use crate::widgets::layout::compute_widget_layout;
    use crate::widgets::projection::CanvasMetrics;
    use crate::widgets::registry::DomWidgetRegistry;

    fn text_node() -> Node {
        let mut node = Node::new("Notes", "demo/notes", vec2(0.0, 0.0)).with_widget(DomWidget::new(
            "notes",
            DomElementKind::TextArea {
                placeholder: String::new(),
            },
        ));
        node.size = vec2(200.0, 120.0);
        node.record_widget_rows();
        let Node { widgets, size, .. } = &mut node;
        compute_widget_layout(widgets, size);
        node
    }

    #[test]
    fn pending_edit_survives_reapply() {
        let mut host = EguiDomHost::default();
        let mut registry = DomWidgetRegistry::new();
        let nodes = vec![text_node()];
        let key = (nodes[0].id, 0);

        host.begin_frame();
        registry.sync(&mut host, &nodes, &Transform::default(), &CanvasMetrics::default(), &[]);
        assert_eq!(host.visible_count(), 1);

        host.push_signal(key, DomSignal::Input("typed".into()));
        host.begin_frame();
        let feedback =
            registry.sync(&mut host, &nodes, &Transform::default(), &CanvasMetrics::default(), &[]);
        assert_eq!(host.items[0].text, "typed");
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].signal, DomSignal::Input("typed".into()));
    }

    #[test]
    fn unmount_forgets_element() {
        let mut host = EguiDomHost::default();
        let mut registry = DomWidgetRegistry::new();
        let nodes = vec![text_node()];
        host.begin_frame();
        registry.sync(&mut host, &nodes, &Transform::default(), &CanvasMetrics::default(), &[]);
        assert_eq!(host.mounted(), 1);

        registry.release_node(&mut host, nodes[0].id);
        assert_eq!(host.mounted(), 0);
        assert_eq!(host.visible_count(), 0);
    }
}
