//! Application state for the egui editor.
//!
//! Everything the editor keeps between frames lives on [`EditorApp`]. Only
//! [`ViewPrefs`] is persisted; the graph itself is rebuilt from the demo on
//! every start.

use super::dom_overlay::{new_platform_host, PlatformDomHost};
use crate::config::CanvasConfig;
use crate::deferred::{CancellationToken, DeferredQueue};
use crate::error::ConfigError;
use crate::geometry::Vector2;
use crate::graph::Graph;
use crate::interaction::{
    CanvasController, ContextTarget, LinkAnchor, PointerButton, PromptTarget,
};
use crate::types::{LinkId, NodeId};
use crate::widgets::registry::DomWidgetRegistry;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Storage key for persisted preferences.
pub const PREFS_KEY: &str = "node_canvas_prefs";

/// User preferences saved by `eframe` between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPrefs {
    /// Canvas behavior switches
    pub config: CanvasConfig,
    /// Dark visuals
    pub dark_mode: bool,
    /// Draw the background grid
    pub show_grid: bool,
}

impl Default for ViewPrefs {
    fn default() -> Self {
        Self {
            config: CanvasConfig::default(),
            dark_mode: true,
            show_grid: true,
        }
    }
}

impl ViewPrefs {
    /// Parses saved preferences and rejects an unusable config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let prefs: ViewPrefs = serde_json::from_str(json)?;
        prefs.config.validate()?;
        Ok(prefs)
    }

    /// Serializes the preferences.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Which popup is open.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuKind {
    /// Right-click menu
    Context(ContextTarget),
    /// Menu for a link midpoint
    Link(LinkId),
    /// Node search with a text filter
    Search {
        /// Current filter text
        filter: String,
        /// Link end a created node connects to
        from: Option<LinkAnchor>,
    },
    /// Node types that can continue a dropped link
    Connection(LinkAnchor),
    /// Combo widget choices
    Combo {
        /// Owner node
        node: NodeId,
        /// Widget index
        widget: usize,
        /// Choices
        values: Vec<String>,
    },
}

/// An open popup and where it sits.
#[derive(Debug, Clone)]
pub struct OpenMenu {
    /// Contents
    pub kind: MenuKind,
    /// Absolute top-left of the popup
    pub screen_pos: egui::Pos2,
    /// Graph position new nodes are created at
    pub graph_pos: Vector2,
    /// Clicks are ignored until the opening click has settled
    pub accepts_pointer: bool,
    /// Popup area measured on the previous frame
    pub rect: Option<egui::Rect>,
    /// Cancels deferred work scheduled for this popup
    pub token: CancellationToken,
}

/// Modal text prompt.
#[derive(Debug, Clone)]
pub struct PromptState {
    /// What the text edits
    pub target: PromptTarget,
    /// Label
    pub title: String,
    /// Text being edited
    pub value: String,
    /// Absolute position of the prompt window
    pub screen_pos: egui::Pos2,
}

/// Work the editor defers to a later frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Let the open menu react to clicks
    AcceptMenuPointer,
    /// Move the open menu back inside the window once its size is known
    RepositionMenu,
}

/// The editor application.
pub struct EditorApp {
    /// Document being edited
    pub graph: Graph,
    /// Pointer state machine and view transform
    pub controller: CanvasController,
    /// Persisted preferences (the config copy is refreshed from the controller on save)
    pub prefs: ViewPrefs,
    /// Open popup
    pub menu: Option<OpenMenu>,
    /// Open modal prompt
    pub prompt: Option<PromptState>,
    /// Elements behind DOM widgets
    pub dom: DomWidgetRegistry<PlatformDomHost>,
    /// Platform layer for DOM widgets; `None` when none could be created
    pub dom_host: Option<PlatformDomHost>,
    /// Delayed UI work
    pub deferred: DeferredQueue<DeferredTask>,
    /// Screen rectangle of the canvas on the last frame
    pub canvas_rect: Option<egui::Rect>,
    /// Last status line shown in the toolbar
    pub status: String,
    /// Buttons whose press went to an overlay; their releases must not reach the canvas
    pub withheld: Vec<PointerButton>,
}

impl Default for EditorApp {
    fn default() -> Self {
        Self::with_graph(Graph::new(), ViewPrefs::default())
    }
}

impl EditorApp {
    /// Creates the app around a graph.
    pub fn with_graph(graph: Graph, prefs: ViewPrefs) -> Self {
        Self {
            graph,
            controller: CanvasController::new(prefs.config.clone()),
            prefs,
            menu: None,
            prompt: None,
            dom: DomWidgetRegistry::new(),
            dom_host: new_platform_host(),
            deferred: DeferredQueue::new(),
            canvas_rect: None,
            status: String::new(),
            withheld: Vec::new(),
        }
    }

    /// Creates the app from `eframe` storage, starting on the demo graph.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let prefs = cc
            .storage
            .and_then(|storage| storage.get_string(PREFS_KEY))
            .and_then(|json| match ViewPrefs::from_json(&json) {
                Ok(prefs) => Some(prefs),
                Err(err) => {
                    log::warn!("ignoring saved preferences: {err}");
                    None
                }
            })
            .unwrap_or_default();
        Self::with_graph(crate::demo::build_demo_graph(), prefs)
    }

    /// Converts a graph position to an absolute screen position.
    pub fn graph_to_screen(&self, pos: Vector2) -> egui::Pos2 {
        let origin = self.canvas_rect.map(|r| r.min).unwrap_or(egui::Pos2::ZERO);
        let local = self.controller.transform.to_screen(pos);
        origin + egui::vec2(local.x as f32, local.y as f32)
    }

    /// Converts a canvas-local position from the controller to an absolute one.
    pub fn local_to_screen(&self, local: Vector2) -> egui::Pos2 {
        let origin = self.canvas_rect.map(|r| r.min).unwrap_or(egui::Pos2::ZERO);
        origin + egui::vec2(local.x as f32, local.y as f32)
    }

    /// Whether any popup or prompt is open.
    pub fn has_overlay(&self) -> bool {
        self.menu.is_some() || self.prompt.is_some()
    }
}
