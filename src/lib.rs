//! # Node Canvas
//!
//! An interactive node-graph canvas: nodes with typed input and output
//! slots, bezier links between them, groups, and widgets embedded in node
//! bodies. Some widgets are painted on the canvas, others are backed by
//! native elements positioned over it.
//!
//! ## Layers
//! - [`graph`] holds the document and its undo history
//! - [`interaction`] turns pointer events into graph edits
//! - [`widgets`] lays out and projects node widgets
//! - [`ui`] is the `eframe` editor built on top

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod deferred;
pub mod demo;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod hit_test;
pub mod interaction;
pub mod transform;
pub mod types;
pub mod ui;
pub mod undo;
pub mod widgets;

pub use config::CanvasConfig;
pub use error::{ConfigError, DomError, GraphError};
pub use geometry::{vec2, Rect, Vector2};
pub use graph::Graph;
pub use interaction::CanvasController;
pub use transform::Transform;
pub use types::*;
pub use ui::EditorApp;

/// Runs the editor in a native window.
///
/// # Returns
///
/// Returns `Ok(())` when the window closes normally, or an `eframe::Error`
/// if initialization fails.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), eframe::Error> {
///     node_canvas::run_app()
/// }
/// ```
#[cfg(not(target_arch = "wasm32"))]
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Node Canvas",
        options,
        Box::new(|cc| Ok(Box::new(EditorApp::new(cc)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_has_nothing_to_undo() {
        let graph = Graph::new();
        assert!(graph.nodes().is_empty());
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.can_undo());
    }

    #[test]
    fn controller_starts_idle_at_unit_scale() {
        let controller = CanvasController::default();
        assert!(controller.mode().is_idle());
        assert_eq!(controller.transform.scale(), 1.0);
        assert!(controller.selection().is_empty());
    }
}
