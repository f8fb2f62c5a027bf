//! Canvas interaction policies and presentation tuning.
//!
//! A plain serde struct owned by the controller. Several canvases can run
//! with different policies, and the app persists the user's choices.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Policy flags and thresholds consulted by the pointer state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Master switch for editing gestures (selection, dragging, linking)
    pub allow_interaction: bool,
    /// Disables every mutating gesture while still allowing pan/zoom
    pub read_only: bool,
    /// Presentation mode: nodes cannot be dragged and clicks fall through to the canvas
    pub live_mode: bool,
    /// Allows panning and zooming the canvas
    pub allow_dragcanvas: bool,
    /// Allows dragging nodes around
    pub allow_dragnodes: bool,
    /// Allows opening the node search box
    pub allow_searchbox: bool,
    /// Pressing on a linked input picks the link up from its origin output
    pub allow_reconnect_links: bool,
    /// Alt-dragging a node drags a fresh clone of it
    pub alt_drag_do_clone_nodes: bool,
    /// Shift-pressing an output removes its links before dragging a new one
    pub shift_click_do_break_link_from: bool,
    /// Pressing a linked input removes the link
    pub click_do_break_link_to: bool,
    /// Releasing a dragged link over empty canvas opens a menu
    pub release_link_on_empty_shows_menu: bool,
    /// Middle-clicking a slot creates and wires a default node
    pub middle_click_slot_add_default_node: bool,
    /// Middle-dragging empty canvas pans it
    pub middle_button_pans: bool,
    /// Snap dropped nodes to the grid
    pub align_to_grid: bool,
    /// Grid cell size used for snapping (graph units)
    pub grid_size: f64,
    /// Maximum delay between presses for a double click (milliseconds)
    pub double_click_ms: f64,
    /// Rectangle selections no larger than this on both axes act as clicks (graph units)
    pub rect_select_threshold: f64,
    /// Lower zoom bound
    pub min_scale: f64,
    /// Upper zoom bound
    pub max_scale: f64,
    /// Zoom multiplier per wheel notch
    pub zoom_step: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            allow_interaction: true,
            read_only: false,
            live_mode: false,
            allow_dragcanvas: true,
            allow_dragnodes: true,
            allow_searchbox: true,
            allow_reconnect_links: false,
            alt_drag_do_clone_nodes: true,
            shift_click_do_break_link_from: true,
            click_do_break_link_to: false,
            release_link_on_empty_shows_menu: true,
            middle_click_slot_add_default_node: true,
            middle_button_pans: true,
            align_to_grid: false,
            grid_size: 10.0,
            double_click_ms: 300.0,
            rect_select_threshold: 10.0,
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_step: 1.1,
        }
    }
}

impl CanvasConfig {
    /// Whether editing gestures are currently permitted.
    pub fn can_edit(&self) -> bool {
        self.allow_interaction && !self.read_only
    }

    /// Parses and validates a config from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CanvasConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the config to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values the state machine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("expected a positive number, got {value}"),
                })
            }
        }

        positive("grid_size", self.grid_size)?;
        positive("double_click_ms", self.double_click_ms)?;
        positive("rect_select_threshold", self.rect_select_threshold)?;
        positive("min_scale", self.min_scale)?;
        positive("max_scale", self.max_scale)?;
        if self.min_scale > self.max_scale {
            return Err(ConfigError::InvalidValue {
                field: "min_scale",
                reason: format!("{} is above max_scale {}", self.min_scale, self.max_scale),
            });
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "zoom_step",
                reason: format!("expected a factor above 1.0, got {}", self.zoom_step),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config = CanvasConfig::from_json(r#"{ "double_click_ms": 250.0, "read_only": true }"#)
            .expect("valid config");
        assert_eq!(config.double_click_ms, 250.0);
        assert!(config.read_only);
        assert!(!config.can_edit());
        assert_eq!(config.rect_select_threshold, 10.0);
    }

    #[test]
    fn rejects_inverted_scale_range() {
        let err = CanvasConfig::from_json(r#"{ "min_scale": 4.0, "max_scale": 2.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "min_scale", .. }));
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let err = CanvasConfig::from_json(r#"{ "rect_select_threshold": 0.0 }"#).unwrap_err();
        assert!(err.to_string().contains("rect_select_threshold"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            CanvasConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn json_round_trip_preserves_policies() {
        let config = CanvasConfig {
            allow_reconnect_links: true,
            grid_size: 16.0,
            ..CanvasConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(CanvasConfig::from_json(&json).unwrap(), config);
    }
}
