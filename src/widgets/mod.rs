//! Widgets embedded in a node's body.
//!
//! A widget is either drawn on the canvas (buttons, toggles, sliders...) or
//! backed by a native DOM element that is positioned over the canvas each
//! frame. Both kinds share one vertical stack per node.

pub mod dom;
pub mod layout;
pub mod projection;
pub mod registry;
#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::constants::{NODE_WIDGET_HEIGHT, WIDGET_MARGIN_X, WIDGET_SPACING};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use dom::{DomElementKind, DomWidget, DomWidgetOptions, PreferredHeight, SelectOn};

/// Kinds of canvas-drawn widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanvasWidgetKind {
    /// Fires on press
    Button,
    /// Boolean switch
    Toggle,
    /// Numeric field with arrows; dragging scrubs the value
    Number {
        /// Increment for one arrow click
        step: f64,
        /// Lower bound
        min: Option<f64>,
        /// Upper bound
        max: Option<f64>,
    },
    /// Horizontal slider between two bounds
    Slider {
        /// Value at the left edge
        min: f64,
        /// Value at the right edge
        max: f64,
    },
    /// Pick one of a list of strings
    Combo {
        /// Available choices
        values: Vec<String>,
    },
    /// Free text edited through a prompt
    Text,
}

/// A widget painted directly on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasWidget {
    /// Label, also used as the property key
    pub name: String,
    /// Behavior
    pub kind: CanvasWidgetKind,
    /// Current value
    pub value: Value,
    /// Row height override
    #[serde(default)]
    pub height: Option<f64>,
    /// Ignores input while set
    #[serde(default)]
    pub disabled: bool,
    /// Node-local top assigned by layout
    #[serde(skip)]
    pub y: Option<f64>,
    /// Node-local top where the row was last drawn
    #[serde(skip)]
    pub last_y: Option<f64>,
    /// Pressed state, drawn highlighted
    #[serde(skip)]
    pub clicked: bool,
}

/// Phase of a pointer interaction routed to a captured widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetPointer {
    /// Press inside the widget row
    Down,
    /// Pointer moved while the widget holds the capture
    Move {
        /// Horizontal movement since the previous event (graph units)
        delta_x: f64,
    },
    /// Release ending the capture
    Up {
        /// Time since the press (milliseconds)
        click_ms: f64,
    },
}

/// What the controller should do after a widget handled input.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetAction {
    /// Nothing visible changed
    None,
    /// The value changed
    ValueChanged,
    /// A button fired
    Triggered,
    /// The combo list should open
    OpenCombo {
        /// Choices to offer
        values: Vec<String>,
    },
    /// A text prompt should open
    Prompt {
        /// Current value as text
        value: String,
    },
}

const ARROW_WIDTH: f64 = 40.0;
const PROMPT_CLICK_MS: f64 = 200.0;

impl CanvasWidget {
    /// Creates a canvas widget with an initial value.
    pub fn new(name: impl Into<String>, kind: CanvasWidgetKind, value: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            height: None,
            disabled: false,
            y: None,
            last_y: None,
            clicked: false,
        }
    }

    /// Row height excluding spacing.
    pub fn height(&self) -> f64 {
        self.height.unwrap_or(NODE_WIDGET_HEIGHT)
    }

    /// Applies a pointer interaction.
    ///
    /// # Arguments
    ///
    /// * `phase` - Down, move or up
    /// * `local_x` - Pointer x relative to the node's left edge
    /// * `width` - Node width the row spans
    pub fn handle_pointer(
        &mut self,
        phase: WidgetPointer,
        local_x: f64,
        width: f64,
    ) -> WidgetAction {
        if self.disabled {
            return WidgetAction::None;
        }
        let arrow = if local_x < ARROW_WIDTH {
            -1.0
        } else if local_x > width - ARROW_WIDTH {
            1.0
        } else {
            0.0
        };

        match (&self.kind, phase) {
            (CanvasWidgetKind::Button, WidgetPointer::Down) => {
                self.clicked = true;
                WidgetAction::Triggered
            }
            (CanvasWidgetKind::Button, WidgetPointer::Up { .. }) => {
                self.clicked = false;
                WidgetAction::None
            }
            (CanvasWidgetKind::Toggle, WidgetPointer::Down) => {
                let on = self.value.as_bool().unwrap_or(false);
                self.value = Value::Bool(!on);
                WidgetAction::ValueChanged
            }
            (
                CanvasWidgetKind::Slider { min, max },
                WidgetPointer::Down | WidgetPointer::Move { .. },
            ) => {
                let span = (width - WIDGET_MARGIN_X * 2.0).max(1.0);
                let t = ((local_x - WIDGET_MARGIN_X) / span).clamp(0.0, 1.0);
                let next = min + (max - min) * t;
                self.set_number(next)
            }
            (CanvasWidgetKind::Number { step, min, max }, WidgetPointer::Down) => {
                let (step, min, max) = (*step, *min, *max);
                if arrow == 0.0 {
                    return WidgetAction::None;
                }
                let next = clamp_opt(self.number() + arrow * step, min, max);
                self.set_number(next)
            }
            (CanvasWidgetKind::Number { step, min, max }, WidgetPointer::Move { delta_x }) => {
                let (step, min, max) = (*step, *min, *max);
                if delta_x == 0.0 {
                    return WidgetAction::None;
                }
                let next = clamp_opt(self.number() + delta_x * 0.1 * step, min, max);
                self.set_number(next)
            }
            (CanvasWidgetKind::Number { .. }, WidgetPointer::Up { click_ms }) => {
                if arrow == 0.0 && click_ms < PROMPT_CLICK_MS {
                    WidgetAction::Prompt {
                        value: self.value_text(),
                    }
                } else {
                    WidgetAction::None
                }
            }
            (CanvasWidgetKind::Combo { values }, WidgetPointer::Down) => {
                if arrow == 0.0 {
                    return WidgetAction::OpenCombo {
                        values: values.clone(),
                    };
                }
                if values.is_empty() {
                    return WidgetAction::None;
                }
                let current = self
                    .value
                    .as_str()
                    .and_then(|v| values.iter().position(|c| c == v))
                    .unwrap_or(0) as i64;
                let index = (current + arrow as i64).clamp(0, values.len() as i64 - 1) as usize;
                let next = Value::String(values[index].clone());
                if next == self.value {
                    WidgetAction::None
                } else {
                    self.value = next;
                    WidgetAction::ValueChanged
                }
            }
            (CanvasWidgetKind::Text, WidgetPointer::Down) => WidgetAction::Prompt {
                value: self.value_text(),
            },
            _ => WidgetAction::None,
        }
    }

    /// Sets the value from a menu or prompt answer, coercing to the widget's kind.
    pub fn set_value_from_text(&mut self, text: &str) -> bool {
        let next = match &self.kind {
            CanvasWidgetKind::Number { min, max, .. } => match text.trim().parse::<f64>() {
                Ok(n) => number_value(clamp_opt(n, *min, *max)),
                Err(_) => return false,
            },
            CanvasWidgetKind::Slider { min, max } => match text.trim().parse::<f64>() {
                Ok(n) => number_value(n.clamp(min.min(*max), max.max(*min))),
                Err(_) => return false,
            },
            CanvasWidgetKind::Toggle => Value::Bool(matches!(text.trim(), "true" | "1" | "on")),
            CanvasWidgetKind::Button => return false,
            CanvasWidgetKind::Combo { .. } | CanvasWidgetKind::Text => {
                Value::String(text.to_string())
            }
        };
        let changed = next != self.value;
        self.value = next;
        changed
    }

    /// Value rendered as display text.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Number(n) => {
                let f = n.as_f64().unwrap_or_default();
                format!("{:.3}", f).trim_end_matches('0').trim_end_matches('.').to_string()
            }
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn number(&self) -> f64 {
        self.value.as_f64().unwrap_or_default()
    }

    fn set_number(&mut self, n: f64) -> WidgetAction {
        let next = number_value(n);
        if next == self.value {
            WidgetAction::None
        } else {
            self.value = next;
            WidgetAction::ValueChanged
        }
    }
}

fn number_value(n: f64) -> Value {
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}

fn clamp_opt(n: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let n = min.map_or(n, |m| n.max(m));
    max.map_or(n, |m| n.min(m))
}

/// A widget in a node's stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Widget {
    /// Painted on the canvas
    Canvas(CanvasWidget),
    /// Backed by a native element
    Dom(DomWidget),
}

impl From<CanvasWidget> for Widget {
    fn from(w: CanvasWidget) -> Self {
        Widget::Canvas(w)
    }
}

impl From<DomWidget> for Widget {
    fn from(w: DomWidget) -> Self {
        Widget::Dom(w)
    }
}

impl Widget {
    /// Widget name.
    pub fn name(&self) -> &str {
        match self {
            Widget::Canvas(w) => &w.name,
            Widget::Dom(w) => &w.name,
        }
    }

    /// Node-local top assigned by layout, if any.
    pub fn y(&self) -> Option<f64> {
        match self {
            Widget::Canvas(w) => w.y,
            Widget::Dom(w) => w.y,
        }
    }

    /// Sets the layout top.
    pub fn set_y(&mut self, y: f64) {
        match self {
            Widget::Canvas(w) => w.y = Some(y),
            Widget::Dom(w) => w.y = Some(y),
        }
    }

    /// Node-local top where the row was last drawn.
    pub fn last_y(&self) -> Option<f64> {
        match self {
            Widget::Canvas(w) => w.last_y,
            Widget::Dom(w) => w.last_y,
        }
    }

    /// Records where the row was drawn.
    pub fn set_last_y(&mut self, y: f64) {
        match self {
            Widget::Canvas(w) => w.last_y = Some(y),
            Widget::Dom(w) => w.last_y = Some(y),
        }
    }

    /// Vertical distance to the next row.
    pub fn row_advance(&self) -> f64 {
        match self {
            Widget::Canvas(w) => w.height() + WIDGET_SPACING,
            Widget::Dom(w) => match w.computed_height {
                Some(h) if h > 0.0 => h,
                _ => NODE_WIDGET_HEIGHT + WIDGET_SPACING,
            },
        }
    }

    /// Height of the row when squeezed to its minimum.
    pub fn min_row_height(&self) -> f64 {
        match self {
            Widget::Canvas(w) => w.height() + WIDGET_SPACING,
            Widget::Dom(w) => w.min_height(),
        }
    }

    /// Height of the row for hit-testing.
    pub fn hit_height(&self) -> f64 {
        match self {
            Widget::Canvas(w) => w.height(),
            Widget::Dom(w) => w.computed_height.unwrap_or(NODE_WIDGET_HEIGHT),
        }
    }

    /// Drops layout state, as for a freshly cloned node.
    pub fn reset_layout(&mut self) {
        match self {
            Widget::Canvas(w) => {
                w.y = None;
                w.last_y = None;
                w.clicked = false;
            }
            Widget::Dom(w) => {
                w.y = None;
                w.last_y = None;
                w.computed_height = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number(step: f64) -> CanvasWidget {
        CanvasWidget::new(
            "n",
            CanvasWidgetKind::Number {
                step,
                min: Some(0.0),
                max: Some(10.0),
            },
            json!(5.0),
        )
    }

    #[test]
    fn number_arrows_step_and_clamp() {
        let mut w = number(1.0);
        assert_eq!(w.handle_pointer(WidgetPointer::Down, 200.0, 220.0), WidgetAction::ValueChanged);
        assert_eq!(w.value, json!(6.0));
        w.value = json!(0.0);
        assert_eq!(w.handle_pointer(WidgetPointer::Down, 10.0, 220.0), WidgetAction::None);
        assert_eq!(w.value, json!(0.0));
    }

    #[test]
    fn number_drag_scrubs_value() {
        let mut w = number(1.0);
        w.handle_pointer(WidgetPointer::Move { delta_x: 20.0 }, 100.0, 220.0);
        assert_eq!(w.value, json!(7.0));
    }

    #[test]
    fn quick_click_in_number_center_prompts() {
        let mut w = number(1.0);
        assert!(matches!(
            w.handle_pointer(WidgetPointer::Up { click_ms: 120.0 }, 100.0, 220.0),
            WidgetAction::Prompt { .. }
        ));
        assert_eq!(
            w.handle_pointer(WidgetPointer::Up { click_ms: 500.0 }, 100.0, 220.0),
            WidgetAction::None
        );
    }

    #[test]
    fn slider_maps_position_to_range() {
        let kind = CanvasWidgetKind::Slider {
            min: 0.0,
            max: 100.0,
        };
        let mut w = CanvasWidget::new("s", kind, json!(0.0));
        w.handle_pointer(WidgetPointer::Down, 115.0, 230.0);
        assert_eq!(w.value, json!(50.0));
        w.handle_pointer(WidgetPointer::Move { delta_x: 500.0 }, 500.0, 230.0);
        assert_eq!(w.value, json!(100.0));
    }

    #[test]
    fn combo_arrows_cycle_and_center_opens_menu() {
        let values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let kind = CanvasWidgetKind::Combo {
            values: values.clone(),
        };
        let mut w = CanvasWidget::new("c", kind, json!("a"));
        w.handle_pointer(WidgetPointer::Down, 200.0, 220.0);
        assert_eq!(w.value, json!("b"));
        assert_eq!(
            w.handle_pointer(WidgetPointer::Down, 100.0, 220.0),
            WidgetAction::OpenCombo { values }
        );
    }

    #[test]
    fn toggle_flips_and_disabled_ignores() {
        let mut w = CanvasWidget::new("t", CanvasWidgetKind::Toggle, json!(false));
        w.handle_pointer(WidgetPointer::Down, 100.0, 220.0);
        assert_eq!(w.value, json!(true));
        w.disabled = true;
        assert_eq!(w.handle_pointer(WidgetPointer::Down, 100.0, 220.0), WidgetAction::None);
        assert_eq!(w.value, json!(true));
    }

    #[test]
    fn prompt_answers_are_coerced() {
        let mut w = number(1.0);
        assert!(w.set_value_from_text("42"));
        assert_eq!(w.value, json!(10.0));
        assert!(!w.set_value_from_text("not a number"));
        assert_eq!(w.value_text(), "10");
    }
}
