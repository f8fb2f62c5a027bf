//! Vertical layout of a node's widget stack.
//!
//! Canvas-drawn widgets report a fixed height. DOM widgets flex between their
//! minimum and preferred heights and share whatever space the node has left.
//! Layout is incremental: it starts from where the first row was last drawn
//! rather than from the top of the node.

use super::Widget;
use crate::constants::WIDGET_SPACING;
use crate::geometry::Vector2;

/// Result of a layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutOutcome {
    /// Nothing has been drawn yet, so there is no starting offset
    Skipped,
    /// Every widget fit within the current node height
    Fitted,
    /// The node had to grow to fit the minimum heights
    Grew {
        /// Height added to the node
        by: f64,
    },
}

struct Flexible {
    index: usize,
    min: f64,
    preferred: Option<f64>,
}

/// Resolves DOM widget heights and assigns every row its `y`.
///
/// `size` is the node size; its height grows when the minimums do not fit.
pub fn compute_widget_layout(widgets: &mut [Widget], size: &mut Vector2) -> LayoutOutcome {
    let Some(start_y) = widgets.first().and_then(Widget::last_y) else {
        return LayoutOutcome::Skipped;
    };

    let mut free_space = size.y - start_y;
    let mut flexible = Vec::new();
    for (index, widget) in widgets.iter().enumerate() {
        match widget {
            Widget::Canvas(w) => free_space -= w.height() + WIDGET_SPACING,
            Widget::Dom(w) => flexible.push(Flexible {
                index,
                min: w.min_height(),
                preferred: w.preferred_height(size.y),
            }),
        }
    }

    let mut heights: Vec<f64> = flexible.iter().map(|f| f.min).collect();
    free_space -= heights.iter().sum::<f64>();

    let outcome = if free_space < 0.0 {
        size.y -= free_space;
        LayoutOutcome::Grew { by: -free_space }
    } else {
        // (slot in `flexible`, growth wanted above the minimum)
        let mut wants_growth: Vec<(usize, f64)> = flexible
            .iter()
            .enumerate()
            .filter_map(|(slot, f)| {
                let diff = f.preferred? - f.min;
                (diff > 0.0).then_some((slot, diff))
            })
            .collect();
        let requested: f64 = wants_growth.iter().map(|(_, diff)| diff).sum();

        if free_space >= requested {
            for &(slot, diff) in &wants_growth {
                heights[slot] += diff;
            }
            free_space -= requested;
        } else {
            share_shortfall(&mut wants_growth, requested - free_space, &mut heights);
            free_space = 0.0;
        }

        let auto: Vec<usize> = flexible
            .iter()
            .enumerate()
            .filter(|(_, f)| f.preferred.is_none())
            .map(|(slot, _)| slot)
            .collect();
        if free_space > 0.0 && !auto.is_empty() {
            let share = free_space / auto.len() as f64;
            for slot in auto {
                heights[slot] += share;
            }
        }
        LayoutOutcome::Fitted
    };

    for (f, height) in flexible.iter().zip(&heights) {
        if let Widget::Dom(w) = &mut widgets[f.index] {
            w.computed_height = Some(*height);
        }
    }

    let mut y = start_y;
    for widget in widgets.iter_mut() {
        widget.set_y(y);
        y += match widget {
            Widget::Dom(w) => w.computed_height.filter(|h| *h > 0.0).unwrap_or(0.0),
            Widget::Canvas(w) => w.height() + WIDGET_SPACING,
        };
    }

    outcome
}

/// Cuts `shortfall` out of the requested growth in equal shares.
///
/// A widget never drops below its minimum; whatever its share could not
/// absorb is spread over the widgets that still have room.
fn share_shortfall(wants_growth: &mut [(usize, f64)], shortfall: f64, heights: &mut [f64]) {
    wants_growth.sort_by(|a, b| a.1.total_cmp(&b.1));
    let mut remaining = shortfall;
    let count = wants_growth.len();
    for (n, &(slot, diff)) in wants_growth.iter().enumerate() {
        let share = remaining / (count - n) as f64;
        let cut = share.min(diff);
        heights[slot] += diff - cut;
        remaining -= cut;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2;
    use crate::widgets::{
        CanvasWidget, CanvasWidgetKind, DomElementKind, DomWidget, DomWidgetOptions,
        PreferredHeight,
    };
    use serde_json::json;

    fn dom(min: Option<f64>, preferred: Option<PreferredHeight>) -> Widget {
        DomWidget::new(
            "dom",
            DomElementKind::TextArea {
                placeholder: String::new(),
            },
        )
        .with_options(DomWidgetOptions {
            min_height: min,
            preferred_height: preferred,
            ..Default::default()
        })
        .into()
    }

    fn button() -> Widget {
        CanvasWidget::new("go", CanvasWidgetKind::Button, json!(null)).into()
    }

    fn computed(widget: &Widget) -> f64 {
        match widget {
            Widget::Dom(w) => w.computed_height.unwrap_or(f64::NAN),
            Widget::Canvas(_) => panic!("not a DOM widget"),
        }
    }

    #[test]
    fn skipped_until_first_row_is_drawn() {
        let mut widgets = vec![dom(None, None)];
        let mut size = vec2(200.0, 100.0);
        assert_eq!(compute_widget_layout(&mut widgets, &mut size), LayoutOutcome::Skipped);
        assert_eq!(widgets[0].y(), None);
    }

    #[test]
    fn preferred_height_exactly_fills_free_space() {
        let mut widgets = vec![dom(Some(50.0), Some(PreferredHeight::Pixels(80.0)))];
        widgets[0].set_last_y(20.0);
        let mut size = vec2(200.0, 100.0);

        let outcome = compute_widget_layout(&mut widgets, &mut size);

        assert_eq!(outcome, LayoutOutcome::Fitted);
        assert_eq!(computed(&widgets[0]), 80.0);
        assert_eq!(size.y, 100.0);
        assert_eq!(widgets[0].y(), Some(20.0));
    }

    #[test]
    fn node_grows_by_the_deficit() {
        let mut widgets = vec![button(), dom(None, Some(PreferredHeight::Percent(90.0)))];
        widgets[0].set_last_y(20.0);
        let mut size = vec2(200.0, 60.0);

        // 60 - 20 - 24 (button row) - 50 (minimum) = -34
        let outcome = compute_widget_layout(&mut widgets, &mut size);

        assert_eq!(outcome, LayoutOutcome::Grew { by: 34.0 });
        assert_eq!(size.y, 94.0);
        assert_eq!(computed(&widgets[1]), 50.0);
        assert_eq!(widgets[1].y(), Some(44.0));
    }

    #[test]
    fn shortfall_is_shared_without_going_below_minimum() {
        let mut widgets = vec![
            dom(Some(50.0), Some(PreferredHeight::Pixels(60.0))),
            dom(Some(50.0), Some(PreferredHeight::Pixels(150.0))),
        ];
        widgets[0].set_last_y(0.0);
        let mut size = vec2(200.0, 150.0);

        // 50 free after minimums, 110 requested: the small request absorbs
        // only 10 of its 30 share, the rest lands on the large one.
        compute_widget_layout(&mut widgets, &mut size);

        assert_eq!(computed(&widgets[0]), 50.0);
        assert_eq!(computed(&widgets[1]), 100.0);
        assert_eq!(widgets[1].y(), Some(50.0));
        assert_eq!(size.y, 150.0);
    }

    #[test]
    fn leftover_space_goes_to_auto_widgets_evenly() {
        let mut widgets = vec![
            dom(None, Some(PreferredHeight::Pixels(70.0))),
            dom(None, None),
            dom(None, None),
        ];
        widgets[0].set_last_y(10.0);
        let mut size = vec2(200.0, 250.0);

        // 240 free - 70 - 50 - 50 = 70 left, split between the two auto widgets
        compute_widget_layout(&mut widgets, &mut size);

        assert_eq!(computed(&widgets[0]), 70.0);
        assert_eq!(computed(&widgets[1]), 85.0);
        assert_eq!(computed(&widgets[2]), 85.0);
        assert_eq!(widgets[2].y(), Some(165.0));
    }

    #[test]
    fn canvas_rows_advance_by_height_plus_spacing() {
        let mut widgets = vec![button(), button(), dom(None, None)];
        widgets[0].set_last_y(40.0);
        let mut size = vec2(200.0, 200.0);

        compute_widget_layout(&mut widgets, &mut size);

        assert_eq!(widgets[1].y(), Some(64.0));
        assert_eq!(widgets[2].y(), Some(88.0));
        assert_eq!(computed(&widgets[2]), 112.0);
    }
}
