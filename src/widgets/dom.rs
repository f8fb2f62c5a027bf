//! DOM-backed widgets: native elements laid over the canvas.

use crate::constants::DOM_DEFAULT_MIN_HEIGHT;
use serde::{Deserialize, Serialize};

/// Preferred height of a DOM widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PreferredHeight {
    /// Absolute height in graph units
    Pixels(f64),
    /// Share of the node's height, in percent
    Percent(f64),
}

/// Element events that select the owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectOn {
    /// The element gains keyboard focus
    Focus,
    /// The element is clicked
    Click,
}

/// Layout and presentation options of a DOM widget.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DomWidgetOptions {
    /// Hide the element when zoomed out below 0.5
    pub hide_on_zoom: bool,
    /// Cut out the region covered by the selected node
    pub enable_dom_clipping: bool,
    /// Lower height bound; defaults to 50
    pub min_height: Option<f64>,
    /// Upper height bound
    pub max_height: Option<f64>,
    /// Height to grow to when space allows
    pub preferred_height: Option<PreferredHeight>,
    /// Element events that select the node
    pub select_on: Vec<SelectOn>,
}

/// Native element a DOM widget mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomElementKind {
    /// Multi-line text input
    TextArea {
        /// Hint shown while empty
        placeholder: String,
    },
    /// File picker
    FileInput {
        /// Accepted MIME types or extensions
        accept: String,
    },
    /// Embedded frame
    Embed {
        /// Source URL
        url: String,
    },
}

/// A widget backed by a native element positioned over the canvas.
///
/// Visibility and placement are derived every draw from `computed_height`,
/// the owner node and the canvas transform; the widget keeps no other view
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomWidget {
    /// Name, also used as the property key
    pub name: String,
    /// Element to mount
    pub kind: DomElementKind,
    /// Layout options
    #[serde(default)]
    pub options: DomWidgetOptions,
    /// Element content (text or selected file name)
    #[serde(default)]
    pub value: String,
    /// Node-local top assigned by layout
    #[serde(skip)]
    pub y: Option<f64>,
    /// Node-local top where the row was last drawn
    #[serde(skip)]
    pub last_y: Option<f64>,
    /// Height resolved by layout
    #[serde(skip)]
    pub computed_height: Option<f64>,
}

impl DomWidget {
    /// Creates a DOM widget with default options.
    pub fn new(name: impl Into<String>, kind: DomElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            options: DomWidgetOptions::default(),
            value: String::new(),
            y: None,
            last_y: None,
            computed_height: None,
        }
    }

    /// Replaces the options and returns `self` for chaining.
    pub fn with_options(mut self, options: DomWidgetOptions) -> Self {
        self.options = options;
        self
    }

    /// Effective minimum height.
    ///
    /// A pixel preference without an explicit minimum doubles as the minimum.
    pub fn min_height(&self) -> f64 {
        match (self.options.min_height, self.options.preferred_height) {
            (Some(min), _) => min,
            (None, Some(PreferredHeight::Pixels(px))) => px,
            (None, _) => DOM_DEFAULT_MIN_HEIGHT,
        }
    }

    /// Preferred height for a node of the given height, capped by `max_height`.
    ///
    /// Without a preference, `max_height` stands in for one.
    pub fn preferred_height(&self, node_height: f64) -> Option<f64> {
        let preferred = self.options.preferred_height.map(|p| match p {
            PreferredHeight::Pixels(px) => px,
            PreferredHeight::Percent(pct) => node_height * pct / 100.0,
        });
        match (preferred, self.options.max_height) {
            (Some(p), Some(max)) => Some(p.min(max)),
            (Some(p), None) => Some(p),
            (None, max) => max,
        }
    }

    /// Whether the given element event should select the owner node.
    pub fn selects_on(&self, trigger: SelectOn) -> bool {
        self.options.select_on.contains(&trigger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textarea() -> DomWidget {
        DomWidget::new(
            "text",
            DomElementKind::TextArea {
                placeholder: String::new(),
            },
        )
    }

    #[test]
    fn minimum_defaults_to_fifty() {
        assert_eq!(textarea().min_height(), DOM_DEFAULT_MIN_HEIGHT);
    }

    #[test]
    fn pixel_preference_doubles_as_minimum() {
        let w = textarea().with_options(DomWidgetOptions {
            preferred_height: Some(PreferredHeight::Pixels(120.0)),
            ..Default::default()
        });
        assert_eq!(w.min_height(), 120.0);

        let pct = textarea().with_options(DomWidgetOptions {
            preferred_height: Some(PreferredHeight::Percent(50.0)),
            ..Default::default()
        });
        assert_eq!(pct.min_height(), DOM_DEFAULT_MIN_HEIGHT);
        assert_eq!(pct.preferred_height(300.0), Some(150.0));
    }

    #[test]
    fn max_height_caps_or_replaces_preference() {
        let capped = textarea().with_options(DomWidgetOptions {
            preferred_height: Some(PreferredHeight::Percent(100.0)),
            max_height: Some(90.0),
            ..Default::default()
        });
        assert_eq!(capped.preferred_height(200.0), Some(90.0));

        let only_max = textarea().with_options(DomWidgetOptions {
            max_height: Some(70.0),
            ..Default::default()
        });
        assert_eq!(only_max.preferred_height(200.0), Some(70.0));
        assert_eq!(textarea().preferred_height(200.0), None);
    }

    #[test]
    fn select_on_triggers() {
        let w = textarea().with_options(DomWidgetOptions {
            select_on: vec![SelectOn::Focus],
            ..Default::default()
        });
        assert!(w.selects_on(SelectOn::Focus));
        assert!(!w.selects_on(SelectOn::Click));
    }
}
