//! Projects DOM widgets from node-local layout into host-element placement.
//!
//! Everything here is derived: given the node, the widget's resolved height
//! and the canvas transform, the placement is fully determined.

use super::DomWidget;
use crate::constants::{DOM_CLIP_MARGIN, DOM_HIDE_ZOOM_THRESHOLD, DOM_WIDGET_MARGIN};
use crate::geometry::{vec2, Rect, Vector2};
use crate::transform::Transform;
use crate::types::{Node, NodeId};

/// How the canvas surface maps onto the host's layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMetrics {
    /// Top-left of the canvas surface inside the element container
    pub origin: Vector2,
    /// Displayed size over backing-store size, per axis
    pub element_scale: Vector2,
}

impl Default for CanvasMetrics {
    fn default() -> Self {
        Self {
            origin: Vector2::ZERO,
            element_scale: vec2(1.0, 1.0),
        }
    }
}

/// Why a DOM widget is not shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenReason {
    /// The owner node is collapsed
    Collapsed,
    /// `hide_on_zoom` is set and the zoom is below 0.5
    ZoomedOut,
    /// Layout resolved no height
    NoHeight,
}

/// Rectangle cut out of a widget where the selected node covers it.
///
/// Coordinates are element-local and unscaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPath {
    /// Left of the hole
    pub x: f64,
    /// Top of the hole
    pub y: f64,
    /// Hole width
    pub width: f64,
    /// Hole height
    pub height: f64,
}

impl ClipPath {
    /// CSS `clip-path` polygon that keeps everything except the hole.
    pub fn to_css(&self) -> String {
        let (x, y, w, h) = (
            format!("{}px", self.x),
            format!("{}px", self.y),
            format!("{}px", self.width),
            format!("{}px", self.height),
        );
        format!(
            "polygon(0% 0%, 0% 100%, {x} 100%, {x} {y}, calc({x} + {w}) {y}, \
             calc({x} + {w}) calc({y} + {h}), {x} calc({y} + {h}), {x} 100%, 100% 100%, 100% 0%)"
        )
    }

    /// Parts of an element of `size` that stay visible, for hosts without
    /// polygon clipping. Empty strips are omitted.
    pub fn visible_rects(&self, size: Vector2) -> Vec<Rect> {
        let hole_right = self.x + self.width;
        let hole_bottom = self.y + self.height;
        let candidates = [
            Rect::new(0.0, 0.0, self.x, size.y),
            Rect::new(hole_right, 0.0, size.x - hole_right, size.y),
            Rect::new(self.x, 0.0, self.width, self.y),
            Rect::new(self.x, hole_bottom, self.width, size.y - hole_bottom),
        ];
        candidates
            .into_iter()
            .filter_map(|r| Rect::new(0.0, 0.0, size.x, size.y).intersection(&r))
            .collect()
    }
}

/// Where and how to show a visible DOM widget.
#[derive(Debug, Clone, PartialEq)]
pub struct DomPlacement {
    /// CSS left in container pixels
    pub left: f64,
    /// CSS top in container pixels
    pub top: f64,
    /// Horizontal scale applied with origin `0 0`
    pub scale_x: f64,
    /// Vertical scale applied with origin `0 0`
    pub scale_y: f64,
    /// Unscaled element width
    pub width: f64,
    /// Unscaled element height
    pub height: f64,
    /// Stacking order, the owner node's render index
    pub z_index: usize,
    /// Hole cut by the selected node, when clipping is enabled
    pub clip: Option<ClipPath>,
    /// The node is muted; the element is faded and ignores input
    pub dimmed: bool,
}

impl DomPlacement {
    /// CSS transform for the element.
    pub fn css_transform(&self) -> String {
        format!("matrix({}, 0, 0, {}, 0, 0)", self.scale_x, self.scale_y)
    }

    /// Screen-space rectangle covered by the element.
    pub fn screen_rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.width * self.scale_x,
            self.height * self.scale_y,
        )
    }
}

/// Result of projecting one DOM widget.
#[derive(Debug, Clone, PartialEq)]
pub enum DomVisibility {
    /// Element must be hidden
    Hidden(HiddenReason),
    /// Element must be shown at this placement
    Visible(DomPlacement),
}

/// Graph-space rectangle covered by a widget's element.
pub fn widget_graph_rect(node: &Node, widget: &DomWidget) -> Rect {
    let row_y = widget.y.or(widget.last_y).unwrap_or(0.0);
    let height = widget.computed_height.unwrap_or(0.0);
    Rect::new(
        node.pos.x + DOM_WIDGET_MARGIN,
        node.pos.y + DOM_WIDGET_MARGIN + row_y,
        node.size.x - DOM_WIDGET_MARGIN * 2.0,
        height - DOM_WIDGET_MARGIN * 2.0,
    )
}

/// Projects a DOM widget through the canvas transform.
///
/// # Arguments
///
/// * `node` - Owner node
/// * `node_index` - Owner's position in render order
/// * `widget` - Widget to place
/// * `transform` - Current pan/zoom
/// * `metrics` - Canvas surface to container mapping
/// * `occluder` - Topmost selected node, which clips widgets of other nodes
pub fn project_dom_widget(
    node: &Node,
    node_index: usize,
    widget: &DomWidget,
    transform: &Transform,
    metrics: &CanvasMetrics,
    occluder: Option<&Node>,
) -> DomVisibility {
    if node.flags.collapsed {
        return DomVisibility::Hidden(HiddenReason::Collapsed);
    }
    if widget.options.hide_on_zoom && transform.scale() < DOM_HIDE_ZOOM_THRESHOLD {
        return DomVisibility::Hidden(HiddenReason::ZoomedOut);
    }
    let height = match widget.computed_height {
        Some(h) if h > 0.0 => h,
        _ => return DomVisibility::Hidden(HiddenReason::NoHeight),
    };

    let scale_x = metrics.element_scale.x * transform.scale();
    let scale_y = metrics.element_scale.y * transform.scale();
    let graph_rect = widget_graph_rect(node, widget);
    let anchor = graph_rect.min() + transform.offset;

    let clip = if widget.options.enable_dom_clipping {
        occluder
            .filter(|other| other.id != node.id)
            .and_then(|other| clip_against(&graph_rect, other))
    } else {
        None
    };

    DomVisibility::Visible(DomPlacement {
        left: metrics.origin.x + anchor.x * scale_x,
        top: metrics.origin.y + anchor.y * scale_y,
        scale_x,
        scale_y,
        width: node.size.x - DOM_WIDGET_MARGIN * 2.0,
        height: height - DOM_WIDGET_MARGIN * 2.0,
        z_index: node_index,
        clip,
        dimmed: node.mode.dims_dom_widgets(),
    })
}

/// Hole cut into `widget_rect` by `other`'s bounds grown by the clip margin.
fn clip_against(widget_rect: &Rect, other: &Node) -> Option<ClipPath> {
    let covered = other.bounding().inflate(DOM_CLIP_MARGIN);
    let hit = widget_rect.intersection(&covered)?;
    Some(ClipPath {
        x: hit.x - widget_rect.x,
        y: hit.y - widget_rect.y,
        width: hit.width,
        height: hit.height,
    })
}

/// Topmost selected node in render order.
pub fn topmost_selected<'a>(nodes: &'a [Node], selection: &[NodeId]) -> Option<&'a Node> {
    nodes.iter().rev().find(|n| selection.contains(&n.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeMode;
    use crate::widgets::{DomElementKind, DomWidgetOptions};

    fn node_with_widget(pos: Vector2, clipping: bool) -> (Node, DomWidget) {
        let mut node = Node::new("Text", "demo/text", pos);
        node.size = vec2(200.0, 120.0);
        let mut widget = DomWidget::new(
            "text",
            DomElementKind::TextArea {
                placeholder: String::new(),
            },
        )
        .with_options(DomWidgetOptions {
            hide_on_zoom: true,
            enable_dom_clipping: clipping,
            ..Default::default()
        });
        widget.y = Some(20.0);
        widget.computed_height = Some(80.0);
        (node, widget)
    }

    fn placement(v: DomVisibility) -> DomPlacement {
        match v {
            DomVisibility::Visible(p) => p,
            DomVisibility::Hidden(reason) => panic!("unexpectedly hidden: {reason:?}"),
        }
    }

    #[test]
    fn identity_transform_offsets_by_margin_and_row() {
        let (node, widget) = node_with_widget(vec2(100.0, 100.0), false);
        let p = placement(project_dom_widget(
            &node,
            3,
            &widget,
            &Transform::default(),
            &CanvasMetrics::default(),
            None,
        ));
        assert_eq!((p.left, p.top), (110.0, 130.0));
        assert_eq!((p.width, p.height), (180.0, 60.0));
        assert_eq!((p.scale_x, p.scale_y), (1.0, 1.0));
        assert_eq!(p.z_index, 3);
        assert!(p.clip.is_none());
    }

    #[test]
    fn placement_follows_pan_zoom_and_element_scale() {
        let (node, widget) = node_with_widget(vec2(100.0, 100.0), false);
        let mut transform = Transform::default();
        transform.offset = vec2(10.0, 0.0);
        transform.change_scale(2.0, Vector2::ZERO);
        let metrics = CanvasMetrics {
            origin: vec2(5.0, 7.0),
            element_scale: vec2(0.5, 0.5),
        };
        let p = placement(project_dom_widget(&node, 0, &widget, &transform, &metrics, None));
        assert_eq!(p.scale_x, 1.0);
        assert_eq!(p.left, 5.0 + 120.0);
        assert_eq!(p.top, 7.0 + 130.0);
        assert_eq!(p.css_transform(), "matrix(1, 0, 0, 1, 0, 0)");
    }

    #[test]
    fn hidden_when_collapsed_zoomed_out_or_without_height() {
        let (mut node, mut widget) = node_with_widget(Vector2::ZERO, false);
        let metrics = CanvasMetrics::default();

        let mut zoomed = Transform::default();
        zoomed.change_scale(0.4, Vector2::ZERO);
        assert_eq!(
            project_dom_widget(&node, 0, &widget, &zoomed, &metrics, None),
            DomVisibility::Hidden(HiddenReason::ZoomedOut)
        );

        widget.computed_height = Some(0.0);
        assert_eq!(
            project_dom_widget(&node, 0, &widget, &Transform::default(), &metrics, None),
            DomVisibility::Hidden(HiddenReason::NoHeight)
        );

        node.flags.collapsed = true;
        assert_eq!(
            project_dom_widget(&node, 0, &widget, &Transform::default(), &metrics, None),
            DomVisibility::Hidden(HiddenReason::Collapsed)
        );
    }

    #[test]
    fn selected_node_on_top_cuts_a_hole() {
        let (node, widget) = node_with_widget(vec2(0.0, 0.0), true);
        // Widget element spans (10, 30) to (190, 90) in graph space.
        let mut other = Node::new("Other", "demo/const", vec2(150.0, 60.0));
        other.size = vec2(100.0, 100.0);

        let p = placement(project_dom_widget(
            &node,
            0,
            &widget,
            &Transform::default(),
            &CanvasMetrics::default(),
            Some(&other),
        ));
        // Other's bounds with title and margin: (143, 23) to (257, 167).
        let clip = p.clip.expect("overlap produces a clip path");
        assert_eq!(
            clip,
            ClipPath {
                x: 133.0,
                y: 0.0,
                width: 47.0,
                height: 60.0,
            }
        );
        assert!(clip.to_css().starts_with("polygon(0% 0%, 0% 100%, 133px 100%"));
        assert_eq!(
            clip.visible_rects(vec2(180.0, 60.0)),
            vec![Rect::new(0.0, 0.0, 133.0, 60.0)]
        );
    }

    #[test]
    fn no_clip_for_own_node_or_distant_node() {
        let (node, widget) = node_with_widget(vec2(0.0, 0.0), true);
        let far = Node::new("Far", "demo/const", vec2(1000.0, 1000.0));
        for occluder in [&node, &far] {
            let p = placement(project_dom_widget(
                &node,
                0,
                &widget,
                &Transform::default(),
                &CanvasMetrics::default(),
                Some(occluder),
            ));
            assert!(p.clip.is_none());
        }
    }

    #[test]
    fn topmost_selected_prefers_later_nodes() {
        let a = Node::new("A", "t", Vector2::ZERO);
        let b = Node::new("B", "t", Vector2::ZERO);
        let c = Node::new("C", "t", Vector2::ZERO);
        let selection = vec![b.id, a.id];
        let nodes = vec![a, b, c];
        assert_eq!(
            topmost_selected(&nodes, &selection).map(|n| n.title.as_str()),
            Some("B")
        );
    }

    #[test]
    fn muted_and_on_request_nodes_dim_their_elements() {
        let (mut node, widget) = node_with_widget(vec2(0.0, 0.0), false);
        let project = |node: &Node| {
            placement(project_dom_widget(
                node,
                0,
                &widget,
                &Transform::default(),
                &CanvasMetrics::default(),
                None,
            ))
        };
        assert!(!project(&node).dimmed);
        for mode in [NodeMode::Never, NodeMode::OnRequest] {
            node.mode = mode;
            assert!(project(&node).dimmed, "{mode:?} should dim");
        }
        node.mode = NodeMode::Bypass;
        assert!(!project(&node).dimmed);
    }
}
