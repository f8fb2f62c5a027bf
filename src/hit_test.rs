//! Hit-testing in graph space.
//!
//! All functions take graph-space points. Sizes are graph units unless a
//! `scale` argument converts a screen-space tolerance.

use crate::constants::*;
use crate::geometry::{vec2, Rect, Vector2};
use crate::graph::Graph;
use crate::types::{Group, Link, LinkId, Node};

/// Point on the link curve at parameter `t`.
///
/// Links are cubic beziers whose control points leave each endpoint
/// horizontally, a quarter of the endpoint distance away.
pub fn bezier_point(start: Vector2, end: Vector2, t: f64) -> Vector2 {
    let reach = start.distance(end) * LINK_CURVE_FACTOR;
    let c1 = start + vec2(reach, 0.0);
    let c2 = end - vec2(reach, 0.0);
    let u = 1.0 - t;
    start * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + end * (t * t * t)
}

/// Bezier control points for drawing a link between two anchors.
pub fn link_control_points(start: Vector2, end: Vector2) -> [Vector2; 4] {
    let reach = start.distance(end) * LINK_CURVE_FACTOR;
    [start, start + vec2(reach, 0.0), end - vec2(reach, 0.0), end]
}

/// Graph-space endpoints of a link, output first.
pub fn link_endpoints(graph: &Graph, link: &Link) -> Option<(Vector2, Vector2)> {
    let origin = graph.node(link.origin_id)?;
    let target = graph.node(link.target_id)?;
    Some((
        origin.connection_pos(false, link.origin_slot),
        target.connection_pos(true, link.target_slot),
    ))
}

/// Visual midpoint of a link.
pub fn link_midpoint(graph: &Graph, link: &Link) -> Option<Vector2> {
    let (start, end) = link_endpoints(graph, link)?;
    Some(bezier_point(start, end, 0.5))
}

/// Link whose midpoint lies within `tolerance` screen pixels of `pos`.
pub fn link_center_at(graph: &Graph, pos: Vector2, tolerance: f64, scale: f64) -> Option<LinkId> {
    let half = tolerance / scale;
    graph
        .links()
        .filter_map(|link| Some((link.id, link_midpoint(graph, link)?)))
        .find(|(_, mid)| (pos.x - mid.x).abs() <= half && (pos.y - mid.y).abs() <= half)
        .map(|(id, _)| id)
}

/// Hotspot rectangle around a slot's connection point.
pub fn slot_hotspot(node: &Node, is_input: bool, slot: usize) -> Rect {
    let anchor = node.connection_pos(is_input, slot);
    Rect::new(
        anchor.x - SLOT_HOTSPOT_HALF_WIDTH,
        anchor.y - SLOT_HOTSPOT_HALF_HEIGHT,
        SLOT_HOTSPOT_HALF_WIDTH * 2.0,
        SLOT_HOTSPOT_HALF_HEIGHT * 2.0,
    )
}

/// Index of the input or output whose hotspot contains `pos`.
pub fn slot_at(node: &Node, pos: Vector2, is_output: bool) -> Option<usize> {
    let count = if is_output {
        node.outputs.len()
    } else {
        node.inputs.len()
    };
    (0..count).find(|&i| slot_hotspot(node, !is_output, i).contains(pos))
}

/// Whether `pos` is on the bottom-right resize handle.
pub fn resize_handle_at(node: &Node, pos: Vector2) -> bool {
    if !node.resizable || node.flags.collapsed {
        return false;
    }
    let corner = node.pos + node.size;
    Rect::new(
        corner.x - RESIZE_HANDLE_SIZE,
        corner.y - RESIZE_HANDLE_SIZE,
        RESIZE_HANDLE_SIZE,
        RESIZE_HANDLE_SIZE,
    )
    .contains(pos)
}

/// Whether `pos` is anywhere on the title bar.
pub fn title_at(node: &Node, pos: Vector2) -> bool {
    node.title_rect().contains(pos)
}

/// Whether `pos` is on the collapse box at the left of the title bar.
pub fn collapse_box_at(node: &Node, pos: Vector2) -> bool {
    Rect::new(
        node.pos.x,
        node.pos.y - NODE_TITLE_HEIGHT,
        NODE_TITLE_HEIGHT,
        NODE_TITLE_HEIGHT,
    )
    .contains(pos)
}

/// Whether `pos` is on the "open subgraph" button at the right of the title bar.
pub fn subgraph_button_at(node: &Node, pos: Vector2) -> bool {
    node.has_subgraph
        && !node.flags.collapsed
        && Rect::new(
            node.pos.x + node.size.x - NODE_TITLE_HEIGHT,
            node.pos.y - NODE_TITLE_HEIGHT,
            NODE_TITLE_HEIGHT,
            NODE_TITLE_HEIGHT,
        )
        .contains(pos)
}

/// Whether `pos` is close enough to the bottom-right corner to resize the group.
pub fn group_resize_corner(group: &Group, pos: Vector2, scale: f64) -> bool {
    pos.distance(group.pos + group.size) * scale < GROUP_RESIZE_DISTANCE
}

/// Whether `pos` is on the group's draggable header.
pub fn group_header_at(group: &Group, pos: Vector2) -> bool {
    let header = group.header_rect();
    pos.x >= header.x
        && pos.x <= header.x + header.width
        && pos.y >= header.y
        && pos.y <= header.y + header.height
}

/// Index of the widget row under `pos`.
pub fn widget_at(node: &Node, pos: Vector2) -> Option<usize> {
    if node.flags.collapsed {
        return None;
    }
    let local = pos - node.pos;
    if local.x < WIDGET_MARGIN_X || local.x > node.size.x - WIDGET_MARGIN_X {
        return None;
    }
    node.widgets.iter().position(|w| {
        w.last_y()
            .is_some_and(|top| local.y >= top && local.y <= top + w.hit_height())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Group;
    use crate::widgets::{CanvasWidget, CanvasWidgetKind};
    use serde_json::json;

    fn node() -> Node {
        let mut n = Node::new("N", "test", vec2(100.0, 100.0))
            .with_input("a", "number")
            .with_input("b", "number")
            .with_output("out", "number");
        n.size = vec2(200.0, 100.0);
        n
    }

    #[test]
    fn slot_hotspots_surround_anchors() {
        let n = node();
        // input 1 anchor is (110, 134)
        assert_eq!(slot_at(&n, vec2(96.0, 126.0), false), Some(1));
        assert_eq!(slot_at(&n, vec2(124.0, 142.0), false), Some(1));
        assert_eq!(slot_at(&n, vec2(130.0, 134.0), false), None);
        // output 0 anchor is (291, 114)
        assert_eq!(slot_at(&n, vec2(300.0, 114.0), true), Some(0));
        assert_eq!(slot_at(&n, vec2(300.0, 114.0), false), None);
    }

    #[test]
    fn resize_handle_is_bottom_right_corner() {
        let mut n = node();
        assert!(resize_handle_at(&n, vec2(295.0, 195.0)));
        assert!(!resize_handle_at(&n, vec2(280.0, 195.0)));
        n.flags.collapsed = true;
        assert!(!resize_handle_at(&n, vec2(295.0, 195.0)));
        n.flags.collapsed = false;
        n.resizable = false;
        assert!(!resize_handle_at(&n, vec2(295.0, 195.0)));
    }

    #[test]
    fn title_boxes() {
        let mut n = node();
        assert!(collapse_box_at(&n, vec2(110.0, 80.0)));
        assert!(!collapse_box_at(&n, vec2(150.0, 80.0)));
        assert!(title_at(&n, vec2(150.0, 80.0)));
        assert!(!subgraph_button_at(&n, vec2(290.0, 80.0)));
        n.has_subgraph = true;
        assert!(subgraph_button_at(&n, vec2(290.0, 80.0)));
    }

    #[test]
    fn link_midpoint_of_straight_link_is_center() {
        let mut graph = Graph::new();
        let mut a = Node::new("A", "t", vec2(0.0, 0.0)).with_output("o", "*");
        a.size = vec2(101.0, 60.0);
        let b = Node::new("B", "t", vec2(200.0, 0.0)).with_input("i", "*");
        let (a, b) = (graph.add_node(a), graph.add_node(b));
        let link = graph.connect(a, 0, b, 0).unwrap();

        // output anchor (92, 14), input anchor (210, 14)
        let mid = link_midpoint(&graph, graph.link(link).unwrap()).unwrap();
        assert_eq!(mid, vec2(151.0, 14.0));
        assert_eq!(link_center_at(&graph, vec2(154.0, 17.0), 5.0, 1.0), Some(link));
        assert_eq!(link_center_at(&graph, vec2(154.0, 17.0), 5.0, 2.0), None);
    }

    #[test]
    fn group_corner_uses_screen_distance() {
        let group = Group::new("G", Rect::new(0.0, 0.0, 200.0, 100.0));
        assert!(group_resize_corner(&group, vec2(195.0, 97.0), 1.0));
        assert!(!group_resize_corner(&group, vec2(195.0, 97.0), 2.0));
        assert!(group_header_at(&group, vec2(50.0, 20.0)));
        assert!(!group_header_at(&group, vec2(50.0, 40.0)));
    }

    #[test]
    fn widget_rows_use_last_drawn_offsets() {
        let mut n = node().with_widget(CanvasWidget::new(
            "t",
            CanvasWidgetKind::Toggle,
            json!(false),
        ));
        assert_eq!(widget_at(&n, vec2(150.0, 150.0)), None);
        n.record_widget_rows();
        // slot area is 2 rows, so the widget starts at local y 44
        assert_eq!(widget_at(&n, vec2(150.0, 150.0)), Some(0));
        assert_eq!(widget_at(&n, vec2(105.0, 150.0)), None);
        assert_eq!(widget_at(&n, vec2(150.0, 170.0)), None);
    }
}
