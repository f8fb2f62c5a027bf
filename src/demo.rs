//! Built-in node templates and a starter graph.
//!
//! The templates back the search box, the connection menu and the
//! middle-click "default node for slot" action. None of them execute
//! anything; they exist to exercise slots, widgets and DOM widgets.

use crate::geometry::{vec2, Rect, Vector2};
use crate::graph::{is_valid_connection, Graph};
use crate::types::{Group, Node};
use crate::widgets::{
    CanvasWidget, CanvasWidgetKind, DomElementKind, DomWidget, DomWidgetOptions, PreferredHeight,
    SelectOn,
};
use serde_json::json;

/// Node templates available from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Outputs a number set with a number widget
    Constant,
    /// Adds two numbers
    Add,
    /// Compares two numbers with a selectable operator
    Compare,
    /// Shows whatever reaches its input
    Watch,
    /// Text area plus file picker as DOM widgets
    TextAndFile,
    /// Embedded web page
    Embed,
    /// One of every canvas widget
    WidgetShowcase,
    /// Node with an "open subgraph" button
    Subgraph,
}

/// Metadata for a single template.
pub struct TemplateInfo {
    /// Stable identifier
    pub kind: TemplateKind,
    /// Display name
    pub name: &'static str,
    /// Node type string stamped on created nodes
    pub node_type: &'static str,
}

/// Returns all templates with their display names.
pub const fn all_templates() -> &'static [TemplateInfo] {
    const TEMPLATES: &[TemplateInfo] = &[
        TemplateInfo {
            kind: TemplateKind::Constant,
            name: "Constant",
            node_type: "basic/const",
        },
        TemplateInfo {
            kind: TemplateKind::Add,
            name: "Add",
            node_type: "math/add",
        },
        TemplateInfo {
            kind: TemplateKind::Compare,
            name: "Compare",
            node_type: "math/compare",
        },
        TemplateInfo {
            kind: TemplateKind::Watch,
            name: "Watch",
            node_type: "basic/watch",
        },
        TemplateInfo {
            kind: TemplateKind::TextAndFile,
            name: "Text & File",
            node_type: "demo/text_file",
        },
        TemplateInfo {
            kind: TemplateKind::Embed,
            name: "Embed",
            node_type: "demo/embed",
        },
        TemplateInfo {
            kind: TemplateKind::WidgetShowcase,
            name: "Widget Showcase",
            node_type: "demo/widgets",
        },
        TemplateInfo {
            kind: TemplateKind::Subgraph,
            name: "Subgraph",
            node_type: "basic/subgraph",
        },
    ];
    TEMPLATES
}

fn info(kind: TemplateKind) -> &'static TemplateInfo {
    all_templates()
        .iter()
        .find(|t| t.kind == kind)
        .unwrap_or(&all_templates()[0])
}

/// Builds a node from a template at `pos`, sized to fit its content.
pub fn build_node(kind: TemplateKind, pos: Vector2) -> Node {
    let meta = info(kind);
    let node = Node::new(meta.name, meta.node_type, pos);
    let mut node = match kind {
        TemplateKind::Constant => node.with_output("value", "number").with_widget(CanvasWidget::new(
            "value",
            CanvasWidgetKind::Number {
                step: 1.0,
                min: None,
                max: None,
            },
            json!(1.0),
        )),
        TemplateKind::Add => node
            .with_input("a", "number")
            .with_input("b", "number")
            .with_output("sum", "number"),
        TemplateKind::Compare => node
            .with_input("a", "number")
            .with_input("b", "number")
            .with_output("result", "boolean")
            .with_widget(CanvasWidget::new(
                "op",
                CanvasWidgetKind::Combo {
                    values: ["==", "!=", "<", ">"].iter().map(|s| s.to_string()).collect(),
                },
                json!("=="),
            )),
        TemplateKind::Watch => node.with_input("value", "*"),
        TemplateKind::TextAndFile => node
            .with_input("text", "string")
            .with_output("text", "string")
            .with_widget(
                DomWidget::new(
                    "notes",
                    DomElementKind::TextArea {
                        placeholder: "Type here".to_string(),
                    },
                )
                .with_options(DomWidgetOptions {
                    enable_dom_clipping: true,
                    preferred_height: Some(PreferredHeight::Percent(60.0)),
                    select_on: vec![SelectOn::Focus, SelectOn::Click],
                    ..Default::default()
                }),
            )
            .with_widget(
                DomWidget::new(
                    "file",
                    DomElementKind::FileInput {
                        accept: ".txt,.json".to_string(),
                    },
                )
                .with_options(DomWidgetOptions {
                    min_height: Some(30.0),
                    max_height: Some(30.0),
                    select_on: vec![SelectOn::Click],
                    ..Default::default()
                }),
            ),
        TemplateKind::Embed => node.with_widget(
            DomWidget::new(
                "page",
                DomElementKind::Embed {
                    url: "https://example.com".to_string(),
                },
            )
            .with_options(DomWidgetOptions {
                hide_on_zoom: true,
                enable_dom_clipping: true,
                min_height: Some(120.0),
                preferred_height: Some(PreferredHeight::Pixels(200.0)),
                ..Default::default()
            }),
        ),
        TemplateKind::WidgetShowcase => node
            .with_input("in", "*")
            .with_widget(CanvasWidget::new("fire", CanvasWidgetKind::Button, json!(null)))
            .with_widget(CanvasWidget::new("enabled", CanvasWidgetKind::Toggle, json!(true)))
            .with_widget(CanvasWidget::new(
                "amount",
                CanvasWidgetKind::Slider { min: 0.0, max: 1.0 },
                json!(0.5),
            ))
            .with_widget(CanvasWidget::new(
                "count",
                CanvasWidgetKind::Number {
                    step: 1.0,
                    min: Some(0.0),
                    max: Some(10.0),
                },
                json!(3.0),
            ))
            .with_widget(CanvasWidget::new(
                "mode",
                CanvasWidgetKind::Combo {
                    values: vec!["fast".to_string(), "slow".to_string()],
                },
                json!("fast"),
            ))
            .with_widget(CanvasWidget::new("label", CanvasWidgetKind::Text, json!("hello"))),
        TemplateKind::Subgraph => {
            let mut n = node.with_input("in", "*").with_output("out", "*");
            n.has_subgraph = true;
            n
        }
    };
    node.size = node.compute_min_size().max(node.size);
    node
}

/// Templates with a slot that can continue a link of `slot_type`.
///
/// `from_output` is true when the link is dragged from an output, so the
/// template needs a compatible input.
pub fn templates_for_slot(slot_type: &str, from_output: bool) -> Vec<&'static TemplateInfo> {
    all_templates()
        .iter()
        .filter(|t| {
            let node = build_node(t.kind, Vector2::ZERO);
            if from_output {
                node.inputs
                    .iter()
                    .any(|i| is_valid_connection(slot_type, &i.slot_type))
            } else {
                node.outputs
                    .iter()
                    .any(|o| is_valid_connection(&o.slot_type, slot_type))
            }
        })
        .collect()
}

/// Template created by the middle-click shortcut for a slot type.
///
/// Prefers templates whose slot type matches exactly before wildcards.
pub fn default_template_for_slot(slot_type: &str, from_output: bool) -> Option<TemplateKind> {
    let candidates = templates_for_slot(slot_type, from_output);
    let exact = candidates.iter().find(|t| {
        let node = build_node(t.kind, Vector2::ZERO);
        let mut types = if from_output {
            node.inputs.iter().map(|s| s.slot_type.clone()).collect::<Vec<_>>()
        } else {
            node.outputs.iter().map(|s| s.slot_type.clone()).collect::<Vec<_>>()
        };
        types.retain(|s| s.eq_ignore_ascii_case(slot_type));
        !types.is_empty()
    });
    exact.or(candidates.first()).map(|t| t.kind)
}

/// Templates whose name contains `filter` (case-insensitive).
pub fn search_templates(filter: &str) -> Vec<&'static TemplateInfo> {
    let needle = filter.to_lowercase();
    all_templates()
        .iter()
        .filter(|t| t.name.to_lowercase().contains(&needle) || t.node_type.contains(&needle))
        .collect()
}

/// A small graph showing links, widgets, DOM widgets and a group.
pub fn build_demo_graph() -> Graph {
    let mut graph = Graph::new();
    let a = graph.add_node(build_node(TemplateKind::Constant, vec2(60.0, 100.0)));
    let b = graph.add_node(build_node(TemplateKind::Constant, vec2(60.0, 220.0)));
    let add = graph.add_node(build_node(TemplateKind::Add, vec2(320.0, 150.0)));
    let watch = graph.add_node(build_node(TemplateKind::Watch, vec2(560.0, 150.0)));
    graph.add_node(build_node(TemplateKind::TextAndFile, vec2(320.0, 340.0)));
    graph.add_node(build_node(TemplateKind::WidgetShowcase, vec2(620.0, 340.0)));

    for (origin, target, slot) in [(a, add, 0), (b, add, 1), (add, watch, 0)] {
        if let Err(err) = graph.connect(origin, 0, target, slot) {
            log::warn!("demo link failed: {}", err);
        }
    }
    graph.add_group(Group::new("Math", Rect::new(20.0, 40.0, 760.0, 260.0)));
    graph.clear_history();
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_builds_with_its_type() {
        for t in all_templates() {
            let node = build_node(t.kind, vec2(10.0, 20.0));
            assert_eq!(node.node_type, t.node_type);
            assert_eq!(node.pos, vec2(10.0, 20.0));
            let min = node.compute_min_size();
            assert!(node.size.x >= min.x && node.size.y >= min.y, "{}", t.name);
        }
    }

    #[test]
    fn slot_search_filters_by_type() {
        let names: Vec<_> = templates_for_slot("number", true)
            .iter()
            .map(|t| t.name)
            .collect();
        assert!(names.contains(&"Add"));
        assert!(names.contains(&"Watch"));
        assert!(!names.contains(&"Text & File"));

        assert_eq!(
            default_template_for_slot("number", true),
            Some(TemplateKind::Add)
        );
        assert_eq!(
            default_template_for_slot("string", false),
            Some(TemplateKind::TextAndFile)
        );
    }

    #[test]
    fn demo_graph_is_linked_and_clean() {
        let graph = build_demo_graph();
        assert_eq!(graph.link_count(), 3);
        assert_eq!(graph.groups().len(), 1);
        assert!(!graph.can_undo());
    }

    #[test]
    fn search_is_case_insensitive() {
        assert_eq!(search_templates("ADD").len(), 1);
        assert_eq!(search_templates("").len(), all_templates().len());
    }
}
