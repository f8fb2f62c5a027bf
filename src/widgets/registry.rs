//! Ownership of native elements behind DOM widgets.
//!
//! Each `(node, widget index)` pair owns at most one element. The registry
//! mounts elements lazily, reapplies their placement every draw and unmounts
//! them when their node goes away, so element lifetime follows node lifetime.

use super::projection::{project_dom_widget, topmost_selected, CanvasMetrics, DomVisibility};
use super::{DomWidget, SelectOn, Widget};
use crate::error::DomError;
use crate::transform::Transform;
use crate::types::{Node, NodeId};
use std::collections::HashMap;

/// Identifies one DOM widget: owner node and index in its widget stack.
pub type DomKey = (NodeId, usize);

/// Something an element reported since the last poll.
#[derive(Debug, Clone, PartialEq)]
pub enum DomSignal {
    /// The element's content was edited
    Input(String),
    /// The element gained focus
    Focus,
    /// The element was clicked
    Click,
}

/// A signal tagged with the widget it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DomFeedback {
    /// Owner node
    pub node: NodeId,
    /// Widget index on the node
    pub widget: usize,
    /// What happened
    pub signal: DomSignal,
}

impl DomFeedback {
    /// Whether this signal should select the owner node.
    pub fn selects(&self, widget: &DomWidget) -> bool {
        match self.signal {
            DomSignal::Focus => widget.selects_on(SelectOn::Focus),
            DomSignal::Click => widget.selects_on(SelectOn::Click),
            DomSignal::Input(_) => false,
        }
    }
}

/// Platform layer that creates and positions native elements.
pub trait DomHost {
    /// Handle to one mounted element.
    type Element;

    /// Creates and attaches the element for a widget.
    fn mount(&mut self, key: DomKey, widget: &DomWidget) -> Result<Self::Element, DomError>;

    /// Shows, hides and positions an element.
    fn apply(
        &mut self,
        element: &mut Self::Element,
        widget: &DomWidget,
        visibility: &DomVisibility,
    );

    /// Drains signals the element produced since the last call.
    fn poll(&mut self, element: &mut Self::Element) -> Vec<DomSignal>;

    /// Detaches the element and drops its listeners.
    fn unmount(&mut self, element: Self::Element);
}

/// Mounted elements keyed by widget.
pub struct DomWidgetRegistry<H: DomHost> {
    elements: HashMap<DomKey, H::Element>,
}

impl<H: DomHost> Default for DomWidgetRegistry<H> {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
        }
    }
}

impl<H: DomHost> DomWidgetRegistry<H> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mounted elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no element is mounted.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether the widget has a mounted element.
    pub fn is_mounted(&self, key: &DomKey) -> bool {
        self.elements.contains_key(key)
    }

    /// Reconciles every DOM widget in `nodes` with its element.
    ///
    /// Missing elements are mounted, all are repositioned, and elements whose
    /// widget no longer exists are unmounted. Returns what the elements
    /// reported.
    pub fn sync(
        &mut self,
        host: &mut H,
        nodes: &[Node],
        transform: &Transform,
        metrics: &CanvasMetrics,
        selection: &[NodeId],
    ) -> Vec<DomFeedback> {
        let occluder = topmost_selected(nodes, selection);
        let mut feedback = Vec::new();
        let mut live = Vec::new();

        for (node_index, node) in nodes.iter().enumerate() {
            for (widget_index, widget) in node.widgets.iter().enumerate() {
                let Widget::Dom(widget) = widget else {
                    continue;
                };
                let key = (node.id, widget_index);
                live.push(key);

                if !self.elements.contains_key(&key) {
                    match host.mount(key, widget) {
                        Ok(element) => {
                            log::debug!("mounted DOM widget `{}` on node {}", widget.name, node.id);
                            self.elements.insert(key, element);
                        }
                        Err(err) => {
                            log::warn!("could not mount DOM widget `{}`: {err}", widget.name);
                            continue;
                        }
                    }
                }
                let Some(element) = self.elements.get_mut(&key) else {
                    continue;
                };

                let visibility =
                    project_dom_widget(node, node_index, widget, transform, metrics, occluder);
                host.apply(element, widget, &visibility);
                feedback.extend(host.poll(element).into_iter().map(|signal| DomFeedback {
                    node: node.id,
                    widget: widget_index,
                    signal,
                }));
            }
        }

        let stale: Vec<DomKey> = self
            .elements
            .keys()
            .filter(|key| !live.contains(key))
            .copied()
            .collect();
        for key in stale {
            if let Some(element) = self.elements.remove(&key) {
                host.unmount(element);
            }
        }

        feedback
    }

    /// Unmounts every element owned by a node.
    pub fn release_node(&mut self, host: &mut H, node: NodeId) {
        let keys: Vec<DomKey> = self
            .elements
            .keys()
            .filter(|(owner, _)| *owner == node)
            .copied()
            .collect();
        for key in keys {
            if let Some(element) = self.elements.remove(&key) {
                host.unmount(element);
            }
        }
    }

    /// Unmounts everything.
    pub fn clear(&mut self, host: &mut H) {
        for (_, element) in self.elements.drain() {
            host.unmount(element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2;
    use crate::widgets::{DomElementKind, DomWidget};

    #[derive(Default)]
    struct RecordingHost {
        mounted: Vec<DomKey>,
        unmounted: Vec<DomKey>,
        applied: Vec<(DomKey, bool)>,
        queued: HashMap<DomKey, Vec<DomSignal>>,
    }

    struct FakeElement {
        key: DomKey,
    }

    impl DomHost for RecordingHost {
        type Element = FakeElement;

        fn mount(&mut self, key: DomKey, _widget: &DomWidget) -> Result<FakeElement, DomError> {
            self.mounted.push(key);
            Ok(FakeElement { key })
        }

        fn apply(
            &mut self,
            element: &mut FakeElement,
            _widget: &DomWidget,
            visibility: &DomVisibility,
        ) {
            self.applied
                .push((element.key, matches!(visibility, DomVisibility::Visible(_))));
        }

        fn poll(&mut self, element: &mut FakeElement) -> Vec<DomSignal> {
            self.queued.remove(&element.key).unwrap_or_default()
        }

        fn unmount(&mut self, element: FakeElement) {
            self.unmounted.push(element.key);
        }
    }

    fn dom_node() -> Node {
        let mut widget = DomWidget::new(
            "text",
            DomElementKind::TextArea {
                placeholder: String::new(),
            },
        );
        widget.computed_height = Some(60.0);
        Node::new("Text", "demo/text", vec2(0.0, 0.0)).with_widget(widget)
    }

    #[test]
    fn sync_mounts_once_and_applies_every_frame() {
        let mut host = RecordingHost::default();
        let mut registry = DomWidgetRegistry::new();
        let nodes = vec![dom_node()];

        for _ in 0..3 {
            registry.sync(&mut host, &nodes, &Transform::default(), &CanvasMetrics::default(), &[]);
        }

        assert_eq!(host.mounted, vec![(nodes[0].id, 0)]);
        assert_eq!(host.applied.len(), 3);
        assert!(host.applied.iter().all(|(_, visible)| *visible));
    }

    #[test]
    fn release_node_unmounts_its_elements() {
        let mut host = RecordingHost::default();
        let mut registry = DomWidgetRegistry::new();
        let nodes = vec![dom_node(), dom_node()];
        registry.sync(&mut host, &nodes, &Transform::default(), &CanvasMetrics::default(), &[]);
        assert_eq!(registry.len(), 2);

        registry.release_node(&mut host, nodes[0].id);

        assert_eq!(host.unmounted, vec![(nodes[0].id, 0)]);
        assert!(!registry.is_mounted(&(nodes[0].id, 0)));
        assert!(registry.is_mounted(&(nodes[1].id, 0)));
    }

    #[test]
    fn widgets_that_disappear_are_unmounted_on_sync() {
        let mut host = RecordingHost::default();
        let mut registry = DomWidgetRegistry::new();
        let mut nodes = vec![dom_node()];
        let id = nodes[0].id;
        registry.sync(&mut host, &nodes, &Transform::default(), &CanvasMetrics::default(), &[]);

        nodes.clear();
        registry.sync(&mut host, &nodes, &Transform::default(), &CanvasMetrics::default(), &[]);

        assert_eq!(host.unmounted, vec![(id, 0)]);
        assert!(registry.is_empty());
    }

    #[test]
    fn signals_are_tagged_with_their_widget() {
        let mut host = RecordingHost::default();
        let mut registry = DomWidgetRegistry::new();
        let nodes = vec![dom_node()];
        let key = (nodes[0].id, 0);
        host.queued.insert(key, vec![DomSignal::Input("hello".into()), DomSignal::Focus]);

        let feedback =
            registry.sync(&mut host, &nodes, &Transform::default(), &CanvasMetrics::default(), &[]);

        assert_eq!(feedback.len(), 2);
        assert_eq!(feedback[0].signal, DomSignal::Input("hello".into()));
        assert_eq!(feedback[1].node, nodes[0].id);
    }
}
