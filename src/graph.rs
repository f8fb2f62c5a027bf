//! The graph service: node, link and group tables plus structural edits.
//!
//! Nodes are kept in render order (last is topmost). Links live in one table
//! keyed by id; slots only hold link ids.

use crate::constants::GROUP_PICK_MARGIN;
use crate::error::GraphError;
use crate::geometry::Vector2;
use crate::types::*;
use crate::undo::{GraphSnapshot, UndoHistory};
use std::collections::HashMap;
use uuid::Uuid;

/// Whether an output of type `output` may feed an input of type `input`.
///
/// Empty and `"*"` are wildcards. Otherwise the comparison ignores case and
/// comma-separated lists match when any pair of entries matches.
pub fn is_valid_connection(output: &str, input: &str) -> bool {
    let wildcard = |t: &str| t.is_empty() || t == ANY_TYPE;
    if wildcard(output) || wildcard(input) {
        return true;
    }
    let output = output.to_lowercase();
    let input = input.to_lowercase();
    if output == input {
        return true;
    }
    if !output.contains(',') && !input.contains(',') {
        return false;
    }
    output
        .split(',')
        .map(str::trim)
        .any(|o| input.split(',').map(str::trim).any(|i| o == i || wildcard(o) || wildcard(i)))
}

fn is_exact_type(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Picks the best slot for `wanted`: free exact match, then free compatible,
/// then occupied exact, then occupied compatible.
fn best_slot<'a>(
    slots: impl Iterator<Item = (&'a str, bool)>,
    wanted: &str,
    check: impl Fn(&str, &str) -> bool,
) -> Option<usize> {
    slots
        .enumerate()
        .filter(|(_, (slot_type, _))| check(wanted, *slot_type))
        .min_by_key(|(index, (slot_type, occupied))| {
            let rank = match (*occupied, is_exact_type(wanted, *slot_type)) {
                (false, true) => 0,
                (false, false) => 1,
                (true, true) => 2,
                (true, false) => 3,
            };
            (rank, *index)
        })
        .map(|(index, _)| index)
}

/// Nodes, links and groups of one editable graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    links: HashMap<LinkId, Link>,
    groups: Vec<Group>,
    history: UndoHistory,
    change_depth: usize,
    pending_snapshot: Option<GraphSnapshot>,
    revision: u64,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ---- nodes ----

    /// Nodes in render order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access to nodes; order and count cannot change through it.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Looks up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Looks up a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Position of a node in render order.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Adds a node on top of all others.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        log::debug!("adding node `{}` ({id})", node.title);
        self.nodes.push(node);
        id
    }

    /// Removes a node, disconnecting all of its links first.
    ///
    /// # Returns
    ///
    /// The removed node, so its DOM resources can be released.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let index = self.node_index(id).ok_or(GraphError::NodeNotFound(id))?;
        let attached: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.origin_id == id || l.target_id == id)
            .map(|l| l.id)
            .collect();
        for link in attached {
            self.remove_link(link)?;
        }
        Ok(self.nodes.remove(index))
    }

    /// Duplicates a node without its links, offset by `offset`, on top.
    pub fn clone_node(&mut self, id: NodeId, offset: Vector2) -> Result<NodeId, GraphError> {
        let source = self.node(id).ok_or(GraphError::NodeNotFound(id))?;
        let mut copy = source.clone();
        copy.id = Uuid::new_v4();
        copy.pos += offset;
        for input in &mut copy.inputs {
            input.link = None;
        }
        for output in &mut copy.outputs {
            output.links.clear();
        }
        for widget in &mut copy.widgets {
            widget.reset_layout();
        }
        Ok(self.add_node(copy))
    }

    /// Moves a node to the end of the render order.
    pub fn bring_to_front(&mut self, id: NodeId) {
        if let Some(index) = self.node_index(id) {
            if index + 1 != self.nodes.len() {
                let node = self.nodes.remove(index);
                self.nodes.push(node);
            }
        }
    }

    /// Topmost node whose pick box (grown by `margin`) contains `pos`.
    ///
    /// When `visible` is given, only those nodes are considered.
    pub fn get_node_on_pos(
        &self,
        pos: Vector2,
        visible: Option<&[NodeId]>,
        margin: f64,
    ) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .filter(|n| visible.map_or(true, |v| v.contains(&n.id)))
            .find(|n| n.is_point_inside(pos, margin))
            .map(|n| n.id)
    }

    // ---- groups ----

    /// Groups, back to front.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Looks up a group.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Looks up a group mutably.
    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// Adds a group.
    pub fn add_group(&mut self, group: Group) -> GroupId {
        let id = group.id;
        self.groups.push(group);
        id
    }

    /// Removes a group; its nodes stay.
    pub fn remove_group(&mut self, id: GroupId) -> Option<Group> {
        let index = self.groups.iter().position(|g| g.id == id)?;
        Some(self.groups.remove(index))
    }

    /// Topmost group containing `pos`.
    pub fn get_group_on_pos(&self, pos: Vector2) -> Option<GroupId> {
        self.groups
            .iter()
            .rev()
            .find(|g| g.is_point_inside(pos, GROUP_PICK_MARGIN))
            .map(|g| g.id)
    }

    /// Nodes whose bounds overlap the group's bounds.
    pub fn nodes_inside_group(&self, id: GroupId) -> Vec<NodeId> {
        let Some(group) = self.group(id) else {
            return Vec::new();
        };
        let area = group.bounding();
        self.nodes
            .iter()
            .filter(|n| n.bounding().overlaps(&area))
            .map(|n| n.id)
            .collect()
    }

    // ---- links ----

    /// Link table.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Looks up a link.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Connects an output to an input.
    ///
    /// An input already holding a link loses it first, so inputs never hold
    /// more than one link.
    pub fn connect(
        &mut self,
        origin: NodeId,
        origin_slot: usize,
        target: NodeId,
        target_slot: usize,
    ) -> Result<LinkId, GraphError> {
        if origin == target {
            return Err(GraphError::SelfLink(origin));
        }
        let origin_node = self.node(origin).ok_or(GraphError::NodeNotFound(origin))?;
        let output = origin_node
            .outputs
            .get(origin_slot)
            .ok_or(GraphError::SlotOutOfRange {
                node: origin,
                index: origin_slot,
                kind: "output",
            })?;
        let output_type = output.slot_type.clone();
        let target_node = self.node(target).ok_or(GraphError::NodeNotFound(target))?;
        let input = target_node
            .inputs
            .get(target_slot)
            .ok_or(GraphError::SlotOutOfRange {
                node: target,
                index: target_slot,
                kind: "input",
            })?;
        if !is_valid_connection(&output_type, &input.slot_type) {
            return Err(GraphError::IncompatibleTypes {
                from: output_type,
                to: input.slot_type.clone(),
            });
        }
        if let Some(previous) = input.link {
            self.remove_link(previous)?;
        }

        let link = Link {
            id: Uuid::new_v4(),
            origin_id: origin,
            origin_slot,
            target_id: target,
            target_slot,
            link_type: output_type,
        };
        let id = link.id;
        if let Some(node) = self.node_mut(origin) {
            node.outputs[origin_slot].links.push(id);
        }
        if let Some(node) = self.node_mut(target) {
            node.inputs[target_slot].link = Some(id);
        }
        self.links.insert(id, link);
        log::debug!("linked {origin}:{origin_slot} -> {target}:{target_slot}");
        Ok(id)
    }

    /// Connects an output to the best matching input of `target`.
    pub fn connect_by_type_input(
        &mut self,
        origin: NodeId,
        origin_slot: usize,
        target: NodeId,
    ) -> Result<LinkId, GraphError> {
        let origin_node = self.node(origin).ok_or(GraphError::NodeNotFound(origin))?;
        let wanted = origin_node
            .outputs
            .get(origin_slot)
            .map(|s| s.slot_type.clone())
            .ok_or(GraphError::SlotOutOfRange {
                node: origin,
                index: origin_slot,
                kind: "output",
            })?;
        let target_node = self.node(target).ok_or(GraphError::NodeNotFound(target))?;
        let slot = best_slot(
            target_node
                .inputs
                .iter()
                .map(|s| (s.slot_type.as_str(), s.link.is_some())),
            &wanted,
            |output, input| is_valid_connection(output, input),
        )
        .ok_or(GraphError::NoCompatibleSlot {
            node: target,
            slot_type: wanted,
        })?;
        self.connect(origin, origin_slot, target, slot)
    }

    /// Connects the best matching output of `origin` to an input.
    pub fn connect_by_type_output(
        &mut self,
        target: NodeId,
        target_slot: usize,
        origin: NodeId,
    ) -> Result<LinkId, GraphError> {
        let target_node = self.node(target).ok_or(GraphError::NodeNotFound(target))?;
        let wanted = target_node
            .inputs
            .get(target_slot)
            .map(|s| s.slot_type.clone())
            .ok_or(GraphError::SlotOutOfRange {
                node: target,
                index: target_slot,
                kind: "input",
            })?;
        let origin_node = self.node(origin).ok_or(GraphError::NodeNotFound(origin))?;
        let slot = best_slot(
            origin_node
                .outputs
                .iter()
                .map(|s| (s.slot_type.as_str(), !s.links.is_empty())),
            &wanted,
            |input, output| is_valid_connection(output, input),
        )
        .ok_or(GraphError::NoCompatibleSlot {
            node: origin,
            slot_type: wanted,
        })?;
        self.connect(origin, slot, target, target_slot)
    }

    /// Removes the link feeding an input, if any.
    pub fn disconnect_input(
        &mut self,
        node: NodeId,
        slot: usize,
    ) -> Result<Option<LinkId>, GraphError> {
        let n = self.node(node).ok_or(GraphError::NodeNotFound(node))?;
        let input = n.inputs.get(slot).ok_or(GraphError::SlotOutOfRange {
            node,
            index: slot,
            kind: "input",
        })?;
        match input.link {
            Some(link) => {
                self.remove_link(link)?;
                Ok(Some(link))
            }
            None => Ok(None),
        }
    }

    /// Removes every link leaving an output.
    pub fn disconnect_output(
        &mut self,
        node: NodeId,
        slot: usize,
    ) -> Result<Vec<LinkId>, GraphError> {
        let n = self.node(node).ok_or(GraphError::NodeNotFound(node))?;
        let output = n.outputs.get(slot).ok_or(GraphError::SlotOutOfRange {
            node,
            index: slot,
            kind: "output",
        })?;
        let links = output.links.clone();
        for link in &links {
            self.remove_link(*link)?;
        }
        Ok(links)
    }

    /// Removes a link and clears both slot references to it.
    pub fn remove_link(&mut self, id: LinkId) -> Result<Link, GraphError> {
        let link = self.links.remove(&id).ok_or(GraphError::LinkNotFound(id))?;
        if let Some(origin) = self.node_mut(link.origin_id) {
            if let Some(output) = origin.outputs.get_mut(link.origin_slot) {
                output.links.retain(|l| *l != id);
            }
        }
        if let Some(target) = self.node_mut(link.target_id) {
            if let Some(input) = target.inputs.get_mut(link.target_slot) {
                if input.link == Some(id) {
                    input.link = None;
                }
            }
        }
        Ok(link)
    }

    // ---- change bracketing & history ----

    fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.clone(),
            links: self.links.clone(),
            groups: self.groups.clone(),
        }
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        self.nodes = snapshot.nodes;
        self.links = snapshot.links;
        self.groups = snapshot.groups;
        self.revision += 1;
    }

    /// Opens an edit bracket. Brackets nest; only the outermost one records.
    pub fn before_change(&mut self) {
        if self.change_depth == 0 {
            self.pending_snapshot = Some(self.snapshot());
        }
        self.change_depth += 1;
    }

    /// Closes an edit bracket, recording one undo step if the graph changed.
    pub fn after_change(&mut self) {
        if self.change_depth == 0 {
            log::warn!("after_change without matching before_change");
            return;
        }
        self.change_depth -= 1;
        if self.change_depth > 0 {
            return;
        }
        if let Some(before) = self.pending_snapshot.take() {
            if before != self.snapshot() {
                self.history.push_action(before);
            }
        }
    }

    /// Notes that something visible changed.
    pub fn change(&mut self) {
        self.revision += 1;
    }

    /// Counter bumped by [`Graph::change`], undo and redo.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether an edit bracket is open.
    pub fn in_change(&self) -> bool {
        self.change_depth > 0
    }

    /// Returns true if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns true if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restores the state before the last recorded edit.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop_undo() else {
            return false;
        };
        let current = self.snapshot();
        self.history.push_redo(current);
        self.restore(previous);
        true
    }

    /// Reapplies the last undone edit.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.pop_redo() else {
            return false;
        };
        let current = self.snapshot();
        self.history.push_undo(current);
        self.restore(next);
        true
    }

    /// Drops all undo history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2;

    fn typed_node(title: &str, x: f64, input: &str, output: &str) -> Node {
        Node::new(title, "test", vec2(x, 0.0))
            .with_input("in", input)
            .with_output("out", output)
    }

    #[test]
    fn type_compatibility_rules() {
        assert!(is_valid_connection("number", "*"));
        assert!(is_valid_connection("*", "*"));
        assert!(is_valid_connection("", "string"));
        assert!(is_valid_connection("Number", "number"));
        assert!(!is_valid_connection("number", "string"));
        assert!(is_valid_connection("number,string", "string"));
        assert!(!is_valid_connection("number,boolean", "string,image"));
    }

    #[test]
    fn number_to_wildcard_connects_and_number_to_string_does_not() {
        let mut graph = Graph::new();
        let a = graph.add_node(typed_node("A", 0.0, "*", "number"));
        let b = graph.add_node(typed_node("B", 300.0, "*", "*"));
        let c = graph.add_node(typed_node("C", 600.0, "string", "*"));

        assert!(graph.connect(a, 0, b, 0).is_ok());
        assert!(matches!(
            graph.connect(a, 0, c, 0),
            Err(GraphError::IncompatibleTypes { .. })
        ));
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.node(c).unwrap().inputs[0].link, None);
    }

    #[test]
    fn input_keeps_a_single_link() {
        let mut graph = Graph::new();
        let a = graph.add_node(typed_node("A", 0.0, "*", "number"));
        let b = graph.add_node(typed_node("B", 0.0, "*", "number"));
        let target = graph.add_node(typed_node("T", 300.0, "number", "*"));

        let first = graph.connect(a, 0, target, 0).unwrap();
        let second = graph.connect(b, 0, target, 0).unwrap();

        assert_eq!(graph.node(target).unwrap().inputs[0].link, Some(second));
        assert!(graph.link(first).is_none());
        assert!(graph.node(a).unwrap().outputs[0].links.is_empty());
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn self_links_are_rejected() {
        let mut graph = Graph::new();
        let a = graph.add_node(typed_node("A", 0.0, "*", "*"));
        assert_eq!(graph.connect(a, 0, a, 0), Err(GraphError::SelfLink(a)));
    }

    #[test]
    fn slot_range_is_checked() {
        let mut graph = Graph::new();
        let a = graph.add_node(typed_node("A", 0.0, "*", "*"));
        let b = graph.add_node(typed_node("B", 0.0, "*", "*"));
        assert!(matches!(
            graph.connect(a, 3, b, 0),
            Err(GraphError::SlotOutOfRange { kind: "output", .. })
        ));
    }

    #[test]
    fn connect_by_type_prefers_free_exact_slots() {
        let mut graph = Graph::new();
        let src = graph.add_node(typed_node("Src", 0.0, "*", "number"));
        let other = graph.add_node(typed_node("Other", 0.0, "*", "number"));
        let target = graph.add_node(
            Node::new("T", "test", vec2(300.0, 0.0))
                .with_input("any", "*")
                .with_input("n1", "number")
                .with_input("n2", "number"),
        );
        graph.connect(other, 0, target, 1).unwrap();

        graph.connect_by_type_input(src, 0, target).unwrap();

        let t = graph.node(target).unwrap();
        assert!(t.inputs[2].link.is_some());
        assert!(t.inputs[0].link.is_none());
    }

    #[test]
    fn connect_by_type_reports_missing_slot() {
        let mut graph = Graph::new();
        let src = graph.add_node(typed_node("Src", 0.0, "*", "image"));
        let target = graph.add_node(typed_node("T", 300.0, "number", "*"));
        assert!(matches!(
            graph.connect_by_type_input(src, 0, target),
            Err(GraphError::NoCompatibleSlot { .. })
        ));
    }

    #[test]
    fn connect_by_type_output_picks_origin_slot() {
        let mut graph = Graph::new();
        let origin = graph.add_node(
            Node::new("O", "test", Vector2::ZERO)
                .with_output("s", "string")
                .with_output("n", "number"),
        );
        let target = graph.add_node(typed_node("T", 300.0, "number", "*"));
        let link = graph.connect_by_type_output(target, 0, origin).unwrap();
        assert_eq!(graph.link(link).unwrap().origin_slot, 1);
        assert_eq!(graph.link(link).unwrap().link_type, "number");
    }

    #[test]
    fn remove_node_drops_its_links() {
        let mut graph = Graph::new();
        let a = graph.add_node(typed_node("A", 0.0, "*", "*"));
        let b = graph.add_node(typed_node("B", 0.0, "*", "*"));
        graph.connect(a, 0, b, 0).unwrap();

        let removed = graph.remove_node(b).unwrap();

        assert_eq!(removed.id, b);
        assert_eq!(graph.link_count(), 0);
        assert!(graph.node(a).unwrap().outputs[0].links.is_empty());
        assert_eq!(graph.remove_node(b).unwrap_err(), GraphError::NodeNotFound(b));
    }

    #[test]
    fn clone_node_is_unlinked_and_on_top() {
        let mut graph = Graph::new();
        let a = graph.add_node(typed_node("A", 0.0, "*", "*"));
        let b = graph.add_node(typed_node("B", 0.0, "*", "*"));
        graph.connect(a, 0, b, 0).unwrap();

        let copy = graph.clone_node(a, vec2(5.0, 5.0)).unwrap();

        let c = graph.node(copy).unwrap();
        assert_ne!(copy, a);
        assert_eq!(c.pos, vec2(5.0, 5.0));
        assert!(c.outputs[0].links.is_empty());
        assert_eq!(graph.node_index(copy), Some(2));
    }

    #[test]
    fn get_node_on_pos_returns_topmost() {
        let mut graph = Graph::new();
        let below = graph.add_node(typed_node("Below", 0.0, "*", "*"));
        let above = graph.add_node(typed_node("Above", 50.0, "*", "*"));
        assert_eq!(graph.get_node_on_pos(vec2(100.0, 20.0), None, 0.0), Some(above));
        assert_eq!(
            graph.get_node_on_pos(vec2(100.0, 20.0), Some(&[below]), 0.0),
            Some(below)
        );

        graph.bring_to_front(below);
        assert_eq!(graph.get_node_on_pos(vec2(100.0, 20.0), None, 0.0), Some(below));
        assert_eq!(graph.get_node_on_pos(vec2(900.0, 900.0), None, 0.0), None);
    }

    #[test]
    fn nested_brackets_record_one_step() {
        let mut graph = Graph::new();
        let a = graph.add_node(typed_node("A", 0.0, "*", "*"));

        graph.before_change();
        graph.node_mut(a).unwrap().pos = vec2(10.0, 0.0);
        graph.before_change();
        graph.node_mut(a).unwrap().pos = vec2(20.0, 0.0);
        graph.after_change();
        assert!(!graph.can_undo());
        graph.after_change();
        assert!(graph.can_undo());

        assert!(graph.undo());
        assert_eq!(graph.node(a).unwrap().pos, vec2(0.0, 0.0));
        assert!(!graph.can_undo());
        assert!(graph.redo());
        assert_eq!(graph.node(a).unwrap().pos, vec2(20.0, 0.0));
    }

    #[test]
    fn unchanged_bracket_records_nothing() {
        let mut graph = Graph::new();
        graph.add_node(typed_node("A", 0.0, "*", "*"));
        graph.before_change();
        graph.after_change();
        assert!(!graph.can_undo());
        graph.after_change();
        assert!(!graph.in_change());
    }

    #[test]
    fn groups_report_overlapping_nodes() {
        use crate::geometry::Rect;
        let mut graph = Graph::new();
        let inside = graph.add_node(typed_node("In", 20.0, "*", "*"));
        let outside = graph.add_node(typed_node("Out", 900.0, "*", "*"));
        let group = graph.add_group(Group::new("G", Rect::new(0.0, -40.0, 400.0, 300.0)));

        let members = graph.nodes_inside_group(group);
        assert!(members.contains(&inside));
        assert!(!members.contains(&outside));
        assert_eq!(graph.get_group_on_pos(vec2(10.0, 200.0)), Some(group));
        assert_eq!(graph.get_group_on_pos(vec2(500.0, 500.0)), None);
    }
}
