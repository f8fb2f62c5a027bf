//! Undo/redo history of graph snapshots.
//!
//! Each undo step is the state of the graph before one bracketed edit
//! (see [`crate::graph::Graph::before_change`]). Snapshots are whole-graph
//! clones, which keeps restoring trivially correct for any gesture.

use crate::constants::MAX_UNDO_HISTORY;
use crate::types::{Group, Link, LinkId, Node};
use std::collections::HashMap;

/// Structural state of a graph at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphSnapshot {
    /// Nodes in render order
    pub nodes: Vec<Node>,
    /// Link table
    pub links: HashMap<LinkId, Link>,
    /// Groups
    pub groups: Vec<Group>,
}

/// Manages undo/redo history for a graph.
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    /// Snapshots that can be restored by undo
    undo_stack: Vec<GraphSnapshot>,
    /// Snapshots that can be restored by redo
    redo_stack: Vec<GraphSnapshot>,
}

impl UndoHistory {
    /// Creates a new empty undo history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the state before an edit.
    ///
    /// This clears the redo stack since a new edit invalidates any previously
    /// undone ones.
    pub fn push_action(&mut self, snapshot: GraphSnapshot) {
        self.redo_stack.clear();
        self.push_undo(snapshot);
    }

    /// Pushes onto the undo stack without touching redo (used by redo itself).
    pub fn push_undo(&mut self, snapshot: GraphSnapshot) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Returns true if there are steps that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are steps that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Pops the most recent undo step.
    pub fn pop_undo(&mut self) -> Option<GraphSnapshot> {
        self.undo_stack.pop()
    }

    /// Pops the most recent redo step.
    pub fn pop_redo(&mut self) -> Option<GraphSnapshot> {
        self.redo_stack.pop()
    }

    /// Pushes a snapshot onto the redo stack.
    pub fn push_redo(&mut self, snapshot: GraphSnapshot) {
        self.redo_stack.push(snapshot);
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Number of undo steps available.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vector2;

    fn snapshot_with(title: &str) -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![Node::new(title, "t", Vector2::ZERO)],
            ..Default::default()
        }
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut history = UndoHistory::new();
        history.push_action(snapshot_with("a"));
        let undone = history.pop_undo().unwrap();
        history.push_redo(undone);
        assert!(history.can_redo());

        history.push_action(snapshot_with("b"));
        assert!(!history.can_redo());
        assert!(history.can_undo());
    }

    #[test]
    fn history_is_capped() {
        let mut history = UndoHistory::new();
        for i in 0..MAX_UNDO_HISTORY + 5 {
            history.push_action(snapshot_with(&i.to_string()));
        }
        assert_eq!(history.undo_len(), MAX_UNDO_HISTORY);
        let oldest_kept = (0..MAX_UNDO_HISTORY).fold(None, |_, _| history.pop_undo());
        assert_eq!(oldest_kept.unwrap().nodes[0].title, "5");
    }

    #[test]
    fn clear_empties_both_stacks() {
        let mut history = UndoHistory::new();
        history.push_action(snapshot_with("a"));
        history.push_redo(snapshot_with("b"));
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
