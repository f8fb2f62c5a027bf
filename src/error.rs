//! Error types for graph mutations and configuration loading.
//!
//! Interaction handlers never surface these to the user; they log and drop
//! them at the handler boundary.

use crate::types::{LinkId, NodeId};
use thiserror::Error;

/// Failures of structural graph operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// No node with this id exists in the graph.
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),
    /// No link with this id exists in the graph.
    #[error("link {0} does not exist")]
    LinkNotFound(LinkId),
    /// The slot index is outside the node's input or output list.
    #[error("{kind} slot {index} is out of range on node {node}")]
    SlotOutOfRange {
        /// Node that was addressed
        node: NodeId,
        /// Requested slot index
        index: usize,
        /// "input" or "output"
        kind: &'static str,
    },
    /// The output type cannot feed the input type.
    #[error("cannot connect type `{from}` to `{to}`")]
    IncompatibleTypes {
        /// Output slot type
        from: String,
        /// Input slot type
        to: String,
    },
    /// A node may not be linked to itself.
    #[error("node {0} cannot be linked to itself")]
    SelfLink(NodeId),
    /// No slot on the target node accepts the requested type.
    #[error("no slot on node {node} accepts type `{slot_type}`")]
    NoCompatibleSlot {
        /// Target node
        node: NodeId,
        /// Type that was looked for
        slot_type: String,
    },
}

/// Failures while reading or validating a [`crate::config::CanvasConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("invalid canvas config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field holds a value outside its valid range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Offending field name
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Failures of a DOM widget host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomError {
    /// There is no document to mount elements into.
    #[error("no document available to mount DOM widgets")]
    NoDocument,
    /// The host platform rejected an operation.
    #[error("DOM operation failed: {0}")]
    Host(String),
}
