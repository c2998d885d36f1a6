//! Graph configuration errors.

use thiserror::Error;

use crate::kind::PortType;

/// Structural problems that make a pipeline ambiguous to evaluate.
///
/// Softer problems (unknown node kinds, connections naming missing nodes or
/// ports) are logged and skipped instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    /// Two nodes share an id.
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    /// A connection joins ports whose types cannot carry the same signal.
    #[error(
        "connection '{connection}': {source_node}.{source_port} ({source_type}) cannot feed \
         {target_node}.{target_port} ({target_type})"
    )]
    PortTypeMismatch {
        /// Connection id.
        connection: String,
        /// Producing node.
        source_node: String,
        /// Producing port.
        source_port: String,
        /// Type of the producing port.
        source_type: PortType,
        /// Consuming node.
        target_node: String,
        /// Consuming port.
        target_port: String,
        /// Type of the consuming port.
        target_type: PortType,
    },

    /// More than one connection feeds a node that is not a combiner.
    #[error("node '{node}' has {count} inputs; merge them through a combiner node")]
    FanIn {
        /// The over-fed node.
        node: String,
        /// Number of feeding connections.
        count: usize,
    },

    /// The connections form a cycle through this node.
    #[error("cycle detected through node '{0}'")]
    CycleDetected(String),

    /// A host referred to a node id that is not loaded.
    #[error("node '{0}' not found")]
    NodeNotFound(String),
}
