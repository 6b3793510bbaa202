use thiserror::Error;

use crate::model::{ComponentId, NodeId};

/// Result type alias for filtering operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors raised while loading a dataset or running a filter operation.
///
/// Two families matter to callers: precondition violations (the gesture
/// cannot run in the current state, nothing was mutated) and not-found
/// faults (the loaded graph is internally inconsistent).
#[derive(Error, Debug)]
pub enum FilterError {
    /// A node id referenced by adjacency or selection does not resolve.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// A component id does not resolve.
    #[error("component {0} not found")]
    ComponentNotFound(ComponentId),

    /// A link endpoint does not resolve to a loaded node.
    #[error("link {from} -> {to} references a missing node")]
    DanglingLink { from: NodeId, to: NodeId },

    /// The same node id appears twice in one snapshot.
    #[error("node {0} defined more than once")]
    DuplicateNode(NodeId),

    /// An origin-anchored operation ran with no origin and nothing pending.
    #[error("no origin node set and no pending origin available")]
    MissingOrigin,

    /// Intersection variants need a minimum number of selected nodes.
    #[error("operation needs at least {required} selected nodes, got {selected}")]
    InsufficientSelection { required: usize, selected: usize },

    /// A snapshot or row document could not be parsed.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl FilterError {
    /// True for internal-consistency faults (ids that do not resolve).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FilterError::NodeNotFound(_)
                | FilterError::ComponentNotFound(_)
                | FilterError::DanglingLink { .. }
                | FilterError::DuplicateNode(_)
        )
    }

    /// True when the caller invoked an operation the current state cannot serve.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            FilterError::MissingOrigin | FilterError::InsufficientSelection { .. }
        )
    }
}
