use thiserror::Error;

use crate::node::NodeId;

/// Malformed tree definitions, reported before anything runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("tree definition has no root node")]
    MissingRoot,
    #[error("node {0} does not exist in the definition")]
    UnknownNode(NodeId),
    #[error("decorator {node} requires exactly one child, found {found}")]
    MissingChild { node: NodeId, found: usize },
    #[error("composite {0} has no children")]
    EmptyComposite(NodeId),
    #[error("leaf {0} cannot have children")]
    UnexpectedChildren(NodeId),
    #[error("node {0} is reachable through more than one parent")]
    SharedNode(NodeId),
    #[error("builder produced {0} top-level nodes, expected exactly one")]
    MultipleRoots(usize),
}
