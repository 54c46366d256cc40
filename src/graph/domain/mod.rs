//! Domain model for knowledge graph operations.

mod edge;
mod error;
mod node;
mod operation;
mod result;

pub use edge::{EdgeKey, EdgeType, GraphEdge};
pub use error::GraphDomainError;
pub use node::{GraphNode, NodeId, Properties};
pub use operation::{GraphOperation, MAX_NEIGHBOR_DEPTH};
pub use result::GraphResult;
