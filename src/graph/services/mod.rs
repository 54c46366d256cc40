//! Application services for the knowledge graph gateway.

mod cache;
mod gateway;

pub use cache::{GraphCache, QuerySignature};
pub use gateway::{GraphGateway, GraphGatewayError};
