pub mod graph;
pub mod identifier;
pub mod partition;
pub mod resolver;
pub mod session;
pub mod stream;
pub mod vertex;

#[cfg(test)]
pub(crate) mod testing;

pub use graph::{EdgeOverlay, EdgeQuery, EdgeQueryBuilder, TypeRestriction};
pub use identifier::{IdProvider, NativeIdProvider, PropertyIdProvider};
pub use partition::{AllLabelsPartition, AnyLabelPartition, NoPartition, Partition};
pub use resolver::EdgeResolver;
pub use session::{EdgeProjection, RecordCursor, ResultCursor, ResultHandle, Session};
pub use stream::EdgeStream;
pub use vertex::{Vertex, VertexState};

// Re-export common types for convenience
pub use graphlink_common::config::AppConfig;
pub use graphlink_common::{Direction, Edge, ElementId, GraphError, Record, Result, Value};
