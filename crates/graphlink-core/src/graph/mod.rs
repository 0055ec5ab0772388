// Graph query layer: overlay bookkeeping and Cypher edge-query rendering

pub mod overlay;
pub mod query_builder;

pub use overlay::EdgeOverlay;
pub use query_builder::{quote_label, validate_predicate, EdgeQuery, EdgeQueryBuilder, TypeRestriction};
