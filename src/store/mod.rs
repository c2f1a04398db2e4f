//! Property-graph storage
//!
//! Nodes: Repository, File, Definition (type or callable).
//! Edges: CONTAINS (repository → file), DEFINES (file → definition).
//! Every write is a merge by identity key, so re-running ingestion is a
//! no-op for already-present entities.

pub mod schema;
pub mod sqlite;

pub use sqlite::{DefinitionKind, GraphStore, StoreStats};
