//! grisera-graph: graph store drivers for the entity mapper.
//!
//! The [`GraphStore`] trait is the full set of calls the mapper makes
//! against a graph database. [`Neo4jStore`] implements it on top of a pooled
//! Neo4j connection, one database per dataset; [`MemoryGraphStore`] keeps
//! everything in process for tests and dry runs.

pub mod client;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod store;

pub use client::{escape_identifier, GraphClient, GraphConfig, GraphError};
pub use memory::{MemoryGraphStore, StoreOp};
pub use store::{GraphStore, Neo4jStore};
