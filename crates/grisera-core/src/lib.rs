//! grisera-core: Shared types, configuration, and error handling for the GRISERA backends.
//!
//! This crate provides the foundational types used across all GRISERA components:
//! - Node identities and scalar property values stored on graph nodes
//! - Domain entities with their outgoing and incoming relations
//! - Raw node and relationship records produced by graph store drivers
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::GriseraConfig;
pub use error::GriseraError;
pub use types::{
    BasicEntity, DomainEntity, NodeId, NodeRecord, Properties, Property, PropertyValue,
    RelationInformation, RelationshipRecord,
};
