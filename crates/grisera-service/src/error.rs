//! Error types for the grisera-service crate.

use grisera_core::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// The id is absent, or the node carries a different label.
    #[error("{message} (id {id})")]
    NotFound { id: String, message: String },

    #[error("Graph error: {0}")]
    Store(#[from] grisera_graph::GraphError),

    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Core error: {0}")]
    Core(#[from] grisera_core::GriseraError),
}

impl ServiceError {
    pub(crate) fn node_not_found(id: NodeId) -> Self {
        Self::NotFound {
            id: id.to_string(),
            message: "Node not found".to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
