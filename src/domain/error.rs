//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::NodeId;

/// Domain errors represent violations of arbor, domain or partitioning rules.
/// These are independent of I/O concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid domain: {message}")]
    InvalidDomain { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("unreachable boundary: node {end} is not downstream of node {start}")]
    UnreachableBoundary { start: NodeId, end: NodeId },

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("no position for node: {0}")]
    MissingPosition(NodeId),

    #[error("invalid arbor: {message}")]
    InvalidArbor { message: String },
}

impl DomainError {
    pub fn invalid_domain(message: impl Into<String>) -> Self {
        Self::InvalidDomain {
            message: message.into(),
        }
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn invalid_arbor(message: impl Into<String>) -> Self {
        Self::InvalidArbor {
            message: message.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
