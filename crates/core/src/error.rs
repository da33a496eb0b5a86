//! Error type shared by the domain layers.
//!
//! `CoreError` carries enough structure for the HTTP layer to pick a status
//! code without string matching. Lower layers construct these; only the API
//! crate turns them into responses.

/// Domain-level error. Variants map 1:1 to HTTP status classes at the edge.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup came back empty.
    #[error("{entity} {id} not found")]
    NotFound {
        entity: &'static str,
        id: uuid::Uuid,
    },

    /// Input failed domain validation.
    #[error("{0}")]
    Validation(String),

    /// The request conflicts with the entity's current state.
    #[error("{0}")]
    Conflict(String),

    /// Missing or unrecognized credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller exhausted its admission window.
    #[error("{0}")]
    RateLimited(String),

    /// Unexpected internal failure. The message is logged, never echoed.
    #[error("{0}")]
    Internal(String),
}
