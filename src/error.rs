use thiserror::Error;

use crate::store::error::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The calling user id does not resolve to a known user.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{0} not found")]
    NotFound(String),

    #[error("a request to this user is already pending")]
    DuplicateRequest,

    #[error("no relationship with user {0}")]
    RelationshipNotFound(String),

    #[error("backend unavailable: {0}")]
    DataUnavailable(#[from] StoreError),

    #[error("coordinate is not finite: {0}")]
    InvalidCoordinate(f64),

    /// A multi-step mutation committed some steps and then failed. The
    /// operation is safe to re-run; the caller must not treat this as either
    /// success or a plain read failure, since reconciliation may be needed.
    #[error("step '{step}' failed after {completed:?}: {source}")]
    PartialFailure {
        step: &'static str,
        completed: Vec<&'static str>,
        #[source]
        source: StoreError,
    },
}

impl CoreError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
