use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(String),

    #[error("database backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database operation error: {0}")]
    Database(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
