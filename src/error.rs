use crate::config::{ConfigError, SchemaError, ValidationError};
use thiserror::Error;

/// Top-level error type for the propbind library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}
