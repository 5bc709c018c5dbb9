use std::path::PathBuf;
use thiserror::Error;

use super::descriptor::CollectionKind;

/// A single raw string could not be converted to its target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert '{value}' to {type_name}: {reason}")]
pub struct ConversionError {
    pub value: String,
    pub type_name: String,
    pub reason: String,
}

impl ConversionError {
    pub fn new(
        value: impl Into<String>,
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("required config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("circular reference detected while expanding '{0}'")]
    CircularReference(String),

    #[error("referenced key not found: {0}")]
    ReferenceNotFound(String),

    #[error("unclosed reference in value of '{0}' (missing '}}')")]
    UnclosedReference(String),

    #[error("no parameter declared for key '{0}'")]
    UnknownKey(String),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("value of '{key}' is a {actual}, not a {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: String,
    },

    #[error("parameter '{0}' is not a collection")]
    NotACollection(String),

    #[error("parameter '{key}' is a {kind} and must be read as a collection")]
    IsACollection { key: String, kind: CollectionKind },

    #[error("no value for '{0}' and no default")]
    MissingValue(String),
}

/// Inconsistencies detected while assembling a schema.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("parameter key must not be empty")]
    EmptyKey,

    #[error("embedded config '{0}' declares an empty key separator")]
    EmptySeparator(String),

    #[error("parameter '{0}' is optional and also declares a default value")]
    OptionalWithDefault(String),

    #[error("key '{0}' is declared twice with different definitions")]
    ConflictingKey(String),

    #[error("unknown value type: {0}")]
    UnknownType(String),

    #[error("unknown collection kind: {0}")]
    UnknownCollection(String),

    #[error("unknown key case: {0}")]
    UnknownCase(String),

    #[error("parameter needs either a key or an accessor name")]
    MissingKey,

    #[error("failed to parse schema document: {0}")]
    Parse(#[from] toml::de::Error),
}
