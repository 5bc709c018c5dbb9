//! Typed binding of flat key-value configuration to a declarative schema.
//!
//! A [`Schema`] lists the expected parameters (key, type, default, optional
//! wrapper, collection kind) and nested groups. A [`ConfigStore`] binds raw
//! string entries to it, converts values on read and validates the whole
//! tree in one pass.

pub mod config;
mod error;

pub use config::{
    CollectionKind, ConfigBuilder, ConfigError, ConfigStore, ConversionError, Converter,
    EmbeddedDescriptor, FromValue, KeyCase, KeyNaming, ParameterDescriptor, Registry, Schema,
    SchemaError, ValidationError, ValidationFailure, ValidationResult, Value, ValueType,
};
pub use error::Error;
