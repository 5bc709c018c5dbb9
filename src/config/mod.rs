//! Schema-driven configuration binding.

mod builder;
mod convert;
mod descriptor;
mod document;
mod embedded;
mod env;
mod error;
mod file;
pub mod list;
mod literal;
mod properties;
mod resolve;
mod source;
mod store;
mod validation;
mod value;

pub use builder::ConfigBuilder;
pub use convert::{
    convert_builtin, register_global_converter, register_global_list_parser,
    register_global_named_converter, register_global_named_list_parser, Converter, Registry,
};
pub use descriptor::{
    CollectionKind, EmbeddedBuilder, EmbeddedDescriptor, KeyCase, KeyNaming, ParameterBuilder,
    ParameterDescriptor, Schema, SchemaBuilder, SchemaNode, DEFAULT_SEPARATOR,
};
pub use embedded::sub_entries;
pub use env::{relaxed_key, EnvSource};
pub use error::{ConfigError, ConversionError, SchemaError};
pub use file::FileSource;
pub use list::{ListParser, SplitParser};
pub use properties::parse_properties;
pub use source::{flatten_toml, ConfigSource, MapSource};
pub use store::ConfigStore;
pub use validation::{FailureKind, ValidationError, ValidationFailure, ValidationResult};
pub use value::{Charset, CustomData, CustomValue, DigestAlgorithm, FromValue, Value, ValueType};
