//! The runtime store: raw entries bound to a schema.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::builder::ConfigBuilder;
use super::convert::Registry;
use super::descriptor::{CollectionKind, ParameterDescriptor, Schema};
use super::embedded::{self, EmbeddedStore};
use super::literal;
use super::validation::{ValidationError, ValidationFailure, ValidationResult};
use super::value::{FromValue, Value};
use super::{ConfigError, ConversionError};

/// Typed, validated access to a flat key-value map described by a [`Schema`].
///
/// A store is immutable once built. Values are converted on every read, so a
/// converter registered globally after construction is picked up by later
/// reads.
///
/// ## Example
///
/// ```
/// use propbind::{ConfigStore, ParameterDescriptor, Schema, ValueType};
///
/// let schema = Schema::builder()
///     .parameter(ParameterDescriptor::builder("name", ValueType::String).build()?)
///     .parameter(
///         ParameterDescriptor::builder("port", ValueType::Int)
///             .default_value("8080")
///             .build()?,
///     )
///     .build()?;
///
/// let store = ConfigStore::new([("name", "svc")], schema);
/// store.validate()?;
/// assert_eq!(store.get::<i32>("port")?, Some(8080));
/// # Ok::<(), propbind::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigStore {
    entries: HashMap<String, String>,
    schema: Schema,
    children: Vec<EmbeddedStore>,
    registry: Arc<Registry>,
    path: String,
    present: bool,
}

impl ConfigStore {
    /// Creates a store using only the process-wide converters.
    pub fn new<I, K, V>(entries: I, schema: Schema) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::with_registry(entries, schema, Registry::new())
    }

    /// Creates a store whose `registry` takes precedence over the
    /// process-wide converters and list parsers.
    pub fn with_registry<I, K, V>(entries: I, schema: Schema, registry: Registry) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::node(entries, schema, Arc::new(registry), String::new(), true)
    }

    /// Creates a builder layering files, environment and maps.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub(super) fn node(
        entries: HashMap<String, String>,
        schema: Schema,
        registry: Arc<Registry>,
        path: String,
        present: bool,
    ) -> Self {
        tracing::debug!(
            path = %path,
            entries = entries.len(),
            parameters = schema.parameters().count(),
            "building config store"
        );
        let children = embedded::compose(&entries, &schema, &registry, &path);
        Self {
            entries,
            schema,
            children,
            registry,
            path,
            present,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn entries(&self) -> &HashMap<String, String> {
        &self.entries
    }

    /// The raw entry for `key`, without default substitution.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Key prefix of this store within the root store, empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether any entry exists under this store's prefix. Always true for the root.
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn embedded(&self, key: &str) -> Option<&ConfigStore> {
        self.children
            .iter()
            .find(|child| child.key == key)
            .map(|child| &child.store)
    }

    pub fn descriptor(&self, key: &str) -> Result<&ParameterDescriptor, ConfigError> {
        self.schema
            .parameter(key)
            .ok_or_else(|| ConfigError::UnknownKey(self.qualified(key)))
    }

    /// Reads a scalar parameter; `None` when it resolves to nothing.
    pub fn get<T: FromValue>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let descriptor = self.descriptor(key)?;
        self.get_value(descriptor)?
            .map(|value| self.extract(key, value))
            .transpose()
    }

    /// Same resolution as [`get`](Self::get); reads an optional-wrapper
    /// parameter, where absent and blank values are both empty.
    pub fn get_optional<T: FromValue>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
    }

    /// Reads a scalar parameter that must resolve to a value.
    pub fn require<T: FromValue>(&self, key: &str) -> Result<T, ConfigError> {
        self.get(key)?
            .ok_or_else(|| ConfigError::MissingValue(self.qualified(key)))
    }

    /// Resolves and converts a scalar descriptor: raw entry, else default.
    pub fn get_value(&self, descriptor: &ParameterDescriptor) -> Result<Option<Value>, ConfigError> {
        if descriptor.collection().is_collection() {
            return Err(ConfigError::IsACollection {
                key: self.qualified(descriptor.key()),
                kind: descriptor.collection(),
            });
        }
        match self.resolve_raw(descriptor) {
            Some(raw) => Ok(self.convert(descriptor, raw)?),
            None => Ok(None),
        }
    }

    /// Reads a collection parameter. Lists and arrays keep token order; sets
    /// drop repeated values, keeping the first occurrence.
    pub fn get_collection<T: FromValue>(&self, key: &str) -> Result<Option<Vec<T>>, ConfigError> {
        let descriptor = self.descriptor(key)?;
        let Some(values) = self.get_values(descriptor)? else {
            return Ok(None);
        };
        values
            .into_iter()
            .map(|value| self.extract(key, value))
            .collect::<Result<Vec<T>, _>>()
            .map(Some)
    }

    pub fn get_values(&self, descriptor: &ParameterDescriptor) -> Result<Option<Vec<Value>>, ConfigError> {
        if !descriptor.collection().is_collection() {
            return Err(ConfigError::NotACollection(self.qualified(descriptor.key())));
        }
        let Some(raw) = self.resolve_raw(descriptor) else {
            return Ok(None);
        };

        let mut values: Vec<Value> = Vec::new();
        for token in self.tokens(descriptor, raw) {
            let Some(value) = self.convert(descriptor, &token)? else {
                continue;
            };
            if descriptor.collection() == CollectionKind::Set && values.contains(&value) {
                continue;
            }
            values.push(value);
        }
        Ok(Some(values))
    }

    /// Integer fast path using the literal grammar, bypassing converters.
    pub fn get_int(&self, key: &str) -> Result<Option<i32>, ConfigError> {
        self.fast_path(key, "i32", literal::parse_i32)
    }

    pub fn get_long(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        self.fast_path(key, "i64", literal::parse_i64)
    }

    pub fn get_double(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        self.fast_path(key, "f64", literal::parse_f64)
    }

    /// `true` only for `true` or `yes` in any case; absent is `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.raw_or_default(key).is_some_and(literal::parse_bool)
    }

    /// Checks the whole tree, failing with every problem found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let result = self.validation_result();
        if result.has_failures() {
            tracing::warn!(failures = result.len(), "configuration validation failed");
        }
        result.into_result()
    }

    /// Collects failures without turning them into an error.
    pub fn validation_result(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        self.collect_failures(&mut result);
        result
    }

    pub(super) fn collect_failures(&self, result: &mut ValidationResult) {
        for descriptor in self.schema.parameters() {
            self.check(descriptor, result);
        }
        embedded::collect_failures(&self.children, result);
    }

    fn check(&self, descriptor: &ParameterDescriptor, result: &mut ValidationResult) {
        let key = self.qualified(descriptor.key());
        let raw = self
            .resolve_raw(descriptor)
            .filter(|raw| !raw.trim().is_empty());
        let Some(raw) = raw else {
            if descriptor.is_mandatory() {
                result.add_failure(ValidationFailure::missing(key, descriptor.type_label()));
            }
            return;
        };

        let tokens = if descriptor.collection().is_collection() {
            self.tokens(descriptor, raw)
        } else {
            vec![raw.to_string()]
        };
        for token in tokens {
            if let Err(err) = self.convert(descriptor, &token) {
                result.add_failure(ValidationFailure::unparsable(
                    key.clone(),
                    descriptor.type_label(),
                    err.value,
                ));
            }
        }
    }

    /// Non-blank raw entry, else the declared default.
    fn resolve_raw<'a>(&'a self, descriptor: &'a ParameterDescriptor) -> Option<&'a str> {
        self.present_raw(descriptor.key()).or(descriptor.default_value())
    }

    fn raw_or_default(&self, key: &str) -> Option<&str> {
        self.present_raw(key)
            .or_else(|| self.schema.parameter(key).and_then(|p| p.default_value()))
    }

    fn present_raw(&self, key: &str) -> Option<&str> {
        self.raw(key).filter(|raw| !raw.trim().is_empty())
    }

    fn convert(&self, descriptor: &ParameterDescriptor, raw: &str) -> Result<Option<Value>, ConversionError> {
        self.registry
            .convert(descriptor.value_type(), descriptor.converter(), raw)
    }

    fn tokens(&self, descriptor: &ParameterDescriptor, raw: &str) -> Vec<String> {
        let id = descriptor.list_parser().or(self.schema.list_parser());
        self.registry.list_parser(id).split(raw)
    }

    fn fast_path<N>(
        &self,
        key: &str,
        type_name: &str,
        parse: fn(&str) -> Result<N, &'static str>,
    ) -> Result<Option<N>, ConfigError> {
        match self.raw_or_default(key) {
            Some(raw) if !raw.trim().is_empty() => parse(raw)
                .map(Some)
                .map_err(|reason| ConversionError::new(raw, type_name, reason).into()),
            _ => Ok(None),
        }
    }

    fn extract<T: FromValue>(&self, key: &str, value: Value) -> Result<T, ConfigError> {
        T::from_value(value).map_err(|actual| ConfigError::TypeMismatch {
            key: self.qualified(key),
            expected: std::any::type_name::<T>(),
            actual: actual.kind().to_string(),
        })
    }

    fn qualified(&self, key: &str) -> String {
        format!("{}{key}", self.path)
    }

    fn rows(&self, rows: &mut Vec<(String, String, String)>) {
        for descriptor in self.schema.parameters() {
            let value = match (self.present_raw(descriptor.key()), descriptor.default_value()) {
                (Some(raw), _) => raw.to_string(),
                (None, Some(default)) => format!("{default} (default)"),
                (None, None) => "<unset>".to_string(),
            };
            rows.push((
                self.qualified(descriptor.key()),
                format!("[{}]", descriptor.type_label()),
                value,
            ));
        }
        for child in &self.children {
            child.store.rows(rows);
        }
    }
}

impl fmt::Display for ConfigStore {
    /// One line per parameter of the tree, columns aligned.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows = Vec::new();
        self.rows(&mut rows);
        let key_width = rows.iter().map(|(k, _, _)| k.len()).max().unwrap_or(0);
        let type_width = rows.iter().map(|(_, t, _)| t.len()).max().unwrap_or(0);
        for (key, ty, value) in rows {
            writeln!(f, "{key:<key_width$}  {ty:<type_width$}  {value}")?;
        }
        Ok(())
    }
}
