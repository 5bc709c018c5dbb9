use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::convert::{Converter, Registry};
use super::descriptor::Schema;
use super::env::EnvSource;
use super::file::FileSource;
use super::list::ListParser;
use super::resolve::resolve_references;
use super::source::{ConfigSource, MapSource};
use super::store::ConfigStore;
use super::value::ValueType;
use super::ConfigError;

/// Builder for a [`ConfigStore`] fed by several sources.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones key by key.
///
/// ## Variable References
///
/// Values can reference other entries using `${key}` syntax:
///
/// ```properties
/// server.host = localhost
/// server.url = http://${server.host}:8080/api
/// ```
///
/// Use `$$` to escape a literal `$` (e.g., `$${VAR}` becomes `${VAR}`).
/// Expansion runs once, after all sources are merged.
///
/// ## Example
///
/// ```no_run
/// use propbind::{ConfigStore, ParameterDescriptor, Schema, ValueType};
///
/// let schema = Schema::builder()
///     .parameter(ParameterDescriptor::builder("server.port", ValueType::Int).build()?)
///     .build()?;
///
/// // defaults -> local overrides -> environment overrides both
/// let store = ConfigStore::builder()
///     .with_file("config/default.properties", true)
///     .with_file("config/local.toml", false)
///     .with_env_prefix("MYAPP")
///     .build_validated(schema)?;
/// # Ok::<(), propbind::Error>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    registry: Registry,
    expand_variables: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            registry: Registry::new(),
            expand_variables: true,
        }
    }
}

impl ConfigBuilder {
    /// Adds a `.properties` or `.toml` file to be loaded.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Loads every environment variable that relaxed-matches a schema key.
    pub fn with_env(self) -> Self {
        self.with_source(EnvSource::new())
    }

    /// Like [`with_env`](Self::with_env), restricted to `<PREFIX>_*` variables.
    pub fn with_env_prefix(self, prefix: impl Into<String>) -> Self {
        self.with_source(EnvSource::with_prefix(prefix))
    }

    pub fn with_entries<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_source(MapSource::new(entries))
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Overrides the converter for `ty` in the built store only.
    pub fn with_converter(mut self, ty: ValueType, converter: Converter) -> Self {
        self.registry.register_converter(ty, converter);
        self
    }

    pub fn with_named_converter(mut self, id: impl Into<String>, converter: Converter) -> Self {
        self.registry.register_named_converter(id, converter);
        self
    }

    /// Overrides the default list parser in the built store only.
    pub fn with_list_parser(mut self, parser: Arc<dyn ListParser>) -> Self {
        self.registry.register_list_parser(parser);
        self
    }

    pub fn with_named_list_parser(mut self, id: impl Into<String>, parser: Arc<dyn ListParser>) -> Self {
        self.registry.register_named_list_parser(id, parser);
        self
    }

    /// Enables or disables `${key}` expansion (enabled by default).
    pub fn expand_variables(mut self, enabled: bool) -> Self {
        self.expand_variables = enabled;
        self
    }

    /// Loads and merges all sources and binds them to `schema`.
    ///
    /// The store is not validated; see [`build_validated`](Self::build_validated).
    pub fn build(self, schema: Schema) -> Result<ConfigStore, ConfigError> {
        let mut merged: HashMap<String, String> = HashMap::new();

        for source in &self.sources {
            merged.extend(source.entries(&schema)?);
        }

        // Resolve ${...} references after all sources are merged
        if self.expand_variables {
            resolve_references(&mut merged)?;
        }

        Ok(ConfigStore::with_registry(merged, schema, self.registry))
    }

    /// Builds the store and validates it, for start-up code that should stop
    /// with one complete report.
    pub fn build_validated(self, schema: Schema) -> Result<ConfigStore, crate::Error> {
        let store = self.build(schema)?;
        store.validate()?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::descriptor::{CollectionKind, EmbeddedDescriptor, ParameterDescriptor};
    use crate::config::list::SplitParser;
    use crate::config::value::Value;
    use crate::Error;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn schema() -> Schema {
        let mqtt = Schema::builder()
            .parameter(
                ParameterDescriptor::builder("host", ValueType::String)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        Schema::builder()
            .parameter(
                ParameterDescriptor::builder("name", ValueType::String)
                    .build()
                    .unwrap(),
            )
            .parameter(
                ParameterDescriptor::builder("url", ValueType::String)
                    .optional()
                    .build()
                    .unwrap(),
            )
            .embedded(EmbeddedDescriptor::builder("mqtt", mqtt).build().unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_later_sources_override_earlier() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name = from-file\nmqtt.host = broker").unwrap();

        let store = ConfigStore::builder()
            .with_file(file.path(), true)
            .with_entries([("name", "from-map")])
            .build(schema())
            .unwrap();

        assert_eq!(store.require::<String>("name").unwrap(), "from-map");
        let mqtt = store.embedded("mqtt").unwrap();
        assert_eq!(mqtt.require::<String>("host").unwrap(), "broker");
    }

    #[test]
    fn test_variables_expand_across_sources() {
        let store = ConfigStore::builder()
            .with_entries([("mqtt.host", "broker")])
            .with_entries([("name", "svc"), ("url", "tcp://${mqtt.host}:1883")])
            .build(schema())
            .unwrap();
        assert_eq!(
            store.get::<String>("url").unwrap().as_deref(),
            Some("tcp://broker:1883")
        );
    }

    #[test]
    fn test_variable_expansion_can_be_disabled() {
        let store = ConfigStore::builder()
            .with_entries([("name", "${literally}")])
            .expand_variables(false)
            .build(schema())
            .unwrap();
        assert_eq!(store.raw("name"), Some("${literally}"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_entries() {
        std::env::set_var("PROPBIND_BUILDER_TEST_MQTT_HOST", "env-broker");

        let store = ConfigStore::builder()
            .with_entries([("name", "svc"), ("mqtt.host", "map-broker")])
            .with_env_prefix("propbind_builder_test")
            .build(schema());

        std::env::remove_var("PROPBIND_BUILDER_TEST_MQTT_HOST");
        let store = store.unwrap();
        let mqtt = store.embedded("mqtt").unwrap();
        assert_eq!(mqtt.require::<String>("host").unwrap(), "env-broker");
        assert_eq!(store.require::<String>("name").unwrap(), "svc");
    }

    #[test]
    fn test_missing_required_file() {
        let result = ConfigStore::builder()
            .with_file("/nonexistent/app.properties", true)
            .build(schema());
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_build_validated_reports_all_failures() {
        let result = ConfigStore::builder()
            .with_entries([("mqtt.other", "x")])
            .build_validated(schema());
        let Err(Error::Validation(err)) = result else {
            panic!("expected a validation error");
        };
        let keys: Vec<&str> = err.result().iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "mqtt.host"]);
    }

    #[test]
    fn test_builder_scoped_converters_and_parsers() {
        let schema = Schema::builder()
            .parameter(
                ParameterDescriptor::builder("level", ValueType::custom("level"))
                    .build()
                    .unwrap(),
            )
            .parameter(
                ParameterDescriptor::builder("tags", ValueType::String)
                    .collection(CollectionKind::List)
                    .list_parser("pipe")
                    .optional()
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let store = ConfigStore::builder()
            .with_entries([("level", "3"), ("tags", "a|b")])
            .with_converter(
                ValueType::custom("level"),
                Converter::new(|raw| Ok(Value::custom(raw.len()))),
            )
            .with_named_list_parser("pipe", Arc::new(SplitParser::on('|')))
            .build(schema)
            .unwrap();

        let level = store.get::<Value>("level").unwrap().unwrap();
        assert_eq!(level, Value::custom(1_usize));
        assert_eq!(
            store.get_collection::<String>("tags").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}
