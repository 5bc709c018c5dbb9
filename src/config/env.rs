use std::collections::HashMap;

use super::descriptor::Schema;
use super::source::ConfigSource;
use super::ConfigError;

/// Environment variables matched to schema keys by relaxed comparison.
///
/// A key matches a variable when both normalize to the same name: `.` and
/// `-` become `_`, a camelCase boundary inserts `_`, and case is ignored.
/// `SERVER_MQTT_HOST` therefore matches `server.mqttHost`. With a prefix,
/// only variables starting with `<PREFIX>_` are considered.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: Option<String>,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Matches `vars` against every key of `schema`.
    pub fn match_vars<I>(&self, schema: &Schema, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix = self
            .prefix
            .as_deref()
            .map(|p| format!("{}_", relaxed_key(p)));

        let vars: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(name, value)| {
                let name = name.to_ascii_uppercase();
                let name = match &prefix {
                    Some(prefix) => name.strip_prefix(prefix.as_str())?.to_string(),
                    None => name,
                };
                Some((name, value))
            })
            .collect();

        schema
            .flattened_keys()
            .into_iter()
            .filter_map(|key| {
                let value = vars.get(&relaxed_key(&key))?.clone();
                Some((key, value))
            })
            .collect()
    }
}

impl ConfigSource for EnvSource {
    fn entries(&self, schema: &Schema) -> Result<HashMap<String, String>, ConfigError> {
        let entries = self.match_vars(schema, std::env::vars());
        tracing::debug!(matched = entries.len(), "loaded environment entries");
        Ok(entries)
    }
}

/// Normalizes a config key to its environment-variable form. Every
/// separator character becomes `_`, so `tls::cert` maps to `TLS__CERT`.
pub fn relaxed_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        match c {
            c if !c.is_alphanumeric() => out.push('_'),
            c if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) => {
                out.push('_');
                out.extend(c.to_uppercase());
            }
            c => out.extend(c.to_uppercase()),
        }
        prev = Some(c);
    }
    out
}
