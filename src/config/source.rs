use std::collections::HashMap;

use toml::{Table, Value};

use super::descriptor::Schema;
use super::ConfigError;

/// A provider of raw entries for the builder.
///
/// The schema is passed so sources that match keys loosely, such as the
/// environment, know which keys exist.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn entries(&self, schema: &Schema) -> Result<HashMap<String, String>, ConfigError>;
}

/// Fixed in-memory entries.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    entries: HashMap<String, String>,
}

impl MapSource {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for MapSource {
    fn entries(&self, _schema: &Schema) -> Result<HashMap<String, String>, ConfigError> {
        Ok(self.entries.clone())
    }
}

/// Flattens a TOML table into dotted keys.
///
/// Arrays of scalars become one whitespace-separated value with embedded
/// whitespace escaped, so the default list parser recovers the elements.
pub fn flatten_toml(table: &Table) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    flatten_into(table, "", &mut entries);
    entries
}

fn flatten_into(table: &Table, prefix: &str, entries: &mut HashMap<String, String>) {
    for (key, value) in table {
        let path = format!("{prefix}{key}");
        match value {
            Value::Table(nested) => flatten_into(nested, &format!("{path}."), entries),
            Value::Array(items) => {
                let tokens: Vec<String> = items
                    .iter()
                    .filter_map(scalar_to_string)
                    .map(|s| escape_list_token(&s))
                    .collect();
                entries.insert(path, tokens.join(" "));
            }
            scalar => {
                if let Some(s) = scalar_to_string(scalar) {
                    entries.insert(path, s);
                }
            }
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Datetime(dt) => Some(dt.to_string()),
        Value::Array(_) | Value::Table(_) => None,
    }
}

fn escape_list_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        if c == '\\' || c.is_whitespace() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
