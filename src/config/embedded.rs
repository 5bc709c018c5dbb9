//! Composition of nested stores for embedded schemas.
//!
//! A child store sees only the entries under its group's prefix, with the
//! prefix stripped, and recurses with its own separator at every level.

use std::collections::HashMap;
use std::sync::Arc;

use super::convert::Registry;
use super::descriptor::Schema;
use super::store::ConfigStore;
use super::validation::ValidationResult;

/// A child store together with the facts its parent validates it by.
#[derive(Debug, Clone)]
pub(super) struct EmbeddedStore {
    pub key: String,
    pub mandatory: bool,
    pub store: ConfigStore,
}

/// Entries whose key starts with `prefix`, with the prefix removed.
pub fn sub_entries(entries: &HashMap<String, String>, prefix: &str) -> HashMap<String, String> {
    entries
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(prefix)
                .filter(|rest| !rest.is_empty())
                .map(|rest| (rest.to_string(), value.clone()))
        })
        .collect()
}

/// Builds one child store per embedded descriptor of `schema`.
///
/// `path` is the parent's qualified key prefix; children extend it with
/// their own prefix so failures name the key as written in the source.
pub(super) fn compose(
    entries: &HashMap<String, String>,
    schema: &Schema,
    registry: &Arc<Registry>,
    path: &str,
) -> Vec<EmbeddedStore> {
    schema
        .embedded()
        .map(|descriptor| {
            let prefix = descriptor.prefix();
            let nested = sub_entries(entries, &prefix);
            let present = !nested.is_empty();
            let qualified = format!("{path}{}", descriptor.key());
            tracing::debug!(
                key = %qualified,
                present,
                entries = nested.len(),
                "composing embedded config"
            );
            EmbeddedStore {
                key: descriptor.key().to_string(),
                mandatory: descriptor.is_mandatory(),
                store: ConfigStore::node(
                    nested,
                    descriptor.schema().clone(),
                    Arc::clone(registry),
                    format!("{path}{prefix}"),
                    present,
                ),
            }
        })
        .collect()
}

/// Merges the failures of every child that is present or mandatory.
pub(super) fn collect_failures(children: &[EmbeddedStore], result: &mut ValidationResult) {
    for child in children {
        if child.store.is_present() || child.mandatory {
            child.store.collect_failures(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sub_entries_strips_prefix() {
        let entries = map(&[
            ("mqtt.host", "x"),
            ("mqtt.port", "1883"),
            ("mqttx.other", "no"),
            ("mqtt.", "empty remainder"),
            ("name", "svc"),
        ]);
        let nested = sub_entries(&entries, "mqtt.");
        assert_eq!(nested, map(&[("host", "x"), ("port", "1883")]));
    }

    #[test]
    fn test_sub_entries_with_custom_separator() {
        let entries = map(&[("db::url", "pg://"), ("db.url", "ignored")]);
        assert_eq!(sub_entries(&entries, "db::"), map(&[("url", "pg://")]));
    }
}
