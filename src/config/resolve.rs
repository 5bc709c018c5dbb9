//! Variable expansion between raw entries.
//!
//! A value may reference another entry with `${other.key}`. Use `$$` to
//! produce a literal `$` (so `$${key}` yields `${key}` untouched).

use std::collections::HashMap;

use super::ConfigError;

/// Expands every `${key}` reference in `entries`.
///
/// References are expanded recursively against the unexpanded entries.
/// Returns an error if a reference cycle exists or a referenced key is missing.
pub fn resolve_references(entries: &mut HashMap<String, String>) -> Result<(), ConfigError> {
    let source = entries.clone();
    for (key, value) in entries.iter_mut() {
        if value.contains('$') {
            let mut stack = vec![key.clone()];
            *value = expand(value, &source, &mut stack)?;
        }
    }
    Ok(())
}

/// Expands references in a single value; `stack` holds the keys being expanded.
fn expand(
    value: &str,
    source: &HashMap<String, String>,
    stack: &mut Vec<String>,
) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                // Escape sequence: $$ -> $
                chars.next();
                result.push('$');
            }
            Some('{') => {
                chars.next();
                let name = consume_until(&mut chars, '}').ok_or_else(|| {
                    ConfigError::UnclosedReference(stack.last().cloned().unwrap_or_default())
                })?;
                if stack.contains(&name) {
                    return Err(ConfigError::CircularReference(name));
                }
                let referenced = source
                    .get(&name)
                    .ok_or_else(|| ConfigError::ReferenceNotFound(name.clone()))?;
                stack.push(name);
                let expanded = expand(referenced, source, stack)?;
                stack.pop();
                result.push_str(&expanded);
            }
            _ => result.push('$'),
        }
    }

    Ok(result)
}

/// Consumes characters until the delimiter, returning the collected string.
fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None
}
