//! `.properties` text parsing.
//!
//! Supports `key=value`, `key:value` and `key value` lines, `#`/`!` comment
//! lines, trailing-backslash continuation and the usual escapes
//! (`\t \n \r \f \uXXXX`, plus escaped separators).

use std::collections::HashMap;

/// Parses properties text into a map. Later duplicates win.
pub fn parse_properties(text: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    for line in logical_lines(text) {
        let (key, value) = split_key_value(&line);
        if !key.is_empty() {
            entries.insert(unescape(key), unescape(value));
        }
    }
    entries
}

/// Decodes file bytes as UTF-8, falling back to ISO-8859-1.
pub fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Joins continuation lines and drops blanks and comments.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for physical in text.lines() {
        let trimmed = physical.trim_start();
        let continuing = current.is_some();
        if !continuing && (trimmed.is_empty() || trimmed.starts_with(['#', '!'])) {
            continue;
        }

        let continues = ends_with_odd_backslashes(trimmed);
        let content = if continues {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        let line = current.get_or_insert_with(String::new);
        line.push_str(content);

        if !continues {
            lines.extend(current.take());
        }
    }
    lines.extend(current);
    lines
}

fn ends_with_odd_backslashes(s: &str) -> bool {
    s.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Splits at the first unescaped `=`, `:` or whitespace run.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map_or(rest, str::trim_start);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
