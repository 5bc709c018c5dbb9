//! Aggregated validation outcome of a config tree.

use std::fmt;

use thiserror::Error;

/// Rendered in place of a placeholder that has no value.
const UNKNOWN: &str = "???";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MissingMandatoryValue,
    UnparsableValue,
}

impl FailureKind {
    /// Message template; `${key}`, `${value}` and `${type}` are substituted.
    pub fn template(self) -> &'static str {
        match self {
            Self::MissingMandatoryValue => "missing mandatory value for '${key}' (expected ${type})",
            Self::UnparsableValue => "value '${value}' of '${key}' cannot be parsed as ${type}",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub key: String,
    pub expected_type: Option<String>,
    pub raw_value: Option<String>,
}

impl ValidationFailure {
    pub fn missing(key: impl Into<String>, expected_type: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::MissingMandatoryValue,
            key: key.into(),
            expected_type: Some(expected_type.into()),
            raw_value: None,
        }
    }

    pub fn unparsable(
        key: impl Into<String>,
        expected_type: impl Into<String>,
        raw_value: impl Into<String>,
    ) -> Self {
        Self {
            kind: FailureKind::UnparsableValue,
            key: key.into(),
            expected_type: Some(expected_type.into()),
            raw_value: Some(raw_value.into()),
        }
    }

    pub fn message(&self) -> String {
        render(
            self.kind.template(),
            &[
                ("key", Some(self.key.as_str())),
                ("value", self.raw_value.as_deref()),
                ("type", self.expected_type.as_deref()),
            ],
        )
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Substitutes `${name}` placeholders. Known names without a value render as
/// `???`; unknown placeholders are kept verbatim.
fn render(template: &str, vars: &[(&str, Option<&str>)]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match vars.iter().find(|(n, _)| *n == name) {
            Some((_, value)) => out.push_str(value.unwrap_or(UNKNOWN)),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Ordered set of failures collected in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    failures: Vec<ValidationFailure>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `failure` unless an identical one is already present.
    pub fn add_failure(&mut self, failure: ValidationFailure) {
        if !self.failures.contains(&failure) {
            self.failures.push(failure);
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        for failure in other.failures {
            self.add_failure(failure);
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationFailure> {
        self.failures.iter()
    }

    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// `Err` carrying this result when it holds failures.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.has_failures() {
            Err(ValidationError { result: self })
        } else {
            Ok(())
        }
    }
}

impl<'a> IntoIterator for &'a ValidationResult {
    type Item = &'a ValidationFailure;
    type IntoIter = std::slice::Iter<'a, ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

impl IntoIterator for ValidationResult {
    type Item = ValidationFailure;
    type IntoIter = std::vec::IntoIter<ValidationFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return f.write_str("Validation Success");
        }
        writeln!(f, "Validation Failed")?;
        for failure in &self.failures {
            writeln!(f, "  - {failure}")?;
        }
        Ok(())
    }
}

/// The configuration is invalid; carries every failure found.
#[derive(Debug, Clone, Error)]
#[error("{result}")]
pub struct ValidationError {
    result: ValidationResult,
}

impl ValidationError {
    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn into_result(self) -> ValidationResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_renders_success() {
        let result = ValidationResult::new();
        assert!(!result.has_failures());
        assert_eq!(result.to_string(), "Validation Success");
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_failed_result_rendering() {
        let mut result = ValidationResult::new();
        result.add_failure(ValidationFailure::missing("name", "string"));
        result.add_failure(ValidationFailure::unparsable("port", "i32", "eighty"));

        assert_eq!(
            result.to_string(),
            "Validation Failed\n\
             \x20 - missing mandatory value for 'name' (expected string)\n\
             \x20 - value 'eighty' of 'port' cannot be parsed as i32\n"
        );
    }

    #[test]
    fn test_missing_placeholder_renders_unknown() {
        let failure = ValidationFailure {
            kind: FailureKind::UnparsableValue,
            key: "port".into(),
            expected_type: None,
            raw_value: None,
        };
        assert_eq!(failure.message(), "value '???' of 'port' cannot be parsed as ???");
    }

    #[test]
    fn test_render_keeps_unknown_and_unclosed_placeholders() {
        assert_eq!(render("${other} ${key}", &[("key", Some("k"))]), "${other} k");
        assert_eq!(render("tail ${key", &[("key", Some("k"))]), "tail ${key");
    }

    #[test]
    fn test_identical_failures_collapse() {
        let mut result = ValidationResult::new();
        result.add_failure(ValidationFailure::missing("name", "string"));
        result.add_failure(ValidationFailure::missing("name", "string"));
        result.add_failure(ValidationFailure::missing("other", "string"));
        assert_eq!(result.len(), 2);
        assert_eq!(
            result.iter().map(|f| f.key.as_str()).collect::<Vec<_>>(),
            vec!["name", "other"]
        );
    }

    #[test]
    fn test_error_wraps_result() {
        let mut result = ValidationResult::new();
        result.add_failure(ValidationFailure::missing("name", "string"));
        let err = result.clone().into_result().unwrap_err();
        assert_eq!(err.result(), &result);
        assert!(err.to_string().starts_with("Validation Failed"));
    }
}
