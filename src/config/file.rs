//! File-based configuration source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::descriptor::Schema;
use super::properties::{decode, parse_properties};
use super::source::{flatten_toml, ConfigSource};
use super::ConfigError;

/// A configuration source that loads a `.properties` or `.toml` file.
///
/// The format follows the extension; anything but `.toml` is read as
/// properties. Required files that don't exist cause an error; optional
/// files that don't exist are skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
}

impl FileSource {
    /// Creates a new file source.
    ///
    /// If `required` is true, the build will fail if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            required,
        }
    }

    fn is_toml(&self) -> bool {
        self.path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
    }
}

impl ConfigSource for FileSource {
    fn entries(&self, _schema: &Schema) -> Result<HashMap<String, String>, ConfigError> {
        let Some(bytes) = read_config_file(&self.path, self.required)? else {
            return Ok(HashMap::new());
        };
        let text = decode(&bytes);

        if self.is_toml() {
            let table: toml::Table = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
                path: self.path.clone(),
                source: e,
            })?;
            Ok(flatten_toml(&table))
        } else {
            Ok(parse_properties(&text))
        }
    }
}

/// Reads a config file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn read_config_file(path: &Path, required: bool) -> Result<Option<Vec<u8>>, ConfigError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                tracing::debug!(path = %path.display(), "optional config file not found");
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source_loads_properties() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# service").unwrap();
        writeln!(file, "server.port = 8080").unwrap();

        let source = FileSource::new(file.path(), true);
        let entries = source.entries(&Schema::default()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries["server.port"], "8080");
    }

    #[test]
    fn test_file_source_loads_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 8080").unwrap();

        let source = FileSource::new(file.path(), true);
        let entries = source.entries(&Schema::default()).unwrap();

        assert_eq!(entries["server.port"], "8080");
    }

    #[test]
    fn test_file_source_invalid_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server").unwrap();

        let source = FileSource::new(file.path(), true);
        let result = source.entries(&Schema::default());

        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_file_source_required_missing() {
        let source = FileSource::new("/nonexistent/path/config.properties", true);
        let result = source.entries(&Schema::default());

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_file_source_optional_missing() {
        let source = FileSource::new("/nonexistent/path/config.properties", false);
        let entries = source.entries(&Schema::default()).unwrap();

        assert!(entries.is_empty());
    }
}
