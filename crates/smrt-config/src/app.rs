//! Application configuration.
//!
//! An application may ship a JSON configuration file, located through the
//! `SMRT_CONFIGURATION` environment variable and optionally checked against
//! a named schema before the application sees it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use smrt_schema::{violations, SchemaResolver};

use crate::ConfigError;

/// Environment variable naming the application configuration file.
pub const CONFIGURATION_ENV: &str = "SMRT_CONFIGURATION";

/// Loads the application's own configuration file.
#[derive(Debug, Clone)]
pub struct AppConfigLoader {
    path: Option<PathBuf>,
    resolver: Arc<SchemaResolver>,
}

impl AppConfigLoader {
    /// Locate the file through [`CONFIGURATION_ENV`].
    pub fn from_env(resolver: Arc<SchemaResolver>) -> Self {
        let path = std::env::var_os(CONFIGURATION_ENV).map(PathBuf::from);
        Self { path, resolver }
    }

    /// Use an explicit path, or none.
    pub fn with_path(path: Option<PathBuf>, resolver: Arc<SchemaResolver>) -> Self {
        Self { path, resolver }
    }

    /// The configured file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the configuration, validating it against `schema` when given.
    ///
    /// Returns `Ok(None)` when no file is configured or the file does not
    /// exist.
    pub fn load(&self, schema: Option<&str>) -> Result<Option<Value>, ConfigError> {
        match self.path.as_deref() {
            Some(path) => load_path(path, schema, &self.resolver),
            None => {
                tracing::debug!("{} not set, no application configuration", CONFIGURATION_ENV);
                Ok(None)
            }
        }
    }
}

/// Load and optionally validate a configuration file at `path`.
pub fn load_path(
    path: &Path,
    schema: Option<&str>,
    resolver: &SchemaResolver,
) -> Result<Option<Value>, ConfigError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no configuration file found");
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
    let config: Value = serde_json::from_str(&content)?;

    let Some(name) = schema else {
        tracing::info!(path = %path.display(), "configuration file found, but no schema supplied");
        return Ok(Some(config));
    };

    let Some(document) = resolver.resolve(name)? else {
        tracing::warn!(
            path = %path.display(),
            schema = name,
            "could not find configuration schema, skipping validation"
        );
        return Ok(Some(config));
    };

    let found = violations(&config, &document);
    if !found.is_empty() {
        return Err(ConfigError::SchemaViolation {
            path: path.to_path_buf(),
            schema: name.to_string(),
            violations: found,
        });
    }

    tracing::info!(path = %path.display(), schema = name, "configuration loaded and validated");
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAMP_CONFIG_SCHEMA: &str = r#"{
        "$schema": "http://json-schema.org/draft-06/schema#",
        "type": "object",
        "properties": {"bridge": {"type": "string"}},
        "required": ["bridge"]
    }"#;

    fn setup() -> (tempfile::TempDir, SchemaResolver) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lamp.config.v1.json"), LAMP_CONFIG_SCHEMA).unwrap();
        let resolver = SchemaResolver::with_root(dir.path());
        (dir, resolver)
    }

    #[test]
    fn test_missing_file_is_none() {
        let (dir, resolver) = setup();
        let result = load_path(&dir.path().join("absent.json"), None, &resolver).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unset_path_is_none() {
        let (_dir, resolver) = setup();
        let loader = AppConfigLoader::with_path(None, Arc::new(resolver));
        assert!(loader.load(Some("lamp.config.v1")).unwrap().is_none());
    }

    #[test]
    fn test_valid_file_without_schema() {
        let (dir, resolver) = setup();
        let path = dir.path().join("lamp.json");
        fs::write(&path, r#"{"anything": 1}"#).unwrap();

        let config = load_path(&path, None, &resolver).unwrap().unwrap();
        assert_eq!(config["anything"], 1);
    }

    #[test]
    fn test_valid_file_with_schema() {
        let (dir, resolver) = setup();
        let path = dir.path().join("lamp.json");
        fs::write(&path, r#"{"bridge": "10.0.0.2"}"#).unwrap();

        let loader = AppConfigLoader::with_path(Some(path), Arc::new(resolver));
        let config = loader.load(Some("lamp.config.v1")).unwrap().unwrap();
        assert_eq!(config["bridge"], "10.0.0.2");
    }

    #[test]
    fn test_schema_violation_is_error() {
        let (dir, resolver) = setup();
        let path = dir.path().join("lamp.json");
        fs::write(&path, r#"{"bridge": 7}"#).unwrap();

        let err = load_path(&path, Some("lamp.config.v1"), &resolver).unwrap_err();
        match err {
            ConfigError::SchemaViolation { violations, .. } => assert!(!violations.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_json_is_error() {
        let (dir, resolver) = setup();
        let path = dir.path().join("lamp.json");
        fs::write(&path, "bridge = 1").unwrap();

        let err = load_path(&path, None, &resolver).unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_unknown_schema_skips_validation() {
        let (dir, resolver) = setup();
        let path = dir.path().join("lamp.json");
        fs::write(&path, r#"{"bridge": 7}"#).unwrap();

        let config = load_path(&path, Some("heater.config.v1"), &resolver)
            .unwrap()
            .unwrap();
        assert_eq!(config["bridge"], 7);
    }
}
