// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration sources
//!
//! A source answers "what is the raw value of key K". Sources never validate;
//! that is the loader's job.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::ConfigError;

/// Raw key-value settings provider
pub trait ConfigSource {
    /// Raw value for `key`, if the source defines it
    fn get(&self, key: &str) -> Option<String>;

    /// Human-readable description for logs and errors
    fn describe(&self) -> String;
}

/// Process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn describe(&self) -> String {
        "process environment".to_string()
    }
}

/// In-memory settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSource {
    values: BTreeMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }
}

impl<K, V> FromIterator<(K, V)> for MapSource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn describe(&self) -> String {
        format!("in-memory settings ({} keys)", self.values.len())
    }
}

/// Dotenv-style key-value file (`<dir>/.env.<environment>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSource {
    /// Read the settings file for one environment
    pub fn for_environment(dir: impl AsRef<Path>, environment_id: &str) -> Result<Self, ConfigError> {
        Self::from_path(dir.as_ref().join(format!(".env.{}", environment_id)))
    }

    /// Read an explicit settings file
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let source_error = |reason: String| ConfigError::Source {
            source_name: path.display().to_string(),
            reason,
        };

        let entries = dotenvy::from_path_iter(&path).map_err(|e| source_error(e.to_string()))?;

        let mut values = BTreeMap::new();
        for entry in entries {
            let (key, value) = entry.map_err(|e| source_error(e.to_string()))?;
            values.insert(key, value);
        }

        debug!("Read {} settings from {}", values.len(), path.display());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Ordered stack of sources; the first source defining a key wins
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn ConfigSource>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lower-priority layer
    pub fn layer(mut self, source: impl ConfigSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl ConfigSource for LayeredSource {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }

    fn describe(&self) -> String {
        self.layers
            .iter()
            .map(|layer| layer.describe())
            .collect::<Vec<_>>()
            .join(" > ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_map_source() {
        let source = MapSource::new().with("REGION", "eu-west-1");
        assert_eq!(source.get("REGION").as_deref(), Some("eu-west-1"));
        assert_eq!(source.get("ACCOUNT_ID"), None);
    }

    #[test]
    fn test_layered_first_wins() {
        let source = LayeredSource::new()
            .layer(MapSource::new().with("REGION", "us-east-1"))
            .layer(
                MapSource::new()
                    .with("REGION", "eu-west-1")
                    .with("TEAM_NAME", "goals"),
            );

        assert_eq!(source.get("REGION").as_deref(), Some("us-east-1"));
        assert_eq!(source.get("TEAM_NAME").as_deref(), Some("goals"));
        assert_eq!(source.get("MISSING"), None);
    }

    #[test]
    fn test_file_source_reads_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join(".env.dev")).unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "REGION=eu-west-1").unwrap();
        writeln!(file, "APP_NAME=\"goals app\"").unwrap();

        let source = FileSource::for_environment(dir.path(), "dev").unwrap();
        assert_eq!(source.get("REGION").as_deref(), Some("eu-west-1"));
        assert_eq!(source.get("APP_NAME").as_deref(), Some("goals app"));
    }

    #[test]
    fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSource::for_environment(dir.path(), "prod").unwrap_err();
        assert!(matches!(err, ConfigError::Source { .. }));
    }
}
