//! Configuration management for GRISERA services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (GRISERA_ prefix, `__` separator)
//! 2. Config file (grisera.toml)
//! 3. Defaults

use serde::Deserialize;

use crate::error::Result;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GriseraConfig {
    /// Neo4j connection settings.
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    /// Database used when a command does not name a dataset.
    #[serde(default = "default_database")]
    pub default_database: String,

    /// Dictionary values created by `seed`.
    #[serde(default)]
    pub seed: SeedSettings,
}

/// Connection settings for the Neo4j server.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

/// Dictionary node values that must exist in every dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSettings {
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    #[serde(default = "default_modalities")]
    pub modalities: Vec<String>,

    #[serde(default = "default_life_activities")]
    pub life_activities: Vec<String>,
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "grisera-dev".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn default_channels() -> Vec<String> {
    strings(&[
        "Audio",
        "BVP",
        "Chest size",
        "Depth video",
        "ECG",
        "EDA",
        "EEG",
        "EMG",
        "RGB video",
        "Respiration rate",
        "Temperature",
        "Cursor",
    ])
}

fn default_modalities() -> Vec<String> {
    strings(&[
        "body posture",
        "emotions",
        "eye tracking",
        "facial expressions",
        "gestures",
        "speech",
    ])
}

fn default_life_activities() -> Vec<String> {
    strings(&["movement", "sleep", "speech", "audio", "video"])
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            modalities: default_modalities(),
            life_activities: default_life_activities(),
        }
    }
}

impl Default for GriseraConfig {
    fn default() -> Self {
        Self {
            neo4j: Neo4jSettings::default(),
            default_database: default_database(),
            seed: SeedSettings::default(),
        }
    }
}

impl GriseraConfig {
    /// Load configuration from `{file_prefix}.toml` (optional) and
    /// `GRISERA__*` environment variables.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("GRISERA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = cfg.try_deserialize()?;
        tracing::debug!(
            uri = %loaded.neo4j.uri,
            database = %loaded.default_database,
            "Configuration loaded"
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GriseraConfig::default();
        assert_eq!(config.neo4j.uri, "bolt://localhost:7687");
        assert_eq!(config.neo4j.max_connections, 16);
        assert_eq!(config.default_database, "neo4j");
        assert!(config.seed.channels.contains(&"EEG".to_string()));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("absent");
        let config = GriseraConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.neo4j.fetch_size, 256);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grisera.toml");
        std::fs::write(
            &path,
            r#"
default_database = "abcdefghij"

[neo4j]
uri = "bolt://graph:7687"
password = "secret"

[seed]
channels = ["EEG"]
"#,
        )
        .unwrap();

        let prefix = dir.path().join("grisera");
        let config = GriseraConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.default_database, "abcdefghij");
        assert_eq!(config.neo4j.uri, "bolt://graph:7687");
        assert_eq!(config.neo4j.password, "secret");
        assert_eq!(config.neo4j.user, "neo4j");
        assert_eq!(config.seed.channels, vec!["EEG".to_string()]);
        assert_eq!(config.seed.modalities, default_modalities());
    }
}
