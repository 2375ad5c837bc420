use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clipfeed_core::FeedConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Fixture file backing the in-memory gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,

    /// Sign in with these instead of relying on the fixture's session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,

    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipfeed_core::MutationPolicy;

    #[test]
    fn test_parse_config_with_fixture() {
        let json = r#"{"fixture": "/tmp/clips.json"}"#;
        let config = CliConfig::from_json(json).unwrap();
        assert_eq!(config.fixture, Some(PathBuf::from("/tmp/clips.json")));
        assert!(config.credentials.is_none());
        assert_eq!(config.feed, FeedConfig::default());
    }

    #[test]
    fn test_parse_config_with_credentials_and_feed() {
        let json = r#"{
            "credentials": {"email": "ada@example.com", "password": "secret"},
            "feed": {"pageSize": 3, "mutationPolicy": "keepOptimistic"}
        }"#;
        let config = CliConfig::from_json(json).unwrap();
        let creds = config.credentials.unwrap();
        assert_eq!(creds.email, "ada@example.com");
        assert_eq!(config.feed.page_size, 3);
        assert_eq!(config.feed.mutation_policy, MutationPolicy::KeepOptimistic);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = CliConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
