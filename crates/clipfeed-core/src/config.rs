use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LATEST_LIMIT, DEFAULT_PAGE_SIZE};
use crate::error::CoreError;

/// What the feed cache does with an optimistic like/save flip when the
/// gateway write fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationPolicy {
    /// Restore the pre-toggle state and raise an error notification.
    #[default]
    Rollback,
    /// Leave the optimistic state in place and only log the failure.
    /// It stays wrong until the next reseed.
    KeepOptimistic,
}

/// Feed cache configuration, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedConfig {
    /// Home feed page size
    pub page_size: usize,
    /// Size of the latest/trending list
    pub latest_limit: usize,
    pub mutation_policy: MutationPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            latest_limit: DEFAULT_LATEST_LIMIT,
            mutation_policy: MutationPolicy::default(),
        }
    }
}

impl FeedConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_mutation_policy(mut self, policy: MutationPolicy) -> Self {
        self.mutation_policy = policy;
        self
    }

    /// Page size as used by the pagination controller. A zero page size
    /// would never advance, so it is clamped to one.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }

    /// Load config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| CoreError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json).map_err(|e| CoreError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = FeedConfig::default();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.latest_limit, 7);
        assert_eq!(config.mutation_policy, MutationPolicy::Rollback);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = FeedConfig::from_json(r#"{"pageSize": 10}"#).unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.latest_limit, 7);

        let config = FeedConfig::from_json(r#"{"mutationPolicy": "keepOptimistic"}"#).unwrap();
        assert_eq!(config.mutation_policy, MutationPolicy::KeepOptimistic);
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let config = FeedConfig::default().with_page_size(0);
        assert_eq!(config.effective_page_size(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pageSize": 3, "latestLimit": 2}}"#).unwrap();

        let config = FeedConfig::load(file.path()).unwrap();
        assert_eq!(config.page_size, 3);
        assert_eq!(config.latest_limit, 2);
    }

    #[test]
    fn test_load_invalid_json() {
        assert!(matches!(
            FeedConfig::from_json("not json"),
            Err(CoreError::Config { .. })
        ));
    }
}
