//! Service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_lock_timeout_ms() -> u64 {
    1_000
}

/// Deployment-level settings of one repository instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// URI of the root resource; must end with `/`
    pub root_uri: String,
    /// Directory holding the cross-process lock files
    pub lock_dir: PathBuf,
    /// How long a mutation waits for a contended lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl ServiceConfig {
    /// Config with the default lock timeout
    pub fn new(root_uri: impl Into<String>, lock_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_uri: root_uri.into(),
            lock_dir: lock_dir.into(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }

    /// Parse a config from its JSON form
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The lock timeout as a [`Duration`]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_with_defaults() {
        let config = ServiceConfig::from_json(
            r#"{"root_uri": "http://x/", "lock_dir": "/tmp/tb-locks"}"#,
        )
        .unwrap();
        assert_eq!(config.root_uri, "http://x/");
        assert_eq!(config.lock_timeout(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_from_json_explicit_timeout() {
        let config = ServiceConfig::from_json(
            r#"{"root_uri": "http://x/", "lock_dir": "/tmp/tb-locks", "lock_timeout_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = ServiceConfig::new("http://x/", "/tmp/tb-locks");
        let json = serde_json::to_string(&config).unwrap();
        let back = ServiceConfig::from_json(&json).unwrap();
        assert_eq!(back.root_uri, config.root_uri);
        assert_eq!(back.lock_timeout_ms, config.lock_timeout_ms);
    }
}
