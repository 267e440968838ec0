//! Configuration types for download-batch

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};

/// Top-level configuration
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data storage settings
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Event channel settings
    #[serde(default)]
    pub events: EventConfig,

    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Database path
    pub fn database_path(&self) -> &PathBuf {
        &self.persistence.database_path
    }

    /// Reject settings the services can't run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.events.channel_capacity == 0 {
            return Err(crate::Error::Config {
                message: "event channel capacity must be at least 1".to_string(),
                key: Some("events.channel_capacity".to_string()),
            });
        }
        Ok(())
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database path (default: "./download-batch.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// How long a writer waits on a locked database before failing (default: 5 seconds)
    ///
    /// Also bounds how long a caller waits for a pooled connection.
    #[serde(default = "default_busy_timeout", with = "duration_serde")]
    pub busy_timeout: Duration,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout: default_busy_timeout(),
        }
    }
}

/// Event broadcast configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventConfig {
    /// Capacity of the broadcast channel (default: 1000)
    ///
    /// Slow subscribers that fall further behind than this miss events.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./download-batch.db")
}

fn default_busy_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_channel_capacity() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
