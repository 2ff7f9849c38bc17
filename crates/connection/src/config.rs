//! Hub configuration.
//!
//! The host supplies one JSON document per hub:
//!
//! ```json
//! {
//!   "id": "homeassistant",
//!   "name": "Home Assistant",
//!   "data": { "ip": "10.0.0.5:8123", "token": "…", "ssl": false, "ssl_ignore": false },
//!   "heartbeat_interval_ms": 30000,
//!   "reconnect_delay_ms": 2000
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{HubEndpoint, Timings};

const DEFAULT_NAME: &str = "Home Assistant";
const DEFAULT_OWNER_ID: &str = "homeassistant";

/// Connection settings, as found under `data`.
#[derive(Clone, Default, Deserialize)]
pub struct ConnectionData {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub ssl_ignore: bool,
}

impl fmt::Debug for ConnectionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionData")
            .field("ip", &self.ip)
            .field("token", &"<redacted>")
            .field("ssl", &self.ssl)
            .field("ssl_ignore", &self.ssl_ignore)
            .finish()
    }
}

/// Raw hub configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HubConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: ConnectionData,
    #[serde(default)]
    pub heartbeat_interval_ms: Option<u64>,
    #[serde(default)]
    pub reconnect_delay_ms: Option<u64>,
}

impl HubConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::debug!(path = %path.display(), "hub configuration loaded");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Validates the document into an endpoint.
    pub fn endpoint(&self) -> Result<HubEndpoint, ConfigError> {
        let host = self.data.ip.trim();
        if host.is_empty() {
            return Err(ConfigError::MissingField("ip"));
        }
        if self.data.token.is_empty() {
            return Err(ConfigError::MissingField("token"));
        }
        Ok(HubEndpoint {
            host: host.to_string(),
            token: self.data.token.clone(),
            tls: self.data.ssl,
            ignore_cert_errors: self.data.ssl_ignore,
            name: non_empty(self.name.as_deref()).unwrap_or(DEFAULT_NAME).to_string(),
            owner_id: non_empty(self.id.as_deref())
                .unwrap_or(DEFAULT_OWNER_ID)
                .to_string(),
        })
    }

    /// Timer settings, defaults filled in.
    pub fn timings(&self) -> Timings {
        let mut timings = Timings::default();
        if let Some(ms) = self.heartbeat_interval_ms.filter(|ms| *ms > 0) {
            timings.heartbeat_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.reconnect_delay_ms.filter(|ms| *ms > 0) {
            timings.reconnect_delay = Duration::from_millis(ms);
        }
        timings
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
