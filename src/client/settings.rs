//! Client settings.
//!
//! Loaded like the server's: defaults, then `config/client.toml`, then
//! `LIVE__*` environment variables (e.g. `LIVE__API_URL`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    /// Base URL of the REST API, including `/api/v1`
    pub api_url: String,

    /// WebSocket gateway URL
    pub gateway_url: String,

    /// Bearer token of the signed-in learner
    #[serde(default)]
    pub token: Option<String>,

    /// Heartbeat period while joined, in milliseconds
    pub ping_interval_ms: u64,

    /// How long a notification banner stays up, in milliseconds
    pub notification_ttl_ms: u64,

    /// Per-request timeout, in seconds
    pub request_timeout_secs: u64,
}

impl ClientSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Config::builder()
            .set_default("api_url", "http://localhost:3000/api/v1")?
            .set_default("gateway_url", "ws://localhost:3000/gateway")?
            .set_default("ping_interval_ms", 30000_i64)?
            .set_default("notification_ttl_ms", 6000_i64)?
            .set_default("request_timeout_secs", 15_i64)?
            .add_source(File::with_name("config/client").required(false))
            .add_source(
                Environment::default()
                    .prefix("LIVE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// The signed-in token, ignoring blanks
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api/v1".into(),
            gateway_url: "ws://localhost:3000/gateway".into(),
            token: None,
            ping_interval_ms: 30000,
            notification_ttl_ms: 6000,
            request_timeout_secs: 15,
        }
    }
}
