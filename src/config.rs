//! Server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the `web` binary. Unset or invalid variables fall back to defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    /// `HOST`, default `0.0.0.0` so the app is reachable on a VPS.
    pub host: String,
    /// `PORT`, default 8080.
    pub port: u16,
    /// `DATA_DIR`: when set, each tournament is saved to `<dir>/<id>.json`.
    pub data_dir: Option<PathBuf>,
    /// `INACTIVITY_TIMEOUT_HOURS`, default 12.
    pub inactivity_timeout: Duration,
    /// How often idle tournaments are swept from memory.
    pub cleanup_interval: Duration,
    /// `SESSION_KEY`: cookie signing key material (at least 64 bytes).
    pub session_key: Option<Vec<u8>>,
}

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_INACTIVITY_HOURS: u64 = 12;
pub const MIN_SESSION_KEY_LEN: usize = 64;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: None,
            inactivity_timeout: Duration::from_secs(DEFAULT_INACTIVITY_HOURS * 3600),
            cleanup_interval: Duration::from_secs(30 * 60),
            session_key: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable lookup (the environment, or a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(raw) = get("PORT") {
            match raw.parse() {
                Ok(port) => config.port = port,
                Err(_) => log::warn!("Ignoring invalid PORT={raw:?}, using {DEFAULT_PORT}"),
            }
        }
        config.data_dir = get("DATA_DIR").map(PathBuf::from);
        if let Some(raw) = get("INACTIVITY_TIMEOUT_HOURS") {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|&hours| hours > 0)
                .and_then(|hours| hours.checked_mul(3600));
            match secs {
                Some(secs) => config.inactivity_timeout = Duration::from_secs(secs),
                None => log::warn!(
                    "Ignoring invalid INACTIVITY_TIMEOUT_HOURS={raw:?}, using {DEFAULT_INACTIVITY_HOURS}"
                ),
            }
        }
        if let Some(key) = get("SESSION_KEY") {
            if key.len() >= MIN_SESSION_KEY_LEN {
                config.session_key = Some(key.into_bytes());
            } else {
                log::warn!("SESSION_KEY shorter than {MIN_SESSION_KEY_LEN} bytes, generating a random key");
            }
        }
        config
    }

    /// File a tournament is persisted to, when `DATA_DIR` is set.
    pub fn tournament_path(&self, id: uuid::Uuid) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(format!("{id}.json")))
    }
}
