//! Application-level configuration loading: server endpoints, local store
//! location, element set and the playback timing contract.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};
use validator::Validate;

use crate::state::session::{Element, ElementRegistry, Tone};

/// Default location on disk where the engine looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/simon.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SIMON_CONFIG_PATH";
/// Environment variable that overrides [`AppConfig::server_url`].
const SERVER_URL_ENV: &str = "SIMON_SERVER_URL";
/// Environment variable that overrides [`AppConfig::store_path`].
const STORE_PATH_ENV: &str = "SIMON_STORE_PATH";
/// Path of the relay endpoint on the server.
const RELAY_PATH: &str = "ws";

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the backend serving `/api/score` and `/ws`.
    #[validate(length(min = 1))]
    pub server_url: String,
    /// JSON file backing the local key/value slots; `None` keeps them in memory.
    pub store_path: Option<PathBuf>,
    /// Game elements in display order.
    #[validate(length(min = 1), nested)]
    pub elements: Vec<ElementConfig>,
    /// Tone played when the participant makes a mistake.
    pub mistake_tone: String,
    /// Playback and network timing.
    #[validate(nested)]
    pub timing: TimingConfig,
}

/// One configured game element.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ElementConfig {
    /// Identifier used by the input source and the display.
    #[validate(length(min = 1))]
    pub id: String,
    /// Sound asset bound to the element.
    #[validate(length(min = 1))]
    pub tone: String,
}

/// Timing contract of the playback controller and the score submission bound.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(default)]
pub struct TimingConfig {
    /// Bright hold of a presentation or participant press.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "present_hold_ms")]
    pub present_hold: Duration,
    /// Bright hold of one step of the attention/mistake animation.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "dance_hold_ms")]
    pub dance_hold: Duration,
    /// Dim settle after every press.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "settle_ms")]
    pub settle: Duration,
    /// Pause before the first presentation of a session.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "start_lead_in_ms")]
    pub start_lead_in: Duration,
    /// Pause before re-presenting after a completed round.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "round_lead_in_ms")]
    pub round_lead_in: Duration,
    /// Upper bound on a remote score submission.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "submit_timeout_ms")]
    pub submit_timeout: Duration,
    /// Laps of the attention animation when a session starts.
    #[validate(range(min = 1, max = 20))]
    pub start_laps: u32,
    /// Laps of the mistake animation.
    #[validate(range(min = 1, max = 20))]
    pub mistake_laps: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            present_hold: Duration::from_millis(500),
            dance_hold: Duration::from_millis(100),
            settle: Duration::from_millis(100),
            start_lead_in: Duration::from_millis(1000),
            round_lead_in: Duration::from_millis(500),
            submit_timeout: Duration::from_secs(5),
            start_laps: 1,
            mistake_laps: 5,
        }
    }
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults,
    /// then apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        elements = config.elements.len(),
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.apply_env_overrides();
        config
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = env::var(SERVER_URL_ENV).ok().filter(|v| !v.trim().is_empty()) {
            info!(server_url = %url, "server URL overridden from environment");
            self.server_url = url;
        }
        if let Some(path) = env::var_os(STORE_PATH_ENV).filter(|v| !v.is_empty()) {
            self.store_path = Some(PathBuf::from(path));
        }
    }

    /// Build the element registry from the configured elements.
    pub fn registry(&self) -> ElementRegistry {
        ElementRegistry::new(
            self.elements
                .iter()
                .map(|element| Element::new(element.id.as_str(), Tone::new(&element.tone))),
        )
    }

    /// Tone played on a mistake.
    pub fn mistake_tone(&self) -> Tone {
        Tone::new(&self.mistake_tone)
    }

    /// WebSocket URL of the peer relay derived from [`AppConfig::server_url`].
    pub fn relay_url(&self) -> String {
        relay_url(&self.server_url)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:4000".into(),
            store_path: Some(PathBuf::from("simon-store.json")),
            elements: default_elements(),
            mistake_tone: "error.mp3".into(),
            timing: TimingConfig::default(),
        }
    }
}

/// Reasons a configuration document is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Document is not valid JSON for [`AppConfig`].
    #[error("invalid configuration JSON")]
    Parse(#[from] serde_json::Error),
    /// Document parsed but violates a constraint.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Map an HTTP(S) base URL to the relay WebSocket URL (`http` to `ws`, `https` to `wss`).
pub fn relay_url(server_url: &str) -> String {
    let base = server_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{base}/{RELAY_PATH}")
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in four-button set.
fn default_elements() -> Vec<ElementConfig> {
    [
        ("green", "sound1.mp3"),
        ("red", "sound2.mp3"),
        ("yellow", "sound3.mp3"),
        ("blue", "sound4.mp3"),
    ]
    .into_iter()
    .map(|(id, tone)| ElementConfig {
        id: id.into(),
        tone: tone.into(),
    })
    .collect()
}
