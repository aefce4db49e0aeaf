use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use indradhanu_dashboard::WeatherSettings;
use indradhanu_simulationengine::GeminiSettings;
use serde::Deserialize;

/// Why a configuration could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File unreadable.
    #[error("reading config {path}: {source}")]
    Read {
        /// File attempted.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// Not valid TOML for [`ServerConfig`].
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Parsed but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete server configuration. Every field has a default, so an empty
/// document is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener and CORS.
    pub server: ServerSection,
    /// Generative model.
    pub model: ModelSection,
    /// Weather upstream.
    pub weather: WeatherSection,
    /// Structured logs and events.
    pub telemetry: TelemetrySection,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Socket address to listen on.
    pub bind: String,
    /// Allowed CORS origins; `*` allows any.
    pub allow_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
            allow_origins: vec!["*".into()],
        }
    }
}

/// `[model]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// API base URL.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// Calls per simulation request.
    pub max_attempts: usize,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.5-flash-lite".into(),
            max_attempts: 2,
            timeout_ms: 30_000,
            api_key_env: "GEMINI_API_KEY".into(),
        }
    }
}

/// `[weather]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherSection {
    /// API base URL.
    pub endpoint: String,
    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for WeatherSection {
    fn default() -> Self {
        Self {
            endpoint: indradhanu_dashboard::weather::DEFAULT_WEATHER_ENDPOINT.into(),
            timeout_ms: 5_000,
            api_key_env: "OPENWEATHER_API_KEY".into(),
        }
    }
}

/// `[telemetry]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelemetrySection {
    /// JSON-lines log file.
    pub log_path: Option<PathBuf>,
    /// JSON-lines event file.
    pub event_log: Option<PathBuf>,
}

impl ServerConfig {
    /// Loads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.max_attempts == 0 {
            return Err(ConfigError::Invalid("model.max_attempts must be >= 1".into()));
        }
        if self.model.timeout_ms == 0 || self.weather.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeouts must be > 0".into()));
        }
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model.model must not be empty".into()));
        }
        self.bind_addr().map(|_| ())
    }

    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|err| ConfigError::Invalid(format!("server.bind '{}': {err}", self.server.bind)))
    }

    /// Gemini settings when `lookup` yields a non-blank key for
    /// `model.api_key_env`.
    pub fn gemini_settings<F>(&self, lookup: F) -> Option<GeminiSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(&self.model.api_key_env).filter(|key| !key.trim().is_empty())?;
        Some(GeminiSettings {
            endpoint: self.model.endpoint.clone(),
            model: self.model.model.clone(),
            api_key,
            timeout: Duration::from_millis(self.model.timeout_ms),
        })
    }

    /// Weather settings, keyed when `lookup` finds `weather.api_key_env`.
    pub fn weather_settings<F>(&self, lookup: F) -> WeatherSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = WeatherSettings::new(lookup(&self.weather.api_key_env));
        settings.endpoint.clone_from(&self.weather.endpoint);
        settings.timeout = Duration::from_millis(self.weather.timeout_ms);
        settings
    }
}

/// Reads a variable from the process environment.
#[must_use]
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
