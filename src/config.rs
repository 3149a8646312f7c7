use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{AppError, Result};

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub uid: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub debug: bool,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

// Manual Debug impl to avoid leaking the session token
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("token", &"[REDACTED]")
            .field("uid", &self.uid)
            .field("debug", &self.debug)
            .field("api", &self.api)
            .field("pacing", &self.pacing)
            .field("notify", &self.notify)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Bounds of the random pause inserted between remote calls.
#[derive(Debug, Deserialize, Clone)]
pub struct PacingConfig {
    #[serde(default = "default_jitter_min")]
    pub jitter_min_secs: f64,
    #[serde(default = "default_jitter_max")]
    pub jitter_max_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            jitter_min_secs: default_jitter_min(),
            jitter_max_secs: default_jitter_max(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    pub url: Option<String>,
    #[serde(default = "default_notify_title")]
    pub title: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            url: None,
            title: default_notify_title(),
        }
    }
}

/// Upper bound of either jitter setting, in seconds.
pub const MAX_JITTER_SECS: f64 = 600.0;

/// Prefix of the environment variables carrying nested settings, as in
/// `KUROBBS_NOTIFY__URL`.
pub const ENV_PREFIX: &str = "KUROBBS";

/// Settings read from bare environment variables of the same name.
const FLAT_ENV_KEYS: [&str; 3] = ["TOKEN", "UID", "DEBUG"];

/// Truthiness of a flag given as a boolean, a number or free text. Blank
/// text and the usual negative words are false, anything else is true.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
        Flag::Float(f) => f != 0.0,
        Flag::Text(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off" | "n" | "f"
        ),
    })
}

fn default_base_url() -> String {
    "https://api.kurobbs.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_jitter_min() -> f64 {
    1.0
}

fn default_jitter_max() -> f64 {
    2.0
}

fn default_notify_title() -> String {
    "Kurobbs check-in".to_string()
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_from(config_path, None)
    }

    /// Load configuration, reading environment overrides from `env` instead
    /// of the process environment when given.
    pub fn load_from(
        config_path: Option<&str>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("kurobbs").required(false));
        }

        let lookup = |key: &str| match &env {
            Some(map) => map.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        for key in FLAT_ENV_KEYS {
            builder = builder.set_override_option(key.to_lowercase(), lookup(key))?;
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config("TOKEN is required".to_string()));
        }
        if self.uid.trim().is_empty() {
            return Err(AppError::Config("UID is required".to_string()));
        }
        if !self.uid.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Config(format!(
                "UID must be numeric, got {:?}",
                self.uid
            )));
        }
        if !self.pacing.jitter_min_secs.is_finite()
            || !self.pacing.jitter_max_secs.is_finite()
            || self.pacing.jitter_min_secs < 0.0
            || self.pacing.jitter_max_secs < self.pacing.jitter_min_secs
            || self.pacing.jitter_max_secs > MAX_JITTER_SECS
        {
            return Err(AppError::Config(format!(
                "Invalid jitter range [{}, {}]",
                self.pacing.jitter_min_secs, self.pacing.jitter_max_secs
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
