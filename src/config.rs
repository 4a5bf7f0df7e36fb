use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::summary::DEFAULT_MAX_CHARS;

/// Everything the adapters, geocoder and LLM callers need, resolved once at
/// startup and passed into their constructors.
///
/// Sources, lowest precedence first: built-in defaults, `investigator.toml`
/// in the working directory (or an explicit path), then environment variables
/// named after the field (`OPEN_DATA_APP_TOKEN`, `ANTHROPIC_API_KEY`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub open_data_base_url:     String,
    pub open_data_app_token:    Option<String>,

    pub geocoder_base_url:      String,
    pub geocoder_user_agent:    String,
    pub geocoder_max_attempts:  u32,
    pub geocoder_retry_delay_ms: u64,

    pub request_timeout_secs:   u64,
    pub max_summary_chars:      usize,

    pub anthropic_api_key:      Option<String>,
    pub anthropic_base_url:     String,
    pub anthropic_model:        String,

    pub ollama_base_url:        String,
    pub ollama_model:           String,

    pub max_steps:              usize,
    pub llm_max_retries:        u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            open_data_base_url:      "https://data.cityofchicago.org".to_string(),
            open_data_app_token:     None,
            geocoder_base_url:       "https://nominatim.openstreetmap.org".to_string(),
            geocoder_user_agent:     "chicago_location_investigator".to_string(),
            geocoder_max_attempts:   3,
            geocoder_retry_delay_ms: 4_000,
            request_timeout_secs:    30,
            max_summary_chars:       DEFAULT_MAX_CHARS,
            anthropic_api_key:       None,
            anthropic_base_url:      "https://api.anthropic.com".to_string(),
            anthropic_model:         "claude-haiku-4-5".to_string(),
            ollama_base_url:         "http://localhost:11434/v1".to_string(),
            ollama_model:            "llama3.1".to_string(),
            max_steps:               15,
            llm_max_retries:         3,
        }
    }
}

impl Settings {
    /// Loads settings from defaults, an optional TOML file and the environment.
    ///
    /// Without `path`, `investigator.toml` is read if present. An explicit
    /// `path` must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None    => File::with_name("investigator").required(false),
        };
        Self::defaults()?
            .add_source(file)
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
    }

    /// Loads from an explicit file only, ignoring the process environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let d = Settings::default();
        Config::builder()
            .set_default("open_data_base_url", d.open_data_base_url)?
            .set_default("geocoder_base_url", d.geocoder_base_url)?
            .set_default("geocoder_user_agent", d.geocoder_user_agent)?
            .set_default("geocoder_max_attempts", d.geocoder_max_attempts as i64)?
            .set_default("geocoder_retry_delay_ms", d.geocoder_retry_delay_ms as i64)?
            .set_default("request_timeout_secs", d.request_timeout_secs as i64)?
            .set_default("max_summary_chars", d.max_summary_chars as i64)?
            .set_default("anthropic_base_url", d.anthropic_base_url)?
            .set_default("anthropic_model", d.anthropic_model)?
            .set_default("ollama_base_url", d.ollama_base_url)?
            .set_default("ollama_model", d.ollama_model)?
            .set_default("max_steps", d.max_steps as i64)?
            .set_default("llm_max_retries", d.llm_max_retries as i64)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn geocoder_retry_delay(&self) -> Duration {
        Duration::from_millis(self.geocoder_retry_delay_ms)
    }
}
