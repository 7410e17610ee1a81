use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "http://translate.google.com/translate_a/t";
pub const DEFAULT_USER_AGENT: &str =
    "Opera/9.80 (Windows NT 6.2; WOW64) Presto/2.12.388 Version/12.15";
pub const DEFAULT_REFERER: &str = "http://translate.google.com/";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_source_lang() -> String {
    "ja".to_string()
}

fn default_target_lang() -> String {
    "en".to_string()
}

fn default_ui_lang() -> String {
    "ja".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_referer() -> String {
    DEFAULT_REFERER.to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_cache_capacity() -> usize {
    128
}

/// What a committed completion writes back into the buffer.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommitText {
    /// Insert the entry's source phrase; the translation is only a description.
    #[default]
    Source,
    /// Replace the token with the translated text.
    Target,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TranslatorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_source_lang", alias = "sl")]
    pub source_lang: String,

    #[serde(default = "default_target_lang", alias = "tl")]
    pub target_lang: String,

    #[serde(default = "default_ui_lang", alias = "hl")]
    pub ui_lang: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_referer")]
    pub referer: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default)]
    pub commit_text: CommitText,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            source_lang: default_source_lang(),
            target_lang: default_target_lang(),
            ui_lang: default_ui_lang(),
            user_agent: default_user_agent(),
            referer: default_referer(),
            timeout_ms: default_timeout_ms(),
            cache_capacity: default_cache_capacity(),
            commit_text: CommitText::default(),
        }
    }
}

impl TranslatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.endpoint.trim()).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.endpoint_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        for (name, value) in [
            ("source_lang", &self.source_lang),
            ("target_lang", &self.target_lang),
            ("ui_lang", &self.ui_lang),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField(name));
            }
        }

        Ok(())
    }
}
