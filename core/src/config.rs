//! Client configuration read from the environment.

use crate::error::ConfigError;
use crate::filter::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const API_URL_VAR: &str = "TASKDECK_API_URL";
pub const PAGE_SIZE_VAR: &str = "TASKDECK_PAGE_SIZE";
pub const DISCARD_STALE_VAR: &str = "TASKDECK_DISCARD_STALE";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    /// Initial `limit` of the todo listing.
    pub page_size: u32,
    /// Drop responses that arrive after a newer one for the same record.
    pub discard_stale_responses: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            discard_stale_responses: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(url) = lookup(API_URL_VAR) {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: API_URL_VAR,
                    value: url.to_string(),
                });
            }
            config.base_url = url.to_string();
        }

        if let Some(raw) = lookup(PAGE_SIZE_VAR) {
            config.page_size = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
                .ok_or(ConfigError::InvalidValue {
                    key: PAGE_SIZE_VAR,
                    value: raw.clone(),
                })?;
        }

        if let Some(raw) = lookup(DISCARD_STALE_VAR) {
            config.discard_stale_responses = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: DISCARD_STALE_VAR,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }
}
