use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

const ENV_PREFIX: &str = "TIME";
const DEFAULT_BASE_URL: &str = "https://api-time.tinkoff.ru/api/v4";
const DEFAULT_OUTPUT: &str = "data/raw/debit_cards_dataset.csv";

/// Runtime settings, read from `TIME_*` environment variables.
///
/// `token` and `channel_id` are not validated here; an empty value surfaces
/// as an authorization error from the first feed request.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub token: String,
    pub channel_id: String,
    pub base_url: String,
    pub output: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("token", &if self.token.is_empty() { "<unset>" } else { "<redacted>" })
            .field("channel_id", &self.channel_id)
            .field("base_url", &self.base_url)
            .field("output", &self.output)
            .finish()
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_env(Environment::with_prefix(ENV_PREFIX))
    }

    fn from_env(env: Environment) -> Result<Self> {
        Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read TIME_* environment")?
            .try_deserialize()
            .context("Invalid TIME_* settings")
    }
}
