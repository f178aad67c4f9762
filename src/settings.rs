//! Per-invocation settings: defaults, then the config file, then `CALREF_*`
//! environment variables.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use calref_core::constants::{DEFAULT_CUSTOMER_ID, DEFAULT_REFERENCE_CONCURRENCY, DEFAULT_TIMEZONE};
use calref_core::window::parse_timezone;
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";
const DEFAULT_TOKEN_CACHE_PATH: &str = "~/.credentials/calref_token.json";
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// IANA zone for bare `YYYY-MM-DD` dates.
    pub timezone: String,
    /// OAuth client JSON downloaded from the cloud console.
    pub credentials_path: String,
    pub token_cache_path: String,
    pub auth_timeout_secs: u64,
    pub reference_concurrency: usize,
    pub customer_id: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let config_file = dirs::config_dir().map(|d| d.join("calref").join("config.toml"));
        Self::build(config_file, std::env::vars().collect())
    }

    fn build(config_file: Option<PathBuf>, env: HashMap<String, String>) -> Result<Self> {
        let default_timezone = env
            .get("TZ")
            .filter(|tz| !tz.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

        let mut builder = Config::builder()
            .set_default("timezone", default_timezone)?
            .set_default("credentials_path", DEFAULT_CREDENTIALS_PATH)?
            .set_default("token_cache_path", DEFAULT_TOKEN_CACHE_PATH)?
            .set_default("auth_timeout_secs", DEFAULT_AUTH_TIMEOUT_SECS as i64)?
            .set_default("reference_concurrency", DEFAULT_REFERENCE_CONCURRENCY as i64)?
            .set_default("customer_id", DEFAULT_CUSTOMER_ID)?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let credentials_override = env
            .get("CALREF_OAUTH_CREDENTIALS_JSON")
            .filter(|p| !p.is_empty())
            .cloned();

        builder
            .add_source(
                Environment::with_prefix("CALREF")
                    .try_parsing(true)
                    .source(Some(env)),
            )
            .set_override_option("credentials_path", credentials_override)?
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn timezone(&self) -> Tz {
        let fallback = DEFAULT_TIMEZONE.parse().unwrap_or(chrono_tz::Asia::Tokyo);
        parse_timezone(&self.timezone, fallback)
    }

    pub fn credentials_path(&self) -> PathBuf {
        expand(&self.credentials_path)
    }

    pub fn token_cache_path(&self) -> PathBuf {
        expand(&self.token_cache_path)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
