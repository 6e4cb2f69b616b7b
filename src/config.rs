//! Runtime configuration. Built once at startup from the environment (and an optional `.env`
//! file) and handed to the components that need it.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::utils::dir::install_dir;

pub const STORE_DIR_VAR: &str = "DAYNOTE_STORE_DIR";
pub const OUTPUT_DIR_VAR: &str = "DAYNOTE_OUTPUT_DIR";
pub const POLL_INTERVAL_VAR: &str = "POLL_INTERVAL_SECONDS";
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const MODEL_VAR: &str = "DAYNOTE_MODEL";
pub const API_BASE_VAR: &str = "DAYNOTE_API_BASE";
pub const TIMEOUT_VAR: &str = "DAYNOTE_SUMMARY_TIMEOUT_SECONDS";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct Config {
    /// Directory holding the activity partitions.
    pub store_dir: PathBuf,
    /// Directory daily notes and raw transcripts are written to.
    pub output_dir: PathBuf,
    pub poll_interval: Duration,
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("store_dir", &self.store_dir)
            .field("output_dir", &self.output_dir)
            .field("poll_interval", &self.poll_interval)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Reads `.env` (if there is one) and then the process environment.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {path:?}"),
            Err(e) if e.not_found() => (),
            Err(e) => warn!("Couldn't load .env file {e}"),
        }
        Self::from_lookup(|name| std::env::var(name).ok(), &install_dir()?)
    }

    /// Builds the configuration from an arbitrary variable source. `install_dir` anchors the
    /// default store and output locations.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, install_dir: &Path) -> Result<Self> {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let store_dir = lookup(STORE_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| install_dir.join("activity"));

        let output_dir = lookup(OUTPUT_DIR_VAR).map(PathBuf::from).unwrap_or_else(|| {
            install_dir
                .parent()
                .unwrap_or(install_dir)
                .to_path_buf()
        });

        let poll_interval = match lookup(POLL_INTERVAL_VAR) {
            Some(v) => parse_seconds(POLL_INTERVAL_VAR, &v)?,
            None => DEFAULT_POLL_INTERVAL,
        };

        let request_timeout = match lookup(TIMEOUT_VAR) {
            Some(v) => parse_seconds(TIMEOUT_VAR, &v)?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            store_dir,
            output_dir,
            poll_interval,
            api_key: lookup(API_KEY_VAR),
            model: lookup(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.into()),
            api_base: lookup(API_BASE_VAR)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.into()),
            request_timeout,
        })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.store_dir.join("logs")
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<Duration> {
    let seconds = value
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{name} must be a whole number of seconds, got {value:?}"))?;
    if seconds == 0 {
        bail!("{name} must be greater than 0");
    }
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned(), Path::new("/opt/daynote/bin"))
    }

    #[test]
    fn defaults_are_relative_to_install_dir() -> Result<()> {
        let config = config_from(&[])?;
        assert_eq!(config.store_dir, PathBuf::from("/opt/daynote/bin/activity"));
        assert_eq!(config.output_dir, PathBuf::from("/opt/daynote"));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        Ok(())
    }

    #[test]
    fn values_from_environment_win() -> Result<()> {
        let config = config_from(&[
            (STORE_DIR_VAR, "/data/store"),
            (OUTPUT_DIR_VAR, "/data/notes"),
            (POLL_INTERVAL_VAR, "15"),
            (API_KEY_VAR, "secret"),
            (API_BASE_VAR, "http://localhost:8080/"),
        ])?;
        assert_eq!(config.store_dir, PathBuf::from("/data/store"));
        assert_eq!(config.output_dir, PathBuf::from("/data/notes"));
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.api_base, "http://localhost:8080");
        Ok(())
    }

    #[test]
    fn empty_api_key_counts_as_missing() -> Result<()> {
        let config = config_from(&[(API_KEY_VAR, "  ")])?;
        assert_eq!(config.api_key, None);
        Ok(())
    }

    #[test]
    fn bad_poll_interval_is_rejected() {
        assert!(config_from(&[(POLL_INTERVAL_VAR, "soon")]).is_err());
        assert!(config_from(&[(POLL_INTERVAL_VAR, "0")]).is_err());
    }

    #[test]
    fn debug_output_hides_api_key() -> Result<()> {
        let config = config_from(&[(API_KEY_VAR, "secret")])?;
        assert!(!format!("{config:?}").contains("secret"));
        Ok(())
    }
}
