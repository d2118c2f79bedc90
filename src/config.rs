use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://api.nasa.gov/mars-photos/api/v1";
pub const DEFAULT_API_KEY: &str = "DEMO_KEY";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SEARCH_RADIUS_DAYS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("Could not find home directory; set MARS_DATA_DIR")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub request_timeout: Duration,
    pub search_radius_days: u32,
    pub data_dir: PathBuf,
}

impl Config {
    /// Defaults overridden by `MARS_*` variables. A `.env` file in the
    /// working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = match lookup("MARS_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs_next::home_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join(".mars_rover_story"),
        };

        let timeout_secs = parse_number(
            "MARS_REQUEST_TIMEOUT_SECS",
            lookup("MARS_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let search_radius_days = parse_number(
            "MARS_SEARCH_RADIUS_DAYS",
            lookup("MARS_SEARCH_RADIUS_DAYS"),
            DEFAULT_SEARCH_RADIUS_DAYS,
        )?;

        Ok(Self {
            api_base_url: lookup("MARS_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            api_key: lookup("MARS_API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            search_radius_days,
            data_dir,
        })
    }

    /// Configuration pointing at an arbitrary base URL, used by tests that
    /// stand up a local mock server.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            api_key: DEFAULT_API_KEY.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            search_radius_days: DEFAULT_SEARCH_RADIUS_DAYS,
            data_dir: std::env::temp_dir().join("mars_rover_story"),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("story.db")
    }
}

fn parse_number<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}
