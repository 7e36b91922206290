use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Backend address used when `DOCRAG_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Request timeout used when `DOCRAG_REQUEST_TIMEOUT_SECS` is not set.
///
/// Bulk ingestion runs the whole directory inside one request, so this is generous.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docrag client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the document-processing backend.
    pub api_url: String,
    /// Timeout applied to every HTTP request sent to the backend.
    pub request_timeout: Duration,
    /// Optional path that receives a copy of the log output.
    pub log_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let load = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = load("DOCRAG_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());
        reqwest::Url::parse(&api_url)
            .map_err(|_| ConfigError::InvalidValue("DOCRAG_API_URL".into()))?;

        let timeout_secs = load("DOCRAG_REQUEST_TIMEOUT_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| ConfigError::InvalidValue("DOCRAG_REQUEST_TIMEOUT_SECS".into()))
            })
            .transpose()?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            api_url,
            request_timeout: Duration::from_secs(timeout_secs),
            log_file: load("DOCRAG_LOG_FILE"),
        })
    }

    /// Default configuration pointed at a specific backend URL.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_file: None,
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment (and `.env`) and install it in the process cache.
///
/// Later calls return the cached value without re-reading the environment.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_local_backend() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(config.log_file.is_none());
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn reads_overrides_and_ignores_blank_values() {
        let config = Config::from_lookup(lookup(&[
            ("DOCRAG_API_URL", "http://rag.internal:8080"),
            ("DOCRAG_REQUEST_TIMEOUT_SECS", "45"),
            ("DOCRAG_LOG_FILE", "  "),
        ]))
        .expect("valid config");
        assert_eq!(config.api_url, "http://rag.internal:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(45));
        assert!(config.log_file.is_none());
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let error = Config::from_lookup(lookup(&[("DOCRAG_REQUEST_TIMEOUT_SECS", "0")]))
            .expect_err("zero timeout");
        assert!(
            matches!(&error, ConfigError::InvalidValue(var) if var == "DOCRAG_REQUEST_TIMEOUT_SECS")
        );

        let error = Config::from_lookup(lookup(&[("DOCRAG_API_URL", "not a url")]))
            .expect_err("bad url");
        assert!(matches!(&error, ConfigError::InvalidValue(var) if var == "DOCRAG_API_URL"));
    }

    #[test]
    fn with_api_url_keeps_other_defaults() {
        let config = Config::with_api_url("http://10.0.0.5:9000");
        assert_eq!(config.api_url, "http://10.0.0.5:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(300));
    }
}
