use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Backend address used when `RAGPANEL_API_URL` is not provided.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
/// Retrieval depth used for questions when `RAGPANEL_TOP_K` is not provided.
pub const DEFAULT_TOP_K: u32 = 4;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the AI microservices backend.
    pub api_url: String,
    /// Number of retrieved chunks requested for each question.
    pub top_k: u32,
    /// Optional per-request timeout applied by the HTTP client.
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            top_k: DEFAULT_TOP_K,
            request_timeout: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(load_env_optional)
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values count as unset, matching how `.env` files commonly leave keys empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = lookup("RAGPANEL_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue("RAGPANEL_API_URL".into()));
        }

        let top_k = lookup("RAGPANEL_TOP_K")
            .map(|value| {
                value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|top_k| *top_k > 0)
                    .ok_or_else(|| ConfigError::InvalidValue("RAGPANEL_TOP_K".into()))
            })
            .transpose()?
            .unwrap_or(DEFAULT_TOP_K);

        let request_timeout = lookup("RAGPANEL_TIMEOUT_SECS")
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| ConfigError::InvalidValue("RAGPANEL_TIMEOUT_SECS".into()))
            })
            .transpose()?;

        Ok(Self {
            api_url,
            top_k,
            request_timeout,
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok()
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// `apply_overrides` may adjust the loaded values (e.g. from CLI flags) before they are cached.
/// Returns the cached configuration; a second call keeps the first value.
pub fn init_config<F>(apply_overrides: F) -> Result<&'static Config, ConfigError>
where
    F: FnOnce(&mut Config),
{
    dotenvy::dotenv().ok();
    let mut config = Config::from_env()?;
    apply_overrides(&mut config);
    tracing::debug!(
        api_url = %config.api_url,
        top_k = config.top_k,
        timeout = ?config.request_timeout,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).expect("config");
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
        assert_eq!(config.top_k, 4);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("RAGPANEL_API_URL", "https://rag.internal:9000"),
            ("RAGPANEL_TOP_K", "8"),
            ("RAGPANEL_TIMEOUT_SECS", "30"),
        ]))
        .expect("config");
        assert_eq!(config.api_url, "https://rag.internal:9000");
        assert_eq!(config.top_k, 8);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("RAGPANEL_API_URL", "   "),
            ("RAGPANEL_TOP_K", ""),
        ]))
        .expect("config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn rejects_zero_top_k() {
        let error = Config::from_lookup(lookup_from(&[("RAGPANEL_TOP_K", "0")]))
            .expect_err("zero top_k");
        assert_eq!(error, ConfigError::InvalidValue("RAGPANEL_TOP_K".into()));
    }

    #[test]
    fn rejects_non_http_url() {
        let error = Config::from_lookup(lookup_from(&[("RAGPANEL_API_URL", "ftp://host")]))
            .expect_err("bad scheme");
        assert_eq!(error, ConfigError::InvalidValue("RAGPANEL_API_URL".into()));
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn init_config_logs_loaded_values_to_installed_subscriber() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let config = tracing::subscriber::with_default(subscriber, || {
            init_config(|config| config.top_k = 9).expect("config")
        });

        assert!(config.top_k > 0);
        let output = String::from_utf8(logs.0.lock().expect("log buffer").clone()).expect("utf8");
        assert!(output.contains("Loaded configuration"), "logs were: {output}");
        assert!(output.contains("top_k=9"), "logs were: {output}");
    }

    #[test]
    fn rejects_unparseable_timeout() {
        let error = Config::from_lookup(lookup_from(&[("RAGPANEL_TIMEOUT_SECS", "soon")]))
            .expect_err("bad timeout");
        assert_eq!(error, ConfigError::InvalidValue("RAGPANEL_TIMEOUT_SECS".into()));
    }
}
