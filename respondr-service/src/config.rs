use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_LOCATION: &str = "Miami";
const DEFAULT_ANALYZER_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 30;

/// Runtime settings for the HTTP host.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    /// Used when a request does not name a location.
    pub default_location: String,
    /// When absent the mock analyzer is used.
    pub openrouter_api_key: Option<String>,
    pub analyzer_model: String,
    pub analyzer_timeout: Duration,
    pub catalog_path: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid BIND_ADDR '{}'", bind_addr_raw))?;

        let analyzer_timeout = match get("ANALYZER_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .with_context(|| format!("invalid ANALYZER_TIMEOUT_SECS '{}'", raw))?;
                anyhow::ensure!(secs > 0, "ANALYZER_TIMEOUT_SECS must be positive");
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_ANALYZER_TIMEOUT_SECS),
        };

        Ok(Self {
            bind_addr,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            default_location: get("DEFAULT_LOCATION")
                .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            analyzer_model: get("ANALYZER_MODEL")
                .unwrap_or_else(|| DEFAULT_ANALYZER_MODEL.to_string()),
            analyzer_timeout,
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<ServiceConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert_eq!(config.default_location, "Miami");
        assert_eq!(config.analyzer_model, "openai/gpt-4o-mini");
        assert_eq!(config.analyzer_timeout, Duration::from_secs(30));
        assert!(config.openrouter_api_key.is_none());
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:9100"),
            ("DEFAULT_LOCATION", "Tampa"),
            ("OPENROUTER_API_KEY", "sk-test"),
            ("ANALYZER_TIMEOUT_SECS", "5"),
            ("CATALOG_PATH", "/tmp/services.json"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9100);
        assert_eq!(config.default_location, "Tampa");
        assert_eq!(config.openrouter_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.analyzer_timeout, Duration::from_secs(5));
        assert_eq!(config.catalog_path, Some(PathBuf::from("/tmp/services.json")));
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = config_from(&[("OPENROUTER_API_KEY", "  ")]).unwrap();
        assert!(config.openrouter_api_key.is_none());
    }

    #[test]
    fn test_invalid_values_fail() {
        let err = config_from(&[("ANALYZER_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("ANALYZER_TIMEOUT_SECS"));

        assert!(config_from(&[("ANALYZER_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("BIND_ADDR", "not-an-addr")]).is_err());
    }
}
