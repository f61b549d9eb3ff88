//! Environment configuration and logging setup for the mock server.

use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            log_level: "info".into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`, or `default_level` when
/// that is unset. Does nothing if a subscriber is already installed.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.addr(), "127.0.0.1:3000");
    }

    #[test]
    fn reads_overrides_and_ignores_bad_port() {
        let config = Config::from_lookup(|key| match key {
            "HOST" => Some("0.0.0.0".to_string()),
            "PORT" => Some("not-a-port".to_string()),
            "LOG_LEVEL" => Some("debug".to_string()),
            _ => None,
        });
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.log_level, "debug");
    }
}
