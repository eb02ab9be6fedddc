use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "HARMS";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DATABASE_FILE: &str = "harms.db";

/// Get the application data directory
/// ~/HARMS/ on all platforms, or ./HARMS when no home directory is known
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default database location inside the data directory
pub fn default_db_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

/// Log filter used when neither `HARMS_LOG` nor `RUST_LOG` is set
pub fn default_log_filter() -> String {
    "info,harms_lib=debug,tower_http=info".to_string()
}

/// Runtime settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub log_filter: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid HARMS_BIND_ADDR {value:?}: {reason}")]
    InvalidBindAddr { value: String, reason: String },
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_addr = get("HARMS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidBindAddr {
                value: raw_addr.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            bind_addr,
            db_path: get("HARMS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            log_filter: get("HARMS_LOG")
                .or_else(|| get("RUST_LOG"))
                .unwrap_or_else(default_log_filter),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("HARMS"));
        assert!(default_db_path().ends_with("HARMS/harms.db"));
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.db_path, default_db_path());
        assert_eq!(settings.log_filter, default_log_filter());
    }

    #[test]
    fn env_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("HARMS_BIND_ADDR", "0.0.0.0:9090"),
            ("HARMS_DB_PATH", "/tmp/harms-test.db"),
            ("HARMS_LOG", "warn"),
        ]))
        .unwrap();
        assert_eq!(settings.bind_addr.port(), 9090);
        assert_eq!(settings.db_path, PathBuf::from("/tmp/harms-test.db"));
        assert_eq!(settings.log_filter, "warn");
    }

    #[test]
    fn blank_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[("HARMS_DB_PATH", "  ")])).unwrap();
        assert_eq!(settings.db_path, default_db_path());
    }

    #[test]
    fn bad_bind_addr_is_error() {
        let err = Settings::from_lookup(lookup(&[("HARMS_BIND_ADDR", "nowhere")])).unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
