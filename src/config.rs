//! Runtime configuration from environment variables.
//!
//! # Variables
//!
//! Required: `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, `REDDIT_USERNAME`,
//! `REDDIT_PASSWORD`, `REDDIT_USER_AGENT`.
//!
//! Optional:
//!
//! - `NOTIFIER_SUBREDDITS`: `+`-joined subreddits to watch (default `tipofmytongue+notifierbottest`)
//! - `NOTIFIER_OPERATOR`: account receiving forwarded messages (default `adityapstar`)
//! - `NOTIFIER_STORE_DIR`: directory for the JSON store; unset keeps state in memory
//! - `NOTIFIER_POLL_INTERVAL_SECS`: sleep between polls (default 15)
//! - `NOTIFIER_THREAD_ID_LEN`: subject characters kept as the thread id (default 7)
//! - `NOTIFIER_LISTEN_ADDR`: inspection server address (default `0.0.0.0:3000`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::commands::DEFAULT_ID_LEN;
use crate::reddit::Credentials;
use crate::worker::{DEFAULT_POLL_INTERVAL_SECS, PollConfig};

const DEFAULT_SUBREDDITS: &str = "tipofmytongue+notifierbottest";
const DEFAULT_OPERATOR: &str = "adityapstar";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Errors from reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub subreddits: String,
    pub operator: String,
    /// `None` runs on the in-memory store.
    pub store_dir: Option<PathBuf>,
    pub poll_interval: Duration,
    pub id_len: usize,
    pub listen_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let credentials = Credentials {
            client_id: required("REDDIT_CLIENT_ID")?,
            client_secret: required("REDDIT_CLIENT_SECRET")?,
            username: required("REDDIT_USERNAME")?,
            password: required("REDDIT_PASSWORD")?,
            user_agent: required("REDDIT_USER_AGENT")?,
        };

        let poll_secs: u64 = parse_or(
            "NOTIFIER_POLL_INTERVAL_SECS",
            get("NOTIFIER_POLL_INTERVAL_SECS"),
            DEFAULT_POLL_INTERVAL_SECS,
        )?;
        if poll_secs == 0 {
            return Err(invalid("NOTIFIER_POLL_INTERVAL_SECS", "0", "must be positive"));
        }

        let id_len: usize = parse_or(
            "NOTIFIER_THREAD_ID_LEN",
            get("NOTIFIER_THREAD_ID_LEN"),
            DEFAULT_ID_LEN,
        )?;
        if id_len == 0 {
            return Err(invalid("NOTIFIER_THREAD_ID_LEN", "0", "must be positive"));
        }

        let listen_raw = get("NOTIFIER_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw
            .parse()
            .map_err(|e: std::net::AddrParseError| {
                invalid("NOTIFIER_LISTEN_ADDR", &listen_raw, &e.to_string())
            })?;

        Ok(Config {
            credentials,
            subreddits: get("NOTIFIER_SUBREDDITS").unwrap_or_else(|| DEFAULT_SUBREDDITS.to_string()),
            operator: get("NOTIFIER_OPERATOR").unwrap_or_else(|| DEFAULT_OPERATOR.to_string()),
            store_dir: get("NOTIFIER_STORE_DIR").map(PathBuf::from),
            poll_interval: Duration::from_secs(poll_secs),
            id_len,
            listen_addr,
        })
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig::new().with_poll_interval(self.poll_interval)
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, &raw, &e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let mut vars: HashMap<String, String> = [
            ("REDDIT_CLIENT_ID", "id"),
            ("REDDIT_CLIENT_SECRET", "secret"),
            ("REDDIT_USERNAME", "notifier-bot"),
            ("REDDIT_PASSWORD", "hunter2"),
            ("REDDIT_USER_AGENT", "solved-notifier/0.1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in pairs {
            vars.insert(k.to_string(), v.to_string());
        }
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(env(&[])).unwrap();

        assert_eq!(config.credentials.username, "notifier-bot");
        assert_eq!(config.subreddits, "tipofmytongue+notifierbottest");
        assert_eq!(config.operator, "adityapstar");
        assert_eq!(config.store_dir, None);
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.id_len, 7);
        assert_eq!(config.listen_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.poll_config().poll_interval, Duration::from_secs(15));
    }

    #[test]
    fn overrides_apply() {
        let config = Config::from_lookup(env(&[
            ("NOTIFIER_SUBREDDITS", "tipofmytongue"),
            ("NOTIFIER_OPERATOR", "someone"),
            ("NOTIFIER_STORE_DIR", "/var/lib/notifier"),
            ("NOTIFIER_POLL_INTERVAL_SECS", "30"),
            ("NOTIFIER_THREAD_ID_LEN", "6"),
            ("NOTIFIER_LISTEN_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();

        assert_eq!(config.subreddits, "tipofmytongue");
        assert_eq!(config.operator, "someone");
        assert_eq!(config.store_dir, Some(PathBuf::from("/var/lib/notifier")));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.id_len, 6);
        assert_eq!(config.listen_addr.port(), 8080);
    }

    #[test]
    fn missing_credential_is_reported_by_name() {
        let err = Config::from_lookup(env(&[("REDDIT_PASSWORD", "")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("REDDIT_PASSWORD"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = Config::from_lookup(env(&[("NOTIFIER_POLL_INTERVAL_SECS", "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "NOTIFIER_POLL_INTERVAL_SECS",
                ..
            }
        ));

        let err = Config::from_lookup(env(&[("NOTIFIER_THREAD_ID_LEN", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "NOTIFIER_THREAD_ID_LEN",
                ..
            }
        ));
    }

    #[test]
    fn malformed_address_is_rejected() {
        let err = Config::from_lookup(env(&[("NOTIFIER_LISTEN_ADDR", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "NOTIFIER_LISTEN_ADDR", .. }));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = Config::from_lookup(env(&[])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("\"secret\""));
    }
}
