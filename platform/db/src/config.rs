use std::fmt;
use std::time::Duration;

use crate::{DbError, DbResult};

pub const URL_ENV: &str = "SUPABASE_URL";
pub const KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const INIT_TIMEOUT_ENV: &str = "HR_DB_INIT_TIMEOUT_MS";
pub const POLL_INTERVAL_ENV: &str = "HR_DB_POLL_INTERVAL_MS";
pub const REQUEST_TIMEOUT_ENV: &str = "HR_DB_REQUEST_TIMEOUT_MS";

const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long client initialization waits for the service to answer its
/// readiness probe, and how often it asks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for InitPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_INIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Connection settings for the hosted service. There are no built-in
/// credentials; both the endpoint and the key must be supplied.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub anon_key: String,
    pub request_timeout: Duration,
    pub init: InitPolicy,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("init", &self.init)
            .finish()
    }
}

impl DatabaseSettings {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            init: InitPolicy::default(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_init_policy(mut self, init: InitPolicy) -> Self {
        self.init = init;
        self
    }

    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, using the same keys as
    /// [`DatabaseSettings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let url = non_empty(lookup(URL_ENV)).ok_or(DbError::MissingUrl)?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(DbError::InvalidSetting {
                key: URL_ENV,
                value: url,
            });
        }
        let anon_key = non_empty(lookup(KEY_ENV)).ok_or(DbError::MissingKey)?;

        let init = InitPolicy {
            timeout: millis(&lookup, INIT_TIMEOUT_ENV, DEFAULT_INIT_TIMEOUT)?,
            poll_interval: millis(&lookup, POLL_INTERVAL_ENV, DEFAULT_POLL_INTERVAL)?,
        };
        let request_timeout = millis(&lookup, REQUEST_TIMEOUT_ENV, DEFAULT_REQUEST_TIMEOUT)?;

        Ok(Self::new(url, anon_key)
            .with_request_timeout(request_timeout)
            .with_init_policy(init))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn millis(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> DbResult<Duration> {
    match non_empty(lookup(key)) {
        None => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
            _ => Err(DbError::InvalidSetting { key, value: raw }),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_credentials_and_defaults() {
        let settings = DatabaseSettings::from_lookup(lookup(&[
            (URL_ENV, "https://demo.supabase.co/"),
            (KEY_ENV, "anon"),
        ]))
        .unwrap();
        assert_eq!(settings.url, "https://demo.supabase.co");
        assert_eq!(settings.anon_key, "anon");
        assert_eq!(settings.init, InitPolicy::default());
        assert_eq!(settings.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn missing_credentials_have_no_fallback() {
        let err = DatabaseSettings::from_lookup(lookup(&[(KEY_ENV, "anon")])).unwrap_err();
        assert!(matches!(err, DbError::MissingUrl));

        let err = DatabaseSettings::from_lookup(lookup(&[
            (URL_ENV, "https://demo.supabase.co"),
            (KEY_ENV, "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, DbError::MissingKey));
    }

    #[test]
    fn rejects_bad_values() {
        let err = DatabaseSettings::from_lookup(lookup(&[
            (URL_ENV, "demo.supabase.co"),
            (KEY_ENV, "anon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DbError::InvalidSetting { key: URL_ENV, .. }));

        let err = DatabaseSettings::from_lookup(lookup(&[
            (URL_ENV, "https://demo.supabase.co"),
            (KEY_ENV, "anon"),
            (INIT_TIMEOUT_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidSetting {
                key: INIT_TIMEOUT_ENV,
                ..
            }
        ));
    }

    #[test]
    fn overrides_timeouts() {
        let settings = DatabaseSettings::from_lookup(lookup(&[
            (URL_ENV, "http://localhost:54321"),
            (KEY_ENV, "anon"),
            (INIT_TIMEOUT_ENV, "250"),
            (POLL_INTERVAL_ENV, "5"),
            (REQUEST_TIMEOUT_ENV, "1500"),
        ]))
        .unwrap();
        assert_eq!(settings.init.timeout, Duration::from_millis(250));
        assert_eq!(settings.init.poll_interval, Duration::from_millis(5));
        assert_eq!(settings.request_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn debug_output_hides_key() {
        let settings = DatabaseSettings::new("https://demo.supabase.co", "secret-key");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret-key"));
    }
}
