// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use anyhow::{anyhow, ensure, Context};
use libdd_mxcrash::config::{MxCrashConfig, DEFAULT_IN_APP_MARKER};
use libdd_mxcrash::envelope::SentryDsn;
use std::time::Duration;

pub const DEFAULT_SENTRY_SCHEME: &str = "https";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_REQUEST_CONTENT_LENGTH: usize = 10 * 1024 * 1024; // 10MB in Bytes
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub mod parse_env {
    use std::{env, str::FromStr, time::Duration};

    /// Seconds, fractional values allowed.
    pub fn duration(name: &str) -> Option<Duration> {
        Duration::try_from_secs_f32(env::var(name).ok()?.parse::<f32>().ok()?).ok()
    }

    pub fn int<T: FromStr>(name: &str) -> Option<T> {
        env::var(name).ok()?.parse::<T>().ok()
    }

    pub fn str_not_empty(name: &str) -> Option<String> {
        env::var(name).ok().filter(|s| !s.is_empty())
    }
}

/// Raw configuration options read from the environment
#[derive(Debug, Default, Clone)]
pub struct ConfigSettings {
    pub sentry_dsn: Option<String>,
    pub sentry_hostname: Option<String>,
    pub sentry_project: Option<String>,
    pub sentry_scheme: Option<String>,
    pub in_app_marker: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub upload_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub max_request_content_length: Option<usize>,
    pub log_level: Option<String>,
}

impl ConfigSettings {
    const SENTRY_DSN: &'static str = "SENTRY_DSN";
    const SENTRY_HOSTNAME: &'static str = "SENTRY_HOSTNAME";
    const SENTRY_PROJECT: &'static str = "SENTRY_PROJECT";
    const SENTRY_SCHEME: &'static str = "SENTRY_SCHEME";

    const MXCRASH_IN_APP_MARKER: &'static str = "MXCRASH_IN_APP_MARKER";
    const MXCRASH_HOST: &'static str = "MXCRASH_HOST";
    const MXCRASH_PORT: &'static str = "MXCRASH_PORT";
    const MXCRASH_UPLOAD_TIMEOUT: &'static str = "MXCRASH_UPLOAD_TIMEOUT";
    const MXCRASH_READ_TIMEOUT: &'static str = "MXCRASH_READ_TIMEOUT";
    const MXCRASH_MAX_CONTENT_LENGTH: &'static str = "MXCRASH_MAX_CONTENT_LENGTH";
    const MXCRASH_LOG_LEVEL: &'static str = "MXCRASH_LOG_LEVEL";

    pub fn from_env() -> Self {
        Self {
            sentry_dsn: parse_env::str_not_empty(Self::SENTRY_DSN),
            sentry_hostname: parse_env::str_not_empty(Self::SENTRY_HOSTNAME),
            sentry_project: parse_env::str_not_empty(Self::SENTRY_PROJECT),
            sentry_scheme: parse_env::str_not_empty(Self::SENTRY_SCHEME),
            // An explicitly empty marker is kept, it disables in-app marking.
            in_app_marker: std::env::var(Self::MXCRASH_IN_APP_MARKER).ok(),
            host: parse_env::str_not_empty(Self::MXCRASH_HOST),
            port: parse_env::int(Self::MXCRASH_PORT),
            upload_timeout: parse_env::duration(Self::MXCRASH_UPLOAD_TIMEOUT),
            read_timeout: parse_env::duration(Self::MXCRASH_READ_TIMEOUT),
            max_request_content_length: parse_env::int(Self::MXCRASH_MAX_CONTENT_LENGTH),
            log_level: parse_env::str_not_empty(Self::MXCRASH_LOG_LEVEL)
                .map(|level| level.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mxcrash: MxCrashConfig,
    /// Address the relay listens on
    pub host: String,
    pub port: u16,
    /// Bound on a single delivery to Sentry
    pub upload_timeout: Duration,
    /// Bound on reading the request headers of an inbound connection
    pub read_timeout: Duration,
    pub max_request_content_length: usize,
    pub log_level: String,
}

impl Config {
    pub fn new() -> anyhow::Result<Config> {
        Self::from_settings(&ConfigSettings::from_env())
    }

    pub fn from_settings(settings: &ConfigSettings) -> anyhow::Result<Config> {
        let public_key = settings
            .sentry_dsn
            .as_deref()
            .ok_or_else(|| anyhow!("{} is not set", ConfigSettings::SENTRY_DSN))?;
        let hostname = settings
            .sentry_hostname
            .as_deref()
            .ok_or_else(|| anyhow!("{} is not set", ConfigSettings::SENTRY_HOSTNAME))?;
        let project_id: u64 = settings
            .sentry_project
            .as_deref()
            .ok_or_else(|| anyhow!("{} is not set", ConfigSettings::SENTRY_PROJECT))?
            .parse()
            .with_context(|| format!("{} must be a number", ConfigSettings::SENTRY_PROJECT))?;
        let scheme = settings
            .sentry_scheme
            .as_deref()
            .unwrap_or(DEFAULT_SENTRY_SCHEME);
        ensure!(
            scheme == "https" || scheme == "http",
            "unsupported {} {scheme:?}, expected https or http",
            ConfigSettings::SENTRY_SCHEME
        );

        let dsn = SentryDsn::new(scheme, public_key, hostname, project_id);
        // The envelope endpoint must be a valid request uri.
        dsn.envelope_endpoint()
            .parse::<http::Uri>()
            .with_context(|| format!("invalid Sentry host {hostname:?}"))?;

        let mxcrash = MxCrashConfig::new(dsn).with_in_app_marker(
            settings
                .in_app_marker
                .as_deref()
                .unwrap_or(DEFAULT_IN_APP_MARKER),
        );

        let max_request_content_length = settings
            .max_request_content_length
            .unwrap_or(DEFAULT_MAX_REQUEST_CONTENT_LENGTH);
        ensure!(
            max_request_content_length > 0,
            "{} must be positive",
            ConfigSettings::MXCRASH_MAX_CONTENT_LENGTH
        );

        Ok(Config {
            mxcrash,
            host: settings
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: settings.port.unwrap_or(DEFAULT_PORT),
            upload_timeout: settings.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
            read_timeout: settings.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT),
            max_request_content_length,
            log_level: settings
                .log_level
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure environment variable tests run sequentially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: [&str; 11] = [
        "SENTRY_DSN",
        "SENTRY_HOSTNAME",
        "SENTRY_PROJECT",
        "SENTRY_SCHEME",
        "MXCRASH_IN_APP_MARKER",
        "MXCRASH_HOST",
        "MXCRASH_PORT",
        "MXCRASH_UPLOAD_TIMEOUT",
        "MXCRASH_READ_TIMEOUT",
        "MXCRASH_MAX_CONTENT_LENGTH",
        "MXCRASH_LOG_LEVEL",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    fn required_settings() -> ConfigSettings {
        ConfigSettings {
            sentry_dsn: Some("public".to_string()),
            sentry_hostname: Some("o1.ingest.sentry.io".to_string()),
            sentry_project: Some("42".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_settings(&required_settings()).unwrap();
        assert_eq!(
            config.mxcrash.dsn.to_string(),
            "https://public@o1.ingest.sentry.io/42"
        );
        assert_eq!(config.mxcrash.in_app_marker, "MonetizeSDK");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.max_request_content_length, 10 * 1024 * 1024);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_required_settings() {
        for missing in 0..3 {
            let mut settings = required_settings();
            match missing {
                0 => settings.sentry_dsn = None,
                1 => settings.sentry_hostname = None,
                _ => settings.sentry_project = None,
            }
            assert!(Config::from_settings(&settings).is_err());
        }
    }

    #[test]
    fn test_invalid_settings() {
        let mut settings = required_settings();
        settings.sentry_project = Some("not-a-number".to_string());
        let err = Config::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("SENTRY_PROJECT"));

        let mut settings = required_settings();
        settings.sentry_scheme = Some("ftp".to_string());
        assert!(Config::from_settings(&settings).is_err());

        let mut settings = required_settings();
        settings.sentry_hostname = Some("bad host".to_string());
        assert!(Config::from_settings(&settings).is_err());

        let mut settings = required_settings();
        settings.max_request_content_length = Some(0);
        assert!(Config::from_settings(&settings).is_err());
    }

    #[test]
    fn test_config_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("SENTRY_DSN", "key");
        std::env::set_var("SENTRY_HOSTNAME", "localhost:9000");
        std::env::set_var("SENTRY_PROJECT", "7");
        std::env::set_var("SENTRY_SCHEME", "http");
        std::env::set_var("MXCRASH_IN_APP_MARKER", "");
        std::env::set_var("MXCRASH_PORT", "9090");
        std::env::set_var("MXCRASH_UPLOAD_TIMEOUT", "0.5");
        std::env::set_var("MXCRASH_MAX_CONTENT_LENGTH", "1024");
        std::env::set_var("MXCRASH_LOG_LEVEL", "DEBUG");

        let config = Config::new().unwrap();
        assert_eq!(
            config.mxcrash.dsn.envelope_endpoint(),
            "http://localhost:9000/api/7/envelope/"
        );
        assert_eq!(config.mxcrash.in_app_marker, "");
        assert_eq!(config.port, 9090);
        assert_eq!(config.upload_timeout, Duration::from_millis(500));
        assert_eq!(config.read_timeout, Duration::from_secs(10));
        assert_eq!(config.max_request_content_length, 1024);
        assert_eq!(config.log_level, "debug");

        clear_env();
    }

    #[test]
    fn test_unparseable_values_fall_back_to_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("MXCRASH_PORT", "eighty");
        std::env::set_var("MXCRASH_READ_TIMEOUT", "-3");
        std::env::set_var("SENTRY_DSN", "");

        let settings = ConfigSettings::from_env();
        assert_eq!(settings.port, None);
        assert_eq!(settings.read_timeout, None);
        assert_eq!(settings.sentry_dsn, None);
        assert!(Config::new().is_err());

        clear_env();
    }
}
