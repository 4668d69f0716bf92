//! Environment-backed harness configuration.
//!
//! Values come from the process environment (after `.env` is loaded) and may
//! be overridden by command-line flags. Invalid UTF-8, empty values and
//! non-positive durations fail closed.

use std::time::Duration;

use url::Url;

use crate::error::{HarnessError, HarnessResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FEED_SPACING: Duration = Duration::from_millis(1000);

/// Environment keys understood by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnv {
    BaseUrl,
    TimeoutSeconds,
    FeedSpacingMillis,
}

impl HarnessEnv {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaseUrl => "CONTRACT_BASE_URL",
            Self::TimeoutSeconds => "CONTRACT_TIMEOUT_SECS",
            Self::FeedSpacingMillis => "CONTRACT_FEED_SPACING_MS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Root of the backend under test; endpoint paths are joined onto it.
    pub base_url: Url,
    /// Per-request timeout. A request exceeding it fails the scenario.
    pub timeout: Duration,
    /// Pause between the two posts of the feed ordering scenario so the
    /// backend assigns them distinct creation timestamps.
    pub feed_spacing: Duration,
}

impl HarnessConfig {
    /// Loads `.env` if present, then reads the harness keys from the
    /// environment.
    pub fn from_env() -> HarnessResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(read_env_strict)
    }

    /// Builds a configuration from an arbitrary key lookup, falling back to
    /// defaults for absent keys.
    pub fn from_lookup<F>(mut lookup: F) -> HarnessResult<Self>
    where
        F: FnMut(&str) -> HarnessResult<Option<String>>,
    {
        let mut read = |key: HarnessEnv| -> HarnessResult<Option<String>> {
            match lookup(key.as_str())? {
                Some(value) if value.trim().is_empty() => Err(HarnessError::InvalidConfig(
                    format!("{} must not be empty", key.as_str()),
                )),
                other => Ok(other),
            }
        };

        let base_url = match read(HarnessEnv::BaseUrl)? {
            Some(raw) => parse_base_url(&raw)?,
            None => parse_base_url(DEFAULT_BASE_URL)?,
        };
        let timeout = read(HarnessEnv::TimeoutSeconds)?
            .map(|raw| parse_timeout_seconds(HarnessEnv::TimeoutSeconds.as_str(), &raw))
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT);
        let feed_spacing = read(HarnessEnv::FeedSpacingMillis)?
            .map(|raw| parse_millis(HarnessEnv::FeedSpacingMillis.as_str(), &raw))
            .transpose()?
            .unwrap_or(DEFAULT_FEED_SPACING);

        Ok(Self {
            base_url,
            timeout,
            feed_spacing,
        })
    }

    pub fn with_base_url(mut self, raw: &str) -> HarnessResult<Self> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> HarnessResult<Self> {
        if secs == 0 {
            return Err(HarnessError::InvalidConfig(
                "timeout must be greater than zero".into(),
            ));
        }
        self.timeout = Duration::from_secs(secs);
        Ok(self)
    }
}

/// Reads an environment variable, rejecting values that are not valid UTF-8.
pub fn read_env_strict(name: &str) -> HarnessResult<Option<String>> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| HarnessError::InvalidConfig(format!("{name} must be valid UTF-8")))
    })
}

/// Parses an http(s) base URL, normalized to end with a slash.
pub fn parse_base_url(raw: &str) -> HarnessResult<Url> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(HarnessError::InvalidConfig(format!(
            "base url must use http or https, got `{}`",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_timeout_seconds(name: &str, raw: &str) -> HarnessResult<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        HarnessError::InvalidConfig(format!("{name} must be a positive integer number of seconds"))
    })?;
    if secs == 0 {
        return Err(HarnessError::InvalidConfig(format!(
            "{name} must be greater than zero"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_millis(name: &str, raw: &str) -> HarnessResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| HarnessError::InvalidConfig(format!("{name} must be an integer number of milliseconds")))
}
