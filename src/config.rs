//! Runtime configuration.
//!
//! A single immutable [`Config`] is built once at startup and passed
//! explicitly into each component constructor. The core never reads the
//! environment itself.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Default per-operation timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 25_000;

/// Default lookahead window in calendar days.
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 14;

/// Default minimum selector/CTA match count for availability.
pub const DEFAULT_MIN_CARD_COUNT: usize = 1;

/// Phrase the target app renders on dates with nothing scheduled.
pub const DEFAULT_EMPTY_PHRASE: &str = "no deliveries scheduled";

/// Immutable monitor configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base path of the per-date pages, e.g. `https://austin.lunchdrop.com/app`.
    pub base_url: String,
    /// How many calendar days ahead to check, starting tomorrow.
    pub lookahead_days: u32,
    /// Slack-compatible webhook receiving change summaries.
    pub webhook_url: String,
    /// Login email/username.
    pub email: String,
    /// Login password.
    pub password: String,
    /// Optional CSS selectors counting card-like elements.
    pub card_selectors: Vec<String>,
    /// Minimum selector/CTA matches before a date counts as available.
    pub min_card_count: usize,
    /// Phrase marking an explicitly-empty date (matched case-insensitively).
    pub empty_phrase: String,
    /// Bound for every navigation/wait, in milliseconds.
    pub timeout_ms: u64,
    /// Run the browser headless.
    pub headless: bool,
    /// Directory holding per-page snapshot records and the session blob.
    pub state_dir: PathBuf,
    /// Directory receiving diagnostic markup/screenshot artifacts.
    pub artifacts_dir: PathBuf,
    /// Report every window date instead of diffing.
    pub summary_only: bool,
    /// Send a heartbeat message when nothing changed.
    pub heartbeat_on_no_change: bool,
}

impl Config {
    /// Build the configuration from the environment, validating required
    /// values up front so every later failure is a runtime one.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("BASE_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .context("BASE_URL must be set (e.g. https://austin.lunchdrop.com/app)")?;
        url::Url::parse(&base_url)
            .with_context(|| format!("BASE_URL is not a valid URL: {base_url}"))?;
        let webhook_url =
            std::env::var("SLACK_WEBHOOK_URL").context("SLACK_WEBHOOK_URL must be set")?;
        let email = std::env::var("MONITOR_EMAIL").context("MONITOR_EMAIL must be set")?;
        let password = std::env::var("MONITOR_PASSWORD").context("MONITOR_PASSWORD must be set")?;

        let lookahead_days = env_parse("LOOKAHEAD_DAYS", DEFAULT_LOOKAHEAD_DAYS)?;
        if lookahead_days == 0 {
            bail!("LOOKAHEAD_DAYS must be at least 1");
        }

        let card_selectors = std::env::var("CSS_CARD_SELECTORS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let state_dir = std::env::var("STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home_subdir("state"));
        let artifacts_dir = std::env::var("ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_home_subdir("artifacts"));

        Ok(Self {
            base_url,
            lookahead_days,
            webhook_url,
            email,
            password,
            card_selectors,
            min_card_count: env_parse("MIN_CARD_COUNT", DEFAULT_MIN_CARD_COUNT)?,
            empty_phrase: std::env::var("EMPTY_PHRASE")
                .unwrap_or_else(|_| DEFAULT_EMPTY_PHRASE.to_string()),
            timeout_ms: env_parse("TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            headless: env_flag("HEADLESS", true),
            state_dir,
            artifacts_dir,
            summary_only: env_flag("SUMMARY_ONLY", false),
            heartbeat_on_no_change: env_flag("HEARTBEAT_ON_NO_CHANGE", false),
        })
    }

    /// Canonical URL of the page for one calendar date.
    pub fn url_for(&self, date: chrono::NaiveDate) -> String {
        format!("{}/{}", self.base_url, date.format("%Y-%m-%d"))
    }

    /// Sign-in surface. The app redirects unauthenticated visitors here,
    /// so the base path itself is the navigation target.
    pub fn signin_url(&self) -> &str {
        &self.base_url
    }
}

fn default_home_subdir(name: &str) -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".dropwatch")
        .join(name)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_config() -> Config {
        Config {
            base_url: "https://austin.lunchdrop.com/app".into(),
            lookahead_days: 14,
            webhook_url: "https://hooks.slack.test/T000/B000".into(),
            email: "user@example.com".into(),
            password: "secret".into(),
            card_selectors: Vec::new(),
            min_card_count: 1,
            empty_phrase: DEFAULT_EMPTY_PHRASE.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            headless: true,
            state_dir: PathBuf::from("/tmp/dw-state"),
            artifacts_dir: PathBuf::from("/tmp/dw-artifacts"),
            summary_only: false,
            heartbeat_on_no_change: false,
        }
    }

    #[test]
    fn test_url_for_date() {
        let cfg = test_config();
        let d = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert_eq!(cfg.url_for(d), "https://austin.lunchdrop.com/app/2026-08-07");
    }
}
