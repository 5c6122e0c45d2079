use std::env;
use std::time::Duration;

use anyhow::Result;

/// Default per-check timeout for the Perspective and Akismet calls.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Central configuration loaded from environment variables.
///
/// Loaded once at startup and shared read-only with every request. All
/// secrets come from env vars; the .env file is loaded by `main` via dotenvy.
#[derive(Clone)]
#[cfg_attr(test, derive(Debug))]
pub struct Config {
    pub perspective_api_key: String,
    /// Run the toxicity check. Defaults to on whenever an API key is present.
    pub perspective_enabled: bool,
    pub akismet_api_key: String,
    /// Run the spam check. Defaults to on whenever an API key is present.
    pub akismet_enabled: bool,
    /// Site URL reported to Akismet when the request carries no Origin header.
    pub akismet_site: Option<String>,
    /// Let submissions Akismet flags as spam through to the backend.
    pub allow_spam: bool,
    /// Development mode: full error detail goes to the log.
    pub dev_mode: bool,
    /// Upper bound on each external check before it counts as failed.
    pub check_timeout: Duration,
}

impl Default for Config {
    /// Both checks disabled, production mode.
    fn default() -> Self {
        Self {
            perspective_api_key: String::new(),
            perspective_enabled: false,
            akismet_api_key: String::new(),
            akismet_enabled: false,
            akismet_site: None,
            allow_spam: false,
            dev_mode: false,
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(|name| env::var(name).ok())
    }

    /// Load configuration from any variable lookup.
    ///
    /// Fails on unparseable flags, a zero or non-numeric timeout, or when a
    /// check is explicitly enabled without its API key.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let perspective_api_key = lookup("PERSPECTIVE_API_KEY").unwrap_or_default();
        let akismet_api_key = lookup("AKISMET_API_KEY").unwrap_or_default();

        let perspective_enabled = flag(&lookup, "PERSPECTIVE_ENABLED")?
            .unwrap_or(!perspective_api_key.is_empty());
        let akismet_enabled =
            flag(&lookup, "AKISMET_ENABLED")?.unwrap_or(!akismet_api_key.is_empty());

        let check_timeout = match lookup("FEEDBACK_CHECK_TIMEOUT_MS") {
            Some(raw) => {
                let millis: u64 = raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("FEEDBACK_CHECK_TIMEOUT_MS must be a number of milliseconds, got {raw:?}")
                })?;
                if millis == 0 {
                    anyhow::bail!("FEEDBACK_CHECK_TIMEOUT_MS must be greater than zero");
                }
                Duration::from_millis(millis)
            }
            None => DEFAULT_CHECK_TIMEOUT,
        };

        let config = Self {
            perspective_api_key,
            perspective_enabled,
            akismet_api_key,
            akismet_enabled,
            akismet_site: lookup("AKISMET_SITE").filter(|s| !s.is_empty()),
            allow_spam: flag(&lookup, "ALLOW_SPAM")?.unwrap_or(false),
            dev_mode: lookup("FEEDBACK_ENV")
                .is_some_and(|v| v.eq_ignore_ascii_case("development")),
            check_timeout,
        };

        config.require_perspective()?;
        config.require_akismet()?;
        Ok(config)
    }

    /// Check that the Perspective API key is configured if the toxicity check is on.
    pub fn require_perspective(&self) -> Result<()> {
        if self.perspective_enabled && self.perspective_api_key.is_empty() {
            anyhow::bail!(
                "PERSPECTIVE_ENABLED is set but PERSPECTIVE_API_KEY is not. \
                 Add the key to your .env file or disable the toxicity check."
            );
        }
        Ok(())
    }

    /// Check that the Akismet API key is configured if the spam check is on.
    pub fn require_akismet(&self) -> Result<()> {
        if self.akismet_enabled && self.akismet_api_key.is_empty() {
            anyhow::bail!(
                "AKISMET_ENABLED is set but AKISMET_API_KEY is not. \
                 Add the key to your .env file or disable the spam check."
            );
        }
        Ok(())
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<bool>> {
    match lookup(name) {
        Some(raw) => parse_flag(&raw)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("{name} must be a boolean (true/false), got {raw:?}")),
        None => Ok(None),
    }
}

/// Parse a boolean flag value. Accepts 1/0, true/false, yes/no, on/off.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
