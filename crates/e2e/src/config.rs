//! Run configuration
//!
//! Everything a run needs is folded into one immutable [`RunConfig`]: the
//! optional TOML settings file supplies defaults and the command line
//! overrides them. Credentials only ever come from the command line or its
//! environment variables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use catalog_webdriver::ChromeOptions;
use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::readiness::{duration_secs, ReadinessPolicy};

pub const DEFAULT_BASE: &str = "https://ml.rksystems.com";
pub const DEFAULT_LOG_PATH: &str = "test-library-catalog.log";

/// Account used for every login in the run
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings file contents; every field is optional
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Catalog server, without the `/library` suffix
    pub base_url: String,

    /// WebDriver (chromedriver) server
    pub webdriver_url: String,

    /// Run Chrome without a window
    pub headless: bool,

    /// Append-only run log
    pub log_path: PathBuf,

    /// Where PDF snapshots are written
    pub artifacts_dir: PathBuf,

    /// JSON run report, if wanted
    pub results_path: Option<PathBuf>,

    /// Element lookup wait applied by the driver
    #[serde(with = "duration_secs")]
    pub implicit_wait: Duration,

    /// Unit for explicit settle pauses between UI actions
    #[serde(with = "duration_secs")]
    pub pace: Duration,

    /// Keep going after a scenario fails
    pub continue_on_failure: bool,

    pub readiness: ReadinessPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE.to_string(),
            webdriver_url: "http://localhost:9515".to_string(),
            headless: false,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            artifacts_dir: PathBuf::from("."),
            results_path: None,
            implicit_wait: Duration::from_secs(20),
            pace: Duration::from_secs(1),
            continue_on_failure: true,
            readiness: ReadinessPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> E2eResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the poller cannot work with
    pub fn validate(&self) -> E2eResult<()> {
        if self.readiness.attempts == 0 {
            return Err(E2eError::Config(
                "readiness.attempts must be at least 1; no page would ever be read".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> E2eResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

/// Immutable configuration shared by everything in a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Credentials,
    pub settings: Settings,

    /// Browser console logging and debug-level output
    pub verbose: bool,

    /// Scenario names requested on the command line; empty means all
    pub selected: Vec<String>,
}

impl RunConfig {
    pub fn new(credentials: Credentials, settings: Settings) -> Self {
        Self {
            credentials,
            settings,
            verbose: false,
            selected: Vec::new(),
        }
    }

    /// Root of the catalog application
    pub fn catalog_url(&self) -> String {
        format!("{}/library", self.settings.base_url.trim_end_matches('/'))
    }

    /// Absolute URL for a path inside the catalog
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.catalog_url(), path.trim_start_matches('/'))
    }

    pub fn api_url(&self) -> String {
        format!("{}/api", self.catalog_url())
    }

    pub fn artifact_path(&self, filename: &str) -> PathBuf {
        self.settings.artifacts_dir.join(filename)
    }

    pub fn chrome_options(&self) -> ChromeOptions {
        ChromeOptions {
            headless: self.settings.headless,
            console_logging: self.verbose,
            implicit_wait: self.settings.implicit_wait,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_hosted_catalog() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE);
        assert_eq!(settings.readiness.attempts, 3);
        assert!(settings.continue_on_failure);
    }

    #[test]
    fn test_partial_settings_file() {
        let settings = Settings::from_toml(
            r#"
base_url = "http://localhost:8080/"
pace = 0.25
continue_on_failure = false

[readiness]
attempts = 4
"#,
        )
        .unwrap();
        assert_eq!(settings.pace, Duration::from_millis(250));
        assert!(!settings.continue_on_failure);
        assert_eq!(settings.readiness.attempts, 4);
        assert_eq!(settings.readiness.settle, Duration::from_secs(2));
        assert_eq!(settings.log_path, PathBuf::from(DEFAULT_LOG_PATH));

        let config = RunConfig::new(Credentials::new("klem", "secret"), settings);
        assert_eq!(config.catalog_url(), "http://localhost:8080/library");
        assert_eq!(config.url("/edit"), "http://localhost:8080/library/edit");
        assert_eq!(config.api_url(), "http://localhost:8080/library/api");
    }

    #[test]
    fn test_bad_settings_are_rejected() {
        assert!(Settings::from_toml("pace = \"soon\"").is_err());
    }

    #[test]
    fn test_zero_readiness_attempts_are_rejected() {
        let err = Settings::from_toml("[readiness]\nattempts = 0\n").unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
        assert!(err.to_string().contains("readiness.attempts"));

        let one = Settings::from_toml("[readiness]\nattempts = 1\n").unwrap();
        assert_eq!(one.readiness.attempts, 1);
    }

    #[test]
    fn test_password_is_not_logged() {
        let rendered = format!("{:?}", Credentials::new("klem", "hunter2"));
        assert!(rendered.contains("klem"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_verbose_enables_console_logging() {
        let mut config = RunConfig::new(Credentials::new("u", "p"), Settings::default());
        assert!(!config.chrome_options().console_logging);
        config.verbose = true;
        assert!(config.chrome_options().console_logging);
    }
}
