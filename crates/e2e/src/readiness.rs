//! Page readiness polling
//!
//! A page is only handed to assertions once its source is complete (it has
//! both closing `body` and `html` tags) and no block-level "Loading..." or
//! "Waiting..." placeholder is on screen. Anything else is treated as a
//! transient state and retried with a growing backoff.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use catalog_webdriver::Browser;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{E2eError, E2eResult};

/// What a page snapshot looks like to the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    /// Complete and stable
    Ready,
    /// Missing the closing body or html tag
    BodyMissing,
    /// A loading or waiting placeholder is showing
    Loading,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageState::Ready => write!(f, "ready"),
            PageState::BodyMissing => write!(f, "body missing"),
            PageState::Loading => write!(f, "loading"),
        }
    }
}

fn loading_pattern() -> &'static Regex {
    static LOADING: OnceLock<Regex> = OnceLock::new();
    // No backreferences in `regex`, so each wrapping tag pair is spelled out
    LOADING.get_or_init(|| {
        Regex::new(r"<div>(?:Loading|Waiting) ?\.\.\.</div>|<p>(?:Loading|Waiting) ?\.\.\.</p>")
            .expect("loading pattern is valid")
    })
}

/// Classify raw page source.
pub fn classify(source: &str) -> PageState {
    if !(source.contains("</body>") && source.contains("</html>")) {
        PageState::BodyMissing
    } else if loading_pattern().is_match(source) {
        PageState::Loading
    } else {
        PageState::Ready
    }
}

/// Page source judged ready for assertions
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    source: String,
    pub captured_at: chrono::DateTime<chrono::Local>,
}

impl PageSnapshot {
    pub fn new(source: String) -> Self {
        Self {
            source,
            captured_at: chrono::Local::now(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn contains(&self, text: &str) -> bool {
        self.source.contains(text)
    }

    pub fn into_source(self) -> String {
        self.source
    }
}

/// Retry policy for readiness checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessPolicy {
    /// Snapshots fetched before giving up
    pub attempts: u32,

    /// Delay before the first snapshot
    #[serde(with = "duration_secs")]
    pub settle: Duration,

    /// One backoff step; the wait after a failed attempt is
    /// `(attempts - remaining) * backoff_unit`
    #[serde(with = "duration_secs")]
    pub backoff_unit: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            settle: Duration::from_secs(2),
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl ReadinessPolicy {
    /// Backoff after an attempt that left `remaining` attempts.
    ///
    /// Grows as the budget drains; zero once nothing is left to retry.
    pub fn backoff(&self, remaining: u32) -> Duration {
        if remaining == 0 {
            return Duration::ZERO;
        }
        self.backoff_unit * self.attempts.saturating_sub(remaining)
    }
}

/// Anything that can produce the current page source on demand
#[async_trait]
pub trait SnapshotSource: Send {
    async fn fetch_source(&mut self) -> E2eResult<String>;
}

#[async_trait]
impl<B: Browser + ?Sized> SnapshotSource for B {
    async fn fetch_source(&mut self) -> E2eResult<String> {
        Ok(self.page_source().await?)
    }
}

/// Waits for a page to settle before it is read
#[derive(Debug, Clone, Default)]
pub struct ReadinessPoller {
    policy: ReadinessPolicy,
}

impl ReadinessPoller {
    pub fn new(policy: ReadinessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ReadinessPolicy {
        &self.policy
    }

    /// Fetch snapshots until one is ready or the attempt budget runs out.
    ///
    /// Waits the settle delay once up front; a ready snapshot is returned
    /// without any further waiting.
    pub async fn wait_ready<S>(&self, source: &mut S) -> E2eResult<PageSnapshot>
    where
        S: SnapshotSource + ?Sized,
    {
        sleep(self.policy.settle).await;

        let mut remaining = self.policy.attempts;
        let mut last_state = PageState::BodyMissing;

        while remaining > 0 {
            let page = source.fetch_source().await?;
            let state = classify(&page);
            remaining -= 1;

            match state {
                PageState::Ready => {
                    debug!("Page ready after {} attempt(s)", self.policy.attempts - remaining);
                    return Ok(PageSnapshot::new(page));
                }
                PageState::BodyMissing => {
                    warn!("body missing in {} bytes of source; {} tries left", page.len(), remaining);
                }
                PageState::Loading => {
                    warn!("...waiting; {} tries left", remaining);
                }
            }
            last_state = state;

            let backoff = self.policy.backoff(remaining);
            if !backoff.is_zero() {
                sleep(backoff).await;
            }
        }

        Err(E2eError::PageNotReady {
            attempts: self.policy.attempts,
            last_state,
        })
    }
}

/// Serialise durations as (fractional) seconds in settings files
pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
