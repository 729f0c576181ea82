//! Scenario outcomes and the run report

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{E2eError, E2eResult};

/// Terminal result of one scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// An expected text or element was absent
    Failed,
    /// The scenario could not be carried out
    Errored,
}

/// Lifecycle of a single scenario.
///
/// `Pending -> Running -> {Passed, Failed, Errored} -> Recorded`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    Pending,
    Running,
    Finished(Outcome),
    Recorded(Outcome),
}

impl ScenarioState {
    pub fn start(self) -> E2eResult<Self> {
        match self {
            ScenarioState::Pending => Ok(ScenarioState::Running),
            other => Err(other.invalid("running")),
        }
    }

    pub fn finish(self, outcome: Outcome) -> E2eResult<Self> {
        match self {
            ScenarioState::Running => Ok(ScenarioState::Finished(outcome)),
            other => Err(other.invalid(&format!("{:?}", outcome).to_lowercase())),
        }
    }

    pub fn record(self) -> E2eResult<Self> {
        match self {
            ScenarioState::Finished(outcome) => Ok(ScenarioState::Recorded(outcome)),
            other => Err(other.invalid("recorded")),
        }
    }

    fn invalid(self, to: &str) -> E2eError {
        E2eError::InvalidTransition {
            from: self.to_string(),
            to: to.to_string(),
        }
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioState::Pending => write!(f, "pending"),
            ScenarioState::Running => write!(f, "running"),
            ScenarioState::Finished(outcome) => write!(f, "{:?}", outcome),
            ScenarioState::Recorded(outcome) => write!(f, "recorded ({:?})", outcome),
        }
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub id: u32,
    pub name: String,
    pub title: String,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
    pub error: Option<String>,
    pub messages: Vec<String>,
    pub console_errors: Vec<String>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Result of running the suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub base_url: String,
    pub started_at: chrono::DateTime<chrono::Local>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteReport {
    pub fn new(base_url: &str, total: usize) -> Self {
        Self {
            base_url: base_url.to_string(),
            started_at: chrono::Local::now(),
            total,
            passed: 0,
            failed: 0,
            errored: 0,
            skipped: total,
            duration_ms: 0,
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: ScenarioResult) {
        match result.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Errored => self.errored += 1,
        }
        self.skipped = self.total.saturating_sub(self.results.len() + 1);
        self.results.push(result);
    }

    pub fn success(&self) -> bool {
        self.passed == self.total
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        info!("Results written to: {}", path.display());
        Ok(())
    }
}

/// Render a duration the way the run log shows elapsed times: `H:MM:SS.ffffff`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        elapsed.subsec_micros()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: u32, outcome: Outcome) -> ScenarioResult {
        ScenarioResult {
            id,
            name: format!("scenario_{id}"),
            title: String::new(),
            outcome,
            elapsed_ms: 10,
            error: None,
            messages: vec![],
            console_errors: vec![],
        }
    }

    #[test]
    fn test_lifecycle_never_skips_running() {
        let state = ScenarioState::Pending;
        assert!(state.finish(Outcome::Passed).is_err());
        assert!(state.record().is_err());

        let state = state.start().unwrap();
        assert!(state.start().is_err());
        let state = state.finish(Outcome::Failed).unwrap();
        assert!(state.finish(Outcome::Passed).is_err());
        assert_eq!(state.record().unwrap(), ScenarioState::Recorded(Outcome::Failed));
    }

    #[test]
    fn test_counts_and_skips() {
        let mut report = SuiteReport::new("https://ml.example.com", 4);
        assert_eq!(report.skipped, 4);
        report.push(result(1, Outcome::Passed));
        report.push(result(2, Outcome::Failed));
        report.push(result(3, Outcome::Errored));

        assert_eq!((report.passed, report.failed, report.errored), (1, 1, 1));
        assert_eq!(report.skipped, 1);
        assert!(!report.success());
    }

    #[test]
    fn test_all_passed_is_success() {
        let mut report = SuiteReport::new("https://ml.example.com", 2);
        report.push(result(1, Outcome::Passed));
        assert!(!report.success());
        report.push(result(2, Outcome::Passed));
        assert!(report.success());
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("run.json");
        let mut report = SuiteReport::new("https://ml.example.com", 1);
        report.push(result(1, Outcome::Passed));

        report.write_json(&path).unwrap();

        let parsed: SuiteReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.passed, 1);
        assert_eq!(parsed.results[0].outcome, Outcome::Passed);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(83_456)), "0:01:23.456000");
        assert_eq!(format_elapsed(Duration::from_secs(3 * 3600 + 5)), "3:00:05.000000");
    }
}
