//! Sequential scenario runner

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::report::{format_elapsed, Outcome, ScenarioResult, ScenarioState, SuiteReport};
use crate::scenario::Scenario;
use crate::session::{Session, SessionFactory};

/// Runs scenarios one at a time against a single session
pub struct ScenarioRunner {
    config: Arc<RunConfig>,
}

impl ScenarioRunner {
    pub fn new(config: Arc<RunConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run `scenarios` in the order given.
    ///
    /// Logs in once for the whole suite; a refused login fails the run before
    /// any scenario starts. Every scenario that starts gets its teardown, and
    /// the session is closed once the loop ends.
    pub async fn run_suite<F>(&self, scenarios: &[Scenario], factory: &F) -> E2eResult<SuiteReport>
    where
        F: SessionFactory + ?Sized,
    {
        let started = Instant::now();
        let base = &self.config.settings.base_url;
        info!("{}", "-".repeat(40));
        info!("Tests started using {}", base);

        let session = match factory.open_session(&self.config).await {
            Ok(session) => session,
            Err(e) => {
                error!("Could not open a session: {}", e);
                return Err(e);
            }
        };
        if let Some(account) = &session.account {
            debug!("logged in as {}", account);
        }

        let mut report = SuiteReport::new(base, scenarios.len());
        let (session, outcome) = self.run_scenarios(scenarios, session, factory, &mut report).await;

        if let Err(e) = factory.close_session(session).await {
            warn!("Logout at the end of the run failed: {}", e);
        }
        outcome?;

        let elapsed = started.elapsed();
        report.duration_ms = elapsed.as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed, {} errored, {} skipped",
            report.passed, report.failed, report.errored, report.skipped
        );
        info!("Tests completed in {}", format_elapsed(elapsed));

        Ok(report)
    }

    async fn run_scenarios<F>(
        &self,
        scenarios: &[Scenario],
        mut session: Session,
        factory: &F,
        report: &mut SuiteReport,
    ) -> (Session, E2eResult<()>)
    where
        F: SessionFactory + ?Sized,
    {
        let mut not_passed: HashSet<&str> = HashSet::new();

        for scenario in scenarios {
            let broken: Vec<&str> = scenario
                .requires
                .iter()
                .copied()
                .filter(|r| not_passed.contains(r))
                .collect();
            if !broken.is_empty() {
                warn!(
                    "{} depends on {:?}, which did not pass; later failures may cascade",
                    scenario.name, broken
                );
            }

            let state = match ScenarioState::Pending.start() {
                Ok(state) => state,
                Err(e) => return (session, Err(e)),
            };
            debug!("{} is {}", scenario.qualified_name(), state);

            let (returned, result) = self.run_scenario(scenario, session, factory).await;
            session = returned;

            if let Err(e) = state.finish(result.outcome).and_then(ScenarioState::record) {
                return (session, Err(e));
            }

            match result.outcome {
                Outcome::Passed => info!("✓ {} ({} ms)", result.name, result.elapsed_ms),
                _ => {
                    error!(
                        "✗ {} - {}",
                        result.name,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                    not_passed.insert(scenario.name);
                }
            }

            let stop = !result.passed() && !self.config.settings.continue_on_failure;
            report.push(result);
            if stop {
                warn!("Stopping after the first failure; {} scenario(s) skipped", report.skipped);
                break;
            }
        }

        (session, Ok(()))
    }

    /// Setup, body and teardown of one scenario.
    ///
    /// Never fails: whatever goes wrong ends up in the returned result, and
    /// the session always comes back.
    async fn run_scenario<F>(&self, scenario: &Scenario, session: Session, factory: &F) -> (Session, ScenarioResult)
    where
        F: SessionFactory + ?Sized,
    {
        let started = Instant::now();
        info!("Running {}: {}", scenario.qualified_name(), scenario.title);

        let browser = match factory.launch_browser(&session).await {
            Ok(browser) => browser,
            Err(e) => {
                error!("Could not start a browser for {}: {}", scenario.name, e);
                let result = self.result(scenario, started, Some(e), vec![], vec![]);
                return (session, result);
            }
        };

        let mut page = Page::new(browser, session, self.config.clone());
        let mut messages = Vec::new();

        let mut failure = match factory.sign_in(&mut page).await {
            Ok(()) => (scenario.body)(&mut page).await.err(),
            Err(e) => Some(e),
        };

        if let Err(e) = factory.sign_out(&mut page).await {
            warn!("Sign-out after {} failed: {}", scenario.name, e);
            messages.push(format!("sign-out: {}", e));
            failure.get_or_insert(e);
        }

        let console_errors = match page.check_console_errors().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not read the browser console: {}", e);
                messages.push(format!("console: {}", e));
                Vec::new()
            }
        };

        let (mut browser, session) = page.release();
        if let Err(e) = browser.quit().await {
            warn!("Browser did not shut down cleanly: {}", e);
        }

        let result = self.result(scenario, started, failure, messages, console_errors);
        info!("{} elapsed for {}", format_elapsed(started.elapsed()), scenario.name);
        (session, result)
    }

    fn result(
        &self,
        scenario: &Scenario,
        started: Instant,
        failure: Option<E2eError>,
        messages: Vec<String>,
        console_errors: Vec<String>,
    ) -> ScenarioResult {
        let outcome = failure.as_ref().map(E2eError::outcome).unwrap_or(Outcome::Passed);
        ScenarioResult {
            id: scenario.id,
            name: scenario.name.to_string(),
            title: scenario.title.to_string(),
            outcome,
            elapsed_ms: started.elapsed().as_millis() as u64,
            error: failure.map(|e| e.to_string()),
            messages,
            console_errors,
        }
    }
}
