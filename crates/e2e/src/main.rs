//! Catalog E2E - command-line entry point
//!
//! Runs the ordered catalog suite against a live server through chromedriver
//! and exits 0 when every scenario passed, 1 when any did not, 2 when the run
//! could not start (bad configuration, refused login).

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::error;

use catalog_e2e::catalog::{self, CatalogSessions};
use catalog_e2e::config::{Credentials, RunConfig, Settings};
use catalog_e2e::logging;
use catalog_e2e::report::SuiteReport;
use catalog_e2e::runner::ScenarioRunner;

/// End-to-end browser tests for the Music Library Catalog
#[derive(Parser)]
#[command(name = "catalog-e2e")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Account with write access to the catalog
    #[arg(short, long, env = "CATALOG_USERNAME")]
    username: String,

    /// Password for that account
    #[arg(short, long, env = "CATALOG_PASSWORD", hide_env_values = true)]
    password: String,

    /// Catalog server (default https://ml.rksystems.com)
    #[arg(short, long)]
    base: Option<String>,

    /// Log browser console output and debug detail
    #[arg(short, long)]
    verbose: bool,

    /// Run only these scenarios (name, test_NN_name or number)
    #[arg(short, long, num_args = 0..)]
    tests: Vec<String>,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// WebDriver server URL
    #[arg(long)]
    webdriver: Option<String>,

    /// Run Chrome without a window
    #[arg(long)]
    headless: bool,

    /// Stop at the first scenario that does not pass
    #[arg(long)]
    fail_fast: bool,

    /// Run log (appended to)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Directory for PDF snapshots
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Write a JSON report of the run here
    #[arg(long)]
    results: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
            None => Settings::default(),
        };

        if let Some(base) = self.base {
            settings.base_url = base.trim_end_matches('/').to_string();
        }
        if let Some(webdriver) = self.webdriver {
            settings.webdriver_url = webdriver;
        }
        if self.headless {
            settings.headless = true;
        }
        if self.fail_fast {
            settings.continue_on_failure = false;
        }
        if let Some(log_file) = self.log_file {
            settings.log_path = log_file;
        }
        if let Some(artifacts) = self.artifacts {
            settings.artifacts_dir = artifacts;
        }
        if self.results.is_some() {
            settings.results_path = self.results;
        }

        let mut config = RunConfig::new(Credentials::new(self.username, self.password), settings);
        config.verbose = self.verbose;
        config.selected = self.tests;
        Ok(config)
    }
}

async fn run(config: Arc<RunConfig>) -> anyhow::Result<SuiteReport> {
    let selected = catalog::suite()?.select(&config.selected)?;
    let factory = CatalogSessions::new(config.clone())?;
    let runner = ScenarioRunner::new(config.clone());

    let report = runner.run_suite(&selected, &factory).await?;

    if let Some(path) = &config.settings.results_path {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.into_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(2);
        }
    };

    // Held to the end of main: dropping it flushes the run log
    let _log_guard = match logging::init(&config.settings.log_path, config.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: could not open {}: {}", config.settings.log_path.display(), e);
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Could not start the async runtime: {}", e);
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(config)) {
        Ok(report) if report.success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
