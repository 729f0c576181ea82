//! Catalog E2E - end-to-end browser tests for the Music Library Catalog
//!
//! A small harness plus the catalog suite that runs on it:
//! - Logs in once for the whole run and hands the session to one scenario at a time
//! - Runs scenarios strictly in registration order, each in a fresh browser
//! - Always tears a scenario down (logout, console scan, browser shutdown)
//! - Waits for a page to finish rendering before any assertion reads it
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ScenarioRunner                         │
//! │    ├── SessionFactory::open_session()     (once)            │
//! │    ├── for each Scenario, in order:                         │
//! │    │     ├── launch_browser() -> Page                       │
//! │    │     ├── sign_in(), body(&mut Page)                     │
//! │    │     ├── sign_out(), check_console_errors()  (always)   │
//! │    │     └── quit browser, record ScenarioResult            │
//! │    └── SessionFactory::close_session()    (once)            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page                                                       │
//! │    ├── snapshot() ── ReadinessPoller ── Browser::page_source│
//! │    └── find / click / set_field_value / save_pdf / ...      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod page;
pub mod readiness;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod session;

pub use config::{Credentials, RunConfig, Settings};
pub use error::{E2eError, E2eResult};
pub use page::Page;
pub use readiness::{PageSnapshot, PageState, ReadinessPoller, ReadinessPolicy};
pub use report::{Outcome, ScenarioResult, SuiteReport};
pub use runner::ScenarioRunner;
pub use scenario::{Scenario, ScenarioSet};
pub use session::{Session, SessionFactory};
