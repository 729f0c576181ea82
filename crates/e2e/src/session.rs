//! The authenticated session shared by a run

use std::collections::BTreeSet;

use async_trait::async_trait;
use catalog_webdriver::Browser;

use crate::config::{Credentials, RunConfig};
use crate::error::E2eResult;
use crate::page::Page;

/// One authenticated login context spanning the whole suite.
///
/// Owned by the runner and lent to exactly one scenario at a time.
#[derive(Debug, Clone)]
pub struct Session {
    pub started_at: chrono::DateTime<chrono::Local>,
    pub credentials: Credentials,
    pub base_url: String,

    /// Account name reported by the server at login
    pub account: Option<String>,

    /// Window handles opened by the current scenario
    pub open_tabs: BTreeSet<String>,
}

impl Session {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            started_at: chrono::Local::now(),
            credentials: config.credentials.clone(),
            base_url: config.settings.base_url.clone(),
            account: None,
            open_tabs: BTreeSet::new(),
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }
}

/// Binds the runner to the application under test.
///
/// The runner owns ordering, timing and teardown guarantees; the factory
/// knows how to log in and out of a particular application.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Authenticate for the whole run.
    ///
    /// Must fail with `E2eError::Authentication` when the login is refused;
    /// no scenario runs in that case.
    async fn open_session(&self, config: &RunConfig) -> E2eResult<Session>;

    /// A fresh browser for one scenario.
    async fn launch_browser(&self, session: &Session) -> E2eResult<Box<dyn Browser>>;

    /// Log the scenario's browser in with the session's credentials.
    async fn sign_in(&self, page: &mut Page) -> E2eResult<()>;

    /// Return to the top of the page, log out and check the logout markers.
    async fn sign_out(&self, page: &mut Page) -> E2eResult<()>;

    /// End the suite-wide session.
    async fn close_session(&self, session: Session) -> E2eResult<()>;
}
