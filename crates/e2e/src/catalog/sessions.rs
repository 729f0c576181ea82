//! Login and logout against the catalog

use std::sync::Arc;

use async_trait::async_trait;
use catalog_webdriver::{Browser, Locator, WebDriver};
use tracing::info;

use super::api::CatalogApi;
use crate::config::RunConfig;
use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::report::format_elapsed;
use crate::session::{Session, SessionFactory};

/// Landing text after a successful UI login
const LOGGED_IN: &str = "Browse Catalog";

/// Texts shown once the UI has logged out
const LOGGED_OUT: [&str; 2] = ["Thanks for spending quality time", "Log In"];

/// [`SessionFactory`] for the music library catalog.
///
/// The suite-wide session goes through the JSON API; every scenario's
/// browser then logs in through the login form.
pub struct CatalogSessions {
    config: Arc<RunConfig>,
    api: CatalogApi,
}

impl CatalogSessions {
    pub fn new(config: Arc<RunConfig>) -> E2eResult<Self> {
        let api = CatalogApi::new(config.api_url())?;
        Ok(Self { config, api })
    }
}

#[async_trait]
impl SessionFactory for CatalogSessions {
    async fn open_session(&self, config: &RunConfig) -> E2eResult<Session> {
        let account = self.api.login(&config.credentials).await?;
        if account.readonly {
            return Err(E2eError::Authentication(format!(
                "account {} is read-only; the suite creates and deletes records",
                account.name
            )));
        }
        info!(
            "Logged in to {} as {}",
            self.api.api_url(),
            account.fullname.as_deref().unwrap_or(&account.name)
        );
        Ok(Session::new(config).with_account(account.name))
    }

    async fn launch_browser(&self, _session: &Session) -> E2eResult<Box<dyn Browser>> {
        let driver = WebDriver::start(&self.config.settings.webdriver_url, &self.config.chrome_options()).await?;
        Ok(Box::new(driver))
    }

    async fn sign_in(&self, page: &mut Page) -> E2eResult<()> {
        let url = page.config().catalog_url();
        let credentials = page.session().credentials.clone();

        page.navigate_to(&url).await?;
        page.set_field_value("username", &credentials.username).await?;
        page.set_field_value("password", &credentials.password).await?;
        page.click_button("Login").await?;
        page.assert_page_has(LOGGED_IN).await
    }

    async fn sign_out(&self, page: &mut Page) -> E2eResult<()> {
        page.pause(2).await;
        page.scroll_to_top().await?;
        page.click(&Locator::id("logout-button")).await?;
        page.save_pdf("logout.pdf").await?;
        for marker in LOGGED_OUT {
            page.assert_page_has(marker).await?;
        }
        Ok(())
    }

    async fn close_session(&self, session: Session) -> E2eResult<()> {
        self.api.logout().await?;
        let elapsed = (chrono::Local::now() - session.started_at).to_std().unwrap_or_default();
        info!(
            "Logged out {} after {}",
            session.account.as_deref().unwrap_or(&session.credentials.username),
            format_elapsed(elapsed)
        );
        Ok(())
    }
}
