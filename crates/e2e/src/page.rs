//! Browser helpers used by scenario bodies
//!
//! A [`Page`] is the per-scenario context: it owns the scenario's browser,
//! borrows the run's [`Session`] for the duration of the scenario and routes
//! every content read through the [`ReadinessPoller`].

use std::sync::Arc;

use catalog_webdriver::{keys, Browser, DriverError, ElementRef, Locator};
use serde_json::Value;
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, info};

use crate::config::RunConfig;
use crate::error::{E2eError, E2eResult};
use crate::readiness::{PageSnapshot, ReadinessPoller};
use crate::session::Session;

const SCROLL_ROUNDS: u32 = 5;

const SCROLL_HEIGHT: &str = "return document.body.scrollHeight";
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const SCROLL_OFFSET: &str = "return window.pageYOffset";
const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0);";
const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView(true)";

/// Per-scenario browser context
pub struct Page {
    browser: Box<dyn Browser>,
    session: Session,
    config: Arc<RunConfig>,
    poller: ReadinessPoller,
}

impl Page {
    pub fn new(browser: Box<dyn Browser>, mut session: Session, config: Arc<RunConfig>) -> Self {
        session.open_tabs.clear();
        let poller = ReadinessPoller::new(config.settings.readiness.clone());
        Self {
            browser,
            session,
            config,
            poller,
        }
    }

    /// Hand back the browser and the session once the scenario is over
    pub fn release(self) -> (Box<dyn Browser>, Session) {
        (self.browser, self.session)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Direct access for actions the helpers below don't cover
    pub fn browser(&mut self) -> &mut dyn Browser {
        self.browser.as_mut()
    }

    /// Wait `units` pace units.
    ///
    /// The returned timer borrows nothing from the page.
    pub fn pause(&self, units: u32) -> Sleep {
        sleep(self.config.settings.pace * units)
    }

    // Navigation

    /// Open an absolute URL and remember the window it landed in
    pub async fn navigate_to(&mut self, url: &str) -> E2eResult<String> {
        debug!("navigating to {}", url);
        self.browser.navigate(url).await?;
        let handle = self.browser.current_window().await?;
        self.session.open_tabs.insert(handle.clone());
        self.pause(1).await;
        Ok(handle)
    }

    pub async fn current_window(&mut self) -> E2eResult<String> {
        Ok(self.browser.current_window().await?)
    }

    /// Switch to the first window not in `known`, if there is one
    pub async fn switch_to_other_window(&mut self, known: &[String]) -> E2eResult<Option<String>> {
        let handles = self.browser.window_handles().await?;
        info!("handles={:?} known={:?}", handles, known);
        for handle in handles {
            if !known.contains(&handle) {
                self.browser.switch_to_window(&handle).await?;
                self.session.open_tabs.insert(handle.clone());
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }

    // Reading the page

    /// The current page, once it is ready to be read
    pub async fn snapshot(&mut self) -> E2eResult<PageSnapshot> {
        self.poller.wait_ready(self.browser.as_mut()).await
    }

    pub async fn assert_page_has(&mut self, expected: &str) -> E2eResult<()> {
        let snapshot = self.snapshot().await?;
        if snapshot.contains(expected) {
            Ok(())
        } else {
            Err(E2eError::AssertionFailed(format!("page does not contain {:?}", expected)))
        }
    }

    pub async fn assert_page_not_has(&mut self, unexpected: &str) -> E2eResult<()> {
        let snapshot = self.snapshot().await?;
        if snapshot.contains(unexpected) {
            Err(E2eError::AssertionFailed(format!("page unexpectedly contains {:?}", unexpected)))
        } else {
            Ok(())
        }
    }

    // Finding elements

    pub async fn find(&mut self, locator: &Locator) -> E2eResult<ElementRef> {
        self.browser
            .find_element(locator)
            .await
            .map_err(|e| not_found(e, locator))
    }

    pub async fn find_all(&mut self, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        Ok(self.browser.find_elements(locator).await?)
    }

    pub async fn find_within(&mut self, parent: &ElementRef, locator: &Locator) -> E2eResult<ElementRef> {
        self.browser
            .find_child(parent, locator)
            .await
            .map_err(|e| not_found(e, locator))
    }

    pub async fn is_displayed(&mut self, element: &ElementRef) -> E2eResult<bool> {
        Ok(self.browser.is_displayed(element).await?)
    }

    // Interacting

    pub async fn click(&mut self, locator: &Locator) -> E2eResult<ElementRef> {
        let element = self.find(locator).await?;
        self.browser.click(&element).await?;
        Ok(element)
    }

    /// Click the button whose label contains `label`
    pub async fn click_button(&mut self, label: &str) -> E2eResult<ElementRef> {
        self.click(&button(label)).await
    }

    pub async fn click_element(&mut self, element: &ElementRef) -> E2eResult<()> {
        Ok(self.browser.click(element).await?)
    }

    /// Replace the value of the form field with the given id
    pub async fn set_field_value(&mut self, field_id: &str, value: &str) -> E2eResult<()> {
        let field = self.find(&Locator::id(field_id)).await?;
        self.browser.clear(&field).await?;
        self.browser.send_keys(&field, value).await?;
        Ok(())
    }

    pub async fn type_into(&mut self, element: &ElementRef, text: &str) -> E2eResult<()> {
        Ok(self.browser.send_keys(element, text).await?)
    }

    pub async fn press_tab(&mut self, element: &ElementRef) -> E2eResult<()> {
        Ok(self.browser.send_keys(element, keys::TAB).await?)
    }

    /// Type into a `<select>` to narrow it, then pick the option showing `value`
    pub async fn choose_option(&mut self, field_name: &str, value: &str) -> E2eResult<()> {
        let field = self.find(&Locator::name(field_name)).await?;
        self.browser.send_keys(&field, value).await?;
        self.pause(1).await;
        let option = self
            .find_within(&field, &Locator::xpath(format!(".//option[contains(text(), '{}')]", value)))
            .await?;
        self.browser.click(&option).await?;
        Ok(())
    }

    pub async fn drag_and_drop(&mut self, source: &ElementRef, target: &ElementRef) -> E2eResult<()> {
        Ok(self.browser.drag_and_drop(source, target).await?)
    }

    pub async fn execute_script(&mut self, script: &str, args: Vec<Value>) -> E2eResult<Value> {
        Ok(self.browser.execute_script(script, args).await?)
    }

    // Scrolling

    pub async fn scroll_into_view(&mut self, element: &ElementRef) -> E2eResult<()> {
        self.browser
            .execute_script(SCROLL_INTO_VIEW, vec![element.to_wire()])
            .await?;
        Ok(())
    }

    /// Scroll down until the page stops growing
    pub async fn scroll_to_bottom(&mut self) -> E2eResult<()> {
        self.scroll_until_stable(SCROLL_HEIGHT, SCROLL_TO_BOTTOM).await
    }

    /// Scroll up until the offset stops changing
    pub async fn scroll_to_top(&mut self) -> E2eResult<()> {
        self.scroll_until_stable(SCROLL_OFFSET, SCROLL_TO_TOP).await
    }

    async fn scroll_until_stable(&mut self, probe: &str, scroll: &str) -> E2eResult<()> {
        let mut last = self.browser.execute_script(probe, vec![]).await?;
        for _ in 0..SCROLL_ROUNDS {
            self.browser.execute_script(scroll, vec![]).await?;
            self.pause(2).await;
            let current = self.browser.execute_script(probe, vec![]).await?;
            if current == last {
                break;
            }
            last = current;
        }
        Ok(())
    }

    // Artifacts and diagnostics

    /// Save the rendered page as a PDF in the artifacts directory
    pub async fn save_pdf(&mut self, filename: &str) -> E2eResult<()> {
        let pdf = self.browser.print_page().await?;
        let path = self.config.artifact_path(filename);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, pdf)?;
        debug!("saved {}", path.display());
        Ok(())
    }

    /// Log the browser console and return the severe entries
    pub async fn check_console_errors(&mut self) -> E2eResult<Vec<String>> {
        let mut severe = Vec::new();
        for entry in self.browser.browser_logs().await? {
            if entry.is_severe() {
                error!("{}", entry);
                severe.push(entry.to_string());
            } else {
                info!("{}", entry);
            }
        }
        Ok(severe)
    }
}

/// XPath for a button by (partial) label
pub fn button(label: &str) -> Locator {
    Locator::xpath(format!("//button[contains(text(), '{}')]", label))
}

fn not_found(e: DriverError, locator: &Locator) -> E2eError {
    if e.is_no_such_element() {
        E2eError::ElementNotFound { locator: locator.to_string() }
    } else {
        E2eError::Driver(e)
    }
}
