//! Scenario runner behaviour against an in-memory browser
//!
//! The fake browser serves a tiny catalog: `fake://create/<title>` and
//! `fake://delete/<title>` change the records, `fake://list` shows them.
//! Everything the runner and the fakes do is written to one event log.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::{json, Value};

use catalog_e2e::config::{Credentials, RunConfig, Settings};
use catalog_e2e::{E2eError, E2eResult, Outcome, Page, ReadinessPolicy, Scenario, ScenarioRunner, ScenarioSet, Session, SessionFactory};
use catalog_webdriver::{Browser, DriverError, DriverResult, ElementRef, Locator, LogEntry};

#[derive(Default)]
struct Catalog {
    events: Vec<String>,
    records: Vec<String>,
    console: Vec<LogEntry>,
    refuse_login: bool,
    fail_launch: bool,
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<Catalog>>);

impl Shared {
    fn event(&self, event: impl Into<String>) {
        self.0.lock().events.push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.0.lock().events.clone()
    }

    fn count(&self, event: &str) -> usize {
        self.0.lock().events.iter().filter(|e| *e == event).count()
    }
}

fn html(body: &str) -> String {
    format!("<html><head></head><body>{}</body></html>", body)
}

struct FakeBrowser {
    catalog: Shared,
    source: String,
    next_element: u32,
}

impl FakeBrowser {
    fn new(catalog: Shared) -> Self {
        Self {
            catalog,
            source: String::new(),
            next_element: 0,
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.catalog.event(format!("navigate {}", url));
        let mut catalog = self.catalog.0.lock();
        self.source = if let Some(title) = url.strip_prefix("fake://create/") {
            catalog.records.push(title.to_string());
            html(&format!("Successfully saved {}", title))
        } else if let Some(title) = url.strip_prefix("fake://delete/") {
            catalog.records.retain(|r| r != title);
            html(&format!("Successfully deleted {}", title))
        } else if url == "fake://list" {
            html(&catalog.records.join("<br>"))
        } else if url == "fake://library" {
            html("<h1>Browse Catalog</h1>")
        } else if url == "fake://logout" {
            html("Thanks for spending quality time. <a>Log In</a>")
        } else if url == "fake://broken" {
            "<html><body><div>half a page".to_string()
        } else if url == "fake://console-error" {
            catalog.console.push(LogEntry {
                level: "SEVERE".to_string(),
                message: "Uncaught TypeError: x is undefined".to_string(),
                timestamp: 0,
            });
            html("scripted page")
        } else {
            html(url)
        };
        Ok(())
    }

    async fn page_source(&mut self) -> DriverResult<String> {
        Ok(self.source.clone())
    }

    async fn current_window(&mut self) -> DriverResult<String> {
        Ok("window-0".to_string())
    }

    async fn window_handles(&mut self) -> DriverResult<Vec<String>> {
        Ok(vec!["window-0".to_string()])
    }

    async fn switch_to_window(&mut self, _handle: &str) -> DriverResult<()> {
        Ok(())
    }

    async fn close_window(&mut self) -> DriverResult<()> {
        Ok(())
    }

    async fn find_element(&mut self, locator: &Locator) -> DriverResult<ElementRef> {
        if locator.to_string().contains("missing") {
            return Err(DriverError::NoSuchElement(locator.to_string()));
        }
        self.next_element += 1;
        Ok(ElementRef(format!("element-{}", self.next_element)))
    }

    async fn find_elements(&mut self, locator: &Locator) -> DriverResult<Vec<ElementRef>> {
        Ok(self.find_element(locator).await.into_iter().collect())
    }

    async fn find_child(&mut self, _parent: &ElementRef, locator: &Locator) -> DriverResult<ElementRef> {
        self.find_element(locator).await
    }

    async fn click(&mut self, element: &ElementRef) -> DriverResult<()> {
        self.catalog.event(format!("click {}", element.id()));
        Ok(())
    }

    async fn clear(&mut self, _element: &ElementRef) -> DriverResult<()> {
        Ok(())
    }

    async fn send_keys(&mut self, _element: &ElementRef, _text: &str) -> DriverResult<()> {
        Ok(())
    }

    async fn is_displayed(&mut self, _element: &ElementRef) -> DriverResult<bool> {
        Ok(true)
    }

    async fn execute_script(&mut self, _script: &str, _args: Vec<Value>) -> DriverResult<Value> {
        // A page that never scrolls: height and offset stay put
        Ok(json!(0))
    }

    async fn print_page(&mut self) -> DriverResult<Vec<u8>> {
        Ok(b"%PDF-1.4".to_vec())
    }

    async fn browser_logs(&mut self) -> DriverResult<Vec<LogEntry>> {
        self.catalog.event("console");
        Ok(std::mem::take(&mut self.catalog.0.lock().console))
    }

    async fn drag_and_drop(&mut self, _source: &ElementRef, _target: &ElementRef) -> DriverResult<()> {
        Ok(())
    }

    async fn quit(&mut self) -> DriverResult<()> {
        self.catalog.event("quit");
        Ok(())
    }
}

struct FakeFactory {
    catalog: Shared,
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open_session(&self, config: &RunConfig) -> E2eResult<Session> {
        self.catalog.event("open_session");
        if self.catalog.0.lock().refuse_login {
            return Err(E2eError::Authentication("Invalid credentials".to_string()));
        }
        Ok(Session::new(config).with_account("klem"))
    }

    async fn launch_browser(&self, _session: &Session) -> E2eResult<Box<dyn Browser>> {
        if self.catalog.0.lock().fail_launch {
            return Err(E2eError::Driver(DriverError::SessionNotCreated("chrome not reachable".to_string())));
        }
        self.catalog.event("launch");
        Ok(Box::new(FakeBrowser::new(self.catalog.clone())))
    }

    async fn sign_in(&self, page: &mut Page) -> E2eResult<()> {
        self.catalog.event("sign_in");
        page.navigate_to("fake://library").await?;
        page.assert_page_has("Browse Catalog").await
    }

    async fn sign_out(&self, page: &mut Page) -> E2eResult<()> {
        self.catalog.event("sign_out");
        page.scroll_to_top().await?;
        page.navigate_to("fake://logout").await?;
        page.assert_page_has("Thanks for spending quality time").await?;
        page.assert_page_has("Log In").await
    }

    async fn close_session(&self, _session: Session) -> E2eResult<()> {
        self.catalog.event("close_session");
        Ok(())
    }
}

// Scenario bodies

fn create_item(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.navigate_to("fake://create/Test Item").await?;
        page.assert_page_has("Successfully saved Test Item").await
    }
    .boxed()
}

fn delete_item(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.navigate_to("fake://delete/Test Item").await?;
        page.assert_page_has("Successfully deleted").await
    }
    .boxed()
}

fn expect_item(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.navigate_to("fake://list").await?;
        page.assert_page_has("Test Item").await
    }
    .boxed()
}

fn click_missing_button(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.click(&Locator::id("missing-button")).await?;
        Ok(())
    }
    .boxed()
}

fn open_broken_page(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.navigate_to("fake://broken").await?;
        page.assert_page_has("anything").await
    }
    .boxed()
}

fn trigger_console_error(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.navigate_to("fake://console-error").await?;
        page.assert_page_has("scripted page").await
    }
    .boxed()
}

fn paced_create(page: &mut Page) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        page.pause(2).await;
        page.navigate_to("fake://create/Test Item").await?;
        page.pause(1).await;
        page.assert_page_has("Successfully saved Test Item").await
    }
    .boxed()
}

fn scenario(id: u32, name: &'static str, requires: &'static [&'static str], body: catalog_e2e::scenario::ScenarioBody) -> Scenario {
    Scenario {
        id,
        name,
        title: "",
        requires,
        body,
    }
}

fn config(continue_on_failure: bool) -> Arc<RunConfig> {
    let settings = Settings {
        base_url: "fake://".to_string(),
        pace: Duration::ZERO,
        continue_on_failure,
        readiness: ReadinessPolicy {
            attempts: 3,
            settle: Duration::ZERO,
            backoff_unit: Duration::ZERO,
        },
        ..Settings::default()
    };
    Arc::new(RunConfig::new(Credentials::new("klem", "secret"), settings))
}

fn setup() -> (Shared, FakeFactory) {
    let catalog = Shared::default();
    let factory = FakeFactory {
        catalog: catalog.clone(),
    };
    (catalog, factory)
}

#[tokio::test(start_paused = true)]
async fn test_scenarios_run_in_order_with_one_teardown_each() {
    let (catalog, factory) = setup();
    let scenarios = vec![
        scenario(1, "create_item", &[], create_item),
        scenario(2, "expect_item", &["create_item"], expect_item),
        scenario(3, "click_missing_button", &[], click_missing_button),
    ];

    let report = ScenarioRunner::new(config(true)).run_suite(&scenarios, &factory).await.unwrap();

    let ids: Vec<u32> = report.results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let outcomes: Vec<Outcome> = report.results.iter().map(|r| r.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Passed, Outcome::Passed, Outcome::Failed]);
    assert_eq!((report.passed, report.failed, report.errored, report.skipped), (2, 1, 0, 0));
    assert!(!report.success());

    assert_eq!(catalog.count("launch"), 3);
    assert_eq!(catalog.count("sign_out"), 3);
    assert_eq!(catalog.count("console"), 3);
    assert_eq!(catalog.count("quit"), 3);

    let events = catalog.events();
    assert_eq!(events.first().map(String::as_str), Some("open_session"));
    assert_eq!(events.last().map(String::as_str), Some("close_session"));
    assert_eq!(catalog.count("open_session"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_follows_a_failing_body() {
    let (catalog, factory) = setup();
    let scenarios = vec![scenario(1, "click_missing_button", &[], click_missing_button)];

    let report = ScenarioRunner::new(config(true)).run_suite(&scenarios, &factory).await.unwrap();

    let result = &report.results[0];
    assert_eq!(result.outcome, Outcome::Failed);
    assert!(result.error.as_deref().unwrap_or_default().contains("missing-button"));

    let lifecycle: Vec<String> = catalog
        .events()
        .into_iter()
        .filter(|e| ["launch", "sign_in", "sign_out", "console", "quit"].contains(&e.as_str()))
        .collect();
    assert_eq!(lifecycle, vec!["launch", "sign_in", "sign_out", "console", "quit"]);
}

#[tokio::test(start_paused = true)]
async fn test_refused_login_runs_nothing() {
    let (catalog, factory) = setup();
    catalog.0.lock().refuse_login = true;
    let scenarios = vec![scenario(1, "create_item", &[], create_item)];

    let err = ScenarioRunner::new(config(true)).run_suite(&scenarios, &factory).await.unwrap_err();

    assert!(matches!(err, E2eError::Authentication(_)));
    assert!(err.is_fatal());
    assert_eq!(catalog.count("launch"), 0);
    assert_eq!(catalog.count("close_session"), 0);
    assert!(catalog.0.lock().records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deleted_record_cascades_into_later_failure() {
    let (_catalog, factory) = setup();
    let scenarios = vec![
        scenario(1, "create_item", &[], create_item),
        scenario(2, "delete_item", &["create_item"], delete_item),
        scenario(3, "expect_item", &["create_item"], expect_item),
    ];

    let report = ScenarioRunner::new(config(true)).run_suite(&scenarios, &factory).await.unwrap();

    let outcomes: Vec<Outcome> = report.results.iter().map(|r| r.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Passed, Outcome::Passed, Outcome::Failed]);
    assert!(report.results[2].error.as_deref().unwrap_or_default().contains("Test Item"));
}

#[tokio::test(start_paused = true)]
async fn test_fail_fast_counts_the_rest_as_skipped() {
    let (catalog, factory) = setup();
    let scenarios = vec![
        scenario(1, "click_missing_button", &[], click_missing_button),
        scenario(2, "create_item", &[], create_item),
        scenario(3, "expect_item", &["create_item"], expect_item),
    ];

    let report = ScenarioRunner::new(config(false)).run_suite(&scenarios, &factory).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!((report.total, report.failed, report.skipped), (3, 1, 2));
    assert_eq!(catalog.count("launch"), 1);
    assert_eq!(catalog.count("close_session"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_page_that_never_renders_is_an_error() {
    let (catalog, factory) = setup();
    let scenarios = vec![
        scenario(1, "open_broken_page", &[], open_broken_page),
        scenario(2, "create_item", &[], create_item),
    ];

    let report = ScenarioRunner::new(config(true)).run_suite(&scenarios, &factory).await.unwrap();

    let broken = &report.results[0];
    assert_eq!(broken.outcome, Outcome::Errored);
    assert!(broken.error.as_deref().unwrap_or_default().contains("never became ready"));
    assert_eq!(report.results[1].outcome, Outcome::Passed);
    assert_eq!(catalog.count("quit"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_browser_that_never_starts_gets_no_teardown() {
    let (catalog, factory) = setup();
    catalog.0.lock().fail_launch = true;
    let scenarios = vec![scenario(1, "create_item", &[], create_item)];

    let report = ScenarioRunner::new(config(true)).run_suite(&scenarios, &factory).await.unwrap();

    assert_eq!(report.results[0].outcome, Outcome::Errored);
    assert_eq!(catalog.count("sign_in"), 0);
    assert_eq!(catalog.count("sign_out"), 0);
    assert_eq!(catalog.count("close_session"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_severe_console_entries_are_recorded() {
    let (_catalog, factory) = setup();
    let scenarios = vec![scenario(1, "trigger_console_error", &[], trigger_console_error)];

    let report = ScenarioRunner::new(config(true)).run_suite(&scenarios, &factory).await.unwrap();

    let result = &report.results[0];
    assert_eq!(result.outcome, Outcome::Passed);
    assert_eq!(result.console_errors.len(), 1);
    assert!(result.console_errors[0].starts_with("[SEVERE]"));
}

#[tokio::test(start_paused = true)]
async fn test_selection_runs_in_registration_order() {
    let (catalog, factory) = setup();
    let set = ScenarioSet::new()
        .register(scenario(1, "create_item", &[], create_item))
        .and_then(|s| s.register(scenario(2, "delete_item", &["create_item"], delete_item)))
        .and_then(|s| s.register(scenario(3, "expect_item", &["create_item"], expect_item)))
        .unwrap();

    let selected = set.select(&["expect_item".to_string(), "create_item".to_string()]).unwrap();
    let report = ScenarioRunner::new(config(true)).run_suite(&selected, &factory).await.unwrap();

    let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["create_item", "expect_item"]);
    assert!(report.success());
    assert_eq!(catalog.count("navigate fake://delete/Test Item"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_settle_and_pace_delays_are_awaited() {
    let (_catalog, factory) = setup();
    let settings = Settings {
        base_url: "fake://".to_string(),
        pace: Duration::from_secs(1),
        ..Settings::default()
    };
    let config = Arc::new(RunConfig::new(Credentials::new("klem", "secret"), settings));
    let scenarios = vec![scenario(1, "create_item", &[], create_item)];

    let started = tokio::time::Instant::now();
    let report = ScenarioRunner::new(config).run_suite(&scenarios, &factory).await.unwrap();
    assert!(report.success());

    // Each of the four reads waits the 2 s settle delay and each of the three
    // navigations one pace unit; teardown adds a scroll round of two units.
    assert_eq!(started.elapsed(), Duration::from_secs(4 * 2 + 3 + 2));
}

#[tokio::test(start_paused = true)]
async fn test_scenario_body_runs_on_a_spawned_task() {
    let (catalog, _factory) = setup();
    let config = config(true);
    let browser: Box<dyn Browser> = Box::new(FakeBrowser::new(catalog.clone()));
    let session = Session::new(&config);

    let task = tokio::spawn(async move {
        let mut page = Page::new(browser, session, config);
        let body: catalog_e2e::scenario::ScenarioBody = paced_create;
        body(&mut page).await
    });

    task.await.unwrap().unwrap();
    assert_eq!(catalog.0.lock().records, vec!["Test Item".to_string()]);
}
