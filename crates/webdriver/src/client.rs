//! W3C WebDriver session over HTTP

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::browser::{Browser, ElementRef, Locator, LogEntry};
use crate::error::{DriverError, DriverResult};
use crate::options::ChromeOptions;

/// A live browser session on a WebDriver server
pub struct WebDriver {
    http: reqwest::Client,

    /// WebDriver server URL, e.g. `http://localhost:9515`
    server_url: String,

    session_id: String,

    closed: bool,
}

impl WebDriver {
    /// Start a new Chrome session on the WebDriver server at `server_url`
    pub async fn start(server_url: &str, options: &ChromeOptions) -> DriverResult<Self> {
        let server_url = server_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(options.implicit_wait + Duration::from_secs(40))
            .build()?;

        info!("Starting browser session via {}", server_url);

        let response = http
            .post(format!("{}/session", server_url))
            .json(&options.capabilities())
            .send()
            .await?;
        let value = unwrap_value(response).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::UnexpectedResponse(format!("no sessionId in {}", value)))?
            .to_string();

        debug!("Browser session {} created", session_id);

        let driver = Self {
            http,
            server_url,
            session_id,
            closed: false,
        };
        driver
            .command(Method::POST, "/timeouts", Some(options.timeouts()))
            .await?;

        Ok(driver)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send one command scoped to this session and return its `value`
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> DriverResult<Value> {
        let url = format!("{}/session/{}{}", self.server_url, self.session_id, path);
        debug!("{} {}", method, path);

        let mut request = self.http.request(method.clone(), &url);
        match body {
            Some(body) => request = request.json(&body),
            // POST commands must carry a JSON body even when empty
            None if method == Method::POST => request = request.json(&json!({})),
            None => {}
        }

        let response = request.send().await?;
        unwrap_value(response).await
    }

    async fn find_from(&self, path: &str, locator: &Locator) -> DriverResult<Value> {
        let (using, value) = locator.to_wire();
        self.command(Method::POST, path, Some(json!({ "using": using, "value": value })))
            .await
    }

    fn element_path(element: &ElementRef, suffix: &str) -> String {
        format!("/element/{}{}", element.id(), suffix)
    }
}

/// Split a WebDriver response into its `value` or an error
async fn unwrap_value(response: reqwest::Response) -> DriverResult<Value> {
    let status = response.status();
    let mut payload: Value = response.json().await?;
    let value = payload
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if status.is_success() {
        Ok(value)
    } else {
        Err(DriverError::from_wire(&value))
    }
}

fn as_string(value: Value) -> DriverResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(DriverError::UnexpectedResponse(format!("expected string, got {}", other))),
    }
}

#[async_trait]
impl Browser for WebDriver {
    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn page_source(&mut self) -> DriverResult<String> {
        as_string(self.command(Method::GET, "/source", None).await?)
    }

    async fn current_window(&mut self) -> DriverResult<String> {
        as_string(self.command(Method::GET, "/window", None).await?)
    }

    async fn window_handles(&mut self) -> DriverResult<Vec<String>> {
        let value = self.command(Method::GET, "/window/handles", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn switch_to_window(&mut self, handle: &str) -> DriverResult<()> {
        self.command(Method::POST, "/window", Some(json!({ "handle": handle })))
            .await?;
        Ok(())
    }

    async fn close_window(&mut self) -> DriverResult<()> {
        self.command(Method::DELETE, "/window", None).await?;
        Ok(())
    }

    async fn find_element(&mut self, locator: &Locator) -> DriverResult<ElementRef> {
        let value = self.find_from("/element", locator).await?;
        ElementRef::from_wire(&value)
    }

    async fn find_elements(&mut self, locator: &Locator) -> DriverResult<Vec<ElementRef>> {
        let value = self.find_from("/elements", locator).await?;
        match value {
            Value::Array(items) => items.iter().map(ElementRef::from_wire).collect(),
            other => Err(DriverError::UnexpectedResponse(format!("expected array, got {}", other))),
        }
    }

    async fn find_child(&mut self, parent: &ElementRef, locator: &Locator) -> DriverResult<ElementRef> {
        let path = Self::element_path(parent, "/element");
        let value = self.find_from(&path, locator).await?;
        ElementRef::from_wire(&value)
    }

    async fn click(&mut self, element: &ElementRef) -> DriverResult<()> {
        self.command(Method::POST, &Self::element_path(element, "/click"), None)
            .await?;
        Ok(())
    }

    async fn clear(&mut self, element: &ElementRef) -> DriverResult<()> {
        self.command(Method::POST, &Self::element_path(element, "/clear"), None)
            .await?;
        Ok(())
    }

    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> DriverResult<()> {
        self.command(
            Method::POST,
            &Self::element_path(element, "/value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn is_displayed(&mut self, element: &ElementRef) -> DriverResult<bool> {
        let value = self
            .command(Method::GET, &Self::element_path(element, "/displayed"), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn execute_script(&mut self, script: &str, args: Vec<Value>) -> DriverResult<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn print_page(&mut self) -> DriverResult<Vec<u8>> {
        let encoded = as_string(self.command(Method::POST, "/print", None).await?)?;
        Ok(base64::engine::general_purpose::STANDARD.decode(encoded)?)
    }

    async fn browser_logs(&mut self) -> DriverResult<Vec<LogEntry>> {
        // chromedriver keeps the legacy log endpoint under the `se` prefix
        let value = self
            .command(Method::POST, "/se/log", Some(json!({ "type": "browser" })))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn drag_and_drop(&mut self, source: &ElementRef, target: &ElementRef) -> DriverResult<()> {
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "mouse",
                "parameters": { "pointerType": "mouse" },
                "actions": [
                    { "type": "pointerMove", "origin": source.to_wire(), "x": 0, "y": 0 },
                    { "type": "pointerDown", "button": 0 },
                    { "type": "pause", "duration": 100 },
                    { "type": "pointerMove", "origin": target.to_wire(), "x": 0, "y": 0, "duration": 250 },
                    { "type": "pointerUp", "button": 0 },
                ],
            }]
        });
        self.command(Method::POST, "/actions", Some(actions)).await?;
        self.command(Method::DELETE, "/actions", None).await?;
        Ok(())
    }

    async fn quit(&mut self) -> DriverResult<()> {
        if self.closed {
            return Ok(());
        }
        debug!("Ending browser session {}", self.session_id);
        let url = format!("{}/session/{}", self.server_url, self.session_id);
        let response = self.http.delete(&url).send().await?;
        self.closed = true;
        unwrap_value(response).await?;
        Ok(())
    }
}

impl Drop for WebDriver {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                "Browser session {} dropped without quit; the window stays open",
                self.session_id
            );
        }
    }
}
