//! The browser capability driven by the end-to-end suite

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{DriverError, DriverResult};

/// Key under which W3C WebDriver serialises element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
    Id(String),
    Name(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Locator::XPath(path.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    /// The `(using, value)` pair sent to the driver.
    ///
    /// W3C only knows CSS and XPath strategies (plus link text and tag name),
    /// so id and name lookups become attribute selectors.
    pub fn to_wire(&self) -> (&'static str, String) {
        match self {
            Locator::Css(selector) => ("css selector", selector.clone()),
            Locator::XPath(path) => ("xpath", path.clone()),
            Locator::Id(id) => ("css selector", format!("[id=\"{}\"]", css_escape(id))),
            Locator::Name(name) => ("css selector", format!("[name=\"{}\"]", css_escape(name))),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css:{}", selector),
            Locator::XPath(path) => write!(f, "xpath:{}", path),
            Locator::Id(id) => write!(f, "id:{}", id),
            Locator::Name(name) => write!(f, "name:{}", name),
        }
    }
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Opaque handle to an element in the current browsing context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    /// Parse the element reference object returned by the driver.
    pub fn from_wire(value: &Value) -> DriverResult<Self> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| ElementRef(id.to_string()))
            .ok_or_else(|| DriverError::UnexpectedResponse(format!("not an element: {}", value)))
    }

    /// The reference object, as passed in `execute/sync` arguments.
    pub fn to_wire(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

/// One entry from the browser's console log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: i64,
}

impl LogEntry {
    pub fn is_severe(&self) -> bool {
        self.level.eq_ignore_ascii_case("SEVERE")
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Browser automation capability.
///
/// Every call maps onto one WebDriver command. Implementations are used from a
/// single task at a time; `Send` is required so the suite can hold them across
/// awaits.
#[async_trait]
pub trait Browser: Send {
    /// Load a URL in the current window.
    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Serialised DOM of the current document.
    async fn page_source(&mut self) -> DriverResult<String>;

    async fn current_window(&mut self) -> DriverResult<String>;

    async fn window_handles(&mut self) -> DriverResult<Vec<String>>;

    async fn switch_to_window(&mut self, handle: &str) -> DriverResult<()>;

    /// Close the current window.
    async fn close_window(&mut self) -> DriverResult<()>;

    async fn find_element(&mut self, locator: &Locator) -> DriverResult<ElementRef>;

    async fn find_elements(&mut self, locator: &Locator) -> DriverResult<Vec<ElementRef>>;

    /// Find an element relative to `parent`.
    async fn find_child(&mut self, parent: &ElementRef, locator: &Locator) -> DriverResult<ElementRef>;

    async fn click(&mut self, element: &ElementRef) -> DriverResult<()>;

    async fn clear(&mut self, element: &ElementRef) -> DriverResult<()>;

    /// Type text into an element. Special keys come from [`crate::keys`].
    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> DriverResult<()>;

    async fn is_displayed(&mut self, element: &ElementRef) -> DriverResult<bool>;

    /// Run a synchronous script; `arguments[n]` refers to `args[n]`.
    async fn execute_script(&mut self, script: &str, args: Vec<Value>) -> DriverResult<Value>;

    /// Render the current page as a PDF document.
    async fn print_page(&mut self) -> DriverResult<Vec<u8>>;

    /// Drain the browser console log.
    async fn browser_logs(&mut self) -> DriverResult<Vec<LogEntry>>;

    /// Press on `source`, move to `target` and release there.
    async fn drag_and_drop(&mut self, source: &ElementRef, target: &ElementRef) -> DriverResult<()>;

    /// End the browser session.
    async fn quit(&mut self) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Locator::css("a[href='/library/edit']"), "css selector", "a[href='/library/edit']" ; "css")]
    #[test_case(Locator::xpath("//button[contains(text(), 'Save')]"), "xpath", "//button[contains(text(), 'Save')]" ; "xpath")]
    #[test_case(Locator::id("logout-button"), "css selector", "[id=\"logout-button\"]" ; "id")]
    #[test_case(Locator::name("AccompanimentID"), "css selector", "[name=\"AccompanimentID\"]" ; "name")]
    fn test_locator_wire_strategy(locator: Locator, using: &str, value: &str) {
        let (strategy, selector) = locator.to_wire();
        assert_eq!(strategy, using);
        assert_eq!(selector, value);
    }

    #[test]
    fn test_id_locator_escapes_quotes() {
        let (_, selector) = Locator::id("odd\"id").to_wire();
        assert_eq!(selector, "[id=\"odd\\\"id\"]");
    }

    #[test]
    fn test_element_ref_round_trips_through_wire_object() {
        let element = ElementRef::from_wire(&json!({ ELEMENT_KEY: "f.1.e.7" })).unwrap();
        assert_eq!(element.id(), "f.1.e.7");
        assert_eq!(element.to_wire()[ELEMENT_KEY], "f.1.e.7");
    }

    #[test]
    fn test_element_ref_rejects_other_values() {
        assert!(ElementRef::from_wire(&json!({ "value": 3 })).is_err());
    }

    #[test]
    fn test_severe_log_entries() {
        let entry: LogEntry = serde_json::from_value(json!({
            "level": "SEVERE",
            "message": "https://ml.example.com/library/api/item - Failed to load resource",
            "timestamp": 1733900000000i64,
        }))
        .unwrap();
        assert!(entry.is_severe());
        assert!(entry.to_string().starts_with("[SEVERE]"));

        let info = LogEntry { level: "INFO".into(), message: "ok".into(), timestamp: 0 };
        assert!(!info.is_severe());
    }
}
