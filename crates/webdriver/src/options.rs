//! Chrome session capabilities

use std::time::Duration;

use serde_json::{json, Value};

/// Options for launching Chrome (or Chrome for Testing) through chromedriver
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Let Chrome write its own console logging to the terminal
    pub console_logging: bool,

    /// How long element lookups wait for a match before failing
    pub implicit_wait: Duration,

    /// Initial window size (width, height)
    pub window_size: Option<(u32, u32)>,

    /// Extra command-line switches for Chrome
    pub args: Vec<String>,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: false,
            console_logging: false,
            implicit_wait: Duration::from_secs(20),
            window_size: None,
            args: Vec::new(),
        }
    }
}

impl ChromeOptions {
    /// Capabilities document for `POST /session`.
    pub fn capabilities(&self) -> Value {
        let mut args = self.args.clone();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some((width, height)) = self.window_size {
            args.push(format!("--window-size={},{}", width, height));
        }

        let mut chrome = json!({ "args": args });
        if !self.console_logging {
            chrome["excludeSwitches"] = json!(["enable-logging"]);
        }

        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": chrome,
                    "goog:loggingPrefs": { "browser": "ALL" },
                }
            }
        })
    }

    /// Body for `POST /session/{id}/timeouts`.
    pub fn timeouts(&self) -> Value {
        json!({ "implicit": self.implicit_wait.as_millis() as u64 })
    }
}
