//! Error types for the end-to-end suite

use catalog_webdriver::DriverError;
use thiserror::Error;

use crate::readiness::PageState;
use crate::report::Outcome;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Page never became ready after {attempts} attempts (last state: {last_state})")]
    PageNotReady { attempts: u32, last_state: PageState },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("Catalog API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid scenario transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Browser error: {0}")]
    Driver(#[from] DriverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spreadsheet error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

impl E2eError {
    /// How a scenario ending with this error is recorded.
    ///
    /// Missing text and missing elements are test failures; everything else
    /// means the scenario could not be carried out.
    pub fn outcome(&self) -> Outcome {
        match self {
            E2eError::AssertionFailed(_) | E2eError::ElementNotFound { .. } => Outcome::Failed,
            E2eError::Driver(e) if e.is_no_such_element() => Outcome::Failed,
            _ => Outcome::Errored,
        }
    }

    /// Fatal to the whole suite rather than to one scenario.
    pub fn is_fatal(&self) -> bool {
        matches!(self, E2eError::Authentication(_) | E2eError::Config(_))
    }
}

/// Assert a condition, failing the current scenario with `message`.
pub fn ensure(condition: bool, message: impl Into<String>) -> E2eResult<()> {
    if condition {
        Ok(())
    } else {
        Err(E2eError::AssertionFailed(message.into()))
    }
}
