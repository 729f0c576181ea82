//! Error types for the WebDriver client

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("No such element: {0}")]
    NoSuchElement(String),

    #[error("No such window: {0}")]
    NoSuchWindow(String),

    #[error("Session not created: {0}")]
    SessionNotCreated(String),

    #[error("WebDriver error `{error}`: {message}")]
    Protocol { error: String, message: String },

    #[error("Unexpected WebDriver response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type DriverResult<T> = Result<T, DriverError>;

impl DriverError {
    /// Build an error from the `value` of a failed WebDriver response.
    ///
    /// The W3C protocol reports failures as `{"error": code, "message": text}`.
    pub fn from_wire(value: &Value) -> Self {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match error.as_str() {
            "no such element" => DriverError::NoSuchElement(message),
            "no such window" => DriverError::NoSuchWindow(message),
            "session not created" => DriverError::SessionNotCreated(message),
            _ => DriverError::Protocol { error, message },
        }
    }

    pub fn is_no_such_element(&self) -> bool {
        matches!(self, DriverError::NoSuchElement(_))
    }
}
