//! WebDriver client for the catalog end-to-end suite
//!
//! A thin W3C WebDriver client speaking JSON over HTTP to chromedriver.
//! The suite only depends on the [`Browser`] trait; [`WebDriver`] is the
//! production implementation and tests substitute in-memory fakes.
//!
//! ```text
//! ┌──────────────┐  Browser trait   ┌───────────┐  HTTP/JSON  ┌──────────────┐
//! │ catalog-e2e  │ ───────────────▶ │ WebDriver │ ──────────▶ │ chromedriver │
//! └──────────────┘                  └───────────┘             └──────────────┘
//! ```

pub mod browser;
pub mod client;
pub mod error;
pub mod keys;
pub mod options;

pub use browser::{Browser, ElementRef, Locator, LogEntry};
pub use client::WebDriver;
pub use error::{DriverError, DriverResult};
pub use options::ChromeOptions;
