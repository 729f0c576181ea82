//! The music library catalog: its API, its sessions and the ordered suite

pub mod api;
pub mod excel;
pub mod flows;
pub mod scenarios;
pub mod sessions;

pub use api::CatalogApi;
pub use scenarios::suite;
pub use sessions::CatalogSessions;
