//! HTTP service for AI-content detection and PowerPoint modification.

pub mod api;
pub mod config;
pub mod files;
pub mod logging;
pub mod validate;

pub use api::{router, AppState};
pub use config::Settings;
