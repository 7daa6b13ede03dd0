//! ThesisDesk Common Library
//!
//! Shared code for the ThesisDesk admin services including:
//! - Database models, the `ThesisStore` seam and its repository
//! - Error types and handling
//! - Configuration management
//! - Authentication and permission checks
//! - Metrics

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{Repository, ThesisStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
