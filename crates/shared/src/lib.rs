//! Shared types, errors, and configuration for WAIS.
//!
//! This crate provides common types used across all other crates:
//! - Percentage value type with boundary normalization
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use types::Percent;
