#![forbid(unsafe_code)]

//! Core domain model and business logic for Liftlog.
//!
//! This crate provides:
//! - Domain types (workouts, exercises, sets)
//! - The SQLite store and its transactional workout operations
//! - Windowed summary and progression-candidate queries
//! - Progression evaluation and application
//! - Request validation, configuration and logging setup

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod validation;
pub mod store;
pub mod workouts;
pub mod sets;
pub mod summary;
pub mod progression;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::Store;
pub use summary::write_summary_csv;
pub use progression::{evaluate, evaluate_all};
