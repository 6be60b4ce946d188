//! # typed-forms-core
//!
//! Core types shared by the typed-forms crates: the backend-agnostic
//! [`Value`] type, error types, settings, and logging setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`value`] - The [`Value`] enum used for raw input and cast field values
//! - [`settings`] - Casting and logging configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use error::{FormsError, FormsResult, ValidationError};
pub use settings::FormSettings;
pub use value::Value;
