//! # auxilium-core
//!
//! Core types for django-auxilium-rs: the error taxonomy shared by the decorator
//! and caching machinery, settings with file and environment loading, and
//! tracing-based logging setup.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Naming conventions and detection switches
//! - [`settings_loader`] - TOML / JSON / environment loading
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{AuxiliumError, AuxiliumResult, BoxError, ErrorPhase};
pub use settings::{Settings, SETTINGS};
