//! Core utilities for droidplan
//!
//! This crate provides shared functionality used by the resolver and the CLI:
//!
//! - **Error handling**: Errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based tool configuration with defaults
//! - **Validation**: Fluent validator collecting errors and warnings
//!
//! # Example
//!
//! ```rust,no_run
//! use droidplan_core::config::Config;
//!
//! let config = Config::load(None).expect("Invalid configuration");
//! println!("Default manifest: {}", config.schema.tool.manifest);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, OutputFormat};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::validation::{ValidationResult, Validator};
}
