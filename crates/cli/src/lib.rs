//! CLI utilities for droidplan
//!
//! Provides shared CLI functionality:
//! - Status messages
//! - Error reports with codes and suggestions
//! - Duration and count formatting

#![warn(missing_docs)]

pub mod output;
