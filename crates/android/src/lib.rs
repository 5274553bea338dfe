//! Android build configuration resolver
//!
//! This crate turns a declarative description of an Android app target into
//! an immutable build plan:
//! - Settings document with a load phase and a sealed phase
//! - SDK level constraint validation
//! - Ordered dependency list
//! - Build variant to signing identity resolution
//! - Gradle plugin ordering
//! - TOML manifests and `build.gradle.kts` import
//!
//! # Example
//!
//! ```rust
//! use droidplan_android::BuildManifest;
//!
//! let manifest = BuildManifest::from_toml_str(r#"
//! [settings]
//! applicationId = "com.example.app"
//! minSdk = 21
//! targetSdk = 33
//! compileSdk = 33
//!
//! [signing]
//! debug = "debug"
//! "#).unwrap();
//!
//! let plan = manifest.compose().unwrap();
//! assert_eq!(plan.application_id, "com.example.app");
//! ```

#![warn(missing_docs)]

pub mod compose;
pub mod constraint;
pub mod dependency;
pub mod document;
pub mod error;
pub mod kts;
pub mod manifest;
pub mod plugins;
pub mod signing;

pub use compose::{BuildPlan, BuildPlanComposer, PlanValue};
pub use constraint::{ConstraintValidator, VersionConstraint};
pub use dependency::{DependencyList, DependencyRef};
pub use document::{ConfigDocument, SettingValue};
pub use error::{PlanError, Result, Stage};
pub use manifest::BuildManifest;
pub use plugins::PluginList;
pub use signing::{SigningIdentity, SigningResolver};
