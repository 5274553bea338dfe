//! Tool configuration loading and schema definitions
//!
//! Settings for the `droidplan` tool itself, as opposed to the build
//! manifests it resolves.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
