//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Output format for composed build plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// TOML document
    Toml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(format!("unknown output format '{}' (expected text, json or toml)", other)),
        }
    }
}

/// Resolver behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Default manifest path when none is given on the command line
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Default output format for `plan`
    #[serde(default)]
    pub format: OutputFormat,

    /// Promote plan warnings to errors
    #[serde(default)]
    pub strict: bool,

    /// Build variants every plan must be able to sign
    #[serde(default = "default_variants")]
    pub variants: Vec<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            format: OutputFormat::default(),
            strict: false,
            variants: default_variants(),
        }
    }
}

fn default_manifest() -> String {
    "droidplan.toml".to_string()
}

fn default_variants() -> Vec<String> {
    vec!["debug".to_string(), "release".to_string()]
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,

    /// Write log events as JSON lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}
