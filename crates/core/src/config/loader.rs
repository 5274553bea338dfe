//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path, a standard location, or defaults
    ///
    /// An explicitly given path must exist; standard locations are optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => return Err(Error::config_not_found(p)),
            Some(p) => Some(p.to_path_buf()),
            None => find_config_file(Path::new(".")),
        };

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        Ok(Self {
            schema,
            path: config_path,
        })
    }
}

/// Find configuration file in standard locations under `root`
fn find_config_file(root: &Path) -> Option<PathBuf> {
    let candidates = [".droidplan.toml", "droidplan.toml", ".config/droidplan.toml"];

    candidates
        .iter()
        .map(|candidate| root.join(candidate))
        .find(|p| p.is_file() && looks_like_tool_config(p))
}

/// `droidplan.toml` is also the default manifest name; only treat it as tool
/// configuration when it has a `[tool]` or `[logging]` table.
fn looks_like_tool_config(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| content.parse::<toml::Table>().ok())
        .is_some_and(|table| table.contains_key("tool") || table.contains_key("logging"))
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    tracing::debug!(path = %path.display(), "Loading tool configuration");

    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read config file {}", path.display()))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Failed to parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::ErrorCode;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.tool.manifest, "droidplan.toml");
        assert_eq!(config.schema.tool.variants, vec!["debug", "release"]);
        assert_eq!(config.schema.logging.level, "warn");
    }

    #[test]
    fn test_config_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[tool]\nformat = \"json\"\nstrict = true\nvariants = [\"debug\", \"release\", \"profile\"]\n\n[logging]\njson = true\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.schema.tool.format, OutputFormat::Json);
        assert!(config.schema.tool.strict);
        assert_eq!(config.schema.tool.variants.len(), 3);
        assert_eq!(config.schema.tool.manifest, "droidplan.toml");
        assert!(config.schema.logging.json);
        assert_eq!(config.schema.logging.level, "warn");
    }

    #[test]
    fn test_config_load_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/droidplan.toml"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[tool\nformat = ").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.context.is_some());
    }

    #[test]
    fn test_find_config_skips_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("droidplan.toml"),
            "[settings]\napplicationId = \"com.example.app\"\n",
        )
        .unwrap();
        assert!(find_config_file(dir.path()).is_none());

        std::fs::write(dir.path().join(".droidplan.toml"), "[logging]\nlevel = \"debug\"\n")
            .unwrap();
        assert_eq!(
            find_config_file(dir.path()),
            Some(dir.path().join(".droidplan.toml"))
        );
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("toml".parse::<OutputFormat>().unwrap(), OutputFormat::Toml);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
