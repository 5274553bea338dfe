use droidplan_core::{Error as CoreError, ErrorCode};
use std::fmt;
use thiserror::Error;

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, PlanError>;

/// Stage of plan composition at which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// SDK level ordering
    Constraints,
    /// Application id, namespace, version and JVM settings
    Identity,
    /// Plugin application order
    Plugins,
    /// Variant to signing identity resolution
    Signing,
    /// Warnings promoted to errors
    Strict,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Constraints => "constraints",
            Stage::Identity => "identity",
            Stage::Plugins => "plugins",
            Stage::Signing => "signing",
            Stage::Strict => "strict",
        };
        f.write_str(name)
    }
}

/// Errors raised while loading or composing a build configuration
#[derive(Error, Debug)]
pub enum PlanError {
    /// A required setting is missing
    #[error("Setting not found: {0}")]
    NotFound(String),

    /// `set` was called after the document was sealed
    #[error("Cannot set '{0}': configuration document is sealed")]
    ImmutableState(String),

    /// A setting holds a different kind of value than requested
    #[error("Setting '{key}' has the wrong type: expected {expected}, found {found}")]
    TypeMismatch {
        /// Setting name
        key: String,
        /// Requested type
        expected: &'static str,
        /// Stored type
        found: &'static str,
    },

    /// A setting has the right type but an unusable value
    #[error("Invalid value for '{key}': {message}")]
    InvalidSetting {
        /// Setting name
        key: String,
        /// What is wrong with the value
        message: String,
    },

    /// A setting is supplied by the framework at build time and cannot be checked
    #[error("Setting '{key}' is deferred to the framework ({reference})")]
    DeferredSetting {
        /// Setting name
        key: String,
        /// Framework reference, e.g. `flutter.minSdkVersion`
        reference: String,
    },

    /// SDK levels are out of order
    #[error("SDK constraint violated: {0}")]
    ConstraintViolation(String),

    /// Two dependencies share a coordinate
    #[error("Duplicate dependency coordinate: {0}")]
    DuplicateCoordinate(String),

    /// A dependency reference is malformed
    #[error("Invalid dependency '{notation}': {message}")]
    InvalidDependency {
        /// Notation as written
        notation: String,
        /// What is wrong with it
        message: String,
    },

    /// A variant was registered twice
    #[error("Signing variant '{0}' is already registered")]
    DuplicateVariant(String),

    /// A variant has no identity and there is no debug fallback
    #[error("No signing identity for variant '{0}' and no debug identity to fall back to")]
    UnresolvedVariant(String),

    /// A plugin id appears twice
    #[error("Plugin '{0}' is applied more than once")]
    DuplicatePlugin(String),

    /// A plugin is applied before one it depends on
    #[error("Plugin '{plugin}' must be applied after '{required}'")]
    PluginOrder {
        /// Plugin applied too early
        plugin: String,
        /// Plugin that must precede it
        required: String,
    },

    /// Warnings collected in strict mode
    #[error("{} warning(s) in strict mode: {}", .0.len(), .0.join("; "))]
    Warnings(Vec<String>),

    /// Composition stopped at `stage`
    #[error("Composition failed at {stage}: {source}")]
    Composition {
        /// Stage that failed
        stage: Stage,
        /// Underlying error
        #[source]
        source: Box<PlanError>,
    },

    /// Gradle script statement that could not be imported
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line of the statement
        line: usize,
        /// What could not be imported
        message: String,
    },

    /// File access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest is not valid TOML or has unknown fields
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Manifest could not be written as TOML
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl PlanError {
    /// Wrap this error as a composition failure at `stage`
    pub fn at(self, stage: Stage) -> Self {
        PlanError::Composition {
            stage,
            source: Box::new(self),
        }
    }

    /// Innermost error, looking through composition wrappers
    pub fn root(&self) -> &PlanError {
        match self {
            PlanError::Composition { source, .. } => source.root(),
            other => other,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            PlanError::NotFound(_) => ErrorCode::SettingNotFound,
            PlanError::ImmutableState(_) => ErrorCode::ImmutableSetting,
            PlanError::TypeMismatch { .. }
            | PlanError::InvalidSetting { .. }
            | PlanError::DeferredSetting { .. } => ErrorCode::InvalidConfigValue,
            PlanError::ConstraintViolation(_) => ErrorCode::ConstraintViolation,
            PlanError::DuplicateCoordinate(_)
            | PlanError::DuplicateVariant(_)
            | PlanError::DuplicatePlugin(_) => ErrorCode::DuplicateEntry,
            PlanError::InvalidDependency { .. } => ErrorCode::InvalidFormat,
            PlanError::Warnings(_) => ErrorCode::ValidationError,
            PlanError::UnresolvedVariant(_) => ErrorCode::SigningError,
            PlanError::PluginOrder { .. } => ErrorCode::PluginOrder,
            PlanError::Composition { .. } => ErrorCode::CompositionError,
            PlanError::Parse { .. } => ErrorCode::GradleError,
            PlanError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            PlanError::Io(_) => ErrorCode::IoError,
            PlanError::Toml(_) => ErrorCode::ConfigParseError,
            PlanError::TomlSer(_) => ErrorCode::Internal,
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self.root() {
            PlanError::NotFound(_) => {
                Some("Declare the setting in the manifest or the android block of the Gradle script")
            }
            PlanError::DeferredSetting { .. } => {
                Some("SDK levels deferred to the framework cannot be checked; pin them to integers")
            }
            PlanError::ConstraintViolation(_) => {
                Some("SDK levels must satisfy minSdk <= targetSdk <= compileSdk")
            }
            PlanError::UnresolvedVariant(_) => {
                Some("Map the variant under [signing] or register a 'debug' identity")
            }
            PlanError::PluginOrder { .. } => {
                Some("Apply the Flutter Gradle plugin after the Android and Kotlin plugins")
            }
            _ => None,
        }
    }
}

impl From<PlanError> for CoreError {
    fn from(err: PlanError) -> Self {
        let mut error = CoreError::new(err.code(), err.to_string());
        if let Some(suggestion) = err.suggestion() {
            error = error.with_suggestion(suggestion);
        }
        error.with_source(err)
    }
}
