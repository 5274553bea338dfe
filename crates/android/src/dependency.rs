//! External library dependencies
//!
//! Dependencies keep their declaration order; the packaging toolchain relies
//! on it when resolving classpath conflicts.

use crate::error::{PlanError, Result};
use droidplan_core::validation::Validator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gradle configuration used when none is given
pub const DEFAULT_CONFIGURATION: &str = "implementation";

/// Gradle configurations accepted for a dependency
pub const CONFIGURATIONS: &[&str] = &[
    "implementation",
    "api",
    "compileOnly",
    "runtimeOnly",
    "testImplementation",
    "androidTestImplementation",
    "debugImplementation",
    "releaseImplementation",
    "kapt",
    "ksp",
];

fn default_configuration() -> String {
    DEFAULT_CONFIGURATION.to_string()
}

/// A `group:artifact` reference with a version specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRef {
    /// `group:artifact`
    pub coordinate: String,
    /// Version specifier
    pub version: String,
    /// Gradle configuration, `implementation` unless given
    #[serde(default = "default_configuration")]
    pub configuration: String,
}

impl DependencyRef {
    /// Reference in the default configuration
    pub fn new(coordinate: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            coordinate: coordinate.into(),
            version: version.into(),
            configuration: default_configuration(),
        }
    }

    /// Use another Gradle configuration
    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    /// Parse Maven notation `group:artifact:version`
    pub fn parse(notation: &str) -> Result<Self> {
        let invalid = |message: &str| PlanError::InvalidDependency {
            notation: notation.to_string(),
            message: message.to_string(),
        };

        let mut parts = notation.trim().splitn(3, ':');
        let (group, artifact, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(g), Some(a), Some(v)) => (g, a, v),
            _ => return Err(invalid("expected group:artifact:version")),
        };
        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            return Err(invalid("group, artifact and version must be non-empty"));
        }

        Ok(Self::new(format!("{}:{}", group, artifact), version))
    }

    fn check(&self) -> Result<()> {
        let result = Validator::new()
            .required("coordinate", &self.coordinate)
            .coordinate("coordinate", &self.coordinate)
            .required("version", &self.version)
            .one_of("configuration", &self.configuration, CONFIGURATIONS)
            .validate();

        match result.errors().first() {
            None => Ok(()),
            Some(first) => Err(PlanError::InvalidDependency {
                notation: self.to_string(),
                message: first.to_string(),
            }),
        }
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.coordinate, self.version)
    }
}

/// Ordered, coordinate-unique dependency list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyList {
    entries: Vec<DependencyRef>,
}

impl DependencyList {
    /// Create an empty instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dependency; a coordinate may appear only once
    pub fn add(&mut self, dependency: DependencyRef) -> Result<()> {
        dependency.check()?;
        if self.get(&dependency.coordinate).is_some() {
            return Err(PlanError::DuplicateCoordinate(dependency.coordinate));
        }
        self.entries.push(dependency);
        Ok(())
    }

    /// Dependencies in insertion order
    pub fn all(&self) -> std::slice::Iter<'_, DependencyRef> {
        self.entries.iter()
    }

    /// Look up a dependency by coordinate
    pub fn get(&self, coordinate: &str) -> Option<&DependencyRef> {
        self.entries.iter().find(|d| d.coordinate == coordinate)
    }

    /// Dependencies declared under one Gradle configuration
    pub fn by_configuration<'a>(
        &'a self,
        configuration: &'a str,
    ) -> impl Iterator<Item = &'a DependencyRef> + 'a {
        self.entries
            .iter()
            .filter(move |d| d.configuration == configuration)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a DependencyList {
    type Item = &'a DependencyRef;
    type IntoIter = std::slice::Iter<'a, DependencyRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.all()
    }
}
