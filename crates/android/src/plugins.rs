//! Gradle plugin list
//!
//! The Flutter Gradle plugin reads the Android and Kotlin extensions when it
//! is applied, so it has to come after both.

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};

/// Android application plugin
pub const ANDROID_APPLICATION: &str = "com.android.application";
/// Flutter Gradle plugin
pub const FLUTTER_GRADLE: &str = "dev.flutter.flutter-gradle-plugin";

/// Accepted ids for the Kotlin Android plugin
pub const KOTLIN_ANDROID: &[&str] = &["kotlin-android", "org.jetbrains.kotlin.android"];

/// Ordered, unique plugin ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginList {
    ids: Vec<String>,
}

impl PluginList {
    /// Create an empty instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin; duplicates fail with `DuplicatePlugin`
    pub fn add(&mut self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        if self.contains(&id) {
            return Err(PlanError::DuplicatePlugin(id));
        }
        self.ids.push(id);
        Ok(())
    }

    /// Whether `id` is applied
    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|p| p == id)
    }

    /// Plugin ids in application order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The framework plugin must follow the Android and Kotlin plugins
    pub fn check_order(&self) -> Result<()> {
        let Some(framework) = self.position(FLUTTER_GRADLE) else {
            return Ok(());
        };

        let prerequisites = std::iter::once(ANDROID_APPLICATION).chain(KOTLIN_ANDROID.iter().copied());
        for required in prerequisites {
            if let Some(pos) = self.position(required) {
                if pos > framework {
                    return Err(PlanError::PluginOrder {
                        plugin: FLUTTER_GRADLE.to_string(),
                        required: required.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for PluginList {
    /// Collect ids, skipping duplicates
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = PluginList::new();
        for id in iter {
            let _ = list.add(id);
        }
        list
    }
}
