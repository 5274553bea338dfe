//! TOML build manifests
//!
//! A manifest is the on-disk form of everything the composer needs:
//!
//! ```toml
//! plugins = ["com.android.application", "kotlin-android", "dev.flutter.flutter-gradle-plugin"]
//!
//! [settings]
//! applicationId = "com.example.app"
//! minSdk = 21
//! targetSdk = 33
//! compileSdk = 33
//!
//! [signing]
//! debug = "debug"
//!
//! [[dependencies]]
//! coordinate = "com.google.android.material:material"
//! version = "1.12.0"
//! ```

use crate::compose::{BuildPlan, BuildPlanComposer};
use crate::constraint::VersionConstraint;
use crate::dependency::{DependencyList, DependencyRef};
use crate::document::{ConfigDocument, SettingValue};
use crate::error::{PlanError, Result, Stage};
use crate::plugins::PluginList;
use crate::signing::SigningResolver;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    plugins: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variants: Option<Vec<String>>,
    #[serde(default)]
    settings: toml::Table,
    #[serde(default)]
    signing: toml::Table,
    #[serde(default)]
    dependencies: Vec<DependencyRef>,
}

/// A loaded build manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildManifest {
    /// Gradle plugins in application order
    pub plugins: PluginList,
    /// Variants declared by the manifest; `None` defers to the tool configuration
    pub variants: Option<Vec<String>>,
    /// Sealed settings document
    pub settings: ConfigDocument,
    /// External libraries in declaration order
    pub dependencies: DependencyList,
    /// Variant to signing identity mapping
    pub signing: SigningResolver,
}

impl BuildManifest {
    /// Read a TOML manifest from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading build manifest");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML manifest and seal its settings
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content)?;

        let mut plugins = PluginList::new();
        for id in raw.plugins {
            plugins.add(id)?;
        }

        let mut settings = ConfigDocument::new();
        for (key, value) in raw.settings {
            let value = SettingValue::from_toml(&key, value)?;
            settings.set(key, value)?;
        }
        settings.seal();

        let mut signing = SigningResolver::new();
        for (variant, identity) in raw.signing {
            match SettingValue::from_toml(&variant, identity)? {
                SettingValue::Str(identity) => signing.register(variant, identity)?,
                other => {
                    return Err(PlanError::TypeMismatch {
                        key: format!("signing.{}", variant),
                        expected: "string",
                        found: other.type_name(),
                    });
                }
            }
        }

        let mut dependencies = DependencyList::new();
        for dependency in raw.dependencies {
            dependencies.add(dependency)?;
        }

        tracing::debug!(
            settings = settings.len(),
            plugins = plugins.len(),
            dependencies = dependencies.len(),
            "Manifest loaded"
        );

        Ok(Self {
            plugins,
            variants: raw.variants,
            settings,
            dependencies,
            signing,
        })
    }

    /// Serialize back to the TOML manifest format
    pub fn to_toml_string(&self) -> Result<String> {
        let settings = self
            .settings
            .iter()
            .map(|(key, value)| (key.to_string(), setting_to_toml(value)))
            .collect();
        let signing = self
            .signing
            .entries()
            .map(|(variant, identity)| (variant.to_string(), toml::Value::String(identity.to_string())))
            .collect();

        let raw = RawManifest {
            plugins: self.plugins.iter().map(String::from).collect(),
            variants: self.variants.clone(),
            settings,
            signing,
            dependencies: self.dependencies.all().cloned().collect(),
        };
        Ok(toml::to_string_pretty(&raw)?)
    }

    /// SDK levels declared in `[settings]`
    pub fn constraint(&self) -> Result<VersionConstraint> {
        VersionConstraint::from_document(&self.settings)
    }

    /// Composer carrying this manifest's plugins and variants
    ///
    /// `default_variants` applies when the manifest declares none.
    pub fn composer(&self, default_variants: &[String]) -> BuildPlanComposer {
        let variants = self
            .variants
            .as_deref()
            .unwrap_or(default_variants)
            .to_vec();
        BuildPlanComposer::new()
            .with_variants(variants)
            .with_plugins(self.plugins.clone())
    }

    /// Compose with a preconfigured composer
    pub fn compose_with(&self, composer: &BuildPlanComposer) -> Result<BuildPlan> {
        let constraint = self.constraint().map_err(|e| e.at(Stage::Constraints))?;
        composer.compose(&self.settings, &constraint, &self.dependencies, &self.signing)
    }

    /// Compose with the default `debug` and `release` variants
    pub fn compose(&self) -> Result<BuildPlan> {
        let defaults = BuildPlanComposer::new();
        let composer = match &self.variants {
            Some(variants) => defaults.with_variants(variants.clone()),
            None => defaults,
        };
        self.compose_with(&composer.with_plugins(self.plugins.clone()))
    }
}

fn setting_to_toml(value: &SettingValue) -> toml::Value {
    match value {
        SettingValue::Str(s) => toml::Value::String(s.clone()),
        SettingValue::Int(i) => toml::Value::Integer(*i),
        SettingValue::Bool(b) => toml::Value::Boolean(*b),
    }
}
