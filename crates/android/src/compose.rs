//! Build plan composition
//!
//! [`BuildPlanComposer::compose`] merges the settings document, SDK
//! constraint, dependency list and signing resolver into a [`BuildPlan`].
//! Composition is fail-fast: the first error aborts it and no partial plan
//! is returned. Findings that do not block a build are collected as plan
//! warnings.

use crate::constraint::{ConstraintValidator, VersionConstraint};
use crate::dependency::DependencyList;
use crate::document::{ConfigDocument, SettingValue};
use crate::error::{PlanError, Result, Stage};
use crate::plugins::PluginList;
use crate::signing::{SigningIdentity, SigningResolver, DEBUG_VARIANT};
use droidplan_core::validation::Validator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of values supplied by the UI framework at build time
pub const FRAMEWORK_REF_PREFIX: &str = "flutter.";

/// Settings the composer maps onto dedicated plan fields
pub const KNOWN_SETTINGS: &[&str] = &[
    "applicationId",
    "namespace",
    "minSdk",
    "targetSdk",
    "compileSdk",
    "ndkVersion",
    "versionCode",
    "versionName",
    "sourceCompatibility",
    "targetCompatibility",
    "jvmTarget",
    "frameworkSource",
];

/// A plan value that is either known now or supplied by the framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PlanValue {
    /// Known when the plan is composed
    Literal(SettingValue),
    /// Framework reference such as `flutter.versionCode`
    Deferred(String),
}

impl PlanValue {
    fn from_setting(value: &SettingValue) -> Self {
        match value {
            SettingValue::Str(s) if s.starts_with(FRAMEWORK_REF_PREFIX) => {
                PlanValue::Deferred(s.clone())
            }
            other => PlanValue::Literal(other.clone()),
        }
    }
}

impl fmt::Display for PlanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanValue::Literal(v) => write!(f, "{}", v),
            PlanValue::Deferred(reference) => write!(f, "<{}>", reference),
        }
    }
}

/// Java and Kotlin bytecode targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JvmTargets {
    /// `sourceCompatibility`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_compatibility: Option<String>,
    /// `targetCompatibility`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_compatibility: Option<String>,
    /// Kotlin `jvmTarget`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jvm_target: Option<String>,
}

impl JvmTargets {
    fn is_consistent(&self) -> bool {
        let set: Vec<&String> = [
            &self.source_compatibility,
            &self.target_compatibility,
            &self.jvm_target,
        ]
        .into_iter()
        .flatten()
        .collect();
        set.windows(2).all(|w| w[0] == w[1])
    }
}

/// Composed, immutable build plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlan {
    /// Reverse-domain application id
    pub application_id: String,
    /// Kotlin/Java namespace; defaults to the application id
    pub namespace: String,
    /// NDK version, when pinned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndk_version: Option<String>,
    /// Path of the Flutter project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_source: Option<String>,
    /// Gradle plugins in application order
    pub plugins: PluginList,
    /// Non-fatal findings
    pub warnings: Vec<String>,
    /// Validated SDK levels
    pub sdk: VersionConstraint,
    /// `versionCode`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_code: Option<PlanValue>,
    /// `versionName`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_name: Option<PlanValue>,
    /// Java and Kotlin bytecode targets
    pub jvm: JvmTargets,
    /// External libraries in declaration order
    pub dependencies: DependencyList,
    /// One identity per build variant
    pub signing: Vec<SigningIdentity>,
    /// Settings without a dedicated field
    pub settings: BTreeMap<String, SettingValue>,
}

impl BuildPlan {
    /// Signing identity chosen for `variant`
    pub fn signing_for(&self, variant: &str) -> Option<&SigningIdentity> {
        self.signing.iter().find(|s| s.variant_name == variant)
    }

    /// Whether any non-fatal findings were recorded
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Merges resolver components into a [`BuildPlan`]
#[derive(Debug, Clone)]
pub struct BuildPlanComposer {
    validator: ConstraintValidator,
    variants: Vec<String>,
    plugins: PluginList,
    strict: bool,
}

impl Default for BuildPlanComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildPlanComposer {
    /// Composer for the `debug` and `release` variants
    pub fn new() -> Self {
        Self {
            validator: ConstraintValidator::new(),
            variants: vec![DEBUG_VARIANT.to_string(), "release".to_string()],
            plugins: PluginList::new(),
            strict: false,
        }
    }

    /// Variants that must resolve to a signing identity
    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// Plugins whose order is checked and copied into the plan
    pub fn with_plugins(mut self, plugins: PluginList) -> Self {
        self.plugins = plugins;
        self
    }

    /// Treat warnings as a composition failure
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Compose a plan, stopping at the first failing stage
    pub fn compose(
        &self,
        doc: &ConfigDocument,
        constraint: &VersionConstraint,
        dependencies: &DependencyList,
        signing: &SigningResolver,
    ) -> Result<BuildPlan> {
        let mut warnings = Vec::new();

        self.validator
            .validate(constraint)
            .map_err(|e| e.at(Stage::Constraints))?;
        warnings.extend(
            self.validator
                .advisories(constraint)
                .warnings()
                .iter()
                .map(ToString::to_string),
        );

        let identity = read_identity(doc, &mut warnings).map_err(|e| e.at(Stage::Identity))?;

        self.plugins.check_order().map_err(|e| e.at(Stage::Plugins))?;

        let mut identities = Vec::with_capacity(self.variants.len());
        for variant in &self.variants {
            let resolved = signing.resolve(variant).map_err(|e| e.at(Stage::Signing))?;
            let debug_signed =
                signing.is_fallback(variant) || resolved.identity_name == DEBUG_VARIANT;
            if variant != DEBUG_VARIANT && debug_signed {
                warnings.push(format!(
                    "Variant '{}' is signed with the debug identity '{}'",
                    variant, resolved.identity_name
                ));
            }
            identities.push(resolved);
        }

        for warning in &warnings {
            tracing::debug!(application_id = %identity.application_id, "{}", warning);
        }
        if self.strict && !warnings.is_empty() {
            return Err(PlanError::Warnings(warnings).at(Stage::Strict));
        }

        let settings = doc
            .iter()
            .filter(|(key, _)| !KNOWN_SETTINGS.contains(key))
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();

        let plan = BuildPlan {
            application_id: identity.application_id,
            namespace: identity.namespace,
            ndk_version: doc.opt_str("ndkVersion").map_err(|e| e.at(Stage::Identity))?.map(String::from),
            framework_source: doc
                .opt_str("frameworkSource")
                .map_err(|e| e.at(Stage::Identity))?
                .map(String::from),
            plugins: self.plugins.clone(),
            warnings,
            sdk: *constraint,
            version_code: identity.version_code,
            version_name: identity.version_name,
            jvm: identity.jvm,
            dependencies: dependencies.clone(),
            signing: identities,
            settings,
        };

        tracing::info!(
            application_id = %plan.application_id,
            dependencies = plan.dependencies.len(),
            variants = plan.signing.len(),
            warnings = plan.warnings.len(),
            "Build plan composed"
        );

        Ok(plan)
    }
}

struct Identity {
    application_id: String,
    namespace: String,
    version_code: Option<PlanValue>,
    version_name: Option<PlanValue>,
    jvm: JvmTargets,
}

fn read_identity(doc: &ConfigDocument, warnings: &mut Vec<String>) -> Result<Identity> {
    let application_id = doc.get_str("applicationId")?.to_string();
    let checked = Validator::new()
        .required("applicationId", &application_id)
        .application_id("applicationId", &application_id)
        .validate();
    if let Some(error) = checked.errors().first() {
        return Err(PlanError::InvalidSetting {
            key: error.field.clone(),
            message: format!("'{}': {}", application_id, error.message),
        });
    }

    let namespace = match doc.opt_str("namespace")? {
        Some(ns) => {
            if ns != application_id {
                warnings.push(format!(
                    "namespace '{}' differs from applicationId '{}'",
                    ns, application_id
                ));
            }
            ns.to_string()
        }
        None => application_id.clone(),
    };

    let version_code = match doc.get("versionCode") {
        Ok(SettingValue::Bool(_)) => {
            return Err(PlanError::TypeMismatch {
                key: "versionCode".to_string(),
                expected: "integer",
                found: "boolean",
            });
        }
        Ok(SettingValue::Str(s)) if !s.starts_with(FRAMEWORK_REF_PREFIX) => {
            return Err(PlanError::InvalidSetting {
                key: "versionCode".to_string(),
                message: format!("expected an integer or a framework reference, got '{}'", s),
            });
        }
        Ok(value) => Some(PlanValue::from_setting(value)),
        Err(_) => None,
    };
    let version_name = doc.get("versionName").ok().map(PlanValue::from_setting);

    let jvm = JvmTargets {
        source_compatibility: doc.opt_str("sourceCompatibility")?.map(String::from),
        target_compatibility: doc.opt_str("targetCompatibility")?.map(String::from),
        jvm_target: doc.opt_str("jvmTarget")?.map(String::from),
    };
    if !jvm.is_consistent() {
        warnings.push(
            "sourceCompatibility, targetCompatibility and jvmTarget do not match".to_string(),
        );
    }

    Ok(Identity {
        application_id,
        namespace,
        version_code,
        version_name,
        jvm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::DependencyRef;
    use crate::plugins::{ANDROID_APPLICATION, FLUTTER_GRADLE};

    fn document() -> ConfigDocument {
        let mut doc = ConfigDocument::new();
        doc.set("applicationId", "com.example.app").unwrap();
        doc.set("minSdk", 21).unwrap();
        doc.set("targetSdk", 33).unwrap();
        doc.set("compileSdk", 33).unwrap();
        doc.sealed()
    }

    fn debug_only() -> SigningResolver {
        let mut signing = SigningResolver::new();
        signing.register("debug", "debug").unwrap();
        signing
    }

    fn compose(composer: &BuildPlanComposer, doc: &ConfigDocument) -> Result<BuildPlan> {
        let constraint = VersionConstraint::from_document(doc)?;
        composer.compose(doc, &constraint, &DependencyList::new(), &debug_only())
    }

    #[test]
    fn test_compose_example_document() {
        let plan = compose(&BuildPlanComposer::new(), &document()).unwrap();

        assert_eq!(plan.application_id, "com.example.app");
        assert_eq!(plan.namespace, "com.example.app");
        assert_eq!(plan.sdk, VersionConstraint::new(21, 33, 33));
        assert_eq!(plan.signing_for("release").unwrap().identity_name, "debug");
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("release"));
    }

    #[test]
    fn test_constraint_failure_is_first() {
        let mut doc = ConfigDocument::new();
        doc.set("minSdk", 30).unwrap();
        let doc = doc.sealed();

        let err = BuildPlanComposer::new()
            .compose(
                &doc,
                &VersionConstraint::new(30, 21, 33),
                &DependencyList::new(),
                &SigningResolver::new(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            PlanError::Composition { stage: Stage::Constraints, .. }
        ));
        assert!(matches!(err.root(), PlanError::ConstraintViolation(_)));
    }

    #[test]
    fn test_missing_application_id() {
        let doc = ConfigDocument::new().sealed();
        let err = BuildPlanComposer::new()
            .compose(
                &doc,
                &VersionConstraint::new(21, 33, 33),
                &DependencyList::new(),
                &debug_only(),
            )
            .unwrap_err();
        assert!(matches!(err, PlanError::Composition { stage: Stage::Identity, .. }));
        assert!(matches!(err.root(), PlanError::NotFound(k) if k == "applicationId"));
    }

    #[test]
    fn test_malformed_application_id() {
        for bad in ["app", "", "com..app"] {
            let mut doc = ConfigDocument::new();
            doc.set("applicationId", bad).unwrap();
            let err = BuildPlanComposer::new()
                .compose(
                    &doc.sealed(),
                    &VersionConstraint::new(21, 33, 33),
                    &DependencyList::new(),
                    &debug_only(),
                )
                .unwrap_err();
            assert!(matches!(err, PlanError::Composition { stage: Stage::Identity, .. }));
            assert!(matches!(err.root(), PlanError::InvalidSetting { key, .. } if key == "applicationId"));
        }
    }

    #[test]
    fn test_unresolved_variant_fails() {
        let doc = document();
        let constraint = VersionConstraint::from_document(&doc).unwrap();
        let mut signing = SigningResolver::new();
        signing.register("release", "upload").unwrap();

        let err = BuildPlanComposer::new()
            .compose(&doc, &constraint, &DependencyList::new(), &signing)
            .unwrap_err();
        assert!(matches!(err.root(), PlanError::UnresolvedVariant(v) if v == "debug"));
    }

    #[test]
    fn test_plugin_order_checked() {
        let plugins: PluginList = [FLUTTER_GRADLE, ANDROID_APPLICATION].into_iter().collect();
        let err = compose(&BuildPlanComposer::new().with_plugins(plugins), &document())
            .unwrap_err();
        assert!(matches!(err, PlanError::Composition { stage: Stage::Plugins, .. }));
    }

    #[test]
    fn test_strict_mode_promotes_warnings() {
        let err = compose(&BuildPlanComposer::new().strict(true), &document()).unwrap_err();
        assert!(matches!(err, PlanError::Composition { stage: Stage::Strict, .. }));

        let plan = compose(
            &BuildPlanComposer::new().with_variants(["debug"]).strict(true),
            &document(),
        )
        .unwrap();
        assert!(!plan.has_warnings());
    }

    #[test]
    fn test_deferred_and_extra_settings() {
        let mut doc = ConfigDocument::new();
        for (key, value) in document().iter() {
            doc.set(key, value.clone()).unwrap();
        }
        doc.set("versionCode", "flutter.versionCode").unwrap();
        doc.set("versionName", "1.2.0").unwrap();
        doc.set("multiDexEnabled", true).unwrap();
        let doc = doc.sealed();

        let plan = compose(&BuildPlanComposer::new(), &doc).unwrap();
        assert_eq!(
            plan.version_code,
            Some(PlanValue::Deferred("flutter.versionCode".to_string()))
        );
        assert_eq!(
            plan.version_name,
            Some(PlanValue::Literal(SettingValue::Str("1.2.0".to_string())))
        );
        assert_eq!(plan.settings.len(), 1);
        assert_eq!(plan.settings["multiDexEnabled"], SettingValue::Bool(true));
    }

    #[test]
    fn test_invalid_version_code() {
        let mut doc = ConfigDocument::new();
        for (key, value) in document().iter() {
            doc.set(key, value.clone()).unwrap();
        }
        doc.set("versionCode", "seven").unwrap();

        let err = compose(&BuildPlanComposer::new(), &doc).unwrap_err();
        assert!(matches!(err.root(), PlanError::InvalidSetting { key, .. } if key == "versionCode"));
    }

    #[test]
    fn test_jvm_mismatch_warns() {
        let mut doc = ConfigDocument::new();
        for (key, value) in document().iter() {
            doc.set(key, value.clone()).unwrap();
        }
        doc.set("sourceCompatibility", "11").unwrap();
        doc.set("jvmTarget", "17").unwrap();

        let plan = compose(&BuildPlanComposer::new().with_variants(["debug"]), &doc).unwrap();
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("jvmTarget"));
    }

    #[test]
    fn test_plan_keeps_dependency_order() {
        let doc = document();
        let constraint = VersionConstraint::from_document(&doc).unwrap();
        let mut deps = DependencyList::new();
        deps.add(DependencyRef::new("org.jetbrains.kotlin:kotlin-stdlib-jdk7", "1.8.22"))
            .unwrap();
        deps.add(DependencyRef::new("com.google.android.material:material", "1.12.0"))
            .unwrap();

        let plan = BuildPlanComposer::new()
            .compose(&doc, &constraint, &deps, &debug_only())
            .unwrap();
        let coords: Vec<&str> = plan.dependencies.all().map(|d| d.coordinate.as_str()).collect();
        assert_eq!(
            coords,
            vec![
                "org.jetbrains.kotlin:kotlin-stdlib-jdk7",
                "com.google.android.material:material"
            ]
        );

        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["applicationId"], "com.example.app");
        assert_eq!(json["sdk"]["compileAgainst"], 33);
    }
}
