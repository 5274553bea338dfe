//! SDK version constraints
//!
//! Android requires `minSdk <= targetSdk <= compileSdk`. The validator checks
//! that ordering and reports advisories for levels the UI framework no longer
//! supports well.

use crate::compose::FRAMEWORK_REF_PREFIX;
use crate::document::{ConfigDocument, SettingValue};
use crate::error::{PlanError, Result};
use droidplan_core::validation::{ValidationResult, Validator};
use serde::{Deserialize, Serialize};

/// Lowest SDK level the UI framework supports
pub const MIN_SUPPORTED_SDK: u32 = 21;

/// Compile SDK level below which a warning is reported
pub const RECOMMENDED_COMPILE_SDK: u32 = 33;

/// SDK level triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionConstraint {
    /// `minSdk`
    pub minimum: u32,
    /// `targetSdk`
    pub target: u32,
    /// `compileSdk`
    pub compile_against: u32,
}

impl VersionConstraint {
    /// Constraint from explicit levels
    pub fn new(minimum: u32, target: u32, compile_against: u32) -> Self {
        Self {
            minimum,
            target,
            compile_against,
        }
    }

    /// Read `minSdk`, `targetSdk` and `compileSdk` from a settings document
    pub fn from_document(doc: &ConfigDocument) -> Result<Self> {
        Ok(Self {
            minimum: sdk_level(doc, "minSdk")?,
            target: sdk_level(doc, "targetSdk")?,
            compile_against: sdk_level(doc, "compileSdk")?,
        })
    }
}

fn sdk_level(doc: &ConfigDocument, key: &str) -> Result<u32> {
    if let SettingValue::Str(reference) = doc.get(key)? {
        if reference.starts_with(FRAMEWORK_REF_PREFIX) {
            return Err(PlanError::DeferredSetting {
                key: key.to_string(),
                reference: reference.clone(),
            });
        }
    }
    let value = doc.get_int(key)?;
    u32::try_from(value).map_err(|_| PlanError::InvalidSetting {
        key: key.to_string(),
        message: format!("SDK level must be a non-negative integer, got {}", value),
    })
}

/// Checks [`VersionConstraint`] consistency
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintValidator;

impl ConstraintValidator {
    /// Create an empty instance
    pub fn new() -> Self {
        Self
    }

    /// Fail when `minimum > target` or `target > compile_against`
    pub fn validate(&self, constraint: &VersionConstraint) -> Result<()> {
        if constraint.minimum > constraint.target {
            return Err(PlanError::ConstraintViolation(format!(
                "minSdk {} is greater than targetSdk {}",
                constraint.minimum, constraint.target
            )));
        }
        if constraint.target > constraint.compile_against {
            return Err(PlanError::ConstraintViolation(format!(
                "targetSdk {} is greater than compileSdk {}",
                constraint.target, constraint.compile_against
            )));
        }
        Ok(())
    }

    /// Non-blocking findings about a constraint
    pub fn advisories(&self, constraint: &VersionConstraint) -> ValidationResult {
        Validator::new()
            .warn_if(
                "minSdk",
                constraint.minimum < MIN_SUPPORTED_SDK,
                &format!(
                    "minSdk {} is below {}, the lowest level the framework supports",
                    constraint.minimum, MIN_SUPPORTED_SDK
                ),
            )
            .warn_if(
                "compileSdk",
                constraint.compile_against < RECOMMENDED_COMPILE_SDK,
                &format!(
                    "compileSdk {} is below the recommended {}",
                    constraint.compile_against, RECOMMENDED_COMPILE_SDK
                ),
            )
            .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_inverted_min_target_fails() {
        let err = ConstraintValidator::new()
            .validate(&VersionConstraint::new(30, 21, 33))
            .unwrap_err();
        assert!(matches!(err, PlanError::ConstraintViolation(msg) if msg.contains("minSdk 30")));
    }

    #[test]
    fn test_target_above_compile_fails() {
        let err = ConstraintValidator::new()
            .validate(&VersionConstraint::new(21, 34, 33))
            .unwrap_err();
        assert!(matches!(err, PlanError::ConstraintViolation(msg) if msg.contains("compileSdk 33")));
    }

    #[test]
    fn test_equal_levels_are_valid() {
        assert!(ConstraintValidator::new()
            .validate(&VersionConstraint::new(33, 33, 33))
            .is_ok());
    }

    #[test]
    fn test_from_document() {
        let mut doc = ConfigDocument::new();
        doc.set("minSdk", 21).unwrap();
        doc.set("targetSdk", 33).unwrap();
        doc.set("compileSdk", 34).unwrap();

        let constraint = VersionConstraint::from_document(&doc).unwrap();
        assert_eq!(constraint, VersionConstraint::new(21, 33, 34));
    }

    #[test]
    fn test_from_document_rejects_negative_and_missing() {
        let mut doc = ConfigDocument::new();
        doc.set("minSdk", -1).unwrap();
        doc.set("targetSdk", 33).unwrap();
        assert!(matches!(
            VersionConstraint::from_document(&doc),
            Err(PlanError::InvalidSetting { key, .. }) if key == "minSdk"
        ));

        doc.set("minSdk", 21).unwrap();
        assert!(matches!(
            VersionConstraint::from_document(&doc),
            Err(PlanError::NotFound(key)) if key == "compileSdk"
        ));
    }

    #[test]
    fn test_from_document_rejects_framework_levels() {
        let mut doc = ConfigDocument::new();
        doc.set("minSdk", "flutter.minSdkVersion").unwrap();
        doc.set("targetSdk", 33).unwrap();
        doc.set("compileSdk", 33).unwrap();

        let err = VersionConstraint::from_document(&doc).unwrap_err();
        assert!(matches!(
            &err,
            PlanError::DeferredSetting { key, reference }
                if key == "minSdk" && reference == "flutter.minSdkVersion"
        ));
    }

    #[test]
    fn test_from_document_plain_string_is_type_mismatch() {
        let mut doc = ConfigDocument::new();
        doc.set("minSdk", "twenty-one").unwrap();
        assert!(matches!(
            VersionConstraint::from_document(&doc),
            Err(PlanError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_advisories() {
        let validator = ConstraintValidator::new();
        let result = validator.advisories(&VersionConstraint::new(19, 30, 30));
        assert!(result.is_valid());
        assert_eq!(result.warnings().len(), 2);

        assert!(validator
            .advisories(&VersionConstraint::new(21, 33, 33))
            .warnings()
            .is_empty());
    }

    proptest! {
        #[test]
        fn prop_ordered_levels_validate(a in 0u32..100, b in 0u32..100, c in 0u32..100) {
            let mut levels = [a, b, c];
            levels.sort_unstable();
            let constraint = VersionConstraint::new(levels[0], levels[1], levels[2]);
            prop_assert!(ConstraintValidator::new().validate(&constraint).is_ok());
        }

        #[test]
        fn prop_min_above_target_fails(target in 0u32..100, gap in 1u32..50, compile in 0u32..200) {
            let constraint = VersionConstraint::new(target + gap, target, compile);
            let result = ConstraintValidator::new().validate(&constraint);
            prop_assert!(matches!(result, Err(PlanError::ConstraintViolation(_))));
        }
    }
}
