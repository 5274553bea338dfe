//! Signing identity resolution
//!
//! Maps build variants to named signing identities. A variant with no
//! identity of its own is signed with the `debug` identity when one is
//! registered, which is what the Android Gradle plugin does for build types
//! that name `signingConfigs.getByName("debug")`.

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};

/// Variant whose identity is used as the fallback
pub const DEBUG_VARIANT: &str = "debug";

/// A variant bound to a signing identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningIdentity {
    /// Requested build variant
    pub variant_name: String,
    /// Signing config that signs it
    pub identity_name: String,
}

/// Variant to identity registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningResolver {
    // Vec keeps registration order for listing and serialization
    entries: Vec<(String, String)>,
}

impl SigningResolver {
    /// Create an empty instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `variant` to `identity`; each variant is bound once
    pub fn register(&mut self, variant: impl Into<String>, identity: impl Into<String>) -> Result<()> {
        let variant = variant.into();
        if self.lookup(&variant).is_some() {
            return Err(PlanError::DuplicateVariant(variant));
        }
        self.entries.push((variant, identity.into()));
        Ok(())
    }

    fn lookup(&self, variant: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(v, _)| v == variant)
            .map(|(_, identity)| identity.as_str())
    }

    /// Identity for `variant`, falling back to the debug identity
    pub fn resolve(&self, variant: &str) -> Result<SigningIdentity> {
        let identity = self
            .lookup(variant)
            .or_else(|| self.lookup(DEBUG_VARIANT))
            .ok_or_else(|| PlanError::UnresolvedVariant(variant.to_string()))?;

        Ok(SigningIdentity {
            variant_name: variant.to_string(),
            identity_name: identity.to_string(),
        })
    }

    /// Whether resolving `variant` uses the debug fallback
    pub fn is_fallback(&self, variant: &str) -> bool {
        self.lookup(variant).is_none() && self.lookup(DEBUG_VARIANT).is_some()
    }

    /// Registered variants in registration order
    pub fn variants(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(v, _)| v.as_str())
    }

    /// Registered `(variant, identity)` pairs in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(v, i)| (v.as_str(), i.as_str()))
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
