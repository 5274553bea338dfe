//! Build settings document
//!
//! A [`ConfigDocument`] holds the key/value settings of one build manifest.
//! It is writable while the manifest is being loaded and sealed afterwards;
//! every later [`ConfigDocument::set`] fails.

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single setting value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// `true` or `false`
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    Str(String),
}

impl SettingValue {
    /// Name of the variant, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Str(_) => "string",
            SettingValue::Int(_) => "integer",
            SettingValue::Bool(_) => "boolean",
        }
    }

    /// Convert a TOML value, rejecting anything that is not a string, integer or boolean
    pub fn from_toml(key: &str, value: toml::Value) -> Result<Self> {
        match value {
            toml::Value::String(s) => Ok(SettingValue::Str(s)),
            toml::Value::Integer(i) => Ok(SettingValue::Int(i)),
            toml::Value::Boolean(b) => Ok(SettingValue::Bool(b)),
            other => Err(PlanError::InvalidSetting {
                key: key.to_string(),
                message: format!(
                    "{} values are not supported (expected string, integer or boolean)",
                    other.type_str()
                ),
            }),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Str(s) => write!(f, "{:?}", s),
            SettingValue::Int(i) => write!(f, "{}", i),
            SettingValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Str(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Str(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Int(i64::from(value))
    }
}

impl From<u32> for SettingValue {
    fn from(value: u32) -> Self {
        SettingValue::Int(i64::from(value))
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

/// Key/value build settings with a load phase and a sealed phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    values: BTreeMap<String, SettingValue>,
    sealed: bool,
}

impl ConfigDocument {
    /// Create an empty document in the load phase
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value; replaces an existing value for the same key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Result<()> {
        let key = key.into();
        if self.sealed {
            return Err(PlanError::ImmutableState(key));
        }
        let value = value.into();
        tracing::trace!(key = %key, value = %value, "Setting loaded");
        self.values.insert(key, value);
        Ok(())
    }

    /// End the load phase
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Consume the document and return it sealed
    pub fn sealed(mut self) -> Self {
        self.seal();
        self
    }

    /// Whether the load phase has ended
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Value of `key`, or `NotFound`
    pub fn get(&self, key: &str) -> Result<&SettingValue> {
        self.values
            .get(key)
            .ok_or_else(|| PlanError::NotFound(key.to_string()))
    }

    /// String value of `key`
    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            SettingValue::Str(s) => Ok(s),
            other => Err(mismatch(key, "string", other)),
        }
    }

    /// Integer value of `key`
    pub fn get_int(&self, key: &str) -> Result<i64> {
        match self.get(key)? {
            SettingValue::Int(i) => Ok(*i),
            other => Err(mismatch(key, "integer", other)),
        }
    }

    /// Boolean value of `key`
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key)? {
            SettingValue::Bool(b) => Ok(*b),
            other => Err(mismatch(key, "boolean", other)),
        }
    }

    /// Optional string setting; a missing key is `None`, a wrong type is an error
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get_str(key) {
            Ok(s) => Ok(Some(s)),
            Err(PlanError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether `key` is set
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Settings in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn mismatch(key: &str, expected: &'static str, found: &SettingValue) -> PlanError {
    PlanError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}
