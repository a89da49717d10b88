//! Field registry.
//!
//! A `FieldRegistry` is a caller-owned vocabulary of fields keyed by
//! display name. It is the only place names carry meaning: profiles can
//! be loaded from JSON objects whose keys are looked up here, and any
//! key that names no registered field rejects the whole profile.

use crate::error::ProfileError;
use crate::expr::Expr;
use crate::field::Field;
use crate::profile::Profile;
use crate::value::Value;
use serde_json::Value as Json;
use std::collections::HashMap;
use tracing::debug;

/// A set of fields with unique display names.
///
/// # Examples
///
/// ```rust
/// use statprofile::{FieldRegistry, Value};
///
/// let mut registry = FieldRegistry::new();
/// let hp = registry.define("hp").unwrap();
/// assert!(registry.define("hp").is_err());
///
/// let profile = registry.profile_from_str(r#"{ "hp": [1000, 250] }"#).unwrap();
/// assert_eq!(profile.get(&hp).unwrap(), Value::Number(1250.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: HashMap<String, Field>,
}

impl FieldRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field`, rejecting a second field with the same name.
    pub fn register(&mut self, field: Field) -> Result<Field, ProfileError> {
        if self.fields.contains_key(field.name()) {
            return Err(ProfileError::DuplicateField(field.name().to_string()));
        }
        self.fields.insert(field.name().to_string(), field.clone());
        Ok(field)
    }

    /// Create and register a plain field (default 0, summed).
    pub fn define(&mut self, name: impl Into<String>) -> Result<Field, ProfileError> {
        self.register(Field::new(name))
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Whether a field named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is registered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Registered fields, sorted by name.
    pub fn fields(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.values().collect();
        fields.sort_by(|a, b| a.name().cmp(b.name()));
        fields
    }

    /// Build a profile from a JSON object of raw values.
    ///
    /// Each key must name a registered field. Each value is a number, a
    /// boolean, or an array of those (one contribution per element).
    ///
    /// # Returns
    ///
    /// * `Ok(Profile)` - A profile holding one literal per value
    /// * `Err(ProfileError::InvalidKey)` - If the source is not an object
    ///   or a key names no registered field
    /// * `Err(ProfileError::InvalidValue)` - If a value is not a number,
    ///   a boolean, or an array of those
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_json::json;
    /// use statprofile::{FieldRegistry, Value};
    ///
    /// let mut registry = FieldRegistry::new();
    /// let wet = registry.define("wet").unwrap();
    ///
    /// let profile = registry.profile_from_json(&json!({ "wet": true })).unwrap();
    /// assert_eq!(profile.get(&wet).unwrap(), Value::Bool(true));
    /// assert!(registry.profile_from_json(&json!({ "dry": true })).is_err());
    /// ```
    pub fn profile_from_json(&self, source: &Json) -> Result<Profile, ProfileError> {
        let object = source.as_object().ok_or_else(|| {
            ProfileError::InvalidKey(format!("expected an object of fields, found {}", source))
        })?;

        let mut entries: Vec<(Field, Expr)> = Vec::new();
        for (name, raw) in object {
            let field = self.get(name).ok_or_else(|| {
                debug!(name = name.as_str(), "unknown field in profile source");
                ProfileError::InvalidKey(name.clone())
            })?;
            match raw {
                Json::Array(items) => {
                    for item in items {
                        entries.push((field.clone(), Expr::from(scalar(name, item)?)));
                    }
                }
                other => entries.push((field.clone(), Expr::from(scalar(name, other)?))),
            }
        }

        Ok(Profile::new(entries))
    }

    /// Parse `text` as JSON and build a profile from it.
    pub fn profile_from_str(&self, text: &str) -> Result<Profile, ProfileError> {
        let source: Json =
            serde_json::from_str(text).map_err(|e| ProfileError::Json(e.to_string()))?;
        self.profile_from_json(&source)
    }
}

fn scalar(name: &str, raw: &Json) -> Result<Value, ProfileError> {
    match raw {
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => n.as_f64().map(Value::Number).ok_or_else(|| {
            ProfileError::InvalidValue {
                field: name.to_string(),
                reason: format!("{} is not representable as f64", n),
            }
        }),
        other => Err(ProfileError::InvalidValue {
            field: name.to_string(),
            reason: format!("expected a number or bool, found {}", other),
        }),
    }
}
