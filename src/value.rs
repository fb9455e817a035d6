//! A loosely-typed key/value tree for PED status and result frames.
//!
//! The gateway's reply schema is sparse and evolves with firmware; rather
//! than bake a closed struct into the engine, frames are modeled as a tagged
//! tree (object / array / string / number / bool / null) with typed
//! accessors that return an `Option` instead of panicking on a missing or
//! mis-typed field. This mirrors how `leynos-mxd`'s transaction parameters
//! are treated as a loosely-typed map rather than a fixed struct.

use serde_json::{Map, Value};

/// A parsed PED reply, normalized to an object-shaped JSON tree.
///
/// Construction always goes through [`crate::frame::parse`]; this type only
/// provides read access plus the handful of builders the engine needs to
/// assemble outbound payloads (`updateTransaction` echoes).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame(Map<String, Value>);

impl Frame {
    /// An empty frame (no fields).
    #[must_use]
    pub fn empty() -> Self { Self(Map::new()) }

    /// Wrap an already-parsed JSON object.
    #[must_use]
    pub const fn from_object(map: Map<String, Value>) -> Self { Self(map) }

    /// `true` if the frame carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Raw field access for callers that need the underlying JSON value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

    /// A string field, if present and string-typed.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> { self.0.get(key)?.as_str() }

    /// A bool field, if present and bool-typed.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> { self.0.get(key)?.as_bool() }

    /// `true` iff `key` is present, a string, and non-empty.
    #[must_use]
    pub fn has_nonempty_str(&self, key: &str) -> bool {
        self.get_str(key).is_some_and(|s| !s.is_empty())
    }

    /// `true` iff `error`'s string value contains `needle`.
    #[must_use]
    pub fn error_contains(&self, needle: &str) -> bool {
        self.get_str("error").is_some_and(|e| e.contains(needle))
    }

    /// Insert or replace a field, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Borrow the frame as a `serde_json::Value` object for serialization.
    #[must_use]
    pub fn as_value(&self) -> Value { Value::Object(self.0.clone()) }

    /// Serialize compactly (no whitespace), as required for outbound
    /// `startTransaction`/`updateTransaction` payloads.
    ///
    /// # Panics
    /// Never: a `Map<String, Value>` always serializes successfully.
    #[must_use]
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_owned())
    }
}

impl From<Map<String, Value>> for Frame {
    fn from(map: Map<String, Value>) -> Self { Self(map) }
}

impl From<Value> for Frame {
    /// Any non-object value is treated as an empty frame; callers that parse
    /// raw PED text should prefer [`crate::frame::parse`], which never
    /// produces a bare non-object `Value` in the first place.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::empty(),
        }
    }
}
