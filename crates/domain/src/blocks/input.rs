use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::BlockError;

/// Form-style input: each key may carry several values, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockInput(HashMap<String, Vec<String>>);

impl BlockInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value under `key`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.entry(key.into()).or_default().push(value.into());
        self
    }

    pub fn with_all<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// First value under `key`, or `MissingField`
    pub fn require(&self, key: &str) -> Result<&str, BlockError> {
        self.first(key).ok_or_else(|| BlockError::missing(key))
    }

    /// Checkbox semantics: present with value "on" (or "true")
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.first(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "on" | "true"))
    }
}

impl From<HashMap<String, Vec<String>>> for BlockInput {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}
