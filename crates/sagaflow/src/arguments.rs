use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::outcome::StepError;

static NULL: Value = Value::Null;

/// Resolved arguments handed to a step's run, compensate and undo behaviors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(IndexMap<String, Value>);

impl Arguments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The argument's value, `null` if it was never declared.
    #[must_use]
    pub fn get(&self, name: &str) -> &Value {
        self.0.get(name).unwrap_or(&NULL)
    }

    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).as_str()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Deserialize an argument into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns a step error if the value does not match `T`.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<T, StepError> {
        serde_json::from_value(self.get(name).clone()).map_err(|error| {
            StepError::new(format!("argument '{name}' has an unexpected shape: {error}"))
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl From<Arguments> for Value {
    fn from(arguments: Arguments) -> Self {
        Value::Object(arguments.0.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
