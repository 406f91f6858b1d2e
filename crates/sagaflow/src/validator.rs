use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::context::Inputs;

/// Field-level messages produced by an [`InputValidator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    fields: IndexMap<String, Vec<String>>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Messages recorded for `field`, empty if none.
    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Validates raw workflow inputs before any step runs.
///
/// Whatever the validator returns on success replaces the raw inputs for the
/// rest of the run, so it may also coerce or fill in defaults.
pub trait InputValidator: Send + Sync {
    /// # Errors
    ///
    /// Returns the field errors that make the inputs unacceptable.
    fn validate(&self, raw: &Inputs) -> Result<Inputs, FieldErrors>;
}

impl<F> InputValidator for F
where
    F: Fn(&Inputs) -> Result<Inputs, FieldErrors> + Send + Sync,
{
    fn validate(&self, raw: &Inputs) -> Result<Inputs, FieldErrors> {
        self(raw)
    }
}
