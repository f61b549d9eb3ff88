//! Form state: current field values plus the errors shown next to them.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::schema::{Schema, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: Map<String, Value>,
    errors: ValidationErrors,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The value of `name` if it is a string.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Overwrite one field. Errors are left as they are.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.first(name)
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    /// Parse the current values with `schema`. Failures are kept on the form
    /// for display; success clears previous errors.
    pub fn handle_submit<T: DeserializeOwned>(&mut self, schema: &Schema) -> Result<T, ValidationErrors> {
        match schema.parse(&self.values) {
            Ok(payload) => {
                self.errors.clear();
                Ok(payload)
            }
            Err(errors) => {
                self.errors = errors.clone();
                Err(errors)
            }
        }
    }
}
