//! Field-keyed validation error collection for inbound requests.
//!
//! Handlers gather every field failure before responding, so clients see
//! all problems at once, keyed by field name inside the error `details`.

use std::collections::BTreeMap;

use serde_json::json;

use crate::domain::Error;

/// Accumulator mapping field names to their failure messages.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FieldErrors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a failure message against a field.
    pub(crate) fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// Record a missing required field.
    pub(crate) fn missing(&mut self, field: &'static str) {
        self.push(field, "this field is required");
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert collected failures into a single 400 error, or `Ok` when no
    /// failures were recorded.
    pub(crate) fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        Err(Error::invalid_request("validation failed").with_details(json!(self.fields)))
    }
}

/// Single-field validation error, for failures discovered after the
/// collection pass (e.g. a uniqueness violation reported by the store).
pub(crate) fn field_error(field: &'static str, message: impl Into<String>) -> Error {
    Error::invalid_request("validation failed")
        .with_details(json!({ field: [message.into()] }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;

    #[test]
    fn empty_collection_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn collects_multiple_fields_and_messages() {
        let mut errors = FieldErrors::new();
        errors.missing("name");
        errors.push("price", "price must be a decimal number");
        errors.push("price", "price must not be negative");

        let err = errors.into_result().expect_err("has failures");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details present");
        assert_eq!(
            details["name"],
            serde_json::json!(["this field is required"])
        );
        assert_eq!(details["price"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn field_error_wraps_one_message() {
        let err = field_error("name", "a course named \"Algebra\" already exists");
        let details = err.details().expect("details present");
        assert!(details["name"][0]
            .as_str()
            .expect("message string")
            .contains("Algebra"));
    }
}
