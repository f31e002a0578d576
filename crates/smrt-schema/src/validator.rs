//! Structural validation against JSON Schema draft 6.
//!
//! The schema document is compiled (and thereby checked against the draft 6
//! meta-schema) before the instance is validated. A malformed schema makes
//! every instance invalid; it never raises.

use jsonschema::{Draft, Validator};
use serde_json::Value;

/// A schema compiled once and reused for every instance.
///
/// A malformed schema compiles to a value that rejects everything with the
/// schema error as its only violation.
pub struct CompiledSchema {
    compiled: Result<Validator, String>,
}

impl CompiledSchema {
    /// Compiles `schema` as a draft 6 document.
    #[must_use]
    pub fn new(schema: &Value) -> Self {
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft6)
            .build(schema)
            .map_err(|err| {
                tracing::warn!(error = %err, "schema is not a valid draft 6 document");
                format!("invalid schema: {err}")
            });
        Self { compiled }
    }

    /// Whether the schema itself compiled.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.compiled.is_ok()
    }

    /// Returns `true` if `instance` conforms.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        match &self.compiled {
            Ok(validator) => validator.is_valid(instance),
            Err(_) => false,
        }
    }

    /// Returns a message for every violation by `instance`.
    #[must_use]
    pub fn violations(&self, instance: &Value) -> Vec<String> {
        match &self.compiled {
            Ok(validator) => validator
                .iter_errors(instance)
                .map(|err| format!("{}: {err}", err.instance_path))
                .collect(),
            Err(message) => vec![message.clone()],
        }
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("well_formed", &self.is_well_formed())
            .finish_non_exhaustive()
    }
}

/// Returns `true` if `instance` conforms to `schema`.
///
/// ```
/// use serde_json::json;
///
/// let schema = json!({"type": "object", "required": ["on"]});
/// assert!(smrt_schema::validate(&json!({"on": true}), &schema));
/// assert!(!smrt_schema::validate(&json!({}), &schema));
/// ```
#[must_use]
pub fn validate(instance: &Value, schema: &Value) -> bool {
    CompiledSchema::new(schema).is_valid(instance)
}

/// Returns a message for every violation of `schema` by `instance`.
///
/// Compiles `schema` on each call; hold a [`CompiledSchema`] (or use
/// [`SchemaResolver::compiled`](crate::SchemaResolver::compiled)) when the
/// same schema checks many instances.
#[must_use]
pub fn violations(instance: &Value, schema: &Value) -> Vec<String> {
    CompiledSchema::new(schema).violations(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lamp_schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-06/schema#",
            "type": "object",
            "properties": {
                "on": {"type": "boolean"},
                "brightness": {"type": "integer", "minimum": 0, "maximum": 100}
            },
            "required": ["on"],
            "additionalProperties": false
        })
    }

    #[test]
    fn test_valid_instance() {
        assert!(validate(&json!({"on": true, "brightness": 40}), &lamp_schema()));
    }

    #[test]
    fn test_invalid_instance() {
        let schema = lamp_schema();
        assert!(!validate(&json!({"brightness": 40}), &schema));
        assert!(!validate(&json!({"on": "yes"}), &schema));
        assert!(!validate(&json!({"on": true, "colour": "red"}), &schema));
        assert!(!validate(&json!([1, 2]), &schema));
    }

    #[test]
    fn test_violations_name_the_location() {
        let messages = violations(&json!({"on": true, "brightness": 400}), &lamp_schema());
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("/brightness"), "{messages:?}");
    }

    #[test]
    fn test_malformed_schema_is_invalid_not_a_panic() {
        let schema = json!({"type": 12});
        assert!(!validate(&json!({}), &schema));
        assert!(violations(&json!({}), &schema)[0].starts_with("invalid schema"));
    }

    #[test]
    fn test_compiled_schema_is_reusable() {
        let compiled = CompiledSchema::new(&lamp_schema());
        assert!(compiled.is_well_formed());
        assert!(compiled.is_valid(&json!({"on": false})));
        assert!(!compiled.is_valid(&json!({"on": 1})));
        assert_eq!(compiled.violations(&json!({"on": true, "brightness": -1})).len(), 1);
    }

    #[test]
    fn test_malformed_compiled_schema_rejects_everything() {
        let compiled = CompiledSchema::new(&json!({"type": 12}));
        assert!(!compiled.is_well_formed());
        assert!(!compiled.is_valid(&json!({})));
        assert!(compiled.violations(&json!(null))[0].starts_with("invalid schema"));
    }

    #[test]
    fn test_bundled_error_schema_accepts_envelopes() {
        let schema: Value =
            serde_json::from_str(include_str!("../schemas/se.novafaen.smrt.error.v1.json")).unwrap();
        let envelope = smrt_core::Fault::bad_request("x").to_envelope();
        assert!(validate(&serde_json::to_value(envelope).unwrap(), &schema));
        assert!(!validate(&json!({"code": 400}), &schema));
    }

    #[test]
    fn test_bundled_status_schema_accepts_snapshots() {
        let schema: Value =
            serde_json::from_str(include_str!("../schemas/se.novafaen.smrt.status.v1.json")).unwrap();
        let snapshot = smrt_core::ServiceState::new().snapshot().unwrap();
        assert!(validate(&serde_json::to_value(snapshot).unwrap(), &schema));
    }
}
