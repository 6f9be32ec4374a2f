//! Payload validation against form schemas.
//!
//! Validation collects every violation before reporting, so a client can fix
//! a whole form in one round trip. Checks run per field in a fixed order:
//! kind first, then length or range, then choice membership, then format.
//! A kind mismatch suppresses the remaining checks for that field only.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FormError, FormResult};
use crate::field::{FieldFormat, FieldKind, FieldSpec};
use crate::registry::SchemaRegistry;
use crate::schema::FormSchema;

/// Machine-readable category of a validation violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    /// A required field is absent.
    Required,
    /// The value has the wrong JSON type.
    Type,
    /// A string is shorter than the minimum length.
    MinLength,
    /// A string is longer than the maximum length.
    MaxLength,
    /// A number is below the inclusive minimum.
    Minimum,
    /// A number is above the inclusive maximum.
    Maximum,
    /// A value is not one of the allowed options.
    Enum,
    /// A string does not match the required format.
    Format,
}

impl ViolationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Enum => "enum",
            Self::Format => "format",
        }
    }
}

/// A single violation found during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field the violation applies to ("$" for the payload root).
    pub field: String,
    /// Machine-readable violation category.
    pub code: ViolationCode,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

/// A payload that passed validation against some schema.
///
/// Only the validator can construct this type, so holding one proves every
/// constraint of the source schema held and defaults were applied. Undeclared
/// payload fields are not carried over.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ValidatedPayload {
    fields: Map<String, Value>,
}

impl ValidatedPayload {
    /// Gets a validated field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Checks whether a field is present.
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Checks whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over field names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Consumes the payload into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Validates payloads against schemas held in a shared registry.
#[derive(Clone)]
pub struct Validator {
    registry: Arc<SchemaRegistry>,
}

impl Validator {
    /// Creates a validator over a registry.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the underlying registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Validates a raw payload against the named schema.
    ///
    /// Propagates `SchemaNotFound` for unknown ids; otherwise returns either
    /// the normalized payload or `Validation` carrying every violation found.
    pub fn validate(&self, schema_id: &str, payload: &Value) -> FormResult<ValidatedPayload> {
        let schema = self.registry.get(schema_id)?;
        validate_payload(schema, payload).map_err(|errors| {
            tracing::debug!(
                schema_id = %schema_id,
                violations = errors.len(),
                "Payload failed validation"
            );
            FormError::validation(schema_id, errors)
        })
    }
}

/// Validates a payload against a schema, collecting all violations.
pub fn validate_payload(
    schema: &FormSchema,
    payload: &Value,
) -> Result<ValidatedPayload, Vec<ValidationError>> {
    let Some(object) = payload.as_object() else {
        return Err(vec![ValidationError::new(
            "$",
            ViolationCode::Type,
            format!("Expected object, got {}", json_type_name(payload)),
        )]);
    };

    let mut errors = Vec::new();
    let mut normalized = Map::new();

    for field in &schema.fields {
        match object.get(&field.name) {
            Some(value) => {
                check_field(field, value, &mut errors);
                normalized.insert(field.name.clone(), value.clone());
            }
            None => {
                if let Some(default) = &field.default {
                    normalized.insert(field.name.clone(), default.clone());
                } else if field.required {
                    errors.push(ValidationError::new(
                        &field.name,
                        ViolationCode::Required,
                        format!("Required field '{}' is missing", field.name),
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(ValidatedPayload { fields: normalized })
    } else {
        Err(errors)
    }
}

fn check_field(field: &FieldSpec, value: &Value, errors: &mut Vec<ValidationError>) {
    if !field.kind.accepts(value) {
        errors.push(ValidationError::new(
            &field.name,
            ViolationCode::Type,
            format!(
                "Expected {}, got {}",
                field.kind.type_name(),
                json_type_name(value)
            ),
        ));
        return;
    }

    match &field.kind {
        FieldKind::Text {
            min_length,
            max_length,
            format,
        } => {
            let text = value.as_str().unwrap_or_default();
            let length = text.chars().count();

            if let Some(min) = min_length {
                if length < *min as usize {
                    errors.push(ValidationError::new(
                        &field.name,
                        ViolationCode::MinLength,
                        format!("Length {} is less than minimum {}", length, min),
                    ));
                }
            }
            if let Some(max) = max_length {
                if length > *max as usize {
                    errors.push(ValidationError::new(
                        &field.name,
                        ViolationCode::MaxLength,
                        format!("Length {} is greater than maximum {}", length, max),
                    ));
                }
            }
            if let Some(format) = format {
                if !matches_format(text, format) {
                    errors.push(ValidationError::new(
                        &field.name,
                        ViolationCode::Format,
                        format!("Invalid format: expected {}", format),
                    ));
                }
            }
        }
        FieldKind::Number { minimum, maximum } => {
            let number = value.as_f64().unwrap_or_default();

            if let Some(min) = minimum {
                if number < *min {
                    errors.push(ValidationError::new(
                        &field.name,
                        ViolationCode::Minimum,
                        format!("Value {} is less than minimum {}", number, min),
                    ));
                }
            }
            if let Some(max) = maximum {
                if number > *max {
                    errors.push(ValidationError::new(
                        &field.name,
                        ViolationCode::Maximum,
                        format!("Value {} is greater than maximum {}", number, max),
                    ));
                }
            }
        }
        FieldKind::Boolean => {}
        FieldKind::Choice { options } => {
            let text = value.as_str().unwrap_or_default();
            if !options.iter().any(|option| option == text) {
                errors.push(ValidationError::new(
                    &field.name,
                    ViolationCode::Enum,
                    format!("Value '{}' is not one of: {}", text, options.join(", ")),
                ));
            }
        }
    }
}

fn matches_format(value: &str, format: &FieldFormat) -> bool {
    match format {
        FieldFormat::Email => match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
            }
            None => false,
        },
        FieldFormat::Url => value.starts_with("http://") || value.starts_with("https://"),
        FieldFormat::Uuid => uuid::Uuid::parse_str(value).is_ok(),
        FieldFormat::DateTime => chrono::DateTime::parse_from_rfc3339(value).is_ok(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldFormat;
    use serde_json::json;

    fn registration_schema() -> FormSchema {
        FormSchema::new("userRegistration", "User Registration")
            .field(FieldSpec::text("firstName").title("First Name").min_length(2))
            .field(FieldSpec::text("lastName").title("Last Name").min_length(2))
            .field(FieldSpec::text("email").format(FieldFormat::Email))
            .field(
                FieldSpec::number("age")
                    .minimum(18.0)
                    .maximum(120.0)
                    .optional(),
            )
            .field(FieldSpec::choice("role", ["admin", "user", "viewer"]).default("user"))
            .field(FieldSpec::text("bio").max_length(500).optional())
    }

    #[test]
    fn test_valid_payload_applies_defaults() {
        let payload = json!({
            "firstName": "Jo",
            "lastName": "Lee",
            "email": "jo@x.com",
        });

        let validated = validate_payload(&registration_schema(), &payload).unwrap();
        assert_eq!(validated.get("firstName"), Some(&json!("Jo")));
        assert_eq!(validated.get("role"), Some(&json!("user")));
        assert!(!validated.contains_field("age"));
    }

    #[test]
    fn test_collects_every_violation() {
        let payload = json!({
            "firstName": "J",
            "lastName": "Lee",
            "email": "bad",
        });

        let errors = validate_payload(&registration_schema(), &payload).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "firstName");
        assert_eq!(errors[0].code, ViolationCode::MinLength);
        assert_eq!(errors[1].field, "email");
        assert_eq!(errors[1].code, ViolationCode::Format);
    }

    #[test]
    fn test_missing_required_field() {
        let payload = json!({
            "firstName": "Jo",
            "email": "jo@x.com",
        });

        let errors = validate_payload(&registration_schema(), &payload).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "lastName");
        assert_eq!(errors[0].code, ViolationCode::Required);
    }

    #[test]
    fn test_missing_and_invalid_are_both_reported() {
        let payload = json!({
            "firstName": "Jo",
            "email": "bad",
        });

        let errors = validate_payload(&registration_schema(), &payload).unwrap_err();
        let codes: Vec<ViolationCode> = errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ViolationCode::Required, ViolationCode::Format]);
    }

    #[test]
    fn test_kind_mismatch_suppresses_constraint_checks() {
        let payload = json!({
            "firstName": "Jo",
            "lastName": "Lee",
            "email": "jo@x.com",
            "age": "thirty",
        });

        let errors = validate_payload(&registration_schema(), &payload).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ViolationCode::Type);
        assert_eq!(errors[0].message, "Expected number, got string");
    }

    #[test]
    fn test_number_bounds_are_inclusive() {
        let schema = registration_schema();
        let at_bound = json!({
            "firstName": "Jo",
            "lastName": "Lee",
            "email": "jo@x.com",
            "age": 18,
        });
        assert!(validate_payload(&schema, &at_bound).is_ok());

        let below = json!({
            "firstName": "Jo",
            "lastName": "Lee",
            "email": "jo@x.com",
            "age": 17,
        });
        let errors = validate_payload(&schema, &below).unwrap_err();
        assert_eq!(errors[0].code, ViolationCode::Minimum);
    }

    #[test]
    fn test_choice_membership() {
        let payload = json!({
            "firstName": "Jo",
            "lastName": "Lee",
            "email": "jo@x.com",
            "role": "root",
        });

        let errors = validate_payload(&registration_schema(), &payload).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ViolationCode::Enum);
    }

    #[test]
    fn test_unknown_fields_are_ignored_and_stripped() {
        let payload = json!({
            "firstName": "Jo",
            "lastName": "Lee",
            "email": "jo@x.com",
            "favoriteColor": "green",
        });

        let validated = validate_payload(&registration_schema(), &payload).unwrap();
        assert!(!validated.contains_field("favoriteColor"));
    }

    #[test]
    fn test_null_is_not_a_missing_field() {
        let payload = json!({
            "firstName": "Jo",
            "lastName": null,
            "email": "jo@x.com",
        });

        let errors = validate_payload(&registration_schema(), &payload).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ViolationCode::Type);
    }

    #[test]
    fn test_non_object_payload() {
        let errors = validate_payload(&registration_schema(), &json!("hello")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "$");
        assert_eq!(errors[0].code, ViolationCode::Type);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let payload = json!({
            "firstName": "Æø",
            "lastName": "Lee",
            "email": "jo@x.com",
        });

        assert!(validate_payload(&registration_schema(), &payload).is_ok());
    }

    #[test]
    fn test_validator_reports_unknown_schema() {
        let registry = Arc::new(SchemaRegistry::new());
        let validator = Validator::new(registry);

        let err = validator.validate("nope", &json!({})).unwrap_err();
        assert!(matches!(err, FormError::SchemaNotFound { .. }));
    }

    #[test]
    fn test_validator_wraps_violations() {
        let mut registry = SchemaRegistry::new();
        registry.register(registration_schema()).unwrap();
        let validator = Validator::new(Arc::new(registry));

        let err = validator
            .validate("userRegistration", &json!({"firstName": "J"}))
            .unwrap_err();

        match err {
            FormError::Validation { schema_id, errors } => {
                assert_eq!(schema_id, "userRegistration");
                // firstName too short, lastName and email missing.
                assert_eq!(errors.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
