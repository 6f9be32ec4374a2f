//! Field specifications for form schemas.
//!
//! A field is declared with a kind and the constraints that kind supports.
//! Constraints live inside the kind variant, so a number field cannot carry
//! string-only knobs like a minimum length.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String formats a text field can require.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FieldFormat {
    /// An email address.
    Email,
    /// An http or https URL.
    Url,
    /// A UUID in canonical form.
    Uuid,
    /// An RFC 3339 date-time.
    DateTime,
}

impl FieldFormat {
    /// Returns the wire name of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Url => "url",
            Self::Uuid => "uuid",
            Self::DateTime => "date-time",
        }
    }
}

impl std::fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of value a field accepts, with the constraints for that kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    /// A string value with optional length and format constraints.
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        min_length: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<FieldFormat>,
    },
    /// A numeric value with optional inclusive bounds.
    Number {
        #[serde(skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// A boolean value.
    Boolean,
    /// A string restricted to a fixed set of options.
    Choice { options: Vec<String> },
}

impl FieldKind {
    /// Returns the JSON type name this kind maps to.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } | Self::Choice { .. } => "string",
            Self::Number { .. } => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Checks whether a JSON value has the right shape for this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Text { .. } | Self::Choice { .. } => value.is_string(),
            Self::Number { .. } => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// A single field declaration within a form schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    /// The field name as it appears in payloads.
    pub name: String,
    /// Human-readable label, used in the introspection document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The kind of value this field accepts.
    pub kind: FieldKind,
    /// Whether the field must be present.
    #[serde(default)]
    pub required: bool,
    /// Value applied when the field is absent. A field with a default is
    /// treated as optional at validation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSpec {
    /// Creates a required text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            kind: FieldKind::Text {
                min_length: None,
                max_length: None,
                format: None,
            },
            required: true,
            default: None,
        }
    }

    /// Creates a required number field.
    pub fn number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            kind: FieldKind::Number {
                minimum: None,
                maximum: None,
            },
            required: true,
            default: None,
        }
    }

    /// Creates a required boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            kind: FieldKind::Boolean,
            required: true,
            default: None,
        }
    }

    /// Creates a required choice field restricted to the given options.
    pub fn choice(
        name: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            title: None,
            kind: FieldKind::Choice {
                options: options.into_iter().map(Into::into).collect(),
            },
            required: true,
            default: None,
        }
    }

    /// Makes this field optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the human-readable title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the default value applied when the field is absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the minimum length. No effect for non-text kinds.
    pub fn min_length(mut self, length: u32) -> Self {
        if let FieldKind::Text { min_length, .. } = &mut self.kind {
            *min_length = Some(length);
        }
        self
    }

    /// Sets the maximum length. No effect for non-text kinds.
    pub fn max_length(mut self, length: u32) -> Self {
        if let FieldKind::Text { max_length, .. } = &mut self.kind {
            *max_length = Some(length);
        }
        self
    }

    /// Sets the required string format. No effect for non-text kinds.
    pub fn format(mut self, format: FieldFormat) -> Self {
        if let FieldKind::Text { format: slot, .. } = &mut self.kind {
            *slot = Some(format);
        }
        self
    }

    /// Sets the inclusive minimum. No effect for non-number kinds.
    pub fn minimum(mut self, value: f64) -> Self {
        if let FieldKind::Number { minimum, .. } = &mut self.kind {
            *minimum = Some(value);
        }
        self
    }

    /// Sets the inclusive maximum. No effect for non-number kinds.
    pub fn maximum(mut self, value: f64) -> Self {
        if let FieldKind::Number { maximum, .. } = &mut self.kind {
            *maximum = Some(value);
        }
        self
    }

    /// Renders this field as a property entry of the introspection document.
    pub fn document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("type".into(), self.kind.type_name().into());
        if let Some(title) = &self.title {
            doc.insert("title".into(), title.clone().into());
        }
        match &self.kind {
            FieldKind::Text {
                min_length,
                max_length,
                format,
            } => {
                if let Some(min) = min_length {
                    doc.insert("minLength".into(), (*min).into());
                }
                if let Some(max) = max_length {
                    doc.insert("maxLength".into(), (*max).into());
                }
                if let Some(format) = format {
                    doc.insert("format".into(), format.as_str().into());
                }
            }
            FieldKind::Number { minimum, maximum } => {
                if let Some(min) = minimum {
                    doc.insert("minimum".into(), (*min).into());
                }
                if let Some(max) = maximum {
                    doc.insert("maximum".into(), (*max).into());
                }
            }
            FieldKind::Boolean => {}
            FieldKind::Choice { options } => {
                doc.insert("enum".into(), options.clone().into());
            }
        }
        if let Some(default) = &self.default {
            doc.insert("default".into(), default.clone());
        }
        Value::Object(doc)
    }
}
