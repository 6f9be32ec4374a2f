//! Form schema definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::field::FieldSpec;

/// A named form schema: an ordered set of field specifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormSchema {
    /// Unique schema id, e.g. "userRegistration".
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// The fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    /// Creates a new schema with no fields.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the schema.
    ///
    /// Field names are unique within a schema; a redeclared name is ignored
    /// and the first declaration wins.
    pub fn field(mut self, field: FieldSpec) -> Self {
        if !self.fields.iter().any(|f| f.name == field.name) {
            self.fields.push(field);
        }
        self
    }

    /// Adds multiple fields to the schema.
    pub fn fields(mut self, fields: Vec<FieldSpec>) -> Self {
        for field in fields {
            self = self.field(field);
        }
        self
    }

    /// Gets a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns a summary of this schema for listings.
    pub fn summary(&self) -> SchemaSummary {
        SchemaSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }

    /// Renders the JSON-Schema-like introspection document.
    ///
    /// Fields with a default are not listed as required, matching how the
    /// validator treats them.
    pub fn document(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            properties.insert(field.name.clone(), field.document());
            if field.required && field.default.is_none() {
                required.push(Value::String(field.name.clone()));
            }
        }

        json!({
            "title": self.title,
            "type": "object",
            "required": required,
            "properties": properties,
        })
    }
}

/// A schema id and title, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaSummary {
    pub id: String,
    pub title: String,
}
