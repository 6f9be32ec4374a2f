//! Registry for form schemas.

use std::collections::HashMap;

use crate::error::{FormError, FormResult};
use crate::schema::{FormSchema, SchemaSummary};

/// Registry mapping schema ids to their definitions.
///
/// The registry is populated during startup and shared read-only afterwards
/// (typically behind an `Arc`), so lookups take `&self` and registration
/// takes `&mut self`.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, FormSchema>,
    /// Ids in registration order, for stable listings.
    order: Vec<String>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema.
    ///
    /// Fails with `DuplicateSchema` if the id is already taken; the existing
    /// schema is never replaced.
    pub fn register(&mut self, schema: FormSchema) -> FormResult<()> {
        if self.schemas.contains_key(&schema.id) {
            return Err(FormError::duplicate(&schema.id));
        }

        tracing::info!(schema_id = %schema.id, "Registered form schema");
        self.order.push(schema.id.clone());
        self.schemas.insert(schema.id.clone(), schema);
        Ok(())
    }

    /// Gets a schema by id.
    pub fn get(&self, id: &str) -> FormResult<&FormSchema> {
        self.schemas.get(id).ok_or_else(|| FormError::not_found(id))
    }

    /// Checks whether a schema id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Lists schema summaries in registration order.
    pub fn list(&self) -> Vec<SchemaSummary> {
        self.order
            .iter()
            .filter_map(|id| self.schemas.get(id))
            .map(FormSchema::summary)
            .collect()
    }

    /// Returns the number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Checks whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
