//! The intake service: validate, publish, report.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use formbridge_events::{
    BusTransport, DeliveryPipeline, EventEnvelope, EventHandler, EventRouter, HandlerInvoker,
    InMemoryBus, RoutingRule,
};
use formbridge_forms::{
    FormResult, FormSchema, SchemaRegistry, SchemaSummary, ValidationError, Validator,
    validate_payload,
};

use crate::catalog::{self, backoffice};
use crate::config::ServiceConfig;
use crate::response::{IntakeError, IntakeReceipt, ReceiptKind};

/// Builder for [`FormService`].
///
/// Schemas, rules and handlers accumulate here and freeze at `build()`;
/// the running service never mutates them.
pub struct FormServiceBuilder {
    config: ServiceConfig,
    schemas: Vec<FormSchema>,
    rules: Vec<RoutingRule>,
    handlers: Vec<Arc<dyn EventHandler>>,
    transport: Option<Arc<dyn BusTransport>>,
}

impl FormServiceBuilder {
    fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            schemas: Vec::new(),
            rules: Vec::new(),
            handlers: Vec::new(),
            transport: None,
        }
    }

    /// Sets the service configuration.
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a schema.
    pub fn schema(mut self, schema: FormSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Adds multiple schemas.
    pub fn schemas(mut self, schemas: Vec<FormSchema>) -> Self {
        self.schemas.extend(schemas);
        self
    }

    /// Adds a routing rule.
    pub fn rule(mut self, rule: RoutingRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds multiple routing rules.
    pub fn rules(mut self, rules: Vec<RoutingRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Adds a handler.
    pub fn handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Adds multiple handlers.
    pub fn handlers(mut self, handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        self.handlers.extend(handlers);
        self
    }

    /// Sets the bus transport. Without one, an in-memory bus named after
    /// the configured bus name is used.
    pub fn transport(mut self, transport: Arc<dyn BusTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Installs the standard backoffice schemas, rules and handlers.
    pub fn with_standard_catalog(self) -> Self {
        self.schemas(catalog::standard_schemas())
            .rules(catalog::standard_rules())
            .handlers(catalog::standard_handlers())
    }

    /// Builds the service. A duplicate schema id fails here, before
    /// anything is served.
    pub fn build(self) -> Result<FormService, IntakeError> {
        let mut registry = SchemaRegistry::new();
        for schema in self.schemas {
            registry.register(schema)?;
        }
        let registry = Arc::new(registry);

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(InMemoryBus::new(&self.config.bus_name)));

        let router = EventRouter::new().rules(self.rules);
        let mut invoker = HandlerInvoker::new();
        for handler in self.handlers {
            invoker = invoker.handler(handler);
        }

        let mut pipeline = DeliveryPipeline::new(transport, router, invoker)
            .with_unmatched_policy(self.config.unmatched_policy);
        if let Some(timeout) = self.config.delivery_timeout() {
            pipeline = pipeline.with_timeout(timeout);
        }

        tracing::info!(
            schemas = registry.len(),
            rules = pipeline.router().len(),
            handlers = pipeline.invoker().len(),
            "Form service ready"
        );

        Ok(FormService {
            validator: Validator::new(Arc::clone(&registry)),
            registry,
            pipeline,
            config: self.config,
        })
    }
}

/// Validates form payloads and delivers them as events.
///
/// Every intake operation follows the same shape: validate against a
/// named schema, wrap the result in an envelope, and hand it to the
/// delivery pipeline. Validation failures stop the call before anything
/// reaches the bus.
pub struct FormService {
    config: ServiceConfig,
    registry: Arc<SchemaRegistry>,
    validator: Validator,
    pipeline: DeliveryPipeline,
}

impl FormService {
    /// Starts building a service.
    pub fn builder() -> FormServiceBuilder {
        FormServiceBuilder::new()
    }

    /// Builds the standard backoffice service over an in-memory bus.
    pub fn standard() -> Result<Self, IntakeError> {
        Self::builder().with_standard_catalog().build()
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Validates a submission and publishes it as `FormSubmitted`.
    pub async fn submit_form(
        &self,
        schema_id: &str,
        payload: &Value,
    ) -> Result<IntakeReceipt, IntakeError> {
        let validated = self.validator.validate(schema_id, payload)?;
        let submission_id = prefixed_id("submission");

        let detail = json!({
            "submissionId": submission_id,
            "formData": validated.into_value(),
            "timestamp": Utc::now().to_rfc3339(),
        });
        let envelope =
            EventEnvelope::new(&self.config.forms_source, backoffice::FORM_SUBMITTED, detail);

        let report = self.pipeline.execute(&envelope).await?;
        tracing::info!(
            schema_id = %schema_id,
            submission_id = %submission_id,
            status = ?report.status,
            "Form submission delivered"
        );

        Ok(IntakeReceipt {
            id: submission_id,
            kind: ReceiptKind::Submission,
            report,
        })
    }

    /// Validates a payload and publishes it as `FormValidationRequested`.
    pub async fn request_validation(
        &self,
        schema_id: &str,
        payload: &Value,
    ) -> Result<IntakeReceipt, IntakeError> {
        let validated = self.validator.validate(schema_id, payload)?;
        let validation_id = prefixed_id("validation");

        let detail = json!({
            "validationId": validation_id,
            "formData": validated.into_value(),
            "timestamp": Utc::now().to_rfc3339(),
        });
        let envelope = EventEnvelope::new(
            &self.config.forms_source,
            backoffice::FORM_VALIDATION_REQUESTED,
            detail,
        );

        let report = self.pipeline.execute(&envelope).await?;
        tracing::info!(
            schema_id = %schema_id,
            validation_id = %validation_id,
            status = ?report.status,
            "Validation request delivered"
        );

        Ok(IntakeReceipt {
            id: validation_id,
            kind: ReceiptKind::Validation,
            report,
        })
    }

    /// Validates one record or a batch and publishes it as
    /// `DataProcessingRequired`.
    ///
    /// An array payload is validated record by record, with violations
    /// prefixed `records[i].field`; `recordCount` is the array length,
    /// and 1 for a single object.
    pub async fn process_data(
        &self,
        schema_id: &str,
        data: &Value,
    ) -> Result<IntakeReceipt, IntakeError> {
        let (normalized, record_count) = self.validate_records(schema_id, data)?;
        let processing_id = prefixed_id("processing");

        let detail = json!({
            "processingId": processing_id,
            "data": normalized,
            "recordCount": record_count,
            "timestamp": Utc::now().to_rfc3339(),
        });
        let envelope = EventEnvelope::new(
            &self.config.data_source,
            backoffice::DATA_PROCESSING_REQUIRED,
            detail,
        );

        let report = self.pipeline.execute(&envelope).await?;
        tracing::info!(
            schema_id = %schema_id,
            processing_id = %processing_id,
            record_count = record_count,
            status = ?report.status,
            "Data processing request delivered"
        );

        Ok(IntakeReceipt {
            id: processing_id,
            kind: ReceiptKind::Processing,
            report,
        })
    }

    /// Lists the registered schemas in registration order.
    pub fn list_schemas(&self) -> Vec<SchemaSummary> {
        self.registry.list()
    }

    /// Returns the introspection document for a schema.
    pub fn schema_document(&self, schema_id: &str) -> Result<Value, IntakeError> {
        Ok(self.registry.get(schema_id)?.document())
    }

    fn validate_records(&self, schema_id: &str, data: &Value) -> FormResult<(Value, usize)> {
        match data.as_array() {
            Some(records) => {
                let schema = self.validator.registry().get(schema_id)?;
                let mut normalized = Vec::with_capacity(records.len());
                let mut errors: Vec<ValidationError> = Vec::new();
                for (index, record) in records.iter().enumerate() {
                    match validate_payload(schema, record) {
                        Ok(valid) => normalized.push(valid.into_value()),
                        Err(record_errors) => {
                            errors.extend(record_errors.into_iter().map(|e| {
                                ValidationError::new(
                                    format!("records[{}].{}", index, e.field),
                                    e.code,
                                    e.message,
                                )
                            }));
                        }
                    }
                }
                if errors.is_empty() {
                    Ok((Value::Array(normalized), records.len()))
                } else {
                    Err(formbridge_forms::FormError::validation(schema_id, errors))
                }
            }
            None => {
                let validated = self.validator.validate(schema_id, data)?;
                Ok((validated.into_value(), 1))
            }
        }
    }
}

fn prefixed_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::now_v7())
}
