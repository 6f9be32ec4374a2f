//! Concurrent handler fan-out with per-handler isolation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;

use crate::envelope::EventEnvelope;
use crate::handler::{EventHandler, HandlerResponse};
use crate::metrics::HANDLER_FAILURES;

/// Outcome of one handler invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerOutcome {
    /// Handler identifier.
    pub handler_id: String,
    /// Whether the handler succeeded.
    pub success: bool,
    /// Response body, when the handler produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl HandlerOutcome {
    /// Creates a successful outcome.
    pub fn success(handler_id: impl Into<String>, detail: Value, duration_ms: u64) -> Self {
        Self {
            handler_id: handler_id.into(),
            success: true,
            detail: Some(detail),
            error: None,
            duration_ms,
        }
    }

    /// Creates a failed outcome.
    pub fn failure(
        handler_id: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            handler_id: handler_id.into(),
            success: false,
            detail: None,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// Creates a failed outcome from a non-2xx response, keeping the body.
    pub fn rejected(handler_id: impl Into<String>, response: HandlerResponse, duration_ms: u64) -> Self {
        Self {
            handler_id: handler_id.into(),
            success: false,
            error: Some(format!("Handler returned status {}", response.status_code)),
            detail: Some(response.body),
            duration_ms,
        }
    }
}

/// Aggregate status of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// Every handler succeeded.
    Success,
    /// At least one handler failed; the rest still ran.
    PartialFailure,
    /// No handler was selected for the envelope.
    NoHandlers,
}

/// Report covering one dispatch of an envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// Aggregate status.
    pub status: DispatchStatus,
    /// One outcome per selected handler, in selection order.
    pub outcomes: Vec<HandlerOutcome>,
}

impl DispatchReport {
    /// Counts the handlers that succeeded.
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Counts the handlers that failed.
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }
}

/// Invokes registered handlers concurrently and collects their outcomes.
///
/// Handlers are registered at startup and looked up by id at dispatch
/// time. Each invocation runs in its own task: a failing or panicking
/// handler never disturbs the others, and handler errors never escape as
/// pipeline errors.
#[derive(Default)]
pub struct HandlerInvoker {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerInvoker {
    /// Creates an invoker with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its own id. A later registration with
    /// the same id replaces the earlier one.
    pub fn handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.insert(handler.id().to_string(), handler);
        self
    }

    /// Checks whether a handler id is registered.
    pub fn contains(&self, handler_id: &str) -> bool {
        self.handlers.contains_key(handler_id)
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Checks whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invokes the named handlers concurrently for one envelope.
    ///
    /// Outcomes come back in `handler_ids` order regardless of finish
    /// order. An id with no registered handler produces a failed outcome
    /// rather than an error.
    pub async fn dispatch(&self, envelope: &EventEnvelope, handler_ids: &[String]) -> DispatchReport {
        if handler_ids.is_empty() {
            return DispatchReport {
                status: DispatchStatus::NoHandlers,
                outcomes: Vec::new(),
            };
        }

        let mut tasks = Vec::with_capacity(handler_ids.len());
        for handler_id in handler_ids {
            let task = self.handlers.get(handler_id).map(|handler| {
                let handler = Arc::clone(handler);
                let envelope = envelope.clone();
                tokio::spawn(async move {
                    let start = Instant::now();
                    let result = handler.invoke(&envelope).await;
                    (result, start.elapsed().as_millis() as u64)
                })
            });
            tasks.push((handler_id.clone(), task));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (handler_id, task) in tasks {
            let outcome = match task {
                None => HandlerOutcome::failure(&handler_id, "No handler registered for this id", 0),
                Some(task) => match task.await {
                    Ok((Ok(response), duration_ms)) if response.is_success() => {
                        HandlerOutcome::success(&handler_id, response.body, duration_ms)
                    }
                    Ok((Ok(response), duration_ms)) => {
                        HandlerOutcome::rejected(&handler_id, response, duration_ms)
                    }
                    Ok((Err(e), duration_ms)) => {
                        HandlerOutcome::failure(&handler_id, e.to_string(), duration_ms)
                    }
                    Err(e) if e.is_panic() => {
                        HandlerOutcome::failure(&handler_id, "Handler panicked", 0)
                    }
                    Err(_) => HandlerOutcome::failure(&handler_id, "Handler task was cancelled", 0),
                },
            };

            if !outcome.success {
                metrics::counter!(HANDLER_FAILURES).increment(1);
                tracing::warn!(
                    handler_id = %outcome.handler_id,
                    event_id = %envelope.id(),
                    error = outcome.error.as_deref().unwrap_or(""),
                    "Handler invocation failed"
                );
            }
            outcomes.push(outcome);
        }

        let status = if outcomes.iter().all(|o| o.success) {
            DispatchStatus::Success
        } else {
            DispatchStatus::PartialFailure
        };

        DispatchReport { status, outcomes }
    }
}
