//! Event handler trait and built-in handler kinds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::EventEnvelope;
use crate::error::{EventError, EventResult};

/// Response returned by a handler invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    /// HTTP-style status code.
    pub status_code: u16,
    /// Response body.
    pub body: Value,
}

impl HandlerResponse {
    /// Creates a 200 response.
    pub fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    /// Creates a response with an explicit status code.
    pub fn with_status(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    /// Checks whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Trait for event handlers.
///
/// Handlers receive the full envelope and report their outcome as a
/// [`HandlerResponse`]. Returning an error, or a non-2xx response, marks
/// the invocation failed without affecting any other handler.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Returns a unique identifier for this handler.
    fn id(&self) -> &str;

    /// Handles a delivered envelope.
    async fn invoke(&self, envelope: &EventEnvelope) -> EventResult<HandlerResponse>;
}

/// A boxed event handler.
pub type BoxedHandler = Box<dyn EventHandler>;

type HandlerFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = EventResult<HandlerResponse>> + Send>>;

/// Wrapper for function-based handlers.
pub struct FnHandler<F>
where
    F: Fn(&EventEnvelope) -> HandlerFuture + Send + Sync,
{
    id: String,
    handler: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&EventEnvelope) -> HandlerFuture + Send + Sync,
{
    /// Creates a new function handler.
    pub fn new(id: impl Into<String>, handler: F) -> Self {
        Self {
            id: id.into(),
            handler,
        }
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&EventEnvelope) -> HandlerFuture + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, envelope: &EventEnvelope) -> EventResult<HandlerResponse> {
        (self.handler)(envelope).await
    }
}

/// Handler that posts the envelope to an HTTP endpoint.
///
/// The endpoint's status code becomes the response status; a JSON body is
/// passed through as-is, anything else is wrapped as a string.
#[cfg(feature = "http-client")]
pub struct HttpHandler {
    id: String,
    url: String,
    client: reqwest::Client,
    timeout: std::time::Duration,
}

#[cfg(feature = "http-client")]
impl HttpHandler {
    /// Creates a new HTTP handler targeting a URL.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            client: reqwest::Client::new(),
            timeout: std::time::Duration::from_secs(10),
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(feature = "http-client")]
#[async_trait]
impl EventHandler for HttpHandler {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, envelope: &EventEnvelope) -> EventResult<HandlerResponse> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(envelope)
            .send()
            .await
            .map_err(|e| EventError::transport(e.to_string()))?;

        let status_code = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| EventError::transport(e.to_string()))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        Ok(HandlerResponse::with_status(status_code, body))
    }
}
