//! End-to-end delivery: publish, route, dispatch.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;

use crate::dispatcher::{DispatchReport, DispatchStatus, HandlerInvoker};
use crate::envelope::EventEnvelope;
use crate::error::EventResult;
use crate::metrics::{PIPELINE_TIMEOUTS, UNMATCHED_EVENTS};
use crate::publisher::{EventPublisher, PublishReceipt};
use crate::router::{EventRouter, UnmatchedPolicy};
use crate::transport::BusTransport;

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Published, routed, every handler succeeded.
    Success,
    /// Published and routed, but at least one handler failed.
    PartialFailure,
    /// Published, but no rule matched.
    NoHandlers,
    /// The caller's deadline elapsed before delivery finished.
    TimedOut,
}

impl From<DispatchStatus> for PipelineStatus {
    fn from(status: DispatchStatus) -> Self {
        match status {
            DispatchStatus::Success => Self::Success,
            DispatchStatus::PartialFailure => Self::PartialFailure,
            DispatchStatus::NoHandlers => Self::NoHandlers,
        }
    }
}

/// Report for one envelope's trip through the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    /// Envelope id the report describes.
    pub envelope_id: String,
    /// Terminal status.
    pub status: PipelineStatus,
    /// Publish receipt; absent when the run timed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<PublishReceipt>,
    /// Dispatch report; absent when the run timed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchReport>,
}

/// Drives an envelope through publish, route and dispatch.
///
/// The three stages always run in order and each works off the previous
/// stage's output. A publish error aborts the run; an empty route does
/// not, it just yields a `NoHandlers` report. With a deadline configured,
/// an overrun returns a `TimedOut` report while handler tasks already
/// started run to completion in the background.
pub struct DeliveryPipeline {
    publisher: EventPublisher,
    router: EventRouter,
    invoker: HandlerInvoker,
    unmatched_policy: UnmatchedPolicy,
    timeout: Option<Duration>,
}

impl DeliveryPipeline {
    /// Creates a pipeline over a transport, rule set and handler set.
    pub fn new(transport: Arc<dyn BusTransport>, router: EventRouter, invoker: HandlerInvoker) -> Self {
        Self {
            publisher: EventPublisher::new(transport),
            router,
            invoker,
            unmatched_policy: UnmatchedPolicy::default(),
            timeout: None,
        }
    }

    /// Sets a deadline for each run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the policy for envelopes no rule matches.
    pub fn with_unmatched_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched_policy = policy;
        self
    }

    /// Returns the router.
    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Returns the invoker.
    pub fn invoker(&self) -> &HandlerInvoker {
        &self.invoker
    }

    /// Delivers one envelope end to end.
    pub async fn execute(&self, envelope: &EventEnvelope) -> EventResult<PipelineReport> {
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run(envelope)).await {
                Ok(report) => report,
                Err(_) => {
                    counter!(PIPELINE_TIMEOUTS).increment(1);
                    tracing::warn!(
                        event_id = %envelope.id(),
                        timeout_ms = limit.as_millis() as u64,
                        "Delivery timed out; handlers already started keep running"
                    );
                    Ok(PipelineReport {
                        envelope_id: envelope.id().to_string(),
                        status: PipelineStatus::TimedOut,
                        receipt: None,
                        dispatch: None,
                    })
                }
            },
            None => self.run(envelope).await,
        }
    }

    async fn run(&self, envelope: &EventEnvelope) -> EventResult<PipelineReport> {
        let receipt = self.publisher.publish(envelope).await?;

        let handler_ids = self.router.route(envelope);
        if handler_ids.is_empty() {
            counter!(UNMATCHED_EVENTS).increment(1);
            if self.unmatched_policy == UnmatchedPolicy::Warn {
                tracing::warn!(
                    source = %envelope.source(),
                    detail_type = %envelope.detail_type(),
                    event_id = %envelope.id(),
                    "No rule matched the published event"
                );
            }
        }

        let dispatch = self.invoker.dispatch(envelope, &handler_ids).await;

        Ok(PipelineReport {
            envelope_id: envelope.id().to_string(),
            status: dispatch.status.into(),
            receipt: Some(receipt),
            dispatch: Some(dispatch),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EventError;
    use crate::handler::{EventHandler, FnHandler, HandlerResponse};
    use crate::memory::InMemoryBus;
    use crate::router::RoutingRule;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok_handler(id: &str) -> Arc<dyn EventHandler> {
        Arc::new(FnHandler::new(id, |_: &EventEnvelope| {
            Box::pin(async { Ok(HandlerResponse::ok(Value::Null)) })
        }))
    }

    fn pipeline(bus: Arc<InMemoryBus>) -> DeliveryPipeline {
        let router = EventRouter::new()
            .rule(RoutingRule::new(
                "form-submission-rule",
                "backoffice.forms",
                "FormSubmitted",
                "handlerX",
            ))
            .rule(RoutingRule::new(
                "form-audit-rule",
                "backoffice.forms",
                "FormSubmitted",
                "handlerY",
            ));
        let invoker = HandlerInvoker::new()
            .handler(ok_handler("handlerX"))
            .handler(ok_handler("handlerY"));
        DeliveryPipeline::new(bus, router, invoker)
    }

    #[tokio::test]
    async fn test_full_delivery_succeeds() {
        let bus = Arc::new(InMemoryBus::new("backoffice-event-bus"));
        let pipeline = pipeline(Arc::clone(&bus));

        let envelope = EventEnvelope::new("backoffice.forms", "FormSubmitted", json!({"formId": "f-1"}));
        let report = pipeline.execute(&envelope).await.unwrap();

        assert_eq!(report.status, PipelineStatus::Success);
        assert_eq!(report.envelope_id, envelope.id());
        assert_eq!(report.receipt.as_ref().unwrap().count(), 1);
        assert_eq!(report.dispatch.as_ref().unwrap().outcomes.len(), 2);
        assert_eq!(bus.accepted_count().await, 1);
    }

    #[tokio::test]
    async fn test_unmatched_event_is_published_but_not_dispatched() {
        let bus = Arc::new(InMemoryBus::new("backoffice-event-bus"));
        let pipeline = pipeline(Arc::clone(&bus));

        let envelope = EventEnvelope::new("backoffice.data", "DataProcessingRequired", json!({}));
        let report = pipeline.execute(&envelope).await.unwrap();

        assert_eq!(report.status, PipelineStatus::NoHandlers);
        assert!(report.dispatch.as_ref().unwrap().outcomes.is_empty());
        // The envelope still reached the bus.
        assert_eq!(bus.accepted_count().await, 1);
    }

    #[tokio::test]
    async fn test_handler_failure_yields_partial_failure() {
        let bus = Arc::new(InMemoryBus::new("backoffice-event-bus"));
        let router = EventRouter::new().rule(RoutingRule::new(
            "form-submission-rule",
            "backoffice.forms",
            "FormSubmitted",
            "handlerF",
        ));
        let failing: Arc<dyn EventHandler> = Arc::new(FnHandler::new(
            "handlerF",
            |_: &EventEnvelope| Box::pin(async { Err(EventError::internal("down")) }),
        ));
        let pipeline = DeliveryPipeline::new(bus, router, HandlerInvoker::new().handler(failing));

        let envelope = EventEnvelope::new("backoffice.forms", "FormSubmitted", json!({}));
        let report = pipeline.execute(&envelope).await.unwrap();

        assert_eq!(report.status, PipelineStatus::PartialFailure);
        assert_eq!(report.dispatch.as_ref().unwrap().failure_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_error_aborts_the_run() {
        struct DownTransport;

        #[async_trait::async_trait]
        impl crate::transport::BusTransport for DownTransport {
            fn name(&self) -> &str {
                "down"
            }

            async fn send_batch(
                &self,
                _entries: Vec<crate::transport::EventEntry>,
            ) -> EventResult<Vec<crate::transport::EntryDisposition>> {
                Err(EventError::transport("connection refused"))
            }
        }

        let pipeline = DeliveryPipeline::new(
            Arc::new(DownTransport),
            EventRouter::new(),
            HandlerInvoker::new(),
        );

        let envelope = EventEnvelope::new("backoffice.forms", "FormSubmitted", json!({}));
        let error = pipeline.execute(&envelope).await.unwrap_err();

        assert!(error.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_overrun_reports_timed_out() {
        static STARTED: AtomicUsize = AtomicUsize::new(0);
        static FINISHED: AtomicUsize = AtomicUsize::new(0);

        let slow: Arc<dyn EventHandler> = Arc::new(FnHandler::new(
            "handlerSlow",
            |_: &EventEnvelope| {
                Box::pin(async {
                    STARTED.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    FINISHED.fetch_add(1, Ordering::SeqCst);
                    Ok(HandlerResponse::ok(Value::Null))
                })
            },
        ));

        let bus = Arc::new(InMemoryBus::new("backoffice-event-bus"));
        let router = EventRouter::new().rule(RoutingRule::new(
            "slow-rule",
            "backoffice.forms",
            "FormSubmitted",
            "handlerSlow",
        ));
        let pipeline = DeliveryPipeline::new(bus, router, HandlerInvoker::new().handler(slow))
            .with_timeout(Duration::from_millis(100));

        let envelope = EventEnvelope::new("backoffice.forms", "FormSubmitted", json!({}));
        let report = pipeline.execute(&envelope).await.unwrap();

        assert_eq!(report.status, PipelineStatus::TimedOut);
        assert!(report.receipt.is_none());
        assert!(report.dispatch.is_none());

        // The handler task was started, detached, and keeps running past
        // the deadline rather than being aborted.
        assert_eq!(STARTED.load(Ordering::SeqCst), 1);
        assert_eq!(FINISHED.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(FINISHED.load(Ordering::SeqCst), 1);
    }
}
