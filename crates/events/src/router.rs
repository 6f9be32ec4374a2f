//! Rule-based routing of envelopes to handler ids.

use serde::{Deserialize, Serialize};

use crate::envelope::EventEnvelope;

/// A named rule binding an exact (source, type) pair to one handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutingRule {
    /// Rule name, for logs and operator tooling.
    pub name: String,
    /// Source the rule matches, e.g. "backoffice.forms".
    pub source: String,
    /// Detail type the rule matches, e.g. "FormSubmitted".
    pub detail_type: String,
    /// Id of the handler to invoke.
    pub handler_id: String,
}

impl RoutingRule {
    /// Creates a new rule.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        detail_type: impl Into<String>,
        handler_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            detail_type: detail_type.into(),
            handler_id: handler_id.into(),
        }
    }

    /// Checks whether this rule matches an envelope. Both fields compare
    /// exactly; there are no wildcards.
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        envelope.matches(&self.source, &self.detail_type)
    }
}

/// Matches envelopes against a fixed rule set.
///
/// Rules are registered at startup and never change afterwards, so routing
/// is a pure function of the rule set and the envelope: the same envelope
/// always yields the same handler ids in the same order.
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    rules: Vec<RoutingRule>,
}

impl EventRouter {
    /// Creates a router with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule. Match order is registration order.
    pub fn rule(mut self, rule: RoutingRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds multiple rules.
    pub fn rules(mut self, rules: Vec<RoutingRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Iterates over the registered rules.
    pub fn iter(&self) -> impl Iterator<Item = &RoutingRule> {
        self.rules.iter()
    }

    /// Returns the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Checks whether the router has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the handler ids of every matching rule, in registration
    /// order, de-duplicated keeping the first occurrence.
    ///
    /// An empty result is a normal outcome, not an error.
    pub fn route(&self, envelope: &EventEnvelope) -> Vec<String> {
        let mut handler_ids: Vec<String> = Vec::new();
        for rule in &self.rules {
            if rule.matches(envelope) && !handler_ids.iter().any(|id| id == &rule.handler_id) {
                tracing::debug!(
                    rule = %rule.name,
                    handler_id = %rule.handler_id,
                    event_id = %envelope.id(),
                    "Rule matched"
                );
                handler_ids.push(rule.handler_id.clone());
            }
        }
        handler_ids
    }
}

/// What to do when no rule matches an envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Log a warning; the unmatched counter increments either way.
    #[default]
    Warn,
    /// Stay silent apart from the counter.
    Ignore,
}
