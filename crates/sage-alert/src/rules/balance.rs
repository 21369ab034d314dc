use super::{PredicateKind, Rule, Threshold};
use sage_common::identity::WALLET_PREFIX;
use sage_common::types::{FieldValue, Insight, ServiceMap, ServiceState};
use sage_common::units::tokens_to_wei;
use std::collections::BTreeMap;

/// Confidence attached to every rule-table insight.
pub const DEFAULT_RULE_CONFIDENCE: f64 = 0.95;

/// Normalizes an entity's balance to wei.
///
/// Precedence: `balance_wei` as-is, then `balance_tokens` × 10^18, then the
/// legacy `balance` × 10^18. Returns `None` when none of them is numeric.
pub fn normalized_balance_wei(state: &ServiceState) -> Option<u128> {
    if let Some(wei) = state.get("balance_wei") {
        match wei {
            FieldValue::Integer(v) => return Some(*v),
            FieldValue::Number(v) => return Some(*v as u128),
            _ => {}
        }
    }
    ["balance_tokens", "balance"]
        .iter()
        .find_map(|field| state.get(*field).and_then(FieldValue::as_f64))
        .map(tokens_to_wei)
}

/// Evaluates a table of balance/status rules over the entities in scope.
///
/// Emits at most one insight per rule, listing every matching entity.
/// Insights are not rate limited: a persistent condition fires every cycle.
pub struct RuleEvaluator {
    rules: Vec<Rule>,
    scope_prefix: String,
    confidence: f64,
}

impl RuleEvaluator {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            scope_prefix: WALLET_PREFIX.to_string(),
            confidence: DEFAULT_RULE_CONFIDENCE,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn evaluate(&self, services: &ServiceMap) -> Vec<Insight> {
        let candidates: BTreeMap<&String, &ServiceState> = services
            .iter()
            .filter(|(key, _)| key.starts_with(&self.scope_prefix))
            .collect();

        if candidates.is_empty() {
            tracing::debug!(scope = %self.scope_prefix, "No entities in rule scope");
            return Vec::new();
        }

        let balances: BTreeMap<&String, u128> = candidates
            .iter()
            .filter_map(|(key, state)| normalized_balance_wei(state).map(|wei| (*key, wei)))
            .collect();

        let mut insights = Vec::new();
        for rule in &self.rules {
            let fired = match rule.predicate.kind() {
                PredicateKind::Balance => {
                    let Some(threshold) = rule.predicate.resolved_wei_threshold() else {
                        tracing::warn!(rule_id = %rule.id, "Rule has no usable threshold, skipping");
                        continue;
                    };
                    balances
                        .iter()
                        .filter(|(_, wei)| rule.predicate.op.check(**wei, threshold))
                        .map(|(key, _)| (*key).clone())
                        .collect::<Vec<_>>()
                }
                PredicateKind::Status => {
                    let Some(Threshold::Text(expected)) = &rule.predicate.threshold else {
                        tracing::warn!(rule_id = %rule.id, "Status rule has no text threshold, skipping");
                        continue;
                    };
                    candidates
                        .iter()
                        .filter(|(_, state)| {
                            state
                                .get(&rule.predicate.field)
                                .and_then(FieldValue::as_text)
                                .is_some_and(|v| rule.predicate.op.check_text(v, expected))
                        })
                        .map(|(key, _)| (*key).clone())
                        .collect()
                }
                PredicateKind::Unhandled => Vec::new(),
            };

            if fired.is_empty() {
                continue;
            }

            tracing::info!(rule_id = %rule.id, count = fired.len(), "Rule fired");
            insights.push(Insight::new(
                rule.id.clone(),
                rule.description.clone(),
                rule.severity,
                rule.action,
                self.confidence,
                fired,
            ));
        }

        insights
    }
}
