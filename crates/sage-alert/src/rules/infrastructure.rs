use super::Rule;
use sage_common::dispatch::{DispatchRequest, DroneDispatcher};
use sage_common::types::{Insight, InsightDetails, RuleAction, ServiceMap};

/// Identity prefixes of infrastructure sensor groups.
pub const INFRASTRUCTURE_PREFIXES: [&str; 3] = ["hvac-", "power-", "cooling-"];

pub fn is_infrastructure_entity(key: &str) -> bool {
    INFRASTRUCTURE_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

/// Evaluates infrastructure rules against raw sensor fields.
///
/// Unlike the wallet table this emits one insight per (entity, rule) pair.
/// Rules tagged [`RuleAction::DispatchDrone`] dispatch inline and carry the
/// dispatch result in their details.
pub struct InfrastructureEvaluator {
    rules: Vec<Rule>,
    confidence: f64,
}

impl InfrastructureEvaluator {
    pub fn new(rules: Vec<Rule>, confidence: f64) -> Self {
        Self { rules, confidence }
    }

    pub async fn evaluate(
        &self,
        services: &ServiceMap,
        dispatcher: &dyn DroneDispatcher,
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        for (entity, state) in services
            .iter()
            .filter(|(key, _)| is_infrastructure_entity(key))
        {
            for rule in &self.rules {
                let Some(value) = state.get(&rule.predicate.field) else {
                    continue;
                };
                let Some(threshold) = &rule.predicate.threshold else {
                    tracing::warn!(rule_id = %rule.id, "Infrastructure rule has no threshold, skipping");
                    continue;
                };
                if !threshold.matches(rule.predicate.op, value) {
                    continue;
                }

                tracing::warn!(
                    entity = %entity,
                    rule_id = %rule.id,
                    value = %value,
                    "Infrastructure alert: {}",
                    rule.description
                );

                let dispatch_result = if rule.action == RuleAction::DispatchDrone {
                    let request = DispatchRequest {
                        entity: entity.clone(),
                        rule_id: rule.id.clone(),
                        description: rule.description.clone(),
                        severity: rule.severity,
                    };
                    let result = dispatcher.dispatch(&request).await;
                    if result.is_dispatched() {
                        tracing::info!(entity = %entity, result = ?result, "Drone mission accepted");
                    } else {
                        tracing::error!(entity = %entity, result = ?result, "Drone dispatch failed");
                    }
                    Some(result)
                } else {
                    None
                };

                insights.push(
                    Insight::new(
                        rule.id.clone(),
                        rule.description.clone(),
                        rule.severity,
                        rule.action,
                        self.confidence,
                        vec![entity.clone()],
                    )
                    .with_details(InsightDetails::Infrastructure {
                        value: value.clone(),
                        threshold: threshold.to_field_value(),
                        dispatch_result,
                    }),
                );
            }
        }

        insights
    }
}
