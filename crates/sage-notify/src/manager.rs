use crate::error::NotifyError;
use crate::heartbeat::HeartbeatSink;
use crate::NotificationChannel;
use sage_common::report::CycleReport;
use sage_common::types::{Insight, InsightDetails, RuleAction, Severity};

/// Chat message for one insight: severity, rule, description, affected
/// entities and confidence percentage.
pub fn format_alert_message(insight: &Insight) -> String {
    format!(
        "*Sage Alert*\n\n\
         *Severity:* {}\n\
         *Rule:* {}\n\
         *Description:* {}\n\
         *Affected Services:* {}\n\
         *Confidence:* {:.0}%",
        insight.severity.to_string().to_uppercase(),
        insight.rule_id,
        insight.description,
        insight.affected_services.join(", "),
        insight.confidence * 100.0,
    )
}

/// Whether an insight is pushed to the chat channel.
pub fn should_notify(insight: &Insight) -> bool {
    insight.action == RuleAction::Alert && insight.severity >= Severity::Warning
}

fn log_insight(insight: &Insight) {
    let affected = insight.affected_services.join(", ");
    match insight.severity {
        Severity::Critical => tracing::error!(
            critical = true,
            rule_id = %insight.rule_id,
            affected = %affected,
            "{}",
            insight.description
        ),
        Severity::Error => tracing::error!(
            rule_id = %insight.rule_id,
            affected = %affected,
            "{}",
            insight.description
        ),
        Severity::Warning => tracing::warn!(
            rule_id = %insight.rule_id,
            affected = %affected,
            "{}",
            insight.description
        ),
        Severity::Info => tracing::info!(
            rule_id = %insight.rule_id,
            affected = %affected,
            "{}",
            insight.description
        ),
    }
}

/// What [`ActionDispatcher::act`] did with a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActOutcome {
    pub notified: usize,
    pub notify_failures: usize,
    pub heartbeat_sent: bool,
}

/// Turns a cycle report into side effects: logs, chat alerts and the heartbeat.
///
/// Every failure is logged and swallowed so the driver loop keeps running.
pub struct ActionDispatcher {
    channel: Box<dyn NotificationChannel>,
    heartbeat: Box<dyn HeartbeatSink>,
}

impl ActionDispatcher {
    pub fn new(channel: Box<dyn NotificationChannel>, heartbeat: Box<dyn HeartbeatSink>) -> Self {
        Self { channel, heartbeat }
    }

    pub async fn act(&self, report: &CycleReport) -> ActOutcome {
        let mut outcome = ActOutcome::default();

        for insight in &report.insights {
            log_insight(insight);

            if insight.action == RuleAction::DispatchDrone {
                if let Some(InsightDetails::Infrastructure {
                    dispatch_result: Some(result),
                    ..
                }) = &insight.details
                {
                    tracing::info!(rule_id = %insight.rule_id, result = ?result, "Drone dispatch outcome");
                }
            }

            if !should_notify(insight) {
                continue;
            }
            match self.channel.send(&format_alert_message(insight)).await {
                Ok(()) => outcome.notified += 1,
                Err(NotifyError::NotConfigured(_)) => {}
                Err(e) => {
                    outcome.notify_failures += 1;
                    tracing::error!(
                        channel = self.channel.channel_name(),
                        rule_id = %insight.rule_id,
                        error = %e,
                        "Failed to send notification"
                    );
                }
            }
        }

        match self.heartbeat.beat(report).await {
            Ok(()) => outcome.heartbeat_sent = true,
            Err(e) => tracing::debug!(error = %e, "Heartbeat not delivered"),
        }

        outcome
    }
}
