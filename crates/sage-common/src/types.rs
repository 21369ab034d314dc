use crate::dispatch::DispatchResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// Maximum number of entities listed on a single insight. Longer lists are
/// cut silently.
pub const MAX_AFFECTED_SERVICES: usize = 20;

/// A single field of a service's observed state.
///
/// Wei magnitudes are always stored as [`FieldValue::Integer`] so that rule
/// code never has to guess units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(u128),
    Number(f64),
    Text(String),
    Labels(BTreeMap<String, String>),
}

impl FieldValue {
    /// Numeric view of the value. Text and label sets are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<u128> for FieldValue {
    fn from(v: u128) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "{v}"),
            FieldValue::Labels(labels) => {
                let pairs: Vec<String> = labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

/// Observed fields of one entity. There is no fixed schema: each adapter
/// populates its own subset.
pub type ServiceState = BTreeMap<String, FieldValue>;

/// All observed entities, keyed by identity (e.g. `o2-wallet:0xabc`,
/// `node:10.0.0.1:9100`).
pub type ServiceMap = BTreeMap<String, ServiceState>;

/// Insight severity, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use sage_common::types::Severity;
///
/// let sev: Severity = "error".parse().unwrap();
/// assert_eq!(sev, Severity::Error);
/// assert_eq!(sev.to_string(), "error");
/// assert!(Severity::Critical > Severity::Warning);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// What the dispatcher should do with an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Log,
    Alert,
    DispatchDrone,
}

impl std::fmt::Display for RuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleAction::Log => write!(f, "log"),
            RuleAction::Alert => write!(f, "alert"),
            RuleAction::DispatchDrone => write!(f, "dispatch_drone"),
        }
    }
}

/// Structured payload attached to some insights.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightDetails {
    TimeToEmpty {
        tte_minutes: f64,
        current_balance: f64,
        drain_rate_per_hour: f64,
    },
    CorrelatedDrain {
        wallet_count: usize,
        total_drain_rate: f64,
        min_drain_threshold: f64,
    },
    Infrastructure {
        value: FieldValue,
        threshold: FieldValue,
        #[serde(skip_serializing_if = "Option::is_none")]
        dispatch_result: Option<DispatchResult>,
    },
    CoherenceTrend {
        slope: f64,
        samples: usize,
    },
}

/// A fired condition, created fresh each cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub rule_id: String,
    pub description: String,
    pub severity: Severity,
    pub affected_services: Vec<String>,
    pub confidence: f64,
    pub action: RuleAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<InsightDetails>,
}

impl Insight {
    /// Builds an insight, truncating `affected_services` to
    /// [`MAX_AFFECTED_SERVICES`] and clamping `confidence` into `[0, 1]`.
    pub fn new(
        rule_id: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        action: RuleAction,
        confidence: f64,
        mut affected_services: Vec<String>,
    ) -> Self {
        affected_services.truncate(MAX_AFFECTED_SERVICES);
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            severity,
            affected_services,
            confidence: confidence.clamp(0.0, 1.0),
            action,
            details: None,
        }
    }

    pub fn with_details(mut self, details: InsightDetails) -> Self {
        self.details = Some(details);
        self
    }
}
