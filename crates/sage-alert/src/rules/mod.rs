//! Static rule tables and the predicate model they are written in.

pub mod balance;
pub mod infrastructure;

use sage_common::types::{FieldValue, RuleAction, Severity};
use sage_common::units::tokens_to_wei;
use std::str::FromStr;

/// Fields that hold a wallet balance in some unit.
pub const BALANCE_FIELDS: [&str; 3] = ["balance", "balance_wei", "balance_tokens"];

/// Field compared by status predicates.
pub const STATUS_FIELD: &str = "status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Self::LessThan),
            ">" => Ok(Self::GreaterThan),
            "==" => Ok(Self::Equal),
            "!=" => Ok(Self::NotEqual),
            _ => Err(format!("unknown compare operator: {s}")),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LessThan => write!(f, "<"),
            Self::GreaterThan => write!(f, ">"),
            Self::Equal => write!(f, "=="),
            Self::NotEqual => write!(f, "!="),
        }
    }
}

impl CompareOp {
    /// Ordinary numeric comparison. `==`/`!=` are exact, with no epsilon.
    pub fn check<T: PartialOrd>(&self, value: T, threshold: T) -> bool {
        match self {
            Self::LessThan => value < threshold,
            Self::GreaterThan => value > threshold,
            Self::Equal => value == threshold,
            Self::NotEqual => value != threshold,
        }
    }

    /// Text comparison. Ordering operators never match text.
    pub fn check_text(&self, value: &str, threshold: &str) -> bool {
        match self {
            Self::Equal => value == threshold,
            Self::NotEqual => value != threshold,
            Self::LessThan | Self::GreaterThan => false,
        }
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    /// A plain number; for balance fields this is whole tokens.
    Number(f64),
    Text(String),
}

impl Threshold {
    pub fn to_field_value(&self) -> FieldValue {
        match self {
            Threshold::Number(v) => FieldValue::Number(*v),
            Threshold::Text(s) => FieldValue::Text(s.clone()),
        }
    }

    /// Applies `op` to a raw field value. A field/threshold type mismatch
    /// never matches.
    pub fn matches(&self, op: CompareOp, value: &FieldValue) -> bool {
        match (self, value) {
            (Threshold::Number(t), v) => v.as_f64().is_some_and(|v| op.check(v, *t)),
            (Threshold::Text(t), FieldValue::Text(v)) => op.check_text(v, t),
            (Threshold::Text(_), _) => false,
        }
    }
}

/// How a predicate's field is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    /// Balance-like field, compared after normalization to wei.
    Balance,
    /// Raw status string, compared by equality.
    Status,
    /// No handler: the predicate fires for nobody.
    Unhandled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: CompareOp,
    pub threshold: Option<Threshold>,
    /// Exact wei cutoff. Takes precedence over a token `threshold`.
    pub threshold_wei: Option<u128>,
}

impl Predicate {
    pub fn new(field: &str, op: CompareOp, threshold: Threshold) -> Self {
        Self {
            field: field.to_string(),
            op,
            threshold: Some(threshold),
            threshold_wei: None,
        }
    }

    pub fn number(field: &str, op: CompareOp, threshold: f64) -> Self {
        Self::new(field, op, Threshold::Number(threshold))
    }

    pub fn text(field: &str, op: CompareOp, threshold: &str) -> Self {
        Self::new(field, op, Threshold::Text(threshold.to_string()))
    }

    pub fn wei(field: &str, op: CompareOp, threshold_wei: u128) -> Self {
        Self {
            field: field.to_string(),
            op,
            threshold: None,
            threshold_wei: Some(threshold_wei),
        }
    }

    pub fn kind(&self) -> PredicateKind {
        if BALANCE_FIELDS.contains(&self.field.as_str()) {
            PredicateKind::Balance
        } else if self.field == STATUS_FIELD {
            PredicateKind::Status
        } else {
            PredicateKind::Unhandled
        }
    }

    /// Resolved wei cutoff: the wei threshold verbatim, else the token
    /// threshold times 10^18. `None` when neither is usable.
    pub fn resolved_wei_threshold(&self) -> Option<u128> {
        if let Some(wei) = self.threshold_wei {
            return Some(wei);
        }
        match &self.threshold {
            Some(Threshold::Number(tokens)) => Some(tokens_to_wei(*tokens)),
            _ => None,
        }
    }
}

/// One immutable entry of a rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub predicate: Predicate,
    pub severity: Severity,
    pub action: RuleAction,
}

impl Rule {
    pub fn new(
        id: &str,
        description: &str,
        predicate: Predicate,
        severity: Severity,
        action: RuleAction,
    ) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
            predicate,
            severity,
            action,
        }
    }
}

/// Rules applied to wallet entities.
pub fn wallet_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "o2_low_balance",
            "O2 wallet balance critically low",
            Predicate::number("balance", CompareOp::LessThan, 10_000.0),
            Severity::Warning,
            RuleAction::Alert,
        ),
        Rule::new(
            "o2_zero_balance",
            "O2 wallet balance is zero",
            Predicate::number("balance", CompareOp::Equal, 0.0),
            Severity::Critical,
            RuleAction::Alert,
        ),
        Rule::new(
            "o2_service_down",
            "O2 wallet service unreachable",
            Predicate::text(STATUS_FIELD, CompareOp::Equal, "degraded"),
            Severity::Error,
            RuleAction::Alert,
        ),
    ]
}

/// Rules applied to infrastructure sensor entities.
pub fn infrastructure_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "hvac_temp_critical",
            "HVAC temperature critically high",
            Predicate::number("hvac_temp", CompareOp::GreaterThan, 85.0),
            Severity::Critical,
            RuleAction::DispatchDrone,
        ),
        Rule::new(
            "hvac_offline",
            "HVAC system offline",
            Predicate::text("hvac_status", CompareOp::Equal, "offline"),
            Severity::Error,
            RuleAction::DispatchDrone,
        ),
        Rule::new(
            "power_anomaly",
            "Power consumption anomaly detected",
            Predicate::number("power_watts", CompareOp::GreaterThan, 50_000.0),
            Severity::Warning,
            RuleAction::DispatchDrone,
        ),
    ]
}
