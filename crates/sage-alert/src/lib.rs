//! Evaluation stage of the monitoring pipeline.
//!
//! Normalized entity state flows through the static rule tables in
//! [`rules`], backend-recorded drain series through
//! [`predictive::PredictiveAnalyzer`], and every predictive emission is
//! gated by an [`cooldown::AlertCooldown`]. [`coherence`] folds the cycle's
//! insights into a single health score and tracks its trend.

pub mod coherence;
pub mod cooldown;
pub mod predictive;
pub mod rules;


pub use cooldown::{AlertCooldown, CooldownKey};
pub use predictive::{PredictiveAnalyzer, PredictiveConfig};
pub use rules::balance::RuleEvaluator;
pub use rules::infrastructure::InfrastructureEvaluator;
