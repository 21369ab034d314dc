//! Shared data model for the sage monitoring agent.
//!
//! Every pipeline stage speaks in terms of the types defined here: the
//! merged [`types::ServiceMap`] produced by the collectors, the
//! [`types::Insight`] records produced by rule evaluation and prediction,
//! and the seams ([`metrics::MetricsBackend`], [`dispatch::DroneDispatcher`])
//! through which the pipeline reaches external collaborators.

pub mod dispatch;
pub mod identity;
pub mod metrics;
pub mod report;
pub mod types;
pub mod units;

#[cfg(test)]
mod tests;
