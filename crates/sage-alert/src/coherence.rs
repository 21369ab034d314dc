//! Aggregate health score, its trend, and cycle-over-cycle convergence.

pub use sage_common::report::Convergence;
use sage_common::types::{Insight, InsightDetails, RuleAction, Severity};
use std::collections::VecDeque;

/// Score penalty per fired insight.
pub const INSIGHT_PENALTY: f64 = 0.1;
pub const HISTORY_CAPACITY: usize = 10;
/// Minimum samples before a trend is computed.
pub const TREND_MIN_SAMPLES: usize = 5;
pub const TREND_DECLINE_SLOPE: f64 = -0.02;
pub const TREND_CONFIDENCE: f64 = 0.75;
pub const TREND_RULE_ID: &str = "coherence_declining";

pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.05;
pub const DEFAULT_CONVERGENCE_DEPTH: usize = 3;

/// Cycle coherence: the control-plane score minus a fixed penalty per insight,
/// clamped to `[0, 1]`.
///
/// ```
/// use sage_alert::coherence::coherence_score;
///
/// assert_eq!(coherence_score(1.0, 0), 1.0);
/// assert!((coherence_score(1.0, 3) - 0.7).abs() < 1e-9);
/// assert_eq!(coherence_score(0.0, 2), 0.0);
/// ```
pub fn coherence_score(control_coherence: f64, insight_count: usize) -> f64 {
    (control_coherence - INSIGHT_PENALTY * insight_count as f64).clamp(0.0, 1.0)
}

/// Ring of the most recent cycle scores, oldest first.
#[derive(Debug, Clone)]
pub struct CoherenceHistory {
    scores: VecDeque<f64>,
    capacity: usize,
    trend_confidence: f64,
}

impl Default for CoherenceHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl CoherenceHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            trend_confidence: TREND_CONFIDENCE,
        }
    }

    pub fn with_trend_confidence(mut self, confidence: f64) -> Self {
        self.trend_confidence = confidence;
        self
    }

    pub fn push(&mut self, score: f64) {
        if self.scores.len() == self.capacity {
            self.scores.pop_front();
        }
        self.scores.push_back(score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.scores.back().copied()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.scores.iter().copied().collect()
    }

    /// `(last - first) / count`, once enough samples are retained.
    pub fn trend_slope(&self) -> Option<f64> {
        if self.scores.len() < TREND_MIN_SAMPLES {
            return None;
        }
        let first = *self.scores.front()?;
        let last = *self.scores.back()?;
        Some((last - first) / self.scores.len() as f64)
    }

    pub fn trend_insight(&self) -> Option<Insight> {
        let slope = self.trend_slope()?;
        if slope >= TREND_DECLINE_SLOPE {
            return None;
        }
        tracing::warn!(slope, samples = self.scores.len(), "Coherence declining");
        Some(
            Insight::new(
                TREND_RULE_ID,
                format!("Coherence declining (slope {slope:.3})"),
                Severity::Warning,
                RuleAction::Log,
                self.trend_confidence,
                vec!["system".to_string()],
            )
            .with_details(InsightDetails::CoherenceTrend {
                slope,
                samples: self.scores.len(),
            }),
        )
    }
}

/// Walks `observations` (oldest first) backwards from the newest pair and
/// stops at the first delta under `threshold` or after `max_depth` deltas.
pub fn converge(observations: &[f64], threshold: f64, max_depth: usize) -> Convergence {
    let mut deltas = Vec::new();
    let mut converged = false;

    for pair in observations.windows(2).rev().take(max_depth) {
        let delta = (pair[1] - pair[0]).abs();
        deltas.push(delta);
        if delta < threshold {
            converged = true;
            break;
        }
    }

    Convergence {
        depth: deltas.len(),
        converged,
        deltas,
    }
}
