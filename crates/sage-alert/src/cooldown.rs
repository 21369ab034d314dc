use chrono::{DateTime, Duration, Utc};
use sage_common::types::Severity;
use std::collections::HashMap;

/// Default cooldown between repeated alerts for the same key.
pub const DEFAULT_COOLDOWN_SECS: u64 = 900;

/// Identity of a rate-limited alert.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CooldownKey {
    /// A per-entity alert of a given severity.
    Entity { entity: String, severity: Severity },
    /// The single correlated-drain alert, independent of which entities drain.
    CorrelatedDrain,
}

impl CooldownKey {
    pub fn entity(entity: impl Into<String>, severity: Severity) -> Self {
        CooldownKey::Entity {
            entity: entity.into(),
            severity,
        }
    }
}

/// Last-emission cache shared across cycles.
///
/// Entries are only ever overwritten, never evicted; the key space is
/// bounded by the set of monitored entities.
#[derive(Debug, Clone)]
pub struct AlertCooldown {
    window: Duration,
    last_emission: HashMap<CooldownKey, DateTime<Utc>>,
}

impl AlertCooldown {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: i64::try_from(window_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            last_emission: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// True when `key` has never fired or its last emission is at least one
    /// window old.
    pub fn should_emit(&self, key: &CooldownKey, now: DateTime<Utc>) -> bool {
        self.last_emission
            .get(key)
            .map_or(true, |last| now - *last >= self.window)
    }

    pub fn record_emission(&mut self, key: CooldownKey, now: DateTime<Utc>) {
        self.last_emission.insert(key, now);
    }

    /// Checks and records in one step. The timestamp is stored before the
    /// caller performs any side effect for the emission.
    pub fn try_acquire(&mut self, key: CooldownKey, now: DateTime<Utc>) -> bool {
        if !self.should_emit(&key, now) {
            return false;
        }
        self.record_emission(key, now);
        true
    }

    pub fn last_emission(&self, key: &CooldownKey) -> Option<DateTime<Utc>> {
        self.last_emission.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.last_emission.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_emission.is_empty()
    }
}

impl Default for AlertCooldown {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_SECS)
    }
}
