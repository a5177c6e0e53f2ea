//! 进程内共享的指标快照缓存。
//!
//! 快照以 `Arc` 原子替换，读写互不阻塞太久；过期判断依赖可注入的 [`Clock`]。

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Alert, Metric};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::milliseconds(by.as_millis() as i64);
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub metrics: Vec<Metric>,
    pub alerts: Vec<Alert>,
    pub captured_at: DateTime<Utc>,
}

pub struct MetricsCache {
    slot: RwLock<Option<Arc<MetricsSnapshot>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl MetricsCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// Fresh snapshot, or `None` when empty or `now - captured_at >= ttl`.
    pub fn get(&self) -> Option<Arc<MetricsSnapshot>> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        let snapshot = slot.as_ref()?;
        if self.is_fresh(snapshot) {
            Some(Arc::clone(snapshot))
        } else {
            None
        }
    }

    pub fn put(&self, snapshot: MetricsSnapshot) -> Arc<MetricsSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Stamp with the cache clock and store.
    pub fn capture(&self, metrics: Vec<Metric>, alerts: Vec<Alert>) -> Arc<MetricsSnapshot> {
        self.put(MetricsSnapshot {
            metrics,
            alerts,
            captured_at: self.clock.now(),
        })
    }

    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Age measured on the cache clock. Zero when the clock moved backwards.
    pub fn age_of(&self, snapshot: &MetricsSnapshot) -> Duration {
        (self.clock.now() - snapshot.captured_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    fn is_fresh(&self, snapshot: &MetricsSnapshot) -> bool {
        self.age_of(snapshot) < self.ttl
    }
}

impl Default for MetricsCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_at(start: DateTime<Utc>) -> (MetricsCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        (MetricsCache::with_clock(DEFAULT_TTL, clock.clone()), clock)
    }

    #[test]
    fn test_put_then_get_returns_same_snapshot() {
        let (cache, _clock) = cache_at(Utc::now());
        assert!(cache.get().is_none());

        let metric = Metric::evaluated("cpu_usage_percent", 42.0, "percent", Some(80.0));
        let stored = cache.capture(vec![metric], Vec::new());
        let got = cache.get().unwrap();
        assert!(Arc::ptr_eq(&stored, &got));
    }

    #[test]
    fn test_staleness_window_boundary() {
        let (cache, clock) = cache_at(Utc::now());
        cache.capture(Vec::new(), Vec::new());

        clock.advance(Duration::from_secs(299));
        assert!(cache.get().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_age_follows_injected_clock() {
        let start = Utc::now() - chrono::Duration::days(1);
        let (cache, clock) = cache_at(start);
        let snapshot = cache.capture(Vec::new(), Vec::new());
        clock.advance(Duration::from_secs(42));
        assert_eq!(cache.age_of(&snapshot), Duration::from_secs(42));
    }

    #[test]
    fn test_put_resets_window_and_invalidate_clears() {
        let (cache, clock) = cache_at(Utc::now());
        cache.capture(Vec::new(), Vec::new());
        clock.advance(Duration::from_secs(400));
        assert!(cache.get().is_none());

        cache.capture(Vec::new(), Vec::new());
        assert!(cache.get().is_some());

        cache.invalidate();
        assert!(cache.get().is_none());
    }
}
