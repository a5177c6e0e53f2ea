use serde_json::json;
use tracing::{debug, warn};

use super::StepLibrary;
use crate::state::SessionState;

impl StepLibrary {
    /// Live fetch, alert detection, cache refresh.
    pub(super) async fn collect_metrics(&self, state: &mut SessionState) {
        if let Err(message) = self.collect_live(state, "collect_metrics").await {
            state.fail(format!("监控数据收集失败: {message}"));
        }
    }

    pub(super) async fn collect_basic_metrics(&self, state: &mut SessionState) {
        if self.collect_cached(state, "collect_basic_metrics") {
            return;
        }
        if let Err(message) = self.collect_live(state, "collect_basic_metrics").await {
            state.fail(format!("基础指标收集失败: {message}"));
        }
    }

    pub(super) async fn collect_relevant_metrics(&self, state: &mut SessionState) {
        if self.collect_cached(state, "collect_relevant_metrics") {
            return;
        }
        if let Err(message) = self.collect_live(state, "collect_relevant_metrics").await {
            state.fail(format!("相关指标收集失败: {message}"));
        }
    }

    /// Reuse a fresh snapshot. Returns false when the cache is empty or stale.
    fn collect_cached(&self, state: &mut SessionState, action: &str) -> bool {
        let Some(snapshot) = self.cache.get() else {
            return false;
        };
        let age_secs = self.cache.age_of(&snapshot).as_secs();
        debug!(
            target: "yunwei.steps",
            stage = "metrics.cache_hit",
            action,
            age_secs,
            metrics = snapshot.metrics.len()
        );
        state.apply_collection(snapshot.metrics.clone(), snapshot.alerts.clone());
        state.record_action(
            action,
            json!({
                "metrics_count": snapshot.metrics.len(),
                "alerts_count": snapshot.alerts.len(),
                "source": "cache",
                "cache_age_secs": age_secs,
            }),
        );
        true
    }

    async fn collect_live(&self, state: &mut SessionState, action: &str) -> Result<(), String> {
        let metrics = self.fetch_metrics().await.map_err(|e| {
            warn!(target: "yunwei.steps", stage = "metrics.fetch_failed", action, error = %e);
            e.to_string()
        })?;
        let alerts = self.services.metrics.detect_alerts(&metrics);
        self.cache.capture(metrics.clone(), alerts.clone());

        let (metrics_count, alerts_count) = (metrics.len(), alerts.len());
        state.apply_collection(metrics, alerts);
        state.record_action(
            action,
            json!({
                "metrics_count": metrics_count,
                "alerts_count": alerts_count,
                "source": "live",
            }),
        );
        Ok(())
    }
}
