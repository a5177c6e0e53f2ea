//! 本机指标采集（sysinfo）

use async_trait::async_trait;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use yunwei_core::api::{Metric, MetricsPlugin, ThresholdsConfig};

pub struct HostMetricsProvider {
    thresholds: ThresholdsConfig,
}

impl HostMetricsProvider {
    pub fn new(thresholds: ThresholdsConfig) -> Self {
        Self { thresholds }
    }
}

fn percent(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 / total as f64 * 100.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Blocking sample. CPU usage needs two refreshes separated by the minimum interval.
fn sample(thresholds: &ThresholdsConfig) -> Vec<Metric> {
    let mut sys = System::new();
    sys.refresh_cpu();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();
    sys.refresh_memory();

    let mut metrics = Vec::with_capacity(4);
    let metric = |name: &str, value: f64, unit: &str| {
        Metric::evaluated(name, round2(value), unit, thresholds.for_metric(name))
    };

    metrics.push(metric(
        "cpu_usage_percent",
        f64::from(sys.global_cpu_info().cpu_usage()),
        "%",
    ));

    if let Some(mem) = percent(sys.used_memory(), sys.total_memory()) {
        metrics.push(metric("memory_usage_percent", mem, "%"));
    }

    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .filter_map(|d| {
            let total = d.total_space();
            percent(total.saturating_sub(d.available_space()), total)
        })
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))));
    if let Some(disk) = disk {
        metrics.push(metric("disk_usage_percent", disk, "%"));
    }

    metrics.push(metric("load_1m", System::load_average().one, ""));
    metrics
}

#[async_trait]
impl MetricsPlugin for HostMetricsProvider {
    fn name(&self) -> &str {
        "host_sysinfo"
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Metric>> {
        let thresholds = self.thresholds.clone();
        let metrics = tokio::task::spawn_blocking(move || sample(&thresholds)).await?;
        tracing::debug!(
            target: "yunwei.metrics",
            stage = "metrics.sample",
            count = metrics.len()
        );
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), Some(25.0));
        assert_eq!(percent(1, 0), None);
        assert_eq!(round2(12.3456), 12.35);
    }

    #[tokio::test]
    async fn test_fetch_reports_cpu_and_load_with_thresholds() {
        let provider = HostMetricsProvider::new(ThresholdsConfig::default());
        let metrics = provider.fetch().await.unwrap();

        let cpu = metrics
            .iter()
            .find(|m| m.name == "cpu_usage_percent")
            .unwrap();
        assert_eq!(cpu.threshold, Some(80.0));
        let load = metrics.iter().find(|m| m.name == "load_1m").unwrap();
        assert_eq!(load.threshold, Some(2.0));
    }
}
