use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ThresholdsConfig;
use crate::error::AppError;

/// One point-in-time reading, percentages in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub cpu_pct: f32,
    pub mem_pct: f32,
    pub disk_pct: f32,
    /// Seconds since the unix epoch.
    pub timestamp: f64,
}

impl Sample {
    pub fn new(cpu_pct: f32, mem_pct: f32, disk_pct: f32) -> Self {
        Self {
            cpu_pct: clamp_pct(cpu_pct),
            mem_pct: clamp_pct(mem_pct),
            disk_pct: clamp_pct(disk_pct),
            timestamp: now_secs(),
        }
    }

    pub fn value(&self, metric: Metric) -> f32 {
        match metric {
            Metric::Cpu => self.cpu_pct,
            Metric::Mem => self.mem_pct,
            Metric::Disk => self.disk_pct,
        }
    }

    pub fn time_display(&self) -> String {
        chrono::DateTime::from_timestamp_millis((self.timestamp * 1000.0) as i64)
            .map(|t| {
                t.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default()
    }
}

fn clamp_pct(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Mem,
    Disk,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Cpu, Metric::Mem, Metric::Disk];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Mem => "Memory",
            Metric::Disk => "Disk",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Cpu => "cpu",
            Metric::Mem => "mem",
            Metric::Disk => "disk",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub metric: Metric,
    pub limit: f32,
}

impl Threshold {
    pub fn new(metric: Metric, limit: f32) -> Result<Self, AppError> {
        if !(0.0..=100.0).contains(&limit) {
            return Err(AppError::InvalidInput(format!(
                "{metric} threshold must be between 0 and 100, got {limit}"
            )));
        }
        Ok(Self { metric, limit })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Alert {
    pub metric: Metric,
    pub value: f32,
    pub limit: f32,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} usage {:.1}% exceeds threshold {:.1}%",
            self.metric.label(),
            self.value,
            self.limit
        )
    }
}

/// At most one limit per metric, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thresholds {
    limits: IndexMap<Metric, f32>,
}

impl Thresholds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, threshold: Threshold) {
        self.limits.insert(threshold.metric, threshold.limit);
    }

    pub fn get(&self, metric: Metric) -> Option<f32> {
        self.limits.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Threshold> + '_ {
        self.limits
            .iter()
            .map(|(metric, limit)| Threshold {
                metric: *metric,
                limit: *limit,
            })
    }

    pub fn to_vec(&self) -> Vec<Threshold> {
        self.iter().collect()
    }
}

impl FromIterator<Threshold> for Thresholds {
    fn from_iter<I: IntoIterator<Item = Threshold>>(iter: I) -> Self {
        let mut thresholds = Thresholds::new();
        for threshold in iter {
            thresholds.set(threshold);
        }
        thresholds
    }
}

impl From<&ThresholdsConfig> for Thresholds {
    fn from(config: &ThresholdsConfig) -> Self {
        [
            (Metric::Cpu, config.cpu),
            (Metric::Mem, config.mem),
            (Metric::Disk, config.disk),
        ]
        .into_iter()
        .map(|(metric, limit)| Threshold {
            metric,
            limit: limit.clamp(0.0, 100.0),
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_values_are_clamped() {
        let sample = Sample::new(120.0, -3.0, f32::NAN);
        assert_eq!(sample.cpu_pct, 100.0);
        assert_eq!(sample.mem_pct, 0.0);
        assert_eq!(sample.disk_pct, 0.0);
        assert!(sample.timestamp > 0.0);
    }

    #[test]
    fn test_threshold_range_is_validated() {
        assert!(Threshold::new(Metric::Cpu, 0.0).is_ok());
        assert!(Threshold::new(Metric::Cpu, 100.0).is_ok());
        assert!(matches!(
            Threshold::new(Metric::Mem, 100.5),
            Err(AppError::InvalidInput(_))
        ));
        assert!(Threshold::new(Metric::Disk, -1.0).is_err());
    }

    #[test]
    fn test_thresholds_replace_per_metric() {
        let mut thresholds = Thresholds::from(&ThresholdsConfig::default());
        thresholds.set(Threshold::new(Metric::Cpu, 50.0).unwrap());

        assert_eq!(thresholds.get(Metric::Cpu), Some(50.0));
        assert_eq!(thresholds.to_vec().len(), 3);
        assert_eq!(thresholds.to_vec()[0].metric, Metric::Cpu);
    }

    #[test]
    fn test_metric_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Metric::Mem).unwrap(), "\"mem\"");
        let metric: Metric = serde_json::from_str("\"disk\"").unwrap();
        assert_eq!(metric, Metric::Disk);
    }
}
