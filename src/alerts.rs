use crate::models::{Alert, Sample, Threshold};

/// Compares `sample` against each threshold.
///
/// An alert is raised only when the value is strictly greater than the
/// limit; a reading sitting exactly on the limit is not an alert.
pub fn check<'a, I>(sample: &Sample, thresholds: I) -> Vec<Alert>
where
    I: IntoIterator<Item = &'a Threshold>,
{
    thresholds
        .into_iter()
        .filter_map(|threshold| {
            let value = sample.value(threshold.metric);
            (value > threshold.limit).then_some(Alert {
                metric: threshold.metric,
                value,
                limit: threshold.limit,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;

    fn sample(cpu: f32, mem: f32, disk: f32) -> Sample {
        Sample {
            cpu_pct: cpu,
            mem_pct: mem,
            disk_pct: disk,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_single_cpu_alert() {
        let thresholds = [Threshold {
            metric: Metric::Cpu,
            limit: 80.0,
        }];
        let alerts = check(&sample(85.0, 50.0, 60.0), &thresholds);

        assert_eq!(
            alerts,
            vec![Alert {
                metric: Metric::Cpu,
                value: 85.0,
                limit: 80.0,
            }]
        );
    }

    #[test]
    fn test_equal_to_limit_does_not_alert() {
        let thresholds = [
            Threshold {
                metric: Metric::Cpu,
                limit: 50.0,
            },
            Threshold {
                metric: Metric::Mem,
                limit: 40.0,
            },
        ];
        let alerts = check(&sample(50.0, 40.0, 99.0), &thresholds);
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_alert_iff_strictly_greater() {
        let values = [0.0_f32, 10.0, 49.9, 50.0, 50.1, 99.9, 100.0];
        let limits = [0.0_f32, 50.0, 100.0];
        for &value in &values {
            for &limit in &limits {
                let thresholds = [Threshold {
                    metric: Metric::Disk,
                    limit,
                }];
                let alerts = check(&sample(0.0, 0.0, value), &thresholds);
                assert_eq!(alerts.len() == 1, value > limit, "value={value} limit={limit}");
            }
        }
    }

    #[test]
    fn test_alerts_follow_threshold_order() {
        let thresholds = [
            Threshold {
                metric: Metric::Disk,
                limit: 10.0,
            },
            Threshold {
                metric: Metric::Cpu,
                limit: 10.0,
            },
        ];
        let alerts = check(&sample(20.0, 5.0, 30.0), &thresholds);
        let metrics: Vec<Metric> = alerts.iter().map(|a| a.metric).collect();
        assert_eq!(metrics, vec![Metric::Disk, Metric::Cpu]);
    }

    #[test]
    fn test_no_thresholds_no_alerts() {
        assert!(check(&sample(100.0, 100.0, 100.0), &[]).is_empty());
    }
}
