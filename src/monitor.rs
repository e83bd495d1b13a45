use log::{debug, error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::collectors::ResourceSampler;
use crate::models::Sample;

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub interval: Duration,
    /// `None` polls until the monitor is stopped.
    pub iterations: Option<u32>,
    pub channel_capacity: usize,
}

/// Background polling task feeding samples through a bounded channel.
///
/// Dropping the handle cancels the task.
pub struct MonitorHandle {
    samples: mpsc::Receiver<Sample>,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn spawn(sampler: Arc<dyn ResourceSampler>, settings: MonitorSettings) -> Self {
        let (tx, rx) = mpsc::channel(settings.channel_capacity.max(1));
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(poll(sampler, settings, tx, cancel_rx));
        Self {
            samples: rx,
            cancel: Some(cancel_tx),
            task,
        }
    }

    /// Takes every sample already produced without waiting for new ones.
    pub fn drain(&mut self) -> Vec<Sample> {
        let mut drained = Vec::new();
        while let Ok(sample) = self.samples.try_recv() {
            drained.push(sample);
        }
        drained
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll(
    sampler: Arc<dyn ResourceSampler>,
    settings: MonitorSettings,
    tx: mpsc::Sender<Sample>,
    mut cancel: oneshot::Receiver<()>,
) {
    info!(
        "Monitoring started: every {:?}, {} iterations",
        settings.interval,
        settings
            .iterations
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );
    let mut interval = tokio::time::interval(settings.interval);
    let mut tick = 0u32;

    loop {
        if settings.iterations.is_some_and(|limit| tick >= limit) {
            break;
        }

        tokio::select! {
            _ = &mut cancel => {
                debug!("Monitoring cancelled after {} samples", tick);
                return;
            }
            _ = interval.tick() => {}
        }

        let sample = tokio::select! {
            _ = &mut cancel => {
                debug!("Monitoring cancelled after {} samples", tick);
                return;
            }
            result = sampler.sample() => result,
        };
        tick += 1;

        match sample {
            Ok(sample) => {
                if tx.send(sample).await.is_err() {
                    debug!("Sample receiver dropped, stopping monitor");
                    return;
                }
            }
            Err(e) => error!("Monitoring tick {} failed: {}", tick, e),
        }
    }

    info!("Monitoring finished after {} samples", tick);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingSampler {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ResourceSampler for CountingSampler {
        async fn sample(&self) -> Result<Sample, AppError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Sample {
                cpu_pct: n as f32,
                mem_pct: 0.0,
                disk_pct: 0.0,
                timestamp: n as f64,
            })
        }
    }

    fn settings(iterations: Option<u32>) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_secs(1),
            iterations,
            channel_capacity: 16,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_polling_stops_after_iterations() {
        let sampler = Arc::new(CountingSampler {
            calls: AtomicU32::new(0),
        });
        let mut handle = MonitorHandle::spawn(sampler.clone(), settings(Some(3)));

        tokio::time::sleep(Duration::from_secs(10)).await;

        let samples = handle.drain();
        let cpu: Vec<f32> = samples.iter().map(|s| s.cpu_pct).collect();
        assert_eq!(cpu, vec![1.0, 2.0, 3.0]);
        assert_eq!(sampler.calls.load(Ordering::SeqCst), 3);
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_does_not_block_when_empty() {
        let sampler = Arc::new(CountingSampler {
            calls: AtomicU32::new(0),
        });
        let mut handle = MonitorHandle::spawn(sampler, settings(None));
        // Nothing has been polled yet: the runtime has not run the task.
        assert!(handle.drain().is_empty());
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_unbounded_polling() {
        let sampler = Arc::new(CountingSampler {
            calls: AtomicU32::new(0),
        });
        let mut handle = MonitorHandle::spawn(sampler.clone(), settings(None));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let taken = sampler.calls.load(Ordering::SeqCst);
        assert!(taken >= 2 && taken <= 3, "took {taken} samples");
        assert!(!handle.is_running());
        assert_eq!(handle.drain().len() as u32, taken);
    }
}
