use log::{debug, error};
use std::time::Instant;
use systemstat::{Platform, System};

use crate::error::AppError;

/// Aggregate CPU load in percent, measured over sysinfo's minimum update
/// interval. The measurement blocks, so it runs on the blocking pool.
pub async fn collect_load_aggregate() -> Result<f32, AppError> {
    let start = Instant::now();
    let result = tokio::task::spawn_blocking(|| -> Result<f32, AppError> {
        let sys = System::new();
        let measurement = sys.cpu_load_aggregate().map_err(|x| {
            error!("CPU load: error: {}", x);
            AppError::Sampler(format!("cpu load unavailable: {x}"))
        })?;

        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        let load = measurement.done().map_err(|x| {
            error!("CPU load measurement error: {}", x);
            AppError::Sampler(format!("cpu load measurement failed: {x}"))
        })?;
        Ok((1.0 - load.idle) * 100.0)
    })
    .await
    .map_err(|e| AppError::Sampler(format!("cpu sampling task failed: {e}")))?;

    debug!(
        "collect_load_aggregate took: {} ms",
        start.elapsed().as_millis()
    );
    result
}
