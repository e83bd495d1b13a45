use log::{debug, error};
use std::time::Instant;
use systemstat::{ByteSize, Platform, System};

use crate::error::AppError;

/// Used and total RAM.
pub async fn collect_ram(sys: &System) -> Result<(ByteSize, ByteSize), AppError> {
    let start = Instant::now();
    let mem = sys.memory().map_err(|x| {
        error!("Memory statistics error getting stats: {}", x);
        AppError::Sampler(format!("memory statistics unavailable: {x}"))
    })?;

    let used_bytes = mem.total.as_u64().saturating_sub(mem.free.as_u64());
    let total_bytes = mem.total.as_u64();
    debug!("collect_ram took: {} ms", start.elapsed().as_millis());
    Ok((ByteSize::b(used_bytes), ByteSize::b(total_bytes)))
}

pub fn percent_of(used: ByteSize, total: ByteSize) -> f32 {
    if total.as_u64() == 0 {
        return 0.0;
    }
    used.as_u64() as f32 / total.as_u64() as f32 * 100.0
}
