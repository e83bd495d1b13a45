use async_trait::async_trait;
use log::debug;
use std::time::Instant;
use systemstat::{Platform, System as SystemStat};

use crate::error::AppError;
use crate::models::Sample;

pub(crate) mod cpu;
pub(crate) mod disk;
pub(crate) mod memory;
pub mod processes;

/// Source of point-in-time resource readings.
#[async_trait]
pub trait ResourceSampler: Send + Sync {
    async fn sample(&self) -> Result<Sample, AppError>;
}

/// Samples the local host through systemstat and sysinfo.
pub struct SystemSampler {
    sys_stat: SystemStat,
    mount_points: Vec<String>,
}

impl SystemSampler {
    pub fn new(mount_points: Vec<String>) -> Self {
        Self {
            sys_stat: SystemStat::new(),
            mount_points,
        }
    }
}

#[async_trait]
impl ResourceSampler for SystemSampler {
    async fn sample(&self) -> Result<Sample, AppError> {
        let start = Instant::now();
        let disks = sysinfo::Disks::new_with_refreshed_list();

        let (cpu_pct, mem, blocks) = tokio::join!(
            cpu::collect_load_aggregate(),
            memory::collect_ram(&self.sys_stat),
            disk::collect_block_info(&disks, &self.mount_points),
        );
        let (mem_used, mem_total) = mem?;

        let sample = Sample::new(
            cpu_pct?,
            memory::percent_of(mem_used, mem_total),
            memory::percent_of(blocks.0, blocks.1),
        );
        debug!(
            "sample took: {} ms: {:?}",
            start.elapsed().as_millis(),
            sample
        );
        Ok(sample)
    }
}
