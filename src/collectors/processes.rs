use async_trait::async_trait;
use humansize::{format_size, BINARY};
use log::debug;
use std::cmp::Ordering;
use std::time::Instant;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use crate::error::AppError;
use crate::models::{ProcessEntry, SortKey};

/// Snapshot of the live process table, in enumeration order.
#[async_trait]
pub trait ProcessSource: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<ProcessEntry>, AppError>;
}

pub struct SystemProcesses;

#[async_trait]
impl ProcessSource for SystemProcesses {
    async fn snapshot(&self) -> Result<Vec<ProcessEntry>, AppError> {
        let start = Instant::now();
        let mut sys = System::new_with_specifics(
            RefreshKind::nothing().with_processes(ProcessRefreshKind::everything()),
        );
        sys.refresh_memory();

        // CPU usage is a delta between two refreshes.
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_processes(ProcessesToUpdate::All, true);

        let total_memory = sys.total_memory();
        let entries: Vec<ProcessEntry> = sys
            .processes()
            .values()
            .map(|process| {
                let memory_bytes = process.memory();
                let mem_pct = if total_memory > 0 {
                    memory_bytes as f32 / total_memory as f32 * 100.0
                } else {
                    0.0
                };
                ProcessEntry {
                    pid: process.pid().as_u32(),
                    name: process.name().to_string_lossy().into_owned(),
                    cpu_pct: process.cpu_usage(),
                    mem_pct,
                    memory_bytes,
                    memory_display: format_size(memory_bytes, BINARY),
                }
            })
            .collect();

        debug!(
            "process snapshot of {} entries took: {} ms",
            entries.len(),
            start.elapsed().as_millis()
        );
        Ok(entries)
    }
}

/// Highest `n` entries by `by`, descending. The sort is stable, so ties keep
/// the snapshot's enumeration order.
pub fn rank(mut entries: Vec<ProcessEntry>, by: SortKey, n: usize) -> Vec<ProcessEntry> {
    entries.sort_by(|a, b| {
        b.metric_value(by)
            .partial_cmp(&a.metric_value(by))
            .unwrap_or(Ordering::Equal)
    });
    entries.truncate(n);
    entries
}

pub async fn top_n(
    source: &dyn ProcessSource,
    by: SortKey,
    n: usize,
) -> Result<Vec<ProcessEntry>, AppError> {
    let snapshot = source.snapshot().await?;
    Ok(rank(snapshot, by, n))
}
