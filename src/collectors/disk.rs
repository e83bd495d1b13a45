use log::{debug, warn};
use std::time::Instant;
use systemstat::ByteSize;

/// Used and total space across the non-removable disks mounted at one of
/// `allowed` mount points.
pub async fn collect_block_info(disks: &sysinfo::Disks, allowed: &[String]) -> (ByteSize, ByteSize) {
    let start = Instant::now();
    let mut disk_total = 0u64;
    let mut disk_used = 0u64;

    for disk in disks.list() {
        if let Some(mount_str) = disk.mount_point().to_str() {
            if !disk.is_removable() && allowed.iter().any(|m| m == mount_str) {
                disk_total = disk_total.saturating_add(disk.total_space());
                disk_used = disk_used
                    .saturating_add(disk.total_space().saturating_sub(disk.available_space()));
            }
        }
    }

    if disk_total == 0 {
        warn!("No disk matched the configured mount points {:?}", allowed);
    }

    debug!(
        "collect_block_info took: {} ms",
        start.elapsed().as_millis()
    );
    (ByteSize::b(disk_used), ByteSize::b(disk_total))
}
