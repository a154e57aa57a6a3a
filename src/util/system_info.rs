use crate::model::{DiskStatus, MemoryStatus, SystemStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, SystemTime};
use sysinfo::{Disks, System};

// 服务启动时间
static START_TIME: AtomicU64 = AtomicU64::new(0);

static SYSTEM: LazyLock<Mutex<System>> = LazyLock::new(|| Mutex::new(System::new()));

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

// 初始化服务启动时间
pub fn init_start_time() {
    START_TIME.store(unix_now(), Ordering::SeqCst);
}

// 获取服务运行时间（秒）
pub fn get_uptime_seconds() -> u64 {
    let start_time = START_TIME.load(Ordering::SeqCst);
    if start_time == 0 {
        return 0;
    }
    unix_now().saturating_sub(start_time)
}

// 获取内存使用情况
pub fn get_memory_usage() -> MemoryStatus {
    let (total, used) = match SYSTEM.lock() {
        Ok(mut system) => {
            system.refresh_memory();
            (system.total_memory(), system.used_memory())
        }
        Err(_) => (0, 0),
    };
    let total_mb = total / (1024 * 1024);
    let used_mb = used / (1024 * 1024);
    MemoryStatus {
        total_mb,
        used_mb,
        usage_percent: percent(used_mb as f64, total_mb as f64),
    }
}

// 获取磁盘使用情况
pub fn get_disk_usage() -> DiskStatus {
    let disks = Disks::new_with_refreshed_list();
    let mut total_bytes: u128 = 0;
    let mut used_bytes: u128 = 0;

    for disk in disks.list() {
        let total = disk.total_space() as u128;
        let available = disk.available_space() as u128;
        total_bytes += total;
        used_bytes += total.saturating_sub(available);
    }

    DiskStatus {
        total_gb: (total_bytes / (1024 * 1024 * 1024)) as u64,
        used_gb: (used_bytes / (1024 * 1024 * 1024)) as u64,
        usage_percent: percent(used_bytes as f64, total_bytes as f64),
    }
}

/// 阻塞调用，异步上下文中请放入 spawn_blocking
pub fn collect_system_status() -> SystemStatus {
    SystemStatus {
        uptime_seconds: get_uptime_seconds(),
        memory: get_memory_usage(),
        disk: get_disk_usage(),
    }
}

fn percent(used: f64, total: f64) -> f32 {
    if total > 0.0 {
        ((used / total) * 100.0) as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_handles_zero_total() {
        assert_eq!(percent(10.0, 0.0), 0.0);
        assert_eq!(percent(1.0, 4.0), 25.0);
    }

    #[test]
    fn test_uptime_after_init() {
        init_start_time();
        assert!(get_uptime_seconds() < 5);
    }
}
