//! Process metrics for the status and health endpoints.

use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use serde::Serialize;
use sysinfo::{Pid, ProcessesToUpdate, System};

/// Memory usage of this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub rss_bytes: u64,
    pub virtual_bytes: u64,
    pub rss_mb: f64,
}

/// Process uptime in machine and human form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Uptime {
    pub seconds: u64,
    pub human: String,
}

impl From<Duration> for Uptime {
    fn from(duration: Duration) -> Self {
        let seconds = duration.as_secs();
        Self {
            seconds,
            human: format_duration(seconds),
        }
    }
}

/// Render seconds as `1d 2h 3m 4s`, omitting leading zero units.
pub fn format_duration(total: u64) -> String {
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));
    parts.join(" ")
}

/// Current memory usage of this process.
///
/// The `/proc` read runs on the blocking pool. Returns zeros if the
/// platform does not expose process information.
pub async fn memory_snapshot() -> MemorySnapshot {
    match tokio::task::spawn_blocking(read_memory).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(error = %e, "Memory sampling task failed");
            MemorySnapshot::default()
        }
    }
}

fn read_memory() -> MemorySnapshot {
    static SYSTEM: OnceLock<Mutex<System>> = OnceLock::new();

    let system = SYSTEM.get_or_init(|| Mutex::new(System::new()));
    let mut system = match system.lock() {
        Ok(system) => system,
        Err(_) => return MemorySnapshot::default(),
    };

    let pid = Pid::from_u32(std::process::id());
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    match system.process(pid) {
        Some(process) => {
            let rss = process.memory();
            MemorySnapshot {
                rss_bytes: rss,
                virtual_bytes: process.virtual_memory(),
                rss_mb: (rss as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            }
        }
        None => MemorySnapshot::default(),
    }
}

/// Runtime identifier reported by the stats endpoint.
pub fn runtime_version() -> String {
    format!(
        "rust {} ({}-{})",
        env!("CARGO_PKG_RUST_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
