//! Periodic eviction of old terminal job records.
//!
//! Spawns a background loop that removes completed and errored records
//! older than the retention window from the registry. Pending and
//! processing records are never touched regardless of age. Runs on a
//! fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use planserve_core::registry::JobRegistry;

/// Default retention for terminal records: 1 hour.
const DEFAULT_RETENTION_SECS: u64 = 3600;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the job retention loop.
///
/// Evicts terminal records older than `retention_secs` (defaults to
/// 3600, `JOB_RETENTION_SECS` override). Runs until `cancel` is
/// triggered.
pub async fn run(registry: Arc<JobRegistry>, cancel: CancellationToken) {
    let retention_secs: u64 = std::env::var("JOB_RETENTION_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETENTION_SECS);

    tracing::info!(
        retention_secs,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Job retention sweep started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job retention sweep stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::seconds(retention_secs as i64);
                let removed = registry.reap_terminal_older_than(cutoff);
                if removed > 0 {
                    tracing::info!(removed, "Job retention: evicted terminal records");
                } else {
                    tracing::debug!("Job retention: nothing to evict");
                }
            }
        }
    }
}
