//! Telemetry helpers for structured logging and tracing.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::SchedulerSnapshot;

/// Initialize tracing/telemetry. Users can install their own subscriber; this
/// helper installs a default env-based subscriber if none is set.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Emit one `queue_info` event describing a scheduler snapshot.
pub fn log_snapshot(snapshot: &SchedulerSnapshot) {
    let executing: Vec<_> = snapshot.active.iter().map(|a| a.task_id).collect();
    tracing::info!(
        event = "queue_info",
        high = snapshot.high,
        low = snapshot.low,
        in_flight = snapshot.in_flight,
        capacity = snapshot.capacity,
        executing = ?executing,
        "remesh queue status"
    );
}

/// Spawn a tokio task that logs a scheduler snapshot every `interval`.
///
/// Abort the returned handle to stop reporting.
pub fn spawn_queue_reporter<F>(snapshot: F, interval: Duration) -> JoinHandle<()>
where
    F: Fn() -> SchedulerSnapshot + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            log_snapshot(&snapshot());
        }
    })
}
