pub mod poller;

use log::warn;

use crate::backend::DockBackend;

pub use poller::{DEFAULT_POLL_INTERVAL, PollerHandle, start_polling};

/// Latest computer vision count shown on the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub count: u64,
}

/// Fetch the current count, degrading any failure to 0 so the dashboard
/// keeps working without live data.
pub fn fetch_count_or_zero(backend: &dyn DockBackend, token: &str) -> TelemetrySnapshot {
    match backend.count(token) {
        Ok(count) => TelemetrySnapshot { count },
        Err(e) => {
            warn!("Count fetch failed, showing 0: {}", e);
            TelemetrySnapshot::default()
        }
    }
}
