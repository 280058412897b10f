//! Storage quota monitor.
//!
//! Recomputes the active account's file usage on every partition change and
//! raises a one-shot warning when it crosses the configured threshold. Purely
//! advisory; it never blocks an upload.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::QUOTA_WARN_RATIO;
use crate::models::FileAsset;

/// Sum of stored bytes across a file partition.
pub fn used_bytes(partition: &[FileAsset]) -> u64 {
    partition.iter().map(|f| f.size_bytes).sum()
}

/// Latched threshold watcher over one account's storage usage.
pub struct QuotaMonitor {
    capacity_bytes: u64,
    warned: AtomicBool,
}

impl QuotaMonitor {
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            capacity_bytes,
            warned: AtomicBool::new(false),
        }
    }

    /// Observe the current usage. Returns `true` exactly once per upward
    /// crossing of the warning threshold; the latch re-arms only after usage
    /// drops back below it.
    pub fn observe(&self, used: u64) -> bool {
        let ratio = used as f64 / self.capacity_bytes as f64;
        if ratio >= QUOTA_WARN_RATIO {
            !self.warned.swap(true, Ordering::SeqCst)
        } else {
            self.warned.store(false, Ordering::SeqCst);
            false
        }
    }
}
