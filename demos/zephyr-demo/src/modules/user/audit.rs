use std::sync::Mutex;
use zephyr::{Injectable, OnDestroy};

/// Per-request record of what a handler changed, flushed when the request ends
#[derive(Injectable)]
#[injectable(lifetime = "scoped", on_destroy)]
pub struct AuditTrail {
    #[injectable(default)]
    entries: Mutex<Vec<String>>,
}

impl AuditTrail {
    pub fn record(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.into());
        }
    }
}

impl OnDestroy for AuditTrail {
    fn on_destroy(&self) {
        let entries = self.entries.lock().map(|entries| entries.len()).unwrap_or_default();
        if entries > 0 {
            tracing::info!(entries, "Audit trail flushed");
        }
    }
}
