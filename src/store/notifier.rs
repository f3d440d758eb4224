//! Change-notification sinks.

use std::sync::Mutex;

use tracing::info;

use super::ChangeNotifier;
use crate::error::{LedgerError, LedgerResult};
use crate::models::ChangeEvent;

/// Logs each event through `tracing` and delivers nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ChangeNotifier for TracingNotifier {
    fn notify(&self, event: &ChangeEvent) -> LedgerResult<()> {
        info!(
            tenant_id = %event.tenant_id,
            kind = ?event.kind,
            ids = event.ids.len(),
            "Ledger change"
        );
        Ok(())
    }
}

/// Buffers events in memory so a fan-out task or a test can drain them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingNotifier {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every buffered event.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Removes and returns every buffered event.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .map(|mut events| std::mem::take(&mut *events))
            .unwrap_or_default()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn notify(&self, event: &ChangeEvent) -> LedgerResult<()> {
        let mut events = self.events.lock().map_err(|_| LedgerError::Storage {
            message: "notifier buffer lock poisoned".to_string(),
        })?;
        events.push(event.clone());
        Ok(())
    }
}
