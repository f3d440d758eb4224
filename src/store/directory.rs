//! In-memory worker profile provider.

use std::collections::HashMap;
use std::sync::RwLock;

use super::WorkerProvider;
use crate::error::{EntityKind, LedgerError, LedgerResult};
use crate::models::{TenantContext, Worker};

/// Worker profiles held in memory, keyed by tenant and worker id.
///
/// Profile CRUD belongs to an external service; this directory stands in
/// for it in tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryWorkerDirectory {
    workers: RwLock<HashMap<(String, String), Worker>>,
}

impl InMemoryWorkerDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a worker profile, returning the previous one.
    pub fn upsert(&self, tenant: &TenantContext, worker: Worker) -> LedgerResult<Option<Worker>> {
        let mut workers = self.workers.write().map_err(|_| LedgerError::Storage {
            message: "worker directory lock poisoned".to_string(),
        })?;
        Ok(workers.insert((tenant.tenant_id.clone(), worker.id.clone()), worker))
    }
}

impl WorkerProvider for InMemoryWorkerDirectory {
    fn get_worker(&self, tenant: &TenantContext, worker_id: &str) -> LedgerResult<Worker> {
        let workers = self.workers.read().map_err(|_| LedgerError::Storage {
            message: "worker directory lock poisoned".to_string(),
        })?;
        workers
            .get(&(tenant.tenant_id.clone(), worker_id.to_string()))
            .cloned()
            .ok_or_else(|| LedgerError::not_found(EntityKind::Worker, worker_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_upsert_then_get() {
        let directory = InMemoryWorkerDirectory::new();
        let tenant = TenantContext::new("acme");
        let previous = directory
            .upsert(&tenant, Worker::new("w-1", "driver", dec!(100)))
            .unwrap();
        assert!(previous.is_none());

        let worker = directory.get_worker(&tenant, "w-1").unwrap();
        assert_eq!(worker.role, "driver");
    }

    #[test]
    fn test_unknown_worker_is_not_found() {
        let directory = InMemoryWorkerDirectory::new();
        let tenant = TenantContext::new("acme");
        directory
            .upsert(&tenant, Worker::new("w-1", "driver", dec!(100)))
            .unwrap();

        let other = TenantContext::new("globex");
        match directory.get_worker(&other, "w-1") {
            Err(LedgerError::NotFound { entity, id }) => {
                assert_eq!(entity, EntityKind::Worker);
                assert_eq!(id, "w-1");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }
}
