//! In-memory result store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ResultStore;
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::types::ComplianceReport;

#[derive(Default)]
struct Inner {
    reports: HashMap<Uuid, ComplianceReport>,
    order: Vec<Uuid>,
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryResultStore {
    inner: RwLock<Inner>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn put(&self, report: ComplianceReport) -> CollaboratorResult<()> {
        let mut inner = self.inner.write().await;
        if inner.reports.contains_key(&report.id) {
            return Err(CollaboratorError::Store(format!(
                "report {} already stored",
                report.id
            )));
        }
        inner.order.push(report.id);
        inner.reports.insert(report.id, report);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CollaboratorResult<Option<ComplianceReport>> {
        Ok(self.inner.read().await.reports.get(&id).cloned())
    }

    async fn recent(&self, limit: usize) -> CollaboratorResult<Vec<ComplianceReport>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| inner.reports.get(id).cloned())
            .collect())
    }
}
