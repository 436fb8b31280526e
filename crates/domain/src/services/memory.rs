//! In-memory complaint store.
//!
//! Each record sits behind its own async mutex so updates to one complaint
//! are serialized while different complaints proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use uuid::Uuid;

use crate::errors::{LifecycleError, StoreError};
use crate::models::Complaint;
use crate::services::store::{
    ChangeKind, ComplaintChange, ComplaintQuery, ComplaintStore, Mutation,
};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct InMemoryComplaintStore {
    records: RwLock<HashMap<Uuid, Arc<Mutex<Complaint>>>>,
    changes: broadcast::Sender<ComplaintChange>,
}

impl InMemoryComplaintStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            records: RwLock::new(HashMap::new()),
            changes,
        }
    }

    fn publish(&self, id: Uuid, kind: ChangeKind) {
        // No receivers is fine.
        let _ = self.changes.send(ComplaintChange { id, kind });
    }

    async fn snapshot(&self, query: &ComplaintQuery) -> Vec<Complaint> {
        let cells: Vec<Arc<Mutex<Complaint>>> =
            self.records.read().await.values().cloned().collect();

        let mut matching = Vec::new();
        for cell in cells {
            let complaint = cell.lock().await;
            if query.matches(&complaint) {
                matching.push(complaint.clone());
            }
        }
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matching
    }
}

impl Default for InMemoryComplaintStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ComplaintStore for InMemoryComplaintStore {
    async fn create(&self, complaint: &Complaint) -> Result<Uuid, StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&complaint.id) {
            return Err(StoreError::Duplicate(complaint.id));
        }
        records.insert(complaint.id, Arc::new(Mutex::new(complaint.clone())));
        drop(records);

        self.publish(complaint.id, ChangeKind::Created);
        Ok(complaint.id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Complaint>, StoreError> {
        let cell = self.records.read().await.get(&id).cloned();
        match cell {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, mutation: &Mutation<'_>) -> Result<Complaint, LifecycleError> {
        let cell = self
            .records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(LifecycleError::NotFound(id))?;

        let mut current = cell.lock().await;
        let mut next = current.clone();
        mutation(&mut next)?;
        *current = next.clone();
        drop(current);

        self.publish(id, ChangeKind::Updated);
        Ok(next)
    }

    async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>, StoreError> {
        let page = self
            .snapshot(query)
            .await
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(page)
    }

    async fn count(&self, query: &ComplaintQuery) -> Result<u64, StoreError> {
        Ok(self.snapshot(&query.unpaged()).await.len() as u64)
    }

    fn watch(&self) -> broadcast::Receiver<ComplaintChange> {
        self.changes.subscribe()
    }
}
