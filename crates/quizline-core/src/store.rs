//! Store document and the in-memory attempt store.
//!
//! [`StoreData`] holds the three collections and implements every store
//! operation as a plain method, so backends only differ in where the document
//! lives and how a changed copy is committed.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{Attempt, AttemptId, AttemptPatch, NewAttempt};
use crate::traits::{AttemptQuery, AttemptStore};

/// Layout version written by this crate.
pub const STORE_VERSION: u32 = 1;

/// Everything a store persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    pub version: u32,
    /// Next id to hand out. Never goes backwards, not even on clear.
    pub next_id: AttemptId,
    /// Attempts in insertion order.
    #[serde(default)]
    pub attempts: Vec<Attempt>,
    /// Reserved for player profiles.
    #[serde(default)]
    pub users: BTreeMap<String, serde_json::Value>,
    /// Reserved for preferences.
    #[serde(default)]
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: STORE_VERSION,
            next_id: 1,
            attempts: Vec::new(),
            users: BTreeMap::new(),
            settings: BTreeMap::new(),
        }
    }
}

impl StoreData {
    pub fn create(&mut self, attempt: NewAttempt, now: DateTime<Utc>) -> Attempt {
        let id = self.next_id;
        self.next_id += 1;
        let attempt = Attempt::from_new(id, attempt, now);
        self.attempts.push(attempt.clone());
        attempt
    }

    pub fn update(
        &mut self,
        id: AttemptId,
        patch: AttemptPatch,
        now: DateTime<Utc>,
    ) -> Result<Attempt, StoreError> {
        let attempt = self
            .attempts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))?;
        attempt.apply(patch, now);
        Ok(attempt.clone())
    }

    pub fn get(&self, id: AttemptId) -> Option<&Attempt> {
        self.attempts.iter().find(|a| a.id == id)
    }

    pub fn query(&self, query: &AttemptQuery) -> Vec<Attempt> {
        query.apply(self.attempts.clone())
    }

    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Attempt> {
        let mut found: Vec<Attempt> = self
            .attempts
            .iter()
            .filter(|a| a.completed_at >= start && a.completed_at <= end)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.completed_at.cmp(&b.completed_at).then(a.id.cmp(&b.id)));
        found
    }

    pub fn delete(&mut self, id: AttemptId) -> bool {
        let before = self.attempts.len();
        self.attempts.retain(|a| a.id != id);
        self.attempts.len() != before
    }

    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.attempts.len();
        self.attempts.retain(|a| a.completed_at > cutoff);
        before - self.attempts.len()
    }

    pub fn clear(&mut self) {
        self.attempts.clear();
        self.users.clear();
        self.settings.clear();
    }
}

/// Attempt store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the whole document.
    pub fn data(&self) -> StoreData {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreData> {
        // Every mutation is a single call, so a poisoned document is still consistent.
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AttemptStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, attempt: NewAttempt) -> Result<Attempt, StoreError> {
        Ok(self.lock().create(attempt, Utc::now()))
    }

    async fn update(&self, id: AttemptId, patch: AttemptPatch) -> Result<Attempt, StoreError> {
        self.lock().update(id, patch, Utc::now())
    }

    async fn get(&self, id: AttemptId) -> Result<Option<Attempt>, StoreError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn query_all(&self, query: &AttemptQuery) -> Result<Vec<Attempt>, StoreError> {
        Ok(self.lock().query(query))
    }

    async fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Attempt>, StoreError> {
        Ok(self.lock().range(start, end))
    }

    async fn delete(&self, id: AttemptId) -> Result<bool, StoreError> {
        Ok(self.lock().delete(id))
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        Ok(self.lock().prune_before(cutoff))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.lock().clear();
        Ok(())
    }
}
