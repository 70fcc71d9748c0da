//! Core trait definitions for attempt storage.
//!
//! The engine receives an `Arc<dyn AttemptStore>` at construction. Backends
//! live in `quizline-store`; [`crate::store::MemoryStore`] is the in-process
//! one used in tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;
use crate::model::{Attempt, AttemptId, AttemptPatch, NewAttempt};

// ---------------------------------------------------------------------------
// Attempt store trait
// ---------------------------------------------------------------------------

/// Durable record store for completed attempts.
///
/// Every call is all-or-nothing: a failed call leaves no partial effect for
/// later reads to observe. There are no transactions spanning calls.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Human-readable backend name (e.g. "file").
    fn name(&self) -> &str;

    /// Append an attempt and assign it the next id.
    async fn create(&self, attempt: NewAttempt) -> Result<Attempt, StoreError>;

    /// Merge `patch` into the attempt with `id`.
    async fn update(&self, id: AttemptId, patch: AttemptPatch) -> Result<Attempt, StoreError>;

    /// Fetch one attempt.
    async fn get(&self, id: AttemptId) -> Result<Option<Attempt>, StoreError>;

    /// Every attempt, shaped by `query`.
    async fn query_all(&self, query: &AttemptQuery) -> Result<Vec<Attempt>, StoreError>;

    /// Attempts completed within `[start, end]`, oldest first.
    async fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Attempt>, StoreError>;

    /// Remove one attempt. Returns whether anything was removed.
    async fn delete(&self, id: AttemptId) -> Result<bool, StoreError>;

    /// Remove every attempt completed at or before `cutoff`.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Empty attempts, users and settings together.
    async fn clear(&self) -> Result<(), StoreError>;

    /// Remove attempts older than `retention`, measured from now.
    async fn prune_older_than(&self, retention: Duration) -> Result<usize, StoreError> {
        self.prune_before(retention_cutoff(Utc::now(), retention))
            .await
    }
}

/// The instant before which attempts fall outside `retention`.
pub fn retention_cutoff(now: DateTime<Utc>, retention: Duration) -> DateTime<Utc> {
    now - retention
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Field to order attempts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    /// `completed_at`.
    Date,
    Score,
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::Date => write!(f, "date"),
            SortField::Score => write!(f, "score"),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "date" | "completed_at" => Ok(SortField::Date),
            "score" => Ok(SortField::Score),
            other => Err(format!("unknown sort field: {other}")),
        }
    }
}

/// Shape of a [`AttemptStore::query_all`] result.
///
/// Sorting happens first, then the direction, then the limit, so a limited
/// descending score query returns the top scores. Equal sort keys fall back
/// to `completed_at` then id, both ascending, in either direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptQuery {
    /// `None` keeps insertion order.
    #[serde(default)]
    pub sort_by: Option<SortField>,
    #[serde(default)]
    pub descending: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl AttemptQuery {
    /// Highest scores first.
    pub fn leaderboard() -> Self {
        Self {
            sort_by: Some(SortField::Score),
            descending: true,
            limit: None,
        }
    }

    pub fn sorted_by(field: SortField) -> Self {
        Self {
            sort_by: Some(field),
            ..Default::default()
        }
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order and trim `attempts`, which must be in insertion order.
    pub fn apply(&self, mut attempts: Vec<Attempt>) -> Vec<Attempt> {
        match self.sort_by {
            Some(field) => attempts.sort_by(|a, b| {
                let primary = match field {
                    SortField::Date => a.completed_at.cmp(&b.completed_at),
                    SortField::Score => a.score.cmp(&b.score),
                };
                let primary = if self.descending {
                    primary.reverse()
                } else {
                    primary
                };
                primary
                    .then_with(|| a.completed_at.cmp(&b.completed_at))
                    .then_with(|| a.id.cmp(&b.id))
            }),
            None => {
                if self.descending {
                    attempts.reverse();
                }
            }
        }

        if let Some(limit) = self.limit {
            attempts.truncate(limit);
        }
        attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn attempt(id: AttemptId, score: u32, minute: u32) -> Attempt {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap();
        Attempt {
            id,
            participant_name: format!("p{id}"),
            character_label: "None".into(),
            score,
            total_questions: 10,
            completed_at: at,
            last_modified: at,
        }
    }

    fn scores(attempts: &[Attempt]) -> Vec<u32> {
        attempts.iter().map(|a| a.score).collect()
    }

    #[test]
    fn leaderboard_orders_scores_descending() {
        let attempts = vec![attempt(1, 3, 0), attempt(2, 7, 1), attempt(3, 5, 2)];
        let sorted = AttemptQuery::leaderboard().apply(attempts);
        assert_eq!(scores(&sorted), vec![7, 5, 3]);
    }

    #[test]
    fn ties_break_by_completion_then_id() {
        let attempts = vec![attempt(1, 5, 9), attempt(2, 5, 3), attempt(3, 5, 3)];
        let sorted = AttemptQuery::leaderboard().apply(attempts);
        let ids: Vec<AttemptId> = sorted.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn limit_applies_after_sorting() {
        let attempts = vec![
            attempt(1, 1, 0),
            attempt(2, 9, 1),
            attempt(3, 4, 2),
            attempt(4, 8, 3),
        ];
        let top = AttemptQuery::leaderboard().with_limit(2).apply(attempts);
        assert_eq!(scores(&top), vec![9, 8]);
    }

    #[test]
    fn unsorted_keeps_insertion_order() {
        let attempts = vec![attempt(1, 3, 5), attempt(2, 7, 1), attempt(3, 5, 2)];
        let same = AttemptQuery::default().apply(attempts.clone());
        assert_eq!(same, attempts);
        let reversed = AttemptQuery::default().descending().apply(attempts);
        assert_eq!(scores(&reversed), vec![5, 7, 3]);
    }

    #[test]
    fn date_sort_ascending() {
        let attempts = vec![attempt(1, 3, 5), attempt(2, 7, 1), attempt(3, 5, 2)];
        let sorted = AttemptQuery::sorted_by(SortField::Date).apply(attempts);
        let ids: Vec<AttemptId> = sorted.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn sort_field_parse() {
        assert_eq!("Score".parse::<SortField>().unwrap(), SortField::Score);
        assert_eq!("date".parse::<SortField>().unwrap(), SortField::Date);
        assert!("name".parse::<SortField>().is_err());
    }

    #[test]
    fn cutoff_subtracts_retention() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap();
        let cutoff = retention_cutoff(now, Duration::days(30));
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }
}
