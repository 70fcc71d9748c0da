//! Leaderboard ranking over stored attempts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StoreError;
use crate::model::{Attempt, Verdict};
use crate::traits::{AttemptQuery, AttemptStore, SortField};

/// Podium place for the top three rows of a score ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medal: Option<Medal>,
    pub attempt: Attempt,
    pub verdict: Verdict,
}

impl LeaderboardEntry {
    /// `"7/10"`.
    pub fn score_label(&self) -> String {
        format!("{}/{}", self.attempt.score, self.attempt.total_questions)
    }

    pub fn percent(&self) -> f64 {
        self.attempt.ratio() * 100.0
    }
}

/// Attempts in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub generated_at: DateTime<Utc>,
    pub query: AttemptQuery,
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Rank `attempts` (in insertion order) according to `query`.
    ///
    /// Medals are only handed out when the ranking is by score, highest first.
    pub fn rank(attempts: Vec<Attempt>, query: &AttemptQuery) -> Self {
        Self::from_ordered(query.apply(attempts), query)
    }

    /// Read every attempt from `store` and rank them.
    pub async fn load(store: &dyn AttemptStore, query: &AttemptQuery) -> Result<Self, StoreError> {
        let attempts = store.query_all(query).await?;
        tracing::debug!(store = store.name(), rows = attempts.len(), "leaderboard loaded");
        Ok(Self::from_ordered(attempts, query))
    }

    fn from_ordered(attempts: Vec<Attempt>, query: &AttemptQuery) -> Self {
        let podium = query.sort_by == Some(SortField::Score) && query.descending;
        let entries = attempts
            .into_iter()
            .enumerate()
            .map(|(i, attempt)| {
                let rank = i + 1;
                LeaderboardEntry {
                    rank,
                    medal: if podium { Medal::for_rank(rank) } else { None },
                    verdict: attempt.verdict(),
                    attempt,
                }
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            query: query.clone(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest score on the board.
    pub fn top_score(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.attempt.score).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewAttempt;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn new_attempt(name: &str, score: u32, minute: u32) -> NewAttempt {
        NewAttempt {
            participant_name: name.into(),
            character_label: "🕵️ Detective".into(),
            score,
            total_questions: 10,
            completed_at: Utc.with_ymd_and_hms(2025, 5, 4, 10, minute, 0).unwrap(),
        }
    }

    async fn seeded(scores: &[u32]) -> MemoryStore {
        let store = MemoryStore::new();
        for (i, &score) in scores.iter().enumerate() {
            store
                .create(new_attempt(&format!("p{i}"), score, i as u32))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn ranks_highest_score_first() {
        let store = seeded(&[3, 7, 5]).await;
        let board = Leaderboard::load(&store, &AttemptQuery::leaderboard())
            .await
            .unwrap();

        let scores: Vec<u32> = board.entries.iter().map(|e| e.attempt.score).collect();
        assert_eq!(scores, vec![7, 5, 3]);
        assert_eq!(board.entries[0].rank, 1);
        assert_eq!(board.entries[0].medal, Some(Medal::Gold));
        assert_eq!(board.entries[2].medal, Some(Medal::Bronze));
        assert_eq!(board.top_score(), Some(7));
    }

    #[tokio::test]
    async fn limit_keeps_the_top_rows() {
        let store = seeded(&[1, 9, 4, 8, 6]).await;
        let board = Leaderboard::load(&store, &AttemptQuery::leaderboard().with_limit(3))
            .await
            .unwrap();
        let scores: Vec<u32> = board.entries.iter().map(|e| e.attempt.score).collect();
        assert_eq!(scores, vec![9, 8, 6]);
    }

    #[test]
    fn date_ranking_has_no_medals() {
        let attempts = vec![
            Attempt::from_new(1, new_attempt("a", 10, 0), Utc::now()),
            Attempt::from_new(2, new_attempt("b", 2, 1), Utc::now()),
        ];
        let board = Leaderboard::rank(attempts, &AttemptQuery::sorted_by(SortField::Date));
        assert!(board.entries.iter().all(|e| e.medal.is_none()));
        assert_eq!(board.entries[0].score_label(), "10/10");
        assert_eq!(board.entries[0].verdict, Verdict::Perfect);
        assert!((board.entries[1].percent() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn empty_board() {
        let board = Leaderboard::rank(vec![], &AttemptQuery::leaderboard());
        assert!(board.is_empty());
        assert_eq!(board.top_score(), None);
    }
}
