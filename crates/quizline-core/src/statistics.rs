//! Aggregate statistics over stored attempts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Attempt, Verdict};

/// Aggregate statistics across all attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Number of attempts considered.
    pub attempts: usize,
    /// Mean of per-attempt score ratios, as a percentage.
    pub avg_percent: f64,
    /// Best single score ratio, as a percentage.
    pub best_percent: f64,
    /// Attempts with every question right.
    pub perfect_runs: usize,
    /// Per-character statistics, keyed by character label.
    pub per_character: HashMap<String, CharacterStats>,
    /// Per-participant statistics, keyed by name.
    pub per_participant: HashMap<String, ParticipantStats>,
}

/// Statistics for everyone who played as one character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub character_label: String,
    pub attempts: usize,
    pub avg_percent: f64,
    pub best_score: u32,
}

/// Statistics for a single participant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantStats {
    pub participant_name: String,
    pub attempts: usize,
    pub avg_percent: f64,
    pub best_score: u32,
    pub total_correct: u32,
}

fn mean_percent(attempts: &[&Attempt]) -> f64 {
    if attempts.is_empty() {
        return 0.0;
    }
    attempts.iter().map(|a| a.ratio()).sum::<f64>() / attempts.len() as f64 * 100.0
}

/// Compute aggregate statistics from all attempts.
pub fn compute_aggregate_stats(attempts: &[Attempt]) -> AggregateStats {
    if attempts.is_empty() {
        return AggregateStats::default();
    }

    let all: Vec<&Attempt> = attempts.iter().collect();

    let mut by_character: HashMap<&str, Vec<&Attempt>> = HashMap::new();
    let mut by_participant: HashMap<&str, Vec<&Attempt>> = HashMap::new();
    for a in attempts {
        by_character
            .entry(a.character_label.as_str())
            .or_default()
            .push(a);
        by_participant
            .entry(a.participant_name.as_str())
            .or_default()
            .push(a);
    }

    let per_character = by_character
        .into_iter()
        .map(|(label, group)| {
            let stats = CharacterStats {
                character_label: label.to_string(),
                attempts: group.len(),
                avg_percent: mean_percent(&group),
                best_score: group.iter().map(|a| a.score).max().unwrap_or(0),
            };
            (label.to_string(), stats)
        })
        .collect();

    let per_participant = by_participant
        .into_iter()
        .map(|(name, group)| {
            let stats = ParticipantStats {
                participant_name: name.to_string(),
                attempts: group.len(),
                avg_percent: mean_percent(&group),
                best_score: group.iter().map(|a| a.score).max().unwrap_or(0),
                total_correct: group.iter().map(|a| a.score).sum(),
            };
            (name.to_string(), stats)
        })
        .collect();

    AggregateStats {
        attempts: attempts.len(),
        avg_percent: mean_percent(&all),
        best_percent: attempts.iter().map(|a| a.ratio()).fold(0.0, f64::max) * 100.0,
        perfect_runs: attempts
            .iter()
            .filter(|a| a.verdict() == Verdict::Perfect)
            .count(),
        per_character,
        per_participant,
    }
}
