//! The `quizline history` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use quizline_core::leaderboard::Leaderboard;
use quizline_core::traits::AttemptQuery;

/// Parse RFC 3339, or a bare date at the start (`end == false`) or end of
/// that day.
fn parse_bound(raw: &str, end: bool) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{raw}' (expected RFC 3339 or YYYY-MM-DD)"))?;
    let time = if end {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    let time = time.context("invalid time of day")?;
    Ok(date.and_time(time).and_utc())
}

pub async fn execute(
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    since: Option<String>,
    until: Option<String>,
) -> Result<()> {
    let start = since
        .as_deref()
        .map(|s| parse_bound(s, false))
        .transpose()?
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let end = until
        .as_deref()
        .map(|s| parse_bound(s, true))
        .transpose()?
        .unwrap_or_else(Utc::now);
    anyhow::ensure!(start <= end, "--since must not be after --until");

    let (_, store) = super::open(config_path, store_path).await?;
    let attempts = store.query_range(start, end).await?;

    if attempts.is_empty() {
        println!("No attempts in that range.");
        return Ok(());
    }

    // Range results are already in date order.
    let board = Leaderboard::rank(attempts, &AttemptQuery::default());
    for entry in &board.entries {
        println!(
            "#{:<4} {}  {:<20} {:<16} {:>5}  {}",
            entry.attempt.id,
            entry.attempt.completed_at.format("%Y-%m-%d %H:%M"),
            entry.attempt.participant_name,
            entry.attempt.character_label,
            entry.score_label(),
            entry.verdict.headline(),
        );
    }
    println!("\n{} attempt(s).", board.len());

    Ok(())
}
