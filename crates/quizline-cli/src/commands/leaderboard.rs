//! The `quizline leaderboard` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizline_core::leaderboard::Leaderboard;
use quizline_core::statistics::compute_aggregate_stats;
use quizline_core::traits::{AttemptQuery, SortField};
use quizline_report::{generate_html, generate_markdown};

pub async fn execute(
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    limit: Option<usize>,
    sort: String,
    ascending: bool,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let sort_by: SortField = sort.parse().map_err(anyhow::Error::msg)?;
    anyhow::ensure!(limit != Some(0), "limit must be at least 1");

    let (_, store) = super::open(config_path, store_path).await?;

    let query = AttemptQuery {
        sort_by: Some(sort_by),
        descending: !ascending,
        limit,
    };
    let board = Leaderboard::load(store.as_ref(), &query).await?;

    // Statistics cover every attempt, not just the rows shown.
    let all = store.query_all(&AttemptQuery::default()).await?;
    let stats = compute_aggregate_stats(&all);

    let rendered = match format.as_str() {
        "json" => serde_json::to_string_pretty(&board)?,
        "markdown" | "md" => generate_markdown(&board, &stats),
        "html" => generate_html(&board, &stats),
        "text" => render_table(&board),
        other => anyhow::bail!("unknown format: {other} (expected text, json, markdown, html)"),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Leaderboard written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn render_table(board: &Leaderboard) -> String {
    use comfy_table::{Cell, Table};

    if board.is_empty() {
        return "No attempts yet. Run `quizline play --name <you>` to get on the board.".into();
    }

    let mut table = Table::new();
    table.set_header(vec!["Rank", "Name", "Character", "Score", "Date"]);

    for entry in &board.entries {
        let rank = match entry.medal {
            Some(medal) => format!("{} {}", medal.emoji(), entry.rank),
            None => entry.rank.to_string(),
        };
        table.add_row(vec![
            Cell::new(rank),
            Cell::new(&entry.attempt.participant_name),
            Cell::new(&entry.attempt.character_label),
            Cell::new(entry.score_label()),
            Cell::new(entry.attempt.completed_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    table.to_string()
}
