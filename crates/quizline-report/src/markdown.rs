//! Markdown leaderboard output, for pasting into READMEs and chat.

use quizline_core::leaderboard::Leaderboard;
use quizline_core::statistics::AggregateStats;

/// Pipes and newlines would break a table row.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Generate a Markdown document from a leaderboard and its statistics.
pub fn generate_markdown(board: &Leaderboard, stats: &AggregateStats) -> String {
    let mut md = String::from("# 🏆 Leaderboard\n\n");

    if board.is_empty() {
        md.push_str("_No attempts yet._\n");
        return md;
    }

    md.push_str("| Rank | Name | Character | Score | Date |\n");
    md.push_str("|---:|---|---|---:|---|\n");
    for entry in &board.entries {
        let rank = match entry.medal {
            Some(medal) => medal.emoji().to_string(),
            None => entry.rank.to_string(),
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            rank,
            cell(&entry.attempt.participant_name),
            cell(&entry.attempt.character_label),
            entry.score_label(),
            entry.attempt.completed_at.format("%Y-%m-%d"),
        ));
    }

    md.push_str(&format!(
        "\n{} attempts, average {:.1}%, {} perfect.\n",
        stats.attempts, stats.avg_percent, stats.perfect_runs
    ));
    md
}
