//! HTML leaderboard generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use quizline_core::leaderboard::Leaderboard;
use quizline_core::statistics::{AggregateStats, CharacterStats};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from a leaderboard and its statistics.
pub fn generate_html(board: &Leaderboard, stats: &AggregateStats) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>quizline leaderboard</title>\n");
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>🏆 Leaderboard</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">{} attempts | average {:.1}% | {} perfect | {}</p>\n",
        stats.attempts,
        stats.avg_percent,
        stats.perfect_runs,
        board.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Rankings
    html.push_str("<section class=\"rankings\">\n");
    if board.is_empty() {
        html.push_str("<p class=\"empty\">No attempts yet. Be the first to play!</p>\n");
    } else {
        html.push_str("<table class=\"results-table\" id=\"leaderboard\">\n");
        html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Rank</th><th onclick=\"sortTable(1)\">Name</th><th onclick=\"sortTable(2)\">Character</th><th onclick=\"sortTable(3)\">Score</th><th onclick=\"sortTable(4)\">Date</th></tr></thead>\n");
        html.push_str("<tbody>\n");

        for entry in &board.entries {
            let rank = match entry.medal {
                Some(medal) => format!("{} {}", medal.emoji(), entry.rank),
                None => entry.rank.to_string(),
            };
            let row_class = if entry.medal.is_some() { "podium" } else { "" };

            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                row_class,
                rank,
                html_escape(&entry.attempt.participant_name),
                html_escape(&entry.attempt.character_label),
                entry.score_label(),
                entry.attempt.completed_at.format("%Y-%m-%d %H:%M"),
            ));
        }

        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Per-character chart
    if !stats.per_character.is_empty() {
        html.push_str("<section class=\"characters\">\n");
        html.push_str("<h2>By character</h2>\n");
        html.push_str(&generate_bar_chart(stats));
        html.push_str("</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(board).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML leaderboard to a file.
pub fn write_html_report(board: &Leaderboard, stats: &AggregateStats, path: &Path) -> Result<()> {
    let html = generate_html(board, stats);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(stats: &AggregateStats) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let mut characters: Vec<&CharacterStats> = stats.per_character.values().collect();
    characters.sort_by(|a, b| {
        b.avg_percent
            .total_cmp(&a.avg_percent)
            .then_with(|| a.character_label.cmp(&b.character_label))
    });

    let total_height = characters.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, c) in characters.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let score = c.avg_percent / 100.0;
        let width = (score * max_width as f64) as usize;

        let color = if score >= 0.8 {
            "#22c55e"
        } else if score >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{} ({})</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&c.character_label),
            c.attempts
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            c.avg_percent
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --podium: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --podium: #422006; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .empty { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.podium { background: var(--podium); font-weight: bold; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('leaderboard');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, { numeric: true }) : vb.localeCompare(va, undefined, { numeric: true });
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
