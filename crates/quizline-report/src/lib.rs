//! quizline-report: Leaderboard rendering.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::generate_markdown;
