//! TOML question bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionKind};

/// The bank shipped with quizline.
pub const BUILTIN_BANK: &str = include_str!("../data/general.toml");

/// A named, ordered set of questions. Sessions shuffle a copy of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// The built-in ten-question general knowledge bank.
    pub fn builtin() -> Result<Self> {
        parse_bank_str(BUILTIN_BANK, Path::new("<builtin>"))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: u32,
    kind: String,
    prompt: String,
    #[serde(default)]
    options: Vec<String>,
    answer: TomlAnswer,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlAnswer {
    Integer(i64),
    Text(String),
}

/// Parse a single TOML file into a `QuestionBank`.
pub fn parse_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `QuestionBank` (useful for testing).
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind = match (q.kind.to_lowercase().as_str(), q.answer) {
                ("multiple-choice" | "multiple_choice" | "mc", TomlAnswer::Text(answer)) => {
                    anyhow::ensure!(
                        !q.options.is_empty(),
                        "question {}: multiple-choice question has no options",
                        q.id
                    );
                    QuestionKind::MultipleChoice {
                        options: q.options,
                        answer,
                    }
                }
                ("multiple-choice" | "multiple_choice" | "mc", TomlAnswer::Integer(answer)) => {
                    anyhow::bail!(
                        "question {}: multiple-choice answer must be a string, got {answer}",
                        q.id
                    )
                }
                ("integer", TomlAnswer::Integer(answer)) => QuestionKind::Integer { answer },
                ("integer", TomlAnswer::Text(answer)) => {
                    anyhow::bail!(
                        "question {}: integer answer must be a number, got \"{answer}\"",
                        q.id
                    )
                }
                (other, _) => anyhow::bail!("question {}: unknown kind: {other}", q.id),
            };

            Ok(Question {
                id: q.id,
                prompt: q.prompt,
                kind,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions,
    })
}

/// Recursively load all `.toml` banks from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<QuestionBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<u32>,
    /// Warning message.
    pub message: String,
}

/// Validate a bank for common issues.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    // Check for duplicate question IDs
    let mut seen_ids = HashSet::new();
    for q in &bank.questions {
        if !seen_ids.insert(q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &bank.questions {
        if q.prompt.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: "prompt is empty".into(),
            });
        }

        let QuestionKind::MultipleChoice { options, answer } = &q.kind else {
            continue;
        };

        if !options.contains(answer) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: format!("answer \"{answer}\" is not one of the options"),
            });
        }

        let unique: HashSet<&String> = options.iter().collect();
        if unique.len() != options.len() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: "options contain duplicates".into(),
            });
        }

        if q.incorrect_options().len() < 2 {
            warnings.push(ValidationWarning {
                question_id: Some(q.id),
                message: "fewer than two wrong options; 50/50 will remove less than two".into(),
            });
        }
    }

    warnings
}
