//! Core data model types for quizline.
//!
//! Questions, characters and their powers, players, and the attempt records
//! that completed sessions leave behind in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuizError;

/// Identifier assigned to an attempt by the store.
pub type AttemptId = u64;

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within a bank.
    pub id: u32,
    /// Text shown to the player.
    pub prompt: String,
    /// Answer format and correct answer.
    #[serde(flatten)]
    pub kind: QuestionKind,
}

/// How a question is answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Pick one of a fixed list of options.
    MultipleChoice { options: Vec<String>, answer: String },
    /// Type a whole number.
    Integer { answer: i64 },
}

impl Question {
    pub fn multiple_choice(id: u32, prompt: &str, options: &[&str], answer: &str) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            kind: QuestionKind::MultipleChoice {
                options: options.iter().map(|o| o.to_string()).collect(),
                answer: answer.to_string(),
            },
        }
    }

    pub fn integer(id: u32, prompt: &str, answer: i64) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            kind: QuestionKind::Integer { answer },
        }
    }

    pub fn is_multiple_choice(&self) -> bool {
        matches!(self.kind, QuestionKind::MultipleChoice { .. })
    }

    /// Options in display order. Empty for integer questions.
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. } => options,
            QuestionKind::Integer { .. } => &[],
        }
    }

    /// The correct answer rendered as text.
    pub fn correct_answer(&self) -> String {
        match &self.kind {
            QuestionKind::MultipleChoice { answer, .. } => answer.clone(),
            QuestionKind::Integer { answer } => answer.to_string(),
        }
    }

    /// Options that are not the correct answer, in option order.
    pub fn incorrect_options(&self) -> Vec<&String> {
        match &self.kind {
            QuestionKind::MultipleChoice { options, answer } => {
                options.iter().filter(|o| *o != answer).collect()
            }
            QuestionKind::Integer { .. } => Vec::new(),
        }
    }

    /// Evaluate a raw answer.
    ///
    /// Multiple-choice answers must match the correct option exactly. Integer
    /// answers are parsed as a number, so `"40"`, `" 40 "` and `"40.0"` all
    /// match 40. Input that does not parse is simply wrong.
    pub fn is_correct(&self, raw: &str) -> bool {
        match &self.kind {
            QuestionKind::MultipleChoice { answer, .. } => raw == answer,
            QuestionKind::Integer { answer } => match raw.trim().parse::<f64>() {
                Ok(value) => value.is_finite() && value == *answer as f64,
                Err(_) => false,
            },
        }
    }
}

/// The special ability granted by a character. Usable once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Power {
    TimeBoost,
    RevealAnswer,
    SecondChance,
    DragonShield,
    FiftyFifty,
}

impl Power {
    pub fn name(&self) -> &'static str {
        match self {
            Power::TimeBoost => "Time Boost",
            Power::RevealAnswer => "Reveal Answer",
            Power::SecondChance => "Second Chance",
            Power::DragonShield => "Dragon Shield",
            Power::FiftyFifty => "50/50",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Power::TimeBoost => "Add extra seconds to the timer",
            Power::RevealAnswer => "Reveals the correct answer",
            Power::SecondChance => "Lets you retry the current question",
            Power::DragonShield => "Freeze the timer for this question",
            Power::FiftyFifty => "Eliminates two wrong answers (multiple choice only)",
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Playable characters. Each one carries exactly one power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Character {
    Astronaut,
    Wizard,
    Knight,
    DragonTamer,
    Detective,
}

impl Character {
    pub const ALL: [Character; 5] = [
        Character::Astronaut,
        Character::Wizard,
        Character::Knight,
        Character::DragonTamer,
        Character::Detective,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Character::Astronaut => "Astronaut",
            Character::Wizard => "Wizard",
            Character::Knight => "Knight",
            Character::DragonTamer => "Dragon Tamer",
            Character::Detective => "Detective",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Character::Astronaut => "🚀",
            Character::Wizard => "🧙",
            Character::Knight => "⚔️",
            Character::DragonTamer => "🐉",
            Character::Detective => "🕵️",
        }
    }

    /// Label stored on attempt records, e.g. "🧙 Wizard".
    pub fn label(&self) -> String {
        format!("{} {}", self.emoji(), self.name())
    }

    pub fn power(&self) -> Power {
        match self {
            Character::Astronaut => Power::TimeBoost,
            Character::Wizard => Power::RevealAnswer,
            Character::Knight => Power::SecondChance,
            Character::DragonTamer => Power::DragonShield,
            Character::Detective => Power::FiftyFifty,
        }
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Character {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match normalized.as_str() {
            "astronaut" => Ok(Character::Astronaut),
            "wizard" => Ok(Character::Wizard),
            "knight" => Ok(Character::Knight),
            "dragontamer" | "dragon" => Ok(Character::DragonTamer),
            "detective" => Ok(Character::Detective),
            _ => Err(format!("unknown character: {s}")),
        }
    }
}

/// Label used on attempts when the player picked no character.
pub const NO_CHARACTER_LABEL: &str = "None";

/// The person taking the quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub character: Option<Character>,
}

impl Player {
    /// Create a player. The name is trimmed and must not be blank.
    pub fn new(name: &str, character: Option<Character>) -> Result<Self, QuizError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QuizError::MissingName);
        }
        Ok(Self {
            name: name.to_string(),
            character,
        })
    }

    pub fn character_label(&self) -> String {
        self.character
            .map(|c| c.label())
            .unwrap_or_else(|| NO_CHARACTER_LABEL.to_string())
    }

    pub fn power(&self) -> Option<Power> {
        self.character.map(|c| c.power())
    }
}

/// An attempt as produced by a finished session, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttempt {
    pub participant_name: String,
    pub character_label: String,
    pub score: u32,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
}

/// A persisted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: AttemptId,
    pub participant_name: String,
    pub character_label: String,
    pub score: u32,
    pub total_questions: u32,
    pub completed_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Attempt {
    pub fn from_new(id: AttemptId, new: NewAttempt, now: DateTime<Utc>) -> Self {
        Self {
            id,
            participant_name: new.participant_name,
            character_label: new.character_label,
            score: new.score,
            total_questions: new.total_questions,
            completed_at: new.completed_at,
            last_modified: now,
        }
    }

    /// Merge a partial update and refresh `last_modified`.
    pub fn apply(&mut self, patch: AttemptPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.participant_name {
            self.participant_name = name;
        }
        if let Some(label) = patch.character_label {
            self.character_label = label;
        }
        if let Some(score) = patch.score {
            self.score = score;
        }
        if let Some(total) = patch.total_questions {
            self.total_questions = total;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
        self.last_modified = now;
    }

    /// Score as a fraction of the total, in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.score as f64 / self.total_questions as f64
        }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_score(self.score, self.total_questions)
    }
}

/// Fields to change on an existing attempt. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptPatch {
    #[serde(default)]
    pub participant_name: Option<String>,
    #[serde(default)]
    pub character_label: Option<String>,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub total_questions: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// How a final score reads to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Perfect,
    Great,
    KeepPracticing,
}

impl Verdict {
    pub fn from_score(score: u32, total: u32) -> Self {
        if total > 0 && score >= total {
            Verdict::Perfect
        } else if score as f64 >= total as f64 / 2.0 {
            Verdict::Great
        } else {
            Verdict::KeepPracticing
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::Perfect | Verdict::Great => "🎉 Fantastic Job!",
            Verdict::KeepPracticing => "Keep Learning! 📚",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::Perfect => "Perfect score! You're amazing! 🌟",
            Verdict::Great => "Great effort! Keep it up! 💪",
            Verdict::KeepPracticing => "Practice makes perfect! Try again! 🎯",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_parse_and_label() {
        assert_eq!("wizard".parse::<Character>().unwrap(), Character::Wizard);
        assert_eq!(
            "Dragon Tamer".parse::<Character>().unwrap(),
            Character::DragonTamer
        );
        assert_eq!(
            "dragon-tamer".parse::<Character>().unwrap(),
            Character::DragonTamer
        );
        assert_eq!(
            "🕵️ Detective".parse::<Character>().unwrap(),
            Character::Detective
        );
        assert!("pirate".parse::<Character>().is_err());
        assert_eq!(Character::Astronaut.label(), "🚀 Astronaut");
    }

    #[test]
    fn every_character_has_a_distinct_power() {
        let powers: std::collections::HashSet<Power> =
            Character::ALL.iter().map(|c| c.power()).collect();
        assert_eq!(powers.len(), 5);
        assert_eq!(Character::Detective.power(), Power::FiftyFifty);
    }

    #[test]
    fn player_requires_a_name() {
        assert!(matches!(
            Player::new("   ", Some(Character::Knight)),
            Err(QuizError::MissingName)
        ));
        let player = Player::new("  Ada ", None).unwrap();
        assert_eq!(player.name, "Ada");
        assert_eq!(player.character_label(), NO_CHARACTER_LABEL);
        assert!(player.power().is_none());
    }

    #[test]
    fn multiple_choice_evaluation_is_exact() {
        let q = Question::multiple_choice(1, "Gold?", &["Au", "Gd", "Ag", "Pt"], "Au");
        assert!(q.is_correct("Au"));
        assert!(!q.is_correct("au"));
        assert!(!q.is_correct("Ag"));
        assert_eq!(q.incorrect_options(), vec!["Gd", "Ag", "Pt"]);
    }

    #[test]
    fn integer_evaluation_parses_numbers() {
        let q = Question::integer(6, "12 + 28?", 40);
        assert!(q.is_correct("40"));
        assert!(q.is_correct(" 40 "));
        assert!(q.is_correct("40.0"));
        assert!(!q.is_correct("41"));
        assert!(!q.is_correct("forty"));
        assert!(q.options().is_empty());
    }

    #[test]
    fn question_serde_uses_kind_tag() {
        let q = Question::integer(7, "States?", 50);
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["kind"], "integer");
        assert_eq!(json["answer"], 50);
        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn attempt_patch_merges_and_touches() {
        let created = Utc::now();
        let mut attempt = Attempt::from_new(
            1,
            NewAttempt {
                participant_name: "Ada".into(),
                character_label: "🧙 Wizard".into(),
                score: 3,
                total_questions: 10,
                completed_at: created,
            },
            created,
        );
        let later = created + chrono::Duration::seconds(5);
        attempt.apply(
            AttemptPatch {
                score: Some(4),
                ..Default::default()
            },
            later,
        );
        assert_eq!(attempt.score, 4);
        assert_eq!(attempt.participant_name, "Ada");
        assert_eq!(attempt.last_modified, later);
    }

    #[test]
    fn verdict_tiers() {
        assert_eq!(Verdict::from_score(10, 10), Verdict::Perfect);
        assert_eq!(Verdict::from_score(5, 10), Verdict::Great);
        assert_eq!(Verdict::from_score(4, 10), Verdict::KeepPracticing);
        assert_eq!(Verdict::from_score(0, 2), Verdict::KeepPracticing);
    }
}
