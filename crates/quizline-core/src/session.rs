//! Quiz session state and its transitions.
//!
//! A [`SessionState`] is a plain value. Every change goes through one of the
//! transition methods here or through [`crate::power::apply_power`]; none of
//! them read a clock or sleep, so the whole state machine can be tested
//! without a runtime. The engine supplies wall-clock timestamps and decides
//! when ticks and delayed advances happen.
//!
//! Per question:
//!
//! ```text
//! Answering --submit--> Revealed --advance--> Answering(next) | Completed
//! Answering --tick to 0--> TimedOut --advance--> Answering(next) | Completed
//! ```

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QuizError;
use crate::model::{AttemptId, NewAttempt, Player, Question};

/// Default countdown length for every question.
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 30;

/// Where the current question is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for an answer; the countdown runs unless frozen.
    Answering,
    /// The answer was evaluated and the correct one is shown.
    Revealed,
    /// The countdown reached zero before an answer was submitted.
    TimedOut,
    /// Every question has been passed.
    Completed,
}

/// Outcome of persisting the finished attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    /// The session is still running.
    NotStarted,
    /// Handed to the store, no answer yet.
    Saving,
    Saved { id: AttemptId },
    Failed { reason: String },
}

impl SaveStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, SaveStatus::Saved { .. } | SaveStatus::Failed { .. })
    }
}

/// What an advance did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The answer was evaluated; the question stays on screen.
    Revealed { correct: bool },
    /// Moved on to the question at this index.
    NextQuestion { index: usize },
    /// The last question was passed. Carries the record to persist.
    Completed { attempt: NewAttempt },
}

/// What a countdown tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Seconds left after this tick.
    Running(u32),
    /// The timer is frozen for this question.
    Frozen,
    /// This tick hit zero; the question is now timed out.
    Expired,
    /// No countdown runs in the current phase.
    Idle,
}

/// Full state of one quiz run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub player: Player,
    /// Shuffled copy of the bank.
    pub questions: Vec<Question>,
    pub current_index: usize,
    /// Raw answer as selected or typed, before evaluation.
    pub selected_answer: String,
    pub score: u32,
    pub phase: Phase,
    /// Set once the current question has been evaluated.
    pub answer_correct: Option<bool>,
    /// The wrong answer the player submitted, for highlighting.
    pub wrong_answer: Option<String>,
    pub eliminated_options: Vec<String>,
    pub hint_shown: bool,
    pub timer_frozen: bool,
    pub remaining_secs: u32,
    pub seconds_per_question: u32,
    /// True for the rest of the session once the power is consumed.
    pub power_used: bool,
    /// Transient confirmation after a power is used.
    pub feedback: Option<String>,
    /// Transient warning after rejected input.
    pub alert: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub save_status: SaveStatus,
}

impl SessionState {
    /// Start a session over a shuffled copy of `bank`.
    ///
    /// The bank itself is left untouched so it can seed any number of
    /// sessions.
    pub fn new<R: Rng + ?Sized>(
        player: Player,
        bank: &[Question],
        seconds_per_question: u32,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        if bank.is_empty() {
            return Err(QuizError::EmptyBank);
        }

        let mut questions = bank.to_vec();
        questions.shuffle(rng);

        Ok(Self {
            id: Uuid::new_v4(),
            player,
            questions,
            current_index: 0,
            selected_answer: String::new(),
            score: 0,
            phase: Phase::Answering,
            answer_correct: None,
            wrong_answer: None,
            eliminated_options: Vec::new(),
            hint_shown: false,
            timer_frozen: false,
            remaining_secs: seconds_per_question,
            seconds_per_question,
            power_used: false,
            feedback: None,
            alert: None,
            started_at: now,
            completed_at: None,
            save_status: SaveStatus::NotStarted,
        })
    }

    pub fn total_questions(&self) -> u32 {
        self.questions.len() as u32
    }

    /// The question on screen, or `None` once completed.
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == Phase::Completed {
            None
        } else {
            self.questions.get(self.current_index)
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Whether the countdown should be decrementing right now.
    pub fn timer_running(&self) -> bool {
        self.phase == Phase::Answering && !self.timer_frozen
    }

    /// Fail unless the current question still accepts input.
    pub(crate) fn ensure_answering(&self) -> Result<(), QuizError> {
        match self.phase {
            Phase::Answering => Ok(()),
            Phase::Revealed => Err(QuizError::AnswerLocked),
            Phase::TimedOut => Err(QuizError::TimedOut),
            Phase::Completed => Err(QuizError::SessionCompleted),
        }
    }

    /// Record the player's raw answer without evaluating it.
    pub fn select_answer(&mut self, value: &str) -> Result<(), QuizError> {
        self.ensure_answering()?;
        let question = &self.questions[self.current_index];

        if question.is_multiple_choice() {
            if !question.options().iter().any(|o| o == value) {
                return Err(QuizError::UnknownOption(value.to_string()));
            }
            if self.eliminated_options.iter().any(|o| o == value) {
                return Err(QuizError::OptionEliminated(value.to_string()));
            }
        }

        self.selected_answer = value.to_string();
        Ok(())
    }

    /// The "Submit" / "Next" button.
    ///
    /// In `Answering` this evaluates the selected answer exactly once. In
    /// `Revealed` it moves on without evaluating again.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<Step, QuizError> {
        match self.phase {
            Phase::Completed => Err(QuizError::SessionCompleted),
            Phase::TimedOut => Err(QuizError::TimedOut),
            Phase::Revealed => Ok(self.proceed(now)),
            Phase::Answering => {
                if self.selected_answer.trim().is_empty() {
                    return Err(QuizError::MissingAnswer);
                }

                let correct = self.questions[self.current_index].is_correct(&self.selected_answer);
                if correct {
                    self.score += 1;
                } else {
                    self.wrong_answer = Some(self.selected_answer.clone());
                }
                self.answer_correct = Some(correct);
                self.phase = Phase::Revealed;

                tracing::debug!(
                    session = %self.id,
                    question = self.current_index,
                    correct,
                    score = self.score,
                    "answer evaluated"
                );
                Ok(Step::Revealed { correct })
            }
        }
    }

    /// Move on without evaluating, from any phase but `Completed`.
    pub fn skip(&mut self, now: DateTime<Utc>) -> Result<Step, QuizError> {
        if self.phase == Phase::Completed {
            return Err(QuizError::SessionCompleted);
        }
        Ok(self.proceed(now))
    }

    /// Delayed advance scheduled after a reveal or a timeout.
    ///
    /// Fires only if `question_index` is still current and still waiting to
    /// move on, so a manual advance that got there first wins and the delayed
    /// one is absorbed.
    pub fn auto_advance(&mut self, question_index: usize, now: DateTime<Utc>) -> Option<Step> {
        let waiting = matches!(self.phase, Phase::Revealed | Phase::TimedOut);
        if question_index != self.current_index || !waiting {
            return None;
        }
        Some(self.proceed(now))
    }

    /// One second of countdown.
    pub fn tick(&mut self) -> Tick {
        if self.phase != Phase::Answering {
            return Tick::Idle;
        }
        if self.timer_frozen {
            return Tick::Frozen;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.phase = Phase::TimedOut;
            tracing::debug!(session = %self.id, question = self.current_index, "question timed out");
            Tick::Expired
        } else {
            Tick::Running(self.remaining_secs)
        }
    }

    /// The record to persist, once completed.
    pub fn attempt_record(&self) -> Option<NewAttempt> {
        self.completed_at.map(|at| self.record_at(at))
    }

    fn record_at(&self, completed_at: DateTime<Utc>) -> NewAttempt {
        NewAttempt {
            participant_name: self.player.name.clone(),
            character_label: self.player.character_label(),
            score: self.score,
            total_questions: self.total_questions(),
            completed_at,
        }
    }

    fn proceed(&mut self, now: DateTime<Utc>) -> Step {
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.reset_question();
            Step::NextQuestion {
                index: self.current_index,
            }
        } else {
            self.phase = Phase::Completed;
            self.completed_at = Some(now);
            self.save_status = SaveStatus::Saving;
            tracing::debug!(session = %self.id, score = self.score, "session completed");
            Step::Completed {
                attempt: self.record_at(now),
            }
        }
    }

    fn reset_question(&mut self) {
        self.phase = Phase::Answering;
        self.selected_answer.clear();
        self.answer_correct = None;
        self.wrong_answer = None;
        self.eliminated_options.clear();
        self.hint_shown = false;
        self.timer_frozen = false;
        self.remaining_secs = self.seconds_per_question;
    }
}
