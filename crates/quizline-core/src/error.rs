//! Error types for quiz sessions and attempt stores.
//!
//! Validation errors are recoverable and meant to be shown to the player.
//! Store errors are returned to whoever called the store.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::AttemptId;

/// Errors raised by session transitions and the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// Submit was pressed with nothing selected or typed.
    #[error("Please select or enter an answer")]
    MissingAnswer,

    /// The player did not give a name.
    #[error("Please enter your name to begin!")]
    MissingName,

    /// The player has no character, so there is no power to use.
    #[error("No power is available without a character")]
    NoPowerAvailable,

    /// The session's single power has already been consumed.
    #[error("Power has already been used in this quiz!")]
    PowerAlreadyUsed,

    /// The power does nothing in the current situation.
    #[error("{0}")]
    PowerNotApplicable(String),

    /// The countdown for the current question reached zero.
    #[error("Time is up for this question")]
    TimedOut,

    /// The current question has already been answered.
    #[error("The answer for this question is already locked in")]
    AnswerLocked,

    /// A multiple-choice answer that is not one of the options.
    #[error("'{0}' is not one of the options")]
    UnknownOption(String),

    /// A multiple-choice answer that was removed by 50/50.
    #[error("'{0}' has been eliminated")]
    OptionEliminated(String),

    /// The session has already finished.
    #[error("The quiz is already complete")]
    SessionCompleted,

    /// A session cannot start without questions.
    #[error("the question bank is empty")]
    EmptyBank,

    /// The session task is no longer running.
    #[error("the quiz engine has stopped")]
    EngineStopped,
}

impl QuizError {
    /// Returns `true` for errors caused by player input, which are shown as a
    /// transient alert and never end the session.
    pub fn is_validation(&self) -> bool {
        !matches!(self, QuizError::EmptyBank | QuizError::EngineStopped)
    }
}

/// Errors raised by attempt stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No attempt has this id.
    #[error("attempt with ID {0} not found")]
    NotFound(AttemptId),

    /// The backing storage could not be opened or has an unusable layout.
    #[error("failed to initialize store at {path}: {reason}")]
    Init { path: PathBuf, reason: String },

    /// A read or write against the backing storage failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_classification() {
        assert!(QuizError::MissingAnswer.is_validation());
        assert!(QuizError::PowerAlreadyUsed.is_validation());
        assert!(QuizError::PowerNotApplicable("nope".into()).is_validation());
        assert!(!QuizError::EmptyBank.is_validation());
        assert!(!QuizError::EngineStopped.is_validation());
    }

    #[test]
    fn messages_match_player_facing_text() {
        assert_eq!(
            QuizError::MissingAnswer.to_string(),
            "Please select or enter an answer"
        );
        assert_eq!(
            QuizError::PowerAlreadyUsed.to_string(),
            "Power has already been used in this quiz!"
        );
        assert_eq!(
            StoreError::NotFound(42).to_string(),
            "attempt with ID 42 not found"
        );
        assert!(StoreError::NotFound(1).is_not_found());
    }
}
