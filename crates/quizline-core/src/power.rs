//! Character powers.
//!
//! All five effects go through [`apply_power`], which never mutates its input:
//! it returns the next state and the confirmation to show, or an error that
//! leaves the session exactly as it was (including the power-used flag).

use crate::error::QuizError;
use crate::model::Power;
use crate::session::{Phase, SessionState};

/// Seconds added by Time Boost unless configured otherwise.
pub const DEFAULT_TIME_BOOST_SECS: u32 = 15;

/// Options removed by 50/50.
const FIFTY_FIFTY_ELIMINATIONS: usize = 2;

/// Result of a successful power use.
#[derive(Debug, Clone)]
pub struct PowerOutcome {
    pub state: SessionState,
    pub message: String,
}

/// Apply `power` to a copy of `state`.
pub fn apply_power(
    power: Power,
    state: &SessionState,
    time_boost_secs: u32,
) -> Result<PowerOutcome, QuizError> {
    if state.power_used {
        return Err(QuizError::PowerAlreadyUsed);
    }
    match state.phase {
        Phase::Completed => return Err(QuizError::SessionCompleted),
        Phase::TimedOut => return Err(QuizError::TimedOut),
        Phase::Answering | Phase::Revealed => {}
    }
    let question = state
        .current_question()
        .ok_or(QuizError::SessionCompleted)?;

    let mut next = state.clone();
    let message = match power {
        Power::TimeBoost => {
            next.remaining_secs += time_boost_secs;
            format!("Added {time_boost_secs} seconds to the timer!")
        }
        Power::RevealAnswer => {
            next.hint_shown = true;
            "The correct answer has been revealed!".to_string()
        }
        Power::SecondChance => {
            if state.answer_correct == Some(true) {
                return Err(QuizError::PowerNotApplicable(
                    "You already answered this question correctly!".into(),
                ));
            }
            next.selected_answer.clear();
            next.wrong_answer = None;
            next.answer_correct = None;
            next.phase = Phase::Answering;
            "You can try this question again!".to_string()
        }
        Power::DragonShield => {
            next.timer_frozen = true;
            "Dragon Shield activated! Timer frozen for this question.".to_string()
        }
        Power::FiftyFifty => {
            if !question.is_multiple_choice() {
                return Err(QuizError::PowerNotApplicable(
                    "This power only works on multiple choice questions!".into(),
                ));
            }
            next.eliminated_options = question
                .incorrect_options()
                .into_iter()
                .take(FIFTY_FIFTY_ELIMINATIONS)
                .cloned()
                .collect();
            if next.eliminated_options.contains(&next.selected_answer) {
                next.selected_answer.clear();
            }
            "Two wrong answers have been eliminated!".to_string()
        }
    };

    next.power_used = true;
    tracing::debug!(session = %state.id, power = %power, "power applied");
    Ok(PowerOutcome {
        state: next,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Character, Player, Question};
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state_with(question: Question, character: Character) -> SessionState {
        let player = Player::new("Ada", Some(character)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        SessionState::new(player, &[question], 30, &mut rng, Utc::now()).unwrap()
    }

    fn mc() -> Question {
        Question::multiple_choice(1, "Pick B", &["A", "B", "C", "D"], "B")
    }

    #[test]
    fn time_boost_extends_timer() {
        let state = state_with(mc(), Character::Astronaut);
        let outcome = apply_power(Power::TimeBoost, &state, 15).unwrap();
        assert_eq!(outcome.state.remaining_secs, 45);
        assert!(outcome.state.power_used);
        assert_eq!(outcome.message, "Added 15 seconds to the timer!");
        assert!(!state.power_used, "input state is untouched");
    }

    #[test]
    fn reveal_answer_shows_hint() {
        let state = state_with(Question::integer(1, "40?", 40), Character::Wizard);
        let outcome = apply_power(Power::RevealAnswer, &state, 15).unwrap();
        assert!(outcome.state.hint_shown);
    }

    #[test]
    fn dragon_shield_freezes_timer() {
        let state = state_with(mc(), Character::DragonTamer);
        let outcome = apply_power(Power::DragonShield, &state, 15).unwrap();
        assert!(outcome.state.timer_frozen);
        assert!(!outcome.state.timer_running());
    }

    #[test]
    fn second_chance_clears_selection() {
        let mut state = state_with(mc(), Character::Knight);
        state.select_answer("A").unwrap();
        let outcome = apply_power(Power::SecondChance, &state, 15).unwrap();
        assert!(outcome.state.selected_answer.is_empty());
        assert_eq!(outcome.state.phase, Phase::Answering);
    }

    #[test]
    fn second_chance_reopens_a_wrong_answer() {
        let mut state = state_with(mc(), Character::Knight);
        state.select_answer("A").unwrap();
        state.submit(Utc::now()).unwrap();
        assert_eq!(state.wrong_answer.as_deref(), Some("A"));

        let mut next = apply_power(Power::SecondChance, &state, 15).unwrap().state;
        assert_eq!(next.phase, Phase::Answering);
        assert!(next.wrong_answer.is_none());

        next.select_answer("B").unwrap();
        next.submit(Utc::now()).unwrap();
        assert_eq!(next.score, 1);
    }

    #[test]
    fn second_chance_after_correct_answer_is_not_applicable() {
        let mut state = state_with(mc(), Character::Knight);
        state.select_answer("B").unwrap();
        state.submit(Utc::now()).unwrap();
        let err = apply_power(Power::SecondChance, &state, 15).unwrap_err();
        assert!(matches!(err, QuizError::PowerNotApplicable(_)));
    }

    #[test]
    fn fifty_fifty_eliminates_first_two_wrong_options() {
        let state = state_with(mc(), Character::Detective);
        let outcome = apply_power(Power::FiftyFifty, &state, 15).unwrap();
        assert_eq!(outcome.state.eliminated_options, vec!["A", "C"]);
        assert!(!outcome.state.eliminated_options.contains(&"B".to_string()));
    }

    #[test]
    fn fifty_fifty_clears_an_eliminated_selection() {
        let mut state = state_with(mc(), Character::Detective);
        state.select_answer("C").unwrap();
        let outcome = apply_power(Power::FiftyFifty, &state, 15).unwrap();
        assert!(outcome.state.selected_answer.is_empty());
    }

    #[test]
    fn fifty_fifty_with_few_options_never_hits_the_answer() {
        let q = Question::multiple_choice(1, "Yes?", &["Yes", "No"], "Yes");
        let state = state_with(q, Character::Detective);
        let outcome = apply_power(Power::FiftyFifty, &state, 15).unwrap();
        assert_eq!(outcome.state.eliminated_options, vec!["No"]);
    }

    #[test]
    fn fifty_fifty_on_integer_question_is_a_no_op() {
        let state = state_with(Question::integer(1, "40?", 40), Character::Detective);
        let err = apply_power(Power::FiftyFifty, &state, 15).unwrap_err();
        assert_eq!(
            err.to_string(),
            "This power only works on multiple choice questions!"
        );
        assert!(!state.power_used);
        assert!(state.eliminated_options.is_empty());
    }

    #[test]
    fn power_is_single_use() {
        let state = state_with(mc(), Character::Astronaut);
        let used = apply_power(Power::TimeBoost, &state, 15).unwrap().state;
        for _ in 0..3 {
            assert_eq!(
                apply_power(Power::TimeBoost, &used, 15).unwrap_err(),
                QuizError::PowerAlreadyUsed
            );
        }
        assert_eq!(used.remaining_secs, 45);
    }

    #[test]
    fn power_rejected_after_timeout() {
        let mut state = state_with(mc(), Character::DragonTamer);
        while state.phase == Phase::Answering {
            state.tick();
        }
        assert_eq!(
            apply_power(Power::DragonShield, &state, 15).unwrap_err(),
            QuizError::TimedOut
        );
    }
}
