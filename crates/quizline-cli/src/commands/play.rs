//! The `quizline play` command.

use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use quizline_core::bank::{parse_bank, QuestionBank};
use quizline_core::engine::QuizEngine;
use quizline_core::error::QuizError;
use quizline_core::model::{Character, Player, Question, Verdict};
use quizline_core::session::{Phase, SaveStatus, SessionState};

/// What a line of player input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(String),
    Advance,
    Power,
    Skip,
    Quit,
}

/// Map a raw line onto an action. Option letters and 1-based numbers pick
/// multiple-choice options; anything else is passed through as typed.
fn parse_input(line: &str, question: Option<&Question>) -> Input {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => Input::Advance,
        "!" | "power" => Input::Power,
        "skip" => Input::Skip,
        "quit" | "exit" => Input::Quit,
        _ => Input::Answer(resolve_option(trimmed, question)),
    }
}

fn resolve_option(raw: &str, question: Option<&Question>) -> String {
    let Some(question) = question.filter(|q| q.is_multiple_choice()) else {
        return raw.to_string();
    };
    let options = question.options();

    let mut chars = raw.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if letter.is_ascii_alphabetic() {
            let index = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
            if let Some(option) = options.get(index) {
                return option.clone();
            }
        }
    }

    if let Ok(n) = raw.parse::<usize>() {
        if (1..=options.len()).contains(&n) {
            return options[n - 1].clone();
        }
    }

    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(raw))
        .cloned()
        .unwrap_or_else(|| raw.to_string())
}

fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Prints session changes as they happen, once each.
#[derive(Debug, Default)]
struct ConsoleView {
    question: Option<usize>,
    phase: Option<Phase>,
    remaining: Option<u32>,
    hint_shown: bool,
    eliminated: usize,
    feedback: Option<String>,
    alert: Option<String>,
}

impl ConsoleView {
    fn render(&mut self, state: &SessionState) {
        let Some(question) = state.questions.get(state.current_index) else {
            return;
        };

        let question_changed = self.question != Some(state.current_index);
        let phase_changed = self.phase != Some(state.phase);
        if question_changed {
            self.question = Some(state.current_index);
            self.hint_shown = false;
            self.eliminated = 0;
        }

        if question_changed || (phase_changed && state.phase == Phase::Answering) {
            print_question(state, question);
            self.remaining = Some(state.remaining_secs);
        }

        if phase_changed {
            match state.phase {
                Phase::Revealed if state.answer_correct == Some(true) => println!("✅ Correct!"),
                Phase::Revealed => println!(
                    "❌ Not quite. The correct answer is {}.",
                    question.correct_answer()
                ),
                Phase::TimedOut => println!(
                    "⏰ Time's up! The correct answer was {}.",
                    question.correct_answer()
                ),
                Phase::Answering | Phase::Completed => {}
            }
            self.phase = Some(state.phase);
        }

        if state.hint_shown && !self.hint_shown {
            println!("💡 Hint: the answer is {}", question.correct_answer());
            self.hint_shown = true;
        }

        if state.eliminated_options.len() != self.eliminated {
            self.eliminated = state.eliminated_options.len();
            if self.eliminated > 0 {
                print_options(state, question);
            }
        }

        if state.feedback != self.feedback {
            if let Some(message) = &state.feedback {
                println!("✨ {message}");
            }
            self.feedback = state.feedback.clone();
        }

        if state.alert != self.alert {
            if let Some(message) = &state.alert {
                println!("⚠️  {message}");
            }
            self.alert = state.alert.clone();
        }

        if state.phase == Phase::Answering && self.remaining != Some(state.remaining_secs) {
            let remaining = state.remaining_secs;
            if remaining % 10 == 0 || remaining <= 5 {
                println!("⏱  {remaining}s left");
            }
            self.remaining = Some(remaining);
        }
    }
}

fn print_question(state: &SessionState, question: &Question) {
    println!();
    println!(
        "Question {}/{}  ⏱ {}s",
        state.current_index + 1,
        state.total_questions(),
        state.remaining_secs
    );
    println!("{}", question.prompt);
    print_options(state, question);
}

fn print_options(state: &SessionState, question: &Question) {
    if !question.is_multiple_choice() {
        println!("  (type a whole number)");
        return;
    }
    for (i, option) in question.options().iter().enumerate() {
        if state.eliminated_options.contains(option) {
            println!("  {}. {option}  (eliminated)", option_letter(i));
        } else {
            println!("  {}. {option}", option_letter(i));
        }
    }
}

/// Validation errors are already on screen as alerts; anything else is fatal.
fn check<T>(result: Result<T, QuizError>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_validation() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub async fn execute(
    config_path: Option<PathBuf>,
    store_path: Option<PathBuf>,
    name: String,
    character: Option<String>,
    bank_path: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<()> {
    let character = character
        .as_deref()
        .map(str::parse::<Character>)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let player = Player::new(&name, character)?;

    let (config, store) = super::open(config_path, store_path).await?;

    let bank = match bank_path.or_else(|| config.bank.clone()) {
        Some(path) => parse_bank(&path)?,
        None => QuestionBank::builtin()?,
    };

    let mut engine_config = config.engine_config();
    if seed.is_some() {
        engine_config.seed = seed;
    }

    let engine = QuizEngine::new(store, engine_config);
    let handle = engine.start_session(player, &bank)?;

    println!(
        "Welcome, {}! Playing as {}.",
        handle.snapshot().player.name,
        handle.snapshot().player.character_label()
    );
    if let Some(power) = character.map(|c| c.power()) {
        println!("Your power: {} ({})", power, power.description());
    }
    println!("Answer with a letter or number, Enter to continue, `!` for your power, `skip`, `quit`.");

    let mut view = ConsoleView::default();
    view.render(&handle.snapshot());

    let mut updates = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            biased;
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                view.render(&state);
                if state.is_completed() && state.save_status.is_settled() {
                    break;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let state = handle.snapshot();
                match parse_input(&line, state.current_question()) {
                    Input::Quit => break,
                    Input::Answer(value) => check(handle.submit_answer(value).await)?,
                    Input::Advance => check(handle.advance().await)?,
                    Input::Skip => check(handle.skip().await)?,
                    Input::Power => check(handle.use_power().await)?,
                }
                view.render(&handle.snapshot());
            }
        }
    }

    if handle.snapshot().is_completed() {
        let state = handle.wait_for_completion().await?;
        print_summary(&state);
    } else {
        println!("\nQuiz abandoned; nothing was saved.");
    }

    handle.shutdown().await;
    Ok(())
}

fn print_summary(state: &SessionState) {
    let total = state.total_questions();
    let verdict = Verdict::from_score(state.score, total);

    println!();
    println!("{}", verdict.headline());
    println!(
        "{} ({}) scored {}/{}",
        state.player.name,
        state.player.character_label(),
        state.score,
        total
    );
    println!("{}", verdict.message());

    match &state.save_status {
        SaveStatus::Saved { id } => println!("Saved as attempt #{id}."),
        SaveStatus::Failed { reason } => eprintln!("Could not save your score: {reason}"),
        SaveStatus::NotStarted | SaveStatus::Saving => {}
    }
}
