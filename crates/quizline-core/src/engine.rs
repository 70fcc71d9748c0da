//! Quiz engine.
//!
//! Each session runs as one tokio task that owns its [`SessionState`]. Player
//! actions arrive as commands over a channel, countdown ticks and delayed
//! transitions come from an explicit timer queue, and the task applies one
//! transition at a time. After every transition the new state is published on
//! a watch channel before the caller gets its reply, so a reply never races
//! ahead of the snapshot it describes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::bank::QuestionBank;
use crate::error::QuizError;
use crate::model::{NewAttempt, Player};
use crate::power::{apply_power, DEFAULT_TIME_BOOST_SECS};
use crate::session::{Phase, SaveStatus, SessionState, Step, Tick, DEFAULT_SECONDS_PER_QUESTION};
use crate::traits::AttemptStore;

const COMMAND_BUFFER: usize = 32;

/// Configuration for the quiz engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Countdown length for each question.
    pub seconds_per_question: u32,
    /// Seconds added by Time Boost.
    pub time_boost_secs: u32,
    /// Length of one countdown step.
    pub tick_interval: Duration,
    /// How long a revealed answer stays up before moving on.
    pub reveal_delay: Duration,
    /// Pause between a timeout and the automatic skip.
    pub timeout_grace: Duration,
    /// How long a power confirmation stays visible.
    pub feedback_duration: Duration,
    /// How long a validation alert stays visible.
    pub alert_duration: Duration,
    /// Fixed shuffle seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            time_boost_secs: DEFAULT_TIME_BOOST_SECS,
            tick_interval: Duration::from_secs(1),
            reveal_delay: Duration::from_millis(1500),
            timeout_grace: Duration::from_millis(1000),
            feedback_duration: Duration::from_millis(2000),
            alert_duration: Duration::from_millis(3000),
            seed: None,
        }
    }
}

/// Starts quiz sessions against a shared attempt store.
pub struct QuizEngine {
    store: Arc<dyn AttemptStore>,
    config: EngineConfig,
}

impl QuizEngine {
    pub fn new(store: Arc<dyn AttemptStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a session for `player` over a shuffled copy of `bank`.
    ///
    /// Spawns the session task, so this must be called from within a tokio
    /// runtime.
    pub fn start_session(
        &self,
        player: Player,
        bank: &QuestionBank,
    ) -> Result<SessionHandle, QuizError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = SessionState::new(
            player,
            &bank.questions,
            self.config.seconds_per_question,
            &mut rng,
            Utc::now(),
        )?;

        tracing::info!(
            session = %state.id,
            player = %state.player.name,
            character = %state.player.character_label(),
            bank = %bank.id,
            questions = state.questions.len(),
            "session started"
        );

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (state_tx, state_rx) = watch::channel(state.clone());

        let actor = SessionActor {
            state,
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            timers: TimerQueue::default(),
            feedback_generation: 0,
            alert_generation: 0,
            publisher: state_tx,
        };
        let task = tokio::spawn(actor.run(commands_rx));

        Ok(SessionHandle {
            commands: commands_tx,
            state: state_rx,
            task,
        })
    }
}

type Reply<T> = oneshot::Sender<Result<T, QuizError>>;

enum Command {
    Select { value: String, reply: Reply<()> },
    Submit { value: String, reply: Reply<Step> },
    Advance { reply: Reply<Step> },
    Skip { reply: Reply<Step> },
    UsePower { reply: Reply<String> },
    DismissAlert,
}

/// Front-end handle to a running session.
///
/// Dropping the handle (or calling [`SessionHandle::shutdown`]) stops the
/// session task and cancels its pending timers.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Latest published state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Pick an option or type an answer without submitting it.
    pub async fn select_answer(&self, value: impl Into<String>) -> Result<(), QuizError> {
        let value = value.into();
        self.request(|reply| Command::Select { value, reply }).await
    }

    /// Select `value` and submit it in one step.
    pub async fn submit_answer(&self, value: impl Into<String>) -> Result<Step, QuizError> {
        let value = value.into();
        self.request(|reply| Command::Submit { value, reply }).await
    }

    /// Submit the current selection, or move on if it was already revealed.
    pub async fn advance(&self) -> Result<Step, QuizError> {
        self.request(|reply| Command::Advance { reply }).await
    }

    /// Move on without answering.
    pub async fn skip(&self) -> Result<Step, QuizError> {
        self.request(|reply| Command::Skip { reply }).await
    }

    /// Use the character's power. Returns the confirmation message.
    pub async fn use_power(&self) -> Result<String, QuizError> {
        self.request(|reply| Command::UsePower { reply }).await
    }

    /// Hide the current alert before its display time runs out.
    pub async fn dismiss_alert(&self) -> Result<(), QuizError> {
        self.commands
            .send(Command::DismissAlert)
            .await
            .map_err(|_| QuizError::EngineStopped)
    }

    /// Wait until the session is completed and its save has settled.
    pub async fn wait_for_completion(&self) -> Result<SessionState, QuizError> {
        let mut updates = self.state.clone();
        let state = updates
            .wait_for(|s| s.is_completed() && s.save_status.is_settled())
            .await
            .map_err(|_| QuizError::EngineStopped)?;
        Ok(state.clone())
    }

    /// Stop the session task and wait for it to exit.
    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(e) = self.task.await {
            tracing::warn!("session task ended abnormally: {e}");
        }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, QuizError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| QuizError::EngineStopped)?;
        response.await.map_err(|_| QuizError::EngineStopped)?
    }
}

/// Deferred work owned by the session task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    /// One countdown step for the question at this index.
    Tick { question: usize },
    /// Move past the question at this index if it is still waiting.
    AutoAdvance { question: usize },
    ClearFeedback { generation: u64 },
    ClearAlert { generation: u64 },
}

#[derive(Debug, Default)]
struct TimerQueue {
    entries: Vec<(Instant, Timer)>,
}

impl TimerQueue {
    fn schedule(&mut self, at: Instant, timer: Timer) {
        self.entries.push((at, timer));
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|(at, _)| *at).min()
    }

    /// Remove and return every timer due at `now`, earliest first.
    fn take_due(&mut self, now: Instant) -> Vec<Timer> {
        let mut due = Vec::new();
        self.entries.retain(|&(at, timer)| {
            if at <= now {
                due.push((at, timer));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, timer)| timer).collect()
    }

    fn has_tick_for(&self, question: usize) -> bool {
        self.entries
            .iter()
            .any(|(_, timer)| *timer == Timer::Tick { question })
    }

    fn cancel_auto_advance(&mut self, question: usize) {
        self.entries
            .retain(|(_, timer)| *timer != Timer::AutoAdvance { question });
    }

    /// Drop countdown and advance timers, keeping message clears.
    fn cancel_question_timers(&mut self) {
        self.entries.retain(|(_, timer)| {
            matches!(
                timer,
                Timer::ClearFeedback { .. } | Timer::ClearAlert { .. }
            )
        });
    }
}

struct SessionActor {
    state: SessionState,
    store: Arc<dyn AttemptStore>,
    config: EngineConfig,
    timers: TimerQueue,
    feedback_generation: u64,
    alert_generation: u64,
    publisher: watch::Sender<SessionState>,
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        self.schedule_tick();
        self.publish();

        loop {
            let deadline = self.timers.next_deadline();
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.fire_due_timers().await;
                    self.ensure_tick();
                    self.publish();
                }
            }
        }

        tracing::debug!(session = %self.state.id, "session task stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Select { value, reply } => {
                let result = self.state.select_answer(&value);
                self.finish(result, reply);
            }
            Command::Submit { value, reply } => {
                let result = match self.state.select_answer(&value) {
                    Ok(()) => self.state.submit(Utc::now()),
                    Err(e) => Err(e),
                };
                let result = self.after_step(result).await;
                self.finish(result, reply);
            }
            Command::Advance { reply } => {
                let result = self.state.submit(Utc::now());
                let result = self.after_step(result).await;
                self.finish(result, reply);
            }
            Command::Skip { reply } => {
                let result = self.state.skip(Utc::now());
                let result = self.after_step(result).await;
                self.finish(result, reply);
            }
            Command::UsePower { reply } => {
                let result = self.use_power();
                self.finish(result, reply);
            }
            Command::DismissAlert => {
                self.state.alert = None;
                self.publish();
            }
        }
    }

    /// Surface a rejection, publish, then reply.
    fn finish<T>(&mut self, result: Result<T, QuizError>, reply: Reply<T>) {
        if let Err(e) = &result {
            tracing::warn!(session = %self.state.id, question = self.state.current_index, "rejected: {e}");
            if e.is_validation() {
                self.raise_alert(e.to_string());
            }
        }
        self.ensure_tick();
        self.publish();
        // The caller may have given up waiting; the transition stands either way.
        let _ = reply.send(result);
    }

    async fn after_step(&mut self, result: Result<Step, QuizError>) -> Result<Step, QuizError> {
        if let Ok(step) = &result {
            self.on_step(step).await;
        }
        result
    }

    async fn on_step(&mut self, step: &Step) {
        let question = self.state.current_index;
        match step {
            Step::Revealed { correct } => {
                tracing::debug!(session = %self.state.id, question, correct, "answer revealed");
                self.timers.schedule(
                    Instant::now() + self.config.reveal_delay,
                    Timer::AutoAdvance { question },
                );
            }
            Step::NextQuestion { index } => {
                tracing::debug!(session = %self.state.id, question = index, "next question");
                self.schedule_tick();
            }
            Step::Completed { attempt } => self.persist(attempt.clone()).await,
        }
    }

    async fn persist(&mut self, attempt: NewAttempt) {
        self.timers.cancel_question_timers();
        self.publish();

        tracing::info!(
            session = %self.state.id,
            score = attempt.score,
            total = attempt.total_questions,
            "session completed"
        );

        self.state.save_status = match self.store.create(attempt).await {
            Ok(saved) => {
                tracing::info!(session = %self.state.id, attempt = saved.id, store = self.store.name(), "attempt saved");
                SaveStatus::Saved { id: saved.id }
            }
            Err(e) => {
                tracing::error!(session = %self.state.id, "failed to save attempt: {e}");
                SaveStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
    }

    fn use_power(&mut self) -> Result<String, QuizError> {
        let power = self.state.player.power().ok_or(QuizError::NoPowerAvailable)?;
        let outcome = apply_power(power, &self.state, self.config.time_boost_secs)?;
        let reopened =
            self.state.phase == Phase::Revealed && outcome.state.phase == Phase::Answering;
        self.state = outcome.state;
        if reopened {
            // The next reveal schedules its own advance.
            self.timers.cancel_auto_advance(self.state.current_index);
        }

        self.feedback_generation += 1;
        self.state.feedback = Some(outcome.message.clone());
        self.timers.schedule(
            Instant::now() + self.config.feedback_duration,
            Timer::ClearFeedback {
                generation: self.feedback_generation,
            },
        );

        tracing::info!(session = %self.state.id, power = %power, "power used");
        Ok(outcome.message)
    }

    fn raise_alert(&mut self, message: String) {
        self.alert_generation += 1;
        self.state.alert = Some(message);
        self.timers.schedule(
            Instant::now() + self.config.alert_duration,
            Timer::ClearAlert {
                generation: self.alert_generation,
            },
        );
    }

    async fn fire_due_timers(&mut self) {
        for timer in self.timers.take_due(Instant::now()) {
            match timer {
                Timer::Tick { question } => self.on_tick(question),
                Timer::AutoAdvance { question } => {
                    if let Some(step) = self.state.auto_advance(question, Utc::now()) {
                        self.on_step(&step).await;
                    }
                }
                Timer::ClearFeedback { generation } => {
                    if generation == self.feedback_generation {
                        self.state.feedback = None;
                    }
                }
                Timer::ClearAlert { generation } => {
                    if generation == self.alert_generation {
                        self.state.alert = None;
                    }
                }
            }
        }
    }

    fn on_tick(&mut self, question: usize) {
        if question != self.state.current_index {
            return;
        }
        match self.state.tick() {
            Tick::Running(remaining) => {
                tracing::trace!(session = %self.state.id, remaining, "tick");
                self.schedule_tick();
            }
            Tick::Expired => {
                tracing::info!(session = %self.state.id, question, "time is up");
                self.timers.schedule(
                    Instant::now() + self.config.timeout_grace,
                    Timer::AutoAdvance { question },
                );
            }
            Tick::Frozen | Tick::Idle => {}
        }
    }

    fn schedule_tick(&mut self) {
        if self.state.timer_running() {
            self.timers.schedule(
                Instant::now() + self.config.tick_interval,
                Timer::Tick {
                    question: self.state.current_index,
                },
            );
        }
    }

    /// Restart the countdown if a transition left it running without a tick
    /// queued (e.g. Second Chance reopening a revealed question).
    fn ensure_tick(&mut self) {
        if self.state.timer_running() && !self.timers.has_tick_for(self.state.current_index) {
            self.schedule_tick();
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.state.clone());
    }
}
