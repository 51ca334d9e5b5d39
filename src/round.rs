use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::camera::{Camera, CameraGuard};
use crate::guess::{GuessDispatcher, GuessOutcome, GuessRequest, GuessTicket};
use crate::scheduler::{Scheduler, TimerKind};
use crate::scoring::{GuessJudge, ScoringMode};
use crate::session::RoundResult;
use crate::words::{PromptPicker, RandomPicker, WordList};

pub const COUNTDOWN_FROM: u32 = 3;
pub const DEFAULT_ROUND_SECS: u32 = 120;
pub const TICK_PERIOD: Duration = Duration::from_secs(1);
pub const GUESS_DWELL: Duration = Duration::from_secs(3);

/// Guess recorded in the log when the model could not answer
pub const FAILED_GUESS: &str = "AI failed";
/// What the player sees in that case
pub const FAILED_GUESS_DISPLAY: &str = "AI failed to guess.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundConfig {
    pub round_secs: u32,
    pub scoring: ScoringMode,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_secs: DEFAULT_ROUND_SECS,
            scoring: ScoringMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub remaining_seconds: u32,
    pub current_prompt: String,
    pub started: bool,
    pub paused: bool,
    pub guessing: bool,
    pub countdown_value: u32,
    pub showing_countdown: bool,
}

impl RoundState {
    fn new(round_secs: u32) -> Self {
        Self {
            remaining_seconds: round_secs.max(1),
            current_prompt: String::new(),
            started: false,
            paused: true,
            guessing: false,
            countdown_value: COUNTDOWN_FROM,
            showing_countdown: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl From<bool> for Verdict {
    fn from(correct: bool) -> Self {
        if correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }
}

/// The guess currently on screen during the dwell period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessDisplay {
    pub text: String,
    pub verdict: Verdict,
}

/// State changes observers can react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    Countdown(u32),
    Began { prompt: String },
    Tick { remaining_seconds: u32 },
    GuessPending,
    GuessResolved(RoundResult),
    PromptChanged(String),
    Ended { guesses: usize },
}

pub trait RoundObserver {
    fn notify(&mut self, event: &RoundEvent);
}

/// Snapshot of everything the presentation layer shows for a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundView {
    pub remaining_seconds: u32,
    pub score: u32,
    pub prompt: Option<String>,
    pub last_guess: Option<GuessDisplay>,
    pub countdown: Option<u32>,
    pub guessing: bool,
    pub started: bool,
    pub ended: bool,
    pub camera_notice: Option<String>,
}

/// Drives one playthrough: countdown, drawing timer, guesses, prompt rotation.
pub struct Round {
    id: u64,
    state: RoundState,
    words: WordList,
    picker: Box<dyn PromptPicker>,
    judge: Box<dyn GuessJudge>,
    scheduler: Scheduler,
    camera: Option<CameraGuard>,
    camera_notice: Option<String>,
    dispatcher: Box<dyn GuessDispatcher>,
    observer: Option<Box<dyn RoundObserver>>,
    results: Vec<RoundResult>,
    score: u32,
    last_guess: Option<GuessDisplay>,
    pending: Option<GuessTicket>,
    next_seq: u64,
    ended: bool,
}

impl Round {
    /// Sets up a round and acquires the camera. A camera that cannot be
    /// opened leaves a notice; the round still runs but cannot guess.
    pub fn new(
        id: u64,
        config: RoundConfig,
        words: WordList,
        camera: Box<dyn Camera>,
        dispatcher: Box<dyn GuessDispatcher>,
    ) -> Self {
        let (camera, camera_notice) = match CameraGuard::acquire(camera) {
            Ok(guard) => (Some(guard), None),
            Err(e) => {
                warn!("round {id}: camera unavailable: {e}");
                (None, Some(format!("Could not access the camera ({e})")))
            }
        };

        Self {
            id,
            state: RoundState::new(config.round_secs),
            words,
            picker: Box::new(RandomPicker::new()),
            judge: config.scoring.live_judge(),
            scheduler: Scheduler::new(),
            camera,
            camera_notice,
            dispatcher,
            observer: None,
            results: Vec::new(),
            score: 0,
            last_guess: None,
            pending: None,
            next_seq: 0,
            ended: false,
        }
    }

    pub fn with_picker(mut self, picker: Box<dyn PromptPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn RoundObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Kick off the 3, 2, 1 countdown. No-op once started.
    pub fn start(&mut self, now: Instant) {
        if self.state.started || self.ended {
            return;
        }

        self.state.started = true;
        self.state.paused = true;
        self.state.showing_countdown = true;
        self.state.countdown_value = COUNTDOWN_FROM;
        self.scheduler
            .schedule_repeating(TimerKind::Countdown, TICK_PERIOD, now);

        info!("round {}: countdown started", self.id);
        self.notify(RoundEvent::Countdown(COUNTDOWN_FROM));
    }

    /// Fire every timer due at `now`. Returns the result log if the round
    /// ran out of time during this poll.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<RoundResult>> {
        while let Some(kind) = self.scheduler.next_due(now) {
            match kind {
                TimerKind::Countdown => self.countdown_step(now),
                TimerKind::Drawing => {
                    if let Some(results) = self.tick() {
                        return Some(results);
                    }
                }
                TimerKind::GuessDwell => self.finish_dwell(),
            }
        }
        None
    }

    fn countdown_step(&mut self, now: Instant) {
        if !self.state.showing_countdown {
            self.scheduler.cancel(TimerKind::Countdown);
            return;
        }

        if self.state.countdown_value > 1 {
            self.state.countdown_value -= 1;
            self.notify(RoundEvent::Countdown(self.state.countdown_value));
            return;
        }

        self.scheduler.cancel(TimerKind::Countdown);
        self.state.countdown_value = 0;
        self.state.showing_countdown = false;
        self.state.paused = false;
        self.scheduler
            .schedule_repeating(TimerKind::Drawing, TICK_PERIOD, now);

        let prompt = self.next_prompt();
        info!("round {}: drawing started, prompt `{prompt}`", self.id);
        self.notify(RoundEvent::Began { prompt });
    }

    /// One second of drawing time. Suppressed while paused; the timer itself
    /// keeps its cadence. Returns the result log when time runs out.
    pub fn tick(&mut self) -> Option<Vec<RoundResult>> {
        if self.ended || !self.state.started || self.state.paused {
            return None;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        self.notify(RoundEvent::Tick {
            remaining_seconds: self.state.remaining_seconds,
        });

        if self.state.remaining_seconds == 0 {
            self.scheduler.cancel(TimerKind::Drawing);
            info!("round {}: time's up", self.id);
            return self.end();
        }
        None
    }

    /// Capture a frame and send it off for a guess. Returns false when the
    /// request was ignored.
    pub fn request_guess(&mut self) -> bool {
        if self.ended || !self.state.started || self.state.showing_countdown {
            debug!("round {}: guess ignored, round not running", self.id);
            return false;
        }
        if self.state.guessing {
            debug!("round {}: guess ignored, one already in flight", self.id);
            return false;
        }

        let Some(camera) = self.camera.as_mut() else {
            debug!("round {}: guess ignored, no camera", self.id);
            return false;
        };

        let frame = match camera.capture() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("round {}: capture failed: {e}", self.id);
                return false;
            }
        };

        self.state.guessing = true;
        self.state.paused = true;

        let ticket = GuessTicket {
            round: self.id,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending = Some(ticket);

        self.dispatcher.dispatch(GuessRequest::new(
            ticket,
            self.state.current_prompt.clone(),
            frame,
        ));
        self.notify(RoundEvent::GuessPending);
        true
    }

    /// Apply a finished guess. Outcomes for another round, an older request,
    /// or an ended round are dropped. Returns whether it was applied.
    pub fn complete_guess(&mut self, now: Instant, outcome: GuessOutcome) -> bool {
        if self.ended || self.pending != Some(outcome.ticket) {
            debug!(
                "round {}: discarding stale guess {:?}",
                self.id, outcome.ticket
            );
            return false;
        }
        self.pending = None;

        let prompt = self.state.current_prompt.clone();
        let (display, result) = match outcome.answer {
            Ok(raw) => {
                let guess = raw.trim().to_lowercase();
                let is_correct = self.judge.is_correct(&prompt, &guess);
                info!(
                    "round {}: guessed `{guess}` for `{prompt}` ({})",
                    self.id,
                    if is_correct { "correct" } else { "wrong" }
                );
                (
                    GuessDisplay {
                        text: guess.clone(),
                        verdict: is_correct.into(),
                    },
                    RoundResult {
                        prompt,
                        guess,
                        is_correct,
                    },
                )
            }
            Err(e) => {
                warn!("round {}: guess failed: {e}", self.id);
                (
                    GuessDisplay {
                        text: FAILED_GUESS_DISPLAY.to_string(),
                        verdict: Verdict::Incorrect,
                    },
                    RoundResult {
                        prompt,
                        guess: FAILED_GUESS.to_string(),
                        is_correct: false,
                    },
                )
            }
        };

        if result.is_correct {
            self.score += 1;
        }
        self.results.push(result.clone());
        self.last_guess = Some(display);
        self.scheduler
            .schedule_once(TimerKind::GuessDwell, GUESS_DWELL, now);
        self.notify(RoundEvent::GuessResolved(result));
        true
    }

    fn finish_dwell(&mut self) {
        self.last_guess = None;
        let prompt = self.next_prompt();
        self.notify(RoundEvent::PromptChanged(prompt));
        self.state.guessing = false;
        self.state.paused = false;
    }

    /// Stop everything and hand over the result log. Only the first call
    /// returns it.
    pub fn end(&mut self) -> Option<Vec<RoundResult>> {
        if self.ended {
            return None;
        }

        self.ended = true;
        self.scheduler.cancel_all();
        self.pending = None;
        self.camera = None;
        self.state.showing_countdown = false;
        self.state.paused = true;
        self.state.guessing = false;

        info!(
            "round {}: ended with {} guesses, live score {}",
            self.id,
            self.results.len(),
            self.score
        );
        self.notify(RoundEvent::Ended {
            guesses: self.results.len(),
        });
        Some(std::mem::take(&mut self.results))
    }

    fn next_prompt(&mut self) -> String {
        let prompt = self.picker.pick(&self.words);
        self.state.current_prompt = prompt.clone();
        prompt
    }

    fn notify(&mut self, event: RoundEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer.notify(&event);
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Guesses logged so far (empty after `end` handed them over)
    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    pub fn view(&self) -> RoundView {
        let prompt_active = self.state.started && !self.state.showing_countdown && !self.ended;
        RoundView {
            remaining_seconds: self.state.remaining_seconds,
            score: self.score,
            prompt: prompt_active.then(|| self.state.current_prompt.clone()),
            last_guess: self.last_guess.clone(),
            countdown: self
                .state
                .showing_countdown
                .then_some(self.state.countdown_value),
            guessing: self.state.guessing,
            started: self.state.started,
            ended: self.ended,
            camera_notice: self.camera_notice.clone(),
        }
    }
}
