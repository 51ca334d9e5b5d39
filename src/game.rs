use std::time::Instant;

use log::debug;

use crate::guess::GuessOutcome;
use crate::round::Round;
use crate::scoring::ScoringMode;
use crate::session::{RoundResult, Session};

/// Builds the round for a session generation
pub trait RoundFactory {
    fn build(&mut self, round_id: u64) -> Round;
}

impl<F: FnMut(u64) -> Round> RoundFactory for F {
    fn build(&mut self, round_id: u64) -> Round {
        self(round_id)
    }
}

/// Top-level controller: the session, plus the live round while the session
/// is active. The round is dropped (timers and camera with it) as soon as it
/// hands its results over.
pub struct Game<F: RoundFactory> {
    session: Session,
    round: Option<Round>,
    factory: F,
}

impl<F: RoundFactory> Game<F> {
    pub fn new(scoring: ScoringMode, mut factory: F) -> Self {
        let session = Session::new(scoring);
        let round = factory.build(session.generation());
        Self {
            session,
            round: Some(round),
            factory,
        }
    }

    pub fn start(&mut self, now: Instant) {
        if let Some(round) = self.round.as_mut() {
            round.start(now);
        }
    }

    pub fn request_guess(&mut self) -> bool {
        self.round
            .as_mut()
            .map(|round| round.request_guess())
            .unwrap_or(false)
    }

    /// Manual end of the running round
    pub fn end_round(&mut self) {
        if let Some(results) = self.round.as_mut().and_then(|round| round.end()) {
            self.finish(results);
        }
    }

    pub fn poll(&mut self, now: Instant) {
        if let Some(results) = self.round.as_mut().and_then(|round| round.poll(now)) {
            self.finish(results);
        }
    }

    pub fn on_guess(&mut self, now: Instant, outcome: GuessOutcome) {
        match self.round.as_mut() {
            Some(round) => {
                round.complete_guess(now, outcome);
            }
            None => debug!("no round running, dropping guess {:?}", outcome.ticket),
        }
    }

    /// Back to a fresh session with a new round. Only meaningful once ended.
    pub fn play_again(&mut self) {
        if self.session.is_active() {
            return;
        }
        self.session.reset();
        self.round = Some(self.factory.build(self.session.generation()));
    }

    fn finish(&mut self, results: Vec<RoundResult>) {
        self.round = None;
        self.session.on_round_end(results);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn is_over(&self) -> bool {
        !self.session.is_active()
    }
}
