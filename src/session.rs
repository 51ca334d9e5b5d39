use log::{info, warn};

use crate::scoring::{final_score, ScoringMode};

/// One submitted guess. Never modified after it is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundResult {
    pub prompt: String,
    pub guess: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Active,
    Ended,
}

/// Cross-round state: the final result log and score.
///
/// `Active -> Ended` when a round hands over its results, `Ended -> Active`
/// on [`Session::reset`].
#[derive(Debug)]
pub struct Session {
    active: bool,
    results: Vec<RoundResult>,
    score: u32,
    scoring: ScoringMode,
    generation: u64,
}

impl Session {
    pub fn new(scoring: ScoringMode) -> Self {
        Self {
            active: true,
            results: Vec::new(),
            score: 0,
            scoring,
            generation: 0,
        }
    }

    pub fn on_round_end(&mut self, results: Vec<RoundResult>) {
        if !self.active {
            warn!("round results arrived for an ended session; ignoring");
            return;
        }

        let judge = self.scoring.final_judge();
        self.score = final_score(&results, judge.as_ref());
        self.results = results;
        self.active = false;

        info!(
            "session ended: {} guesses, final score {}",
            self.results.len(),
            self.score
        );
    }

    pub fn reset(&mut self) {
        self.results.clear();
        self.score = 0;
        self.active = true;
        self.generation += 1;
    }

    pub fn phase(&self) -> SessionPhase {
        if self.active {
            SessionPhase::Active
        } else {
            SessionPhase::Ended
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Bumped on every reset; used to tell rounds apart
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ScoringMode::default())
    }
}
