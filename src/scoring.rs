use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::session::RoundResult;

/// Decides whether a guess matches the prompt it was made against
pub trait GuessJudge: std::fmt::Debug {
    fn is_correct(&self, prompt: &str, guess: &str) -> bool;
}

/// Case-insensitive equality of the trimmed strings
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl GuessJudge for ExactMatch {
    fn is_correct(&self, prompt: &str, guess: &str) -> bool {
        let prompt = prompt.trim();
        !prompt.is_empty() && guess.trim().to_lowercase() == prompt.to_lowercase()
    }
}

/// Case-insensitive "guess contains prompt". An empty prompt never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsPrompt;

impl GuessJudge for ContainsPrompt {
    fn is_correct(&self, prompt: &str, guess: &str) -> bool {
        let prompt = prompt.trim();
        !prompt.is_empty() && guess.to_lowercase().contains(&prompt.to_lowercase())
    }
}

/// Which judge is used live during the round and which one at session end
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScoringMode {
    /// exact match while playing, substring match for the final score
    #[default]
    Split,
    /// exact match everywhere
    Exact,
    /// substring match everywhere
    Lenient,
}

impl ScoringMode {
    pub fn live_judge(&self) -> Box<dyn GuessJudge> {
        match self {
            ScoringMode::Split | ScoringMode::Exact => Box::new(ExactMatch),
            ScoringMode::Lenient => Box::new(ContainsPrompt),
        }
    }

    pub fn final_judge(&self) -> Box<dyn GuessJudge> {
        match self {
            ScoringMode::Split | ScoringMode::Lenient => Box::new(ContainsPrompt),
            ScoringMode::Exact => Box::new(ExactMatch),
        }
    }
}

pub fn final_score(results: &[RoundResult], judge: &dyn GuessJudge) -> u32 {
    results
        .iter()
        .filter(|r| judge.is_correct(&r.prompt, &r.guess))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(prompt: &str, guess: &str, is_correct: bool) -> RoundResult {
        RoundResult {
            prompt: prompt.to_string(),
            guess: guess.to_string(),
            is_correct,
        }
    }

    #[test]
    fn test_exact_match() {
        assert!(ExactMatch.is_correct("cat", "cat"));
        assert!(ExactMatch.is_correct("Cat", " CAT "));
        assert!(!ExactMatch.is_correct("cat", "a cat"));
        assert!(!ExactMatch.is_correct("cat", "cats"));
        assert!(!ExactMatch.is_correct("", ""));
    }

    #[test]
    fn test_contains_prompt() {
        assert!(ContainsPrompt.is_correct("cat", "a cat"));
        assert!(ContainsPrompt.is_correct("Cat", "CATERPILLAR"));
        assert!(!ContainsPrompt.is_correct("dog", "ai failed"));
        assert!(!ContainsPrompt.is_correct("", "anything"));
    }

    #[test]
    fn test_final_score_uses_substring_match() {
        let results = vec![
            result("cat", "a cat", true),
            result("dog", "AI failed", false),
        ];
        let judge = ScoringMode::Split.final_judge();
        assert_eq!(final_score(&results, judge.as_ref()), 1);
    }

    #[test]
    fn test_split_mode_can_disagree() {
        let mode = ScoringMode::Split;
        assert!(!mode.live_judge().is_correct("cat", "a cat"));
        assert!(mode.final_judge().is_correct("cat", "a cat"));
    }

    #[test]
    fn test_consistent_modes_agree() {
        for mode in [ScoringMode::Exact, ScoringMode::Lenient] {
            for (prompt, guess) in [("cat", "cat"), ("cat", "a cat"), ("dog", "ai failed")] {
                assert_eq!(
                    mode.live_judge().is_correct(prompt, guess),
                    mode.final_judge().is_correct(prompt, guess),
                    "{mode} disagrees on {prompt}/{guess}"
                );
            }
        }
    }

    #[test]
    fn test_final_score_empty() {
        assert_eq!(final_score(&[], &ExactMatch), 0);
    }

    #[test]
    fn test_scoring_mode_serde() {
        let json = serde_json::to_string(&ScoringMode::Lenient).unwrap();
        assert_eq!(json, "\"lenient\"");
        let mode: ScoringMode = serde_json::from_str("\"exact\"").unwrap();
        assert_eq!(mode, ScoringMode::Exact);
    }
}
