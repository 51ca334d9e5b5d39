use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

#[derive(Debug, Error)]
pub enum WordListError {
    #[error("word set `{0}` is not bundled")]
    NotFound(String),
    #[error("word set `{0}` is not valid utf-8")]
    Encoding(String),
    #[error("word set `{name}` could not be parsed: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("word set `{0}` has no words")]
    Empty(String),
}

/// The bundled prompt sets
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WordSet {
    #[default]
    Everyday,
    Animals,
}

impl WordSet {
    pub fn load(&self) -> Result<WordList, WordListError> {
        WordList::from_bundle(&self.to_string())
    }
}

/// A fixed, read-only set of prompts. Never empty.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct WordList {
    pub name: String,
    pub words: Vec<String>,
}

impl WordList {
    pub fn new(name: impl Into<String>, words: Vec<String>) -> Result<Self, WordListError> {
        let name = name.into();
        if words.is_empty() {
            return Err(WordListError::Empty(name));
        }
        Ok(Self { name, words })
    }

    fn from_bundle(name: &str) -> Result<Self, WordListError> {
        let file = WORDS_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| WordListError::NotFound(name.to_string()))?;

        let contents = file
            .contents_utf8()
            .ok_or_else(|| WordListError::Encoding(name.to_string()))?;

        let list: WordList =
            serde_json::from_str(contents).map_err(|source| WordListError::Parse {
                name: name.to_string(),
                source,
            })?;

        Self::new(list.name, list.words)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Strategy for choosing the next prompt
pub trait PromptPicker {
    fn pick(&mut self, words: &WordList) -> String;
}

/// Uniform selection with replacement; repeats are allowed
pub struct RandomPicker<R: Rng = ThreadRng> {
    rng: R,
}

impl RandomPicker {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPicker<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> PromptPicker for RandomPicker<R> {
    fn pick(&mut self, words: &WordList) -> String {
        words
            .words
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_default()
    }
}

/// Walks the list in order, wrapping around. Handy for scripted sessions.
#[derive(Debug, Default)]
pub struct SequentialPicker {
    next: usize,
}

impl PromptPicker for SequentialPicker {
    fn pick(&mut self, words: &WordList) -> String {
        if words.is_empty() {
            return String::new();
        }
        let word = words.words[self.next % words.len()].clone();
        self.next += 1;
        word
    }
}
