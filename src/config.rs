use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::round::{RoundConfig, DEFAULT_ROUND_SECS};
use crate::scoring::ScoringMode;
use crate::words::WordSet;

pub const DEFAULT_MODEL: &str = "llava";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub round_secs: u32,
    pub word_set: WordSet,
    pub scoring: ScoringMode,
    /// snapshot file kept fresh by an external capture tool
    pub camera_path: Option<PathBuf>,
    /// Ollama-compatible base url, e.g. http://localhost:11434
    pub endpoint: Option<String>,
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            round_secs: DEFAULT_ROUND_SECS,
            word_set: WordSet::default(),
            scoring: ScoringMode::default(),
            camera_path: None,
            endpoint: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    pub fn round_config(&self) -> RoundConfig {
        RoundConfig {
            round_secs: self.round_secs.max(1),
            scoring: self.scoring,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "scribble") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("scribble_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => warn!("ignoring malformed config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            round_secs: 60,
            word_set: WordSet::Animals,
            scoring: ScoringMode::Lenient,
            camera_path: Some(PathBuf::from("/tmp/frame.jpg")),
            endpoint: Some("http://localhost:11434".into()),
            model: "moondream".into(),
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn store_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{ "round_secs": 30, "word_set": "animals" }"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.round_secs, 30);
        assert_eq!(cfg.word_set, WordSet::Animals);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.scoring, ScoringMode::Split);
    }

    #[test]
    fn round_config_clamps_zero_seconds() {
        let cfg = Config {
            round_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.round_config().round_secs, 1);
    }
}
