use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::Frame;

/// Instruction sent alongside every captured frame
pub const GUESS_INSTRUCTION: &str =
    "Describe the main object in this drawing using only a single word.";

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("image model is not available")]
    Unavailable,
    #[error("image model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image model answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("image model gave an empty answer")]
    EmptyAnswer,
}

/// A model that can name what is drawn in a frame
pub trait Inference: Send + Sync {
    /// Probe whether the backend can be used right now. Absence is normal.
    fn is_available(&self) -> bool;

    fn describe(&self, frame: &Frame, instruction: &str) -> Result<String, InferenceError>;
}

/// Used when no model is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Inference for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    fn describe(&self, _frame: &Frame, _instruction: &str) -> Result<String, InferenceError> {
        Err(InferenceError::Unavailable)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Vision model served over the Ollama HTTP API
pub struct OllamaInference {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

impl OllamaInference {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(&'a self, frame: &Frame, instruction: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt: instruction,
            images: vec![STANDARD.encode(&frame.bytes)],
            stream: false,
        }
    }
}

impl Inference for OllamaInference {
    fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send() {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("image model probe at {url} failed: {e}");
                false
            }
        }
    }

    fn describe(&self, frame: &Frame, instruction: &str) -> Result<String, InferenceError> {
        let url = format!("{}/api/generate", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&self.request_body(frame, instruction))
            .send()?;

        if !resp.status().is_success() {
            return Err(InferenceError::Status(resp.status()));
        }

        let body: GenerateResponse = resp.json()?;
        parse_answer(&body.response)
    }
}

/// The whole answer, trimmed. Judging happens on the round side.
fn parse_answer(raw: &str) -> Result<String, InferenceError> {
    let answer = raw.trim();
    if answer.is_empty() {
        return Err(InferenceError::EmptyAnswer);
    }
    Ok(answer.to_string())
}
