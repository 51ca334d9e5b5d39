use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use log::{debug, warn};

use crate::camera::Frame;
use crate::inference::{Inference, InferenceError, GUESS_INSTRUCTION};
use crate::runtime::GameEvent;

/// Identifies one guess request: which round issued it and its sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessTicket {
    pub round: u64,
    pub seq: u64,
}

/// Everything the inference side needs to produce a guess
#[derive(Debug, Clone)]
pub struct GuessRequest {
    pub ticket: GuessTicket,
    pub prompt: String,
    pub frame: Frame,
    pub instruction: &'static str,
}

impl GuessRequest {
    pub fn new(ticket: GuessTicket, prompt: String, frame: Frame) -> Self {
        Self {
            ticket,
            prompt,
            frame,
            instruction: GUESS_INSTRUCTION,
        }
    }
}

/// What came back for a request
#[derive(Debug)]
pub struct GuessOutcome {
    pub ticket: GuessTicket,
    pub answer: Result<String, InferenceError>,
}

/// Hands guess requests to the inference capability. Completion is reported
/// back to the round asynchronously (see [`ThreadDispatcher`]).
pub trait GuessDispatcher {
    fn dispatch(&mut self, request: GuessRequest);
}

/// Probe then describe; absence of the model counts as a failure
pub fn run_guess(inference: &dyn Inference, request: &GuessRequest) -> GuessOutcome {
    let answer = if inference.is_available() {
        inference.describe(&request.frame, request.instruction)
    } else {
        Err(InferenceError::Unavailable)
    };

    if let Err(ref e) = answer {
        warn!("guess {:?} failed: {e}", request.ticket);
    }

    GuessOutcome {
        ticket: request.ticket,
        answer,
    }
}

/// Runs each request on its own worker thread and posts the outcome onto the
/// event channel. There is no cancellation; the round drops stale outcomes.
pub struct ThreadDispatcher {
    inference: Arc<dyn Inference>,
    events: Sender<GameEvent>,
}

impl ThreadDispatcher {
    pub fn new(inference: Arc<dyn Inference>, events: Sender<GameEvent>) -> Self {
        Self { inference, events }
    }
}

impl GuessDispatcher for ThreadDispatcher {
    fn dispatch(&mut self, request: GuessRequest) {
        let inference = Arc::clone(&self.inference);
        let events = self.events.clone();

        debug!(
            "dispatching guess {:?} ({}, {} bytes)",
            request.ticket,
            request.frame.media_type,
            request.frame.bytes.len()
        );

        thread::spawn(move || {
            let outcome = run_guess(inference.as_ref(), &request);
            if events.send(GameEvent::Guess(outcome)).is_err() {
                debug!("event loop gone, dropping guess {:?}", request.ticket);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;
    use std::time::Duration;

    struct Fixed(&'static str);

    impl Inference for Fixed {
        fn is_available(&self) -> bool {
            true
        }

        fn describe(&self, _frame: &Frame, instruction: &str) -> Result<String, InferenceError> {
            assert_eq!(instruction, GUESS_INSTRUCTION);
            Ok(self.0.to_string())
        }
    }

    fn request() -> GuessRequest {
        GuessRequest::new(
            GuessTicket { round: 1, seq: 0 },
            "cat".to_string(),
            Frame::new(vec![1, 2, 3], "image/png"),
        )
    }

    #[test]
    fn test_run_guess_success() {
        let outcome = run_guess(&Fixed("Cat"), &request());
        assert_eq!(outcome.ticket, GuessTicket { round: 1, seq: 0 });
        assert_eq!(outcome.answer.unwrap(), "Cat");
    }

    #[test]
    fn test_run_guess_unavailable() {
        let outcome = run_guess(&crate::inference::Unavailable, &request());
        assert_matches!(outcome.answer, Err(InferenceError::Unavailable));
    }

    #[test]
    fn test_thread_dispatcher_posts_outcome() {
        let (tx, rx) = mpsc::channel();
        let mut dispatcher = ThreadDispatcher::new(Arc::new(Fixed("dog")), tx);
        dispatcher.dispatch(request());

        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(GameEvent::Guess(outcome)) => {
                assert_eq!(outcome.answer.unwrap(), "dog");
            }
            other => panic!("expected a guess outcome, got {other:?}"),
        }
    }
}
