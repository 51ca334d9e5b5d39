// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod camera;
pub mod config;
pub mod game;
pub mod guess;
pub mod inference;
pub mod logging;
pub mod round;
pub mod runtime;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod words;
