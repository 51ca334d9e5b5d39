use ratatui::Frame;

use crate::{App, AppState};

/// A UI Screen boundary: one per app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Countdown, timer, prompt and the AI's latest guess
pub struct PlayingScreen;

impl Screen for PlayingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Final score and the guess log of the finished game
pub struct GameOverScreen;

impl Screen for GameOverScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing => Box::new(PlayingScreen),
        AppState::GameOver => Box::new(GameOverScreen),
    }
}
