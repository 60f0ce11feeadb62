use brailler::session::SessionPhase;
use ratatui::Frame;

use crate::{
    ui::{render_countdown, render_game_over, render_gameplay},
    App,
};

/// A UI Screen boundary: responsible for rendering one session phase
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Big countdown digit before play starts
pub struct CountdownScreen;

impl Screen for CountdownScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_countdown(app, f);
    }
}

/// Falling braille cells, the target word and the score
pub struct GameplayScreen;

impl Screen for GameplayScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_gameplay(app, f);
    }
}

/// Final score and restart prompt
pub struct GameOverScreen;

impl Screen for GameOverScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        render_game_over(app, f);
    }
}

/// Helper to construct the appropriate screen for the current phase
pub fn current_screen(phase: SessionPhase) -> Box<dyn Screen> {
    match phase {
        SessionPhase::Countdown => Box::new(CountdownScreen),
        SessionPhase::Active => Box::new(GameplayScreen),
        SessionPhase::Over => Box::new(GameOverScreen),
    }
}
