pub mod ui;

use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::{mpsc::Sender, Arc},
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
    tty::IsTty,
};
use log::{debug, info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use scribble::{
    app_dirs::AppDirs,
    camera::{Camera, NoCamera, SnapshotCamera},
    config::{Config, ConfigStore, FileConfigStore},
    game::Game,
    guess::ThreadDispatcher,
    inference::{Inference, OllamaInference, Unavailable},
    logging,
    round::{Round, RoundEvent, RoundObserver},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    scoring::ScoringMode,
    words::{WordList, WordSet},
};

use crate::ui::screen::current_screen;

const TICK_RATE_MS: u64 = 100;

/// draw the prompt, let a vision model guess it, beat the clock
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "A terminal drawing game: sketch the prompted word in front of your camera and ask a vision model to guess it before time runs out."
)]
pub struct Cli {
    /// seconds of drawing time per game
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    round_secs: Option<u32>,

    /// prompt set to draw from
    #[clap(short = 'w', long, value_enum)]
    word_set: Option<WordSet>,

    /// image file an external capture tool keeps overwriting with the latest camera frame
    #[clap(short = 'c', long)]
    camera: Option<PathBuf>,

    /// base url of an Ollama-compatible vision model server
    #[clap(short = 'e', long)]
    endpoint: Option<String>,

    /// vision model to ask
    #[clap(short = 'm', long)]
    model: Option<String>,

    /// how guesses are judged live and at the end of the game
    #[clap(long, value_enum)]
    scoring: Option<ScoringMode>,

    /// write logs here instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// log at debug level
    #[clap(short = 'v', long)]
    verbose: bool,

    /// store the given options as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line flags win over the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.round_secs {
            cfg.round_secs = secs;
        }
        if let Some(set) = self.word_set {
            cfg.word_set = set;
        }
        if let Some(ref path) = self.camera {
            cfg.camera_path = Some(path.clone());
        }
        if let Some(ref endpoint) = self.endpoint {
            cfg.endpoint = Some(endpoint.clone());
        }
        if let Some(ref model) = self.model {
            cfg.model = model.clone();
        }
        if let Some(scoring) = self.scoring {
            cfg.scoring = scoring;
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Playing,
    GameOver,
}

type RoundBuilder = Box<dyn FnMut(u64) -> Round>;

/// Mirrors remaining time into the terminal title
struct TitleObserver;

impl RoundObserver for TitleObserver {
    fn notify(&mut self, event: &RoundEvent) {
        let title = match event {
            RoundEvent::Tick { remaining_seconds } => {
                format!("Scribble - Time Left: {remaining_seconds}s")
            }
            RoundEvent::Ended { .. } => "Scribble".to_string(),
            _ => return,
        };
        if let Err(e) = execute!(io::stdout(), SetTitle(title)) {
            debug!("could not set terminal title: {e}");
        }
    }
}

pub struct App {
    pub config: Config,
    pub game: Game<RoundBuilder>,
}

impl App {
    pub fn new(config: Config, words: WordList, events: Sender<GameEvent>, set_title: bool) -> Self {
        let inference = inference_for(&config);
        let round_config = config.round_config();
        let camera_path = config.camera_path.clone();

        let factory: RoundBuilder = Box::new(move |id| {
            let camera: Box<dyn Camera> = match camera_path {
                Some(ref path) => Box::new(SnapshotCamera::new(path)),
                None => Box::new(NoCamera),
            };
            let dispatcher = ThreadDispatcher::new(Arc::clone(&inference), events.clone());
            let round = Round::new(id, round_config, words.clone(), camera, Box::new(dispatcher));
            if set_title {
                round.with_observer(Box::new(TitleObserver))
            } else {
                round
            }
        });

        Self {
            game: Game::new(config.scoring, factory),
            config,
        }
    }

    pub fn state(&self) -> AppState {
        if self.game.is_over() {
            AppState::GameOver
        } else {
            AppState::Playing
        }
    }

    /// Returns true when the app should quit
    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return true;
        }

        match self.state() {
            AppState::Playing => match key.code {
                KeyCode::Char('s') | KeyCode::Enter => self.game.start(now),
                KeyCode::Char('g') | KeyCode::Char(' ') => {
                    self.game.request_guess();
                }
                KeyCode::Char('e') => self.game.end_round(),
                _ => {}
            },
            AppState::GameOver => match key.code {
                KeyCode::Char('r') | KeyCode::Enter => self.game.play_again(),
                KeyCode::Char('q') => return true,
                _ => {}
            },
        }
        false
    }

    pub fn on_event(&mut self, event: GameEvent, now: Instant) -> bool {
        let quit = match event {
            GameEvent::Key(key) => self.on_key(key, now),
            GameEvent::Guess(outcome) => {
                self.game.on_guess(now, outcome);
                false
            }
            GameEvent::Resize | GameEvent::Tick => false,
        };
        self.game.poll(now);
        quit
    }
}

fn inference_for(config: &Config) -> Arc<dyn Inference> {
    match config.endpoint {
        Some(ref endpoint) => match OllamaInference::new(endpoint.as_str(), config.model.as_str()) {
            Ok(model) => Arc::new(model),
            Err(e) => {
                warn!("could not set up image model at {endpoint}: {e}");
                Arc::new(Unavailable)
            }
        },
        None => Arc::new(Unavailable),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = cli.log_file.clone().or_else(AppDirs::log_path) {
        if let Err(e) = logging::init(&log_path, cli.verbose) {
            eprintln!("logging disabled: {e}");
        }
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
        info!("saved defaults to {}", store.path().display());
    }

    let words = config.word_set.load()?;
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut app = App::new(config, words, runner.sender(), true);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        SetTitle("")
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: GameEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(app, f))?;

        if app.on_event(runner.step(), Instant::now()) {
            break;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    current_screen(&app.state()).render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use scribble::runtime::TestEventSource;

    fn words() -> WordList {
        WordList::new("test", vec!["cat".into()]).unwrap()
    }

    fn app(config: Config) -> App {
        let events = TestEventSource::new();
        App::new(config, words(), events.sender(), false)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen_text(app: &App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(app, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["scribble"]);

        assert_eq!(cli.round_secs, None);
        assert_eq!(cli.word_set, None);
        assert_eq!(cli.camera, None);
        assert_eq!(cli.endpoint, None);
        assert!(!cli.verbose);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_round_secs() {
        let cli = Cli::parse_from(["scribble", "-s", "30"]);
        assert_eq!(cli.round_secs, Some(30));

        let cli = Cli::parse_from(["scribble", "--round-secs", "90"]);
        assert_eq!(cli.round_secs, Some(90));
    }

    #[test]
    fn test_cli_rejects_zero_seconds() {
        assert!(Cli::try_parse_from(["scribble", "-s", "0"]).is_err());
    }

    #[test]
    fn test_cli_word_set_and_scoring() {
        let cli = Cli::parse_from(["scribble", "-w", "animals", "--scoring", "lenient"]);
        assert_eq!(cli.word_set, Some(WordSet::Animals));
        assert_eq!(cli.scoring, Some(ScoringMode::Lenient));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "scribble",
            "-c",
            "/tmp/frame.jpg",
            "-e",
            "http://localhost:11434",
            "-m",
            "moondream",
        ]);
        let stored = Config {
            round_secs: 45,
            ..Config::default()
        };
        let cfg = cli.apply(stored);

        assert_eq!(cfg.round_secs, 45);
        assert_eq!(cfg.camera_path, Some(PathBuf::from("/tmp/frame.jpg")));
        assert_eq!(cfg.endpoint.as_deref(), Some("http://localhost:11434"));
        assert_eq!(cfg.model, "moondream");
    }

    #[test]
    fn test_app_starts_playing_without_camera() {
        let app = app(Config::default());
        assert_eq!(app.state(), AppState::Playing);
        let round = app.game.round().unwrap();
        assert!(!round.has_camera());
        assert!(round.view().camera_notice.is_some());
    }

    #[test]
    fn test_start_and_end_keys() {
        let mut app = app(Config::default());
        let now = Instant::now();

        assert!(!app.on_key(key(KeyCode::Char('s')), now));
        assert!(app.game.round().unwrap().state().started);

        assert!(!app.on_key(key(KeyCode::Char('e')), now));
        assert_eq!(app.state(), AppState::GameOver);
        assert_eq!(app.game.session().score(), 0);

        assert!(!app.on_key(key(KeyCode::Char('r')), now));
        assert_eq!(app.state(), AppState::Playing);
        assert!(!app.game.round().unwrap().state().started);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app(Config::default());
        let now = Instant::now();
        assert!(app.on_key(key(KeyCode::Esc), now));
        assert!(app.on_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            now
        ));
        // q only quits from the summary screen
        assert!(!app.on_key(key(KeyCode::Char('q')), now));
        app.on_key(key(KeyCode::Char('e')), now);
        assert!(app.on_key(key(KeyCode::Char('q')), now));
    }

    #[test]
    fn test_guess_key_without_camera_is_ignored() {
        let mut app = app(Config::default());
        let now = Instant::now();
        app.on_key(key(KeyCode::Char('s')), now);
        app.on_event(GameEvent::Tick, now + Duration::from_secs(3));
        app.on_key(key(KeyCode::Char('g')), now + Duration::from_secs(3));
        assert!(!app.game.round().unwrap().state().guessing);
    }

    #[test]
    fn test_timeout_through_events() {
        let mut app = app(Config {
            round_secs: 2,
            ..Config::default()
        });
        let now = Instant::now();
        app.on_key(key(KeyCode::Enter), now);
        app.on_event(GameEvent::Tick, now + Duration::from_secs(3));
        assert_eq!(app.state(), AppState::Playing);
        app.on_event(GameEvent::Tick, now + Duration::from_secs(5));
        assert_eq!(app.state(), AppState::GameOver);
    }

    #[test]
    fn test_ui_playing_screen() {
        let app = app(Config::default());
        let content = screen_text(&app);
        assert!(content.contains("Time: 120s"));
        assert!(content.contains("Score: 0"));
        assert!(content.contains("(s)tart"));
    }

    #[test]
    fn test_ui_countdown_and_prompt() {
        let mut app = app(Config::default());
        let now = Instant::now();
        app.on_key(key(KeyCode::Char('s')), now);
        let content = screen_text(&app);
        assert!(content.contains("Get ready"));
        assert!(!content.contains("Draw this"));

        app.on_event(GameEvent::Tick, now + Duration::from_secs(3));
        assert!(screen_text(&app).contains("Draw this: cat"));
    }

    #[test]
    fn test_ui_game_over_screen() {
        let mut app = app(Config::default());
        let now = Instant::now();
        app.on_key(key(KeyCode::Char('s')), now);
        app.on_key(key(KeyCode::Char('e')), now);

        let content = screen_text(&app);
        assert!(content.contains("Time's Up!"));
        assert!(content.contains("Your Final Score: 0"));
    }

    #[test]
    fn test_ui_small_terminal_does_not_panic() {
        let app = app(Config::default());
        let backend = TestBackend::new(10, 4);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(&app, f)).unwrap();
    }

    #[test]
    fn test_title_observer_tolerates_every_event() {
        let mut observer = TitleObserver;
        observer.notify(&RoundEvent::Countdown(3));
        observer.notify(&RoundEvent::GuessPending);
        observer.notify(&RoundEvent::Tick {
            remaining_seconds: 42,
        });
        observer.notify(&RoundEvent::Ended { guesses: 0 });
    }

    #[test]
    fn test_tick_rate_constant() {
        assert_eq!(TICK_RATE_MS, 100);

        const _: () = assert!(TICK_RATE_MS > 0);
        const _: () = assert!(TICK_RATE_MS <= 1000);
    }
}
