mod ui;

use std::{
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    time::Instant,
};

use anyhow::Context;
use brailler::{
    app_dirs::AppDirs,
    audio::AudioOutput,
    config::{
        setting_value, FileSettingsStore, PracticeTopic, SessionSettings, SettingsStore,
        SoundTheme, SpeechVoice, KEY_AUDIO_EFFECT, KEY_AUDIO_ENABLED, KEY_DISPLAY_INTERVAL,
        KEY_GAME_LENGTH, KEY_PRACTICE_TOPIC, KEY_TIME_LIMIT, KEY_TTS_VOICE,
    },
    game::{Effect, Game},
    history::{GameRecord, HistoryLog},
    runtime::{route_key, Command, CrosstermEventSource, FixedTicker, InputMode, Runner, TrainerEvent},
    session::SessionPhase,
};
use clap::{error::ErrorKind, value_parser, CommandFactory, Parser};
use crossterm::{
    event::{KeyEvent, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use env_logger::{Env, Target};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::ui::animation::AnimationTracker;

/// timed braille chord typing trainer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type six-dot braille chords on the home row (f d s j k l = dots 1-6) before the falling characters run out of time. Options given here are saved and become the new defaults."
)]
pub struct Cli {
    /// seconds between new characters of a word
    #[clap(short = 'i', long, value_parser = value_parser!(u8).range(1..=7))]
    interval: Option<u8>,

    /// minutes per round when the time limit is on
    #[clap(short = 'l', long, value_parser = value_parser!(u8).range(1..=5))]
    length: Option<u8>,

    /// what to practice
    #[clap(short = 't', long, value_enum)]
    topic: Option<PracticeTopic>,

    /// speech voice
    #[clap(long, value_enum)]
    voice: Option<SpeechVoice>,

    /// sound effect theme for cues
    #[clap(long, value_enum)]
    sound_effects: Option<SoundTheme>,

    /// speak words and characters aloud
    #[clap(long)]
    speech: Option<bool>,

    /// end the round when its length runs out
    #[clap(long)]
    time_limit: Option<bool>,

    /// commit chords with space instead of key releases
    #[clap(long)]
    latched: bool,

    /// where to write the log (defaults to the state directory)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Write every option given on the command line into the settings store.
    fn persist(&self, store: &dyn SettingsStore) -> io::Result<()> {
        if let Some(interval) = self.interval {
            store.write_setting(KEY_DISPLAY_INTERVAL, &interval.to_string())?;
        }
        if let Some(length) = self.length {
            store.write_setting(KEY_GAME_LENGTH, &length.to_string())?;
        }
        if let Some(topic) = self.topic {
            store.write_setting(KEY_PRACTICE_TOPIC, &setting_value(&topic))?;
        }
        if let Some(voice) = self.voice {
            store.write_setting(KEY_TTS_VOICE, &setting_value(&voice))?;
        }
        if let Some(theme) = self.sound_effects {
            store.write_setting(KEY_AUDIO_EFFECT, &setting_value(&theme))?;
        }
        if let Some(speech) = self.speech {
            store.write_setting(KEY_AUDIO_ENABLED, &speech.to_string())?;
        }
        if let Some(time_limit) = self.time_limit {
            store.write_setting(KEY_TIME_LIMIT, &time_limit.to_string())?;
        }
        Ok(())
    }
}

type AudioFactory = fn(&SessionSettings) -> AudioOutput;

pub struct App {
    pub game: Game,
    pub animations: AnimationTracker,
    pub best_points: Option<i64>,
    pub input_mode: InputMode,
    store: Box<dyn SettingsStore>,
    audio: AudioOutput,
    audio_factory: AudioFactory,
    history: Option<HistoryLog>,
}

impl App {
    pub fn new(
        store: Box<dyn SettingsStore>,
        audio_factory: AudioFactory,
        history: Option<HistoryLog>,
        input_mode: InputMode,
        now: Instant,
    ) -> anyhow::Result<Self> {
        let settings = SessionSettings::load(store.as_ref());
        let game = Game::start(settings, now).context("could not load the word list")?;
        Ok(Self::with_game(game, store, audio_factory, history, input_mode, now))
    }

    pub fn with_game(
        game: Game,
        store: Box<dyn SettingsStore>,
        audio_factory: AudioFactory,
        history: Option<HistoryLog>,
        input_mode: InputMode,
        now: Instant,
    ) -> Self {
        let best_points = history.as_ref().and_then(HistoryLog::best_points);
        let mut app = Self {
            audio: audio_factory(game.settings()),
            game,
            animations: AnimationTracker::new(),
            best_points,
            input_mode,
            store,
            audio_factory,
            history,
        };
        app.flush(now);
        app
    }

    pub fn tick(&mut self, now: Instant) {
        self.game.on_tick(now);
        self.flush(now);

        for index in self.animations.update(now) {
            self.game.on_animation_complete(index);
        }
        self.flush(now);
        self.audio.poll();
    }

    /// Returns false once the player asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> anyhow::Result<bool> {
        match route_key(&mut self.game, key, self.input_mode, now) {
            Some(Command::Quit) => return Ok(false),
            Some(Command::Restart) => {
                let settings = SessionSettings::load(self.store.as_ref());
                self.audio = (self.audio_factory)(&settings);
                self.animations.clear();
                self.game.restart(settings, now)?;
            }
            Some(Command::EndRound) => self.game.on_time_budget_exhausted(),
            None => {}
        }
        self.flush(now);
        Ok(true)
    }

    fn flush(&mut self, now: Instant) {
        for effect in self.game.drain_effects() {
            self.audio.handle(&effect);
            self.animations.on_effect(&effect, now);
            if effect == Effect::PhaseChanged(SessionPhase::Over) {
                self.record_game();
            }
        }
    }

    fn record_game(&mut self) {
        let score = self.game.score();
        info!(
            "game over: {} points, {} correct, {} incorrect, {} skipped",
            score.points, score.correct, score.incorrect, score.skipped
        );

        let Some(history) = self.history.as_ref() else {
            return;
        };
        if let Err(e) = history.append(&GameRecord::new(score, self.game.settings())) {
            warn!("could not save game history: {e}");
        }
        self.best_points = history.best_points();
    }
}

fn init_logging(path: Option<PathBuf>) {
    // The terminal belongs to the TUI, so logs only ever go to a file.
    let Some(path) = path else {
        return;
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging(cli.log_file.clone().or_else(AppDirs::log_path));

    let store = FileSettingsStore::new();
    if let Err(e) = cli.persist(&store) {
        warn!("could not save settings to {}: {e}", store.path().display());
    }

    enable_raw_mode().context("could not enable raw mode")?;

    let keyboard_enhanced = !cli.latched && supports_keyboard_enhancement().unwrap_or(false);
    let input_mode = if keyboard_enhanced {
        InputMode::Enhanced
    } else {
        InputMode::Latched
    };
    info!("starting in {input_mode:?} input mode");

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("could not enter the alternate screen")?;
    if keyboard_enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let history = AppDirs::history_path().map(HistoryLog::new);
    let result = App::new(
        Box::new(store),
        AudioOutput::for_settings,
        history,
        input_mode,
        Instant::now(),
    )
    .and_then(|mut app| start_tui(&mut terminal, &mut app));

    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            TrainerEvent::Tick => app.tick(Instant::now()),
            TrainerEvent::Resize => {}
            TrainerEvent::Key(key) => {
                if !app.handle_key(key, Instant::now())? {
                    break;
                }
            }
        }
    }

    app.game.teardown();
    Ok(())
}
