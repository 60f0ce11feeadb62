use clap::ValueEnum;
use directories::ProjectDirs;
use log::warn;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const KEY_AUDIO_ENABLED: &str = "audioEnabled";
pub const KEY_TTS_VOICE: &str = "ttsVoice";
pub const KEY_DISPLAY_INTERVAL: &str = "displayInterval";
pub const KEY_GAME_LENGTH: &str = "gameLength";
pub const KEY_PRACTICE_TOPIC: &str = "practiceTopic";
pub const KEY_AUDIO_EFFECT: &str = "audioEffect";
pub const KEY_TIME_LIMIT: &str = "timeLimit";

pub const SPAWN_INTERVAL_RANGE: std::ops::RangeInclusive<u8> = 1..=7;
pub const SESSION_LENGTH_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum SpeechVoice {
    English,
    Japanese,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum PracticeTopic {
    Alphabet,
    Number,
    #[strum(serialize = "Capital Letters")]
    CapitalLetters,
    #[strum(serialize = "Capital Word")]
    CapitalWord,
    #[strum(serialize = "Capital Passage")]
    CapitalPassage,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum SoundTheme {
    None,
    Quiz,
    Cyber,
}

/// Settings for one session, read once from the store when the session
/// starts or restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub sound_enabled: bool,
    pub speech_voice: SpeechVoice,
    pub spawn_interval_secs: u8,
    pub session_length_mins: u8,
    pub topic: PracticeTopic,
    pub sound_theme: SoundTheme,
    pub time_limit: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            speech_voice: SpeechVoice::English,
            spawn_interval_secs: 1,
            session_length_mins: 1,
            topic: PracticeTopic::Alphabet,
            sound_theme: SoundTheme::None,
            time_limit: false,
        }
    }
}

impl SessionSettings {
    /// Read every setting from the store. Missing keys take their default;
    /// unreadable or out-of-range values are logged and also defaulted.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();

        Self {
            sound_enabled: read_parsed(store, KEY_AUDIO_ENABLED, parse_bool)
                .unwrap_or(defaults.sound_enabled),
            speech_voice: read_parsed(store, KEY_TTS_VOICE, parse_enum)
                .unwrap_or(defaults.speech_voice),
            spawn_interval_secs: read_parsed(store, KEY_DISPLAY_INTERVAL, |v| {
                parse_in_range(v, &SPAWN_INTERVAL_RANGE)
            })
            .unwrap_or(defaults.spawn_interval_secs),
            session_length_mins: read_parsed(store, KEY_GAME_LENGTH, |v| {
                parse_in_range(v, &SESSION_LENGTH_RANGE)
            })
            .unwrap_or(defaults.session_length_mins),
            topic: read_parsed(store, KEY_PRACTICE_TOPIC, parse_enum).unwrap_or(defaults.topic),
            sound_theme: read_parsed(store, KEY_AUDIO_EFFECT, parse_enum)
                .unwrap_or(defaults.sound_theme),
            time_limit: read_parsed(store, KEY_TIME_LIMIT, parse_bool)
                .unwrap_or(defaults.time_limit),
        }
    }

    pub fn spawn_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.spawn_interval_secs as u64)
    }

    pub fn session_length_secs(&self) -> u64 {
        self.session_length_mins as u64 * 60
    }
}

fn read_parsed<T>(
    store: &dyn SettingsStore,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = store.read_setting(key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!("ignoring invalid value {raw:?} for setting {key}");
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_in_range(value: &str, range: &std::ops::RangeInclusive<u8>) -> Option<u8> {
    value.parse::<u8>().ok().filter(|v| range.contains(v))
}

/// Accepts both the kebab-case CLI names and the spaced display names
/// (`capital-letters`, `Capital Letters`).
fn parse_enum<T: ValueEnum>(value: &str) -> Option<T> {
    let normalized = value.trim().to_ascii_lowercase().replace(' ', "-");
    T::from_str(&normalized, true).ok()
}

/// Name under which an enum setting is persisted.
pub fn setting_value<T: ValueEnum>(value: &T) -> String {
    value
        .to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

/// Key-value persistence for settings.
pub trait SettingsStore {
    fn read_setting(&self, key: &str) -> Option<String>;
    fn write_setting(&self, key: &str, value: &str) -> std::io::Result<()>;
}

/// Settings kept as a flat JSON object of strings on disk.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "brailler") {
            pd.config_dir().join("settings.json")
        } else {
            PathBuf::from("brailler_settings.json")
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

    fn read_all(&self) -> HashMap<String, String> {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(map) => return map,
                Err(e) => warn!("settings file {} is corrupt: {e}", self.path.display()),
            }
        }
        HashMap::new()
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn read_setting(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn write_setting(&self, key: &str, value: &str) -> std::io::Result<()> {
        let mut all = self.read_all();
        all.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&all).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

/// In-memory store for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn read_setting(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn write_setting(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
