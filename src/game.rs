use crate::chord::{self, ChordState};
use crate::config::SessionSettings;
use crate::expiry;
use crate::scheduler::{ActiveCharacter, SpawnScheduler};
use crate::sequencer::{Sequencer, WordListError};
use crate::session::{PlayerScore, SessionPhase, Word, COUNTDOWN_START};
use crate::timer::SessionTimers;
use log::{debug, info};
use std::time::Instant;

/// Sound cues, one per kind of game event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Cue {
    Clear,
    Skip,
    Correct,
    Incorrect,
    Countdown,
}

/// Side effects for the collaborators (audio, speech, renderer), in the order
/// they happened. The game never waits on any of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Cue(Cue),
    SpeakWord(String),
    SpeakCharacter {
        character: char,
        urgent: bool,
    },
    PhaseChanged(SessionPhase),
    NewWord(String),
    Spawned {
        index: usize,
        character: char,
        expected_encoding: String,
    },
}

/// One countdown -> gameplay -> game over lifecycle.
///
/// All state is owned here and changed only through the `on_*` transitions,
/// which the event loop calls one at a time.
#[derive(Debug)]
pub struct Game {
    settings: SessionSettings,
    sequencer: Sequencer,
    phase: SessionPhase,
    countdown: u8,
    score: PlayerScore,
    word: Option<Word>,
    cursor: usize,
    highlighted: Vec<usize>,
    active: Vec<ActiveCharacter>,
    scheduler: SpawnScheduler,
    chord: ChordState,
    timers: SessionTimers,
    seconds_remaining: u64,
    words_started: u64,
    effects: Vec<Effect>,
}

impl Game {
    /// Start a session for the configured topic.
    pub fn start(settings: SessionSettings, now: Instant) -> Result<Self, WordListError> {
        let sequencer = Sequencer::for_topic(settings.topic)?;
        Ok(Self::new(settings, sequencer, now))
    }

    pub fn new(settings: SessionSettings, sequencer: Sequencer, now: Instant) -> Self {
        let mut game = Self {
            scheduler: SpawnScheduler::new(settings.spawn_interval()),
            seconds_remaining: settings.session_length_secs(),
            settings,
            sequencer,
            phase: SessionPhase::Countdown,
            countdown: COUNTDOWN_START,
            score: PlayerScore::default(),
            word: None,
            cursor: 0,
            highlighted: Vec::new(),
            active: Vec::new(),
            chord: ChordState::new(),
            timers: SessionTimers::default(),
            words_started: 0,
            effects: Vec::new(),
        };
        game.enter_countdown(now);
        game
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn countdown(&self) -> u8 {
        self.countdown
    }

    pub fn score(&self) -> &PlayerScore {
        &self.score
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn word(&self) -> Option<&Word> {
        self.word.as_ref()
    }

    /// Index of the character the next chord is checked against.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn highlighted(&self) -> &[usize] {
        &self.highlighted
    }

    pub fn active(&self) -> &[ActiveCharacter] {
        &self.active
    }

    pub fn current(&self) -> Option<&ActiveCharacter> {
        self.active.get(self.cursor)
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.seconds_remaining
    }

    pub fn words_started(&self) -> u64 {
        self.words_started
    }

    pub fn pending_chord(&self) -> String {
        self.chord.pending_encoding()
    }

    pub fn is_running(&self) -> bool {
        self.timers.any_armed()
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Fire whichever session timers are due.
    pub fn on_tick(&mut self, now: Instant) {
        if self.timers.countdown.fire(now) {
            self.on_countdown_tick(now);
        }
        if self.timers.poll.fire(now) {
            self.poll(now);
        }
        if self.timers.clock.fire(now) {
            self.on_clock_tick();
        }
    }

    pub fn on_countdown_tick(&mut self, now: Instant) {
        if self.phase != SessionPhase::Countdown {
            return;
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            self.effects.push(Effect::Cue(Cue::Countdown));
        } else {
            self.enter_active(now);
        }
    }

    pub fn on_key_press(&mut self, key: char) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.chord.press(key);
    }

    pub fn on_key_release(&mut self, key: char, now: Instant) {
        if self.phase != SessionPhase::Active {
            return;
        }
        if let Some(encoding) = self.chord.release(key) {
            self.on_chord_resolved(&encoding, now);
        }
    }

    /// Treat every held dot key as released at once.
    pub fn on_release_all(&mut self, now: Instant) {
        if self.phase != SessionPhase::Active {
            return;
        }
        if let Some(encoding) = self.chord.release_all() {
            self.on_chord_resolved(&encoding, now);
        }
    }

    /// Check a finished chord against the character at the cursor.
    pub fn on_chord_resolved(&mut self, encoding: &str, now: Instant) {
        if self.phase != SessionPhase::Active || encoding.is_empty() {
            return;
        }
        let Some(current) = self.active.get_mut(self.cursor) else {
            return;
        };

        if !chord::matches(encoding, &current.expected_encoding) {
            debug!(
                "chord {encoding} does not match {} for {:?}",
                current.expected_encoding, current.character
            );
            self.score.record_incorrect();
            self.effects.push(Effect::Cue(Cue::Incorrect));
            return;
        }

        current.complete();
        self.score.record_correct();
        self.highlighted.push(self.cursor);
        self.cursor += 1;

        let word_len = self.word.as_ref().map_or(0, Word::len);
        if self.cursor >= word_len {
            self.effects.push(Effect::Cue(Cue::Clear));
            self.start_word(now);
            return;
        }

        if self.active.len() == self.cursor {
            self.activate(self.cursor, now);
        }
        self.effects.push(Effect::Cue(Cue::Correct));
        if let Some(next) = self.word.as_ref().and_then(|w| w.entry(self.cursor)) {
            self.effects.push(Effect::SpeakCharacter {
                character: next.character,
                urgent: false,
            });
        }
    }

    /// The word ran out of time: penalise once and move on to a new word.
    pub fn on_expiry(&mut self, now: Instant) {
        if self.phase != SessionPhase::Active {
            return;
        }

        info!(
            "word {:?} expired at character {}",
            self.word.as_ref().map(|w| w.text.as_str()).unwrap_or_default(),
            self.cursor
        );
        self.effects.push(Effect::Cue(Cue::Skip));
        self.score.record_skip();
        self.start_word(now);
    }

    /// Renderer callback: the entry animation of `index` has finished.
    pub fn on_animation_complete(&mut self, index: usize) {
        if self.phase != SessionPhase::Active {
            return;
        }
        self.scheduler.mark_animation_complete(index);
    }

    pub fn on_time_budget_exhausted(&mut self) {
        if self.phase != SessionPhase::Active {
            return;
        }

        info!("session over with {} points", self.score.points);
        self.phase = SessionPhase::Over;
        self.timers.cancel_all();
        self.chord.clear();
        self.active.clear();
        self.effects.push(Effect::PhaseChanged(SessionPhase::Over));
    }

    /// Over -> Countdown with fresh settings and a zeroed score. The word
    /// source is rebuilt only when the topic changed.
    pub fn restart(&mut self, settings: SessionSettings, now: Instant) -> Result<(), WordListError> {
        if self.phase != SessionPhase::Over {
            return Ok(());
        }

        if settings.topic != self.settings.topic {
            self.sequencer = Sequencer::for_topic(settings.topic)?;
        }
        self.scheduler = SpawnScheduler::new(settings.spawn_interval());
        self.settings = settings;
        self.score = PlayerScore::default();
        self.enter_countdown(now);
        Ok(())
    }

    /// Stop every timer; later ticks leave the session untouched.
    pub fn teardown(&mut self) {
        debug!("tearing down session in phase {}", self.phase);
        self.timers.cancel_all();
        self.chord.clear();
    }

    fn enter_countdown(&mut self, now: Instant) {
        self.phase = SessionPhase::Countdown;
        self.countdown = COUNTDOWN_START;
        self.word = None;
        self.cursor = 0;
        self.highlighted.clear();
        self.active.clear();
        self.chord.clear();
        self.seconds_remaining = self.settings.session_length_secs();
        self.timers.cancel_all();
        self.timers.countdown.arm(now);

        self.effects.push(Effect::PhaseChanged(SessionPhase::Countdown));
        self.effects.push(Effect::Cue(Cue::Countdown));
    }

    fn enter_active(&mut self, now: Instant) {
        info!(
            "session started: interval {}s, topic {}",
            self.settings.spawn_interval_secs, self.settings.topic
        );
        self.phase = SessionPhase::Active;
        self.timers.countdown.cancel();
        self.timers.poll.arm(now);
        if self.settings.time_limit {
            self.timers.clock.arm(now);
        }
        self.effects.push(Effect::PhaseChanged(SessionPhase::Active));
        self.start_word(now);
    }

    fn start_word(&mut self, now: Instant) {
        let word = self.sequencer.generate_new_word();
        debug!("new word {:?}", word.text);

        self.cursor = 0;
        self.highlighted.clear();
        self.active.clear();
        self.chord.clear();
        self.scheduler.reset(word.len());
        self.words_started += 1;

        self.effects.push(Effect::NewWord(word.text.clone()));
        self.effects.push(Effect::SpeakWord(word.text.clone()));
        self.word = Some(word);

        if let Some(first) = self.word.as_ref().and_then(|w| w.entry(0)) {
            let character = first.character;
            self.activate(0, now);
            self.effects.push(Effect::SpeakCharacter {
                character,
                urgent: true,
            });
        }
    }

    fn activate(&mut self, index: usize, now: Instant) {
        let Some(entry) = self.word.as_ref().and_then(|w| w.entry(index)) else {
            return;
        };

        let active = ActiveCharacter::new(index, entry, now);
        self.effects.push(Effect::Spawned {
            index,
            character: active.character,
            expected_encoding: active.expected_encoding.clone(),
        });
        self.active.push(active);
    }

    fn poll(&mut self, now: Instant) {
        if self.phase != SessionPhase::Active {
            return;
        }

        if expiry::word_expired(&self.active, now) {
            debug!("{} characters overdue", expiry::stale_count(&self.active, now));
            self.on_expiry(now);
            return;
        }

        let next = self
            .word
            .as_ref()
            .and_then(|w| self.scheduler.next_spawn(w, &self.active, now));
        if let Some(index) = next {
            self.activate(index, now);
        }
    }

    fn on_clock_tick(&mut self) {
        if self.phase != SessionPhase::Active || !self.settings.time_limit {
            return;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.on_time_budget_exhausted();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::DOT_KEYS;
    use crate::scheduler::TIME_TO_LIVE;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn cat_game(settings: SessionSettings, t0: Instant) -> Game {
        let sequencer = Sequencer::from_words(&["cat"]).unwrap();
        Game::new(settings, sequencer, t0)
    }

    /// Run the countdown to completion; returns the instant gameplay began.
    fn started_game(settings: SessionSettings, t0: Instant) -> (Game, Instant) {
        let mut game = cat_game(settings, t0);
        for s in 1..=3 {
            game.on_tick(t0 + Duration::from_secs(s));
        }
        assert_eq!(game.phase(), SessionPhase::Active);
        (game, t0 + Duration::from_secs(3))
    }

    fn type_chord(game: &mut Game, dots: &[u8], now: Instant) {
        for d in dots {
            game.on_key_press(DOT_KEYS[*d as usize - 1]);
        }
        for d in dots.iter().rev() {
            game.on_key_release(DOT_KEYS[*d as usize - 1], now);
        }
    }

    #[test]
    fn test_new_game_starts_in_countdown() {
        let mut game = cat_game(SessionSettings::default(), Instant::now());
        assert_eq!(game.phase(), SessionPhase::Countdown);
        assert_eq!(game.countdown(), 3);
        assert!(game.word().is_none());
        assert_eq!(
            game.drain_effects(),
            vec![
                Effect::PhaseChanged(SessionPhase::Countdown),
                Effect::Cue(Cue::Countdown)
            ]
        );
    }

    #[test]
    fn test_countdown_reaches_active_and_spawns_first_character() {
        let t0 = Instant::now();
        let mut game = cat_game(SessionSettings::default(), t0);
        game.drain_effects();

        game.on_tick(t0 + ms(1000));
        assert_eq!(game.countdown(), 2);
        game.on_tick(t0 + ms(2000));
        assert_eq!(game.countdown(), 1);
        game.on_tick(t0 + ms(3000));

        assert_eq!(game.phase(), SessionPhase::Active);
        assert_eq!(game.word().map(|w| w.text.as_str()), Some("cat"));
        assert_eq!(game.active().len(), 1);
        assert_eq!(game.active()[0].expected_encoding, "14");

        let effects = game.drain_effects();
        assert_eq!(
            effects,
            vec![
                Effect::Cue(Cue::Countdown),
                Effect::Cue(Cue::Countdown),
                Effect::PhaseChanged(SessionPhase::Active),
                Effect::NewWord("cat".into()),
                Effect::SpeakWord("cat".into()),
                Effect::Spawned {
                    index: 0,
                    character: 'c',
                    expected_encoding: "14".into()
                },
                Effect::SpeakCharacter {
                    character: 'c',
                    urgent: true
                },
            ]
        );
    }

    #[test]
    fn test_countdown_tick_outside_countdown_is_ignored() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        game.on_countdown_tick(start);
        assert_eq!(game.phase(), SessionPhase::Active);
        assert_eq!(game.countdown(), 0);
    }

    #[test]
    fn test_input_during_countdown_is_ignored() {
        let t0 = Instant::now();
        let mut game = cat_game(SessionSettings::default(), t0);
        type_chord(&mut game, &[1, 4], t0);
        game.on_chord_resolved("14", t0);

        assert_eq!(*game.score(), PlayerScore::default());
        assert_eq!(game.pending_chord(), "");
    }

    #[test]
    fn test_correct_chord_scores_and_advances() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        game.drain_effects();

        type_chord(&mut game, &[4, 1], start + ms(400));

        assert_eq!(game.score().points, 10);
        assert_eq!(game.score().correct, 1);
        assert_eq!(game.cursor(), 1);
        assert!(game.active()[0].completed);
        assert_eq!(game.highlighted(), &[0]);
        // a match releases the next character right away
        assert_eq!(game.active().len(), 2);
        assert_matches!(
            game.drain_effects().as_slice(),
            [
                Effect::Spawned { index: 1, .. },
                Effect::Cue(Cue::Correct),
                Effect::SpeakCharacter {
                    character: 'a',
                    urgent: false
                }
            ]
        );
    }

    #[test]
    fn test_incorrect_chord_penalises_without_advancing() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        game.drain_effects();

        type_chord(&mut game, &[1], start + ms(200));

        assert_eq!(game.score().points, -10);
        assert_eq!(game.score().incorrect, 1);
        assert_eq!(game.cursor(), 0);
        assert_eq!(game.drain_effects(), vec![Effect::Cue(Cue::Incorrect)]);

        // retrying the same character still works
        type_chord(&mut game, &[1, 4], start + ms(400));
        assert_eq!(game.score().points, 0);
        assert_eq!(game.cursor(), 1);
    }

    #[test]
    fn test_empty_encoding_is_ignored() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        game.on_chord_resolved("", start);
        assert_eq!(*game.score(), PlayerScore::default());
    }

    #[test]
    fn test_completing_word_plays_clear_and_starts_new_word() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);

        type_chord(&mut game, &[1, 4], start + ms(100));
        type_chord(&mut game, &[1], start + ms(200));
        game.drain_effects();
        type_chord(&mut game, &[2, 3, 4, 5], start + ms(300));

        assert_eq!(game.score().correct, 3);
        assert_eq!(game.score().points, 30);
        assert_eq!(game.cursor(), 0);
        assert_eq!(game.active().len(), 1);
        assert!(game.highlighted().is_empty());
        assert_eq!(game.words_started(), 2);

        let effects = game.drain_effects();
        assert_eq!(effects[0], Effect::Cue(Cue::Clear));
        assert_eq!(effects[1], Effect::NewWord("cat".into()));
        assert!(!effects.contains(&Effect::Cue(Cue::Correct)));
    }

    #[test]
    fn test_spawn_waits_for_interval_and_animation() {
        let t0 = Instant::now();
        let settings = SessionSettings {
            spawn_interval_secs: 3,
            ..SessionSettings::default()
        };
        let (mut game, start) = started_game(settings, t0);

        game.on_animation_complete(0);
        for step in 1..30 {
            game.on_tick(start + ms(step * 100));
        }
        assert_eq!(game.active().len(), 1, "spawned before the interval elapsed");

        game.on_tick(start + ms(3000));
        assert_eq!(game.active().len(), 2);
        assert_eq!(game.active()[1].spawned_at, start + ms(3000));
    }

    #[test]
    fn test_spawn_waits_for_animation_signal() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);

        for step in 1..=20 {
            game.on_tick(start + ms(step * 100));
        }
        assert_eq!(game.active().len(), 1);

        game.on_animation_complete(0);
        game.on_tick(start + ms(2100));
        assert_eq!(game.active().len(), 2);
    }

    #[test]
    fn test_at_most_one_spawn_per_tick() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        game.on_animation_complete(0);
        game.on_animation_complete(1);

        game.on_tick(start + ms(1000));
        assert_eq!(game.active().len(), 2);
        game.on_tick(start + ms(1050));
        assert_eq!(game.active().len(), 2);
    }

    #[test]
    fn test_expiry_skips_whole_word_once() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        game.on_animation_complete(0);
        game.on_tick(start + ms(1000));
        game.on_animation_complete(1);
        game.on_tick(start + ms(2000));
        assert_eq!(game.active().len(), 3);
        game.drain_effects();

        // every character is stale by now, the skip still fires once
        game.on_tick(start + Duration::from_secs(9));

        assert_eq!(game.score().skipped, 1);
        assert_eq!(game.score().points, -10);
        assert_eq!(game.active().len(), 1);
        assert!(game.active().iter().all(|c| !c.completed));
        let effects = game.drain_effects();
        assert_eq!(effects[0], Effect::Cue(Cue::Skip));
        assert_eq!(
            effects.iter().filter(|e| **e == Effect::Cue(Cue::Skip)).count(),
            1
        );
    }

    #[test]
    fn test_expiry_discards_partial_chord() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        game.on_key_press('f');
        game.on_tick(start + TIME_TO_LIVE);
        assert_eq!(game.score().skipped, 1);
        assert_eq!(game.pending_chord(), "");

        game.on_key_release('f', start + TIME_TO_LIVE + ms(10));
        assert_eq!(game.score().incorrect, 0);
    }

    #[test]
    fn test_cat_scenario() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);

        type_chord(&mut game, &[1, 4], start + ms(500));
        assert_eq!(game.score().points, 10);
        assert_eq!(game.cursor(), 1);

        type_chord(&mut game, &[1], start + ms(900));
        assert_eq!(game.score().points, 20);
        assert_eq!(game.score().correct, 2);
        let third_spawn = game.active()[2].spawned_at;

        let mut now = start + ms(1000);
        while game.score().skipped == 0 {
            game.on_tick(now);
            now += ms(100);
        }
        assert!(now - ms(100) >= third_spawn + TIME_TO_LIVE);
        assert_eq!(game.score().points, 10);
        assert_eq!(game.score().skipped, 1);
        assert_eq!(game.cursor(), 0);
    }

    #[test]
    fn test_time_limit_disabled_by_default() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        let mut now = start;
        for _ in 0..200 {
            now += ms(1000);
            game.on_tick(now);
        }
        assert_eq!(game.phase(), SessionPhase::Active);
        assert_eq!(game.seconds_remaining(), 60);
    }

    #[test]
    fn test_time_limit_ends_session() {
        let t0 = Instant::now();
        let settings = SessionSettings {
            time_limit: true,
            ..SessionSettings::default()
        };
        let (mut game, start) = started_game(settings, t0);

        let mut now = start;
        while game.phase() == SessionPhase::Active {
            now += ms(100);
            game.on_tick(now);
            if now > start + Duration::from_secs(120) {
                panic!("session never ended");
            }
        }
        assert_eq!(game.phase(), SessionPhase::Over);
        assert_eq!(game.seconds_remaining(), 0);
        assert!(!game.is_running());
    }

    #[test]
    fn test_restart_resets_score_and_countdown() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        type_chord(&mut game, &[1, 4], start);
        type_chord(&mut game, &[6], start);
        game.on_expiry(start);
        game.on_time_budget_exhausted();
        assert_eq!(game.phase(), SessionPhase::Over);

        let settings = SessionSettings {
            spawn_interval_secs: 5,
            ..SessionSettings::default()
        };
        game.restart(settings.clone(), start + ms(10)).unwrap();

        assert_eq!(game.phase(), SessionPhase::Countdown);
        assert_eq!(game.countdown(), 3);
        assert_eq!(*game.score(), PlayerScore::default());
        assert_eq!(game.settings(), &settings);
        assert!(game.active().is_empty());
    }

    #[test]
    fn test_restart_outside_over_is_ignored() {
        let t0 = Instant::now();
        let (mut game, start) = started_game(SessionSettings::default(), t0);
        type_chord(&mut game, &[1, 4], start);
        game.restart(SessionSettings::default(), start).unwrap();
        assert_eq!(game.phase(), SessionPhase::Active);
        assert_eq!(game.score().points, 10);
    }

    #[test]
    fn test_teardown_cancels_ticks() {
        let t0 = Instant::now();
        let mut game = cat_game(SessionSettings::default(), t0);
        game.teardown();
        assert!(!game.is_running());

        for s in 1..=5 {
            game.on_tick(t0 + Duration::from_secs(s));
        }
        assert_eq!(game.phase(), SessionPhase::Countdown);
        assert_eq!(game.countdown(), 3);
    }

    #[test]
    fn test_animation_complete_outside_active_is_ignored() {
        let t0 = Instant::now();
        let mut game = cat_game(SessionSettings::default(), t0);
        game.on_animation_complete(0);
        game.drain_effects();
        assert!(game.drain_effects().is_empty());
    }
}
