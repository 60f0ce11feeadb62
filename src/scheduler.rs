use crate::session::{CharacterEntry, Word};
use log::debug;
use std::time::{Duration, Instant};

/// How long an active character may stay unmatched before the word is skipped.
pub const TIME_TO_LIVE: Duration = Duration::from_millis(6000);

/// A character that has been released onto the screen and can be typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCharacter {
    pub index: usize,
    pub character: char,
    pub expected_encoding: String,
    pub spawned_at: Instant,
    pub time_to_live: Duration,
    pub completed: bool,
}

impl ActiveCharacter {
    pub fn new(index: usize, entry: &CharacterEntry, now: Instant) -> Self {
        Self {
            index,
            character: entry.character,
            expected_encoding: entry.expected_encoding.clone(),
            spawned_at: now,
            time_to_live: TIME_TO_LIVE,
            completed: false,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.spawned_at)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        !self.completed && self.age(now) >= self.time_to_live
    }

    /// Time left before expiry, zero once completed or expired.
    pub fn remaining(&self, now: Instant) -> Duration {
        if self.completed {
            Duration::ZERO
        } else {
            self.time_to_live.saturating_sub(self.age(now))
        }
    }

    pub fn complete(&mut self) {
        self.completed = true;
    }
}

/// Decides when the next character of the word becomes active.
///
/// A character is released only after the previous one finished its entry
/// animation and the configured interval has passed since it spawned.
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    interval: Duration,
    animation_done: Vec<bool>,
}

impl SpawnScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            animation_done: Vec::new(),
        }
    }

    /// Forget animation state for a fresh word.
    pub fn reset(&mut self, word_len: usize) {
        self.animation_done = vec![false; word_len];
    }

    /// Record the renderer's animation-complete signal. Returns false for
    /// indices outside the current word or already reported.
    pub fn mark_animation_complete(&mut self, index: usize) -> bool {
        match self.animation_done.get_mut(index) {
            Some(done) if !*done => {
                *done = true;
                true
            }
            _ => false,
        }
    }

    pub fn animation_complete(&self, index: usize) -> bool {
        self.animation_done.get(index).copied().unwrap_or(false)
    }

    /// Index to activate on this poll, if any. Activation is strictly
    /// sequential, so the only candidate is `active.len()`.
    pub fn next_spawn(&self, word: &Word, active: &[ActiveCharacter], now: Instant) -> Option<usize> {
        let Some(last) = active.last() else {
            return (!word.is_empty()).then_some(0);
        };

        let next = active.len();
        if next >= word.len() || last.completed {
            return None;
        }

        if !self.animation_complete(last.index) {
            return None;
        }

        if last.age(now) < self.interval {
            return None;
        }

        debug!("releasing character {next} of {:?}", word.text);
        Some(next)
    }
}
