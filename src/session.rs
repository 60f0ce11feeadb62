/// Points awarded for a correct chord and deducted for a miss or a skip.
pub const POINTS_PER_EVENT: i64 = 10;

/// Counter value a session starts its countdown from.
pub const COUNTDOWN_START: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionPhase {
    Countdown,
    Active,
    Over,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerScore {
    pub points: i64,
    pub skipped: u32,
    pub correct: u32,
    pub incorrect: u32,
}

impl PlayerScore {
    pub fn record_correct(&mut self) {
        self.points += POINTS_PER_EVENT;
        self.correct += 1;
    }

    pub fn record_incorrect(&mut self) {
        self.points -= POINTS_PER_EVENT;
        self.incorrect += 1;
    }

    pub fn record_skip(&mut self) {
        self.points -= POINTS_PER_EVENT;
        self.skipped += 1;
    }

    /// Share of resolved chords that matched, in percent.
    pub fn accuracy(&self) -> Option<f64> {
        crate::util::accuracy(self.correct, self.incorrect)
    }
}

/// One character of the current word and the chord that produces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterEntry {
    pub character: char,
    pub expected_encoding: String,
}

/// A target word decomposed into its characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub text: String,
    pub entries: Vec<CharacterEntry>,
}

impl Word {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, idx: usize) -> Option<&CharacterEntry> {
        self.entries.get(idx)
    }
}
