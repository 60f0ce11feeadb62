use crate::braille;
use crate::config::PracticeTopic;
use crate::session::{CharacterEntry, Word};
use include_dir::{include_dir, Dir};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::fmt;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

/// Length range of the digit strings drawn for the number topic.
const DIGIT_WORD_LEN: std::ops::RangeInclusive<usize> = 2..=5;

/// A word list whose characters cannot all be typed is a configuration
/// fault, reported when the list is loaded rather than mid-game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordListError {
    MissingFile(String),
    Malformed(String),
    Empty,
    UnknownCharacter { word: String, character: char },
}

impl fmt::Display for WordListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordListError::MissingFile(name) => write!(f, "word list {name} not found"),
            WordListError::Malformed(reason) => write!(f, "word list is malformed: {reason}"),
            WordListError::Empty => write!(f, "word list is empty"),
            WordListError::UnknownCharacter { word, character } => write!(
                f,
                "character {character:?} in word {word:?} has no braille encoding"
            ),
        }
    }
}

impl std::error::Error for WordListError {}

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordList {
    /// Load one of the embedded word lists by file stem.
    pub fn embedded(name: &str) -> Result<Self, WordListError> {
        let file_name = format!("{name}.json");
        let file = WORDS_DIR
            .get_file(&file_name)
            .ok_or_else(|| WordListError::MissingFile(file_name.clone()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| WordListError::Malformed(format!("{file_name} is not utf-8")))?;

        serde_json::from_str(contents).map_err(|e| WordListError::Malformed(e.to_string()))
    }

    /// Decompose every word, failing on the first character the symbol table
    /// does not cover.
    pub fn validate(&self) -> Result<Vec<Word>, WordListError> {
        if self.words.is_empty() {
            return Err(WordListError::Empty);
        }
        self.words.iter().map(|w| decompose(w)).collect()
    }
}

/// Split a word into its characters and their expected chords.
pub fn decompose(text: &str) -> Result<Word, WordListError> {
    if text.is_empty() {
        return Err(WordListError::Malformed("empty word".to_string()));
    }

    let entries = text
        .chars()
        .map(|character| {
            braille::lookup(character)
                .map(|encoding| CharacterEntry {
                    character,
                    expected_encoding: encoding.to_string(),
                })
                .ok_or_else(|| WordListError::UnknownCharacter {
                    word: text.to_string(),
                    character,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Word {
        text: text.to_string(),
        entries,
    })
}

#[derive(Debug, Clone)]
enum WordSource {
    Words(Vec<Word>),
    Digits(Vec<CharacterEntry>),
}

/// Picks target words uniformly at random. All words are decomposed up front,
/// so drawing a word cannot fail.
#[derive(Debug, Clone)]
pub struct Sequencer {
    source: WordSource,
    rng: StdRng,
}

impl Sequencer {
    pub fn for_topic(topic: PracticeTopic) -> Result<Self, WordListError> {
        match topic {
            PracticeTopic::Alphabet => Self::from_word_list(&WordList::embedded("english")?),
            PracticeTopic::Number => Self::digits(),
            other => {
                warn!("topic {other} needs multi-cell indicators, practising the alphabet instead");
                Self::from_word_list(&WordList::embedded("english")?)
            }
        }
    }

    pub fn from_word_list(list: &WordList) -> Result<Self, WordListError> {
        let words = list.validate()?;
        debug!("loaded word list {} with {} words", list.name, words.len());
        Ok(Self {
            source: WordSource::Words(words),
            rng: StdRng::from_entropy(),
        })
    }

    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Result<Self, WordListError> {
        let list = WordList {
            name: "custom".to_string(),
            size: words.len() as u32,
            words: words.iter().map(|w| w.as_ref().to_string()).collect(),
        };
        Self::from_word_list(&list)
    }

    pub fn digits() -> Result<Self, WordListError> {
        let digits = ('0'..='9')
            .map(|c| decompose(&c.to_string()))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flat_map(|w| w.entries)
            .collect();
        Ok(Self {
            source: WordSource::Digits(digits),
            rng: StdRng::from_entropy(),
        })
    }

    /// Reseed for reproducible draws.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn generate_new_word(&mut self) -> Word {
        match &self.source {
            WordSource::Words(words) => words[self.rng.gen_range(0..words.len())].clone(),
            WordSource::Digits(digits) => {
                let len = self.rng.gen_range(DIGIT_WORD_LEN);
                let entries: Vec<CharacterEntry> = (0..len)
                    .map(|_| digits[self.rng.gen_range(0..digits.len())].clone())
                    .collect();
                Word {
                    text: entries.iter().map(|e| e.character).collect(),
                    entries,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_english_list_is_valid() {
        let list = WordList::embedded("english").unwrap();
        assert_eq!(list.name, "english");
        assert_eq!(list.size as usize, list.words.len());
        assert!(list.validate().is_ok());
    }

    #[test]
    fn test_missing_embedded_list() {
        assert_eq!(
            WordList::embedded("klingon").unwrap_err(),
            WordListError::MissingFile("klingon.json".to_string())
        );
    }

    #[test]
    fn test_decompose_cat() {
        let word = decompose("cat").unwrap();
        let encodings: Vec<&str> = word
            .entries
            .iter()
            .map(|e| e.expected_encoding.as_str())
            .collect();
        assert_eq!(encodings, vec!["14", "1", "2345"]);
        assert_eq!(word.entries[0].character, 'c');
    }

    #[test]
    fn test_unknown_character_is_rejected() {
        let err = Sequencer::from_words(&["cat", "Dog"]).unwrap_err();
        assert_eq!(
            err,
            WordListError::UnknownCharacter {
                word: "Dog".to_string(),
                character: 'D'
            }
        );
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let words: [&str; 0] = [];
        assert_eq!(Sequencer::from_words(&words).unwrap_err(), WordListError::Empty);
    }

    #[test]
    fn test_single_word_list_always_draws_it() {
        let mut sequencer = Sequencer::from_words(&["cat"]).unwrap();
        for _ in 0..5 {
            assert_eq!(sequencer.generate_new_word().text, "cat");
        }
    }

    #[test]
    fn test_draws_come_from_list() {
        let words = ["sun", "moon", "star"];
        let mut sequencer = Sequencer::from_words(&words).unwrap().with_seed(7);
        for _ in 0..20 {
            let word = sequencer.generate_new_word();
            assert!(words.contains(&word.text.as_str()));
            assert_eq!(word.len(), word.text.chars().count());
        }
    }

    #[test]
    fn test_digit_words() {
        let mut sequencer = Sequencer::digits().unwrap().with_seed(3);
        for _ in 0..20 {
            let word = sequencer.generate_new_word();
            assert!(DIGIT_WORD_LEN.contains(&word.len()));
            assert!(word.text.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_capital_topics_fall_back_to_alphabet() {
        let mut sequencer = Sequencer::for_topic(PracticeTopic::CapitalWord).unwrap();
        let word = sequencer.generate_new_word();
        assert!(word.text.chars().all(|c| c.is_ascii_lowercase()));
    }
}
