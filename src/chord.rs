//! Chorded input: six dot keys held together form one braille cell.

use itertools::Itertools;
use std::collections::HashSet;

/// Number of dots in a braille cell.
pub const DOTS: usize = 6;

/// Perkins layout on a QWERTY home row, indexed by dot - 1.
pub const DOT_KEYS: [char; DOTS] = ['f', 'd', 's', 'j', 'k', 'l'];

/// One of the six physical dot keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DotKey {
    key: char,
    dot: u8,
}

impl DotKey {
    /// Map a physical key to its dot. Anything outside the six dot keys is `None`.
    pub fn from_key(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        DOT_KEYS
            .iter()
            .position(|k| *k == key)
            .map(|idx| Self {
                key,
                dot: idx as u8 + 1,
            })
    }

    pub fn key(&self) -> char {
        self.key
    }

    /// 1-based dot number.
    pub fn dot(&self) -> u8 {
        self.dot
    }
}

/// Keys currently held plus the per-dot register for the chord in progress.
///
/// The register is a fixed slot array indexed by dot, so the encoding comes
/// out in ascending dot order no matter how the keys were pressed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChordState {
    held: HashSet<char>,
    register: [Option<u8>; DOTS],
}

impl ChordState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key-down. Returns false when the key is not a dot key, in
    /// which case nothing changes.
    pub fn press(&mut self, key: char) -> bool {
        let Some(dot_key) = DotKey::from_key(key) else {
            return false;
        };

        self.held.insert(dot_key.key());
        self.register[dot_key.dot() as usize - 1] = Some(dot_key.dot());
        true
    }

    /// Register a key-up. When the last held dot key is released the chord
    /// is complete: its encoding is returned and the register is cleared.
    pub fn release(&mut self, key: char) -> Option<String> {
        let dot_key = DotKey::from_key(key)?;

        if !self.held.remove(&dot_key.key()) || !self.held.is_empty() {
            return None;
        }

        self.take_encoding()
    }

    /// Release every held key at once, as if all of them went up together.
    pub fn release_all(&mut self) -> Option<String> {
        self.held.clear();
        self.take_encoding()
    }

    pub fn clear(&mut self) {
        self.held.clear();
        self.register = [None; DOTS];
    }

    pub fn is_idle(&self) -> bool {
        self.held.is_empty() && self.register.iter().all(Option::is_none)
    }

    /// Encoding of the dots registered so far, for display while a chord is
    /// being held.
    pub fn pending_encoding(&self) -> String {
        encode(&self.register)
    }

    fn take_encoding(&mut self) -> Option<String> {
        let encoding = encode(&self.register);
        self.register = [None; DOTS];

        if encoding.is_empty() {
            None
        } else {
            Some(encoding)
        }
    }
}

/// Concatenate the registered dot labels in register order.
pub fn encode(register: &[Option<u8>; DOTS]) -> String {
    register.iter().flatten().join("")
}

/// Exact comparison of a resolved chord against the expected encoding.
pub fn matches(encoding: &str, expected: &str) -> bool {
    encoding == expected
}
