//! Static six-dot braille symbol table.
//!
//! Encodings are the canonical ascending-digit strings used everywhere in
//! the engine, e.g. `"125"` for dots 1, 2 and 5 (the letter `h`).

/// First code point of the Unicode braille patterns block.
const BRAILLE_BASE: u32 = 0x2800;

/// Single-cell grade-1 alphabet.
const ALPHABET: [(char, &str); 26] = [
    ('a', "1"),
    ('b', "12"),
    ('c', "14"),
    ('d', "145"),
    ('e', "15"),
    ('f', "124"),
    ('g', "1245"),
    ('h', "125"),
    ('i', "24"),
    ('j', "245"),
    ('k', "13"),
    ('l', "123"),
    ('m', "134"),
    ('n', "1345"),
    ('o', "135"),
    ('p', "1234"),
    ('q', "12345"),
    ('r', "1235"),
    ('s', "234"),
    ('t', "2345"),
    ('u', "136"),
    ('v', "1236"),
    ('w', "2456"),
    ('x', "1346"),
    ('y', "13456"),
    ('z', "1356"),
];

/// Digits share the cells of `a`..`j`; the numeric indicator is not part of
/// the single-cell keystroke.
const DIGITS: [(char, &str); 10] = [
    ('1', "1"),
    ('2', "12"),
    ('3', "14"),
    ('4', "145"),
    ('5', "15"),
    ('6', "124"),
    ('7', "1245"),
    ('8', "125"),
    ('9', "24"),
    ('0', "245"),
];

/// Look up the canonical chord encoding for a character.
pub fn lookup(c: char) -> Option<&'static str> {
    ALPHABET
        .iter()
        .chain(DIGITS.iter())
        .find(|(ch, _)| *ch == c)
        .map(|(_, encoding)| *encoding)
}

/// Render an encoding as its Unicode braille cell. Unknown digits are
/// ignored, so an empty or invalid encoding renders as the blank cell.
pub fn glyph(encoding: &str) -> char {
    let bits = encoding
        .chars()
        .filter_map(|d| d.to_digit(10))
        .filter(|d| (1..=6).contains(d))
        .fold(0u32, |acc, d| acc | 1 << (d - 1));

    char::from_u32(BRAILLE_BASE + bits).unwrap_or(' ')
}

/// Braille rendering of a whole word, one cell per character.
pub fn glyphs(word: &str) -> String {
    word.chars()
        .map(|c| lookup(c).map_or(' ', glyph))
        .collect()
}

/// Whether the encoding contains the given dot (1-based).
pub fn has_dot(encoding: &str, dot: u8) -> bool {
    encoding.bytes().any(|b| b == b'0' + dot)
}
