use std::fmt::{Display, Formatter, Result as FmtResult};

/// Fixed letter → hex palette for `§X...§` color tags.
const PALETTE: &[(char, &str)] = &[
    ('A', "#808080"),
    ('B', "#0000FF"),
    ('C', "#00FFFF"),
    ('G', "#00FF00"),
    ('K', "#000000"),
    ('M', "#FF00FF"),
    ('O', "#FFA500"),
    ('P', "#800080"),
    ('R', "#FF0000"),
    ('W', "#FFFFFF"),
    ('Y', "#FFFF00"),
];

/// Looks up the hex color for a palette letter.
pub fn palette_hex(letter: char) -> Option<&'static str> {
    PALETTE
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, hex)| *hex)
}

/// A color code as written after `§`: a palette letter or `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorCode<'a> {
    Letter(char),
    Hex(&'a str),
}

impl<'a> ColorCode<'a> {
    /// Reads a color code from the start of `text`, returning the code and its
    /// length in bytes.
    pub fn read(text: &'a str) -> Option<(ColorCode<'a>, usize)> {
        let first = text.chars().next()?;
        if first == '#' {
            let digits = text.get(1..7)?;
            if digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return Some((ColorCode::Hex(&text[..7]), 7));
            }
            return None;
        }
        palette_hex(first).map(|_| (ColorCode::Letter(first), first.len_utf8()))
    }

    /// Parses a complete color code (metadata of a color token).
    pub fn parse(text: &'a str) -> Option<ColorCode<'a>> {
        match ColorCode::read(text) {
            Some((code, len)) if len == text.len() => Some(code),
            _ => None,
        }
    }

    /// The markup value for `<color=...>`.
    pub fn hex(&self) -> &'a str {
        match self {
            // Letters only construct through the palette.
            ColorCode::Letter(letter) => palette_hex(*letter).unwrap_or("#FFFFFF"),
            ColorCode::Hex(hex) => hex,
        }
    }
}

impl Display for ColorCode<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.hex())
    }
}
