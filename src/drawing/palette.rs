use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::DrawError;

/// Glyph that marks an unpainted cell.
pub const BLANK: char = ' ';

/// Closed color set a drawing can use.
///
/// The symbolic name (`Display`/`FromStr`) is what gets persisted. Mapping to
/// real terminal attributes happens in the renderer only.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Black,
    Red,
    Green,
    Blue,
    Gray,
}

impl Color {
    pub const ALL: [Color; 5] = [Color::Black, Color::Red, Color::Green, Color::Blue, Color::Gray];

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Blue => "Blue",
            Color::Gray => "Gray",
        }
    }

    /// Paint color bound to a number hot-key (`1`..`4`).
    pub fn from_hotkey(key: char) -> Option<Self> {
        match key {
            '1' => Some(Color::Red),
            '2' => Some(Color::Green),
            '3' => Some(Color::Blue),
            '4' => Some(Color::Gray),
            _ => None,
        }
    }

    /// Case-insensitive lookup, for names typed by a user.
    pub fn parse_loose(name: &str) -> Result<Self, DrawError> {
        let trimmed = name.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DrawError::InvalidColor(name.to_string()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strict parse used when decoding persisted records.
impl FromStr for Color {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| DrawError::InvalidColor(s.to_string()))
    }
}

/// Shading tools available while painting.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Brush {
    #[default]
    Solid,
    Dark,
    Medium,
    Light,
}

impl Brush {
    pub fn glyph(self) -> char {
        match self {
            Brush::Solid => '█',
            Brush::Dark => '▓',
            Brush::Medium => '▒',
            Brush::Light => '░',
        }
    }

    pub fn from_hotkey(key: char) -> Option<Self> {
        match key {
            '5' => Some(Brush::Dark),
            '6' => Some(Brush::Medium),
            '7' => Some(Brush::Light),
            '8' => Some(Brush::Solid),
            _ => None,
        }
    }
}
