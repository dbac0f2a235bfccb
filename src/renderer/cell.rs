use crossterm::style;

use crate::drawing::canvas::Cell;
use crate::drawing::palette::Color;

/// Palette color as a terminal attribute. The only place the palette meets
/// crossterm.
pub fn terminal_color(color: Color) -> style::Color {
    match color {
        Color::Black => style::Color::Black,
        Color::Red => style::Color::Red,
        Color::Green => style::Color::Green,
        Color::Blue => style::Color::Blue,
        Color::Gray => style::Color::Grey,
    }
}

/// Represents a single character cell on the terminal
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CellData {
    pub char: char,
    pub fg: style::Color,
}

impl Default for CellData {
    fn default() -> Self {
        Self {
            char: ' ',
            fg: style::Color::Black,
        }
    }
}

impl From<Cell> for CellData {
    fn from(cell: Cell) -> Self {
        Self {
            char: cell.glyph,
            fg: terminal_color(cell.color),
        }
    }
}
