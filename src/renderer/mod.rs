pub mod cell;
pub mod display;

pub use display::DisplayManager;

use anyhow::Result;
use crossterm::event::KeyEvent;

use crate::drawing::canvas::{Canvas, Cell};

/// Terminal I/O as seen by an editing session.
pub trait Terminal {
    /// Viewport in character columns and rows.
    fn size(&self) -> Result<(u16, u16)>;

    /// Blocks until the next key press.
    fn next_key(&mut self) -> Result<KeyEvent>;

    fn draw_canvas(&mut self, canvas: &Canvas) -> Result<()>;

    fn draw_cell(&mut self, x: u16, y: u16, cell: Cell) -> Result<()>;

    fn draw_status(&mut self, row: u16, text: &str) -> Result<()>;

    fn set_cursor(&mut self, x: u16, y: u16) -> Result<()>;
}
