use anyhow::Result;
use crossterm::{
    cursor,
    event::{self, Event, KeyEvent, KeyEventKind},
    style::{Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand, QueueableCommand,
};
use std::io::{Stdout, Write};
use tracing::debug;

use super::cell::CellData;
use super::Terminal;
use crate::drawing::canvas::{Canvas, Cell};

/// Converts a size reported in pixels into columns/rows when the
/// `CHAR_WIDTH`/`CHAR_HEIGHT` cell size is known and the report is
/// implausibly large for a character grid.
pub fn normalize_terminal_size(
    raw_cols: u16,
    raw_rows: u16,
    char_width: Option<u16>,
    char_height: Option<u16>,
) -> (u16, u16) {
    if let (Some(cw), Some(ch)) = (char_width, char_height) {
        if cw > 0 && ch > 0 && raw_cols >= cw.saturating_mul(32) && raw_rows >= ch.saturating_mul(16) {
            return ((raw_cols / cw).max(1), (raw_rows / ch).max(1));
        }
    }
    (raw_cols, raw_rows)
}

/// Return terminal size in character columns and rows, converting from pixels when needed.
pub fn terminal_size_chars() -> Result<(u16, u16)> {
    let (raw_cols, raw_rows) = terminal::size()?;
    let env_u16 = |key: &str| std::env::var(key).ok().and_then(|v| v.parse::<u16>().ok());
    Ok(normalize_terminal_size(
        raw_cols,
        raw_rows,
        env_u16("CHAR_WIDTH"),
        env_u16("CHAR_HEIGHT"),
    ))
}

/// Writes a canvas as plain colored lines, for non-interactive output.
pub fn print_canvas<W: Write>(out: &mut W, canvas: &Canvas) -> Result<()> {
    let width = usize::from(canvas.width());
    for row in canvas.cells().chunks(width) {
        let mut last_fg = None;
        for cell in row {
            let data = CellData::from(*cell);
            if !cell.is_blank() && Some(data.fg) != last_fg {
                out.queue(SetForegroundColor(data.fg))?;
                last_fg = Some(data.fg);
            }
            out.queue(Print(data.char))?;
        }
        out.queue(ResetColor)?;
        out.queue(Print("\n"))?;
    }
    out.flush()?;
    Ok(())
}

/// Raw-mode, alternate-screen terminal. Restores the terminal on drop.
pub struct DisplayManager {
    stdout: Stdout,
    last_cells: Option<Vec<CellData>>,
    last_width: usize,
}

impl DisplayManager {
    pub fn new() -> Result<Self> {
        let mut stdout = std::io::stdout();
        terminal::enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        // Prevent scrolling when the last column is written
        stdout.execute(DisableLineWrap)?;
        stdout.execute(terminal::Clear(ClearType::All))?;
        stdout.execute(cursor::Show)?;

        Ok(Self {
            stdout,
            last_cells: None,
            last_width: 0,
        })
    }

    // Diffing renderer: only cells that changed since the last frame are written.
    fn render_diff(&mut self, canvas: &Canvas) -> Result<()> {
        let width = usize::from(canvas.width());
        let cells = canvas.cells();

        let mut force_redraw = false;
        if self.last_width != width || self.last_cells.as_ref().map_or(0, Vec::len) != cells.len() {
            self.stdout.queue(terminal::Clear(ClearType::All))?;
            self.last_cells = Some(vec![CellData::default(); cells.len()]);
            self.last_width = width;
            force_redraw = true;
        }

        let last_cells = match &mut self.last_cells {
            Some(v) => v,
            None => return Ok(()),
        };

        let mut last_fg = None;
        // Track virtual cursor position to minimize MoveTo commands
        let mut cursor_x: i32 = -1;
        let mut cursor_y: i32 = -1;
        let mut written = 0usize;

        for (i, cell) in cells.iter().enumerate() {
            let data = CellData::from(*cell);
            if !force_redraw && data == last_cells[i] {
                cursor_x = -1;
                continue;
            }
            if force_redraw && cell.is_blank() {
                // Screen was just cleared
                last_cells[i] = data;
                cursor_x = -1;
                continue;
            }

            let x = (i % width) as i32;
            let y = (i / width) as i32;
            if cursor_x != x || cursor_y != y {
                self.stdout.queue(cursor::MoveTo(x as u16, y as u16))?;
                cursor_y = y;
            }
            if Some(data.fg) != last_fg {
                self.stdout.queue(SetForegroundColor(data.fg))?;
                last_fg = Some(data.fg);
            }
            self.stdout.queue(Print(data.char))?;

            last_cells[i] = data;
            cursor_x = x + 1;
            written += 1;
        }

        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        debug!(written, force_redraw, "canvas rendered");
        Ok(())
    }
}

impl Terminal for DisplayManager {
    fn size(&self) -> Result<(u16, u16)> {
        terminal_size_chars()
    }

    fn next_key(&mut self) -> Result<KeyEvent> {
        loop {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(key);
                }
            }
        }
    }

    fn draw_canvas(&mut self, canvas: &Canvas) -> Result<()> {
        self.render_diff(canvas)
    }

    fn draw_cell(&mut self, x: u16, y: u16, cell: Cell) -> Result<()> {
        let data = CellData::from(cell);
        self.stdout
            .queue(cursor::MoveTo(x, y))?
            .queue(SetForegroundColor(data.fg))?
            .queue(Print(data.char))?
            .queue(ResetColor)?;
        self.stdout.flush()?;

        let idx = usize::from(y) * self.last_width + usize::from(x);
        if let Some(slot) = self.last_cells.as_mut().and_then(|v| v.get_mut(idx)) {
            *slot = data;
        }
        Ok(())
    }

    fn draw_status(&mut self, row: u16, text: &str) -> Result<()> {
        self.stdout
            .queue(cursor::MoveTo(0, row))?
            .queue(ResetColor)?
            .queue(terminal::Clear(ClearType::CurrentLine))?
            .queue(Print(text))?;
        self.stdout.flush()?;
        Ok(())
    }

    fn set_cursor(&mut self, x: u16, y: u16) -> Result<()> {
        self.stdout.execute(cursor::MoveTo(x, y))?;
        Ok(())
    }
}

impl Drop for DisplayManager {
    fn drop(&mut self) {
        let _ = self.stdout.execute(ResetColor);
        let _ = self.stdout.execute(EnableLineWrap);
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::palette::Color;

    #[test]
    fn test_normalize_keeps_character_sizes() {
        assert_eq!(normalize_terminal_size(80, 24, None, None), (80, 24));
        assert_eq!(normalize_terminal_size(80, 24, Some(10), Some(20)), (80, 24));
    }

    #[test]
    fn test_normalize_converts_pixels() {
        assert_eq!(normalize_terminal_size(1600, 960, Some(10), Some(20)), (160, 48));
        assert_eq!(normalize_terminal_size(1600, 960, Some(0), Some(20)), (1600, 960));
    }

    #[test]
    fn test_print_canvas_emits_one_line_per_row() {
        let mut canvas = Canvas::create_blank(3, 2).unwrap();
        canvas.paint(1, 0, '█', Color::Red).unwrap();
        canvas.paint(2, 1, '░', Color::Blue).unwrap();

        let mut out = Vec::new();
        print_canvas(&mut out, &canvas).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.matches('\n').count(), 2);
        assert!(text.contains('█'));
        assert!(text.contains('░'));
        let first_line = text.lines().next().unwrap();
        assert!(first_line.starts_with(' '));
    }
}
