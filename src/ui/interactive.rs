//! The painting session: key events in, canvas mutations out.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

use crate::drawing::canvas::Canvas;
use crate::drawing::palette::{Brush, Color};
use crate::renderer::Terminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Move(Direction),
    SelectColor(Color),
    SelectBrush(Brush),
    Paint,
    Erase,
    /// End the session and offer to save.
    Finish,
    /// End the session without saving.
    Abort,
}

pub fn map_key(key: KeyEvent) -> Option<EditorAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(EditorAction::Abort),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(EditorAction::Move(Direction::Up)),
        KeyCode::Down | KeyCode::Char('j') => Some(EditorAction::Move(Direction::Down)),
        KeyCode::Left | KeyCode::Char('h') => Some(EditorAction::Move(Direction::Left)),
        KeyCode::Right | KeyCode::Char('l') => Some(EditorAction::Move(Direction::Right)),
        KeyCode::Char(' ') => Some(EditorAction::Paint),
        KeyCode::Char('x') | KeyCode::Delete | KeyCode::Backspace => Some(EditorAction::Erase),
        KeyCode::Esc | KeyCode::Char('q') => Some(EditorAction::Finish),
        KeyCode::Char(c) => Color::from_hotkey(c)
            .map(EditorAction::SelectColor)
            .or_else(|| Brush::from_hotkey(c).map(EditorAction::SelectBrush)),
        _ => None,
    }
}

/// What the terminal needs to do after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The cell at `(x, y)` changed.
    Redraw(u16, u16),
    /// Active color or brush changed.
    Status,
    Done { save: bool },
}

/// Owns the canvas for the length of one editing session.
pub struct EditorSession {
    canvas: Canvas,
    cursor: (u16, u16),
    color: Color,
    brush: Brush,
}

impl EditorSession {
    pub fn new(canvas: Canvas, color: Color, brush: Brush) -> Self {
        Self {
            canvas,
            cursor: (0, 0),
            color,
            brush,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn cursor(&self) -> (u16, u16) {
        self.cursor
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    pub fn status_line(&self) -> String {
        format!(
            "color: {}, brush: {}   [arrows] move  [1-4] color  [5-8] brush  [space] paint  [x] erase  [esc] done",
            self.color,
            self.brush.glyph()
        )
    }

    pub fn apply(&mut self, action: EditorAction) -> Step {
        let (x, y) = self.cursor;
        match action {
            // Cursor never leaves the canvas, so paint below cannot go out of bounds.
            EditorAction::Move(dir) => {
                self.cursor = match dir {
                    Direction::Up => (x, y.saturating_sub(1)),
                    Direction::Down => (x, (y + 1).min(self.canvas.height() - 1)),
                    Direction::Left => (x.saturating_sub(1), y),
                    Direction::Right => ((x + 1).min(self.canvas.width() - 1), y),
                };
                Step::Continue
            }
            EditorAction::SelectColor(color) => {
                self.color = color;
                Step::Status
            }
            EditorAction::SelectBrush(brush) => {
                self.brush = brush;
                Step::Status
            }
            EditorAction::Paint => match self.canvas.paint(x, y, self.brush.glyph(), self.color) {
                Ok(()) => Step::Redraw(x, y),
                Err(e) => {
                    warn!(error = %e, "paint rejected");
                    Step::Continue
                }
            },
            EditorAction::Erase => match self.canvas.erase(x, y) {
                Ok(()) => Step::Redraw(x, y),
                Err(e) => {
                    warn!(error = %e, "erase rejected");
                    Step::Continue
                }
            },
            EditorAction::Finish => Step::Done { save: true },
            EditorAction::Abort => Step::Done { save: false },
        }
    }
}

/// How a session ended.
pub struct SessionEnd {
    pub canvas: Canvas,
    pub save_requested: bool,
}

/// Runs the key loop until the user finishes or aborts.
pub fn run_session<T: Terminal>(term: &mut T, mut session: EditorSession) -> Result<SessionEnd> {
    let (_, rows) = term.size()?;
    let status_row = rows.saturating_sub(1);

    term.draw_canvas(session.canvas())?;
    term.draw_status(status_row, &session.status_line())?;

    loop {
        let (cx, cy) = session.cursor();
        term.set_cursor(cx, cy)?;

        let key = term.next_key()?;
        let Some(action) = map_key(key) else {
            continue;
        };
        debug!(?action, cursor = ?session.cursor(), "editor action");

        match session.apply(action) {
            Step::Continue => {}
            Step::Redraw(x, y) => {
                let cell = session.canvas().get(x, y)?;
                term.draw_cell(x, y, cell)?;
            }
            Step::Status => term.draw_status(status_row, &session.status_line())?,
            Step::Done { save } => {
                return Ok(SessionEnd {
                    canvas: session.into_canvas(),
                    save_requested: save,
                });
            }
        }
    }
}
