use super::error::{DrawError, DrawResult};
use super::palette::{Color, BLANK};

/// Paint state of a single grid position.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub glyph: char,
    pub color: Color,
}

impl Cell {
    pub fn new(glyph: char, color: Color) -> Self {
        Self { glyph, color }
    }

    pub fn is_blank(&self) -> bool {
        self.glyph == BLANK
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            glyph: BLANK,
            color: Color::Black,
        }
    }
}

/// Dense editing surface. Every position in `[0, width) x [0, height)` holds
/// exactly one cell; dimensions never change after creation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Canvas {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn create_blank(width: u16, height: u16) -> DrawResult<Self> {
        if width == 0 || height == 0 {
            return Err(DrawError::InvalidDimension {
                width: width.into(),
                height: height.into(),
            });
        }

        Ok(Self {
            width,
            height,
            cells: vec![Cell::default(); usize::from(width) * usize::from(height)],
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    fn index(&self, x: u16, y: u16) -> DrawResult<usize> {
        if !self.contains(x, y) {
            return Err(DrawError::OutOfBounds {
                x: x.into(),
                y: y.into(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(usize::from(y) * usize::from(self.width) + usize::from(x))
    }

    /// Overwrites the cell at `(x, y)`. The canvas is untouched on error.
    pub fn paint(&mut self, x: u16, y: u16, glyph: char, color: Color) -> DrawResult<()> {
        let idx = self.index(x, y)?;
        self.cells[idx] = Cell::new(glyph, color);
        Ok(())
    }

    pub fn erase(&mut self, x: u16, y: u16) -> DrawResult<()> {
        self.paint(x, y, BLANK, Color::Black)
    }

    pub fn get(&self, x: u16, y: u16) -> DrawResult<Cell> {
        let idx = self.index(x, y)?;
        Ok(self.cells[idx])
    }

    /// Non-blank cells in row-major order (y, then x).
    pub fn iter_painted(&self) -> impl Iterator<Item = (u16, u16, Cell)> + '_ {
        let width = usize::from(self.width);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_blank())
            // Both quotients fit in u16: idx < width * height.
            .map(move |(idx, cell)| ((idx % width) as u16, (idx / width) as u16, *cell))
    }

    pub fn painted_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_blank()).count()
    }

    /// Row-major view over every cell, blank ones included.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}
