//! Sparse encoding of a canvas.
//!
//! Most of a terminal-sized grid stays unpainted, so only non-blank cells are
//! turned into records. Decoding replays the records onto a blank canvas.

use serde::{Deserialize, Serialize};

use super::canvas::Canvas;
use super::error::{DrawError, DrawResult};
use super::palette::Color;

/// One painted cell as it is persisted.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CellRecord {
    pub x: i32,
    pub y: i32,
    pub color: String,
    pub glyph: char,
}

impl CellRecord {
    pub fn new(x: i32, y: i32, color: Color, glyph: char) -> Self {
        Self {
            x,
            y,
            color: color.name().to_string(),
            glyph,
        }
    }
}

/// Non-blank cells, row-major.
pub fn flatten(canvas: &Canvas) -> Vec<CellRecord> {
    canvas
        .iter_painted()
        .map(|(x, y, cell)| CellRecord::new(x.into(), y.into(), cell.color, cell.glyph))
        .collect()
}

/// Builds a `width x height` canvas and paints `records` in order, so a later
/// record for the same position wins.
///
/// Records outside the target bounds are rejected, not clipped.
pub fn reconstruct(records: &[CellRecord], width: u16, height: u16) -> DrawResult<Canvas> {
    let mut canvas = Canvas::create_blank(width, height)?;

    for record in records {
        let out_of_bounds = || DrawError::OutOfBounds {
            x: record.x.into(),
            y: record.y.into(),
            width,
            height,
        };
        let x = u16::try_from(record.x).map_err(|_| out_of_bounds())?;
        let y = u16::try_from(record.y).map_err(|_| out_of_bounds())?;
        if !canvas.contains(x, y) {
            return Err(out_of_bounds());
        }

        let color: Color = record.color.parse()?;
        canvas.paint(x, y, record.glyph, color)?;
    }

    Ok(canvas)
}

/// Smallest `(width, height)` holding every record, ignoring negative
/// coordinates. `None` for an empty slice.
pub fn bounding_size(records: &[CellRecord]) -> Option<(i64, i64)> {
    records.iter().fold(None, |acc, r| {
        let w = i64::from(r.x.max(0)) + 1;
        let h = i64::from(r.y.max(0)) + 1;
        Some(match acc {
            Some((aw, ah)) => (w.max(aw), h.max(ah)),
            None => (w, h),
        })
    })
}
