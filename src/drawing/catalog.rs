//! Name-indexed persistence of flattened drawings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::codec::CellRecord;
use super::error::{DrawError, DrawResult};
use super::palette::BLANK;
use crate::storage::{DrawingMeta, DrawingStore, StoreError, StoredRecord};

pub const MAX_NAME_LEN: usize = 100;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SaveMode {
    /// Add records next to whatever is already stored under the name.
    Append,
    /// Replace everything stored under the name.
    Overwrite,
}

/// Records for one drawing plus the canvas size it was saved with, when known.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LoadedDrawing {
    pub name: String,
    pub records: Vec<CellRecord>,
    pub size: Option<(u16, u16)>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct DrawingSummary {
    pub name: String,
    pub cells: usize,
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<StoreError> for DrawError {
    fn from(err: StoreError) -> Self {
        warn!(error = %err, "store call failed");
        DrawError::StoreUnavailable(err.to_string())
    }
}

pub fn validate_name(name: &str) -> DrawResult<()> {
    if name.trim().is_empty() {
        return Err(DrawError::InvalidName("name must not be empty".to_string()));
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(DrawError::InvalidName(format!(
            "name is {len} characters, the limit is {MAX_NAME_LEN}"
        )));
    }
    Ok(())
}

/// Drops blank-glyph records, which mean "unpainted" and are never stored.
fn painted_only(records: &[CellRecord]) -> Vec<CellRecord> {
    let painted: Vec<CellRecord> = records.iter().filter(|r| r.glyph != BLANK).cloned().collect();
    if painted.len() != records.len() {
        debug!(skipped = records.len() - painted.len(), "blank records not stored");
    }
    painted
}

pub struct DrawingCatalog<S> {
    store: S,
}

impl<S: DrawingStore> DrawingCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Distinct saved names, sorted. Empty when nothing is saved.
    pub fn list_names(&self) -> DrawResult<Vec<String>> {
        Ok(self.store.distinct_names()?)
    }

    /// Appends `records` under `name`. Repeated saves accumulate.
    pub fn save(&mut self, name: &str, records: &[CellRecord]) -> DrawResult<usize> {
        validate_name(name)?;
        let written = self.store.insert_many(name, &painted_only(records), None)?;
        info!(name, written, "drawing saved");
        Ok(written)
    }

    /// Saves with the canvas size attached, appending or replacing.
    ///
    /// Appending keeps the larger of the stored and new sizes, so earlier
    /// rows still fit.
    pub fn save_drawing(
        &mut self,
        name: &str,
        size: (u16, u16),
        records: &[CellRecord],
        mode: SaveMode,
    ) -> DrawResult<usize> {
        validate_name(name)?;
        let meta = DrawingMeta {
            width: size.0,
            height: size.1,
            updated_at: Utc::now(),
        };
        let records = painted_only(records);
        let written = match mode {
            SaveMode::Append => self.store.insert_many(name, &records, Some(meta))?,
            SaveMode::Overwrite => self.store.replace_by_name(name, &records, Some(meta))?,
        };
        info!(name, written, ?mode, width = size.0, height = size.1, "drawing saved");
        Ok(written)
    }

    /// Records under `name` in insertion order; empty for unknown names.
    pub fn load(&self, name: &str) -> DrawResult<Vec<CellRecord>> {
        let rows = self.store.select_by_name(name)?;
        Ok(rows.iter().map(StoredRecord::cell).collect())
    }

    pub fn load_drawing(&self, name: &str) -> DrawResult<Option<LoadedDrawing>> {
        let records = self.load(name)?;
        let meta = self.store.meta(name)?;
        if records.is_empty() && meta.is_none() {
            return Ok(None);
        }
        Ok(Some(LoadedDrawing {
            name: name.to_string(),
            records,
            size: meta.map(|m| (m.width, m.height)),
        }))
    }

    pub fn exists(&self, name: &str) -> DrawResult<bool> {
        Ok(self.list_names()?.iter().any(|n| n == name))
    }

    pub fn summaries(&self) -> DrawResult<Vec<DrawingSummary>> {
        let counts = self.store.record_counts()?;
        let metas = self.store.all_meta()?;
        let names: BTreeSet<&String> = counts.keys().chain(metas.keys()).collect();

        Ok(names
            .into_iter()
            .map(|name| {
                let meta = metas.get(name);
                DrawingSummary {
                    name: name.clone(),
                    cells: counts.get(name).copied().unwrap_or(0),
                    width: meta.map(|m| m.width),
                    height: meta.map(|m| m.height),
                    updated_at: meta.map(|m| m.updated_at),
                }
            })
            .collect())
    }

    /// Removes every record under `name`. Unknown names are a no-op.
    pub fn delete(&mut self, name: &str) -> DrawResult<usize> {
        let removed = self.store.delete_by_name(name)?;
        info!(name, removed, "drawing deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::canvas::Canvas;
    use crate::drawing::codec::{flatten, reconstruct};
    use crate::drawing::palette::Color;
    use crate::storage::{JsonFileStore, MemoryStore};

    fn catalog() -> DrawingCatalog<MemoryStore> {
        DrawingCatalog::new(MemoryStore::new())
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = catalog();
        assert!(catalog.list_names().unwrap().is_empty());
        assert!(catalog.load("missing").unwrap().is_empty());
        assert_eq!(catalog.load_drawing("missing").unwrap(), None);
    }

    #[test]
    fn test_catalog_isolation() {
        let mut catalog = catalog();
        let recs_a = vec![
            CellRecord::new(0, 0, Color::Red, '█'),
            CellRecord::new(1, 0, Color::Green, '▓'),
        ];
        let recs_b = vec![CellRecord::new(7, 3, Color::Blue, '░')];

        catalog.save("A", &recs_a).unwrap();
        catalog.save("B", &recs_b).unwrap();

        assert_eq!(catalog.load("A").unwrap(), recs_a);
        assert_eq!(catalog.load("B").unwrap(), recs_b);
        assert_eq!(catalog.list_names().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_save_is_additive() {
        let mut catalog = catalog();
        let first = vec![CellRecord::new(2, 2, Color::Gray, '█')];
        let second = vec![CellRecord::new(2, 2, Color::Red, '▒')];
        catalog.save("pic", &first).unwrap();
        catalog.save("pic", &second).unwrap();

        let loaded = catalog.load("pic").unwrap();
        assert_eq!(loaded, vec![first[0].clone(), second[0].clone()]);
        // Later record is authoritative on reconstruction.
        let canvas = reconstruct(&loaded, 4, 4).unwrap();
        assert_eq!(canvas.get(2, 2).unwrap().color, Color::Red);
        assert_eq!(catalog.list_names().unwrap(), vec!["pic"]);
    }

    #[test]
    fn test_overwrite_replaces_records_and_keeps_size() {
        let mut catalog = catalog();
        catalog.save("pic", &[CellRecord::new(0, 0, Color::Gray, '█')]).unwrap();
        let fresh = vec![CellRecord::new(3, 1, Color::Blue, '▓')];
        catalog
            .save_drawing("pic", (20, 10), &fresh, SaveMode::Overwrite)
            .unwrap();

        let loaded = catalog.load_drawing("pic").unwrap().unwrap();
        assert_eq!(loaded.records, fresh);
        assert_eq!(loaded.size, Some((20, 10)));
    }

    #[test]
    fn test_name_validation() {
        let mut catalog = catalog();
        let recs = vec![CellRecord::new(0, 0, Color::Red, '█')];
        assert!(matches!(catalog.save("", &recs), Err(DrawError::InvalidName(_))));
        assert!(matches!(catalog.save("   ", &recs), Err(DrawError::InvalidName(_))));
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(catalog.save(&long, &recs), Err(DrawError::InvalidName(_))));
        assert!(catalog.save(&"é".repeat(MAX_NAME_LEN), &recs).is_ok());
        assert!(catalog.list_names().unwrap().iter().all(|n| n.chars().count() <= MAX_NAME_LEN));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut catalog = catalog();
        assert_eq!(catalog.delete("nothing").unwrap(), 0);

        catalog.save("gone", &[CellRecord::new(1, 1, Color::Red, '█')]).unwrap();
        catalog.save("kept", &[CellRecord::new(1, 1, Color::Red, '█')]).unwrap();
        assert_eq!(catalog.delete("gone").unwrap(), 1);
        assert_eq!(catalog.delete("gone").unwrap(), 0);
        assert!(catalog.load("gone").unwrap().is_empty());
        assert_eq!(catalog.list_names().unwrap(), vec!["kept"]);
    }

    #[test]
    fn test_store_failure_surfaces_as_unavailable() {
        let mut catalog = catalog();
        catalog.store_mut().set_unavailable(true);
        let recs = vec![CellRecord::new(0, 0, Color::Red, '█')];

        assert!(matches!(catalog.list_names(), Err(DrawError::StoreUnavailable(_))));
        assert!(matches!(catalog.save("x", &recs), Err(DrawError::StoreUnavailable(_))));
        assert!(matches!(catalog.load("x"), Err(DrawError::StoreUnavailable(_))));
        assert!(matches!(catalog.delete("x"), Err(DrawError::StoreUnavailable(_))));

        catalog.store_mut().set_unavailable(false);
        assert!(catalog.list_names().unwrap().is_empty());
    }

    #[test]
    fn test_summaries() {
        let mut catalog = catalog();
        catalog.save("legacy", &[CellRecord::new(0, 0, Color::Red, '█')]).unwrap();
        catalog
            .save_drawing("sized", (30, 12), &[], SaveMode::Overwrite)
            .unwrap();

        let summaries = catalog.summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "legacy");
        assert_eq!(summaries[0].cells, 1);
        assert_eq!(summaries[0].width, None);
        assert_eq!(summaries[1].name, "sized");
        assert_eq!(summaries[1].cells, 0);
        assert_eq!((summaries[1].width, summaries[1].height), (Some(30), Some(12)));
        assert!(catalog.exists("sized").unwrap());
    }

    #[test]
    fn test_append_smaller_canvas_keeps_old_cells_reachable() {
        let mut catalog = catalog();
        let mut big = Canvas::create_blank(80, 23).unwrap();
        big.paint(70, 20, '█', Color::Red).unwrap();
        catalog.save_drawing("pic", big.size(), &flatten(&big), SaveMode::Append).unwrap();

        let mut small = Canvas::create_blank(40, 10).unwrap();
        small.paint(3, 3, '░', Color::Blue).unwrap();
        catalog.save_drawing("pic", small.size(), &flatten(&small), SaveMode::Append).unwrap();

        let loaded = catalog.load_drawing("pic").unwrap().unwrap();
        assert_eq!(loaded.size, Some((80, 23)));
        let (w, h) = loaded.size.unwrap();
        let canvas = reconstruct(&loaded.records, w, h).unwrap();
        assert_eq!(canvas.painted_count(), 2);
    }

    #[test]
    fn test_blank_records_are_not_stored() {
        let mut catalog = catalog();
        let records = vec![
            CellRecord::new(0, 0, Color::Red, '█'),
            CellRecord::new(1, 0, Color::Black, BLANK),
        ];
        assert_eq!(catalog.save("pic", &records).unwrap(), 1);
        assert_eq!(
            catalog.save_drawing("other", (4, 4), &records, SaveMode::Overwrite).unwrap(),
            1
        );
        assert_eq!(catalog.load("pic").unwrap(), vec![records[0].clone()]);
        assert!(catalog.load("other").unwrap().iter().all(|r| r.glyph != BLANK));
    }

    #[test]
    fn test_end_to_end_scenario_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut catalog = DrawingCatalog::new(JsonFileStore::new(dir.path().join("drawings.json")));

        let mut canvas = Canvas::create_blank(80, 24).unwrap();
        canvas.paint(5, 5, '█', Color::Gray).unwrap();
        canvas.paint(5, 5, '▓', Color::Red).unwrap();

        let records = flatten(&canvas);
        let expected = vec![CellRecord {
            x: 5,
            y: 5,
            color: "Red".to_string(),
            glyph: '▓',
        }];
        assert_eq!(records, expected);

        catalog.save("test", &records).unwrap();
        assert_eq!(catalog.load("test").unwrap(), expected);
        assert!(catalog.list_names().unwrap().contains(&"test".to_string()));

        catalog.delete("test").unwrap();
        assert!(catalog.load("test").unwrap().is_empty());
    }
}
