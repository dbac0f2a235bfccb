//! Persistent stores for drawing records.
//!
//! A store is a flat table of `{id, name, x, y, color, glyph}` rows plus a
//! small per-name metadata map. Every mutating call either applies fully or
//! not at all.

pub mod json_store;
#[cfg(test)]
pub mod memory_store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::drawing::codec::CellRecord;

pub use json_store::JsonFileStore;
#[cfg(test)]
pub use memory_store::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed store document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// A persisted cell row, tagged with its owning drawing.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: u64,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub color: String,
    pub glyph: char,
}

impl StoredRecord {
    pub fn cell(&self) -> CellRecord {
        CellRecord {
            x: self.x,
            y: self.y,
            color: self.color.clone(),
            glyph: self.glyph,
        }
    }
}

/// Canvas size a drawing was saved with.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct DrawingMeta {
    pub width: u16,
    pub height: u16,
    pub updated_at: DateTime<Utc>,
}

impl DrawingMeta {
    /// Size covering both `self` and `newer`, stamped with `newer`'s time.
    /// Rows appended earlier keep their coordinates, so the size only grows.
    pub fn grown_to(self, newer: DrawingMeta) -> DrawingMeta {
        DrawingMeta {
            width: self.width.max(newer.width),
            height: self.height.max(newer.height),
            updated_at: newer.updated_at,
        }
    }
}

pub trait DrawingStore {
    fn distinct_names(&self) -> Result<Vec<String>, StoreError>;

    /// Appends `cells` under `name` in one batch.
    fn insert_many(
        &mut self,
        name: &str,
        cells: &[CellRecord],
        meta: Option<DrawingMeta>,
    ) -> Result<usize, StoreError>;

    /// Drops every row under `name` and inserts `cells`, as one batch.
    fn replace_by_name(
        &mut self,
        name: &str,
        cells: &[CellRecord],
        meta: Option<DrawingMeta>,
    ) -> Result<usize, StoreError>;

    /// Rows for `name` in insertion order.
    fn select_by_name(&self, name: &str) -> Result<Vec<StoredRecord>, StoreError>;

    fn delete_by_name(&mut self, name: &str) -> Result<usize, StoreError>;

    fn meta(&self, name: &str) -> Result<Option<DrawingMeta>, StoreError>;

    /// Stored size for every name that has one.
    fn all_meta(&self) -> Result<BTreeMap<String, DrawingMeta>, StoreError>;

    /// Row count per name, for names with at least one row.
    fn record_counts(&self) -> Result<BTreeMap<String, usize>, StoreError>;
}

/// The whole table. Both store implementations mutate one of these.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    records: Vec<StoredRecord>,
    #[serde(default)]
    drawings: BTreeMap<String, DrawingMeta>,
}

impl StoreDocument {
    fn distinct_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self
            .records
            .iter()
            .map(|r| &r.name)
            .chain(self.drawings.keys())
            .collect();
        names.into_iter().cloned().collect()
    }

    fn insert_many(&mut self, name: &str, cells: &[CellRecord], meta: Option<DrawingMeta>) -> usize {
        for cell in cells {
            self.next_id += 1;
            self.records.push(StoredRecord {
                id: self.next_id,
                name: name.to_string(),
                x: cell.x,
                y: cell.y,
                color: cell.color.clone(),
                glyph: cell.glyph,
            });
        }
        if let Some(meta) = meta {
            self.drawings
                .entry(name.to_string())
                .and_modify(|old| *old = old.grown_to(meta))
                .or_insert(meta);
        }
        cells.len()
    }

    fn replace_by_name(&mut self, name: &str, cells: &[CellRecord], meta: Option<DrawingMeta>) -> usize {
        self.delete_by_name(name);
        self.insert_many(name, cells, meta)
    }

    fn select_by_name(&self, name: &str) -> Vec<StoredRecord> {
        let mut rows: Vec<StoredRecord> =
            self.records.iter().filter(|r| r.name == name).cloned().collect();
        rows.sort_by_key(|r| r.id);
        rows
    }

    fn delete_by_name(&mut self, name: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.name != name);
        self.drawings.remove(name);
        before - self.records.len()
    }

    fn meta(&self, name: &str) -> Option<DrawingMeta> {
        self.drawings.get(name).copied()
    }

    fn all_meta(&self) -> BTreeMap<String, DrawingMeta> {
        self.drawings.clone()
    }

    fn record_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.name.clone()).or_insert(0) += 1;
        }
        counts
    }
}
