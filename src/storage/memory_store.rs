use std::collections::BTreeMap;

use super::{DrawingMeta, DrawingStore, StoreDocument, StoreError, StoredRecord};
use crate::drawing::codec::CellRecord;

/// In-process store. `set_unavailable(true)` makes every call fail, which is
/// how tests exercise the unreachable-store path.
#[derive(Default)]
pub struct MemoryStore {
    doc: StoreDocument,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

impl DrawingStore for MemoryStore {
    fn distinct_names(&self) -> Result<Vec<String>, StoreError> {
        self.check()?;
        Ok(self.doc.distinct_names())
    }

    fn insert_many(
        &mut self,
        name: &str,
        cells: &[CellRecord],
        meta: Option<DrawingMeta>,
    ) -> Result<usize, StoreError> {
        self.check()?;
        Ok(self.doc.insert_many(name, cells, meta))
    }

    fn replace_by_name(
        &mut self,
        name: &str,
        cells: &[CellRecord],
        meta: Option<DrawingMeta>,
    ) -> Result<usize, StoreError> {
        self.check()?;
        Ok(self.doc.replace_by_name(name, cells, meta))
    }

    fn select_by_name(&self, name: &str) -> Result<Vec<StoredRecord>, StoreError> {
        self.check()?;
        Ok(self.doc.select_by_name(name))
    }

    fn delete_by_name(&mut self, name: &str) -> Result<usize, StoreError> {
        self.check()?;
        Ok(self.doc.delete_by_name(name))
    }

    fn meta(&self, name: &str) -> Result<Option<DrawingMeta>, StoreError> {
        self.check()?;
        Ok(self.doc.meta(name))
    }

    fn all_meta(&self) -> Result<BTreeMap<String, DrawingMeta>, StoreError> {
        self.check()?;
        Ok(self.doc.all_meta())
    }

    fn record_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        self.check()?;
        Ok(self.doc.record_counts())
    }
}
