use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{DrawingMeta, DrawingStore, StoreDocument, StoreError, StoredRecord};
use crate::drawing::codec::CellRecord;

/// Store backed by a single JSON document on disk.
///
/// The file is re-read on every call and rewritten through a temp file +
/// rename, so a failed write never leaves a partial batch behind.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreDocument, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreDocument::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn write(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, doc)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "store document written");
        Ok(())
    }

    fn update<T>(&self, f: impl FnOnce(&mut StoreDocument) -> T) -> Result<T, StoreError> {
        let mut doc = self.read()?;
        let out = f(&mut doc);
        self.write(&doc)?;
        Ok(out)
    }
}

impl DrawingStore for JsonFileStore {
    fn distinct_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read()?.distinct_names())
    }

    fn insert_many(
        &mut self,
        name: &str,
        cells: &[CellRecord],
        meta: Option<DrawingMeta>,
    ) -> Result<usize, StoreError> {
        self.update(|doc| doc.insert_many(name, cells, meta))
    }

    fn replace_by_name(
        &mut self,
        name: &str,
        cells: &[CellRecord],
        meta: Option<DrawingMeta>,
    ) -> Result<usize, StoreError> {
        self.update(|doc| doc.replace_by_name(name, cells, meta))
    }

    fn select_by_name(&self, name: &str) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.read()?.select_by_name(name))
    }

    fn delete_by_name(&mut self, name: &str) -> Result<usize, StoreError> {
        let mut doc = self.read()?;
        let removed = doc.delete_by_name(name);
        // Nothing to do, and no reason to create the file just for this.
        if removed > 0 || self.path.exists() {
            self.write(&doc)?;
        }
        Ok(removed)
    }

    fn meta(&self, name: &str) -> Result<Option<DrawingMeta>, StoreError> {
        Ok(self.read()?.meta(name))
    }

    fn all_meta(&self) -> Result<BTreeMap<String, DrawingMeta>, StoreError> {
        Ok(self.read()?.all_meta())
    }

    fn record_counts(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        Ok(self.read()?.record_counts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::palette::Color;
    use chrono::Utc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("nested").join("drawings.json"))
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.distinct_names().unwrap().is_empty());
        assert!(store.select_by_name("nope").unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_insert_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let cells = vec![
            CellRecord::new(1, 2, Color::Red, '█'),
            CellRecord::new(3, 4, Color::Blue, '░'),
        ];
        let meta = DrawingMeta { width: 10, height: 8, updated_at: Utc::now() };
        assert_eq!(store.insert_many("cat", &cells, Some(meta)).unwrap(), 2);

        let reopened = store_in(&dir);
        let rows = reopened.select_by_name("cat").unwrap();
        assert_eq!(rows.iter().map(StoredRecord::cell).collect::<Vec<_>>(), cells);
        assert!(rows[0].id < rows[1].id);
        assert_eq!(reopened.meta("cat").unwrap(), Some(meta));
        assert!(!dir.path().join("nested").join("drawings.json.tmp").exists());
    }

    #[test]
    fn test_replace_drops_previous_rows() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.insert_many("a", &[CellRecord::new(0, 0, Color::Red, '█')], None).unwrap();
        store.insert_many("b", &[CellRecord::new(1, 1, Color::Gray, '▒')], None).unwrap();
        store.replace_by_name("a", &[CellRecord::new(2, 2, Color::Green, '▓')], None).unwrap();

        let a: Vec<CellRecord> = store.select_by_name("a").unwrap().iter().map(StoredRecord::cell).collect();
        assert_eq!(a, vec![CellRecord::new(2, 2, Color::Green, '▓')]);
        assert_eq!(store.select_by_name("b").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_missing_name_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        assert_eq!(store.delete_by_name("ghost").unwrap(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drawings.json");
        fs::write(&path, "{ not json").unwrap();
        let mut store = JsonFileStore::new(&path);

        assert!(matches!(store.distinct_names(), Err(StoreError::Json(_))));
        assert!(store.insert_many("x", &[CellRecord::new(0, 0, Color::Red, '█')], None).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
