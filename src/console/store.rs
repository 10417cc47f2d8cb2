use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::lending::snapshot::LibrarySnapshot;

// SnapshotStore persists the whole library as one JSON document. The path
// comes from `LIBMS_DATA_FILE` or falls back to a file in the working
// directory, so the console can be pointed at a different data set per run.
pub struct SnapshotStore {
    path: PathBuf,
}

pub const DEFAULT_DATA_FILE: &str = "library-data.json";

impl SnapshotStore {
    pub fn from_env() -> Self {
        let path = std::env::var("LIBMS_DATA_FILE")
            .unwrap_or_else(|_| DEFAULT_DATA_FILE.to_string());
        Self::new(path)
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, snapshot: &LibrarySnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)
            .context("encoding library snapshot")?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    pub fn load(&self) -> Result<LibrarySnapshot> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let snapshot = serde_json::from_str(json.as_str())
            .with_context(|| format!("decoding {}", self.path.display()))?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use crate::console::store::SnapshotStore;
    use crate::core::domain::Configuration;
    use crate::lending::domain::service::Library;

    fn scratch_store() -> SnapshotStore {
        let path = std::env::temp_dir().join(format!("libms-{}.json", Uuid::new_v4()));
        SnapshotStore::new(path)
    }

    #[test]
    fn test_should_save_and_load_snapshot() {
        let store = scratch_store();
        let mut library = Library::new(Configuration::new());
        library.add_book("Dune", "Herbert", "B1").expect("book");

        assert!(!store.exists());
        store.save(&library.snapshot()).expect("save");
        assert!(store.exists());

        let snapshot = store.load().expect("load");
        assert_eq!(1, snapshot.books.len());
        assert_eq!("B1", snapshot.books[0].book_id.as_str());
        let _ = std::fs::remove_file(store.path());
    }

    #[test]
    fn test_should_fail_to_load_missing_file() {
        let store = scratch_store();
        assert!(store.load().is_err());
    }
}
