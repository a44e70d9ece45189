use crate::PlateStore;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Fixed key the whole store is persisted under.
pub const STORE_KEY: &str = "plate_store";

/// Key-value blob storage the core mirrors its state into. The core never
/// cares where blobs live; the CLI and GUI use files, tests use memory.
pub trait BlobStore {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&mut self, key: &str, blob: &str) -> anyhow::Result<()>;
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, blob: &str) -> anyhow::Result<()> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// File-backed store: each key becomes `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.path_for(key)
    }
}

impl BlobStore for FileStore {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("read blob file {}", path.display()))?;
        Ok(Some(text))
    }

    fn write(&mut self, key: &str, blob: &str) -> anyhow::Result<()> {
        if let Some(parent) = self.path_for(key).parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create blob dir {}", parent.display()))?;
        }
        let path = self.path_for(key);
        fs::write(&path, blob).with_context(|| format!("write blob file {}", path.display()))?;
        Ok(())
    }
}

/// Serializes the full store (all five grids) to the fixed key. Called once
/// per committed mutation.
pub fn save(store: &PlateStore, blobs: &mut dyn BlobStore) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(store).context("serialize plate store")?;
    blobs.write(STORE_KEY, &json).context("store plate blob")?;
    log::debug!("persisted plate store under '{STORE_KEY}'");
    Ok(())
}

/// Loads the store, falling back to a fresh all-empty one when the blob is
/// missing or malformed. Never fails: a corrupt blob costs the saved layout,
/// not the session.
pub fn load(blobs: &dyn BlobStore) -> PlateStore {
    let blob = match blobs.read(STORE_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => {
            log::info!("no persisted plate store, starting empty");
            return PlateStore::new();
        }
        Err(e) => {
            log::warn!("reading persisted plate store failed, starting empty: {e:#}");
            return PlateStore::new();
        }
    };

    match serde_json::from_str::<PlateStore>(&blob) {
        Ok(mut store) => {
            store.normalize();
            store
        }
        Err(e) => {
            log::warn!("persisted plate store is malformed, starting empty: {e}");
            PlateStore::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Assignment, PatternId, PlateFormat, StyleKey, assign};

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn round_trip_is_lossless() -> anyhow::Result<()> {
        let mut store = PlateStore::new();
        assign::apply(
            &mut store,
            PlateFormat::W48,
            &ids(&["A1", "B2", "F8"]),
            &Assignment::new("Buffer", Some(StyleKey::Color("#8b5cf6".into()))),
        )?;
        assign::apply(
            &mut store,
            PlateFormat::W96,
            &ids(&["H12"]),
            &Assignment::new("Edge", Some(StyleKey::Pattern(PatternId::Crosshatch))),
        )?;

        let mut blobs = MemoryStore::new();
        save(&store, &mut blobs)?;
        let loaded = load(&blobs);

        assert_eq!(loaded, store);
        Ok(())
    }

    #[test]
    fn pattern_keys_survive_as_exact_strings() -> anyhow::Result<()> {
        let mut store = PlateStore::new();
        assign::apply(
            &mut store,
            PlateFormat::W6,
            &ids(&["A1"]),
            &Assignment::new("Tex", Some(StyleKey::Pattern(PatternId::DiagonalUp))),
        )?;

        let mut blobs = MemoryStore::new();
        save(&store, &mut blobs)?;
        let raw = blobs.read(STORE_KEY)?.unwrap();
        assert!(raw.contains("\"diagonal-up\""));

        let loaded = load(&blobs);
        assert_eq!(
            loaded.get(PlateFormat::W6).well("A1").unwrap().color,
            StyleKey::Pattern(PatternId::DiagonalUp)
        );
        Ok(())
    }

    #[test]
    fn blob_shape_is_size_keyed_well_arrays() -> anyhow::Result<()> {
        let mut blobs = MemoryStore::new();
        save(&PlateStore::new(), &mut blobs)?;
        let raw = blobs.read(STORE_KEY)?.unwrap();

        let value: serde_json::Value = serde_json::from_str(&raw)?;
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        for size in ["6", "12", "24", "48", "96"] {
            assert!(obj[size].is_array(), "missing grid for size {size}");
        }
        let a1 = &obj["6"][0];
        assert_eq!(a1["id"], "A1");
        assert_eq!(a1["label"], "");
        assert_eq!(a1["color"], "#ffffff");
        assert_eq!(a1["status"], "empty");
        Ok(())
    }

    #[test]
    fn missing_blob_loads_an_empty_store() {
        let blobs = MemoryStore::new();
        assert_eq!(load(&blobs), PlateStore::new());
    }

    #[test]
    fn corrupt_blob_falls_back_to_an_empty_store() -> anyhow::Result<()> {
        let mut blobs = MemoryStore::new();
        blobs.write(STORE_KEY, "{ not json")?;
        assert_eq!(load(&blobs), PlateStore::new());
        Ok(())
    }

    #[test]
    fn partial_blob_gets_missing_grids_regenerated() -> anyhow::Result<()> {
        let mut blobs = MemoryStore::new();
        // Only the 6-well grid present, and A1 filled.
        blobs.write(
            STORE_KEY,
            r##"{"6":[
                {"id":"A1","label":"K","color":"#ef4444","status":"filled"},
                {"id":"A2","label":"","color":"#ffffff","status":"empty"},
                {"id":"A3","label":"","color":"#ffffff","status":"empty"},
                {"id":"B1","label":"","color":"#ffffff","status":"empty"},
                {"id":"B2","label":"","color":"#ffffff","status":"empty"},
                {"id":"B3","label":"","color":"#ffffff","status":"empty"}
            ]}"##,
        )?;

        let store = load(&blobs);
        assert!(store.get(PlateFormat::W6).well("A1").unwrap().is_filled());
        for format in [PlateFormat::W12, PlateFormat::W24, PlateFormat::W48, PlateFormat::W96] {
            assert_eq!(store.get(format), &crate::WellGrid::generate(format));
        }
        Ok(())
    }
}
