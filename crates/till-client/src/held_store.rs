//! # Held Sale Store
//!
//! One JSON file, one slot. Saving replaces the previous snapshot.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write leaves the old snapshot intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use till_core::HeldSale;

use crate::error::ClientResult;

#[derive(Debug, Clone)]
pub struct HeldSaleStore {
    path: PathBuf,
}

impl HeldSaleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot, replacing any held sale.
    pub fn save(&self, held: &HeldSale) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(held)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;

        info!(path = ?self.path, items = held.item_count(), "Held sale saved");
        Ok(())
    }

    /// Reads the held sale, if there is one.
    pub fn load(&self) -> ClientResult<Option<HeldSale>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "No held sale");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the held sale. Returns whether there was one.
    pub fn clear(&self) -> ClientResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}
