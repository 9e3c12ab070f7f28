//! Named client-local slots (the terminal's equivalent of browser storage).

use crate::errors::AppResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const SCHEDULE_SLOT: &str = "scheduled-changes";
pub const MOLD_INFO_SLOT: &str = "current-mold-info";

pub trait SlotStore {
    fn get(&self, slot: &str) -> AppResult<Option<String>>;
    fn set(&self, slot: &str, value: &str) -> AppResult<()>;
}

/// Read a slot as JSON. A corrupt slot is reported and treated as empty.
pub fn load_slot<T: DeserializeOwned, S: SlotStore + ?Sized>(
    store: &S,
    slot: &str,
) -> AppResult<Option<T>> {
    let Some(raw) = store.get(slot)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::warn!(slot, error = %e, "ignoring unreadable slot");
            Ok(None)
        }
    }
}

pub fn save_slot<T: Serialize + ?Sized, S: SlotStore + ?Sized>(
    store: &S,
    slot: &str,
    value: &T,
) -> AppResult<()> {
    let raw = serde_json::to_string_pretty(value)?;
    store.set(slot, &raw)
}

/// One `<slot>.json` file per slot inside a directory.
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl SlotStore for FileSlotStore {
    fn get(&self, slot: &str) -> AppResult<Option<String>> {
        let path = self.path_for(slot);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, slot: &str, value: &str) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(slot), value)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySlotStore {
    slots: Mutex<HashMap<String, String>>,
}

impl SlotStore for MemorySlotStore {
    fn get(&self, slot: &str) -> AppResult<Option<String>> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> AppResult<()> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }
}
