//! Durable storage slots.
//!
//! A slot is a single named location holding the whole serialized product
//! list. Reads return the raw text (or `None` when nothing was ever written);
//! writes replace the slot wholesale.

use std::fs;
use std::path::Path;

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{debug, info};

use crate::config::StoreConfig;
use crate::store_error::StoreResult;

const INVENTORY_DB: &str = "inventory";

pub trait DurableSlot {
    /// Returns the slot contents, or `None` if the slot was never written.
    fn read(&self) -> StoreResult<Option<String>>;

    /// Replaces the slot contents.
    fn write(&mut self, contents: &str) -> StoreResult<()>;
}

/// Slot stored under one key of an LMDB environment on disk.
pub struct LmdbSlot {
    env: Environment,
    db: Database,
    key: String,
}

impl LmdbSlot {
    /// Opens (creating if needed) the environment at `config.storage_path()`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let path = config.storage_path();
        Self::open_at(&path, &config.slot_key, config.map_size)
    }

    pub fn open_at(path: &Path, key: &str, map_size: usize) -> StoreResult<Self> {
        if !path.exists() {
            info!("Creating inventory environment at: {}", path.display());
            fs::create_dir_all(path)?;
        }

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(map_size)
            .open(path)?;
        let db = env.create_db(Some(INVENTORY_DB), DatabaseFlags::empty())?;

        info!("Opened inventory slot '{}' at {}", key, path.display());

        Ok(Self {
            env,
            db,
            key: key.to_string(),
        })
    }
}

impl DurableSlot for LmdbSlot {
    fn read(&self) -> StoreResult<Option<String>> {
        let txn = self.env.begin_ro_txn()?;
        let contents = match txn.get(self.db, &self.key) {
            Ok(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        txn.abort();
        Ok(contents)
    }

    fn write(&mut self, contents: &str) -> StoreResult<()> {
        let mut txn = self.env.begin_rw_txn()?;
        txn.put(self.db, &self.key, &contents, WriteFlags::empty())?;
        txn.commit()?;
        debug!("Wrote {} bytes to slot '{}'", contents.len(), self.key);
        Ok(())
    }
}

/// In-process slot, for tests and hosts that do not need durability.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    contents: Option<String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-filled with arbitrary text, valid or not.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl DurableSlot for MemorySlot {
    fn read(&self) -> StoreResult<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> StoreResult<()> {
        self.contents = Some(contents.to_string());
        Ok(())
    }
}
