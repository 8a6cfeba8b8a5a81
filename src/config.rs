use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SLOT_KEY: &str = "products";
pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

fn default_slot_key() -> String {
    DEFAULT_SLOT_KEY.to_string()
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_low_stock_threshold() -> u32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// Settings for opening an LMDB-backed product store.
///
/// Only `name` is required when deserializing:
///
/// ```rust
/// use shop_inventory_core::config::StoreConfig;
///
/// let config: StoreConfig = serde_json::from_str(r#"{"name":"shop"}"#)?;
/// assert_eq!(config.slot_key, "products");
/// assert_eq!(config.storage_path().to_str(), Some("shop.lmdb"));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database name; the environment lives in the directory `{name}.lmdb`.
    pub name: String,

    /// Key of the single slot holding the serialized product list.
    #[serde(default = "default_slot_key")]
    pub slot_key: String,

    /// Maximum size of the LMDB memory map, in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Stock level under which a product counts as low on stock.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,
}

impl StoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot_key: default_slot_key(),
            map_size: default_map_size(),
            low_stock_threshold: default_low_stock_threshold(),
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.lmdb", self.name))
    }
}
