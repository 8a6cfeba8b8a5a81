//! The product repository.
//!
//! [`ProductStore`] is the sole authority over the product collection. It keeps
//! the collection in memory, in insertion order, and writes the whole of it to
//! its [`DurableSlot`] after every mutation.
//!
//! Mutations are computed on a copy of the collection; the copy replaces the
//! in-memory state only after the slot write succeeded, so a
//! [`StoreError::PersistenceFailure`] never leaves memory ahead of storage.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::config::StoreConfig;
use crate::product::{
    normalize_name, round_to_cents, validate_price, validate_stock, ImportRecord, ImportSummary,
    NewProduct, Product, ProductStats,
};
use crate::slot::{DurableSlot, LmdbSlot};
use crate::store_error::{StoreError, StoreResult};

pub struct ProductStore<S: DurableSlot> {
    slot: S,
    products: Vec<Product>,
    low_stock_threshold: u32,
}

impl ProductStore<LmdbSlot> {
    /// Opens the LMDB-backed store described by `config` and loads it.
    ///
    /// ```no_run
    /// use shop_inventory_core::config::StoreConfig;
    /// use shop_inventory_core::product::NewProduct;
    /// use shop_inventory_core::product_store::ProductStore;
    ///
    /// let mut store = ProductStore::open(&StoreConfig::new("shop"))?;
    /// store.create(NewProduct::new("7790001", "Baby Bib", 5.50))?;
    /// assert!(store.find_by_barcode("7790001").is_some());
    /// # Ok::<(), shop_inventory_core::store_error::StoreError>(())
    /// ```
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let slot = LmdbSlot::open(config)?;
        Ok(Self::with_slot(slot, config.low_stock_threshold))
    }
}

impl<S: DurableSlot> ProductStore<S> {
    /// Builds a store over `slot` and loads whatever it holds.
    pub fn with_slot(slot: S, low_stock_threshold: u32) -> Self {
        let mut store = Self {
            slot,
            products: Vec::new(),
            low_stock_threshold,
        };
        store.load();
        store
    }

    /// Replaces the in-memory collection with the slot contents.
    ///
    /// Never fails: a missing, unreadable or malformed slot yields an empty
    /// collection.
    pub fn load(&mut self) -> &[Product] {
        self.products = match self.slot.read() {
            Ok(Some(json)) => match serde_json::from_str::<Vec<Product>>(&json) {
                Ok(products) => dedupe_by_barcode(products),
                Err(e) => {
                    warn!("Stored product list is malformed, starting empty: {e}");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("Product slot is empty");
                Vec::new()
            }
            Err(e) => {
                warn!("Could not read product slot, starting empty: {e}");
                Vec::new()
            }
        };
        info!("Loaded {} products", self.products.len());
        &self.products
    }

    pub fn list(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn create(&mut self, new_product: NewProduct) -> StoreResult<Product> {
        let product = new_product.validate()?;
        if self.position(&product.barcode).is_some() {
            return Err(StoreError::DuplicateBarcode(product.barcode));
        }

        let mut next = self.products.clone();
        next.push(product.clone());
        self.commit(next)?;

        debug!("Created product {}", product.barcode);
        Ok(product)
    }

    /// Exact match; surrounding whitespace is ignored as it is on create.
    pub fn find_by_barcode(&self, barcode: &str) -> Option<&Product> {
        self.position(barcode).map(|index| &self.products[index])
    }

    /// Case-insensitive substring match on the product name.
    pub fn find_by_name(&self, query: &str) -> Vec<&Product> {
        let needle = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Matches barcode substrings or case-insensitive name substrings.
    /// A blank term returns every product.
    pub fn search(&self, term: &str) -> Vec<&Product> {
        let term = term.trim();
        if term.is_empty() {
            return self.products.iter().collect();
        }

        let needle = term.to_lowercase();
        self.products
            .iter()
            .filter(|p| p.barcode.contains(term) || p.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn update_price(&mut self, barcode: &str, price: f64) -> StoreResult<Product> {
        let price = validate_price(price)?;
        self.modify(barcode, |product| product.price = price)
    }

    pub fn update_stock(&mut self, barcode: &str, stock: i64) -> StoreResult<Product> {
        let stock = validate_stock(stock)?;
        self.modify(barcode, |product| product.stock = Some(stock))
    }

    /// Adds `delta` to the stock, clamping the result to `0..=u32::MAX`.
    /// Untracked stock starts from zero.
    pub fn adjust_stock(&mut self, barcode: &str, delta: i64) -> StoreResult<Product> {
        self.modify(barcode, |product| {
            let current = i64::from(product.stock_or_zero());
            let adjusted = current.saturating_add(delta).clamp(0, i64::from(u32::MAX));
            product.stock = Some(adjusted as u32);
        })
    }

    /// Replaces every non-key field of an existing product.
    pub fn update_product(
        &mut self,
        barcode: &str,
        name: Option<&str>,
        price: f64,
        stock: Option<i64>,
    ) -> StoreResult<Product> {
        let price = validate_price(price)?;
        let stock = stock.map(validate_stock).transpose()?;
        let name = normalize_name(name);
        self.modify(barcode, |product| {
            product.name = name;
            product.price = price;
            product.stock = stock;
        })
    }

    /// Multiplies every price by `1 + percent / 100`, rounding to cents.
    /// Persists once and returns the number of products adjusted.
    pub fn bulk_adjust_price(&mut self, percent: f64) -> StoreResult<usize> {
        let factor = price_factor(percent)?;
        let mut next = self.products.clone();
        for product in next.iter_mut() {
            product.price = adjusted_price(product, factor)?;
        }
        let adjusted = next.len();
        self.commit(next)?;

        info!("Adjusted {adjusted} prices by {percent}%");
        Ok(adjusted)
    }

    /// Same as [`bulk_adjust_price`](Self::bulk_adjust_price) restricted to
    /// `barcodes`. Unknown barcodes are ignored.
    pub fn bulk_adjust_price_selected<B: AsRef<str>>(
        &mut self,
        barcodes: &[B],
        percent: f64,
    ) -> StoreResult<usize> {
        let factor = price_factor(percent)?;
        let selected: HashSet<&str> = barcodes.iter().map(|b| b.as_ref().trim()).collect();

        let mut next = self.products.clone();
        let mut adjusted = 0;
        for product in next.iter_mut().filter(|p| selected.contains(p.barcode.as_str())) {
            product.price = adjusted_price(product, factor)?;
            adjusted += 1;
        }
        self.commit(next)?;

        info!("Adjusted {adjusted} selected prices by {percent}%");
        Ok(adjusted)
    }

    pub fn delete(&mut self, barcode: &str) -> StoreResult<Product> {
        let index = self
            .position(barcode)
            .ok_or_else(|| StoreError::NotFound(barcode.to_string()))?;

        let mut next = self.products.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        debug!("Deleted product {barcode}");
        Ok(removed)
    }

    /// Appends every record that validates and whose barcode is not stored
    /// yet (including earlier rows of the same batch). Invalid and duplicate
    /// rows are skipped. Returns the number of products added.
    pub fn import_batch(&mut self, records: &[ImportRecord]) -> StoreResult<usize> {
        self.import_batch_report(records).map(|summary| summary.imported)
    }

    /// [`import_batch`](Self::import_batch) with the reason each skipped row
    /// was dropped.
    pub fn import_batch_report(&mut self, records: &[ImportRecord]) -> StoreResult<ImportSummary> {
        let mut next = self.products.clone();
        let mut known: HashSet<String> = next.iter().map(|p| p.barcode.clone()).collect();
        let mut summary = ImportSummary {
            total: records.len(),
            ..ImportSummary::default()
        };

        for (row, record) in records.iter().enumerate() {
            let product = match record.to_product() {
                Ok(product) => product,
                Err(e) => {
                    warn!("Skipping import row {}: {e}", row + 1);
                    summary.errors.push(format!("row {}: {e}", row + 1));
                    continue;
                }
            };
            if !known.insert(product.barcode.clone()) {
                warn!("Skipping import row {}: barcode {} already exists", row + 1, product.barcode);
                summary
                    .errors
                    .push(format!("row {}: barcode {} already exists", row + 1, product.barcode));
                continue;
            }
            next.push(product);
            summary.imported += 1;
        }

        if summary.imported > 0 {
            self.commit(next)?;
        }

        info!("Imported {} of {} records", summary.imported, summary.total);
        Ok(summary)
    }

    pub fn stats(&self) -> ProductStats {
        ProductStats::from_products(&self.products, self.low_stock_threshold)
    }

    /// Removes every product and persists the empty list.
    pub fn clear_all(&mut self) -> StoreResult<usize> {
        let cleared = self.products.len();
        self.commit(Vec::new())?;
        info!("Cleared {cleared} products");
        Ok(cleared)
    }

    fn position(&self, barcode: &str) -> Option<usize> {
        let barcode = barcode.trim();
        self.products.iter().position(|p| p.barcode == barcode)
    }

    fn modify<F>(&mut self, barcode: &str, change: F) -> StoreResult<Product>
    where
        F: FnOnce(&mut Product),
    {
        let index = self
            .position(barcode)
            .ok_or_else(|| StoreError::NotFound(barcode.to_string()))?;

        let mut next = self.products.clone();
        change(&mut next[index]);
        let updated = next[index].clone();
        self.commit(next)?;
        Ok(updated)
    }

    fn commit(&mut self, next: Vec<Product>) -> StoreResult<()> {
        let json = serde_json::to_string(&next)?;
        self.slot.write(&json)?;
        self.products = next;
        Ok(())
    }
}

/// Applies `factor` to a product's price; fails if the result is no longer
/// a valid price.
fn adjusted_price(product: &Product, factor: f64) -> StoreResult<f64> {
    validate_price(round_to_cents(product.price * factor)).map_err(|_| {
        StoreError::invalid(format!(
            "adjusting the price of {} would leave it out of range",
            product.barcode
        ))
    })
}

fn price_factor(percent: f64) -> StoreResult<f64> {
    if !percent.is_finite() {
        return Err(StoreError::invalid("percentage must be a finite number"));
    }
    if percent < -100.0 {
        return Err(StoreError::invalid(format!(
            "percentage {percent} would make prices negative"
        )));
    }
    Ok(1.0 + percent / 100.0)
}

fn dedupe_by_barcode(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    let total = products.len();
    let unique: Vec<Product> = products
        .into_iter()
        .filter(|p| seen.insert(p.barcode.clone()))
        .collect();
    if unique.len() != total {
        warn!("Dropped {} stored products with repeated barcodes", total - unique.len());
    }
    unique
}
