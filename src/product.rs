//! Product data model and field validation.
//!
//! This module defines the records exchanged with the [`ProductStore`]:
//! the stored [`Product`], the [`NewProduct`] create request, the raw
//! [`ImportRecord`] produced by file importers, and the [`ProductStats`]
//! summary. The validation helpers here are the only place where prices,
//! stock counts and barcodes are checked, so every entry point (Rust API,
//! FFI, import) applies the same rules.
//!
//! [`ProductStore`]: crate::product_store::ProductStore

use serde::{Deserialize, Serialize};

use crate::store_error::{StoreError, StoreResult};

/// Name given to products created without one.
pub const DEFAULT_PRODUCT_NAME: &str = "Sin nombre";

fn default_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

/// A product as stored in the durable slot.
///
/// The barcode is the identity key: no two stored products share one.
///
/// # Serialization
///
/// ```rust
/// use shop_inventory_core::product::Product;
///
/// let product: Product = serde_json::from_str(r#"{"barcode":"779","price":5.5}"#)?;
/// assert_eq!(product.name, "Sin nombre");
/// assert_eq!(product.stock, None);
///
/// let json = serde_json::to_string(&product)?;
/// assert_eq!(json, r#"{"barcode":"779","name":"Sin nombre","price":5.5}"#);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique textual identifier, never empty.
    pub barcode: String,

    /// Display name; [`DEFAULT_PRODUCT_NAME`] when none was given.
    #[serde(default = "default_name")]
    pub name: String,

    /// Non-negative amount, currency-agnostic. Displayed with two decimals.
    pub price: f64,

    /// Units on hand. `None` means stock is not tracked for this product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl Product {
    /// Stock used in arithmetic: untracked counts as zero.
    pub fn stock_or_zero(&self) -> u32 {
        self.stock.unwrap_or(0)
    }

    /// Price rendered with the two-decimal display convention.
    pub fn formatted_price(&self) -> String {
        format!("{:.2}", self.price)
    }
}

/// A create request as received from a host application.
///
/// Fields are deliberately loose (`name` optional, `stock` signed) so that
/// validation can report [`StoreError::InvalidField`] instead of failing at
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub barcode: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl NewProduct {
    pub fn new(barcode: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            barcode: barcode.into(),
            name: Some(name.into()),
            price,
            stock: None,
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Validates every field and builds the product to store.
    ///
    /// Uniqueness is not checked here; that needs the collection.
    pub fn validate(&self) -> StoreResult<Product> {
        Ok(Product {
            barcode: validate_barcode(&self.barcode)?,
            name: normalize_name(self.name.as_deref()),
            price: validate_price(self.price)?,
            stock: self.stock.map(validate_stock).transpose()?,
        })
    }
}

/// A candidate row coming from an import file, still as raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
}

impl ImportRecord {
    pub fn new(
        barcode: impl Into<String>,
        name: impl Into<String>,
        price: impl Into<String>,
        stock: impl Into<String>,
    ) -> Self {
        Self {
            barcode: barcode.into(),
            name: name.into(),
            price: price.into(),
            stock: stock.into(),
        }
    }

    /// Parses and validates the raw text into a product.
    pub fn to_product(&self) -> StoreResult<Product> {
        let price = self
            .price
            .trim()
            .parse::<f64>()
            .map_err(|_| StoreError::invalid(format!("price '{}' is not a number", self.price)))?;

        let stock = match self.stock.trim() {
            "" => None,
            raw => {
                let parsed = raw
                    .parse::<i64>()
                    .map_err(|_| StoreError::invalid(format!("stock '{}' is not an integer", raw)))?;
                Some(validate_stock(parsed)?)
            }
        };

        Ok(Product {
            barcode: validate_barcode(&self.barcode)?,
            name: normalize_name(Some(&self.name)),
            price: validate_price(price)?,
            stock,
        })
    }
}

/// Outcome of an import: rows added, rows seen, and why each skipped row
/// was dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

/// Inventory summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductStats {
    pub total_products: usize,
    pub total_stock: u64,
    pub total_value: f64,
    pub low_stock: usize,
}

impl ProductStats {
    /// Summarizes `products`; a product is low on stock when its stock
    /// (zero if untracked) is below `low_stock_threshold`. The total value
    /// saturates at `f64::MAX`.
    pub fn from_products(products: &[Product], low_stock_threshold: u32) -> Self {
        let total_stock = products.iter().map(|p| u64::from(p.stock_or_zero())).sum();
        let total_value = products
            .iter()
            .map(|p| p.price * f64::from(p.stock_or_zero()))
            .sum::<f64>()
            .min(f64::MAX);
        let low_stock = products
            .iter()
            .filter(|p| p.stock_or_zero() < low_stock_threshold)
            .count();

        Self {
            total_products: products.len(),
            total_stock,
            total_value: round_to_cents(total_value),
            low_stock,
        }
    }
}

pub fn validate_barcode(barcode: &str) -> StoreResult<String> {
    let trimmed = barcode.trim();
    if trimmed.is_empty() {
        return Err(StoreError::invalid("barcode must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub fn normalize_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => default_name(),
    }
}

pub fn validate_price(price: f64) -> StoreResult<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(StoreError::invalid(format!(
            "price must be a non-negative number, got {}",
            price
        )));
    }
    Ok(price)
}

pub fn validate_stock(stock: i64) -> StoreResult<u32> {
    u32::try_from(stock).map_err(|_| {
        StoreError::invalid(format!("stock must be a non-negative integer, got {}", stock))
    })
}

/// Rounds an amount to two decimals. Amounts too large to scale by 100 are
/// returned unchanged.
pub fn round_to_cents(amount: f64) -> f64 {
    let cents = amount * 100.0;
    if !cents.is_finite() {
        return amount;
    }
    cents.round() / 100.0
}
