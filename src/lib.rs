//! # Shop Inventory Core
//!
//! A local product inventory library for retail shops, designed to be embedded
//! in web views, Flutter shells and desktop applications. The whole inventory
//! lives in a single LMDB key holding the product list as JSON.
//!
//! ## Features
//!
//! - **Barcode-keyed products**: barcodes are unique; names default to `"Sin nombre"`
//! - **Write-through persistence**: every mutation rewrites the slot before it
//!   becomes visible in memory
//! - **Search**: exact barcode lookup, case-insensitive name search, combined search
//! - **Bulk pricing**: multiplicative percentage adjustments, rounded to cents
//! - **CSV import/export**: partial-success imports that skip bad or duplicate rows
//! - **FFI-ready**: every operation is exposed as a C function exchanging JSON
//!
//! ## Quick Start
//!
//! ```no_run
//! use shop_inventory_core::config::StoreConfig;
//! use shop_inventory_core::product::NewProduct;
//! use shop_inventory_core::product_store::ProductStore;
//!
//! let mut store = ProductStore::open(&StoreConfig::new("shop"))?;
//! store.create(NewProduct::new("111", "Bib", 5.50))?;
//! store.bulk_adjust_price(10.0)?;
//! assert_eq!(store.find_by_name("bib").len(), 1);
//! # Ok::<(), shop_inventory_core::store_error::StoreError>(())
//! ```
//!
//! ## FFI Functions
//!
//! Every function returning `*const c_char` returns a JSON [`AppResponse`]
//! envelope such as `{"Ok":"..."}` or `{"NotFound":"..."}`, which the caller
//! releases with [`free_response`].
//!
//! - [`create_store`] / [`create_store_with_config`] - Open a store handle
//! - [`get_all`], [`get_by_barcode`], [`find_by_name`], [`search_products`] - Queries
//! - [`create_product`], [`update_price`], [`update_stock`], [`adjust_stock`],
//!   [`update_product`], [`delete_by_barcode`] - Single-product mutations
//! - [`bulk_adjust_price`] - Percentage change over every price
//! - [`import_records`], [`import_csv`], [`export_csv`] - Import/export
//! - [`get_stats`], [`clear_all_records`], [`reload_store`] - Maintenance
//! - [`close_store`] - Release the handle

pub mod config;
pub mod csv_io;
pub mod product;
pub mod product_store;
pub mod slot;
pub mod store_error;
mod app_response;

use crate::config::StoreConfig;
use crate::product::{ImportRecord, NewProduct};
use crate::product_store::ProductStore;
use crate::slot::LmdbSlot;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Mutex;
use log::{info, warn};
use serde_json::json;

pub use crate::app_response::AppResponse;

/// Store handle shared with FFI callers. The mutex serializes
/// load-modify-persist across host threads.
pub type InventoryHandle = Mutex<ProductStore<LmdbSlot>>;

/// Opens (or creates) the inventory named `name`, stored in `{name}.lmdb`.
///
/// # Returns
///
/// A pointer to the store handle, or a null pointer if the name is null,
/// not UTF-8, or the environment cannot be opened. Release it with
/// [`close_store`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use shop_inventory_core::create_store;
///
/// let name = CString::new("shop").unwrap();
/// let handle = create_store(name.as_ptr());
/// assert!(!handle.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char) -> *mut InventoryHandle {
    if name.is_null() {
        warn!("Null name pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    open_handle(&StoreConfig::new(name_str))
}

/// Opens a store from a JSON [`StoreConfig`], e.g.
/// `{"name":"shop","slot_key":"products","low_stock_threshold":3}`.
///
/// Returns a null pointer on invalid input or if the store cannot be opened.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store_with_config(config_ptr: *const c_char) -> *mut InventoryHandle {
    if config_ptr.is_null() {
        warn!("Null config pointer passed to create_store_with_config");
        return std::ptr::null_mut();
    }

    let config_str = match unsafe { CStr::from_ptr(config_ptr).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match serde_json::from_str::<StoreConfig>(config_str) {
        Ok(config) => open_handle(&config),
        Err(e) => {
            warn!("Invalid store config: {e}");
            std::ptr::null_mut()
        }
    }
}

fn open_handle(config: &StoreConfig) -> *mut InventoryHandle {
    info!("Opening inventory at: {}", config.storage_path().display());

    match ProductStore::open(config) {
        Ok(store) => {
            info!("Inventory opened with {} products", store.len());
            Box::into_raw(Box::new(Mutex::new(store)))
        }
        Err(e) => {
            warn!("Failed to open inventory: {e}");
            warn!("Attempted path: {}", config.storage_path().display());
            std::ptr::null_mut()
        }
    }
}

/// Returns every product, in insertion order, as a JSON array.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_all(state: *mut InventoryHandle) -> *const c_char {
    with_store(state, "get_all", |store| AppResponse::json(store.list()))
}

/// Exact barcode lookup.
///
/// # Returns
///
/// `Ok` with the product JSON, or `NotFound`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_by_barcode(state: *mut InventoryHandle, barcode: *const c_char) -> *const c_char {
    let barcode = match c_ptr_to_string(barcode, "barcode") {
        Ok(b) => b,
        Err(err) => return err,
    };

    with_store(state, "get_by_barcode", |store| match store.find_by_barcode(&barcode) {
        Some(product) => AppResponse::json(product),
        None => AppResponse::NotFound(format!("No product found with barcode: {barcode}")),
    })
}

/// Case-insensitive name search. Always `Ok` with a (possibly empty) array;
/// telling "one match" from "several" apart is up to the caller.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn find_by_name(state: *mut InventoryHandle, query: *const c_char) -> *const c_char {
    let query = match c_ptr_to_string(query, "query") {
        Ok(q) => q,
        Err(err) => return err,
    };

    with_store(state, "find_by_name", |store| AppResponse::json(&store.find_by_name(&query)))
}

/// Combined barcode/name search; a blank term returns every product.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_products(state: *mut InventoryHandle, term: *const c_char) -> *const c_char {
    let term = match c_ptr_to_string(term, "term") {
        Ok(t) => t,
        Err(err) => return err,
    };

    with_store(state, "search_products", |store| AppResponse::json(&store.search(&term)))
}

/// Creates a product from JSON.
///
/// # JSON Format
///
/// ```json
/// { "barcode": "7790001", "name": "Baby Bib", "price": 5.5, "stock": 3 }
/// ```
///
/// `name` and `stock` are optional.
///
/// # Returns
///
/// `Ok` with the stored product, `DuplicateBarcode`, `InvalidField`,
/// `PersistenceFailure`, or `SerializationError` for malformed JSON.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_product(state: *mut InventoryHandle, json_ptr: *const c_char) -> *const c_char {
    let new_product: NewProduct = match parse_json(json_ptr, "JSON") {
        Ok(p) => p,
        Err(err) => return err,
    };

    with_store(state, "create_product", |store| match store.create(new_product) {
        Ok(product) => AppResponse::json(&product),
        Err(e) => AppResponse::from(e),
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_price(state: *mut InventoryHandle, barcode: *const c_char, price: f64) -> *const c_char {
    let barcode = match c_ptr_to_string(barcode, "barcode") {
        Ok(b) => b,
        Err(err) => return err,
    };

    with_store(state, "update_price", |store| match store.update_price(&barcode, price) {
        Ok(product) => AppResponse::json(&product),
        Err(e) => AppResponse::from(e),
    })
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_stock(state: *mut InventoryHandle, barcode: *const c_char, stock: i64) -> *const c_char {
    let barcode = match c_ptr_to_string(barcode, "barcode") {
        Ok(b) => b,
        Err(err) => return err,
    };

    with_store(state, "update_stock", |store| match store.update_stock(&barcode, stock) {
        Ok(product) => AppResponse::json(&product),
        Err(e) => AppResponse::from(e),
    })
}

/// Adds `delta` (may be negative) to a product's stock; never goes below zero.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn adjust_stock(state: *mut InventoryHandle, barcode: *const c_char, delta: i64) -> *const c_char {
    let barcode = match c_ptr_to_string(barcode, "barcode") {
        Ok(b) => b,
        Err(err) => return err,
    };

    with_store(state, "adjust_stock", |store| match store.adjust_stock(&barcode, delta) {
        Ok(product) => AppResponse::json(&product),
        Err(e) => AppResponse::from(e),
    })
}

/// Replaces name, price and stock of the product identified by the JSON's
/// `barcode`. Same JSON shape as [`create_product`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn update_product(state: *mut InventoryHandle, json_ptr: *const c_char) -> *const c_char {
    let edit: NewProduct = match parse_json(json_ptr, "JSON") {
        Ok(p) => p,
        Err(err) => return err,
    };

    with_store(state, "update_product", |store| {
        match store.update_product(&edit.barcode, edit.name.as_deref(), edit.price, edit.stock) {
            Ok(product) => AppResponse::json(&product),
            Err(e) => AppResponse::from(e),
        }
    })
}

/// Multiplies every price by `1 + percent / 100`.
///
/// The host is expected to confirm this with the user first.
///
/// # Returns
///
/// `Ok` with `{"adjusted": n}`, or `InvalidField` for a non-finite
/// percentage or one below -100.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn bulk_adjust_price(state: *mut InventoryHandle, percent: f64) -> *const c_char {
    with_store(state, "bulk_adjust_price", |store| match store.bulk_adjust_price(percent) {
        Ok(adjusted) => AppResponse::json(&json!({ "adjusted": adjusted })),
        Err(e) => AppResponse::from(e),
    })
}

/// Deletes a product by barcode.
///
/// # Returns
///
/// `Ok` with the removed product, or `NotFound` if the barcode is not stored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_by_barcode(state: *mut InventoryHandle, barcode: *const c_char) -> *const c_char {
    let barcode = match c_ptr_to_string(barcode, "barcode") {
        Ok(b) => b,
        Err(err) => return err,
    };

    with_store(state, "delete_by_barcode", |store| match store.delete(&barcode) {
        Ok(product) => AppResponse::json(&product),
        Err(e) => AppResponse::from(e),
    })
}

/// Imports a JSON array of raw records:
/// `[{"barcode":"1","name":"Bib","price":"9.99","stock":"3"}]`.
///
/// Invalid and duplicate rows are skipped. Returns
/// `{"imported": added, "total": rows, "errors": ["row 2: ...", ...]}`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn import_records(state: *mut InventoryHandle, json_ptr: *const c_char) -> *const c_char {
    let records: Vec<ImportRecord> = match parse_json(json_ptr, "JSON") {
        Ok(r) => r,
        Err(err) => return err,
    };

    with_store(state, "import_records", |store| import_response(store, &records))
}

/// Imports CSV text (`barcode,name,price,stock`, header line skipped).
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn import_csv(state: *mut InventoryHandle, csv_ptr: *const c_char) -> *const c_char {
    let text = match c_ptr_to_string(csv_ptr, "CSV") {
        Ok(t) => t,
        Err(err) => return err,
    };
    let records = csv_io::parse_import(&text);

    with_store(state, "import_csv", |store| import_response(store, &records))
}

fn import_response(store: &mut ProductStore<LmdbSlot>, records: &[ImportRecord]) -> AppResponse {
    match store.import_batch_report(records) {
        Ok(summary) => AppResponse::json(&summary),
        Err(e) => AppResponse::from(e),
    }
}

/// Exports every product as CSV text, wrapped in an `Ok` response.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn export_csv(state: *mut InventoryHandle) -> *const c_char {
    with_store(state, "export_csv", |store| AppResponse::Ok(csv_io::export_csv(store.list())))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_stats(state: *mut InventoryHandle) -> *const c_char {
    with_store(state, "get_stats", |store| AppResponse::json(&store.stats()))
}

/// Removes every product. The store remains usable afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_all_records(state: *mut InventoryHandle) -> *const c_char {
    with_store(state, "clear_all_records", |store| match store.clear_all() {
        Ok(cleared) => AppResponse::success(format!("{cleared} products cleared")),
        Err(e) => AppResponse::from(e),
    })
}

/// Re-reads the slot, discarding the in-memory collection.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reload_store(state: *mut InventoryHandle) -> *const c_char {
    with_store(state, "reload_store", |store| AppResponse::json(store.load()))
}

/// Releases a handle obtained from [`create_store`]. The pointer must not be
/// used afterwards.
///
/// # Notes
///
/// The LMDB environment is closed when the handle is dropped; this function
/// is the explicit point where that happens, e.g. before a hot restart.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(state: *mut InventoryHandle) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    drop(unsafe { Box::from_raw(state) });
    info!("Inventory handle closed");
    response_to_c_string(&AppResponse::success("Store closed successfully"))
}

/// Frees a response string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr as *mut c_char) });
}

/// Locks the handle and runs `op` against the store.
fn with_store<F>(state: *mut InventoryHandle, fn_name: &str, op: F) -> *const c_char
where
    F: FnOnce(&mut ProductStore<LmdbSlot>) -> AppResponse,
{
    let handle = match unsafe { state.as_ref() } {
        Some(h) => h,
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {fn_name}"));
            return response_to_c_string(&error);
        }
    };

    let mut store = match handle.lock() {
        Ok(guard) => guard,
        Err(_) => {
            warn!("Inventory lock poisoned in {fn_name}");
            let error = AppResponse::DatabaseError("Inventory lock poisoned".to_string());
            return response_to_c_string(&error);
        }
    };

    let response = op(&mut store);
    response_to_c_string(&response)
}

fn parse_json<T: serde::de::DeserializeOwned>(ptr: *const c_char, field_name: &str) -> Result<T, *const c_char> {
    let json_str = c_ptr_to_string(ptr, field_name)?;
    serde_json::from_str(&json_str).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Serializes the response to JSON and hands ownership of the C string to
/// the caller. Returns a null pointer if serialization fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust `String`, or to a ready-made
/// `BadRequest` response for null pointers and invalid UTF-8.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
