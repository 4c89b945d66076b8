//! Ahiru engine - DuckDB-backed CSV playground
//!
//! Loads a CSV file into an embedded DuckDB and runs ad-hoc SQL against it.
//! In the browser the engine is DuckDB-WASM; elsewhere the native `duckdb`
//! crate stands in, which is what the test suite drives.

pub mod adapter;
pub mod backend;
pub mod binding;
pub mod error;
pub mod naming;
pub mod playground;
pub mod render;
pub mod view;

#[cfg(target_arch = "wasm32")]
pub mod dom;

// Re-export types
pub use ahiru_types::*;

pub use adapter::{EngineAdapter, FileSource};
pub use backend::{Column, ColumnarResult, EngineBackend, EngineConnection};
pub use binding::Binding;
pub use error::{EngineError, Result};
pub use playground::{HideRequest, Playground};
pub use view::ViewState;

#[cfg(not(target_arch = "wasm32"))]
pub use backend::native::{NativeConfig, NativeDuckDb};
#[cfg(target_arch = "wasm32")]
pub use backend::wasm::WasmDuckDb;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Initialize the engine module
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(log::Level::Debug).ok();

    log::info!("Ahiru engine loaded");
}
