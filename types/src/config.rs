//! Playground configuration, passed in from JS as a plain object

use crate::data::DEFAULT_TABLE_NAME;
use crate::messages::Locale;
use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// Top-level configuration
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct PlaygroundConfig {
    /// How loaded CSV files are named inside the engine
    #[serde(default)]
    pub table_naming: TableNaming,
    /// Delay before success statuses hide themselves
    #[serde(default = "default_status_hide_delay_ms")]
    pub status_hide_delay_ms: u32,
    /// LIMIT used in the query prefilled after a load
    #[serde(default = "default_prefill_limit")]
    pub prefill_limit: u32,
    /// Status message language
    #[serde(default)]
    pub locale: Locale,
    /// DuckDB-WASM bundles (browser only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundles: Option<BundleSet>,
}

fn default_status_hide_delay_ms() -> u32 {
    2000
}
fn default_prefill_limit() -> u32 {
    10
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            table_naming: TableNaming::default(),
            status_hide_delay_ms: 2000,
            prefill_limit: 10,
            locale: Locale::default(),
            bundles: None,
        }
    }
}

/// Table naming strategy for loaded files
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "type")]
pub enum TableNaming {
    /// Every file replaces one fixed table
    #[serde(rename = "fixed")]
    Fixed {
        #[serde(default = "default_table_name")]
        name: String,
    },
    /// Table named after the file stem
    #[serde(rename = "file_name")]
    FromFileName,
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

impl Default for TableNaming {
    fn default() -> Self {
        Self::FromFileName
    }
}

/// One compiled variant of the engine
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Bundle {
    /// URL of the `.wasm` module
    pub main_module: String,
    /// URL of the worker script
    pub main_worker: String,
}

/// Bundle variants the browser picks from
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct BundleSet {
    /// Baseline build
    pub mvp: Bundle,
    /// Build using wasm exception handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eh: Option<Bundle>,
}
