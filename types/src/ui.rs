//! View-facing state: status banner, engine lifecycle, rendered tables

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// Status banner severity
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Error,
    Warning,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Success,
        Severity::Error,
        Severity::Warning,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    /// CSS class of the alert box
    pub fn alert_class(self) -> String {
        format!("alert-{}", self.as_str())
    }
}

/// Status banner
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Status {
    pub message: String,
    pub severity: Severity,
    pub visible: bool,
    /// Changes every time a status is shown; auto-hide timers carry it
    pub token: u64,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            message: String::new(),
            severity: Severity::Info,
            visible: false,
            token: 0,
        }
    }
}

/// Engine lifecycle as seen by the UI
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum BindingState {
    Uninitialized,
    Ready,
    Failed(String),
    Closed,
}

/// Result rows rendered to display strings
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ResultTableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Row count line, e.g. "3 rows"
    pub footer: String,
}

/// Everything a front end needs to draw the playground
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ViewSnapshot {
    pub engine: BindingState,
    pub status: Status,
    pub sql: String,
    pub file_loaded: bool,
    pub executing: bool,
    pub run_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Present only while the result section is visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultTableView>,
}
