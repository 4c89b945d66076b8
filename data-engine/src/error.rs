//! Engine error type

use ahiru_types::{ErrorCode, ErrorInfo};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("DuckDB not initialized")]
    NotInitialized,

    #[error("DuckDB already initialized")]
    AlreadyInitialized,

    #[error("another load or query is still running")]
    Busy,

    #[error("{0}")]
    Initialization(String),

    #[error("failed to read file: {0}")]
    FileRead(String),

    /// Engine rejection, text kept exactly as the engine reported it
    #[error("{0}")]
    Engine(String),
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::NotInitialized => ErrorCode::NotInitialized,
            EngineError::AlreadyInitialized => ErrorCode::AlreadyInitialized,
            EngineError::Busy => ErrorCode::Busy,
            EngineError::Initialization(_) => ErrorCode::InitializationFailed,
            EngineError::FileRead(_) => ErrorCode::FileRead,
            EngineError::Engine(_) => ErrorCode::Engine,
        }
    }

    pub fn to_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.code(), self.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<duckdb::Error> for EngineError {
    fn from(err: duckdb::Error) -> Self {
        EngineError::Engine(err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for EngineError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        EngineError::Engine(crate::backend::wasm::js_error_text(&value))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<EngineError> for wasm_bindgen::JsValue {
    fn from(err: EngineError) -> Self {
        serde_wasm_bindgen::to_value(&err.to_info())
            .unwrap_or_else(|_| wasm_bindgen::JsValue::from_str(&err.to_string()))
    }
}
