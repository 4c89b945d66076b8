//! Error payloads and the user-facing message catalog

use serde::{Deserialize, Serialize};
use tsify::Tsify;

/// Error information handed to JS callers
#[derive(Tsify, Serialize, Deserialize, Clone, Debug)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ErrorInfo {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Standard error codes
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum ErrorCode {
    /// Engine has not finished initializing
    NotInitialized,
    /// Engine was already initialized
    AlreadyInitialized,
    /// Another load or query is in flight
    Busy,
    /// Bundle selection, worker startup or module instantiation failed
    InitializationFailed,
    /// The input file could not be read
    FileRead,
    /// The engine rejected a statement
    Engine,
}

/// UI language
#[derive(Tsify, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

/// Every status line the playground can show
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Initializing,
    Initialized,
    InitFailed { detail: String },
    NotReady,
    Loading { file: String },
    Loaded { file: String },
    LoadFailed { detail: String },
    EmptyQuery,
    Running,
    NoResults,
    QuerySucceeded,
    QueryFailed { detail: String },
}

impl Locale {
    pub fn text(self, message: &Message) -> String {
        match self {
            Locale::En => english(message),
            Locale::Ja => japanese(message),
        }
    }

    /// Result footer, e.g. "1 row" / "3 rows"
    pub fn row_count(self, count: usize) -> String {
        match self {
            Locale::En if count == 1 => "1 row".to_string(),
            Locale::En => format!("{count} rows"),
            Locale::Ja => format!("{count} 行"),
        }
    }
}

fn english(message: &Message) -> String {
    match message {
        Message::Initializing => "Initializing DuckDB...".to_string(),
        Message::Initialized => "DuckDB initialization completed.".to_string(),
        Message::InitFailed { detail } => format!("Initialization error: {detail}"),
        Message::NotReady => "DuckDB is not yet initialized. Please wait...".to_string(),
        Message::Loading { file } => format!("Loading {file}..."),
        Message::Loaded { file } => format!("{file} loaded successfully."),
        Message::LoadFailed { detail } => format!("CSV load error: {detail}"),
        Message::EmptyQuery => "Please enter SQL.".to_string(),
        Message::Running => "Executing SQL...".to_string(),
        Message::NoResults => "No results found.".to_string(),
        Message::QuerySucceeded => "SQL executed successfully.".to_string(),
        Message::QueryFailed { detail } => format!("SQL error: {detail}"),
    }
}

fn japanese(message: &Message) -> String {
    match message {
        Message::Initializing => "DuckDBを初期化中...".to_string(),
        Message::Initialized => "DuckDBの初期化が完了しました".to_string(),
        Message::InitFailed { detail } => format!("初期化エラー: {detail}"),
        Message::NotReady => "DuckDBがまだ初期化されていません。少々お待ちください...".to_string(),
        Message::Loading { file } => format!("{file} を読み込み中..."),
        Message::Loaded { file } => format!("{file} の読み込みが完了しました"),
        Message::LoadFailed { detail } => format!("CSV の読み込みエラー: {detail}"),
        Message::EmptyQuery => "SQL クエリを入力してください".to_string(),
        Message::Running => "クエリを実行中...".to_string(),
        Message::NoResults => "結果が見つかりませんでした".to_string(),
        Message::QuerySucceeded => "クエリが正常に実行されました".to_string(),
        Message::QueryFailed { detail } => format!("クエリエラー: {detail}"),
    }
}
