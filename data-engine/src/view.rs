//! View state machine
//!
//! Pure interaction state: no engine access. Each transition that should
//! auto-hide its status returns the status token; the caller schedules
//! [`ViewState::hide_status`] with it after the configured delay.

use crate::naming;
use crate::render;
use ahiru_types::{
    BindingState, LoadedTable, Locale, Message, PlaygroundConfig, Row, Severity, Status,
    ViewSnapshot,
};

#[derive(Clone, Debug)]
pub struct ViewState {
    locale: Locale,
    prefill_limit: u32,
    engine: BindingState,
    status: Status,
    sql: String,
    file_loaded: bool,
    executing: bool,
    table_name: Option<String>,
    results: Vec<Row>,
    results_visible: bool,
}

impl ViewState {
    pub fn new(config: &PlaygroundConfig) -> Self {
        // No file yet: fixed names apply, file-derived naming falls back to `data`
        let initial_table = naming::table_name_for(&config.table_naming, "");
        Self {
            locale: config.locale,
            prefill_limit: config.prefill_limit,
            engine: BindingState::Uninitialized,
            status: Status::default(),
            sql: naming::prefill_query(&initial_table, config.prefill_limit),
            file_loaded: false,
            executing: false,
            table_name: None,
            results: Vec::new(),
            results_visible: false,
        }
    }

    fn show(&mut self, message: Message, severity: Severity) -> u64 {
        self.status = Status {
            message: self.locale.text(&message),
            severity,
            visible: true,
            token: self.status.token + 1,
        };
        self.status.token
    }

    /// Hide the status if `token` still names the one on screen.
    pub fn hide_status(&mut self, token: u64) -> bool {
        if self.status.token != token || !self.status.visible {
            return false;
        }
        self.status.visible = false;
        true
    }

    pub fn engine_starting(&mut self) {
        self.engine = BindingState::Uninitialized;
        self.show(Message::Initializing, Severity::Info);
    }

    pub fn engine_ready(&mut self) -> u64 {
        self.engine = BindingState::Ready;
        self.show(Message::Initialized, Severity::Success)
    }

    pub fn engine_failed(&mut self, detail: &str) {
        self.engine = BindingState::Failed(detail.to_string());
        self.show(
            Message::InitFailed {
                detail: detail.to_string(),
            },
            Severity::Error,
        );
    }

    pub fn engine_closed(&mut self) {
        self.engine = BindingState::Closed;
    }

    /// A file was picked before the engine finished starting.
    pub fn file_rejected_not_ready(&mut self) {
        self.show(Message::NotReady, Severity::Warning);
    }

    pub fn load_started(&mut self, file_name: &str) {
        self.show(
            Message::Loading {
                file: file_name.to_string(),
            },
            Severity::Info,
        );
    }

    pub fn load_succeeded(&mut self, table: &LoadedTable) -> u64 {
        self.file_loaded = true;
        self.sql = naming::prefill_query(&table.name, self.prefill_limit);
        self.table_name = Some(table.name.clone());
        self.results_visible = false;
        self.show(
            Message::Loaded {
                file: table.file_name.clone(),
            },
            Severity::Success,
        )
    }

    pub fn load_failed(&mut self, detail: &str) {
        self.show(
            Message::LoadFailed {
                detail: detail.to_string(),
            },
            Severity::Error,
        );
    }

    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }

    /// Start a run. Returns the SQL to execute, or `None` when nothing
    /// should reach the engine (blank text, or a run already in flight).
    pub fn begin_run(&mut self) -> Option<String> {
        if self.executing {
            return None;
        }
        if self.sql.trim().is_empty() {
            self.show(Message::EmptyQuery, Severity::Warning);
            return None;
        }
        self.executing = true;
        self.show(Message::Running, Severity::Info);
        Some(self.sql.clone())
    }

    /// Returns a token to auto-hide only for a non-empty result.
    pub fn run_succeeded(&mut self, rows: Vec<Row>) -> Option<u64> {
        self.executing = false;
        if rows.is_empty() {
            self.results_visible = false;
            self.show(Message::NoResults, Severity::Info);
            return None;
        }
        self.results = rows;
        self.results_visible = true;
        Some(self.show(Message::QuerySucceeded, Severity::Success))
    }

    pub fn run_failed(&mut self, detail: &str) {
        self.executing = false;
        self.show(
            Message::QueryFailed {
                detail: detail.to_string(),
            },
            Severity::Error,
        );
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    pub fn executing(&self) -> bool {
        self.executing
    }

    pub fn run_enabled(&self) -> bool {
        self.file_loaded && !self.executing
    }

    pub fn results_visible(&self) -> bool {
        self.results_visible && !self.results.is_empty()
    }

    pub fn results(&self) -> &[Row] {
        &self.results
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let results = if self.results_visible() {
            render::build_table(&self.results, self.locale)
        } else {
            None
        };
        ViewSnapshot {
            engine: self.engine.clone(),
            status: self.status.clone(),
            sql: self.sql.clone(),
            file_loaded: self.file_loaded,
            executing: self.executing,
            run_enabled: self.run_enabled(),
            table_name: self.table_name.clone(),
            results,
        }
    }
}
