//! Playground: runs view transitions against the binding
//!
//! These are the UI event handlers. Every failure is logged and turned
//! into an error status; none is returned to the caller.

use crate::adapter::FileSource;
use crate::backend::EngineBackend;
use crate::binding::Binding;
use crate::error::Result;
use crate::render;
use crate::view::ViewState;
use ahiru_types::{BindingState, PlaygroundConfig, Row, ViewSnapshot};
use log::error;
use std::cell::RefCell;
use std::rc::Rc;

/// Ask the front end to call [`Playground::hide_status`] later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HideRequest {
    pub token: u64,
    pub delay_ms: u32,
}

/// The playground behind one page or component
pub struct Playground<B: EngineBackend> {
    /// Settings the playground was created with
    config: PlaygroundConfig,
    /// Engine lifecycle and guarded operations
    binding: Binding<B>,
    /// What the UI shows
    view: RefCell<ViewState>,
    /// Notified after every view change
    listener: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<B: EngineBackend> Playground<B> {
    /// Create a playground. The engine starts on [`Playground::start`].
    pub fn new(backend_config: B::Config, config: PlaygroundConfig) -> Self {
        Self {
            binding: Binding::new(backend_config, config.table_naming.clone()),
            view: RefCell::new(ViewState::new(&config)),
            listener: RefCell::new(None),
            config,
        }
    }

    /// Called after every view change, with no borrow of the view held.
    pub fn set_listener(&self, listener: impl Fn() + 'static) {
        *self.listener.borrow_mut() = Some(Rc::new(listener));
    }

    fn update<R>(&self, change: impl FnOnce(&mut ViewState) -> R) -> R {
        let out = change(&mut self.view.borrow_mut());
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener();
        }
        out
    }

    /// Settings the playground was created with.
    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    /// The underlying engine binding.
    pub fn binding(&self) -> &Binding<B> {
        &self.binding
    }

    fn hide_later(&self, token: u64) -> HideRequest {
        HideRequest {
            token,
            delay_ms: self.config.status_hide_delay_ms,
        }
    }

    /// Mount the binding and report initialization in the status banner.
    pub async fn start(&self) -> Option<HideRequest> {
        self.update(|v| v.engine_starting());
        match self.binding.mount().await {
            BindingState::Ready => {
                let token = self.update(|v| v.engine_ready());
                Some(self.hide_later(token))
            }
            BindingState::Failed(reason) => {
                self.update(|v| v.engine_failed(&reason));
                None
            }
            BindingState::Closed => {
                self.update(|v| v.engine_closed());
                None
            }
            BindingState::Uninitialized => None,
        }
    }

    /// Load a picked file, or warn when the engine is not ready yet.
    pub async fn select_file(&self, file: &dyn FileSource) -> Option<HideRequest> {
        if !self.binding.is_ready() {
            self.update(|v| v.file_rejected_not_ready());
            return None;
        }
        let file_name = file.name();
        self.update(|v| v.load_started(&file_name));
        match self.binding.load_csv(file).await {
            Ok(table) => {
                let token = self.update(|v| v.load_succeeded(&table));
                Some(self.hide_later(token))
            }
            Err(e) => {
                error!("CSV load error: {}", e);
                self.update(|v| v.load_failed(&e.to_string()));
                None
            }
        }
    }

    /// Run the current SQL text. Blank text only shows a warning.
    pub async fn run_query(&self) -> Option<HideRequest> {
        let sql = self.update(|v| v.begin_run())?;
        match self.binding.execute_query(&sql).await {
            Ok(rows) => {
                let token = self.update(|v| v.run_succeeded(rows))?;
                Some(self.hide_later(token))
            }
            Err(e) => {
                error!("Query execution error: {}", e);
                self.update(|v| v.run_failed(&e.to_string()));
                None
            }
        }
    }

    /// Replace the SQL text without notifying the listener.
    pub fn set_sql(&self, sql: impl Into<String>) {
        self.view.borrow_mut().set_sql(sql);
    }

    /// Hide the status if `token` still names it.
    pub fn hide_status(&self, token: u64) -> bool {
        self.update(|v| v.hide_status(token))
    }

    /// Tear down the binding. Later handlers never reach the engine.
    pub async fn shutdown(&self) -> Result<()> {
        let result = self.binding.teardown().await;
        self.update(|v| v.engine_closed());
        if let Err(e) = &result {
            error!("DuckDB close error: {}", e);
        }
        result
    }

    /// Everything the UI needs to render.
    pub fn snapshot(&self) -> ViewSnapshot {
        self.view.borrow().snapshot()
    }

    /// Rows of the last non-empty result.
    pub fn rows(&self) -> Vec<Row> {
        self.view.borrow().results().to_vec()
    }

    /// Escaped HTML for the result section, when it is visible.
    pub fn results_html(&self) -> Option<String> {
        self.snapshot().results.as_ref().map(render::to_html)
    }
}
