//! Binding Layer: owns the adapter for one UI lifetime
//!
//! `Uninitialized -> Ready | Failed` happens once, on [`Binding::mount`].
//! [`Binding::teardown`] moves to `Closed` and closes the adapter this
//! binding created, exactly once. Loads and queries share a single slot:
//! a second caller while one is in flight gets [`EngineError::Busy`].

use crate::adapter::{EngineAdapter, FileSource};
use crate::backend::EngineBackend;
use crate::error::{EngineError, Result};
use ahiru_types::{BindingState, LoadedTable, Row, TableNaming};
use futures::lock::Mutex;
use log::{error, info};
use std::cell::{Cell, RefCell};

/// Engine lifecycle for one UI lifetime
pub struct Binding<B: EngineBackend> {
    /// Backend settings handed to the adapter on mount
    config: B::Config,
    /// How loaded files are named
    naming: TableNaming,
    /// Current lifecycle state
    state: RefCell<BindingState>,
    /// Set by the first `mount`
    mounted: Cell<bool>,
    /// The adapter, held for the duration of each operation
    slot: Mutex<Option<EngineAdapter<B>>>,
}

impl<B: EngineBackend> Binding<B> {
    /// Create an unmounted binding. Nothing touches the engine yet.
    pub fn new(config: B::Config, naming: TableNaming) -> Self {
        Self {
            config,
            naming,
            state: RefCell::new(BindingState::Uninitialized),
            mounted: Cell::new(false),
            slot: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BindingState {
        self.state.borrow().clone()
    }

    /// `true` once mounted successfully and not yet torn down.
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), BindingState::Ready)
    }

    fn set_state(&self, state: BindingState) {
        *self.state.borrow_mut() = state;
    }

    /// Construct the adapter and initialize it. Later calls wait for the
    /// first one to settle and report its outcome.
    pub async fn mount(&self) -> BindingState {
        if self.state() == BindingState::Closed {
            return self.state();
        }
        if self.mounted.replace(true) {
            let _settled = self.slot.lock().await;
            return self.state();
        }
        let mut slot = self.slot.lock().await;
        let adapter = slot.insert(EngineAdapter::new(self.config.clone(), self.naming.clone()));
        let next = match adapter.initialize().await {
            Ok(()) => {
                info!("binding ready");
                BindingState::Ready
            }
            Err(e) => {
                error!("DuckDB initialization error: {}", e);
                BindingState::Failed(e.to_string())
            }
        };
        // A teardown issued mid-initialization wins.
        if self.state() != BindingState::Closed {
            self.set_state(next);
        }
        self.state()
    }

    /// Load `file` into its table. Fails with `NotInitialized` unless
    /// ready and with `Busy` while another operation runs.
    pub async fn load_csv(&self, file: &dyn FileSource) -> Result<LoadedTable> {
        if !self.is_ready() {
            return Err(EngineError::NotInitialized);
        }
        let slot = self.slot.try_lock().ok_or(EngineError::Busy)?;
        let adapter = slot.as_ref().ok_or(EngineError::NotInitialized)?;
        adapter.load_csv(file).await
    }

    /// Run `sql` as typed. Same guards as [`Binding::load_csv`].
    pub async fn execute_query(&self, sql: &str) -> Result<Vec<Row>> {
        if !self.is_ready() {
            return Err(EngineError::NotInitialized);
        }
        let slot = self.slot.try_lock().ok_or(EngineError::Busy)?;
        let adapter = slot.as_ref().ok_or(EngineError::NotInitialized)?;
        adapter.execute_query(sql).await
    }

    /// Close the adapter created by `mount`, waiting for any in-flight call.
    pub async fn teardown(&self) -> Result<()> {
        self.set_state(BindingState::Closed);
        let adapter = self.slot.lock().await.take();
        match adapter {
            Some(mut adapter) => {
                info!("binding teardown");
                adapter.close().await
            }
            None => Ok(()),
        }
    }
}
