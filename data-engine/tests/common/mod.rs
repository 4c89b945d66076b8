//! Recording in-memory backend for lifecycle tests

#![allow(dead_code)]

use ahiru_engine::{Column, ColumnarResult, EngineBackend, EngineConnection, EngineError, Result};
use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Everything the engine was asked to do
#[derive(Default)]
pub struct Calls {
    pub instantiated: Cell<u32>,
    pub connected: Cell<u32>,
    pub registered: RefCell<Vec<(String, usize)>>,
    pub queries: RefCell<Vec<String>>,
    pub closed_connections: RefCell<Vec<u32>>,
    pub terminated: RefCell<Vec<u32>>,

    pub fail_instantiate: RefCell<Option<String>>,
    pub fail_next_query: RefCell<Option<String>>,
    pub next_result: RefCell<Option<ColumnarResult>>,
    /// When set, the next query waits for this before answering
    pub gate: RefCell<Option<oneshot::Receiver<()>>>,
    /// When set, instantiation waits for this
    pub init_gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl Calls {
    pub fn query_count(&self) -> usize {
        self.queries.borrow().len()
    }

    pub fn engine_calls(&self) -> usize {
        self.query_count() + self.registered.borrow().len()
    }

    pub fn hold_next_query(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }

    pub fn hold_instantiate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.init_gate.borrow_mut() = Some(rx);
        tx
    }
}

#[derive(Clone, Default)]
pub struct MockConfig {
    pub calls: Rc<Calls>,
}

pub struct MockBackend {
    id: u32,
    calls: Rc<Calls>,
}

pub struct MockConnection {
    id: u32,
    calls: Rc<Calls>,
}

pub fn one_column(name: &str, values: Vec<serde_json::Value>) -> ColumnarResult {
    ColumnarResult::new(vec![Column {
        name: name.to_string(),
        values,
    }])
}

#[async_trait(?Send)]
impl EngineBackend for MockBackend {
    type Config = MockConfig;
    type Connection = MockConnection;

    async fn instantiate(config: &MockConfig) -> Result<Self> {
        let calls = Rc::clone(&config.calls);
        let gate = calls.init_gate.borrow_mut().take();
        if let Some(gate) = gate {
            gate.await.ok();
        }
        if let Some(reason) = calls.fail_instantiate.borrow().clone() {
            return Err(EngineError::Initialization(reason));
        }
        let id = calls.instantiated.get() + 1;
        calls.instantiated.set(id);
        Ok(Self { id, calls })
    }

    async fn connect(&self) -> Result<MockConnection> {
        self.calls.connected.set(self.calls.connected.get() + 1);
        Ok(MockConnection {
            id: self.id,
            calls: Rc::clone(&self.calls),
        })
    }

    async fn register_file_buffer(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        self.calls
            .registered
            .borrow_mut()
            .push((name.to_string(), bytes.len()));
        Ok(())
    }

    async fn terminate(self) -> Result<()> {
        self.calls.terminated.borrow_mut().push(self.id);
        Ok(())
    }
}

#[async_trait(?Send)]
impl EngineConnection for MockConnection {
    async fn query(&self, sql: &str) -> Result<ColumnarResult> {
        self.calls.queries.borrow_mut().push(sql.to_string());
        let gate = self.calls.gate.borrow_mut().take();
        if let Some(gate) = gate {
            gate.await.ok();
        }
        if let Some(reason) = self.calls.fail_next_query.borrow_mut().take() {
            return Err(EngineError::Engine(reason));
        }
        let result = self.calls.next_result.borrow_mut().take();
        Ok(result.unwrap_or_else(|| one_column("x", vec![json!(1)])))
    }

    async fn close(self) -> Result<()> {
        self.calls.closed_connections.borrow_mut().push(self.id);
        Ok(())
    }
}
