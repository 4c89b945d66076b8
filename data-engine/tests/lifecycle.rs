//! Binding and playground lifecycle against a recording backend

mod common;

use ahiru_engine::{
    Binding, BindingState, CsvFile, EngineError, Playground, PlaygroundConfig, Severity,
    TableNaming,
};
use common::{MockBackend, MockConfig};
use futures::executor::block_on;
use std::cell::RefCell;
use std::rc::Rc;

fn playground() -> (Playground<MockBackend>, MockConfig) {
    let mock = MockConfig::default();
    let pg = Playground::new(mock.clone(), PlaygroundConfig::default());
    (pg, mock)
}

fn csv(name: &str, body: &str) -> CsvFile {
    CsvFile::new(name, body.as_bytes().to_vec())
}

#[test]
fn start_reports_ready_and_asks_for_hide() {
    let (pg, mock) = playground();
    let request = block_on(pg.start()).expect("ready status hides itself");

    let snap = pg.snapshot();
    assert_eq!(snap.engine, BindingState::Ready);
    assert_eq!(snap.status.severity, Severity::Success);
    assert_eq!(request.token, snap.status.token);
    assert_eq!(request.delay_ms, 2000);
    assert_eq!(mock.calls.instantiated.get(), 1);
    assert_eq!(mock.calls.connected.get(), 1);
    assert!(!snap.run_enabled);
}

#[test]
fn mount_twice_initializes_once() {
    let (pg, mock) = playground();
    block_on(pg.start());
    block_on(pg.binding().mount());
    assert_eq!(mock.calls.instantiated.get(), 1);
}

#[test]
fn concurrent_mount_reports_settled_state() {
    let mock = MockConfig::default();
    let binding = Binding::<MockBackend>::new(mock.clone(), TableNaming::default());
    let gate = mock.calls.hold_instantiate();

    let (first, second, _) = block_on(async {
        futures::join!(binding.mount(), binding.mount(), async {
            gate.send(()).ok();
        })
    });

    assert_eq!(first, BindingState::Ready);
    assert_eq!(second, BindingState::Ready);
    assert_eq!(mock.calls.instantiated.get(), 1);
}

#[test]
fn failed_initialization_is_terminal() {
    let (pg, mock) = playground();
    *mock.calls.fail_instantiate.borrow_mut() = Some("worker script 404".to_string());

    assert!(block_on(pg.start()).is_none());
    let snap = pg.snapshot();
    assert_eq!(
        snap.engine,
        BindingState::Failed("worker script 404".to_string())
    );
    assert_eq!(snap.status.severity, Severity::Error);
    assert!(snap.status.message.contains("worker script 404"));

    // No retry: the failure sticks even once the engine could start
    *mock.calls.fail_instantiate.borrow_mut() = None;
    block_on(pg.start());
    assert_eq!(mock.calls.instantiated.get(), 0);

    block_on(pg.select_file(&csv("a.csv", "x\n1\n")));
    assert_eq!(pg.snapshot().status.severity, Severity::Warning);
    assert_eq!(mock.calls.engine_calls(), 0);
}

#[test]
fn file_before_ready_warns_and_skips_engine() {
    let (pg, mock) = playground();
    let request = block_on(pg.select_file(&csv("a.csv", "x\n1\n")));

    assert!(request.is_none());
    let snap = pg.snapshot();
    assert_eq!(snap.status.severity, Severity::Warning);
    assert!(!snap.file_loaded);
    assert_eq!(mock.calls.engine_calls(), 0);
}

#[test]
fn load_registers_then_drops_and_creates() {
    let (pg, mock) = playground();
    block_on(pg.start());
    block_on(pg.select_file(&csv("Sales 2024.csv", "x\n1\n2\n"))).expect("loaded");

    assert_eq!(
        *mock.calls.registered.borrow(),
        vec![("Sales 2024.csv".to_string(), 6)]
    );
    let queries = mock.calls.queries.borrow();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0], r#"DROP TABLE IF EXISTS "Sales_2024""#);
    assert_eq!(
        queries[1],
        r#"CREATE TABLE "Sales_2024" AS SELECT * FROM read_csv_auto('Sales 2024.csv')"#
    );

    let snap = pg.snapshot();
    assert!(snap.file_loaded);
    assert!(snap.run_enabled);
    assert_eq!(snap.table_name.as_deref(), Some("Sales_2024"));
    assert_eq!(snap.sql, r#"SELECT * FROM "Sales_2024" LIMIT 10"#);
}

#[test]
fn fixed_naming_always_targets_data() {
    let mock = MockConfig::default();
    let config = PlaygroundConfig {
        table_naming: TableNaming::Fixed {
            name: "data".to_string(),
        },
        ..PlaygroundConfig::default()
    };
    let pg = Playground::<MockBackend>::new(mock.clone(), config);
    assert_eq!(pg.snapshot().sql, r#"SELECT * FROM "data" LIMIT 10"#);

    block_on(pg.start());
    block_on(pg.select_file(&csv("whatever.csv", "x\n1\n")));
    assert_eq!(pg.snapshot().table_name.as_deref(), Some("data"));
    assert!(mock.calls.queries.borrow()[1].starts_with(r#"CREATE TABLE "data" AS"#));
}

#[test]
fn blank_query_never_reaches_engine() {
    let (pg, mock) = playground();
    block_on(pg.start());
    block_on(pg.select_file(&csv("a.csv", "x\n1\n")));
    let before = mock.calls.query_count();

    for blank in ["", "   ", "\n\t  \n"] {
        pg.set_sql(blank);
        assert!(block_on(pg.run_query()).is_none());
        let snap = pg.snapshot();
        assert_eq!(snap.status.severity, Severity::Warning);
        assert!(!snap.executing);
    }
    assert_eq!(mock.calls.query_count(), before);
}

#[test]
fn query_text_is_sent_verbatim() {
    let (pg, mock) = playground();
    block_on(pg.start());
    block_on(pg.select_file(&csv("a.csv", "x\n1\n")));

    pg.set_sql("  SELECT 42 AS answer ;\n");
    block_on(pg.run_query()).expect("non-empty result hides its status");
    assert_eq!(
        mock.calls.queries.borrow().last().map(String::as_str),
        Some("  SELECT 42 AS answer ;\n")
    );
    assert_eq!(pg.rows().len(), 1);
    assert!(pg.results_html().is_some());
}

#[test]
fn query_error_surfaces_engine_message() {
    let (pg, mock) = playground();
    block_on(pg.start());
    block_on(pg.select_file(&csv("a.csv", "x\n1\n")));

    *mock.calls.fail_next_query.borrow_mut() =
        Some("Catalog Error: Table with name nonexistent_table does not exist!".to_string());
    pg.set_sql("SELECT * FROM nonexistent_table");
    assert!(block_on(pg.run_query()).is_none());

    let snap = pg.snapshot();
    assert_eq!(snap.status.severity, Severity::Error);
    assert!(snap.status.message.contains("nonexistent_table"));
    assert!(snap.run_enabled);
    assert!(!snap.executing);
}

#[test]
fn teardown_closes_exactly_the_created_instance_once() {
    let (pg, mock) = playground();
    block_on(pg.start());

    block_on(pg.shutdown()).unwrap();
    block_on(pg.shutdown()).unwrap();

    assert_eq!(*mock.calls.closed_connections.borrow(), vec![1]);
    assert_eq!(*mock.calls.terminated.borrow(), vec![1]);
    assert_eq!(pg.snapshot().engine, BindingState::Closed);
}

#[test]
fn nothing_reaches_engine_after_teardown() {
    let (pg, mock) = playground();
    block_on(pg.start());
    block_on(pg.select_file(&csv("a.csv", "x\n1\n")));
    block_on(pg.shutdown()).unwrap();
    let before = mock.calls.engine_calls();

    block_on(pg.select_file(&csv("b.csv", "y\n2\n")));
    pg.set_sql("SELECT 1");
    block_on(pg.run_query());

    assert_eq!(mock.calls.engine_calls(), before);
    assert_eq!(
        block_on(pg.binding().execute_query("SELECT 1")),
        Err(EngineError::NotInitialized)
    );
}

#[test]
fn teardown_before_mount_prevents_initialization() {
    let (pg, mock) = playground();
    block_on(pg.shutdown()).unwrap();
    block_on(pg.start());

    assert_eq!(mock.calls.instantiated.get(), 0);
    assert_eq!(pg.snapshot().engine, BindingState::Closed);
}

#[test]
fn overlapping_calls_get_busy() {
    let mock = MockConfig::default();
    let binding = Binding::<MockBackend>::new(mock.clone(), TableNaming::default());
    assert_eq!(block_on(binding.mount()), BindingState::Ready);

    let gate = mock.calls.hold_next_query();
    let file = csv("a.csv", "x\n1\n");

    let (loaded, second) = block_on(async {
        futures::join!(binding.load_csv(&file), async {
            // The load is parked on its first query and still owns the slot
            let second = binding.execute_query("SELECT 1").await;
            gate.send(()).ok();
            second
        })
    });

    assert_eq!(second, Err(EngineError::Busy));
    assert_eq!(loaded.unwrap().name, "a");
    // Only the load's two statements ran
    assert_eq!(mock.calls.query_count(), 2);
}

#[test]
fn teardown_waits_for_in_flight_query() {
    let mock = MockConfig::default();
    let binding = Binding::<MockBackend>::new(mock.clone(), TableNaming::default());
    block_on(binding.mount());

    let gate = mock.calls.hold_next_query();
    let (query, closed) = block_on(async {
        futures::join!(binding.execute_query("SELECT 1"), async {
            gate.send(()).ok();
            binding.teardown().await
        })
    });

    assert!(query.is_ok());
    assert!(closed.is_ok());
    assert_eq!(*mock.calls.terminated.borrow(), vec![1]);
}

#[test]
fn stale_hide_request_keeps_newer_status() {
    let (pg, _mock) = playground();
    let ready = block_on(pg.start()).unwrap();
    let loaded = block_on(pg.select_file(&csv("a.csv", "x\n1\n"))).unwrap();

    assert!(!pg.hide_status(ready.token));
    assert!(pg.snapshot().status.visible);
    assert!(pg.hide_status(loaded.token));
    assert!(!pg.snapshot().status.visible);
}

#[test]
fn listener_sees_in_progress_status() {
    let (pg, _mock) = playground();
    let pg = Rc::new(pg);
    let seen = Rc::new(RefCell::new(Vec::new()));
    {
        let seen = Rc::clone(&seen);
        let weak = Rc::downgrade(&pg);
        pg.set_listener(move || {
            if let Some(pg) = weak.upgrade() {
                seen.borrow_mut().push(pg.snapshot().status.message);
            }
        });
    }
    block_on(pg.start());
    assert_eq!(
        *seen.borrow(),
        vec!["Initializing DuckDB...".to_string(), "DuckDB initialization completed.".to_string()]
    );
}
