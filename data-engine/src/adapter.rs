//! Engine Adapter: one DuckDB handle plus one open connection

use crate::backend::{EngineBackend, EngineConnection};
use crate::error::{EngineError, Result};
use crate::naming;
use ahiru_types::{CsvFile, LoadedTable, Row, TableNaming};
use async_trait::async_trait;
use log::{debug, info, warn};

/// Something the adapter can read a CSV file from.
#[async_trait(?Send)]
pub trait FileSource {
    fn name(&self) -> String;

    /// Whole file contents.
    async fn read_bytes(&self) -> Result<Vec<u8>>;
}

#[async_trait(?Send)]
impl FileSource for CsvFile {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// One engine handle and the single connection every call goes through
pub struct EngineAdapter<B: EngineBackend> {
    /// Backend settings used by `initialize`
    config: B::Config,
    /// How loaded files are named
    naming: TableNaming,
    /// Engine handle, present between `initialize` and `close`
    db: Option<B>,
    /// Open connection, closed before the handle is terminated
    conn: Option<B::Connection>,
}

impl<B: EngineBackend> EngineAdapter<B> {
    /// Create an adapter with no engine started yet.
    pub fn new(config: B::Config, naming: TableNaming) -> Self {
        Self {
            config,
            naming,
            db: None,
            conn: None,
        }
    }

    /// Backend settings this adapter was built with.
    pub fn config(&self) -> &B::Config {
        &self.config
    }

    /// `true` between a successful `initialize` and `close`.
    pub fn is_initialized(&self) -> bool {
        self.db.is_some() && self.conn.is_some()
    }

    /// Start the engine and open the connection every later call uses.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.db.is_some() {
            return Err(EngineError::AlreadyInitialized);
        }
        let db = B::instantiate(&self.config).await?;
        let conn = match db.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                if let Err(term) = db.terminate().await {
                    warn!("terminate after failed connect: {}", term);
                }
                return Err(e);
            }
        };
        self.db = Some(db);
        self.conn = Some(conn);
        info!("engine initialized");
        Ok(())
    }

    /// Register the file with the engine and materialize it as a table.
    pub async fn load_csv(&self, file: &dyn FileSource) -> Result<LoadedTable> {
        let (db, conn) = match (&self.db, &self.conn) {
            (Some(db), Some(conn)) => (db, conn),
            _ => return Err(EngineError::NotInitialized),
        };

        let file_name = file.name();
        let bytes = file.read_bytes().await?;
        db.register_file_buffer(&file_name, bytes).await?;

        let table = naming::table_name_for(&self.naming, &file_name);
        let drop_sql = naming::drop_table_sql(&table);
        debug!("{}", drop_sql);
        conn.query(&drop_sql).await?;
        let create_sql = naming::create_from_csv_sql(&table, &file_name);
        debug!("{}", create_sql);
        conn.query(&create_sql).await?;

        info!("loaded {} into table {}", file_name, table);
        Ok(LoadedTable {
            name: table,
            file_name,
        })
    }

    /// Run `sql` verbatim and return the result as rows.
    pub async fn execute_query(&self, sql: &str) -> Result<Vec<Row>> {
        let conn = self.conn.as_ref().ok_or(EngineError::NotInitialized)?;
        debug!("query: {}", sql);
        let result = conn.query(sql).await?;
        Ok(result.into_rows())
    }

    /// Close the connection, then terminate the handle. Safe to call twice.
    pub async fn close(&mut self) -> Result<()> {
        let mut first_err = None;
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close().await {
                first_err = Some(e);
            }
        }
        if let Some(db) = self.db.take() {
            if let Err(e) = db.terminate().await {
                first_err.get_or_insert(e);
            }
            info!("engine terminated");
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
