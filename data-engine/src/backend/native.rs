//! DuckDB through the native `duckdb` crate
//!
//! Used off the browser (tests, native hosts). Registered file buffers are
//! written to a private temporary directory that every connection searches
//! for relative file names, standing in for DuckDB-WASM's virtual filesystem.

use super::{number_value, Column, ColumnarResult, EngineBackend, EngineConnection};
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value as DuckValue, ValueRef};
use duckdb::Connection;
use log::debug;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

#[derive(Clone, Debug, Default)]
pub struct NativeConfig;

pub struct NativeDuckDb {
    db: Connection,
    files: TempDir,
}

pub struct NativeConnection {
    conn: Connection,
}

#[async_trait(?Send)]
impl EngineBackend for NativeDuckDb {
    type Config = NativeConfig;
    type Connection = NativeConnection;

    async fn instantiate(_config: &NativeConfig) -> Result<Self> {
        let files = tempfile::tempdir().map_err(|e| EngineError::Initialization(e.to_string()))?;
        let db = Connection::open_in_memory()
            .map_err(|e| EngineError::Initialization(e.to_string()))?;
        debug!("native DuckDB instantiated, files in {}", files.path().display());
        Ok(Self { db, files })
    }

    async fn connect(&self) -> Result<NativeConnection> {
        let conn = self.db.try_clone()?;
        let dir = self.files.path().to_string_lossy();
        conn.execute_batch(&format!(
            "SET file_search_path = '{}'",
            dir.replace('\'', "''")
        ))?;
        Ok(NativeConnection { conn })
    }

    async fn register_file_buffer(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let file_name = Path::new(name)
            .file_name()
            .filter(|n| n.len() == name.len())
            .ok_or_else(|| EngineError::Engine(format!("invalid file name: {name}")))?;
        let path = self.files.path().join(file_name);
        std::fs::write(&path, &bytes).map_err(|e| EngineError::Engine(e.to_string()))?;
        debug!("registered {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    async fn terminate(self) -> Result<()> {
        self.db.close().map_err(|(_, e)| EngineError::from(e))?;
        self.files
            .close()
            .map_err(|e| EngineError::Engine(e.to_string()))
    }
}

#[async_trait(?Send)]
impl EngineConnection for NativeConnection {
    async fn query(&self, sql: &str) -> Result<ColumnarResult> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        // Column names are only readable once `rows` releases the statement.
        let mut columns: Vec<Vec<Value>> = Vec::new();
        while let Some(row) = rows.next()? {
            for i in 0.. {
                match row.get_ref(i) {
                    Ok(value) => {
                        if columns.len() <= i {
                            columns.push(Vec::new());
                        }
                        columns[i].push(value_to_json(value));
                    }
                    Err(_) => break,
                }
            }
        }
        drop(rows);

        let names = stmt.column_names();
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column {
                name,
                values: columns.get_mut(i).map(std::mem::take).unwrap_or_default(),
            })
            .collect();
        Ok(ColumnarResult::new(columns))
    }

    async fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| EngineError::from(e))
    }
}

/// Whole seconds and the nanosecond remainder, keeping full precision.
fn split_seconds(unit: TimeUnit, value: i64) -> (i64, u32) {
    let per_second = match unit {
        TimeUnit::Second => return (value, 0),
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    };
    let nanos_per_tick = 1_000_000_000 / per_second;
    (
        value.div_euclid(per_second),
        (value.rem_euclid(per_second) * nanos_per_tick) as u32,
    )
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 || n == -1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Interval text as DuckDB prints it: `1 year 2 months 3 days 01:00:00`.
fn interval_text(months: i32, days: i32, nanos: i64) -> String {
    let mut parts = Vec::new();
    let (years, months) = (months / 12, months % 12);
    if years != 0 {
        parts.push(plural(years as i64, "year"));
    }
    if months != 0 {
        parts.push(plural(months as i64, "month"));
    }
    if days != 0 {
        parts.push(plural(days as i64, "day"));
    }
    if nanos != 0 || parts.is_empty() {
        let micros = nanos / 1_000;
        let sign = if micros < 0 { "-" } else { "" };
        let micros = micros.unsigned_abs();
        let secs = micros / 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        if micros % 1_000_000 != 0 {
            time.push_str(&format!(".{:06}", micros % 1_000_000));
        }
        parts.push(time);
    }
    parts.join(" ")
}

/// Map keys become object keys; non-text keys use their rendered text.
fn key_text(key: &DuckValue) -> String {
    match owned_to_json(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Convert a DuckDB cell to the JSON value the UI renders.
fn value_to_json(value: ValueRef<'_>) -> Value {
    owned_to_json(&DuckValue::from(value))
}

fn owned_to_json(value: &DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(*b),
        DuckValue::TinyInt(i) => Value::Number((*i).into()),
        DuckValue::SmallInt(i) => Value::Number((*i).into()),
        DuckValue::Int(i) => Value::Number((*i).into()),
        DuckValue::BigInt(i) => Value::Number((*i).into()),
        DuckValue::HugeInt(i) => match i64::try_from(*i) {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(i.to_string()),
        },
        DuckValue::UTinyInt(i) => Value::Number((*i).into()),
        DuckValue::USmallInt(i) => Value::Number((*i).into()),
        DuckValue::UInt(i) => Value::Number((*i).into()),
        DuckValue::UBigInt(i) => Value::Number((*i).into()),
        DuckValue::Float(f) => number_value(*f as f64),
        DuckValue::Double(f) => number_value(*f),
        DuckValue::Decimal(d) => Value::String(d.to_string()),
        DuckValue::Text(s) => Value::String(s.clone()),
        DuckValue::Enum(s) => Value::String(s.clone()),
        DuckValue::Blob(b) => Value::Array(b.iter().map(|&x| Value::Number(x.into())).collect()),
        DuckValue::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + 719_163)
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),
        DuckValue::Timestamp(unit, v) => {
            let (secs, nanos) = split_seconds(*unit, *v);
            DateTime::from_timestamp(secs, nanos)
                .map(|dt| Value::String(dt.naive_utc().to_string()))
                .unwrap_or(Value::Null)
        }
        DuckValue::Time64(unit, v) => {
            let (secs, nanos) = split_seconds(*unit, *v);
            u32::try_from(secs)
                .ok()
                .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
                .map(|t| Value::String(t.to_string()))
                .unwrap_or(Value::Null)
        }
        DuckValue::Interval {
            months,
            days,
            nanos,
        } => Value::String(interval_text(*months, *days, *nanos)),
        DuckValue::List(items) | DuckValue::Array(items) => {
            Value::Array(items.iter().map(owned_to_json).collect())
        }
        DuckValue::Struct(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), owned_to_json(v)))
                .collect(),
        ),
        DuckValue::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (key_text(k), owned_to_json(v)))
                .collect(),
        ),
        DuckValue::Union(inner) => owned_to_json(inner),
        #[allow(unreachable_patterns)]
        other => Value::String(format!("{:?}", other)),
    }
}
