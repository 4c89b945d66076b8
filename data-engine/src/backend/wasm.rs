//! DuckDB-WASM bindings
//!
//! Thin `wasm-bindgen` imports of `@duckdb/duckdb-wasm`: bundle selection,
//! the worker-backed `AsyncDuckDB`, its connections and the Arrow tables
//! they return.

use super::{decimal_value, number_value, Column, ColumnarResult, EngineBackend, EngineConnection};
use crate::error::{EngineError, Result};
use ahiru_types::{Bundle, BundleSet};
use async_trait::async_trait;
use js_sys::{Array, Function, Object, Reflect, Uint32Array, Uint8Array};
use log::{debug, info};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen(module = "@duckdb/duckdb-wasm")]
extern "C" {
    #[wasm_bindgen(js_name = selectBundle, catch)]
    async fn select_bundle(bundles: &JsValue) -> std::result::Result<JsValue, JsValue>;

    type ConsoleLogger;

    #[wasm_bindgen(constructor)]
    fn new() -> ConsoleLogger;

    #[wasm_bindgen(js_name = AsyncDuckDB)]
    type AsyncDuckDb;

    #[wasm_bindgen(constructor, js_class = "AsyncDuckDB")]
    fn new(logger: &ConsoleLogger, worker: &web_sys::Worker) -> AsyncDuckDb;

    #[wasm_bindgen(method, catch)]
    async fn instantiate(
        this: &AsyncDuckDb,
        main_module: &str,
    ) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    async fn connect(this: &AsyncDuckDb) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = registerFileBuffer)]
    async fn register_file_buffer(
        this: &AsyncDuckDb,
        name: &str,
        buffer: Uint8Array,
    ) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    async fn terminate(this: &AsyncDuckDb) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = AsyncDuckDBConnection)]
    type AsyncDuckDbConnection;

    #[wasm_bindgen(method, catch)]
    async fn query(this: &AsyncDuckDbConnection, sql: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    async fn close(this: &AsyncDuckDbConnection) -> std::result::Result<JsValue, JsValue>;
}

// Arrow tables are only ever received, never constructed.
#[wasm_bindgen]
extern "C" {
    type ArrowTable;

    #[wasm_bindgen(method, getter, js_name = numRows)]
    fn num_rows(this: &ArrowTable) -> u32;

    #[wasm_bindgen(method, getter)]
    fn schema(this: &ArrowTable) -> ArrowSchema;

    #[wasm_bindgen(method, js_name = getChildAt)]
    fn get_child_at(this: &ArrowTable, index: u32) -> Option<ArrowVector>;

    type ArrowSchema;

    #[wasm_bindgen(method, getter)]
    fn fields(this: &ArrowSchema) -> js_sys::Array;

    type ArrowField;

    #[wasm_bindgen(method, getter)]
    fn name(this: &ArrowField) -> String;

    #[wasm_bindgen(method, getter, js_name = type)]
    fn data_type(this: &ArrowField) -> JsValue;

    type ArrowVector;

    #[wasm_bindgen(method)]
    fn get(this: &ArrowVector, index: u32) -> JsValue;

    #[wasm_bindgen(js_name = String)]
    fn js_string(value: &JsValue) -> String;
}

pub struct WasmDuckDb {
    db: AsyncDuckDb,
    worker: web_sys::Worker,
}

pub struct WasmConnection {
    conn: AsyncDuckDbConnection,
}

fn bundle_object(bundle: &Bundle) -> std::result::Result<JsValue, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &"mainModule".into(), &bundle.main_module.as_str().into())?;
    Reflect::set(&obj, &"mainWorker".into(), &bundle.main_worker.as_str().into())?;
    Ok(obj.into())
}

fn bundles_object(bundles: &BundleSet) -> std::result::Result<JsValue, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &"mvp".into(), &bundle_object(&bundles.mvp)?)?;
    if let Some(eh) = &bundles.eh {
        Reflect::set(&obj, &"eh".into(), &bundle_object(eh)?)?;
    }
    Ok(obj.into())
}

fn string_field(obj: &JsValue, key: &str) -> Result<String> {
    Reflect::get(obj, &key.into())
        .ok()
        .and_then(|v| v.as_string())
        .ok_or_else(|| EngineError::Initialization(format!("selected bundle has no {key}")))
}

fn init_error(value: JsValue) -> EngineError {
    EngineError::Initialization(js_error_text(&value))
}

#[async_trait(?Send)]
impl EngineBackend for WasmDuckDb {
    type Config = BundleSet;
    type Connection = WasmConnection;

    async fn instantiate(config: &BundleSet) -> Result<Self> {
        let bundles = bundles_object(config).map_err(init_error)?;
        let bundle = select_bundle(&bundles).await.map_err(init_error)?;
        let main_module = string_field(&bundle, "mainModule")?;
        let main_worker = string_field(&bundle, "mainWorker")?;
        debug!("selected bundle {}", main_module);

        let worker = web_sys::Worker::new(&main_worker).map_err(init_error)?;
        let logger = ConsoleLogger::new();
        let db = AsyncDuckDb::new(&logger, &worker);
        if let Err(e) = db.instantiate(&main_module).await {
            worker.terminate();
            return Err(init_error(e));
        }
        info!("DuckDB-WASM instantiated");
        Ok(Self { db, worker })
    }

    async fn connect(&self) -> Result<WasmConnection> {
        let conn = self.db.connect().await.map_err(init_error)?;
        Ok(WasmConnection {
            conn: conn.unchecked_into(),
        })
    }

    async fn register_file_buffer(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let buffer = Uint8Array::from(bytes.as_slice());
        self.db.register_file_buffer(name, buffer).await?;
        Ok(())
    }

    async fn terminate(self) -> Result<()> {
        let result = self.db.terminate().await;
        self.worker.terminate();
        result?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl EngineConnection for WasmConnection {
    async fn query(&self, sql: &str) -> Result<ColumnarResult> {
        let table: ArrowTable = self.conn.query(sql).await?.unchecked_into();
        let num_rows = table.num_rows();
        let fields = table.schema().fields();

        let mut columns = Vec::with_capacity(fields.length() as usize);
        for (index, field) in fields.iter().enumerate() {
            let field: ArrowField = field.unchecked_into();
            let scale = decimal_scale(&field.data_type());
            let name = field.name();
            let values = match table.get_child_at(index as u32) {
                Some(vector) => (0..num_rows)
                    .map(|row| cell_to_json(&vector.get(row), scale))
                    .collect(),
                None => Vec::new(),
            };
            columns.push(Column { name, values });
        }
        Ok(ColumnarResult::new(columns))
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Text of a thrown JS value, as `${error}` would print it.
pub fn js_error_text(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.to_string());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

/// Scale of a Decimal field type, 0 for every other type.
fn decimal_scale(data_type: &JsValue) -> u32 {
    Reflect::get(data_type, &"scale".into())
        .ok()
        .and_then(|v| v.as_f64())
        .map(|s| s as u32)
        .unwrap_or(0)
}

/// Convert an Arrow cell to JSON. BIGINT columns arrive as JS `BigInt`.
pub fn js_to_json(value: &JsValue) -> Value {
    cell_to_json(value, 0)
}

/// Convert an Arrow cell whose column has decimal `scale`.
///
/// DECIMAL and HUGEINT arrive as apache-arrow `BN` values, which are
/// `Uint32Array`s of little-endian words. LIST vectors and STRUCT/MAP rows
/// expose `toJSON`; other iterables become arrays.
pub fn cell_to_json(value: &JsValue, scale: u32) -> Value {
    if value.is_null() || value.is_undefined() {
        return Value::Null;
    }
    if let Some(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Some(n) = value.as_f64() {
        return number_value(n);
    }
    if let Some(s) = value.as_string() {
        return Value::String(s);
    }
    if value.is_bigint() {
        let text = value
            .clone()
            .unchecked_into::<js_sys::BigInt>()
            .to_string(10)
            .map(String::from)
            .unwrap_or_default();
        return match text.parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(text),
        };
    }
    if let Some(words) = value.dyn_ref::<Uint32Array>() {
        if let Some(decimal) = decimal_value(&words.to_vec(), scale) {
            return decimal;
        }
        return Value::String(js_string(value));
    }
    if let Some(bytes) = value.dyn_ref::<Uint8Array>() {
        return Value::Array(bytes.to_vec().into_iter().map(Value::from).collect());
    }
    if !value.is_object() {
        return Value::String(js_string(value));
    }
    // Vector, StructRow and MapRow; Date gives its ISO text
    if let Ok(to_json) = Reflect::get(value, &"toJSON".into()) {
        if let Some(to_json) = to_json.dyn_ref::<Function>() {
            return match to_json.call0(value) {
                Ok(plain) => cell_to_json(&plain, 0),
                Err(e) => Value::String(js_error_text(&e)),
            };
        }
    }
    if Array::is_array(value) {
        return Value::Array(Array::from(value).iter().map(|v| cell_to_json(&v, 0)).collect());
    }
    if let Ok(Some(iter)) = js_sys::try_iter(value) {
        return Value::Array(
            iter.filter_map(|item| item.ok())
                .map(|v| cell_to_json(&v, 0))
                .collect(),
        );
    }
    let entries = Object::entries(value.unchecked_ref::<Object>());
    let mut object = serde_json::Map::new();
    for entry in entries.iter() {
        let entry: Array = entry.unchecked_into();
        let key = entry.get(0).as_string().unwrap_or_else(|| js_string(&entry.get(0)));
        object.insert(key, cell_to_json(&entry.get(1), 0));
    }
    Value::Object(object)
}
