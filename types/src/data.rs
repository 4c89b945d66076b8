//! Data crossing the engine boundary: loaded tables and result rows

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tsify::Tsify;

/// Default table name when a file name yields no usable identifier
pub const DEFAULT_TABLE_NAME: &str = "data";

/// A table created from a CSV file
#[derive(Tsify, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct LoadedTable {
    /// Table name inside the engine
    pub name: String,
    /// Name the file was registered under
    pub file_name: String,
}

/// One result row: column name to scalar value, in column order.
///
/// Null cells are stored as `Value::Null`, never omitted.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Append a column. A repeated name replaces the earlier value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// An in-memory CSV file: its name and complete contents
#[derive(Clone, Debug, PartialEq)]
pub struct CsvFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CsvFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_keeps_column_order() {
        let row: Row = vec![("z", json!(1)), ("a", json!(2)), ("m", Value::Null)]
            .into_iter()
            .collect();
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(row.get("m"), Some(&Value::Null));
    }

    #[test]
    fn row_serializes_as_plain_object() {
        let row: Row = vec![("b", json!("x")), ("a", json!(2))].into_iter().collect();
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"b":"x","a":2}"#);
    }
}
