//! Embedded engine client API
//!
//! The adapter talks to DuckDB only through these traits. In the browser
//! they are implemented over `@duckdb/duckdb-wasm`; elsewhere over the
//! native `duckdb` crate.

use crate::error::Result;
use ahiru_types::Row;
use async_trait::async_trait;
use serde_json::Value;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

/// A database handle: instantiated once, owns the virtual filesystem.
#[async_trait(?Send)]
pub trait EngineBackend: Sized {
    type Config: Clone;
    type Connection: EngineConnection;

    /// Pick a build, start it and wait until the module is loaded.
    async fn instantiate(config: &Self::Config) -> Result<Self>;

    async fn connect(&self) -> Result<Self::Connection>;

    /// Make `bytes` readable by SQL under `name`.
    async fn register_file_buffer(&self, name: &str, bytes: Vec<u8>) -> Result<()>;

    async fn terminate(self) -> Result<()>;
}

#[async_trait(?Send)]
pub trait EngineConnection: Sized {
    async fn query(&self, sql: &str) -> Result<ColumnarResult>;

    async fn close(self) -> Result<()>;
}

/// One named result column
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

/// Result set as returned by the engine, column by column
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnarResult {
    pub columns: Vec<Column>,
}

impl ColumnarResult {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn num_rows(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.len())
            .max()
            .unwrap_or(0)
    }

    /// Transpose into rows. Short columns are padded with nulls.
    pub fn into_rows(self) -> Vec<Row> {
        let num_rows = self.num_rows();
        let mut rows = vec![Row::new(); num_rows];
        for column in self.columns {
            let mut values = column.values.into_iter();
            for row in rows.iter_mut() {
                row.insert(column.name.clone(), values.next().unwrap_or(Value::Null));
            }
        }
        rows
    }
}

/// Largest integer a JS number holds exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// JSON for a floating point cell. Whole numbers become integers so they
/// render as `36`, not `36.0`. NaN and infinities have no JSON form.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::Number((n as i64).into());
    }
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// JSON for a DECIMAL or HUGEINT cell given as little-endian two's
/// complement 32-bit words (Arrow's decimal layout) and its scale.
///
/// Integers that fit in `i64` stay numbers; everything else becomes the
/// exact decimal text, e.g. `1.50`. `None` when the value is wider than
/// 128 bits.
pub fn decimal_value(words: &[u32], scale: u32) -> Option<Value> {
    let negative = words.last().is_some_and(|w| w & 0x8000_0000 != 0);
    let fill = if negative { u32::MAX } else { 0 };
    if words.iter().skip(4).any(|&w| w != fill) {
        return None;
    }
    let mut raw = [fill; 4];
    for (slot, &word) in raw.iter_mut().zip(words) {
        *slot = word;
    }
    let unscaled = raw
        .iter()
        .rev()
        .fold(0u128, |acc, &w| (acc << 32) | w as u128) as i128;

    if scale == 0 {
        return Some(match i64::try_from(unscaled) {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(unscaled.to_string()),
        });
    }
    let digits = format!("{:0>width$}", unscaled.unsigned_abs(), width = scale as usize + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - scale as usize);
    let sign = if unscaled < 0 { "-" } else { "" };
    Some(Value::String(format!("{sign}{int_part}.{frac_part}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::cell_text;
    use serde_json::json;

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(number_value(36.0), json!(36));
        assert_eq!(cell_text(Some(&number_value(36.0))), "36");
        assert_eq!(cell_text(Some(&number_value(-0.0))), "0");
        assert_eq!(cell_text(Some(&number_value(1_704_067_200_000.0))), "1704067200000");
    }

    #[test]
    fn fractions_and_huge_values_stay_floats() {
        assert_eq!(cell_text(Some(&number_value(2.5))), "2.5");
        assert_eq!(number_value(1e300), json!(1e300));
        assert_eq!(number_value(f64::NAN), Value::Null);
        assert_eq!(number_value(f64::INFINITY), Value::Null);
    }

    #[test]
    fn decimal_words_format_with_scale() {
        assert_eq!(decimal_value(&[24, 0, 0, 0], 0), Some(json!(24)));
        assert_eq!(decimal_value(&[150, 0, 0, 0], 2), Some(json!("1.50")));
        assert_eq!(decimal_value(&[5, 0, 0, 0], 3), Some(json!("0.005")));
        assert_eq!(decimal_value(&[u32::MAX; 4], 0), Some(json!(-1)));
        // -150 at scale 2
        assert_eq!(
            decimal_value(&[!149, u32::MAX, u32::MAX, u32::MAX], 2),
            Some(json!("-1.50"))
        );
    }

    #[test]
    fn hugeint_beyond_i64_is_text() {
        let max = [u32::MAX, u32::MAX, u32::MAX, 0x7FFF_FFFF];
        assert_eq!(
            decimal_value(&max, 0),
            Some(json!("170141183460469231731687303715884105727"))
        );
        assert_eq!(decimal_value(&[1, 0], 0), Some(json!(1)));
        assert_eq!(decimal_value(&[0, 0, 0, 0, 1, 0, 0, 0], 0), None);
    }

    #[test]
    fn transposes_columns_into_rows() {
        let result = ColumnarResult::new(vec![
            Column {
                name: "a".into(),
                values: vec![json!(1), json!(2)],
            },
            Column {
                name: "b".into(),
                values: vec![Value::Null, json!("x")],
            },
        ]);
        let rows = result.into_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(rows[0].get("b"), Some(&Value::Null));
        assert_eq!(rows[1].get("b"), Some(&json!("x")));
    }

    #[test]
    fn columns_without_values_mean_no_rows() {
        let result = ColumnarResult::new(vec![Column {
            name: "1".into(),
            values: vec![],
        }]);
        assert!(result.into_rows().is_empty());
    }
}
