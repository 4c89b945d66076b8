//! Table naming and the SQL used to materialize a CSV file

use ahiru_types::{TableNaming, DEFAULT_TABLE_NAME};

/// Derive the target table for `file_name` under `naming`.
pub fn table_name_for(naming: &TableNaming, file_name: &str) -> String {
    match naming {
        TableNaming::Fixed { name } => sanitize_identifier(name),
        TableNaming::FromFileName => sanitize_identifier(file_stem(file_name)),
    }
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

/// Map arbitrary text to `[A-Za-z0-9_]+` not starting with a digit.
pub fn sanitize_identifier(raw: &str) -> String {
    let mut ident: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.chars().all(|c| c == '_') {
        return DEFAULT_TABLE_NAME.to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(table))
}

pub fn create_from_csv_sql(table: &str, file_name: &str) -> String {
    format!(
        "CREATE TABLE {} AS SELECT * FROM read_csv_auto({})",
        quote_identifier(table),
        quote_literal(file_name)
    )
}

/// Query put in the editor after a successful load. The name is quoted
/// because a sanitized stem can still be a keyword (`order`, `select`).
pub fn prefill_query(table: &str, limit: u32) -> String {
    format!("SELECT * FROM {} LIMIT {}", quote_identifier(table), limit)
}
