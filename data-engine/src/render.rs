//! Result table rendering
//!
//! Headers come from the first row only; SQL results are homogeneous, so
//! every later row is looked up by those names. A missing or null cell
//! renders as an empty string.

use ahiru_types::{Locale, ResultTableView, Row};
use serde_json::Value;

/// Display text of one cell.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `None` when there is nothing to show.
pub fn build_table(rows: &[Row], locale: Locale) -> Option<ResultTableView> {
    let first = rows.first()?;
    let headers: Vec<String> = first.columns().map(str::to_string).collect();
    let body = rows
        .iter()
        .map(|row| headers.iter().map(|h| cell_text(row.get(h))).collect())
        .collect();
    Some(ResultTableView {
        headers,
        rows: body,
        footer: locale.row_count(rows.len()),
    })
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn to_html(table: &ResultTableView) -> String {
    let mut html = String::from(r#"<table class="table table-zebra table-sm"><thead><tr>"#);
    for header in &table.headers {
        html.push_str(r#"<th class="font-bold">"#);
        html.push_str(&escape_html(header));
        html.push_str("</th>");
    }
    html.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(&escape_html(cell));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}
