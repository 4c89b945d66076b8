//! Browser-side tests
//! Run with: wasm-pack test --headless --firefox data-engine

#![cfg(target_arch = "wasm32")]

use ahiru_engine::backend::wasm::{cell_to_json, js_to_json};
use ahiru_engine::dom::{BrowserFile, PlaygroundHandle};
use ahiru_engine::render;
use ahiru_engine::*;
use serde_json::json;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
async fn browser_file_reads_contents() {
    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(&b"a,b\n1,2\n"[..]));
    let file = web_sys::File::new_with_u8_array_sequence(&parts, "tiny.csv").unwrap();
    let source = BrowserFile(file);

    assert_eq!(source.name(), "tiny.csv");
    assert_eq!(source.read_bytes().await.unwrap(), b"a,b\n1,2\n".to_vec());
}

#[wasm_bindgen_test]
fn engine_errors_cross_as_error_info() {
    let value: JsValue = EngineError::Busy.into();
    let info: ErrorInfo = serde_wasm_bindgen::from_value(value).unwrap();
    assert_eq!(info.code, ErrorCode::Busy);
    assert_eq!(info.message, "another load or query is still running");
}

#[wasm_bindgen_test]
fn handle_requires_bundles() {
    assert!(PlaygroundHandle::new(PlaygroundConfig::default()).is_err());
}

#[wasm_bindgen_test]
fn results_render_escaped() {
    let rows: Vec<Row> = vec![vec![("note", json!("<b>bold</b>")), ("n", json!(null))]
        .into_iter()
        .collect()];
    let table = render::build_table(&rows, Locale::Ja).unwrap();
    let html = render::to_html(&table);

    assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
    assert_eq!(table.footer, "1 行");
    assert_eq!(table.rows[0][1], "");
}

#[wasm_bindgen_test]
fn view_flow_without_engine() {
    let mut view = ViewState::new(&PlaygroundConfig::default());
    assert!(!view.run_enabled());

    view.load_succeeded(&LoadedTable {
        name: "people".to_string(),
        file_name: "people.csv".to_string(),
    });
    assert!(view.run_enabled());
    assert_eq!(
        view.begin_run().as_deref(),
        Some(r#"SELECT * FROM "people" LIMIT 10"#)
    );
    assert!(!view.run_enabled());
}

#[wasm_bindgen_test]
fn arrow_numbers_render_like_js() {
    assert_eq!(js_to_json(&JsValue::from_f64(36.0)), json!(36));
    assert_eq!(render::cell_text(Some(&js_to_json(&JsValue::from_f64(36.0)))), "36");
    assert_eq!(js_to_json(&JsValue::from_f64(2.5)), json!(2.5));
    assert_eq!(js_to_json(&JsValue::from(js_sys::BigInt::from(42i64))), json!(42));
    assert_eq!(js_to_json(&JsValue::NULL), json!(null));
}

#[wasm_bindgen_test]
fn decimal_words_render_exactly() {
    // SUM over an integer column comes back as a 128-bit BN
    let sum = js_sys::Uint32Array::from(&[24u32, 0, 0, 0][..]);
    assert_eq!(js_to_json(&sum), json!(24));
    assert_eq!(render::cell_text(Some(&js_to_json(&sum))), "24");

    let price = js_sys::Uint32Array::from(&[150u32, 0, 0, 0][..]);
    assert_eq!(cell_to_json(&price, 2), json!("1.50"));

    let minus_one = js_sys::Uint32Array::from(&[u32::MAX; 4][..]);
    assert_eq!(js_to_json(&minus_one), json!(-1));
}

#[wasm_bindgen_test]
fn iterables_become_arrays() {
    let list = js_sys::Set::new(&JsValue::UNDEFINED);
    list.add(&JsValue::from_f64(1.0));
    list.add(&JsValue::from_f64(2.0));
    assert_eq!(js_to_json(&list), json!([1, 2]));

    let nested = js_sys::Array::of2(&js_sys::Array::of1(&JsValue::from_f64(1.0)), &js_sys::Array::new());
    assert_eq!(js_to_json(&nested), json!([[1], []]));
}

#[wasm_bindgen_test]
fn rows_with_to_json_become_objects() {
    let row = js_sys::Object::new();
    let to_json = js_sys::Function::new_no_args("return { x: 1, y: 'z', n: null };");
    js_sys::Reflect::set(&row, &"toJSON".into(), &to_json).unwrap();
    assert_eq!(js_to_json(&row), json!({"x": 1, "y": "z", "n": null}));

    let date = js_sys::Date::new(&JsValue::from_str("2024-03-01T00:00:00Z"));
    assert_eq!(js_to_json(&date), json!("2024-03-01T00:00:00.000Z"));
}

#[wasm_bindgen_test]
fn blobs_become_byte_arrays() {
    let blob = js_sys::Uint8Array::from(&[0u8, 255][..]);
    assert_eq!(js_to_json(&blob), json!([0, 255]));
}
