//! Browser front ends
//!
//! [`mount_dom`] drives a static HTML page directly through `web-sys`.
//! [`PlaygroundHandle`] exposes the same playground to a framework-based
//! UI, which re-renders from [`ViewSnapshot`]s on every change.

use crate::adapter::FileSource;
use crate::backend::wasm::{js_error_text, WasmDuckDb};
use crate::error::{EngineError, Result};
use crate::playground::{HideRequest, Playground};
use crate::render;
use ahiru_types::{PlaygroundConfig, Severity, ViewSnapshot};
use async_trait::async_trait;
use js_sys::{Function, Promise, Uint8Array};
use log::{error, warn};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local, JsFuture};
use web_sys::{
    Document, Event, EventTarget, File, HtmlButtonElement, HtmlElement, HtmlInputElement,
    HtmlTextAreaElement,
};

type WasmPlayground = Playground<WasmDuckDb>;

/// A file picked in an `<input type="file">`
pub struct BrowserFile(pub File);

#[async_trait(?Send)]
impl FileSource for BrowserFile {
    fn name(&self) -> String {
        self.0.name()
    }

    async fn read_bytes(&self) -> Result<Vec<u8>> {
        let buffer = JsFuture::from(self.0.array_buffer())
            .await
            .map_err(|e| EngineError::FileRead(js_error_text(&e)))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

fn new_playground(config: PlaygroundConfig) -> std::result::Result<WasmPlayground, JsValue> {
    let bundles = config
        .bundles
        .clone()
        .ok_or_else(|| JsValue::from_str("config.bundles is required in the browser"))?;
    Ok(Playground::new(bundles, config))
}

/// Hide the status after the requested delay unless a newer one replaced it.
fn schedule_hide(playground: Rc<WasmPlayground>, request: Option<HideRequest>) {
    let Some(request) = request else {
        return;
    };
    let callback = Closure::once_into_js(move || {
        playground.hide_status(request.token);
    });
    let scheduled = web_sys::window().map(|w| {
        w.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            request.delay_ms as i32,
        )
    });
    if !matches!(scheduled, Some(Ok(_))) {
        warn!("could not schedule status auto-hide");
    }
}

// ============================================================================
// Plain DOM front end
// ============================================================================

struct DomUi {
    playground: Rc<WasmPlayground>,
    csv_input: HtmlInputElement,
    sql_input: HtmlTextAreaElement,
    execute_btn: HtmlButtonElement,
    status: HtmlElement,
    status_text: HtmlElement,
    results_section: HtmlElement,
    results: HtmlElement,
    result_count: HtmlElement,
}

fn element<T: JsCast>(document: &Document, id: &str) -> std::result::Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{id} has the wrong type")))
}

impl DomUi {
    fn render(&self) {
        let snap = self.playground.snapshot();

        let classes = self.status.class_list();
        for severity in Severity::ALL {
            classes.remove_1(&severity.alert_class()).ok();
        }
        classes.add_1(&snap.status.severity.alert_class()).ok();
        if snap.status.visible {
            classes.remove_1("hidden").ok();
        } else {
            classes.add_1("hidden").ok();
        }
        self.status_text.set_text_content(Some(&snap.status.message));

        self.execute_btn.set_disabled(!snap.run_enabled);
        if self.sql_input.value() != snap.sql {
            self.sql_input.set_value(&snap.sql);
        }

        match &snap.results {
            Some(table) => {
                self.results.set_inner_html(&render::to_html(table));
                self.result_count.set_text_content(Some(&table.footer));
                self.results_section.class_list().remove_1("hidden").ok();
            }
            None => {
                self.results_section.class_list().add_1("hidden").ok();
            }
        }
    }

    fn on_file_change(&self) {
        let Some(file) = self.csv_input.files().and_then(|files| files.get(0)) else {
            return;
        };
        let playground = Rc::clone(&self.playground);
        spawn_local(async move {
            let request = playground.select_file(&BrowserFile(file)).await;
            schedule_hide(playground, request);
        });
    }

    fn on_execute(&self) {
        self.playground.set_sql(self.sql_input.value());
        let playground = Rc::clone(&self.playground);
        spawn_local(async move {
            let request = playground.run_query().await;
            schedule_hide(playground, request);
        });
    }
}

fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> std::result::Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget(); // Listeners live as long as the page
    Ok(())
}

/// Wire the playground into the static page and start the engine.
#[wasm_bindgen(js_name = mountDom)]
pub fn mount_dom(config: PlaygroundConfig) -> std::result::Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("No document"))?;

    let ui = Rc::new(DomUi {
        playground: Rc::new(new_playground(config)?),
        csv_input: element(&document, "csvFile")?,
        sql_input: element(&document, "sqlQuery")?,
        execute_btn: element(&document, "executeBtn")?,
        status: element(&document, "status")?,
        status_text: element(&document, "statusText")?,
        results_section: element(&document, "resultsSection")?,
        results: element(&document, "results")?,
        result_count: element(&document, "resultCount")?,
    });

    let weak: Weak<DomUi> = Rc::downgrade(&ui);
    ui.playground.set_listener(move || {
        if let Some(ui) = weak.upgrade() {
            ui.render();
        }
    });

    let on_change = Rc::clone(&ui);
    listen(&ui.csv_input, "change", move |_| on_change.on_file_change())?;

    let on_click = Rc::clone(&ui);
    listen(&ui.execute_btn, "click", move |_| on_click.on_execute())?;

    let on_input = Rc::clone(&ui);
    listen(&ui.sql_input, "input", move |_| {
        on_input.playground.set_sql(on_input.sql_input.value())
    })?;

    let on_hide = Rc::clone(&ui.playground);
    listen(&window, "pagehide", move |_| {
        let playground = Rc::clone(&on_hide);
        spawn_local(async move {
            playground.shutdown().await.ok();
        });
    })?;

    ui.render();
    let playground = Rc::clone(&ui.playground);
    spawn_local(async move {
        let request = playground.start().await;
        schedule_hide(playground, request);
    });
    Ok(())
}

// ============================================================================
// Handle for framework-based UIs
// ============================================================================

/// Playground bound to one component lifetime
#[wasm_bindgen]
pub struct PlaygroundHandle {
    playground: Rc<WasmPlayground>,
    on_change: Rc<RefCell<Option<Function>>>,
}

#[wasm_bindgen]
impl PlaygroundHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(config: PlaygroundConfig) -> std::result::Result<PlaygroundHandle, JsValue> {
        let playground = Rc::new(new_playground(config)?);
        let on_change: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));

        let callback = Rc::clone(&on_change);
        playground.set_listener(move || {
            if let Some(f) = callback.borrow().as_ref() {
                if let Err(e) = f.call0(&JsValue::NULL) {
                    error!("onChange callback failed: {}", js_error_text(&e));
                }
            }
        });
        Ok(Self {
            playground,
            on_change,
        })
    }

    /// Called after every state change, including timed status hides.
    #[wasm_bindgen(js_name = setOnChange)]
    pub fn set_on_change(&self, callback: Option<Function>) {
        *self.on_change.borrow_mut() = callback;
    }

    /// Mount: initialize the engine.
    pub fn start(&self) -> Promise {
        let playground = Rc::clone(&self.playground);
        future_to_promise(async move {
            let request = playground.start().await;
            schedule_hide(playground, request);
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = loadFile)]
    pub fn load_file(&self, file: File) -> Promise {
        let playground = Rc::clone(&self.playground);
        future_to_promise(async move {
            let request = playground.select_file(&BrowserFile(file)).await;
            schedule_hide(playground, request);
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = setSql)]
    pub fn set_sql(&self, sql: String) {
        self.playground.set_sql(sql);
    }

    pub fn run(&self) -> Promise {
        let playground = Rc::clone(&self.playground);
        future_to_promise(async move {
            let request = playground.run_query().await;
            schedule_hide(playground, request);
            Ok(JsValue::UNDEFINED)
        })
    }

    /// `token` is the JS number found in `snapshot().status.token`.
    #[wasm_bindgen(js_name = hideStatus)]
    pub fn hide_status(&self, token: f64) -> bool {
        self.playground.hide_status(token as u64)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.playground.snapshot()
    }

    /// Rows of the last non-empty result, as plain objects.
    pub fn rows(&self) -> std::result::Result<JsValue, JsValue> {
        // json_compatible: rows become plain objects, not `Map`s
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        self.playground
            .rows()
            .serialize(&serializer)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = renderResultsHtml)]
    pub fn render_results_html(&self) -> Option<String> {
        self.playground.results_html()
    }

    /// Unmount: close the engine this handle created.
    pub fn shutdown(&self) -> Promise {
        let playground = Rc::clone(&self.playground);
        future_to_promise(async move {
            playground.shutdown().await?;
            Ok(JsValue::UNDEFINED)
        })
    }
}
