//! WASM bindings for the verseaxis-core library.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! The React host keeps a single `VerseAxis` instance, forwards pointer
//! and toolbar events into it, and re-renders from the JSON scene it
//! returns. Network I/O stays on the JS side; `run_text_call` drives a
//! host-supplied async operation under the core retry policy.

use wasm_bindgen::prelude::*;

use js_sys::{Function, Promise};
use wasm_bindgen_futures::JsFuture;

use crate::collab::{self, CollabError, RetryPolicy};
use crate::geometry::{Point, Viewport};
use crate::model::{HighlightColor, NodeId};
use crate::output::SceneOutput;
use crate::session::{Session, StyleToggle};

#[wasm_bindgen]
extern "C" {
    pub fn alert(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

fn viewport_from_window() -> Viewport {
    match web_sys::window() {
        Some(window) => {
            let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1280.0);
            let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(720.0);
            Viewport::new(width, height)
        }
        None => Viewport::new(1280.0, 720.0),
    }
}

#[wasm_bindgen]
pub struct VerseAxis {
    session: Session,
}

#[wasm_bindgen]
impl VerseAxis {
    /// Create a session sized to the current window, with the default
    /// passage laid out.
    #[wasm_bindgen(constructor)]
    pub fn new() -> VerseAxis {
        VerseAxis { session: Session::new(viewport_from_window()) }
    }

    /// The full render state as JSON.
    pub fn scene(&self) -> String {
        let output = SceneOutput::from_session(&self.session);
        serde_json::to_string(&output).unwrap_or_else(|e| {
            console_error(&format!("Error serializing scene: {e:?}"));
            "{\"error\": \"Serialization error\"}".to_string()
        })
    }

    pub fn set_viewport(&mut self, width: f64, height: f64, scroll_top: f64) {
        self.session.set_viewport(Viewport { width, height, scroll_top });
    }

    // --- Pointer events -------------------------------------------------

    pub fn pointer_down(
        &mut self,
        target: Option<u32>,
        pointer_id: i32,
        x: f64,
        y: f64,
        shift: bool,
    ) {
        self.session
            .pointer_down(target.map(NodeId), pointer_id, Point::new(x, y), shift);
    }

    pub fn pointer_move(&mut self, pointer_id: i32, x: f64, y: f64) {
        self.session.pointer_move(pointer_id, Point::new(x, y));
    }

    pub fn pointer_up(&mut self, pointer_id: i32, x: f64, y: f64) {
        self.session.pointer_up(pointer_id, Point::new(x, y));
    }

    pub fn pointer_leave(&mut self, pointer_id: i32, x: f64, y: f64) {
        self.session.pointer_leave(pointer_id, Point::new(x, y));
    }

    // --- Toolbar commands ----------------------------------------------

    /// Toggle "bold", "italic" or "underline" on the selection.
    pub fn toggle_style(&mut self, style: &str) {
        let toggle = match style {
            "bold" => StyleToggle::Bold,
            "italic" => StyleToggle::Italic,
            "underline" => StyleToggle::Underline,
            other => {
                console_error(&format!("Unknown style '{}'", other));
                return;
            }
        };
        self.session.toggle_style(toggle);
    }

    pub fn set_highlight(&mut self, color: &str) {
        match HighlightColor::from_str(color) {
            Some(color) => self.session.set_highlight(color),
            None => console_error(&format!("Unknown highlight color '{}'", color)),
        }
    }

    pub fn last_highlight(&self) -> String {
        self.session.last_highlight().as_str().to_string()
    }

    pub fn change_font_size(&mut self, delta: f64) {
        self.session.change_font_size(delta);
    }

    pub fn clear_formatting(&mut self) {
        self.session.clear_formatting();
    }

    pub fn detach_selection(&mut self) {
        self.session.detach_selection();
    }

    pub fn undo(&mut self) {
        self.session.undo();
    }

    pub fn redo(&mut self) {
        self.session.redo();
    }

    pub fn toggle_view_mode(&mut self) {
        self.session.toggle_view_mode();
    }

    pub fn cycle_connection_mode(&mut self) {
        self.session.cycle_connection_mode();
    }

    pub fn set_multi_select(&mut self, enabled: bool) {
        self.session.set_multi_select(enabled);
    }

    pub fn zoom_in(&mut self) {
        self.session.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.session.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.session.reset_view();
    }

    // --- Passage loading ------------------------------------------------

    /// Baked-in passage text for references served without a credential,
    /// or None when the host must consult the passage source.
    pub fn offline_passage(&self, reference: &str) -> Option<String> {
        Session::offline_passage(reference).map(str::to_string)
    }

    pub fn begin_passage_load(&mut self) {
        self.session.begin_passage_load();
    }

    pub fn load_passage_text(&mut self, reference: &str, text: &str) {
        self.session.complete_passage_load(reference, Ok(text.to_string()));
    }

    pub fn passage_failed(&mut self, reference: &str, reason: &str) {
        console_error(&format!("Passage fetch failed: {}", reason));
        self.session
            .complete_passage_load(reference, Err(CollabError::Unavailable(reason.to_string())));
    }

    // --- Text analysis --------------------------------------------------

    pub fn insights_prompt(&self) -> String {
        self.session.insights_prompt()
    }

    pub fn word_study_prompt(&self) -> Option<String> {
        self.session.word_study_prompt()
    }

    pub fn begin_analysis(&mut self) {
        self.session.begin_analysis();
    }

    pub fn analysis_ready(&mut self, text: &str) {
        self.session.complete_analysis(Ok(text.to_string()));
    }

    pub fn analysis_failed(&mut self, reason: &str) {
        console_error(&format!("Analysis failed: {}", reason));
        self.session
            .complete_analysis(Err(CollabError::Unavailable(reason.to_string())));
    }

    pub fn dismiss_analysis(&mut self) {
        self.session.dismiss_analysis();
    }
}

impl Default for VerseAxis {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive a host text call under the core retry policy.
///
/// `op` is `(attempt: number) => Promise<string>`; `sleep` is
/// `(ms: number) => Promise<void>` (typically a setTimeout wrapper).
/// Rejections whose message mentions a rate limit ("429" or "rate")
/// retry with exponential backoff; anything else rejects immediately.
#[wasm_bindgen]
pub async fn run_text_call(op: Function, sleep: Function) -> Result<JsValue, JsValue> {
    let policy = RetryPolicy::default();

    let result = collab::run_with_retry(
        &policy,
        |delay| {
            let scheduled = sleep.call1(&JsValue::NULL, &JsValue::from_f64(delay.as_millis() as f64));
            async move {
                if let Ok(value) = scheduled {
                    let _ = JsFuture::from(Promise::resolve(&value)).await;
                }
            }
        },
        |attempt| {
            let call = op.call1(&JsValue::NULL, &JsValue::from_f64(attempt as f64));
            async move {
                match call {
                    Ok(value) => match JsFuture::from(Promise::resolve(&value)).await {
                        Ok(resolved) => resolved.as_string().ok_or(CollabError::Empty),
                        Err(rejection) => Err(classify_rejection(rejection)),
                    },
                    Err(rejection) => Err(classify_rejection(rejection)),
                }
            }
        },
    )
    .await;

    match result {
        Ok(text) => Ok(JsValue::from_str(&text)),
        Err(err) => {
            console_error(&format!("Text call failed: {}", err));
            Err(JsValue::from_str(&err.to_string()))
        }
    }
}

fn classify_rejection(rejection: JsValue) -> CollabError {
    let message = rejection
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(&rejection, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| "request failed".to_string());
    if message.contains("429") || message.to_lowercase().contains("rate") {
        CollabError::RateLimited
    } else {
        CollabError::Unavailable(message)
    }
}
