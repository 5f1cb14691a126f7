//! WASM bridge for Adomate — exposes the composer to the web app.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the widgets,
//! the canvas library and file pickers; everything that decides document
//! state lives behind [`AdoComposer`]. Methods returning structured results
//! hand back JSON strings.

mod logger;
mod render2d;
mod stage;
mod storage;

use ado_core::config::ComposerConfig;
use ado_core::id::LayerId;
use ado_core::layers::ReorderDirection;
use ado_core::model::LayerPatch;
use ado_editor::composer::Composer;
use ado_editor::scene::SceneEvent;
use ado_editor::shortcuts::{FocusTarget, KeyEvent};
use render2d::Canvas2dTarget;
use serde_json::json;
use stage::{JsStage, StageAdapter};
use storage::LocalStorage;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

/// The main WASM-facing composer controller.
///
/// Holds the layer store, history and autosave. All interaction from the
/// page goes through this struct.
#[wasm_bindgen]
pub struct AdoComposer {
    inner: Composer<LocalStorage, StageAdapter>,
}

/// An id from JS. Unknown strings are not interned.
fn layer_id(id: &str) -> Option<LayerId> {
    LayerId::lookup(id)
}

fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[wasm_bindgen]
impl AdoComposer {
    /// Create a composer. `config_json` is an optional, possibly partial,
    /// `ComposerConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Self {
        logger::console_error_panic_hook_setup();
        logger::init(log::LevelFilter::Info);

        let config = match config_json.as_deref().map(ComposerConfig::from_json) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                log::warn!("invalid composer config, using defaults: {e}");
                ComposerConfig::default()
            }
            None => ComposerConfig::default(),
        };
        Self {
            inner: Composer::new(config, LocalStorage),
        }
    }

    /// Load the saved design from `localStorage`, if any.
    pub fn restore(&mut self) -> bool {
        self.inner.restore()
    }

    /// Hand over the stage adapter once the canvas has mounted.
    pub fn attach_stage(&mut self, stage: JsStage) {
        self.inner.attach_scene(StageAdapter::new(stage));
    }

    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// The current `CanvasState` as JSON.
    pub fn state_json(&self) -> String {
        serde_json::to_string(self.inner.state()).unwrap_or_else(|_| "null".into())
    }

    /// Selected layer id, or `""`.
    pub fn selected_id(&self) -> String {
        self.inner
            .selected()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    /// `{"canUndo":bool,"canRedo":bool,"length":n,"cursor":n}`
    pub fn history_json(&self) -> String {
        let h = self.inner.history();
        json!({
            "canUndo": h.can_undo(),
            "canRedo": h.can_redo(),
            "length": h.len(),
            "cursor": h.cursor(),
        })
        .to_string()
    }

    /// Transient UI error, or `""`.
    pub fn error(&self) -> String {
        self.inner.error().unwrap_or_default().to_string()
    }

    pub fn dismiss_error(&mut self) {
        self.inner.dismiss_error();
    }

    // ─── Layer API ───────────────────────────────────────────────────────

    /// Add a text layer. `defaults_json` is a partial layer (may be `"{}"`).
    /// Returns `{"ok":true,"id":"…"}` or `{"ok":false,"error":"…"}`.
    pub fn add_text_layer(&mut self, defaults_json: &str) -> String {
        let defaults = match serde_json::from_str::<LayerPatch>(defaults_json) {
            Ok(p) => p,
            Err(e) => return json!({"ok": false, "error": e.to_string()}).to_string(),
        };
        let out = match self.inner.add_text_layer(defaults) {
            Ok(id) => json!({"ok": true, "id": id.as_str()}),
            Err(e) => json!({"ok": false, "error": e.to_string()}),
        };
        self.autosave();
        out.to_string()
    }

    /// Merge a partial layer JSON into layer `id`.
    pub fn update_layer(&mut self, id: &str, patch_json: &str) -> bool {
        let Some(id) = layer_id(id) else {
            return false;
        };
        let patch = match serde_json::from_str::<LayerPatch>(patch_json) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("update_layer: bad patch: {e}");
                return false;
            }
        };
        let changed = self.inner.update_layer(id, patch);
        self.autosave();
        changed
    }

    /// Duplicate layer `id`. Returns the new id, or `""`.
    pub fn duplicate_layer(&mut self, id: &str) -> String {
        let new_id = layer_id(id).and_then(|id| self.inner.duplicate_layer(id));
        self.autosave();
        new_id.map(|id| id.to_string()).unwrap_or_default()
    }

    /// Move layer `id` one step `"up"` or `"down"`.
    pub fn reorder_layer(&mut self, id: &str, direction: &str) -> bool {
        let (Some(id), Some(direction)) = (layer_id(id), ReorderDirection::parse(direction)) else {
            return false;
        };
        let changed = self.inner.reorder_layer(id, direction);
        self.autosave();
        changed
    }

    pub fn delete_layer(&mut self, id: &str) -> bool {
        let changed = layer_id(id).is_some_and(|id| self.inner.delete_layer(id));
        self.autosave();
        changed
    }

    /// Select layer `id`; `""` clears the selection.
    pub fn select_layer(&mut self, id: &str) -> bool {
        if id.is_empty() {
            return self.inner.select(None);
        }
        layer_id(id).is_some_and(|id| self.inner.select(Some(id)))
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.inner.undo();
        self.autosave();
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.inner.redo();
        self.autosave();
        changed
    }

    // ─── Stage events ────────────────────────────────────────────────────

    pub fn on_node_click(&mut self, id: &str) -> bool {
        self.scene_event(id, SceneEvent::Click)
    }

    pub fn on_drag_start(&mut self, id: &str) -> bool {
        self.scene_event(id, SceneEvent::DragStart)
    }

    pub fn on_drag_end(&mut self, id: &str) -> bool {
        self.scene_event(id, SceneEvent::DragEnd)
    }

    pub fn on_transform_end(&mut self, id: &str) -> bool {
        self.scene_event(id, SceneEvent::TransformEnd)
    }

    pub fn on_stage_click(&mut self) -> bool {
        self.inner.handle_scene_event(SceneEvent::StageClick)
    }

    // ─── Keyboard Shortcut API ───────────────────────────────────────────

    /// Handle a `keydown`. Returns `true` if the page should
    /// `preventDefault()`.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        in_text_input: bool,
    ) -> bool {
        let event = KeyEvent {
            key,
            ctrl,
            shift,
            alt,
            meta,
            focus: if in_text_input {
                FocusTarget::TextInput
            } else {
                FocusTarget::Canvas
            },
        };
        let handled = self.inner.handle_key(&event);
        self.autosave();
        handled
    }

    // ─── Document lifecycle ──────────────────────────────────────────────

    /// Take an uploaded file. Returns `{"ok":true}` or
    /// `{"ok":false,"error":"<user-facing message>"}`.
    pub fn load_background(&mut self, mime: &str, bytes: &[u8]) -> String {
        let out = match self.inner.load_background(mime, bytes) {
            Ok(()) => json!({"ok": true}),
            Err(e) => json!({"ok": false, "error": e.to_string()}),
        };
        self.autosave();
        out.to_string()
    }

    /// Clear storage and start over with an empty canvas.
    pub fn reset_design(&mut self) -> bool {
        match self.inner.reset_design() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("reset_design: {e}");
                false
            }
        }
    }

    /// Drive autosave; call from a timer. Returns whether a save happened.
    pub fn tick(&mut self) -> bool {
        self.autosave()
    }

    /// Save immediately (e.g. on `pagehide`).
    pub fn flush(&mut self) -> bool {
        self.inner.flush().unwrap_or_else(|e| {
            log::warn!("flush: {e}");
            false
        })
    }

    /// Render at native resolution. `background` must be a loaded `<img>` of
    /// the current background. Returns
    /// `{"ok":true,"filename":"…","dataUrl":"…"}` or `{"ok":false,"error":"…"}`.
    pub fn export_png(&mut self, background: HtmlImageElement) -> String {
        let mut target = Canvas2dTarget::new(background);
        let timestamp = now_ms() as u64;
        let out = match self.inner.export(&mut target, timestamp) {
            Ok(out) => json!({"ok": true, "filename": out.filename, "dataUrl": out.data}),
            Err(e) => json!({"ok": false, "error": e.to_string()}),
        };
        out.to_string()
    }
}

impl AdoComposer {
    fn scene_event(&mut self, id: &str, event: fn(LayerId) -> SceneEvent) -> bool {
        let Some(id) = layer_id(id) else {
            log::warn!("stage event for unknown node `{id}`");
            return false;
        };
        let changed = self.inner.handle_scene_event(event(id));
        self.autosave();
        changed
    }

    fn autosave(&mut self) -> bool {
        self.inner.tick(now_ms()).unwrap_or_else(|e| {
            log::warn!("autosave failed: {e}");
            false
        })
    }
}

/// Set the console log level (`"error"` … `"trace"`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logger::init(logger::parse_level(level));
}

/// Download filename for an export taken now.
#[wasm_bindgen]
pub fn export_filename() -> String {
    ado_render::export::export_filename(now_ms() as u64)
}
