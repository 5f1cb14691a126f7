//! The composer: one object wiring store, history, scene and storage.
//!
//! Every user intent enters through a method here. Edits run through the
//! layer store (one reducer step, one history entry), then the forward sync
//! patches the scene. Time travel and document replacement rebuild the
//! scene instead. Gesture ends arrive as [`SceneEvent`]s and go through the
//! reverse sync.
//!
//! The stage arrives late: until [`Composer::attach_scene`] is called the
//! composer still holds a document, but layer creation and export report
//! that the canvas is not ready.

use crate::scene::{SceneEvent, SceneGraph};
use crate::selection::SelectionController;
use crate::shortcuts::{KeyEvent, NudgeSteps, ShortcutAction, ShortcutMap};
use crate::sync::SceneSync;
use ado_core::config::ComposerConfig;
use ado_core::error::{ComposeError, PersistResult, UploadError};
use ado_core::history::History;
use ado_core::id::LayerId;
use ado_core::layers::{LayerChange, LayerStore, ReorderDirection};
use ado_core::model::{CanvasState, LayerPatch, TextLayer};
use ado_core::persist::{PersistenceBridge, Storage};
use ado_core::upload::{probe_data_uri, validate_upload};
use ado_render::export::{ExportError, ExportTarget, export_filename, plan_export, render_plan};

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutput<T> {
    pub filename: String,
    pub data: T,
}

pub struct Composer<S: Storage, K: SceneGraph> {
    config: ComposerConfig,
    store: LayerStore,
    persist: PersistenceBridge<S>,
    scene: Option<K>,
    sync: SceneSync,
    selection: SelectionController,
    /// Native pixel size of the background, when known from an upload.
    native_size: Option<(u32, u32)>,
    /// Transient, dismissible message for the UI.
    error: Option<String>,
    /// Store revision last handed to the autosave debouncer.
    autosave_revision: u64,
}

impl<S: Storage, K: SceneGraph> Composer<S, K> {
    pub fn new(config: ComposerConfig, storage: S) -> Self {
        let store = LayerStore::new(CanvasState::default(), &config);
        let persist = PersistenceBridge::new(storage, config.storage_key.clone(), config.autosave_delay_ms);
        Self {
            selection: SelectionController::new(config.highlight),
            autosave_revision: store.revision(),
            config,
            store,
            persist,
            scene: None,
            sync: SceneSync::new(),
            native_size: None,
            error: None,
        }
    }

    /// Load the saved document, if there is one with a background. Replaces
    /// the current document and history. Returns whether anything loaded.
    pub fn restore(&mut self) -> bool {
        let Some(saved) = self.persist.load() else {
            return false;
        };
        if !saved.has_background() {
            log::debug!("composer: saved design has no background, not restoring");
            return false;
        }
        self.replace_document(saved, None);
        // Nothing new to save.
        self.autosave_revision = self.store.revision();
        log::info!("composer: restored {} layer(s)", self.store.layers().len());
        true
    }

    // ─── Stage lifecycle ─────────────────────────────────────────────────

    /// Hand over the stage and draw the current document on it.
    pub fn attach_scene(&mut self, mut scene: K) {
        self.sync.rebuild(&mut scene, self.store.state());
        self.selection.forget();
        self.selection.show(&mut scene, self.store.selected());
        self.scene = Some(scene);
    }

    pub fn detach_scene(&mut self) -> Option<K> {
        self.selection.forget();
        self.scene.take()
    }

    pub fn is_ready(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene(&self) -> Option<&K> {
        self.scene.as_ref()
    }

    /// Direct access to the stage, for engines that need driving from the
    /// host (and for tests playing the user).
    pub fn scene_mut(&mut self) -> Option<&mut K> {
        self.scene.as_mut()
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn state(&self) -> &CanvasState {
        self.store.state()
    }

    pub fn layers(&self) -> &[TextLayer] {
        self.store.layers()
    }

    pub fn layer(&self, id: LayerId) -> Option<&TextLayer> {
        self.store.layer(id)
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.store.selected()
    }

    pub fn selected_layer(&self) -> Option<&TextLayer> {
        self.store.selected_layer()
    }

    pub fn history(&self) -> &History {
        self.store.history()
    }

    pub fn can_undo(&self) -> bool {
        self.store.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.history().can_redo()
    }

    pub fn persistence(&self) -> &PersistenceBridge<S> {
        &self.persist
    }

    /// Scene matches the document exactly. Vacuously true with no stage.
    pub fn is_consistent(&self) -> bool {
        self.scene
            .as_ref()
            .is_none_or(|scene| self.sync.is_consistent(scene, self.store.state()))
    }

    // ─── Transient error ─────────────────────────────────────────────────

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    fn fail<E: std::fmt::Display>(&mut self, err: E) -> E {
        log::warn!("composer: {err}");
        self.error = Some(err.to_string());
        err
    }

    // ─── Layer editing ───────────────────────────────────────────────────

    /// Add a text layer at the canvas centre with `defaults` merged in.
    pub fn add_text_layer(&mut self, defaults: LayerPatch) -> Result<LayerId, ComposeError> {
        if self.scene.is_none() {
            return Err(self.fail(ComposeError::CanvasNotReady));
        }
        let id = self.store.add_layer(defaults);
        self.apply(Some(LayerChange::Added(id)));
        Ok(id)
    }

    /// Merge `patch` into layer `id`. Returns whether anything changed.
    pub fn update_layer(&mut self, id: LayerId, patch: LayerPatch) -> bool {
        let change = self.store.update_layer(id, patch);
        self.apply(change)
    }

    pub fn duplicate_layer(&mut self, id: LayerId) -> Option<LayerId> {
        let new_id = self.store.duplicate_layer(id)?;
        self.apply(Some(LayerChange::Added(new_id)));
        Some(new_id)
    }

    pub fn reorder_layer(&mut self, id: LayerId, direction: ReorderDirection) -> bool {
        let change = self.store.reorder_layer(id, direction);
        self.apply(change)
    }

    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        let change = self.store.delete_layer(id);
        self.apply(change)
    }

    /// Select a layer (or clear with `None`). Unknown ids are ignored.
    pub fn select(&mut self, id: Option<LayerId>) -> bool {
        let changed = self.store.select(id);
        self.refresh_highlight(false);
        changed
    }

    /// Forward-sync one store change. The highlight is only touched when
    /// the selection moved or paint order was rebuilt.
    fn apply(&mut self, change: Option<LayerChange>) -> bool {
        let Some(change) = change else {
            return false;
        };
        if let Some(scene) = self.scene.as_mut() {
            self.sync.forward(scene, self.store.state(), &change);
        }
        self.refresh_highlight(matches!(change, LayerChange::Reordered { .. }));
        self.error = None;
        true
    }

    /// Move the highlight to the store's selection. A node raised for the
    /// old highlight goes back to its z-index slot first.
    fn refresh_highlight(&mut self, restacked: bool) {
        let selected = self.store.selected();
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        if !restacked && self.selection.shown() == selected {
            return;
        }
        self.sync.restack(scene, self.store.state());
        self.selection.show(scene, selected);
    }

    // ─── Time travel ─────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        if self.store.undo().is_none() {
            return false;
        }
        self.rebuild();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.store.redo().is_none() {
            return false;
        }
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        self.selection.forget();
        if let Some(scene) = self.scene.as_mut() {
            self.sync.rebuild(scene, self.store.state());
        }
    }

    fn replace_document(&mut self, state: CanvasState, native_size: Option<(u32, u32)>) {
        self.store.reset(state);
        self.native_size = native_size;
        self.rebuild();
    }

    // ─── Document lifecycle ──────────────────────────────────────────────

    /// Validate an uploaded file and make it the background. The canvas is
    /// resized to fit, existing layers are kept and history restarts.
    pub fn load_background(&mut self, mime: &str, bytes: &[u8]) -> Result<(), UploadError> {
        let image = validate_upload(mime, bytes, &self.config)?;
        let mut next = self.store.state().clone();
        next.background_image = Some(image.data_uri);
        next.canvas_width = image.display_width;
        next.canvas_height = image.display_height;
        self.replace_document(next, Some((image.width, image.height)));
        self.error = None;
        log::info!(
            "composer: background {}x{} on {}x{} canvas",
            image.width,
            image.height,
            image.display_width,
            image.display_height
        );
        Ok(())
    }

    /// Drop everything: saved slot, pending save, background, layers and
    /// history. Leaves an empty default-size canvas.
    pub fn reset_design(&mut self) -> PersistResult<()> {
        let cleared = self.persist.clear();
        self.replace_document(CanvasState::default(), None);
        self.autosave_revision = self.store.revision();
        self.error = None;
        cleared
    }

    // ─── Stage events ────────────────────────────────────────────────────

    /// React to a stage event. Node ids are looked up in the store as it is
    /// now, not as it was when the node was created.
    pub fn handle_scene_event(&mut self, event: SceneEvent) -> bool {
        match event {
            SceneEvent::Click(id) | SceneEvent::DragStart(id) => {
                if self.store.layer(id).is_none() {
                    log::warn!("composer: event for unknown layer {id:?}");
                    return false;
                }
                self.select(Some(id))
            }
            SceneEvent::DragEnd(id) | SceneEvent::TransformEnd(id) => {
                let (Some(scene), Some(layer)) = (self.scene.as_ref(), self.store.layer(id)) else {
                    return false;
                };
                let Some(patch) = self.sync.reverse(scene, layer) else {
                    return false;
                };
                self.update_layer(id, patch)
            }
            SceneEvent::StageClick => self.select(None),
        }
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Handle a `keydown`. Returns true when the key was consumed, so the
    /// host should suppress its default action.
    pub fn handle_key(&mut self, event: &KeyEvent<'_>) -> bool {
        let steps = NudgeSteps {
            step: self.config.nudge_step,
            large: self.config.nudge_step_large,
        };
        let Some(action) = ShortcutMap::resolve_event(event, steps) else {
            return false;
        };
        let selected = self.store.selected_layer().map(|l| (l.id, l.x, l.y));
        if ShortcutMap::needs_selection(action) && selected.is_none() {
            return false;
        }
        log::debug!("composer: key {:?} -> {action:?}", event.key);
        match (action, selected) {
            (ShortcutAction::Undo, _) => {
                self.undo();
            }
            (ShortcutAction::Redo, _) => {
                self.redo();
            }
            (ShortcutAction::Deselect, _) => {
                self.select(None);
            }
            (ShortcutAction::Delete, Some((id, _, _))) => {
                self.delete_layer(id);
            }
            (ShortcutAction::Duplicate, Some((id, _, _))) => {
                self.duplicate_layer(id);
            }
            (ShortcutAction::Nudge { dx, dy }, Some((id, x, y))) => {
                self.update_layer(id, LayerPatch::position(x + dx, y + dy));
            }
            _ => return false,
        }
        true
    }

    // ─── Autosave ────────────────────────────────────────────────────────

    /// Drive the autosave debouncer. Call after every change and
    /// periodically; `now_ms` is wall-clock milliseconds. Returns whether the
    /// document was written.
    pub fn tick(&mut self, now_ms: f64) -> PersistResult<bool> {
        let revision = self.store.revision();
        if revision != self.autosave_revision {
            self.autosave_revision = revision;
            let state = self.store.state();
            if state.has_content() {
                self.persist.schedule(state.clone(), now_ms);
            } else {
                self.persist.cancel();
            }
        }
        self.persist.poll(now_ms)
    }

    /// Write any pending save now (e.g. on page hide).
    pub fn flush(&mut self) -> PersistResult<bool> {
        self.persist.flush_now()
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Render the document at the background's native resolution into
    /// `target`. State is untouched whatever happens.
    pub fn export<T: ExportTarget>(
        &mut self,
        target: &mut T,
        timestamp_ms: u64,
    ) -> Result<ExportOutput<T::Output>, ExportError> {
        match self.render_export(target) {
            Ok((native, data)) => {
                self.native_size = Some(native);
                Ok(ExportOutput {
                    filename: export_filename(timestamp_ms),
                    data,
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn render_export<T: ExportTarget>(&self, target: &mut T) -> Result<((u32, u32), T::Output), ExportError> {
        let state = self.store.state();
        let background = match (&self.scene, &state.background_image) {
            (Some(_), Some(bg)) => bg,
            _ => return Err(ExportError::NoBackground),
        };
        let native = match self.native_size {
            Some(size) => size,
            None => probe_data_uri(background).map_err(|e| ExportError::Decode(e.to_string()))?,
        };
        let plan = plan_export(state, native)?;
        let data = render_plan(target, &plan)?;
        Ok((native, data))
    }
}
