//! The layer store: single writer of descriptor truth.
//!
//! Every mutating entry point runs one reducer step: compute the next
//! `CanvasState` from the current one, then push that same value to history.
//! There is no window between "commit the mutation" and "read it back to
//! record it", so one user action is always exactly one history entry.
//!
//! Reindexing z-order is the last step of every structural mutation.

use crate::config::ComposerConfig;
use crate::history::{History, Transition};
use crate::id::LayerId;
use crate::model::{CanvasState, FieldSet, LayerPatch, LayerTemplate, TextLayer};

/// Direction for [`LayerStore::reorder_layer`]. `Up` moves toward the top of
/// paint order (higher z-index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderDirection {
    Up,
    Down,
}

impl ReorderDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" | "forward" => Some(ReorderDirection::Up),
            "down" | "backward" => Some(ReorderDirection::Down),
            _ => None,
        }
    }
}

/// A requested edit. Ids are allocated before reduction so the reducer is a
/// pure function of `(state, action)`.
#[derive(Debug, Clone)]
pub enum LayerAction {
    Add {
        layer: Box<TextLayer>,
    },
    Update {
        id: LayerId,
        patch: LayerPatch,
    },
    Duplicate {
        id: LayerId,
        new_id: LayerId,
        offset: f64,
    },
    Reorder {
        id: LayerId,
        direction: ReorderDirection,
    },
    Delete {
        id: LayerId,
    },
}

/// What an applied action changed. Consumed by the scene synchronizer's
/// forward channel.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerChange {
    /// A layer was appended on top (add or duplicate).
    Added(LayerId),
    /// Descriptor fields changed in place.
    Updated { id: LayerId, fields: FieldSet },
    /// A layer swapped places with its neighbour.
    Reordered {
        id: LayerId,
        direction: ReorderDirection,
    },
    Removed(LayerId),
}

impl LayerChange {
    pub fn id(&self) -> LayerId {
        match self {
            LayerChange::Added(id)
            | LayerChange::Removed(id)
            | LayerChange::Updated { id, .. }
            | LayerChange::Reordered { id, .. } => *id,
        }
    }
}

/// Apply `action` to `state`. Returns `None` when the action has no effect
/// (unknown id, boundary reorder, patch that changes nothing).
pub fn reduce(state: &CanvasState, action: &LayerAction) -> Option<(CanvasState, LayerChange)> {
    match action {
        LayerAction::Add { layer } => {
            let mut next = state.clone();
            let mut layer = (**layer).clone();
            layer.z_index = next.layers.len();
            let id = layer.id;
            next.layers.push(layer);
            next.reindex();
            Some((next, LayerChange::Added(id)))
        }
        LayerAction::Update { id, patch } => {
            let pos = state.position_of(*id)?;
            let mut next = state.clone();
            let fields = patch.apply_to(&mut next.layers[pos]);
            if fields.is_empty() {
                return None;
            }
            Some((next, LayerChange::Updated { id: *id, fields }))
        }
        LayerAction::Duplicate { id, new_id, offset } => {
            let original = state.layer(*id)?;
            let mut copy = original.clone();
            copy.id = *new_id;
            copy.x += offset;
            copy.y += offset;
            copy.z_index = state.layers.len();
            let mut next = state.clone();
            next.layers.push(copy);
            next.reindex();
            Some((next, LayerChange::Added(*new_id)))
        }
        LayerAction::Reorder { id, direction } => {
            let pos = state.position_of(*id)?;
            let neighbour = match direction {
                ReorderDirection::Up if pos + 1 < state.layers.len() => pos + 1,
                ReorderDirection::Down if pos > 0 => pos - 1,
                _ => return None,
            };
            let mut next = state.clone();
            next.layers.swap(pos, neighbour);
            next.reindex();
            Some((
                next,
                LayerChange::Reordered {
                    id: *id,
                    direction: *direction,
                },
            ))
        }
        LayerAction::Delete { id } => {
            let pos = state.position_of(*id)?;
            let mut next = state.clone();
            next.layers.remove(pos);
            next.reindex();
            Some((next, LayerChange::Removed(*id)))
        }
    }
}

/// Canonical descriptor list plus the (transient, never persisted) selection.
#[derive(Debug, Clone)]
pub struct LayerStore {
    history: History,
    selected: Option<LayerId>,
    template: LayerTemplate,
    duplicate_offset: f64,
}

impl LayerStore {
    pub fn new(initial: CanvasState, config: &ComposerConfig) -> Self {
        let mut initial = initial;
        initial.normalize();
        Self {
            history: History::with_capacity(initial, config.history_capacity),
            selected: None,
            template: config.layer_template.clone(),
            duplicate_offset: config.duplicate_offset,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn state(&self) -> &CanvasState {
        self.history.current()
    }

    pub fn layers(&self) -> &[TextLayer] {
        &self.state().layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&TextLayer> {
        self.state().layer(id)
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn selected_layer(&self) -> Option<&TextLayer> {
        self.selected.and_then(|id| self.layer(id))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Changes whenever the current snapshot does.
    pub fn revision(&self) -> u64 {
        self.history.revision()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select an existing layer, or clear with `None`. Unknown ids are
    /// ignored. Returns whether the selection changed.
    pub fn select(&mut self, id: Option<LayerId>) -> bool {
        let target = id.filter(|id| self.layer(*id).is_some());
        if id.is_some() && target.is_none() {
            return false;
        }
        let changed = self.selected != target;
        self.selected = target;
        changed
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Append a layer built from the template, centred on the canvas, with
    /// `defaults` merged on top. The new layer is selected.
    pub fn add_layer(&mut self, defaults: LayerPatch) -> LayerId {
        let state = self.state();
        let mut layer = TextLayer::from_template(
            LayerId::fresh(),
            &self.template,
            state.canvas_width / 2.0,
            state.canvas_height / 2.0,
        );
        defaults.apply_to(&mut layer);
        let id = layer.id;
        self.dispatch(LayerAction::Add {
            layer: Box::new(layer),
        });
        self.selected = Some(id);
        id
    }

    /// Merge `patch` into layer `id`. No-op (and no history entry) if the id
    /// is unknown or nothing actually changes.
    pub fn update_layer(&mut self, id: LayerId, patch: LayerPatch) -> Option<LayerChange> {
        if patch.is_empty() {
            return None;
        }
        self.dispatch(LayerAction::Update { id, patch })
    }

    /// Copy layer `id` under a fresh id, offset, on top of the stack. The
    /// copy becomes the selection.
    pub fn duplicate_layer(&mut self, id: LayerId) -> Option<LayerId> {
        self.layer(id)?;
        let new_id = LayerId::fresh();
        let change = self.dispatch(LayerAction::Duplicate {
            id,
            new_id,
            offset: self.duplicate_offset,
        })?;
        self.selected = Some(new_id);
        Some(change.id())
    }

    /// Swap layer `id` with its neighbour in `direction`. No-op at the top
    /// (up) or bottom (down).
    pub fn reorder_layer(&mut self, id: LayerId, direction: ReorderDirection) -> Option<LayerChange> {
        self.dispatch(LayerAction::Reorder { id, direction })
    }

    /// Remove layer `id`; clears the selection if it pointed there.
    pub fn delete_layer(&mut self, id: LayerId) -> Option<LayerChange> {
        let change = self.dispatch(LayerAction::Delete { id })?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(change)
    }

    /// Run one reducer step and record the result.
    pub fn dispatch(&mut self, action: LayerAction) -> Option<LayerChange> {
        let (next, change) = reduce(self.state(), &action)?;
        debug_assert!(next.is_densely_indexed());
        log::debug!("layer store: {change:?}");
        self.history.push(next);
        Some(change)
    }

    // ─── Time travel ─────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Option<Transition> {
        let t = self.history.undo()?;
        self.selected = None;
        Some(t)
    }

    pub fn redo(&mut self) -> Option<Transition> {
        let t = self.history.redo()?;
        self.selected = None;
        Some(t)
    }

    /// Replace the whole document and history with `state`.
    pub fn reset(&mut self, state: CanvasState) -> Transition {
        let mut state = state;
        state.normalize();
        self.selected = None;
        self.history.reset(state)
    }
}
