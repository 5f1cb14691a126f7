//! Scene synchronizer: layer descriptors ↔ live scene nodes.
//!
//! Two one-directional channels, each writing only what differs:
//!
//! - **Forward** (descriptor → node): after a store edit, patch the node's
//!   changed properties, or create/destroy/restack nodes. Never rebuilds an
//!   existing node.
//! - **Reverse** (node → descriptor): when a drag or transform gesture ends,
//!   read the node's transform and produce a patch holding only the fields
//!   that moved. The store applies it, and the following forward pass finds
//!   nothing to write because the node already shows the new values.
//!
//! Time travel bypasses both and [`SceneSync::rebuild`]s the whole scene.
//!
//! Nodes that should exist but don't are skipped with a warning. The store
//! is the source of truth; the next rebuild repairs any drift.

use crate::scene::{NodeProps, PropList, SceneGraph, ZOrder};
use ado_core::id::LayerId;
use ado_core::layers::LayerChange;
use ado_core::model::{CanvasState, LayerPatch, TextLayer};

#[derive(Debug, Default)]
pub struct SceneSync;

impl SceneSync {
    pub fn new() -> Self {
        Self
    }

    // ─── Forward: descriptor → node ──────────────────────────────────────

    /// Bring the scene in line with `state` after `change` was applied.
    pub fn forward<K: SceneGraph>(&self, scene: &mut K, state: &CanvasState, change: &LayerChange) {
        match change {
            LayerChange::Added(id) => {
                let Some(layer) = state.layer(*id) else {
                    log::warn!("sync: added layer {id:?} not in state");
                    return;
                };
                scene.create_node(*id, &NodeProps::from_layer(layer));
                // Added layers sit on top; a raised selection may not.
                self.restack(scene, state);
            }
            LayerChange::Updated { id, fields } => {
                let Some(layer) = state.layer(*id) else {
                    return;
                };
                let Some(live) = scene.node_props(*id) else {
                    log::warn!("sync: no node for {id:?}, skipping update");
                    return;
                };
                let desired = NodeProps::from_layer(layer);
                let writes: PropList = fields
                    .iter()
                    .filter_map(|f| desired.prop_for(*f))
                    .filter(|p| !live.holds(p))
                    .collect();
                if writes.is_empty() {
                    return;
                }
                log::trace!(
                    "sync: {id:?} <- {}",
                    writes.iter().map(|p| p.name()).collect::<Vec<_>>().join(",")
                );
                scene.set_props(*id, &writes);
            }
            LayerChange::Reordered { .. } => self.restack(scene, state),
            LayerChange::Removed(id) => {
                if !scene.destroy_node(*id) {
                    log::warn!("sync: no node for removed {id:?}");
                }
            }
        }
        scene.batch_draw();
    }

    /// Set node paint order to the layers' z-order.
    pub fn restack<K: SceneGraph>(&self, scene: &mut K, state: &CanvasState) {
        let order: Vec<LayerId> = state.layers.iter().map(|l| l.id).collect();
        if scene.node_ids() == order {
            return;
        }
        // Raising each node in turn leaves them stacked bottom-to-top.
        for id in order {
            scene.move_node(id, ZOrder::Top);
        }
    }

    // ─── Reverse: node → descriptor ──────────────────────────────────────

    /// Patch holding the transform fields where the node for `layer` differs
    /// from it. `None` if the node is missing or nothing moved.
    pub fn reverse<K: SceneGraph>(&self, scene: &K, layer: &TextLayer) -> Option<LayerPatch> {
        let Some(live) = scene.node_props(layer.id) else {
            log::warn!("sync: no node for {:?}, ignoring gesture", layer.id);
            return None;
        };
        let t = live.transform();
        let differs = |node: f64, desc: f64| (node != desc).then_some(node);
        let patch = LayerPatch {
            x: differs(t.x, layer.x),
            y: differs(t.y, layer.y),
            rotation: differs(t.rotation, layer.rotation),
            scale_x: differs(t.scale_x, layer.scale_x),
            scale_y: differs(t.scale_y, layer.scale_y),
            ..LayerPatch::default()
        };
        (!patch.is_empty()).then_some(patch)
    }

    // ─── Full rebuild ────────────────────────────────────────────────────

    /// Destroy every node and recreate one per layer in `state`, bottom to
    /// top, with no handles attached.
    pub fn rebuild<K: SceneGraph>(&self, scene: &mut K, state: &CanvasState) {
        scene.detach_handles();
        for id in scene.node_ids() {
            scene.destroy_node(id);
        }
        for layer in &state.layers {
            scene.create_node(layer.id, &NodeProps::from_layer(layer));
        }
        scene.batch_draw();
        log::debug!("sync: rebuilt {} node(s)", state.layers.len());
    }

    /// One node per layer, each showing exactly its layer's properties.
    pub fn is_consistent<K: SceneGraph>(&self, scene: &K, state: &CanvasState) -> bool {
        let ids = scene.node_ids();
        ids.len() == state.layers.len()
            && state.layers.iter().all(|layer| {
                scene
                    .node_props(layer.id)
                    .is_some_and(|p| p == NodeProps::from_layer(layer))
            })
    }
}
