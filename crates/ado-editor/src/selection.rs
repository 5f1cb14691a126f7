//! Selection highlight on the stage.
//!
//! At most one node is highlighted. Highlighting a node clears every other
//! highlight, shows handles (or a stroke) on it and raises it to the top of
//! paint order. Raising is visual only: the layer's z-index is untouched.

use crate::scene::{SceneGraph, ZOrder};
use ado_core::config::HighlightMode;
use ado_core::id::LayerId;

/// Outline color for [`HighlightMode::Stroke`].
pub const STROKE_COLOR: &str = "#0066ff";

#[derive(Debug, Clone)]
pub struct SelectionController {
    mode: HighlightMode,
    shown: Option<LayerId>,
}

impl SelectionController {
    pub fn new(mode: HighlightMode) -> Self {
        Self { mode, shown: None }
    }

    pub fn mode(&self) -> HighlightMode {
        self.mode
    }

    /// The node currently highlighted.
    pub fn shown(&self) -> Option<LayerId> {
        self.shown
    }

    /// Make the scene's highlight match `selected`.
    pub fn show<K: SceneGraph>(&mut self, scene: &mut K, selected: Option<LayerId>) {
        self.clear(scene);
        let Some(id) = selected else {
            return;
        };
        let attached = match self.mode {
            HighlightMode::Handles => scene.attach_handles(id),
            HighlightMode::Stroke => scene.set_stroke(id, true),
        };
        if !attached {
            log::warn!("selection: no node for {id:?}");
            return;
        }
        scene.move_node(id, ZOrder::Top);
        self.shown = Some(id);
        scene.batch_draw();
    }

    /// Remove all highlights.
    pub fn clear<K: SceneGraph>(&mut self, scene: &mut K) {
        scene.detach_handles();
        if self.mode == HighlightMode::Stroke {
            for id in scene.node_ids() {
                scene.set_stroke(id, false);
            }
        }
        self.shown = None;
    }

    /// Forget the highlight without touching the scene; its nodes are gone.
    pub fn forget(&mut self) {
        self.shown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, NodeProps};
    use ado_core::model::{LayerTemplate, TextLayer};
    use pretty_assertions::assert_eq;

    fn scene_with(names: &[&str]) -> (MemoryScene, Vec<LayerId>) {
        let mut scene = MemoryScene::new();
        let ids: Vec<LayerId> = names.iter().map(|n| LayerId::intern(n)).collect();
        for id in &ids {
            let layer = TextLayer::from_template(*id, &LayerTemplate::default(), 0.0, 0.0);
            scene.create_node(*id, &NodeProps::from_layer(&layer));
        }
        (scene, ids)
    }

    #[test]
    fn handles_follow_selection_and_raise_node() {
        let (mut scene, ids) = scene_with(&["sel-a", "sel-b", "sel-c"]);
        let mut sel = SelectionController::new(HighlightMode::Handles);
        sel.show(&mut scene, Some(ids[0]));
        assert_eq!(scene.handles(), Some(ids[0]));
        assert_eq!(scene.node_ids().last(), Some(&ids[0]));

        sel.show(&mut scene, Some(ids[1]));
        assert_eq!(scene.handles(), Some(ids[1]));

        sel.show(&mut scene, None);
        assert_eq!(scene.handles(), None);
        assert_eq!(sel.shown(), None);
    }

    #[test]
    fn stroke_mode_highlights_one_node() {
        let (mut scene, ids) = scene_with(&["sel-s1", "sel-s2"]);
        let mut sel = SelectionController::new(HighlightMode::Stroke);
        sel.show(&mut scene, Some(ids[0]));
        sel.show(&mut scene, Some(ids[1]));
        assert!(!scene.has_stroke(ids[0]));
        assert!(scene.has_stroke(ids[1]));
        assert_eq!(scene.handles(), None);
    }

    #[test]
    fn missing_node_is_not_shown() {
        let (mut scene, _) = scene_with(&[]);
        let mut sel = SelectionController::new(HighlightMode::Handles);
        sel.show(&mut scene, Some(LayerId::intern("sel-ghost")));
        assert_eq!(sel.shown(), None);
    }
}
