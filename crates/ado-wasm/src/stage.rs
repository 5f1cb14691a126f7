//! `SceneGraph` over the host's JS stage.
//!
//! The web app wraps its canvas library in a small adapter object and hands
//! it to [`crate::AdoComposer::attach_stage`]. Node properties cross the
//! boundary as JSON objects keyed by the engine's attribute names.

use ado_core::id::LayerId;
use ado_core::model::{Alignment, Shadow};
use ado_editor::scene::{NodeProp, NodeProps, SceneGraph, ZOrder};
use ado_editor::selection::STROKE_COLOR;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Host-side stage adapter.
    pub type JsStage;

    #[wasm_bindgen(method, js_name = createNode)]
    fn js_create_node(this: &JsStage, id: &str, props_json: &str);

    #[wasm_bindgen(method, js_name = destroyNode)]
    fn js_destroy_node(this: &JsStage, id: &str) -> bool;

    /// JSON props of node `id`, or `undefined` if there is none.
    #[wasm_bindgen(method, js_name = nodeProps)]
    fn js_node_props(this: &JsStage, id: &str) -> Option<String>;

    #[wasm_bindgen(method, js_name = setProps)]
    fn js_set_props(this: &JsStage, id: &str, props_json: &str) -> bool;

    /// `order` is `"up"`, `"down"` or `"top"`.
    #[wasm_bindgen(method, js_name = moveNode)]
    fn js_move_node(this: &JsStage, id: &str, order: &str) -> bool;

    #[wasm_bindgen(method, js_name = nodeIds)]
    fn js_node_ids(this: &JsStage) -> Vec<String>;

    #[wasm_bindgen(method, js_name = attachHandles)]
    fn js_attach_handles(this: &JsStage, id: &str) -> bool;

    #[wasm_bindgen(method, js_name = detachHandles)]
    fn js_detach_handles(this: &JsStage);

    #[wasm_bindgen(method, js_name = setStroke)]
    fn js_set_stroke(this: &JsStage, id: &str, color: &str, width: f64) -> bool;

    #[wasm_bindgen(method, js_name = batchDraw)]
    fn js_batch_draw(this: &JsStage);
}

/// Wire form of [`NodeProps`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropsJson {
    x: f64,
    y: f64,
    #[serde(default)]
    rotation: f64,
    #[serde(default = "one")]
    scale_x: f64,
    #[serde(default = "one")]
    scale_y: f64,
    text: String,
    font_size: f64,
    font_family: String,
    font_style: String,
    fill: String,
    #[serde(default = "one")]
    opacity: f64,
    #[serde(default)]
    align: Alignment,
    #[serde(default = "one")]
    line_height: f64,
    #[serde(default)]
    letter_spacing: f64,
    #[serde(default)]
    shadow: Option<Shadow>,
}

fn one() -> f64 {
    1.0
}

impl From<&NodeProps> for PropsJson {
    fn from(p: &NodeProps) -> Self {
        Self {
            x: p.x,
            y: p.y,
            rotation: p.rotation,
            scale_x: p.scale_x,
            scale_y: p.scale_y,
            text: p.text.clone(),
            font_size: p.font_size,
            font_family: p.font_family.clone(),
            font_style: p.font_style.clone(),
            fill: p.fill.clone(),
            opacity: p.opacity,
            align: p.align,
            line_height: p.line_height,
            letter_spacing: p.letter_spacing,
            shadow: p.shadow.clone(),
        }
    }
}

impl From<PropsJson> for NodeProps {
    fn from(p: PropsJson) -> Self {
        Self {
            x: p.x,
            y: p.y,
            rotation: p.rotation,
            scale_x: p.scale_x,
            scale_y: p.scale_y,
            text: p.text,
            font_size: p.font_size,
            font_family: p.font_family,
            font_style: p.font_style,
            fill: p.fill,
            opacity: p.opacity,
            align: p.align,
            line_height: p.line_height,
            letter_spacing: p.letter_spacing,
            shadow: p.shadow,
        }
    }
}

fn prop_value(prop: &NodeProp) -> Value {
    match prop {
        NodeProp::X(v)
        | NodeProp::Y(v)
        | NodeProp::Rotation(v)
        | NodeProp::ScaleX(v)
        | NodeProp::ScaleY(v)
        | NodeProp::FontSize(v)
        | NodeProp::Opacity(v)
        | NodeProp::LineHeight(v)
        | NodeProp::LetterSpacing(v) => json!(v),
        NodeProp::Text(s) | NodeProp::FontFamily(s) | NodeProp::FontStyle(s) | NodeProp::Fill(s) => {
            json!(s)
        }
        NodeProp::Align(a) => json!(a.as_str()),
        NodeProp::Shadow(s) => serde_json::to_value(s).unwrap_or(Value::Null),
    }
}

pub struct StageAdapter {
    stage: JsStage,
}

impl StageAdapter {
    pub fn new(stage: JsStage) -> Self {
        Self { stage }
    }
}

impl SceneGraph for StageAdapter {
    fn create_node(&mut self, id: LayerId, props: &NodeProps) {
        match serde_json::to_string(&PropsJson::from(props)) {
            Ok(json) => self.stage.js_create_node(id.as_str(), &json),
            Err(e) => log::error!("stage: cannot encode props for {id:?}: {e}"),
        }
    }

    fn destroy_node(&mut self, id: LayerId) -> bool {
        self.stage.js_destroy_node(id.as_str())
    }

    fn node_props(&self, id: LayerId) -> Option<NodeProps> {
        let raw = self.stage.js_node_props(id.as_str())?;
        match serde_json::from_str::<PropsJson>(&raw) {
            Ok(p) => Some(p.into()),
            Err(e) => {
                log::warn!("stage: unreadable props for {id:?}: {e}");
                None
            }
        }
    }

    fn set_props(&mut self, id: LayerId, props: &[NodeProp]) -> bool {
        let map: Map<String, Value> = props
            .iter()
            .map(|p| (p.name().to_string(), prop_value(p)))
            .collect();
        self.stage
            .js_set_props(id.as_str(), &Value::Object(map).to_string())
    }

    fn move_node(&mut self, id: LayerId, order: ZOrder) -> bool {
        let order = match order {
            ZOrder::Up => "up",
            ZOrder::Down => "down",
            ZOrder::Top => "top",
        };
        self.stage.js_move_node(id.as_str(), order)
    }

    fn node_ids(&self) -> Vec<LayerId> {
        self.stage
            .js_node_ids()
            .iter()
            .map(|s| LayerId::intern(s))
            .collect()
    }

    fn attach_handles(&mut self, id: LayerId) -> bool {
        self.stage.js_attach_handles(id.as_str())
    }

    fn detach_handles(&mut self) {
        self.stage.js_detach_handles();
    }

    fn set_stroke(&mut self, id: LayerId, on: bool) -> bool {
        if on {
            self.stage.js_set_stroke(id.as_str(), STROKE_COLOR, 2.0)
        } else {
            self.stage.js_set_stroke(id.as_str(), "", 0.0)
        }
    }

    fn batch_draw(&mut self) {
        self.stage.js_batch_draw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn props_json_uses_engine_names() {
        let props = NodeProps {
            x: 1.0,
            y: 2.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            text: "Hi".into(),
            font_size: 32.0,
            font_family: "Arial".into(),
            font_style: "bold".into(),
            fill: "#000000".into(),
            opacity: 1.0,
            align: Alignment::Center,
            line_height: 1.2,
            letter_spacing: 0.0,
            shadow: None,
        };
        let json = serde_json::to_value(PropsJson::from(&props)).unwrap();
        assert_eq!(json["fontStyle"], "bold");
        assert_eq!(json["align"], "center");
        assert_eq!(json["scaleX"], 1.0);

        let back: NodeProps = serde_json::from_value::<PropsJson>(json).unwrap().into();
        assert_eq!(back, props);
    }

    #[test]
    fn prop_values_are_plain_json() {
        assert_eq!(prop_value(&NodeProp::X(3.5)), json!(3.5));
        assert_eq!(prop_value(&NodeProp::Align(Alignment::Right)), json!("right"));
        assert_eq!(prop_value(&NodeProp::Shadow(None)), Value::Null);
    }
}
