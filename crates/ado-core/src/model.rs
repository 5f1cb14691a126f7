//! Document data model for the composer.
//!
//! A document is a background image plus an ordered list of text layer
//! descriptors. Descriptors are plain values: every edit produces a new
//! `CanvasState`, and the live scene nodes that render a descriptor are owned
//! elsewhere (see `ado-editor`). The serialized form is the JSON that lands in
//! browser storage, so field names follow the camelCase used by the web host.

use crate::id::LayerId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;

// ─── Text styling ────────────────────────────────────────────────────────

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

/// Font weight: a named token or a numeric CSS weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
    Light,
    SemiBold,
    Numeric(u16),
}

impl FontWeight {
    /// Parse a weight token (`normal`, `bold`, `light`, `semibold`) or a
    /// numeric string in `1..=1000`.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        match token.to_ascii_lowercase().as_str() {
            "normal" | "regular" => Some(FontWeight::Normal),
            "bold" => Some(FontWeight::Bold),
            "light" => Some(FontWeight::Light),
            "semibold" | "semi-bold" => Some(FontWeight::SemiBold),
            _ => match token.parse::<u16>() {
                Ok(n) if (1..=1000).contains(&n) => Some(FontWeight::Numeric(n)),
                _ => None,
            },
        }
    }

    /// Numeric CSS weight used by renderers.
    pub fn css_weight(&self) -> u16 {
        match self {
            FontWeight::Normal => 400,
            FontWeight::Bold => 700,
            FontWeight::Light => 300,
            FontWeight::SemiBold => 600,
            FontWeight::Numeric(n) => *n,
        }
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontWeight::Normal => f.write_str("normal"),
            FontWeight::Bold => f.write_str("bold"),
            FontWeight::Light => f.write_str("light"),
            FontWeight::SemiBold => f.write_str("semibold"),
            FontWeight::Numeric(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for FontWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FontWeight::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown font weight `{s}`")))
    }
}

/// Drop shadow behind a text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

// ─── Text layer descriptor ───────────────────────────────────────────────

/// The serializable record describing one text layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub id: LayerId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: FontWeight,
    pub color: String,
    pub opacity: f64,
    pub alignment: Alignment,
    pub rotation: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    pub z_index: usize,
    pub line_height: f64,
    #[serde(default)]
    pub letter_spacing: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
}

fn unit_scale() -> f64 {
    1.0
}

/// Defaults for newly added text layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerTemplate {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub font_weight: FontWeight,
    pub color: String,
    pub opacity: f64,
    pub alignment: Alignment,
    pub line_height: f64,
    pub letter_spacing: f64,
}

impl Default for LayerTemplate {
    fn default() -> Self {
        Self {
            text: "New Text".into(),
            font_size: 32.0,
            font_family: "Arial".into(),
            font_weight: FontWeight::Normal,
            color: "#000000".into(),
            opacity: 1.0,
            alignment: Alignment::Left,
            line_height: 1.2,
            letter_spacing: 0.0,
        }
    }
}

impl TextLayer {
    /// Build a layer from a template at canvas position `(x, y)`.
    pub fn from_template(id: LayerId, template: &LayerTemplate, x: f64, y: f64) -> Self {
        Self {
            id,
            text: template.text.clone(),
            x,
            y,
            font_size: template.font_size,
            font_family: template.font_family.clone(),
            font_weight: template.font_weight,
            color: template.color.clone(),
            opacity: template.opacity,
            alignment: template.alignment,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            z_index: 0,
            line_height: template.line_height,
            letter_spacing: template.letter_spacing,
            shadow: None,
        }
    }

    /// Number of lines the text occupies.
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

// ─── Partial updates ─────────────────────────────────────────────────────

/// Names a single descriptor field. Used to describe which fields an edit
/// actually changed, so the scene synchronizer can patch just those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerField {
    Text,
    X,
    Y,
    FontSize,
    FontFamily,
    FontWeight,
    Color,
    Opacity,
    Alignment,
    Rotation,
    ScaleX,
    ScaleY,
    ZIndex,
    LineHeight,
    LetterSpacing,
    Shadow,
}

/// The set of fields touched by one edit.
pub type FieldSet = SmallVec<[LayerField; 4]>;

/// A partial descriptor update. `None` leaves a field untouched.
///
/// `shadow` is doubly optional: absent leaves the shadow alone, `null`
/// removes it, an object replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub shadow: Option<Option<Shadow>>,
}

/// Maps a present JSON value (including `null`) to `Some`, so that
/// `Option<Option<T>>` can tell "absent" from "cleared".
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl LayerPatch {
    /// Patch that moves a layer to `(x, y)`.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// True if the patch names no field at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the patch into `layer`, returning the fields whose value actually
    /// changed. Writing a value the layer already holds is not a change.
    ///
    /// Out-of-range values are normalized rather than rejected: non-finite
    /// numbers and non-positive font sizes are ignored, opacity is clamped to
    /// `[0, 1]` and shadow blur to `>= 0`.
    pub fn apply_to(&self, layer: &mut TextLayer) -> FieldSet {
        let mut changed = FieldSet::new();

        fn set<T: PartialEq + Clone>(
            slot: &mut T,
            value: &Option<T>,
            field: LayerField,
            changed: &mut FieldSet,
        ) {
            if let Some(v) = value
                && *slot != *v
            {
                *slot = v.clone();
                changed.push(field);
            }
        }

        let finite = |v: Option<f64>| v.filter(|n| n.is_finite());

        set(&mut layer.text, &self.text, LayerField::Text, &mut changed);
        set(&mut layer.x, &finite(self.x), LayerField::X, &mut changed);
        set(&mut layer.y, &finite(self.y), LayerField::Y, &mut changed);
        set(
            &mut layer.font_size,
            &finite(self.font_size).filter(|s| *s > 0.0),
            LayerField::FontSize,
            &mut changed,
        );
        set(
            &mut layer.font_family,
            &self.font_family.clone().filter(|f| !f.trim().is_empty()),
            LayerField::FontFamily,
            &mut changed,
        );
        set(
            &mut layer.font_weight,
            &self.font_weight,
            LayerField::FontWeight,
            &mut changed,
        );
        set(&mut layer.color, &self.color, LayerField::Color, &mut changed);
        set(
            &mut layer.opacity,
            &finite(self.opacity).map(|o| o.clamp(0.0, 1.0)),
            LayerField::Opacity,
            &mut changed,
        );
        set(
            &mut layer.alignment,
            &self.alignment,
            LayerField::Alignment,
            &mut changed,
        );
        set(
            &mut layer.rotation,
            &finite(self.rotation),
            LayerField::Rotation,
            &mut changed,
        );
        set(
            &mut layer.scale_x,
            &finite(self.scale_x),
            LayerField::ScaleX,
            &mut changed,
        );
        set(
            &mut layer.scale_y,
            &finite(self.scale_y),
            LayerField::ScaleY,
            &mut changed,
        );
        set(
            &mut layer.line_height,
            &finite(self.line_height).filter(|l| *l > 0.0),
            LayerField::LineHeight,
            &mut changed,
        );
        set(
            &mut layer.letter_spacing,
            &finite(self.letter_spacing),
            LayerField::LetterSpacing,
            &mut changed,
        );
        let shadow = self.shadow.clone().map(|s| {
            s.map(|mut s| {
                s.blur = if s.blur.is_finite() { s.blur.max(0.0) } else { 0.0 };
                s
            })
        });
        set(&mut layer.shadow, &shadow, LayerField::Shadow, &mut changed);

        changed
    }
}

// ─── Document snapshot ───────────────────────────────────────────────────

/// Default display canvas size before any image is loaded.
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;
pub const DEFAULT_CANVAS_HEIGHT: f64 = 600.0;

/// One immutable document snapshot.
///
/// `layers` is kept sorted by `z_index`, so a layer's position in the vector
/// is its paint order (index 0 is painted first, i.e. at the bottom).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasState {
    /// Background image reference (a data URI or resource handle), stored
    /// verbatim.
    pub background_image: Option<String>,
    #[serde(rename = "textLayers")]
    pub layers: Vec<TextLayer>,
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::empty(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT)
    }
}

impl CanvasState {
    /// A document with no background and no layers.
    pub fn empty(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            background_image: None,
            layers: Vec::new(),
            canvas_width,
            canvas_height,
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&TextLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn position_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn has_background(&self) -> bool {
        self.background_image.is_some()
    }

    /// True if there is anything worth saving.
    pub fn has_content(&self) -> bool {
        self.background_image.is_some() || !self.layers.is_empty()
    }

    /// Put `layers` in `z_index` order and rewrite indices to `0..N-1`.
    ///
    /// Sorting is stable, so layers sharing an index keep their relative
    /// order. A repeated id keeps only its lowest layer. Used when a
    /// snapshot comes from outside (storage, host JSON).
    pub fn normalize(&mut self) {
        self.layers.sort_by_key(|l| l.z_index);
        let mut seen = HashSet::with_capacity(self.layers.len());
        self.layers.retain(|l| {
            let first = seen.insert(l.id);
            if !first {
                log::warn!("model: dropping layer with duplicate id {:?}", l.id);
            }
            first
        });
        self.reindex();
    }

    /// Rewrite every `z_index` to match the layer's vector position.
    pub fn reindex(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.z_index = i;
        }
    }

    /// True if z-indices are exactly `0..N-1` in vector order.
    pub fn is_densely_indexed(&self) -> bool {
        self.layers.iter().enumerate().all(|(i, l)| l.z_index == i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layer(name: &str) -> TextLayer {
        TextLayer::from_template(LayerId::intern(name), &LayerTemplate::default(), 10.0, 20.0)
    }

    #[test]
    fn font_weight_tokens_roundtrip() {
        for token in ["normal", "bold", "light", "semibold", "300", "600"] {
            let w = FontWeight::parse(token).unwrap();
            assert_eq!(w.to_string(), token);
        }
        assert_eq!(FontWeight::parse("Bold"), Some(FontWeight::Bold));
        assert_eq!(FontWeight::parse("heavy"), None);
        assert_eq!(FontWeight::parse("0"), None);
        assert_eq!(FontWeight::SemiBold.css_weight(), 600);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut l = layer("patch_empty");
        let before = l.clone();
        let changed = LayerPatch::default().apply_to(&mut l);
        assert!(changed.is_empty());
        assert_eq!(l, before);
    }

    #[test]
    fn patch_reports_only_differing_fields() {
        let mut l = layer("patch_diff");
        let patch = LayerPatch {
            x: Some(10.0), // same as before
            y: Some(99.0),
            text: Some("Hello".into()),
            ..LayerPatch::default()
        };
        let changed = patch.apply_to(&mut l);
        assert_eq!(changed.as_slice(), &[LayerField::Text, LayerField::Y]);
        assert_eq!(l.y, 99.0);
        assert_eq!(l.text, "Hello");
    }

    #[test]
    fn patch_normalizes_out_of_range_values() {
        let mut l = layer("patch_clamp");
        let patch = LayerPatch {
            opacity: Some(1.7),
            font_size: Some(-4.0),
            rotation: Some(f64::NAN),
            shadow: Some(Some(Shadow {
                color: "#000".into(),
                blur: -3.0,
                offset_x: 2.0,
                offset_y: 2.0,
            })),
            ..LayerPatch::default()
        };
        patch.apply_to(&mut l);
        assert_eq!(l.opacity, 1.0);
        assert_eq!(l.font_size, 32.0);
        assert_eq!(l.rotation, 0.0);
        assert_eq!(l.shadow.as_ref().unwrap().blur, 0.0);
    }

    #[test]
    fn patch_json_distinguishes_absent_and_null_shadow() {
        let absent: LayerPatch = serde_json::from_str(r#"{"x": 5}"#).unwrap();
        assert_eq!(absent.shadow, None);
        let cleared: LayerPatch = serde_json::from_str(r#"{"shadow": null}"#).unwrap();
        assert_eq!(cleared.shadow, Some(None));
        let set: LayerPatch = serde_json::from_str(
            r##"{"shadow": {"color": "#111", "blur": 4, "offsetX": 1, "offsetY": 2}}"##,
        )
        .unwrap();
        assert_eq!(set.shadow.unwrap().unwrap().offset_y, 2.0);
    }

    #[test]
    fn canvas_state_uses_host_field_names() {
        let mut state = CanvasState::default();
        state.layers.push(layer("json_names"));
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"textLayers\""));
        assert!(json.contains("\"backgroundImage\":null"));
        assert!(json.contains("\"fontSize\":32.0"));
        assert!(json.contains("\"zIndex\":0"));
        assert!(!json.contains("shadow"));
    }

    #[test]
    fn missing_optional_fields_take_defaults() {
        let json = r##"{
            "id": "legacy", "text": "Hi", "x": 1, "y": 2, "fontSize": 12,
            "fontFamily": "Georgia", "fontWeight": "bold", "color": "#fff",
            "opacity": 0.5, "alignment": "center", "rotation": 0,
            "zIndex": 0, "lineHeight": 1.2
        }"##;
        let l: TextLayer = serde_json::from_str(json).unwrap();
        assert_eq!(l.scale_x, 1.0);
        assert_eq!(l.letter_spacing, 0.0);
        assert_eq!(l.shadow, None);
        assert_eq!(l.alignment, Alignment::Center);
    }

    #[test]
    fn normalize_sorts_and_densifies() {
        let mut state = CanvasState::default();
        let mut a = layer("norm_a");
        a.z_index = 7;
        let mut b = layer("norm_b");
        b.z_index = 2;
        state.layers = vec![a, b];
        state.normalize();
        assert_eq!(state.layers[0].id, LayerId::intern("norm_b"));
        assert!(state.is_densely_indexed());
    }

    #[test]
    fn normalize_drops_repeated_ids() {
        let mut state = CanvasState::default();
        let mut top = layer("norm_dup");
        top.z_index = 3;
        top.text = "top".into();
        let mut bottom = layer("norm_dup");
        bottom.z_index = 1;
        bottom.text = "bottom".into();
        state.layers = vec![top, layer("norm_other"), bottom];
        state.normalize();

        let ids: Vec<&str> = state.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["norm_other", "norm_dup"]);
        assert_eq!(state.layer(LayerId::intern("norm_dup")).unwrap().text, "bottom");
        assert!(state.is_densely_indexed());
    }
}
