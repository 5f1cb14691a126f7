//! Document → native-resolution raster plan.
//!
//! The on-screen canvas is a scaled-down view of the background image.
//! Export redraws the document at the image's own pixel size: the background
//! 1:1, and every text layer mapped from display space with
//! `native / display` scale factors. Planning is pure; drawing goes through
//! an [`ExportTarget`] so the browser canvas and test doubles share it.

use ado_core::id::LayerId;
use ado_core::model::{Alignment, CanvasState, FontWeight, Shadow, TextLayer};
use kurbo::Affine;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("No canvas or background image available")]
    NoBackground,

    #[error("Failed to export image: cannot decode background ({0})")]
    Decode(String),

    #[error("Failed to export image: {0}")]
    Raster(String),

    #[error("Failed to export image: PNG encoding failed ({0})")]
    Encode(String),
}

/// Download name for an export taken at `timestamp_ms` (Unix epoch millis).
pub fn export_filename(timestamp_ms: u64) -> String {
    format!("adomate-design-{timestamp_ms}.png")
}

// ─── Plan ────────────────────────────────────────────────────────────────

/// One line of a text layer, positioned in layer-local space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Top of the line (text baseline is `top`).
    pub y: f64,
}

/// Everything a raster target needs to draw one text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDraw {
    pub id: LayerId,
    /// Layer-local → export space: translate, then rotate, then scale.
    pub transform: Affine,
    /// CSS font shorthand at export scale, e.g. `bold 96px Roboto`.
    pub font: String,
    pub fill: String,
    pub opacity: f64,
    pub align: Alignment,
    pub letter_spacing: f64,
    pub shadow: Option<Shadow>,
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Bottom to top.
    pub layers: Vec<LayerDraw>,
}

/// Plan an export of `state` at the background's native `(width, height)`.
pub fn plan_export(state: &CanvasState, native: (u32, u32)) -> Result<ExportPlan, ExportError> {
    let background = state
        .background_image
        .clone()
        .ok_or(ExportError::NoBackground)?;
    let (width, height) = native;
    if width == 0 || height == 0 {
        return Err(ExportError::Decode("background has no pixels".into()));
    }
    if state.canvas_width <= 0.0 || state.canvas_height <= 0.0 {
        return Err(ExportError::Raster("display canvas has no area".into()));
    }
    let scale_x = width as f64 / state.canvas_width;
    let scale_y = height as f64 / state.canvas_height;

    let mut layers: Vec<&TextLayer> = state.layers.iter().collect();
    layers.sort_by_key(|l| l.z_index);
    let layers = layers
        .into_iter()
        .map(|l| plan_layer(l, scale_x, scale_y))
        .collect();

    log::debug!("export plan: {width}x{height}, scale {scale_x:.3}x{scale_y:.3}");
    Ok(ExportPlan {
        width,
        height,
        background,
        scale_x,
        scale_y,
        layers,
    })
}

/// Font metrics follow the horizontal factor; only the origin uses both.
fn plan_layer(layer: &TextLayer, scale_x: f64, scale_y: f64) -> LayerDraw {
    let transform = Affine::translate((layer.x * scale_x, layer.y * scale_y))
        * Affine::rotate(layer.rotation.to_radians())
        * Affine::scale_non_uniform(layer.scale_x, layer.scale_y);

    let font_size = layer.font_size * scale_x;
    let advance = layer.font_size * layer.line_height * scale_x;
    let lines = layer
        .text
        .split('\n')
        .enumerate()
        .map(|(i, text)| TextLine {
            text: text.to_string(),
            y: i as f64 * advance,
        })
        .collect();

    LayerDraw {
        id: layer.id,
        transform,
        font: css_font(layer.font_weight, font_size, &layer.font_family),
        fill: layer.color.clone(),
        opacity: layer.opacity,
        align: layer.alignment,
        letter_spacing: layer.letter_spacing * scale_x,
        shadow: layer.shadow.as_ref().map(|s| Shadow {
            color: s.color.clone(),
            blur: s.blur * scale_x,
            offset_x: s.offset_x * scale_x,
            offset_y: s.offset_y * scale_x,
        }),
        lines,
    }
}

/// CSS `font` shorthand. Named weights the CSS grammar lacks become numbers.
pub fn css_font(weight: FontWeight, size_px: f64, family: &str) -> String {
    let weight = match weight {
        FontWeight::Normal => "normal".to_string(),
        FontWeight::Bold => "bold".to_string(),
        other => other.css_weight().to_string(),
    };
    format!("{weight} {size_px}px {family}")
}

// ─── Targets ─────────────────────────────────────────────────────────────

/// A raster surface an [`ExportPlan`] can be drawn into.
pub trait ExportTarget {
    type Output;

    /// Allocate a `width`×`height` surface.
    fn begin(&mut self, width: u32, height: u32) -> Result<(), ExportError>;
    /// Draw the background image at `(0, 0)`, unscaled.
    fn draw_background(&mut self, source: &str, width: u32, height: u32)
    -> Result<(), ExportError>;
    fn draw_layer(&mut self, layer: &LayerDraw) -> Result<(), ExportError>;
    /// Encode the surface as PNG.
    fn finish(&mut self) -> Result<Self::Output, ExportError>;
    /// Free the surface. Called once per export, after success or failure.
    fn release(&mut self);
}

/// Draw `plan` into `target` and encode it. The target is released whatever
/// the outcome.
pub fn render_plan<T: ExportTarget>(target: &mut T, plan: &ExportPlan) -> Result<T::Output, ExportError> {
    let result = draw_all(target, plan);
    target.release();
    if let Err(e) = &result {
        log::warn!("export failed: {e}");
    }
    result
}

fn draw_all<T: ExportTarget>(target: &mut T, plan: &ExportPlan) -> Result<T::Output, ExportError> {
    target.begin(plan.width, plan.height)?;
    target.draw_background(&plan.background, plan.width, plan.height)?;
    for layer in &plan.layers {
        log::trace!("export layer {:?}: {} line(s)", layer.id, layer.lines.len());
        target.draw_layer(layer)?;
    }
    target.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ado_core::model::LayerTemplate;
    use kurbo::Point;
    use pretty_assertions::assert_eq;

    fn state_with(layers: Vec<TextLayer>) -> CanvasState {
        CanvasState {
            background_image: Some("data:image/png;base64,AAAA".into()),
            layers,
            canvas_width: 800.0,
            canvas_height: 450.0,
        }
    }

    fn layer(name: &str, x: f64, y: f64) -> TextLayer {
        TextLayer::from_template(LayerId::intern(name), &LayerTemplate::default(), x, y)
    }

    fn close(a: Point, b: Point) -> bool {
        (a - b).hypot() < 1e-9
    }

    #[test]
    fn filename_carries_timestamp() {
        assert_eq!(export_filename(1712345678901), "adomate-design-1712345678901.png");
    }

    #[test]
    fn positions_and_fonts_scale_to_native() {
        let mut l = layer("export-scale", 100.0, 50.0);
        l.text = "one\ntwo\nthree".into();
        l.font_weight = FontWeight::Bold;
        let plan = plan_export(&state_with(vec![l]), (1600, 900)).unwrap();
        assert_eq!((plan.scale_x, plan.scale_y), (2.0, 2.0));

        let d = &plan.layers[0];
        assert!(close(d.transform * Point::ZERO, Point::new(200.0, 100.0)));
        assert_eq!(d.font, "bold 64px Arial");
        let ys: Vec<f64> = d.lines.iter().map(|l| l.y).collect();
        // 32 * 1.2 * 2 per line
        assert!((ys[1] - 76.8).abs() < 1e-9);
        assert!((ys[2] - 153.6).abs() < 1e-9);
        assert_eq!(d.lines[2].text, "three");
    }

    #[test]
    fn rotation_and_scale_pivot_on_layer_origin() {
        let mut l = layer("export-rotate", 10.0, 20.0);
        l.rotation = 90.0;
        l.scale_x = 2.0;
        let plan = plan_export(&state_with(vec![l]), (800, 450)).unwrap();
        let t = plan.layers[0].transform;
        assert!(close(t * Point::ZERO, Point::new(10.0, 20.0)));
        // Local +x is scaled by 2 then rotated a quarter turn onto +y.
        assert!(close(t * Point::new(1.0, 0.0), Point::new(10.0, 22.0)));
    }

    #[test]
    fn layers_are_drawn_bottom_to_top() {
        let mut a = layer("export-a", 0.0, 0.0);
        let mut b = layer("export-b", 0.0, 0.0);
        a.z_index = 1;
        b.z_index = 0;
        let plan = plan_export(&state_with(vec![a, b]), (800, 450)).unwrap();
        let ids: Vec<&str> = plan.layers.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["export-b", "export-a"]);
    }

    #[test]
    fn no_background_is_an_error() {
        let mut state = state_with(vec![]);
        state.background_image = None;
        assert_eq!(plan_export(&state, (10, 10)), Err(ExportError::NoBackground));
    }

    #[test]
    fn css_font_uses_numbers_for_uncommon_weights() {
        assert_eq!(css_font(FontWeight::SemiBold, 12.0, "Inter"), "600 12px Inter");
        assert_eq!(css_font(FontWeight::Normal, 12.5, "Inter"), "normal 12.5px Inter");
    }

    // ─── Targets ─────────────────────────────────────────────────────────

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail_on_layer: bool,
    }

    impl ExportTarget for Recorder {
        type Output = Vec<String>;

        fn begin(&mut self, width: u32, height: u32) -> Result<(), ExportError> {
            self.calls.push(format!("begin {width}x{height}"));
            Ok(())
        }

        fn draw_background(&mut self, _: &str, width: u32, height: u32) -> Result<(), ExportError> {
            self.calls.push(format!("bg {width}x{height}"));
            Ok(())
        }

        fn draw_layer(&mut self, layer: &LayerDraw) -> Result<(), ExportError> {
            if self.fail_on_layer {
                return Err(ExportError::Raster("font missing".into()));
            }
            self.calls.push(format!("layer {}", layer.id));
            Ok(())
        }

        fn finish(&mut self) -> Result<Vec<String>, ExportError> {
            self.calls.push("png".into());
            Ok(self.calls.clone())
        }

        fn release(&mut self) {
            self.calls.push("release".into());
        }
    }

    #[test]
    fn render_plan_draws_in_order_and_releases() {
        let plan = plan_export(&state_with(vec![layer("export-r", 1.0, 1.0)]), (800, 450)).unwrap();
        let mut target = Recorder::default();
        let out = render_plan(&mut target, &plan).unwrap();
        assert_eq!(out, vec!["begin 800x450", "bg 800x450", "layer export-r", "png"]);
        assert_eq!(target.calls.last().map(String::as_str), Some("release"));
    }

    #[test]
    fn render_plan_releases_on_failure() {
        let plan = plan_export(&state_with(vec![layer("export-f", 1.0, 1.0)]), (800, 450)).unwrap();
        let mut target = Recorder {
            fail_on_layer: true,
            ..Recorder::default()
        };
        assert!(render_plan(&mut target, &plan).is_err());
        assert_eq!(target.calls, vec!["begin 800x450", "bg 800x450", "release"]);
    }
}
