//! Canvas2D export target.
//!
//! Draws an [`ExportPlan`](ado_render::ExportPlan) onto an offscreen
//! `<canvas>` sized to the background's native resolution and encodes it as
//! a PNG data URL.

use ado_render::export::{ExportError, ExportTarget, LayerDraw};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

fn raster(context: &str, e: JsValue) -> ExportError {
    ExportError::Raster(format!("{context}: {e:?}"))
}

pub struct Canvas2dTarget {
    /// Decoded background, loaded by the host before export.
    background: HtmlImageElement,
    canvas: Option<HtmlCanvasElement>,
    ctx: Option<CanvasRenderingContext2d>,
}

impl Canvas2dTarget {
    pub fn new(background: HtmlImageElement) -> Self {
        Self {
            background,
            canvas: None,
            ctx: None,
        }
    }

    fn ctx(&self) -> Result<&CanvasRenderingContext2d, ExportError> {
        self.ctx
            .as_ref()
            .ok_or_else(|| ExportError::Raster("surface not allocated".into()))
    }
}

impl ExportTarget for Canvas2dTarget {
    /// `data:image/png;base64,…`
    type Output = String;

    fn begin(&mut self, width: u32, height: u32) -> Result<(), ExportError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ExportError::Raster("no document".into()))?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|e| raster("createElement", e))?
            .dyn_into()
            .map_err(|_| ExportError::Raster("not a canvas".into()))?;
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| raster("getContext", e))?
            .ok_or_else(|| ExportError::Raster("2d context unavailable".into()))?
            .dyn_into()
            .map_err(|_| ExportError::Raster("not a 2d context".into()))?;
        self.canvas = Some(canvas);
        self.ctx = Some(ctx);
        Ok(())
    }

    fn draw_background(&mut self, _source: &str, width: u32, height: u32) -> Result<(), ExportError> {
        if self.background.natural_width() == 0 {
            return Err(ExportError::Decode("background image not loaded".into()));
        }
        self.ctx()?
            .draw_image_with_html_image_element_and_dw_and_dh(
                &self.background,
                0.0,
                0.0,
                width as f64,
                height as f64,
            )
            .map_err(|e| raster("drawImage", e))
    }

    fn draw_layer(&mut self, layer: &LayerDraw) -> Result<(), ExportError> {
        let ctx = self.ctx()?;
        ctx.save();
        let [a, b, c, d, e, f] = layer.transform.as_coeffs();
        ctx.set_transform(a, b, c, d, e, f)
            .map_err(|err| raster("setTransform", err))?;
        ctx.set_font(&layer.font);
        ctx.set_fill_style_str(&layer.fill);
        ctx.set_global_alpha(layer.opacity);
        ctx.set_text_align(layer.align.as_str());
        ctx.set_text_baseline("top");
        if layer.letter_spacing != 0.0 {
            // Not in every web-sys release; set it reflectively.
            let _ = js_sys::Reflect::set(
                ctx,
                &JsValue::from_str("letterSpacing"),
                &JsValue::from_str(&format!("{}px", layer.letter_spacing)),
            );
        }
        if let Some(shadow) = &layer.shadow {
            ctx.set_shadow_color(&shadow.color);
            ctx.set_shadow_blur(shadow.blur);
            ctx.set_shadow_offset_x(shadow.offset_x);
            ctx.set_shadow_offset_y(shadow.offset_y);
        }
        let drawn = layer
            .lines
            .iter()
            .try_for_each(|line| ctx.fill_text(&line.text, 0.0, line.y));
        ctx.restore();
        drawn.map_err(|e| raster("fillText", e))
    }

    fn finish(&mut self) -> Result<String, ExportError> {
        self.canvas
            .as_ref()
            .ok_or_else(|| ExportError::Encode("surface not allocated".into()))?
            .to_data_url_with_type("image/png")
            .map_err(|e| ExportError::Encode(format!("{e:?}")))
    }

    fn release(&mut self) {
        self.ctx = None;
        if let Some(canvas) = self.canvas.take() {
            canvas.set_width(0);
            canvas.set_height(0);
            canvas.remove();
        }
    }
}
