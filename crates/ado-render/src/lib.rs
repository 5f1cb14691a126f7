pub mod export;

pub use export::{
    ExportError, ExportPlan, ExportTarget, LayerDraw, TextLine, css_font, export_filename,
    plan_export, render_plan,
};
