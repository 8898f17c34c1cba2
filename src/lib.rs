//! A retained-state 2D drawing canvas that writes SVG.
//!
//! A command producer drives a [`Canvas2D`]: it saves and restores state,
//! sets paint and font attributes, builds paths and shapes and paints them,
//! places images and labels and wraps output in links. [`SvgCanvas`] turns
//! each painted primitive into SVG elements in a [`Document`], sharing
//! gradient and clip definitions through a `<defs>` container.
//!
//! ```
//! use svgcanvas::{Canvas2D, CanvasOptions, SvgCanvas};
//!
//! let mut canvas = SvgCanvas::export(CanvasOptions::default());
//! canvas.set_fill_color(Some("#dae8fc"));
//! canvas.set_stroke_color(Some("#6c8ebf"));
//! let shape = canvas.rect(10.0, 10.0, 120.0, 60.0);
//! canvas.fill_and_stroke(shape);
//! let svg = canvas.to_svg_string().unwrap();
//! assert!(svg.contains(r##"<rect x="10" y="10" width="120" height="60" fill="#dae8fc""##));
//! ```

pub mod canvas;
pub mod clip;
pub mod convert;
pub mod defaults;
pub mod dom;
pub mod errors;
mod log;
pub mod markup;
pub mod paint;
pub mod path_builder;
pub mod session;
pub mod state;
pub mod svg_canvas;
pub mod text;
pub mod types;

pub use canvas::Canvas2D;
pub use convert::{IdentityConverter, SourceConverter, UrlConverter};
pub use dom::{Document, DocumentMode, NodeId};
pub use errors::{CanvasError, MarkupError, MeasureError};
pub use paint::PendingPrimitive;
pub use state::CanvasState;
pub use svg_canvas::{CanvasOptions, SvgCanvas};
pub use text::{MeasureRequest, Probe, ProportionalMeasurer, TextLayout, TextMeasurer};
pub use types::{
    Align, Bounds, FontStyle, GradientDirection, LineCap, LineJoin, Overflow, Size,
    TextDirection, TextFormat, VAlign,
};
