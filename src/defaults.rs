//! Default painting values and output constants

pub const NS_SVG: &str = "http://www.w3.org/2000/svg";
pub const NS_XLINK: &str = "http://www.w3.org/1999/xlink";
pub const NS_XHTML: &str = "http://www.w3.org/1999/xhtml";

pub const FONT_FAMILY: &str = "Arial,Helvetica";
pub const FONT_SIZE: f64 = 11.0;
pub const FONT_COLOR: &str = "#000000";
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;
pub const WORD_WRAP: &str = "normal";

pub const SHADOW_COLOR: &str = "gray";
pub const SHADOW_OFFSET_X: f64 = 2.0;
pub const SHADOW_OFFSET_Y: f64 = 3.0;
pub const SHADOW_ALPHA: f64 = 1.0;

pub const DASH_PATTERN: [f64; 2] = [3.0, 3.0];
pub const MITER_LIMIT: f64 = 10.0;
pub const STROKE_WIDTH: f64 = 1.0;

/// Inset added around plain-text clip regions, in pixels.
pub const CLIP_MARGIN: f64 = 2.0;
/// Padding applied to measured rich-text boxes.
pub const RICH_TEXT_PADDING: f64 = 2.0;

pub const FO_ALT_TEXT: &str = "[Object]";
pub const EXTENSIBILITY_FEATURE: &str = "http://www.w3.org/TR/SVG11/feature#Extensibility";
pub const POINTER_EVENTS_VALUE: &str = "all";
