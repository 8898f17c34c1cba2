//! Label rendering.
//!
//! A label is drawn by one of two strategies: [`RichText`] embeds converted
//! XHTML in a `foreignObject`, [`PlainText`] lays out one `<text>` run per
//! line. Both measure the label, apply alignment and honour the clip and
//! overflow policies.

mod measure;
mod plain;
mod rich;

use std::fmt;

use enum_dispatch::enum_dispatch;

pub use measure::{MeasureRequest, Probe, ProportionalMeasurer, TextMeasurer};
pub use plain::PlainText;
pub use rich::RichText;

use crate::defaults;
use crate::dom::{Document, NodeId};
use crate::state::CanvasState;
use crate::svg_canvas::SvgCanvas;
use crate::types::{Align, Overflow, TextDirection, TextFormat, VAlign};

/// Placement and layout policy of one label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub align: Align,
    pub valign: VAlign,
    pub wrap: bool,
    pub format: TextFormat,
    pub overflow: Overflow,
    pub clip: bool,
    /// Label rotation in degrees, on top of the canvas rotation.
    pub rotation: f64,
    pub direction: Option<TextDirection>,
}

impl TextLayout {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            align: Align::Left,
            valign: VAlign::Top,
            wrap: false,
            format: TextFormat::Plain,
            overflow: Overflow::Visible,
            clip: false,
            rotation: 0.0,
            direction: None,
        }
    }

    pub fn align(mut self, align: Align, valign: VAlign) -> Self {
        self.align = align;
        self.valign = valign;
        self
    }

    pub fn html(mut self) -> Self {
        self.format = TextFormat::Html;
        self
    }

    pub fn wrap(mut self) -> Self {
        self.wrap = true;
        self
    }

    pub fn overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn clip(mut self) -> Self {
        self.clip = true;
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn direction(mut self, direction: TextDirection) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// A way of turning a label into output nodes.
///
/// `layout` coordinates already include the canvas offset.
#[enum_dispatch]
pub trait TextStrategy {
    fn render(&self, canvas: &mut SvgCanvas, layout: &TextLayout, content: &str);
}

/// The strategy chosen for a label.
#[enum_dispatch(TextStrategy)]
#[derive(Debug, Clone, Copy)]
pub enum TextRenderer {
    RichText,
    PlainText,
}

impl TextRenderer {
    /// Rich rendering needs both an HTML label and foreign content enabled.
    pub fn select(format: TextFormat, foreign_content: bool) -> Self {
        match format {
            TextFormat::Html if foreign_content => TextRenderer::RichText(RichText),
            _ => TextRenderer::PlainText(PlainText),
        }
    }
}

/// Ordered CSS declarations; setting an existing property keeps its place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CssStyle {
    decls: Vec<(String, String)>,
}

impl CssStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.decls.iter_mut().find(|(p, _)| p == property) {
            Some(slot) => slot.1 = value,
            None => self.decls.push((property.to_string(), value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.decls
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Append `prop:value;` declarations.
    pub fn extend_from(&mut self, css: &str) {
        for decl in css.split(';') {
            if let Some((property, value)) = decl.split_once(':') {
                self.set(property.trim(), value.trim());
            }
        }
    }
}

impl fmt::Display for CssStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (property, value) in &self.decls {
            write!(f, "{property}:{value};")?;
        }
        Ok(())
    }
}

/// Background and border declarations of the current font state.
pub(crate) fn font_box_css(state: &CanvasState) -> String {
    let mut css = String::new();
    if let Some(background) = &state.font_background_color {
        css.push_str(&format!("background-color:{background};"));
    }
    if let Some(border) = &state.font_border_color {
        css.push_str(&format!("border:1px solid {border};"));
    }
    css
}

/// Font color, weight, style and decoration as presentation attributes.
///
/// With a style section the default family is inherited and omitted.
pub(crate) fn apply_font(doc: &mut Document, node: NodeId, state: &CanvasState, style_enabled: bool) {
    doc.set_attr(node, "fill", state.font_color.as_deref().unwrap_or("none"));
    if !style_enabled || state.font_family != defaults::FONT_FAMILY {
        doc.set_attr(node, "font-family", state.font_family.as_str());
    }
    apply_font_style(doc, node, state);
}

pub(crate) fn apply_font_style(doc: &mut Document, node: NodeId, state: &CanvasState) {
    if state.font_style.is_bold() {
        doc.set_attr(node, "font-weight", "bold");
    }
    if state.font_style.is_italic() {
        doc.set_attr(node, "font-style", "italic");
    }
    if state.font_style.is_underline() {
        doc.set_attr(node, "text-decoration", "underline");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FontStyle;

    #[test]
    fn css_set_keeps_position() {
        let mut css = CssStyle::new();
        css.set("width", "10px");
        css.set("color", "red");
        css.set("width", "12px");
        assert_eq!(css.to_string(), "width:12px;color:red;");
    }

    #[test]
    fn css_extend_parses_declarations() {
        let mut css = CssStyle::new();
        css.extend_from("background-color:#fff;border:1px solid #000;");
        assert_eq!(css.get("border"), Some("1px solid #000"));
        assert_eq!(css.to_string(), "background-color:#fff;border:1px solid #000;");
    }

    #[test]
    fn selects_plain_without_foreign_content() {
        assert!(matches!(
            TextRenderer::select(TextFormat::Html, false),
            TextRenderer::PlainText(_)
        ));
        assert!(matches!(
            TextRenderer::select(TextFormat::Html, true),
            TextRenderer::RichText(_)
        ));
        assert!(matches!(
            TextRenderer::select(TextFormat::Plain, true),
            TextRenderer::PlainText(_)
        ));
    }

    #[test]
    fn font_attributes_follow_style_bits() {
        let mut doc = Document::export();
        let g = doc.create_element("g");
        let state = CanvasState {
            font_style: FontStyle(FontStyle::ITALIC | FontStyle::UNDERLINE),
            ..CanvasState::default()
        };
        apply_font(&mut doc, g, &state, true);
        assert_eq!(
            doc.attrs(g),
            &[
                ("fill".to_string(), "#000000".to_string()),
                ("font-style".to_string(), "italic".to_string()),
                ("text-decoration".to_string(), "underline".to_string()),
            ]
        );
    }
}
