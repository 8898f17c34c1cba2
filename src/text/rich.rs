//! Labels as embedded XHTML inside a `foreignObject`.

use glam::DVec2;

use super::{CssStyle, MeasureRequest, TextLayout, TextStrategy, apply_font_style, font_box_css};
use crate::canvas::Canvas2D;
use crate::defaults;
use crate::dom::{Document, NodeId};
use crate::markup;
use crate::state::CanvasState;
use crate::svg_canvas::SvgCanvas;
use crate::types::{Align, Overflow, Size, fmt_int, fmt_num, fmt2};

/// Renders markup labels as a `g > foreignObject > div` tree.
///
/// The label is measured on an offscreen copy of the div, the measured box is
/// constrained by the clip and overflow policies and then aligned. Export
/// documents additionally carry a `<switch>` with a plain `<text>` fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct RichText;

impl TextStrategy for RichText {
    fn render(&self, canvas: &mut SvgCanvas, layout: &TextLayout, content: &str) {
        let xhtml = match markup::to_xhtml(content) {
            Ok(xhtml) => xhtml,
            Err(_err) => {
                crate::log::warn!(error = %_err, "ignoring label with invalid markup");
                return;
            }
        };

        let state = canvas.state().clone();
        let line_height = defaults::LINE_HEIGHT * canvas.options().line_height_correction;
        let (w, h) = (layout.width, layout.height);
        let wraps = layout.wrap && w > 0.0;

        let mut div_css = CssStyle::new();
        div_css.set("display", "inline-block");
        div_css.set("font-size", format!("{}px", fmt_num(state.font_size)));
        div_css.set("font-family", state.font_family.as_str());
        if let Some(color) = &state.font_color {
            div_css.set("color", color.as_str());
        }
        div_css.set("line-height", fmt_num(line_height));
        div_css.extend_from(&box_style(layout));
        if state.font_style.is_bold() {
            div_css.set("font-weight", "bold");
        }
        if state.font_style.is_italic() {
            div_css.set("font-style", "italic");
        }
        if state.font_style.is_underline() {
            div_css.set("text-decoration", "underline");
        }
        match layout.align {
            Align::Center => div_css.set("text-align", "center"),
            Align::Right => div_css.set("text-align", "right"),
            Align::Left => {}
        }

        let box_css = font_box_css(&state);
        let inner = match layout.overflow {
            Overflow::Fill | Overflow::Width => {
                div_css.extend_from(&box_css);
                xhtml
            }
            // Inner div is what gets measured for wrapped text
            Overflow::Visible => format!(
                r#"<div xmlns="{}" style="display:inline-block;text-align:inherit;text-decoration:inherit;{}">{}</div>"#,
                defaults::NS_XHTML,
                box_css,
                xhtml
            ),
        };

        let doc = canvas.doc_mut();
        let div = doc.create_element("div");
        doc.set_attr(div, "xmlns", defaults::NS_XHTML);
        if let Some(dir) = layout.direction {
            doc.set_attr(div, "dir", dir.as_str());
        }
        let raw = doc.create_raw(inner);
        doc.append_child(div, raw);

        let request = |max_width: Option<f64>| MeasureRequest {
            font_size: state.font_size,
            font_family: state.font_family.clone(),
            font_style: state.font_style,
            line_height,
            max_width,
        };
        let wrap_width = wraps.then(|| (w + 1.0).round());

        let (mut w, mut h) = (w, h);
        match layout.overflow {
            Overflow::Fill => {}
            Overflow::Width => {
                let size = measure_or_zero(canvas, div, &request(wrap_width));
                let limit = if h > 0.0 { h.round() } else { f64::INFINITY };
                let mut oh = size.height.min(limit) - defaults::RICH_TEXT_PADDING;
                if layout.clip {
                    oh = oh.min(h);
                }
                h = oh;
            }
            Overflow::Visible => {
                let first = measure_or_zero(canvas, div, &request(wrap_width));
                let mut nowrap = !wraps;

                // Export viewers have different font metrics, so a label that
                // fits unwrapped is pinned to one line
                if !layout.clip && wraps && !canvas.document().is_live() {
                    let natural = measure_or_zero(canvas, div, &request(None));
                    if first.width >= natural.width {
                        div_css.set("white-space", "nowrap");
                        nowrap = true;
                    }
                }

                let mut ow = first.width + defaults::RICH_TEXT_PADDING - 1.0;
                if layout.wrap {
                    if layout.clip {
                        ow = ow.min(w);
                    }
                    div_css.set("width", format!("{}px", fmt_num(ow)));
                }

                let remeasure_width = if nowrap { None } else { Some(ow) };
                let last = measure_or_zero(canvas, div, &request(remeasure_width));
                let mut ow = last.width;
                let mut oh = last.height - defaults::RICH_TEXT_PADDING;
                if layout.clip {
                    oh = oh.min(h);
                    ow = ow.min(w);
                }
                w = ow;
                h = oh;
            }
        }

        let doc = canvas.doc_mut();
        doc.set_attr(div, "style", div_css.to_string());

        let group = doc.create_element("g");
        if state.alpha < 1.0 {
            doc.set_attr(group, "opacity", fmt_num(state.alpha));
        }
        let fo = doc.create_element("foreignObject");
        doc.set_attr(fo, "style", "overflow:visible;");
        doc.set_attr(fo, "pointer-events", "all");
        doc.append_child(fo, div);
        doc.append_child(group, fo);

        let rotate_html = canvas.options().rotate_html;
        let fo_offset = canvas.options().fo_offset;
        let transform = placement(&state, layout, w, h, rotate_html, fo_offset);

        let doc = canvas.doc_mut();
        doc.set_attr(group, "transform", transform);
        doc.set_attr(fo, "width", fmt_int(w.max(1.0)));
        doc.set_attr(fo, "height", fmt_int(h.max(1.0)));

        let alt_text = canvas.options().fo_alt_text.clone();
        if let Some(alt_text) = alt_text.filter(|_| !canvas.document().is_live()) {
            let doc = canvas.doc_mut();
            doc.set_attr(fo, "requiredFeatures", defaults::EXTENSIBILITY_FEATURE);
            let alt = alternate_text(doc, &state, &alt_text, w, h);
            let switch = doc.create_element("switch");
            doc.append_child(switch, fo);
            doc.append_child(switch, alt);
            doc.append_child(group, switch);
        }

        canvas.append(group);
    }
}

/// Size constraints for the outer div.
fn box_style(layout: &TextLayout) -> String {
    let (w, h) = (layout.width, layout.height);
    let mut style = String::from("vertical-align:top;");
    if layout.clip {
        style.push_str(&format!(
            "overflow:hidden;max-height:{}px;max-width:{}px;",
            fmt_int(h),
            fmt_int(w)
        ));
    } else {
        match layout.overflow {
            Overflow::Fill => style.push_str(&format!(
                "width:{}px;height:{}px;overflow:hidden;",
                fmt_int(w + 1.0),
                fmt_int(h + 1.0)
            )),
            Overflow::Width => {
                style.push_str(&format!("width:{}px;", fmt_int(w + 1.0)));
                if h > 0.0 {
                    style.push_str(&format!("max-height:{}px;overflow:hidden;", fmt_int(h)));
                }
            }
            Overflow::Visible => {}
        }
    }

    if layout.wrap && w > 0.0 {
        style.push_str(&format!(
            "width:{}px;white-space:normal;word-wrap:{};",
            fmt_int(w + 1.0),
            defaults::WORD_WRAP
        ));
    } else {
        style.push_str("white-space:nowrap;");
    }
    style
}

fn measure_or_zero(canvas: &mut SvgCanvas, div: NodeId, request: &MeasureRequest) -> Size {
    match canvas.measure(div, request) {
        Ok(size) => size,
        Err(_err) => {
            crate::log::warn!(error = %_err, "label measurement failed");
            Size::default()
        }
    }
}

/// Transform of the label group: aligned, scaled and rotated.
fn placement(
    state: &CanvasState,
    layout: &TextLayout,
    w: f64,
    h: f64,
    rotate_html: bool,
    fo_offset: f64,
) -> String {
    let s = state.scale;
    let dx = layout.align.offset(w);
    let dy = layout.valign.offset(h);
    let mut pos = DVec2::new(layout.x + dx, layout.y + dy);

    let mut tr = String::new();
    if s != 1.0 {
        tr.push_str(&format!("scale({})", fmt_num(s)));
    }

    if state.rotation != 0.0 && rotate_html {
        tr.push_str(&format!(
            "rotate({},{},{})",
            fmt2(state.rotation),
            fmt2(w / 2.0),
            fmt2(h / 2.0)
        ));
        let center = (pos + DVec2::new(w, h) / 2.0) * s;
        let center = rotate_point(center, state.rotation, state.rotation_pivot);
        pos = center - DVec2::new(w, h) * s / 2.0;
    } else {
        pos *= s;
    }

    if layout.rotation != 0.0 {
        tr.push_str(&format!(
            "rotate({},{},{})",
            fmt2(layout.rotation),
            fmt2(-dx),
            fmt2(-dy)
        ));
    }

    format!(
        "translate({},{}){}",
        fmt_num(pos.x.round() + fo_offset),
        fmt_num(pos.y.round() + fo_offset),
        tr
    )
}

/// Rotate `point` by `degrees` about `pivot`.
fn rotate_point(point: DVec2, degrees: f64, pivot: DVec2) -> DVec2 {
    DVec2::from_angle(degrees.to_radians()).rotate(point - pivot) + pivot
}

fn alternate_text(
    doc: &mut Document,
    state: &CanvasState,
    alt_text: &str,
    w: f64,
    h: f64,
) -> NodeId {
    let alt = doc.create_element("text");
    doc.set_attr(alt, "x", fmt_int(w / 2.0));
    doc.set_attr(alt, "y", fmt_int((h + state.font_size) / 2.0));
    doc.set_attr(alt, "fill", state.font_color.as_deref().unwrap_or("black"));
    doc.set_attr(alt, "text-anchor", "middle");
    doc.set_attr(alt, "font-size", format!("{}px", fmt_num(state.font_size)));
    doc.set_attr(alt, "font-family", state.font_family.as_str());
    apply_font_style(doc, alt, state);
    let content = doc.create_text(alt_text);
    doc.append_child(alt, content);
    alt
}
