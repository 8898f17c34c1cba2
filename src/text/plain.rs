//! Labels as `<text>` runs, one per line.

use super::{MeasureRequest, TextLayout, TextStrategy, apply_font};
use crate::canvas::Canvas2D;
use crate::defaults;
use crate::dom::NodeId;
use crate::state::CanvasState;
use crate::svg_canvas::SvgCanvas;
use crate::types::{Bounds, Overflow, VAlign, fmt_num, fmt2, round2};

/// Renders a label as a `<g>` of `<text>` elements.
///
/// Horizontal alignment is left to `text-anchor`; only the baseline of each
/// line is computed here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl TextStrategy for PlainText {
    fn render(&self, canvas: &mut SvgCanvas, layout: &TextLayout, content: &str) {
        let state = canvas.state().clone();
        let style_enabled = canvas.options().style_enabled;
        let s = state.scale;
        let size = state.font_size;
        let (x, y, w, h) = (layout.x, layout.y, layout.width, layout.height);

        let group = canvas.doc_mut().create_element("g");
        apply_font(canvas.doc_mut(), group, &state, style_enabled);

        let mut transform = state.transform.clone();
        if layout.rotation != 0.0 {
            transform.push_str(&format!(
                "rotate({},{},{})",
                fmt_num(layout.rotation),
                fmt2(x * s),
                fmt2(y * s)
            ));
        }

        let doc = canvas.doc_mut();
        if let Some(dir) = layout.direction {
            doc.set_attr(group, "direction", dir.as_str());
        }

        if layout.clip && w > 0.0 && h > 0.0 {
            let cx = x + layout.align.offset(w);
            let cy = match layout.overflow {
                Overflow::Fill => y,
                _ => y + layout.valign.offset(h),
            };
            let margin = defaults::CLIP_MARGIN;
            let id = canvas.add_clip(
                cx * s - margin,
                cy * s - margin,
                w * s + 2.0 * margin,
                h * s + 2.0 * margin,
            );
            let reference = canvas.reference(&id);
            canvas.doc_mut().set_attr(group, "clip-path", reference);
        }

        let doc = canvas.doc_mut();
        let anchor = layout.align.text_anchor();
        if anchor != "start" {
            doc.set_attr(group, "text-anchor", anchor);
        }
        if !style_enabled || size != defaults::FONT_SIZE {
            doc.set_attr(group, "font-size", format!("{}px", fmt_num(size * s)));
        }
        if !transform.is_empty() {
            doc.set_attr(group, "transform", transform);
        }
        if state.alpha < 1.0 {
            doc.set_attr(group, "opacity", fmt_num(state.alpha));
        }

        let lines: Vec<&str> = content.split('\n').collect();
        let line_height = (size * defaults::LINE_HEIGHT).round();
        let text_height = size + (lines.len() as f64 - 1.0) * line_height;
        let aligned_height = if canvas.options().match_html_alignment && layout.clip && h > 0.0 {
            text_height.min(h)
        } else {
            text_height
        };

        let mut baseline = y + size - 1.0;
        match (layout.valign, layout.overflow) {
            (VAlign::Middle, Overflow::Fill) => baseline -= h / 2.0,
            (VAlign::Middle, _) => baseline -= aligned_height / 2.0 + 1.0,
            (VAlign::Bottom, Overflow::Fill) => baseline -= h,
            (VAlign::Bottom, _) => baseline -= aligned_height + 2.0,
            (VAlign::Top, _) => {}
        }

        let text_offset = canvas.options().text_offset;
        let doc = canvas.doc_mut();
        for line in &lines {
            // Blank lines only advance the baseline
            if !line.trim().is_empty() {
                let text = doc.create_element("text");
                doc.set_attr(text, "x", fmt_num(round2(x * s) + text_offset));
                doc.set_attr(text, "y", fmt_num(round2(baseline * s) + text_offset));
                let run = doc.create_text(*line);
                doc.append_child(text, run);
                doc.append_child(group, text);
            }
            baseline += line_height;
        }

        canvas.append(group);

        let background_height = match layout.overflow {
            Overflow::Fill => h,
            _ => text_height,
        };
        add_background(
            canvas,
            group,
            &lines,
            layout,
            &state,
            Bounds::new(x, y, w, background_height),
        );
    }
}

/// Insert the font background and border rectangle behind the label.
///
/// `area` is the label box before alignment, in logical units.
fn add_background(
    canvas: &mut SvgCanvas,
    group: NodeId,
    lines: &[&str],
    layout: &TextLayout,
    state: &CanvasState,
    area: Bounds,
) {
    if state.font_background_color.is_none() && state.font_border_color.is_none() {
        return;
    }
    let s = state.scale;
    let live = canvas.document().is_live();

    let bbox = match layout.overflow {
        Overflow::Fill | Overflow::Width => {
            let x = area.x + layout.align.offset(area.width);
            let y = area.y + layout.valign.offset(area.height);
            Some(Bounds::new(
                (x + 1.0) * s,
                y * s,
                (area.width - 2.0) * s,
                (area.height + 2.0) * s,
            ))
        }
        Overflow::Visible if live => match canvas.bounding_box(group) {
            Ok(b) => Some(Bounds::new(b.x, b.y + 1.0, b.width, b.height)),
            Err(_err) => {
                crate::log::warn!(error = %_err, "no bounding box for label background");
                None
            }
        },
        Overflow::Visible => {
            let probe = line_probe(canvas, lines);
            let request = MeasureRequest {
                font_size: state.font_size,
                font_family: state.font_family.clone(),
                font_style: state.font_style,
                line_height: defaults::LINE_HEIGHT,
                max_width: None,
            };
            match canvas.measure(probe, &request) {
                Ok(size) => {
                    let x = area.x + layout.align.offset(size.width);
                    let y = area.y + layout.valign.offset(size.height);
                    Some(Bounds::new(
                        (x + 1.0) * s,
                        (y + 2.0) * s,
                        size.width * s,
                        (size.height + 1.0) * s,
                    ))
                }
                Err(_err) => {
                    crate::log::warn!(error = %_err, "label background measurement failed");
                    None
                }
            }
        }
    };
    let Some(bbox) = bbox else {
        return;
    };

    let stroke_width = match state.font_border_color {
        Some(_) => round2(s).max(1.0),
        None => 0.0,
    };

    let doc = canvas.doc_mut();
    let rect = doc.create_element("rect");
    doc.set_attr(rect, "fill", state.font_background_color.as_deref().unwrap_or("none"));
    doc.set_attr(rect, "stroke", state.font_border_color.as_deref().unwrap_or("none"));
    doc.set_attr(rect, "x", fmt_num((bbox.x - 1.0).floor()));
    doc.set_attr(rect, "y", fmt_num((bbox.y - 1.0).floor()));
    doc.set_attr(rect, "width", fmt_num((bbox.width + 2.0).ceil()));
    doc.set_attr(rect, "height", fmt_num(bbox.height.ceil()));
    doc.set_attr(rect, "stroke-width", fmt_num(stroke_width));
    // Odd widths are shifted onto the pixel grid on screen
    if live && stroke_width % 2.0 == 1.0 {
        doc.set_attr(rect, "transform", "translate(0.5, 0.5)");
    }
    let first = doc.first_child(group);
    doc.insert_before(group, rect, first);
}

/// Unwrapped copy of the label lines for offscreen measurement.
fn line_probe(canvas: &mut SvgCanvas, lines: &[&str]) -> NodeId {
    let doc = canvas.doc_mut();
    let div = doc.create_element("div");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let br = doc.create_element("br");
            doc.append_child(div, br);
        }
        let text = doc.create_text(*line);
        doc.append_child(div, text);
    }
    div
}
