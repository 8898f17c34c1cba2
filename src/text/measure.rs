//! Text measurement.
//!
//! Labels are measured by attaching a probe node to the document's offscreen
//! host. [`Probe`] owns that attachment and removes the node again when it is
//! dropped, so an early return can never leak a probe into the document.

use crate::dom::{Document, NodeId};
use crate::errors::MeasureError;
use crate::markup;
use crate::types::{Bounds, FontStyle, Size};

/// Font and layout constraints for one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureRequest {
    pub font_size: f64,
    pub font_family: String,
    pub font_style: FontStyle,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Wrap lines at this width; `None` keeps every line unbroken.
    pub max_width: Option<f64>,
}

/// A node temporarily attached under the offscreen host.
pub struct Probe<'d> {
    doc: &'d mut Document,
    node: NodeId,
}

impl<'d> Probe<'d> {
    pub fn attach(doc: &'d mut Document, node: NodeId) -> Self {
        let host = doc.offscreen_host();
        doc.append_child(host, node);
        Self { doc, node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    /// Visible text of the probe, one entry per line.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_visible(self.doc, self.node, &mut out);
        out
    }
}

impl Drop for Probe<'_> {
    fn drop(&mut self) {
        self.doc.detach(self.node);
    }
}

fn collect_visible(doc: &Document, node: NodeId, out: &mut String) {
    match doc.tag(node) {
        Some("br") => out.push('\n'),
        Some(_) => {
            for &child in doc.children(node) {
                collect_visible(doc, child, out);
            }
        }
        None => match doc.raw_markup(node) {
            Some(raw) => match markup::plain_text(raw) {
                Ok(text) => out.push_str(&text),
                Err(_) => out.push_str(raw),
            },
            None => out.push_str(&doc.text_content(node)),
        },
    }
}

/// Host text-metrics service.
pub trait TextMeasurer {
    /// Rendered size of the probe's content.
    fn measure(&self, probe: &Probe<'_>, request: &MeasureRequest) -> Result<Size, MeasureError>;

    /// Bounding box of an attached node in output pixels.
    fn bounding_box(&self, doc: &Document, node: NodeId) -> Result<Bounds, MeasureError>;
}

/// Advance widths of printable ASCII in hundredths of a character cell.
const GLYPH_WIDTHS: [u8; 95] = [
    45, 55, 62, 115, 90, 132, 125, 40, // space ! " # $ % & '
    55, 55, 71, 115, 45, 48, 45, 50, // ( ) * + , - . /
    91, 91, 91, 91, 91, 91, 91, 91, // 0-7
    91, 91, 50, 50, 120, 120, 120, 78, // 8 9 : ; < = > ?
    142, 102, 105, 110, 115, 105, 98, 105, // @ A-G
    125, 58, 58, 107, 95, 145, 125, 115, // H-O
    95, 115, 107, 95, 97, 118, 102, 150, // P-W
    100, 93, 100, 58, 50, 58, 119, 72, // X Y Z [ \ ] ^ _
    72, 86, 92, 80, 92, 85, 52, 92, // ` a-g
    92, 47, 47, 88, 48, 135, 92, 86, // h-o
    92, 92, 69, 75, 58, 92, 80, 121, // p-w
    81, 80, 76, 91, 49, 91, 118, // x y z { | } ~
];

/// Width of one table unit in ems.
const EM_PER_UNIT: f64 = 0.0057;
const WIDE_GLYPH_UNITS: u32 = 100;
const BOLD_FACTOR: f64 = 1.1;
/// Distance from the baseline to the top of a line box, in ems.
const ASCENT: f64 = 0.9;
/// Height of a glyph run, in ems.
const RUN_HEIGHT: f64 = 1.15;

fn glyph_units(text: &str) -> u32 {
    text.chars()
        .map(|c| match c {
            ' '..='~' => GLYPH_WIDTHS[c as usize - 0x20] as u32,
            _ => WIDE_GLYPH_UNITS,
        })
        .sum()
}

/// Deterministic measurer based on a proportional glyph-width table.
///
/// Widths come from a per-glyph table scaled by the font size, bold text is
/// slightly wider, and wrapping is greedy at spaces. Sizes are rounded up to
/// whole pixels like layout-engine offset sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProportionalMeasurer;

impl ProportionalMeasurer {
    pub fn text_width(&self, text: &str, font_size: f64, style: FontStyle) -> f64 {
        let factor = if style.is_bold() { BOLD_FACTOR } else { 1.0 };
        glyph_units(text) as f64 * EM_PER_UNIT * font_size * factor
    }

    fn wrap_lines(&self, line: &str, request: &MeasureRequest, max_width: f64) -> Vec<f64> {
        let mut widths = Vec::new();
        let mut current = String::new();
        for word in line.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            let width = self.text_width(&candidate, request.font_size, request.font_style);
            if width > max_width && !current.is_empty() {
                widths.push(self.text_width(&current, request.font_size, request.font_style));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        widths.push(self.text_width(&current, request.font_size, request.font_style));
        widths
    }
}

impl TextMeasurer for ProportionalMeasurer {
    fn measure(&self, probe: &Probe<'_>, request: &MeasureRequest) -> Result<Size, MeasureError> {
        let text = probe.text();
        if text.trim().is_empty() {
            return Ok(Size::default());
        }

        let mut widths = Vec::new();
        for line in text.split('\n') {
            match request.max_width {
                Some(max_width) => widths.extend(self.wrap_lines(line, request, max_width)),
                None => widths.push(self.text_width(line, request.font_size, request.font_style)),
            }
        }

        let width = widths.iter().copied().fold(0.0, f64::max);
        let height = widths.len() as f64 * request.font_size * request.line_height;
        if !width.is_finite() || !height.is_finite() {
            return Err(MeasureError::NonFinite { width, height });
        }
        Ok(Size::new(width.ceil(), height.ceil()))
    }

    fn bounding_box(&self, doc: &Document, node: NodeId) -> Result<Bounds, MeasureError> {
        if !doc.is_attached(node) {
            return Err(MeasureError::Detached { node });
        }

        let font_size = doc
            .attr(node, "font-size")
            .and_then(|size| size.trim_end_matches("px").parse::<f64>().ok())
            .unwrap_or(crate::defaults::FONT_SIZE);
        let style = match doc.attr(node, "font-weight") {
            Some("bold") => FontStyle(FontStyle::BOLD),
            _ => FontStyle::default(),
        };
        let anchor = doc.attr(node, "text-anchor").unwrap_or("start");

        let mut bounds: Option<Bounds> = None;
        for &child in doc.children(node) {
            if doc.tag(child) != Some("text") {
                continue;
            }
            let coord = |name| {
                doc.attr(child, name)
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(0.0)
            };
            let width = self.text_width(&doc.text_content(child), font_size, style);
            let x = match anchor {
                "middle" => coord("x") - width / 2.0,
                "end" => coord("x") - width,
                _ => coord("x"),
            };
            let run = Bounds::new(
                x,
                coord("y") - ASCENT * font_size,
                width,
                RUN_HEIGHT * font_size,
            );
            bounds = Some(match bounds {
                Some(acc) => acc.union(&run),
                None => run,
            });
        }

        let bounds = bounds.ok_or(MeasureError::Empty)?;
        if !bounds.is_finite() {
            return Err(MeasureError::NonFinite {
                width: bounds.width,
                height: bounds.height,
            });
        }
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(max_width: Option<f64>) -> MeasureRequest {
        MeasureRequest {
            font_size: 10.0,
            font_family: "Arial".into(),
            font_style: FontStyle::default(),
            line_height: 1.2,
            max_width,
        }
    }

    fn text_probe(doc: &mut Document, text: &str) -> NodeId {
        let div = doc.create_element("div");
        let content = doc.create_text(text);
        doc.append_child(div, content);
        div
    }

    #[test]
    fn probe_is_detached_on_drop() {
        let mut doc = Document::export();
        let div = text_probe(&mut doc, "abc");
        {
            let probe = Probe::attach(&mut doc, div);
            assert_eq!(probe.document().parent(div), Some(probe.document().offscreen_host()));
        }
        assert_eq!(doc.parent(div), None);
    }

    #[test]
    fn probe_detaches_on_error_paths() {
        fn failing(doc: &mut Document, node: NodeId) -> Result<Size, MeasureError> {
            let _probe = Probe::attach(doc, node);
            Err(MeasureError::Empty)
        }
        let mut doc = Document::export();
        let div = text_probe(&mut doc, "abc");
        assert!(failing(&mut doc, div).is_err());
        assert!(doc.children(doc.offscreen_host()).is_empty());
    }

    #[test]
    fn measures_lines_and_width() {
        let mut doc = Document::export();
        // "nn" is 184 units
        let div = text_probe(&mut doc, "nn\nn");
        let probe = Probe::attach(&mut doc, div);
        let size = ProportionalMeasurer.measure(&probe, &request(None)).unwrap();
        assert_eq!(size, Size::new(11.0, 24.0));
    }

    #[test]
    fn wraps_greedily() {
        let mut doc = Document::export();
        let div = text_probe(&mut doc, "nn nn nn");
        let probe = Probe::attach(&mut doc, div);
        let size = ProportionalMeasurer.measure(&probe, &request(Some(25.0))).unwrap();
        // "nn nn" is 413 units wide, about 23.5px at 10px
        assert_eq!(size.height, 24.0);
        assert_eq!(size.width, 24.0);
    }

    #[test]
    fn reads_markup_content() {
        let mut doc = Document::export();
        let div = doc.create_element("div");
        let raw = doc.create_raw("<b>a</b><br />b");
        doc.append_child(div, raw);
        let probe = Probe::attach(&mut doc, div);
        assert_eq!(probe.text(), "a\nb");
    }

    #[test]
    fn bounding_box_requires_attachment() {
        let mut doc = Document::export();
        let g = doc.create_element("g");
        assert_eq!(
            ProportionalMeasurer.bounding_box(&doc, g),
            Err(MeasureError::Detached { node: g })
        );
        let root = doc.root();
        doc.append_child(root, g);
        assert_eq!(ProportionalMeasurer.bounding_box(&doc, g), Err(MeasureError::Empty));
    }
}
