//! SVG drawing surface.

use glam::DVec2;

use crate::canvas::Canvas2D;
use crate::clip;
use crate::convert::{IdentityConverter, SourceConverter};
use crate::defaults;
use crate::dom::{Document, NodeId};
use crate::errors::{CanvasError, MeasureError};
use crate::paint::{
    self, FillPaint, NodeDescriptor, PendingPrimitive, ShapeKind, paint_reference,
};
use crate::session::RenderSession;
use crate::state::{CanvasState, StateStack};
use crate::text::{MeasureRequest, Probe, ProportionalMeasurer, TextLayout, TextMeasurer, TextRenderer, TextStrategy};
use crate::types::{Bounds, Size, fmt_num, fmt2};

/// Output policy switches.
#[derive(Debug, Clone)]
pub struct CanvasOptions {
    /// Emit a `<style>` section with the defaults and omit attributes that
    /// merely restate them.
    pub style_enabled: bool,
    /// Draw labels at all.
    pub text_enabled: bool,
    /// Render HTML labels as foreign content instead of plain text.
    pub fo_enabled: bool,
    /// Fallback text for viewers without foreign content support.
    pub fo_alt_text: Option<String>,
    pub fo_offset: f64,
    pub text_offset: f64,
    pub image_offset: f64,
    /// Width added to the invisible hit area of unfilled shapes. Zero
    /// disables the hit area.
    pub stroke_tolerance: f64,
    /// Cover images with a hidden rectangle that takes their events.
    pub block_image_pointer_events: bool,
    pub line_height_correction: f64,
    pub pointer_events: bool,
    pub pointer_events_value: String,
    /// Use the clipped height when vertically aligning plain text.
    pub match_html_alignment: bool,
    /// Rotate foreign content with the canvas rotation.
    pub rotate_html: bool,
    /// Skip shapes that would be invisible and take no events.
    pub prune_invisible: bool,
    /// Page URL used for paint and clip references in live documents.
    pub base_url: Option<String>,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        Self {
            style_enabled: false,
            text_enabled: true,
            fo_enabled: true,
            fo_alt_text: Some(defaults::FO_ALT_TEXT.to_string()),
            fo_offset: 0.0,
            text_offset: 0.0,
            image_offset: 0.0,
            stroke_tolerance: 0.0,
            block_image_pointer_events: false,
            line_height_correction: 1.0,
            pointer_events: false,
            pointer_events_value: defaults::POINTER_EVENTS_VALUE.to_string(),
            match_html_alignment: true,
            rotate_html: true,
            prune_invisible: true,
            base_url: None,
        }
    }
}

/// A canvas that writes SVG elements into a [`Document`].
pub struct SvgCanvas {
    doc: Document,
    /// Current insertion point: the document root or an open link.
    root: NodeId,
    /// Insertion point to return to when the open link is closed.
    link_parent: Option<NodeId>,
    defs: Option<NodeId>,
    states: StateStack,
    session: RenderSession,
    options: CanvasOptions,
    converter: Box<dyn SourceConverter>,
    measurer: Box<dyn TextMeasurer>,
}

impl SvgCanvas {
    pub fn new(doc: Document, options: CanvasOptions) -> Self {
        let root = doc.root();
        let mut canvas = Self {
            doc,
            root,
            link_parent: None,
            defs: None,
            states: StateStack::new(),
            session: RenderSession::new(),
            options,
            converter: Box::new(IdentityConverter),
            measurer: Box::new(ProportionalMeasurer),
        };

        if !canvas.doc.is_live() || canvas.options.style_enabled {
            let defs = canvas.defs();
            if canvas.options.style_enabled {
                let style = canvas.create_style();
                canvas.doc.append_child(defs, style);
            }
        }
        canvas
    }

    /// Canvas drawing into a fresh export document.
    pub fn export(options: CanvasOptions) -> Self {
        Self::new(Document::export(), options)
    }

    /// Canvas drawing into a fresh live document.
    pub fn live(options: CanvasOptions) -> Self {
        Self::new(Document::live(), options)
    }

    pub fn with_converter(mut self, converter: impl SourceConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn with_measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn options(&self) -> &CanvasOptions {
        &self.options
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    /// Node that output is currently appended to.
    pub fn current_root(&self) -> NodeId {
        self.root
    }

    pub fn to_svg_string(&self) -> Result<String, CanvasError> {
        self.doc.to_svg_string()
    }

    // ------------------------------------------------------------------------
    // Helpers shared with the text strategies
    // ------------------------------------------------------------------------

    pub(crate) fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The definitions container, created as the first child of the `<svg>`
    /// element on first use. An existing `<defs>` is reused.
    pub(crate) fn defs(&mut self) -> NodeId {
        if let Some(defs) = self.defs {
            return defs;
        }
        let svg = self.doc.root();
        let defs = match self.doc.find_descendant(svg, "defs") {
            Some(existing) => existing,
            None => {
                let defs = self.doc.create_element("defs");
                let first = self.doc.first_child(svg);
                self.doc.insert_before(svg, defs, first);
                defs
            }
        };
        self.defs = Some(defs);
        defs
    }

    fn create_style(&mut self) -> NodeId {
        let style = self.doc.create_element("style");
        self.doc.set_attr(style, "type", "text/css");
        let css = self.doc.create_text(format!(
            "svg{{font-family:{};font-size:{};fill:none;stroke-miterlimit:{}}}",
            defaults::FONT_FAMILY,
            fmt_num(defaults::FONT_SIZE),
            fmt_num(defaults::MITER_LIMIT)
        ));
        self.doc.append_child(style, css);
        style
    }

    /// `url(...)` reference to a definition, absolute in live documents when a
    /// base URL is configured.
    pub(crate) fn reference(&self, id: &str) -> String {
        let base = if self.doc.is_live() {
            self.options.base_url.as_deref()
        } else {
            None
        };
        paint_reference(base, id)
    }

    pub(crate) fn append(&mut self, node: NodeId) {
        let root = self.root;
        self.doc.append_child(root, node);
    }

    /// Build a clip region and store it with the definitions.
    pub(crate) fn add_clip(&mut self, x: f64, y: f64, w: f64, h: f64) -> String {
        let clip = clip::create_clip(&mut self.doc, x, y, w, h);
        let defs = self.defs();
        self.doc.append_child(defs, clip);
        self.doc.attr(clip, "id").unwrap_or_default().to_string()
    }

    /// Measure `node` while it is attached to the offscreen host.
    pub(crate) fn measure(
        &mut self,
        node: NodeId,
        request: &MeasureRequest,
    ) -> Result<Size, MeasureError> {
        let probe = Probe::attach(&mut self.doc, node);
        self.measurer.measure(&probe, request)
    }

    pub(crate) fn bounding_box(&self, node: NodeId) -> Result<Bounds, MeasureError> {
        self.measurer.bounding_box(&self.doc, node)
    }

    // ------------------------------------------------------------------------
    // Painting
    // ------------------------------------------------------------------------

    fn fill_value(&mut self, state: &CanvasState) -> Option<String> {
        match FillPaint::from_state(state) {
            FillPaint::None => None,
            FillPaint::Color(color) => Some(color),
            FillPaint::Gradient(key) => {
                let defs = self.defs();
                let id = self.session.gradient_id(&mut self.doc, defs, &key);
                Some(self.reference(&id))
            }
        }
    }

    /// Decorate the pending primitive and insert it with its shadow and
    /// hit-tolerance variants.
    fn add_node(&mut self, primitive: PendingPrimitive, filled: bool, stroked: bool) {
        let closed = primitive.is_closed();
        let Some(mut desc) = primitive.into_descriptor() else {
            crate::log::trace!("skipping paint of an empty path");
            return;
        };

        let state = self.states.current().clone();
        let style_enabled = self.options.style_enabled;
        let mut filled = filled;

        let fill = if filled { self.fill_value(&state) } else { None };
        match fill {
            Some(paint) => paint::apply_fill(&mut desc, &state, paint),
            None if !style_enabled => {
                desc.set("fill", "none");
                filled = false;
            }
            None => filled = false,
        }

        match state.stroke_color.as_deref() {
            Some(color) if stroked => paint::apply_stroke(&mut desc, &state, color, style_enabled),
            _ if !style_enabled => desc.set("stroke", "none"),
            _ => {}
        }

        if !state.transform.is_empty() {
            desc.set("transform", state.transform.as_str());
        }

        let mut variants: Vec<NodeDescriptor> = Vec::with_capacity(3);
        if state.shadow {
            variants.push(paint::shadow_of(&desc, &state));
        }
        if self.options.stroke_tolerance > 0.0 && !filled {
            variants.push(paint::tolerance_of(&desc, self.options.stroke_tolerance));
        }

        if self.options.pointer_events && closed {
            desc.set("pointer-events", self.options.pointer_events_value.as_str());
        } else if !self.options.pointer_events && self.link_parent.is_none() {
            desc.set("pointer-events", "none");
        }

        for variant in &variants {
            let node = variant.build(&mut self.doc);
            self.append(node);
        }

        if self.options.prune_invisible && desc.is_invisible() {
            crate::log::trace!(tag = desc.tag, "pruning invisible node");
            return;
        }
        let node = desc.build(&mut self.doc);
        self.append(node);
    }
}

impl Canvas2D for SvgCanvas {
    fn state_stack(&self) -> &StateStack {
        &self.states
    }

    fn state_stack_mut(&mut self) -> &mut StateStack {
        &mut self.states
    }

    fn reset(&mut self) {
        self.states.reset();
        self.session.clear();
    }

    fn rotate(&mut self, theta: f64, flip_h: bool, flip_v: bool, cx: f64, cy: f64) {
        if theta == 0.0 && !flip_h && !flip_v {
            return;
        }
        let state = self.states.current_mut();
        let pivot = DVec2::new(state.map_x(cx), state.map_y(cy));
        let mut theta = theta;

        if flip_h && flip_v {
            theta += 180.0;
        } else if flip_h != flip_v {
            let t = DVec2::new(
                if flip_h { pivot.x } else { 0.0 },
                if flip_v { pivot.y } else { 0.0 },
            );
            let s = DVec2::new(
                if flip_h { -1.0 } else { 1.0 },
                if flip_v { -1.0 } else { 1.0 },
            );
            let term = format!(
                "translate({},{})scale({},{})translate({},{})",
                fmt2(t.x),
                fmt2(t.y),
                fmt2(s.x),
                fmt2(s.y),
                fmt2(-t.x),
                fmt2(-t.y)
            );
            state.push_transform(&term);
            theta = -theta;
        }

        if theta != 0.0 {
            let term = format!("rotate({},{},{})", fmt2(theta), fmt2(pivot.x), fmt2(pivot.y));
            state.push_transform(&term);
        }

        state.rotation += theta;
        state.rotation_pivot = pivot;
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> PendingPrimitive {
        let s = self.states.current();
        PendingPrimitive::Shape {
            kind: ShapeKind::Rect,
            geometry: vec![
                ("x", fmt2(s.map_x(x))),
                ("y", fmt2(s.map_y(y))),
                ("width", fmt2(w * s.scale)),
                ("height", fmt2(h * s.scale)),
            ],
        }
    }

    fn rounded_rect(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        rx: f64,
        ry: f64,
    ) -> PendingPrimitive {
        let mut primitive = self.rect(x, y, w, h);
        let scale = self.states.current().scale;
        if let PendingPrimitive::Shape { geometry, .. } = &mut primitive {
            if rx > 0.0 {
                geometry.push(("rx", fmt2(rx * scale)));
            }
            if ry > 0.0 {
                geometry.push(("ry", fmt2(ry * scale)));
            }
        }
        primitive
    }

    fn ellipse(&mut self, x: f64, y: f64, w: f64, h: f64) -> PendingPrimitive {
        let s = self.states.current();
        PendingPrimitive::Shape {
            kind: ShapeKind::Ellipse,
            geometry: vec![
                ("cx", fmt2(s.map_x(x + w / 2.0))),
                ("cy", fmt2(s.map_y(y + h / 2.0))),
                ("rx", fmt2(w / 2.0 * s.scale)),
                ("ry", fmt2(h / 2.0 * s.scale)),
            ],
        }
    }

    fn image(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        src: &str,
        preserve_aspect: bool,
        flip_h: bool,
        flip_v: bool,
    ) {
        let src = self.converter.convert(src);
        let s = self.states.current().clone();
        let x = x + s.offset.x;
        let y = y + s.offset.y;
        let offset = self.options.image_offset;

        let mut desc = NodeDescriptor::new("image");
        desc.set("x", fmt_num(crate::types::round2(x * s.scale) + offset));
        desc.set("y", fmt_num(crate::types::round2(y * s.scale) + offset));
        desc.set("width", fmt2(w * s.scale));
        desc.set("height", fmt2(h * s.scale));
        desc.set("xlink:href", src);

        if !preserve_aspect {
            desc.set("preserveAspectRatio", "none");
        }
        if s.alpha < 1.0 || s.fill_alpha < 1.0 {
            desc.set("opacity", fmt2(s.alpha * s.fill_alpha));
        }

        let mut transform = s.transform.clone();
        if flip_h || flip_v {
            let (sx, dx) = if flip_h { (-1.0, -w - 2.0 * x) } else { (1.0, 0.0) };
            let (sy, dy) = if flip_v { (-1.0, -h - 2.0 * y) } else { (1.0, 0.0) };
            transform.push_str(&format!(
                "scale({},{})translate({},{})",
                fmt_num(sx),
                fmt_num(sy),
                fmt_num(dx * s.scale),
                fmt_num(dy * s.scale)
            ));
        }
        if !transform.is_empty() {
            desc.set("transform", transform);
        }
        if !self.options.pointer_events {
            desc.set("pointer-events", "none");
        }

        if self.options.block_image_pointer_events {
            desc.set("style", "pointer-events:none");
            let image = desc.build(&mut self.doc);
            self.append(image);

            let mut cover = NodeDescriptor::new("rect");
            cover.set("visibility", "hidden");
            cover.set("pointer-events", "fill");
            cover.set("x", fmt2(x * s.scale));
            cover.set("y", fmt2(y * s.scale));
            cover.set("width", fmt2(w * s.scale));
            cover.set("height", fmt2(h * s.scale));
            let cover = cover.build(&mut self.doc);
            self.append(cover);
        } else {
            let image = desc.build(&mut self.doc);
            self.append(image);
        }
    }

    fn text(&mut self, layout: &TextLayout, content: &str) {
        if !self.options.text_enabled {
            return;
        }
        let offset = self.states.current().offset;
        let layout = TextLayout {
            x: layout.x + offset.x,
            y: layout.y + offset.y,
            ..layout.clone()
        };
        TextRenderer::select(layout.format, self.options.fo_enabled).render(self, &layout, content);
    }

    fn fill(&mut self, primitive: PendingPrimitive) {
        self.add_node(primitive, true, false);
    }

    fn stroke(&mut self, primitive: PendingPrimitive) {
        self.add_node(primitive, false, true);
    }

    fn fill_and_stroke(&mut self, primitive: PendingPrimitive) {
        self.add_node(primitive, true, true);
    }

    /// Nesting is not tracked: a second `Some` before closing the first
    /// replaces the remembered insertion point, so callers must close every
    /// link exactly once.
    fn set_link(&mut self, link: Option<&str>) -> Result<(), CanvasError> {
        match link {
            Some(href) => {
                let anchor = self.doc.create_element("a");
                self.doc.set_attr(anchor, "xlink:href", href);
                self.append(anchor);
                self.link_parent = Some(self.root);
                self.root = anchor;
            }
            None => {
                self.root = self.link_parent.take().ok_or(CanvasError::UnbalancedLink)?;
            }
        }
        Ok(())
    }
}
