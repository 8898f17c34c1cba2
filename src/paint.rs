//! Pending primitives, node descriptors and paint attributes.
//!
//! A shape is described once as a [`NodeDescriptor`] and then emitted up to
//! three times: the shadow variant, the hit-tolerance variant and the node
//! itself. Variants are derived from the decorated descriptor, never from an
//! emitted node.

use crate::dom::{Document, NodeId};
use crate::path_builder::PathBuilder;
use crate::session::GradientKey;
use crate::state::CanvasState;
use crate::types::{fmt_num, fmt2, round2};

// ============================================================================
// Pending primitives
// ============================================================================

/// Closed shapes that carry their geometry from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Ellipse,
}

impl ShapeKind {
    pub fn tag(self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Ellipse => "ellipse",
        }
    }
}

/// A shape that has been described but not painted yet.
///
/// Returned by `begin`, `rect`, `rounded_rect` and `ellipse` and consumed by
/// `fill`, `stroke` and `fill_and_stroke`.
#[derive(Debug, Clone)]
pub enum PendingPrimitive {
    Path(PathBuilder),
    Shape {
        kind: ShapeKind,
        geometry: Vec<(&'static str, String)>,
    },
}

impl PendingPrimitive {
    pub fn path() -> Self {
        PendingPrimitive::Path(PathBuilder::new())
    }

    pub fn tag(&self) -> &'static str {
        match self {
            PendingPrimitive::Path(_) => "path",
            PendingPrimitive::Shape { kind, .. } => kind.tag(),
        }
    }

    pub fn path_mut(&mut self) -> Option<&mut PathBuilder> {
        match self {
            PendingPrimitive::Path(path) => Some(path),
            PendingPrimitive::Shape { .. } => None,
        }
    }

    /// Whether the primitive accepts pointer events when they are enabled:
    /// shapes always do, paths only when closed.
    pub fn is_closed(&self) -> bool {
        match self {
            PendingPrimitive::Path(path) => path.is_closed(),
            PendingPrimitive::Shape { .. } => true,
        }
    }

    /// The undecorated descriptor, or `None` for a path without segments.
    pub fn into_descriptor(self) -> Option<NodeDescriptor> {
        match self {
            PendingPrimitive::Path(path) => {
                if path.is_empty() {
                    return None;
                }
                let mut desc = NodeDescriptor::new("path");
                desc.set("d", path.to_d());
                Some(desc)
            }
            PendingPrimitive::Shape { kind, geometry } => Some(NodeDescriptor {
                tag: kind.tag(),
                attrs: geometry,
            }),
        }
    }
}

// ============================================================================
// Node descriptors
// ============================================================================

/// An element that has not been inserted into the document.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor {
    pub tag: &'static str,
    attrs: Vec<(&'static str, String)>,
}

impl NodeDescriptor {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| *key != name);
    }

    pub fn attrs(&self) -> &[(&'static str, String)] {
        &self.attrs
    }

    /// Create the element in `doc` without inserting it anywhere.
    pub fn build(&self, doc: &mut Document) -> NodeId {
        let node = doc.create_element(self.tag);
        for (name, value) in &self.attrs {
            doc.set_attr(node, name, value.as_str());
        }
        node
    }

    /// Whether emitting this node would change neither the picture nor
    /// event handling.
    pub fn is_invisible(&self) -> bool {
        matches!(self.tag, "rect" | "path" | "ellipse")
            && matches!(self.get("fill"), Some("none") | Some("transparent"))
            && self.get("stroke") == Some("none")
            && self.get("pointer-events") == Some("none")
    }
}

// ============================================================================
// Fill and stroke
// ============================================================================

/// What the fill of the next node resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum FillPaint {
    None,
    Color(String),
    Gradient(GradientKey),
}

impl FillPaint {
    pub fn from_state(state: &CanvasState) -> Self {
        match (&state.fill_color, &state.gradient_color) {
            (None, _) => FillPaint::None,
            (Some(start), Some(end)) => FillPaint::Gradient(GradientKey::new(
                start,
                end,
                state.gradient_fill_alpha,
                state.gradient_alpha,
                state.gradient_direction,
            )),
            (Some(color), None) => FillPaint::Color(color.to_lowercase()),
        }
    }
}

/// `url(#id)`, or `url(<base>#id)` with parentheses in the base escaped.
pub fn paint_reference(base_url: Option<&str>, id: &str) -> String {
    match base_url {
        Some(base) => {
            let mut escaped = String::with_capacity(base.len());
            for c in base.chars() {
                if c == '(' || c == ')' {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            format!("url({escaped}#{id})")
        }
        None => format!("url(#{id})"),
    }
}

/// Set `fill-opacity` and `fill`. `paint` is a color or a paint reference.
pub fn apply_fill(desc: &mut NodeDescriptor, state: &CanvasState, paint: String) {
    if state.alpha < 1.0 || state.fill_alpha < 1.0 {
        desc.set("fill-opacity", fmt2(state.alpha * state.fill_alpha));
    }
    desc.set("fill", paint);
}

/// Effective stroke width in output pixels, never below 1.
pub fn current_stroke_width(state: &CanvasState) -> f64 {
    round2(state.stroke_width * state.scale).max(1.0)
}

/// Dash lengths scaled by `(fix_dash ? 1 : stroke_width) * scale`.
pub fn dash_array(state: &CanvasState) -> String {
    let factor = if state.fix_dash { 1.0 } else { state.stroke_width } * state.scale;
    state
        .dash_pattern
        .iter()
        .map(|len| fmt_num(len * factor))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Set stroke color, opacity, width and dashes. Line joins, caps and the
/// miter limit only apply to paths.
pub fn apply_stroke(desc: &mut NodeDescriptor, state: &CanvasState, color: &str, style_enabled: bool) {
    desc.set("stroke", color.to_lowercase());
    if state.alpha < 1.0 || state.stroke_alpha < 1.0 {
        desc.set("stroke-opacity", fmt2(state.alpha * state.stroke_alpha));
    }

    let width = current_stroke_width(state);
    if width != 1.0 {
        desc.set("stroke-width", fmt_num(width));
    }

    if desc.tag == "path" {
        let join = state.line_join.svg_name();
        if join != "miter" {
            desc.set("stroke-linejoin", join);
        }
        let cap = state.line_cap.svg_name();
        if cap != "butt" {
            desc.set("stroke-linecap", cap);
        }
        // Style sections already declare the default limit
        if !style_enabled || state.miter_limit != crate::defaults::MITER_LIMIT {
            desc.set("stroke-miterlimit", fmt_num(state.miter_limit));
        }
    }

    if state.dashed {
        desc.set("stroke-dasharray", dash_array(state));
    }
}

// ============================================================================
// Variants
// ============================================================================

/// The shadow variant of an already decorated node.
pub fn shadow_of(desc: &NodeDescriptor, state: &CanvasState) -> NodeDescriptor {
    let mut shadow = desc.clone();
    let color = state.shadow_color.as_deref().unwrap_or("none");

    if matches!(shadow.get("fill"), Some(fill) if fill != "none" && fill != "transparent") {
        shadow.set("fill", color);
    }
    if matches!(shadow.get("stroke"), Some(stroke) if stroke != "none") {
        shadow.set("stroke", color);
    }

    shadow.set(
        "transform",
        format!(
            "translate({},{}){}",
            fmt2(state.shadow_offset.x * state.scale),
            fmt2(state.shadow_offset.y * state.scale),
            state.transform
        ),
    );
    shadow.set("opacity", fmt_num(state.shadow_alpha));
    shadow
}

/// The invisible, wider hit area for an unfilled node.
pub fn tolerance_of(desc: &NodeDescriptor, tolerance: f64) -> NodeDescriptor {
    let mut tol = desc.clone();
    let width = tol
        .get("stroke-width")
        .and_then(|w| w.parse::<f64>().ok())
        .unwrap_or(1.0)
        + tolerance;
    tol.set("pointer-events", "stroke");
    tol.set("visibility", "hidden");
    tol.remove("stroke-dasharray");
    tol.set("stroke-width", fmt_num(width));
    tol.set("fill", "none");
    tol.set("stroke", "white");
    tol
}
