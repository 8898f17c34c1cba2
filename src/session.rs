//! Per-render session: the gradient cache and id allocation.
//!
//! A session belongs to exactly one canvas. Two canvases never share cached
//! gradients or the export id counter.

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::types::{GradientDirection, fmt_num};

/// A two-stop gradient in canonical form.
///
/// North and west gradients are stored as south and east gradients with the
/// stops swapped, so equivalent gradients share one definition.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientKey {
    pub start: String,
    pub end: String,
    pub start_alpha: f64,
    pub end_alpha: f64,
    pub direction: GradientDirection,
}

impl GradientKey {
    pub fn new(
        start: &str,
        end: &str,
        start_alpha: f64,
        end_alpha: f64,
        direction: GradientDirection,
    ) -> Self {
        let (direction, swap) = direction.canonical();
        let key = Self {
            start: start.to_string(),
            end: end.to_string(),
            start_alpha,
            end_alpha,
            direction,
        };
        if swap {
            Self {
                start: key.end,
                end: key.start,
                start_alpha: key.end_alpha,
                end_alpha: key.start_alpha,
                direction,
            }
        } else {
            key
        }
    }

    /// Deterministic identifier, `mx-gradient-<start>-<a1>-<end>-<a2>-<dir>`.
    pub fn id(&self) -> String {
        format!(
            "mx-gradient-{}-{}-{}-{}-{}",
            id_color(&self.start),
            fmt_num(self.start_alpha),
            id_color(&self.end),
            fmt_num(self.end_alpha),
            self.direction.code()
        )
    }
}

/// Colors inside ids drop the `#` and are lowercased.
fn id_color(color: &str) -> String {
    color.strip_prefix('#').unwrap_or(color).to_lowercase()
}

/// `base` if no attached element uses it, otherwise the first free `base-N`.
pub fn unique_id(doc: &Document, base: &str) -> String {
    if doc.get_element_by_id(base).is_none() {
        return base.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{base}-{counter}");
        if doc.get_element_by_id(&candidate).is_none() {
            return candidate;
        }
        counter += 1;
    }
}

/// Caches and counters that live for one render pass.
#[derive(Debug, Default)]
pub struct RenderSession {
    gradients: HashMap<String, String>,
    ref_count: usize,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct gradients defined so far.
    pub fn gradient_count(&self) -> usize {
        self.gradients.len()
    }

    /// Forget cached gradients. The export counter keeps running so ids
    /// stay unique within the document.
    pub fn clear(&mut self) {
        self.gradients.clear();
    }

    fn next_export_id(&mut self) -> String {
        self.ref_count += 1;
        format!("id{}", self.ref_count)
    }

    /// Id of the gradient definition for `key`, creating it under `defs` on
    /// first use.
    pub fn gradient_id(&mut self, doc: &mut Document, defs: NodeId, key: &GradientKey) -> String {
        let cache_key = key.id();
        if let Some(id) = self.gradients.get(&cache_key) {
            return id.clone();
        }

        let id = if doc.is_live() {
            unique_id(doc, &cache_key)
        } else {
            self.next_export_id()
        };
        crate::log::debug!(key = %cache_key, id = %id, "defining gradient");

        let gradient = create_gradient(doc, key);
        doc.set_attr(gradient, "id", id.as_str());
        doc.append_child(defs, gradient);
        self.gradients.insert(cache_key, id.clone());
        id
    }
}

fn create_gradient(doc: &mut Document, key: &GradientKey) -> NodeId {
    let gradient = doc.create_element("linearGradient");
    doc.set_attr(gradient, "x1", "0%");
    doc.set_attr(gradient, "y1", "0%");
    doc.set_attr(gradient, "x2", "0%");
    doc.set_attr(gradient, "y2", "0%");
    match key.direction {
        GradientDirection::East => doc.set_attr(gradient, "x2", "100%"),
        _ => doc.set_attr(gradient, "y2", "100%"),
    }

    for (offset, color, alpha) in [
        ("0%", &key.start, key.start_alpha),
        ("100%", &key.end, key.end_alpha),
    ] {
        let mut style = format!("stop-color:{color}");
        if alpha < 1.0 {
            style.push_str(&format!(";stop-opacity:{}", fmt_num(alpha)));
        }
        let stop = doc.create_element("stop");
        doc.set_attr(stop, "offset", offset);
        doc.set_attr(stop, "style", style);
        doc.append_child(gradient, stop);
    }
    gradient
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs(doc: &mut Document) -> NodeId {
        let defs = doc.create_element("defs");
        let root = doc.root();
        doc.append_child(root, defs);
        defs
    }

    #[test]
    fn north_collapses_onto_south() {
        let south = GradientKey::new("#FF0000", "#0000ff", 1.0, 0.5, GradientDirection::South);
        let north = GradientKey::new("#0000ff", "#FF0000", 0.5, 1.0, GradientDirection::North);
        assert_eq!(south, north);
        assert_eq!(south.id(), "mx-gradient-ff0000-1-0000ff-0.5-s");
    }

    #[test]
    fn west_collapses_onto_east() {
        let east = GradientKey::new("#00ff00", "#000000", 0.25, 1.0, GradientDirection::East);
        let west = GradientKey::new("#000000", "#00ff00", 1.0, 0.25, GradientDirection::West);
        assert_eq!(east, west);
        assert_eq!(west.direction, GradientDirection::East);
        assert_eq!(west.id(), "mx-gradient-00ff00-0.25-000000-1-e");
    }

    #[test]
    fn export_ids_use_the_counter() {
        let mut doc = Document::export();
        let defs = defs(&mut doc);
        let mut session = RenderSession::new();
        let a = GradientKey::new("red", "blue", 1.0, 1.0, GradientDirection::South);
        let b = GradientKey::new("red", "blue", 1.0, 1.0, GradientDirection::East);
        assert_eq!(session.gradient_id(&mut doc, defs, &a), "id1");
        assert_eq!(session.gradient_id(&mut doc, defs, &b), "id2");
        assert_eq!(session.gradient_id(&mut doc, defs, &a), "id1");
        assert_eq!(doc.children(defs).len(), 2);
    }

    #[test]
    fn live_ids_avoid_collisions() {
        let mut doc = Document::live();
        let defs = defs(&mut doc);
        let key = GradientKey::new("#fff", "#000", 1.0, 1.0, GradientDirection::South);
        let taken = doc.create_element("g");
        doc.set_attr(taken, "id", key.id());
        let root = doc.root();
        doc.append_child(root, taken);

        let mut session = RenderSession::new();
        let id = session.gradient_id(&mut doc, defs, &key);
        assert_eq!(id, format!("{}-1", key.id()));
    }

    #[test]
    fn stops_carry_opacity_below_one() {
        let mut doc = Document::export();
        let defs = defs(&mut doc);
        let mut session = RenderSession::new();
        let key = GradientKey::new("#fff", "#000", 0.25, 1.0, GradientDirection::West);
        session.gradient_id(&mut doc, defs, &key);
        assert_eq!(
            doc.serialize_node(defs).unwrap(),
            concat!(
                r#"<defs><linearGradient x1="0%" y1="0%" x2="100%" y2="0%" id="id1">"#,
                r#"<stop offset="0%" style="stop-color:#000"/>"#,
                r#"<stop offset="100%" style="stop-color:#fff;stop-opacity:0.25"/>"#,
                r#"</linearGradient></defs>"#
            )
        );
    }
}
