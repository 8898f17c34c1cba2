//! Clip regions.

use crate::dom::{Document, NodeId};
use crate::session::unique_id;
use crate::types::fmt_int;

/// Build a detached `<clipPath>` holding one rectangle.
///
/// All inputs are rounded to whole pixels. The id is derived from the box,
/// `mx-clip-<x>-<y>-<w>-<h>`, with a `-N` suffix when it is already taken.
pub fn create_clip(doc: &mut Document, x: f64, y: f64, w: f64, h: f64) -> NodeId {
    let (x, y, w, h) = (fmt_int(x), fmt_int(y), fmt_int(w), fmt_int(h));
    let id = unique_id(doc, &format!("mx-clip-{x}-{y}-{w}-{h}"));
    crate::log::debug!(id = %id, "defining clip");

    let clip = doc.create_element("clipPath");
    doc.set_attr(clip, "id", id);

    let rect = doc.create_element("rect");
    doc.set_attr(rect, "x", x);
    doc.set_attr(rect, "y", y);
    doc.set_attr(rect, "width", w);
    doc.set_attr(rect, "height", h);
    doc.append_child(clip, rect);

    clip
}
