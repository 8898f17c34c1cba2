//! Path accumulator.
//!
//! Collects the segments issued between `begin` and a paint operation. Each
//! segment stores coordinates that are already offset, scaled and rounded, so
//! the `d` attribute is a plain join of the tokens. The last logical point is
//! kept separately because arcs are converted in logical space.

use std::f64::consts::FRAC_PI_2;

use glam::DVec2;

use crate::state::CanvasState;
use crate::types::{fmt_num, round2};

/// One path segment in output pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathOp {
    Move(DVec2),
    Line(DVec2),
    Quad(DVec2, DVec2),
    Curve(DVec2, DVec2, DVec2),
    Close,
}

impl PathOp {
    fn write_to(&self, out: &mut String) {
        let points: &[DVec2] = match self {
            PathOp::Move(p) => {
                out.push('M');
                std::slice::from_ref(p)
            }
            PathOp::Line(p) => {
                out.push('L');
                std::slice::from_ref(p)
            }
            PathOp::Quad(c, p) => {
                out.push('Q');
                return write_points(out, &[*c, *p]);
            }
            PathOp::Curve(c1, c2, p) => {
                out.push('C');
                return write_points(out, &[*c1, *c2, *p]);
            }
            PathOp::Close => {
                out.push('Z');
                return;
            }
        };
        write_points(out, points);
    }
}

fn write_points(out: &mut String, points: &[DVec2]) {
    for p in points {
        out.push(' ');
        out.push_str(&fmt_num(p.x));
        out.push(' ');
        out.push_str(&fmt_num(p.y));
    }
}

/// Accumulates segments for the pending path.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    ops: Vec<PathOp>,
    /// Last point in logical coordinates.
    last: DVec2,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every segment.
    pub fn clear(&mut self) {
        self.ops.clear();
        self.last = DVec2::ZERO;
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether the last segment closes the path.
    pub fn is_closed(&self) -> bool {
        matches!(self.ops.last(), Some(PathOp::Close))
    }

    pub fn ops(&self) -> &[PathOp] {
        &self.ops
    }

    /// Last point in logical coordinates.
    pub fn last_point(&self) -> DVec2 {
        self.last
    }

    fn map(state: &CanvasState, x: f64, y: f64) -> DVec2 {
        DVec2::new(round2(state.map_x(x)), round2(state.map_y(y)))
    }

    pub fn move_to(&mut self, state: &CanvasState, x: f64, y: f64) {
        self.ops.push(PathOp::Move(Self::map(state, x, y)));
        self.last = DVec2::new(x, y);
    }

    pub fn line_to(&mut self, state: &CanvasState, x: f64, y: f64) {
        self.ops.push(PathOp::Line(Self::map(state, x, y)));
        self.last = DVec2::new(x, y);
    }

    pub fn quad_to(&mut self, state: &CanvasState, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.ops.push(PathOp::Quad(
            Self::map(state, x1, y1),
            Self::map(state, x2, y2),
        ));
        self.last = DVec2::new(x2, y2);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn curve_to(
        &mut self,
        state: &CanvasState,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    ) {
        self.ops.push(PathOp::Curve(
            Self::map(state, x1, y1),
            Self::map(state, x2, y2),
            Self::map(state, x3, y3),
        ));
        self.last = DVec2::new(x3, y3);
    }

    /// Append an elliptical arc from the last point as cubic segments.
    #[allow(clippy::too_many_arguments)]
    pub fn arc_to(
        &mut self,
        state: &CanvasState,
        rx: f64,
        ry: f64,
        angle: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    ) {
        let from = self.last;
        let to = DVec2::new(x, y);
        if from == to {
            return;
        }
        if rx == 0.0 || ry == 0.0 {
            self.line_to(state, x, y);
            return;
        }
        for [c1, c2, end] in arc_to_cubics(from, rx, ry, angle, large_arc, sweep, to) {
            self.curve_to(state, c1.x, c1.y, c2.x, c2.y, end.x, end.y);
        }
    }

    pub fn close(&mut self) {
        self.ops.push(PathOp::Close);
    }

    /// The `d` attribute for the accumulated segments.
    pub fn to_d(&self) -> String {
        let mut out = String::new();
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            op.write_to(&mut out);
        }
        out
    }
}

/// Convert an SVG endpoint arc into cubic Bézier segments of at most 90° each.
///
/// Returns `[control1, control2, end]` triples; the final end point is `to`
/// exactly. Radii that are too small to span the chord are scaled up.
pub fn arc_to_cubics(
    from: DVec2,
    rx: f64,
    ry: f64,
    angle: f64,
    large_arc: bool,
    sweep: bool,
    to: DVec2,
) -> Vec<[DVec2; 3]> {
    let mut rx = rx.abs();
    let mut ry = ry.abs();
    let phi = angle.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();

    // Endpoint to center parameterization
    let half = (from - to) / 2.0;
    let p = DVec2::new(
        cos_phi * half.x + sin_phi * half.y,
        -sin_phi * half.x + cos_phi * half.y,
    );

    let lambda = (p.x * p.x) / (rx * rx) + (p.y * p.y) / (ry * ry);
    if lambda > 1.0 {
        let factor = lambda.sqrt();
        rx *= factor;
        ry *= factor;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * p.y * p.y - ry2 * p.x * p.x;
    let den = rx2 * p.y * p.y + ry2 * p.x * p.x;
    let mut coef = if den == 0.0 { 0.0 } else { (num / den).max(0.0).sqrt() };
    if large_arc == sweep {
        coef = -coef;
    }
    let center_p = DVec2::new(coef * rx * p.y / ry, -coef * ry * p.x / rx);
    let mid = (from + to) / 2.0;
    let center = DVec2::new(
        cos_phi * center_p.x - sin_phi * center_p.y + mid.x,
        sin_phi * center_p.x + cos_phi * center_p.y + mid.y,
    );

    let u = DVec2::new((p.x - center_p.x) / rx, (p.y - center_p.y) / ry);
    let v = DVec2::new((-p.x - center_p.x) / rx, (-p.y - center_p.y) / ry);
    let theta1 = signed_angle(DVec2::X, u);
    let mut delta = signed_angle(u, v);
    if !sweep && delta > 0.0 {
        delta -= std::f64::consts::TAU;
    } else if sweep && delta < 0.0 {
        delta += std::f64::consts::TAU;
    }

    let segments = ((delta.abs() / FRAC_PI_2 - 1e-9).ceil() as usize).max(1);
    let step = delta / segments as f64;
    let t = 4.0 / 3.0 * (step / 4.0).tan();

    // Unit-circle point to output point
    let map = |q: DVec2| {
        let scaled = DVec2::new(q.x * rx, q.y * ry);
        DVec2::new(
            cos_phi * scaled.x - sin_phi * scaled.y,
            sin_phi * scaled.x + cos_phi * scaled.y,
        ) + center
    };

    let mut curves = Vec::with_capacity(segments);
    for i in 0..segments {
        let a1 = theta1 + i as f64 * step;
        let a2 = a1 + step;
        let (s1, c1) = a1.sin_cos();
        let (s2, c2) = a2.sin_cos();
        let start = DVec2::new(c1, s1);
        let end = DVec2::new(c2, s2);
        let ctrl1 = start + t * DVec2::new(-s1, c1);
        let ctrl2 = end - t * DVec2::new(-s2, c2);
        let end_point = if i + 1 == segments { to } else { map(end) };
        curves.push([map(ctrl1), map(ctrl2), end_point]);
    }
    curves
}

fn signed_angle(u: DVec2, v: DVec2) -> f64 {
    u.perp_dot(v).atan2(u.dot(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: DVec2, b: DVec2) {
        assert!((a - b).length() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn tokens_are_offset_scaled_and_joined() {
        let state = CanvasState {
            offset: DVec2::new(1.0, 2.0),
            scale: 2.0,
            ..CanvasState::default()
        };
        let mut path = PathBuilder::new();
        path.move_to(&state, 0.0, 0.0);
        path.line_to(&state, 10.0, 0.5);
        path.close();
        assert_eq!(path.to_d(), "M 2 4 L 22 5 Z");
        assert!(path.is_closed());
    }

    #[test]
    fn curves_round_each_coordinate() {
        let state = CanvasState::default();
        let mut path = PathBuilder::new();
        path.move_to(&state, 0.0, 0.0);
        path.curve_to(&state, 1.001, 2.0, 3.0, 4.556, 5.0, 6.0);
        path.quad_to(&state, 7.0, 8.0, 9.0, 10.0);
        assert_eq!(path.to_d(), "M 0 0 C 1 2 3 4.56 5 6 Q 7 8 9 10");
        assert!(!path.is_closed());
        assert_eq!(path.last_point(), DVec2::new(9.0, 10.0));
    }

    #[test]
    fn half_circle_splits_into_two_segments() {
        let curves = arc_to_cubics(
            DVec2::ZERO,
            10.0,
            10.0,
            0.0,
            false,
            true,
            DVec2::new(20.0, 0.0),
        );
        assert_eq!(curves.len(), 2);
        // Positive sweep runs through the top of the circle in y-down space
        assert_close(curves[0][2], DVec2::new(10.0, -10.0));
        assert_eq!(curves[1][2], DVec2::new(20.0, 0.0));
    }

    #[test]
    fn quarter_arc_is_one_segment() {
        let curves = arc_to_cubics(
            DVec2::ZERO,
            10.0,
            10.0,
            0.0,
            false,
            true,
            DVec2::new(10.0, 10.0),
        );
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0][2], DVec2::new(10.0, 10.0));
    }

    #[test]
    fn arc_with_zero_radius_is_a_line() {
        let state = CanvasState::default();
        let mut path = PathBuilder::new();
        path.move_to(&state, 0.0, 0.0);
        path.arc_to(&state, 0.0, 5.0, 0.0, false, true, 4.0, 4.0);
        assert_eq!(path.to_d(), "M 0 0 L 4 4");
    }

    #[test]
    fn clear_empties_the_accumulator() {
        let state = CanvasState::default();
        let mut path = PathBuilder::new();
        path.move_to(&state, 1.0, 1.0);
        path.clear();
        assert!(path.is_empty());
        assert_eq!(path.to_d(), "");
    }
}
