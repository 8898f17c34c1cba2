//! The drawing-surface trait.
//!
//! State handling (save/restore, transforms, paint and font setters) and path
//! accumulation are shared by every surface and implemented here on top of a
//! [`StateStack`]. A concrete surface supplies the primitives and the paint
//! operations.

use glam::DVec2;

use crate::errors::CanvasError;
use crate::paint::PendingPrimitive;
use crate::state::{CanvasState, StateStack, color_value};
use crate::text::TextLayout;
use crate::types::{FontStyle, GradientDirection, LineCap, LineJoin};

pub trait Canvas2D {
    fn state_stack(&self) -> &StateStack;

    fn state_stack_mut(&mut self) -> &mut StateStack;

    fn state(&self) -> &CanvasState {
        self.state_stack().current()
    }

    fn state_mut(&mut self) -> &mut CanvasState {
        self.state_stack_mut().current_mut()
    }

    // ------------------------------------------------------------------------
    // State stack
    // ------------------------------------------------------------------------

    fn save(&mut self) {
        self.state_stack_mut().save();
    }

    /// Pop to the state of the matching `save`. Fails when nothing was saved.
    fn restore(&mut self) -> Result<(), CanvasError> {
        self.state_stack_mut().restore()
    }

    /// Back to the default state.
    fn reset(&mut self) {
        self.state_stack_mut().reset();
    }

    fn scale(&mut self, value: f64) {
        self.state_mut().scale *= value;
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state_mut().offset += DVec2::new(dx, dy);
    }

    // ------------------------------------------------------------------------
    // Paint
    // ------------------------------------------------------------------------

    fn set_alpha(&mut self, alpha: f64) {
        self.state_mut().alpha = alpha;
    }

    fn set_fill_alpha(&mut self, alpha: f64) {
        self.state_mut().fill_alpha = alpha;
    }

    fn set_stroke_alpha(&mut self, alpha: f64) {
        self.state_mut().stroke_alpha = alpha;
    }

    /// Solid fill. Clears any gradient.
    fn set_fill_color(&mut self, color: Option<&str>) {
        let state = self.state_mut();
        state.fill_color = color_value(color);
        state.gradient_color = None;
    }

    /// Two-stop gradient fill from `start` to `end`.
    fn set_gradient(
        &mut self,
        start: &str,
        end: &str,
        direction: GradientDirection,
        start_alpha: f64,
        end_alpha: f64,
    ) {
        let state = self.state_mut();
        state.fill_color = color_value(Some(start));
        state.gradient_fill_alpha = start_alpha;
        state.gradient_color = color_value(Some(end));
        state.gradient_alpha = end_alpha;
        state.gradient_direction = direction;
    }

    fn set_stroke_color(&mut self, color: Option<&str>) {
        self.state_mut().stroke_color = color_value(color);
    }

    fn set_stroke_width(&mut self, width: f64) {
        self.state_mut().stroke_width = width;
    }

    fn set_dashed(&mut self, dashed: bool, fix_dash: bool) {
        let state = self.state_mut();
        state.dashed = dashed;
        state.fix_dash = fix_dash;
    }

    fn set_dash_pattern(&mut self, pattern: &[f64]) {
        self.state_mut().dash_pattern = pattern.to_vec();
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state_mut().line_cap = cap;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.state_mut().line_join = join;
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.state_mut().miter_limit = limit;
    }

    // ------------------------------------------------------------------------
    // Font
    // ------------------------------------------------------------------------

    fn set_font_color(&mut self, color: Option<&str>) {
        self.state_mut().font_color = color_value(color);
    }

    fn set_font_background_color(&mut self, color: Option<&str>) {
        self.state_mut().font_background_color = color_value(color);
    }

    fn set_font_border_color(&mut self, color: Option<&str>) {
        self.state_mut().font_border_color = color_value(color);
    }

    fn set_font_size(&mut self, size: f64) {
        self.state_mut().font_size = size;
    }

    fn set_font_family(&mut self, family: &str) {
        self.state_mut().font_family = family.to_string();
    }

    fn set_font_style(&mut self, style: FontStyle) {
        self.state_mut().font_style = style;
    }

    // ------------------------------------------------------------------------
    // Shadow
    // ------------------------------------------------------------------------

    fn set_shadow(&mut self, enabled: bool) {
        self.state_mut().shadow = enabled;
    }

    fn set_shadow_color(&mut self, color: Option<&str>) {
        self.state_mut().shadow_color = color_value(color);
    }

    fn set_shadow_alpha(&mut self, alpha: f64) {
        self.state_mut().shadow_alpha = alpha;
    }

    fn set_shadow_offset(&mut self, dx: f64, dy: f64) {
        self.state_mut().shadow_offset = DVec2::new(dx, dy);
    }

    // ------------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------------

    /// Start a new, empty path.
    fn begin(&mut self) -> PendingPrimitive {
        PendingPrimitive::path()
    }

    fn move_to(&mut self, path: &mut PendingPrimitive, x: f64, y: f64) {
        if let Some(builder) = path.path_mut() {
            builder.move_to(self.state(), x, y);
        }
    }

    fn line_to(&mut self, path: &mut PendingPrimitive, x: f64, y: f64) {
        if let Some(builder) = path.path_mut() {
            builder.line_to(self.state(), x, y);
        }
    }

    fn quad_to(&mut self, path: &mut PendingPrimitive, x1: f64, y1: f64, x2: f64, y2: f64) {
        if let Some(builder) = path.path_mut() {
            builder.quad_to(self.state(), x1, y1, x2, y2);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn curve_to(
        &mut self,
        path: &mut PendingPrimitive,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    ) {
        if let Some(builder) = path.path_mut() {
            builder.curve_to(self.state(), x1, y1, x2, y2, x3, y3);
        }
    }

    /// Elliptical arc in SVG endpoint form, appended as cubic segments.
    #[allow(clippy::too_many_arguments)]
    fn arc_to(
        &mut self,
        path: &mut PendingPrimitive,
        rx: f64,
        ry: f64,
        angle: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    ) {
        if let Some(builder) = path.path_mut() {
            builder.arc_to(self.state(), rx, ry, angle, large_arc, sweep, x, y);
        }
    }

    fn close(&mut self, path: &mut PendingPrimitive) {
        if let Some(builder) = path.path_mut() {
            builder.close();
        }
    }

    // ------------------------------------------------------------------------
    // Surface operations
    // ------------------------------------------------------------------------

    /// Rotate by `theta` degrees about `(cx, cy)`, optionally mirrored.
    fn rotate(&mut self, theta: f64, flip_h: bool, flip_v: bool, cx: f64, cy: f64);

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> PendingPrimitive;

    fn rounded_rect(&mut self, x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64)
    -> PendingPrimitive;

    fn ellipse(&mut self, x: f64, y: f64, w: f64, h: f64) -> PendingPrimitive;

    #[allow(clippy::too_many_arguments)]
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
    );

    fn text(&mut self, layout: &TextLayout, content: &str);

    fn fill(&mut self, primitive: PendingPrimitive);

    fn stroke(&mut self, primitive: PendingPrimitive);

    fn fill_and_stroke(&mut self, primitive: PendingPrimitive);

    /// Open (`Some`) or close (`None`) a hyperlink around following output.
    fn set_link(&mut self, link: Option<&str>) -> Result<(), CanvasError>;
}
