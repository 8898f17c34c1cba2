//! Painting state and the save/restore stack.

use glam::DVec2;

use crate::defaults;
use crate::errors::CanvasError;
use crate::types::{FontStyle, GradientDirection, LineCap, LineJoin};

/// The painting context every primitive reads implicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasState {
    /// Translation applied before scaling.
    pub offset: DVec2,
    pub scale: f64,
    pub alpha: f64,
    pub fill_alpha: f64,
    pub stroke_alpha: f64,

    pub fill_color: Option<String>,
    pub gradient_color: Option<String>,
    pub gradient_fill_alpha: f64,
    pub gradient_alpha: f64,
    pub gradient_direction: GradientDirection,

    pub stroke_color: Option<String>,
    pub stroke_width: f64,
    pub dashed: bool,
    pub dash_pattern: Vec<f64>,
    /// Dash lengths are absolute instead of multiples of the stroke width.
    pub fix_dash: bool,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,

    pub font_color: Option<String>,
    pub font_background_color: Option<String>,
    pub font_border_color: Option<String>,
    pub font_size: f64,
    pub font_family: String,
    pub font_style: FontStyle,

    pub shadow: bool,
    pub shadow_color: Option<String>,
    pub shadow_alpha: f64,
    pub shadow_offset: DVec2,

    /// Accumulated rotation in degrees.
    pub rotation: f64,
    /// Pivot of the accumulated rotation in output pixels.
    pub rotation_pivot: DVec2,
    /// SVG transform list appended to every emitted shape.
    pub transform: String,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: DVec2::ZERO,
            scale: 1.0,
            alpha: 1.0,
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            fill_color: None,
            gradient_color: None,
            gradient_fill_alpha: 1.0,
            gradient_alpha: 1.0,
            gradient_direction: GradientDirection::South,
            stroke_color: None,
            stroke_width: defaults::STROKE_WIDTH,
            dashed: false,
            dash_pattern: defaults::DASH_PATTERN.to_vec(),
            fix_dash: false,
            line_cap: LineCap::Flat,
            line_join: LineJoin::Miter,
            miter_limit: defaults::MITER_LIMIT,
            font_color: Some(defaults::FONT_COLOR.to_string()),
            font_background_color: None,
            font_border_color: None,
            font_size: defaults::FONT_SIZE,
            font_family: defaults::FONT_FAMILY.to_string(),
            font_style: FontStyle::default(),
            shadow: false,
            shadow_color: Some(defaults::SHADOW_COLOR.to_string()),
            shadow_alpha: defaults::SHADOW_ALPHA,
            shadow_offset: DVec2::new(defaults::SHADOW_OFFSET_X, defaults::SHADOW_OFFSET_Y),
            rotation: 0.0,
            rotation_pivot: DVec2::ZERO,
            transform: String::new(),
        }
    }
}

impl CanvasState {
    /// Map a logical x coordinate to output pixels.
    #[inline]
    pub fn map_x(&self, x: f64) -> f64 {
        (x + self.offset.x) * self.scale
    }

    /// Map a logical y coordinate to output pixels.
    #[inline]
    pub fn map_y(&self, y: f64) -> f64 {
        (y + self.offset.y) * self.scale
    }

    /// Append one term to the transform list.
    pub fn push_transform(&mut self, term: &str) {
        self.transform.push_str(term);
    }
}

/// Normalize a color argument: `None` and `"none"` both clear the color.
pub fn color_value(color: Option<&str>) -> Option<String> {
    match color {
        None | Some("none") => None,
        Some(value) => Some(value.to_string()),
    }
}

/// The current state plus the frames saved beneath it.
#[derive(Clone, Debug, Default)]
pub struct StateStack {
    current: CanvasState,
    saved: Vec<CanvasState>,
}

impl StateStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &CanvasState {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut CanvasState {
        &mut self.current
    }

    /// Number of saved frames.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Push a copy of the current state.
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Discard every mutation since the matching [`save`](Self::save).
    pub fn restore(&mut self) -> Result<(), CanvasError> {
        let parent = self.saved.pop().ok_or(CanvasError::UnbalancedRestore)?;
        self.current = parent;
        Ok(())
    }

    /// Back to a fresh default state with no saved frames.
    pub fn reset(&mut self) {
        self.current = CanvasState::default();
        self.saved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_reverts_every_field() {
        let mut stack = StateStack::new();
        stack.current_mut().fill_color = Some("#ff0000".into());
        let before = stack.current().clone();

        stack.save();
        {
            let state = stack.current_mut();
            state.offset = DVec2::new(4.0, 5.0);
            state.scale = 3.0;
            state.fill_color = None;
            state.dash_pattern = vec![1.0, 2.0, 3.0];
            state.font_style = FontStyle(FontStyle::BOLD);
            state.shadow = true;
            state.rotation = 45.0;
            state.push_transform("scale(2)");
        }
        stack.restore().unwrap();

        assert_eq!(stack.current(), &before);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn restore_without_save_fails() {
        let mut stack = StateStack::new();
        assert!(matches!(
            stack.restore(),
            Err(CanvasError::UnbalancedRestore)
        ));
    }

    #[test]
    fn none_clears_color() {
        assert_eq!(color_value(Some("none")), None);
        assert_eq!(color_value(Some("#ABC")), Some("#ABC".to_string()));
    }

    #[test]
    fn maps_coordinates_through_offset_and_scale() {
        let state = CanvasState {
            offset: DVec2::new(5.0, 5.0),
            scale: 2.0,
            ..CanvasState::default()
        };
        assert_eq!(state.map_x(10.0), 30.0);
        assert_eq!(state.map_y(20.0), 50.0);
    }
}
