//! Value types shared by the canvas: number formatting, boxes and the small
//! enums the command producer passes in.

use std::fmt;

/// Round to 2 decimal places (`round(x * 100) / 100`).
///
/// Every coordinate written to the output goes through this so identical
/// command streams always serialize to identical markup.
#[inline]
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Normalize -0.0 so it never prints as "-0"
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Format a number with the shortest representation that round-trips,
/// without a trailing `.0` for integral values.
pub fn fmt_num(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// [`round2`] followed by [`fmt_num`].
#[inline]
pub fn fmt2(value: f64) -> String {
    fmt_num(round2(value))
}

/// Format a number rounded to the nearest integer.
#[inline]
pub fn fmt_int(value: f64) -> String {
    fmt_num(value.round())
}

/// Axis-aligned box in output pixels.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Width and height of a measured label.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Direction a two-stop gradient runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum GradientDirection {
    North,
    #[default]
    South,
    East,
    West,
}

impl GradientDirection {
    /// The canonical direction and whether the colors must be swapped to
    /// express `self` on that direction's axis.
    pub fn canonical(self) -> (GradientDirection, bool) {
        match self {
            GradientDirection::South => (GradientDirection::South, false),
            GradientDirection::East => (GradientDirection::East, false),
            GradientDirection::North => (GradientDirection::South, true),
            GradientDirection::West => (GradientDirection::East, true),
        }
    }

    /// Short code used inside gradient identifiers.
    pub fn code(self) -> &'static str {
        match self {
            GradientDirection::North => "n",
            GradientDirection::South => "s",
            GradientDirection::East => "e",
            GradientDirection::West => "w",
        }
    }
}

/// Horizontal label alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Horizontal shift applied to a box of width `w` placed at the anchor.
    pub fn offset(self, w: f64) -> f64 {
        match self {
            Align::Left => 0.0,
            Align::Center => -w / 2.0,
            Align::Right => -w,
        }
    }

    /// Equivalent `text-anchor` value.
    pub fn text_anchor(self) -> &'static str {
        match self {
            Align::Left => "start",
            Align::Center => "middle",
            Align::Right => "end",
        }
    }
}

/// Vertical label alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl VAlign {
    /// Vertical shift applied to a box of height `h` placed at the anchor.
    pub fn offset(self, h: f64) -> f64 {
        match self {
            VAlign::Top => 0.0,
            VAlign::Middle => -h / 2.0,
            VAlign::Bottom => -h,
        }
    }
}

/// How a label's measured box relates to the box it was given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Overflow {
    /// The measured size wins.
    #[default]
    Visible,
    /// The given box is used as is.
    Fill,
    /// The given width is used, the measured height wins.
    Width,
}

/// Label content format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextFormat {
    #[default]
    Plain,
    Html,
}

/// Writing direction of a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
    Auto,
}

impl TextDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
            TextDirection::Auto => "auto",
        }
    }
}

/// Stroke end cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Flat,
    Round,
    Square,
}

impl LineCap {
    /// SVG name; `flat` is called `butt` there.
    pub fn svg_name(self) -> &'static str {
        match self {
            LineCap::Flat => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

/// Stroke corner join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn svg_name(self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }
}

/// Font style bitmask (bold, italic, underline).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub struct FontStyle(pub u8);

impl FontStyle {
    pub const BOLD: u8 = 1;
    pub const ITALIC: u8 = 2;
    pub const UNDERLINE: u8 = 4;

    pub fn is_bold(self) -> bool {
        self.0 & Self::BOLD != 0
    }

    pub fn is_italic(self) -> bool {
        self.0 & Self::ITALIC != 0
    }

    pub fn is_underline(self) -> bool {
        self.0 & Self::UNDERLINE != 0
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_matches_round_times_hundred() {
        for value in [0.0, 0.004, 0.005, 1.2345, -3.14159] {
            assert_eq!(round2(value), (value * 100.0).round() / 100.0 + 0.0);
        }
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(1.2345), 1.23);
        assert_eq!(round2(-3.14159), -3.14);
    }

    #[test]
    fn round2_is_stable_for_half_cents() {
        // 1.005 is stored slightly below the half, so it rounds down every time
        let first = round2(1.005);
        assert!(first == 1.0 || first == 1.01);
        assert_eq!(round2(1.005), first);
    }

    #[test]
    fn fmt_num_drops_trailing_zero() {
        assert_eq!(fmt_num(30.0), "30");
        assert_eq!(fmt_num(0.5), "0.5");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt2(-0.001), "0");
        assert_eq!(fmt2(1.2345), "1.23");
    }

    #[test]
    fn alignment_offsets() {
        assert_eq!(Align::Center.offset(40.0), -20.0);
        assert_eq!(Align::Right.offset(40.0), -40.0);
        assert_eq!(VAlign::Middle.offset(10.0), -5.0);
        assert_eq!(VAlign::Bottom.offset(10.0), -10.0);
    }

    #[test]
    fn font_style_bits() {
        let style = FontStyle(FontStyle::BOLD | FontStyle::UNDERLINE);
        assert!(style.is_bold());
        assert!(!style.is_italic());
        assert!(style.is_underline());
    }

    #[test]
    fn bounds_union() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, -5.0, 10.0, 10.0);
        assert_eq!(a.union(&b), Bounds::new(0.0, -5.0, 15.0, 15.0));
    }
}
