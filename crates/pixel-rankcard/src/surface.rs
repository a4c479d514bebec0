//! Drawable surface primitive.
//!
//! Coordinates are pixels with the origin top-left and y growing downward.
//! Angles are radians measured clockwise on screen, 0 pointing right. Text
//! origins are the left end of the baseline.

use crate::avatar::Avatar;
use crate::color::Color;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// One step of a path outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathSegment {
    /// Circular arc, joined to the previous point by a straight line.
    Arc {
        center: Vec2,
        radius: f32,
        start: f32,
        end: f32,
        counter_clockwise: bool,
    },
    LineTo(Vec2),
    Close,
}

/// A closed outline to fill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(mut self, center: Vec2, radius: f32, start: f32, end: f32, counter_clockwise: bool) -> Self {
        self.segments.push(PathSegment::Arc {
            center,
            radius,
            start,
            end,
            counter_clockwise,
        });
        self
    }

    pub fn line_to(mut self, point: Vec2) -> Self {
        self.segments.push(PathSegment::LineTo(point));
        self
    }

    pub fn close(mut self) -> Self {
        self.segments.push(PathSegment::Close);
        self
    }

    /// Horizontal pill: half-circle caps of `radius` centered at `from_x` and
    /// `to_x` on `center_y`, joined by straight edges.
    pub fn pill(from_x: f32, to_x: f32, center_y: f32, radius: f32) -> Self {
        Self::new()
            .arc(Vec2::new(from_x, center_y), radius, PI * 1.5, PI * 0.5, true)
            .line_to(Vec2::new(to_x, center_y + radius))
            .arc(Vec2::new(to_x, center_y), radius, PI * 0.5, PI * 1.5, true)
            .close()
    }

    /// Rightmost arc center, i.e. where a pill ends.
    pub fn end_cap_x(&self) -> Option<f32> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                PathSegment::Arc { center, .. } => Some(center.x),
                _ => None,
            })
            .reduce(f32::max)
    }
}

/// Something the rank card can be drawn on.
pub trait Surface {
    /// Surface size in pixels.
    fn size(&self) -> Vec2;

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color);

    fn fill_path(&mut self, path: &Path, color: Color);

    /// Restrict all later drawing to a circle.
    fn clip_circle(&mut self, center: Vec2, radius: f32);

    /// Draw an image scaled into the given rectangle.
    fn draw_image(&mut self, image: &Avatar, origin: Vec2, size: Vec2);

    fn fill_text(&mut self, text: &str, origin: Vec2, font_size: f32, color: Color);

    /// Rendered width of `text` at `font_size`.
    fn measure_text(&self, text: &str, font_size: f32) -> f32;
}

/// Text width estimation for a font family.
pub trait FontMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// Proportional sans-serif advance widths, in ems.
#[derive(Debug, Clone, Copy, Default)]
pub struct SansMetrics;

impl SansMetrics {
    fn advance(c: char) -> f32 {
        match c {
            'i' | 'j' | 'l' | '|' | '!' | '.' | ',' | ':' | ';' | '\'' => 0.22,
            'f' | 't' | 'r' | 'I' | ' ' | '(' | ')' | '[' | ']' | '/' => 0.30,
            'm' | 'w' | 'M' | 'W' | '@' => 0.83,
            '0'..='9' | '#' | '+' | '-' | '_' => 0.56,
            c if c.is_ascii_uppercase() => 0.67,
            c if c.is_ascii() => 0.52,
            // Wide glyphs (CJK, emoji) take a full em.
            _ => 1.0,
        }
    }
}

impl FontMetrics for SansMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(Self::advance).sum::<f32>() * font_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pill_spans_requested_length() {
        let pill = Path::pill(240.0, 650.0, 190.0, 20.0);
        assert_eq!(pill.segments.len(), 4);
        assert_eq!(pill.end_cap_x(), Some(650.0));
        assert_eq!(
            pill.segments[1],
            PathSegment::LineTo(Vec2::new(650.0, 210.0))
        );
    }

    #[test]
    fn sans_widths_scale_with_size() {
        let m = SansMetrics;
        let w10 = m.text_width("level 42", 10.0);
        let w20 = m.text_width("level 42", 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-4);
        assert!(m.text_width("WWW", 10.0) > m.text_width("iii", 10.0));
        assert_eq!(m.text_width("", 70.0), 0.0);
    }
}
