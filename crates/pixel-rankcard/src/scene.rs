//! Recording surface.
//!
//! A [`Scene`] keeps every draw call as a [`DrawOp`] in order, producing a
//! serializable display list that a rasterizer can replay. Text is measured
//! with [`SansMetrics`] unless another [`FontMetrics`] is supplied.

use crate::avatar::Avatar;
use crate::color::Color;
use crate::surface::{FontMetrics, Path, SansMetrics, Surface};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    FillRect {
        origin: Vec2,
        size: Vec2,
        color: Color,
    },
    FillPath {
        path: Path,
        color: Color,
    },
    ClipCircle {
        center: Vec2,
        radius: f32,
    },
    Image {
        avatar: Avatar,
        origin: Vec2,
        size: Vec2,
    },
    Text {
        text: String,
        origin: Vec2,
        font_size: f32,
        color: Color,
    },
}

/// Fixed-size display list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    size: Vec2,
    ops: Vec<DrawOp>,
    #[serde(skip)]
    metrics: Metrics,
}

#[derive(Clone, Default)]
struct Metrics(Option<std::sync::Arc<dyn FontMetrics + Send + Sync>>);

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.0.is_some() { "Custom" } else { "Sans" })
    }
}

impl Scene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            ops: Vec::new(),
            metrics: Metrics::default(),
        }
    }

    /// Measure text with `metrics` instead of the built-in sans widths.
    pub fn with_metrics(mut self, metrics: impl FontMetrics + Send + Sync + 'static) -> Self {
        self.metrics = Metrics(Some(std::sync::Arc::new(metrics)));
        self
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Every text op as `(text, origin, font_size)`.
    pub fn texts(&self) -> impl Iterator<Item = (&str, Vec2, f32)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text {
                text,
                origin,
                font_size,
                ..
            } => Some((text.as_str(), *origin, *font_size)),
            _ => None,
        })
    }

    /// Every filled path with its color.
    pub fn paths(&self) -> impl Iterator<Item = (&Path, Color)> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::FillPath { path, color } => Some((path, *color)),
            _ => None,
        })
    }
}

impl Surface for Scene {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        self.ops.push(DrawOp::FillRect {
            origin,
            size,
            color,
        });
    }

    fn fill_path(&mut self, path: &Path, color: Color) {
        self.ops.push(DrawOp::FillPath {
            path: path.clone(),
            color,
        });
    }

    fn clip_circle(&mut self, center: Vec2, radius: f32) {
        self.ops.push(DrawOp::ClipCircle { center, radius });
    }

    fn draw_image(&mut self, image: &Avatar, origin: Vec2, size: Vec2) {
        self.ops.push(DrawOp::Image {
            avatar: image.clone(),
            origin,
            size,
        });
    }

    fn fill_text(&mut self, text: &str, origin: Vec2, font_size: f32, color: Color) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            origin,
            font_size,
            color,
        });
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        match &self.metrics.0 {
            Some(metrics) => metrics.text_width(text, font_size),
            None => SansMetrics.text_width(text, font_size),
        }
    }
}
