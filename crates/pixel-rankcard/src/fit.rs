//! Font size fitting.
//!
//! Sizes come from a fixed descending ladder, so the search always ends.

use crate::surface::Surface;

/// Candidate font sizes, largest first.
pub const FONT_LADDER: [f32; 7] = [70.0, 60.0, 50.0, 40.0, 30.0, 20.0, 10.0];

/// Largest ladder size at which `text` fits in `budget` pixels, or the
/// smallest ladder size when nothing fits.
pub fn fit_font_size<S: Surface + ?Sized>(surface: &S, text: &str, budget: f32) -> f32 {
    FONT_LADDER
        .iter()
        .copied()
        .find(|&size| surface.measure_text(text, size) <= budget)
        .unwrap_or(FONT_LADDER[FONT_LADDER.len() - 1])
}
