//! Pixel Pizza Rank Cards
//!
//! Lays out a 700×250 summary card of a user's level, exp and rank.
//!
//! # Architecture
//!
//! - **Surface**: drawing primitive (rects, arc paths, circular clip, images, text)
//! - **Scene**: recording surface producing a serializable display list
//! - **Fit**: font size ladder for width budgets
//! - **Card**: clamping, display formula and layout
//!
//! The renderer never reads the progression store; callers pass level, exp
//! and rank in. Its only suspension point is the avatar fetch.
//!
//! # Usage
//!
//! ```ignore
//! let renderer = RankCardRenderer::new(avatars, curve);
//! let scene = renderer.render(&identity, level, exp, rank, &style).await?;
//! ```

mod avatar;
mod card;
mod color;
mod error;
mod fit;
mod scene;
mod surface;

pub use avatar::{Avatar, AvatarService, Identity};
pub use card::{
    display_needed_exp, rank_label, CardValues, RankCardRenderer, RankCardStyle, CANVAS_HEIGHT,
    CANVAS_WIDTH, DEFAULT_AVATAR_TIMEOUT, TRACK_LENGTH,
};
pub use color::{Color, ParseColorError};
pub use error::{Error, Result};
pub use fit::{fit_font_size, FONT_LADDER};
pub use scene::{DrawOp, Scene};
pub use surface::{FontMetrics, Path, PathSegment, SansMetrics, Surface};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_is_descending_and_finite() {
        assert_eq!(FONT_LADDER[0], 70.0);
        assert!(FONT_LADDER.windows(2).all(|w| w[0] - w[1] == 10.0));
    }

    #[test]
    fn track_fits_inside_panel() {
        assert!(TRACK_LENGTH < CANVAS_WIDTH);
    }
}
