//! Rank card layout.
//!
//! A fixed 700×250 card:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ╭────╮               rank #3  level 12       │
//! │  │ av │  username                 120 / 1900 xp│
//! │  ╰────╯   (=========------------------------)  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The needed-exp label uses its own display formula, which differs from the
//! reconciler's threshold at level 100 and in which bracket edge it shows.
//! Both are kept as they are.

use crate::avatar::{Avatar, AvatarService, Identity};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::fit::fit_font_size;
use crate::scene::Scene;
use crate::surface::{Path, Surface};
use glam::Vec2;
use pixel_levels::{LevelCurve, MAX_LEVEL};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const CANVAS_WIDTH: f32 = 700.0;
pub const CANVAS_HEIGHT: f32 = 250.0;

/// Length of the progress track between its two cap centers.
pub const TRACK_LENGTH: f32 = 410.0;
const TRACK_START_X: f32 = 240.0;
const TRACK_CENTER_Y: f32 = 190.0;
const TRACK_RADIUS: f32 = 20.0;

const PANEL_INSET: Vec2 = Vec2::new(15.0, 20.0);
const PANEL_SIZE: Vec2 = Vec2::new(670.0, 210.0);

/// Width margins: a text may use `CANVAS_WIDTH - margin` pixels.
const USERNAME_MARGIN: f32 = 480.0;
const STAT_MARGIN: f32 = 500.0;

const STAT_BASELINE: f32 = 75.0;
const LABEL_FONT_SIZE: f32 = 30.0;
const RIGHT_PADDING: f32 = 20.0;
const LEVEL_LABEL_GAP: f32 = 8.0;
const RANK_GAP: f32 = 5.0;
const EXP_TEXT_SHIFT: f32 = 10.0;

const AVATAR_CLIP_CENTER: Vec2 = Vec2::new(115.0, 125.0);
const AVATAR_CLIP_RADIUS: f32 = 80.0;
const AVATAR_ORIGIN: Vec2 = Vec2::new(35.0, 45.0);
const AVATAR_SIZE: Vec2 = Vec2::new(160.0, 160.0);

const TEXT_COLOR: Color = Color::BLACK;

/// Default wait for the avatar service.
pub const DEFAULT_AVATAR_TIMEOUT: Duration = Duration::from_secs(5);

/// Card colors. Reads the bot's `colors.levels` shape, so `expback` and
/// `expfront` are accepted as keys too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCardStyle {
    /// Outer panel
    pub back: Color,
    /// Inner panel
    pub front: Color,
    /// Progress track
    #[serde(alias = "expback")]
    pub exp_back: Color,
    /// Progress fill
    #[serde(alias = "expfront")]
    pub exp_front: Color,
}

impl Default for RankCardStyle {
    fn default() -> Self {
        Self {
            back: Color::rgb(0x2c, 0x2f, 0x33),
            front: Color::rgb(0xf2, 0xf3, 0xf5),
            exp_back: Color::rgb(0xc0, 0xc0, 0xc0),
            exp_front: Color::rgb(0x00, 0x99, 0xff),
        }
    }
}

/// Values as they appear on the card, after clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardValues {
    pub level: i64,
    pub exp: i64,
    pub needed_exp: i64,
    pub rank_text: String,
}

impl CardValues {
    /// Clamp exp to ≥ 0 and level to 0..=100, and cap the rank display at `99+`.
    pub fn new(curve: &LevelCurve, level: i64, exp: i64, rank: u64) -> Self {
        let level = level.clamp(0, MAX_LEVEL);
        Self {
            level,
            exp: exp.max(0),
            needed_exp: display_needed_exp(curve, level),
            rank_text: rank_label(rank),
        }
    }

    pub fn exp_text(&self) -> String {
        format!("{} / {} xp", self.exp, self.needed_exp)
    }

    /// Fill length of the progress pill; `None` when there is nothing to fill.
    pub fn fill_length(&self) -> Option<f32> {
        if self.exp == 0 {
            return None;
        }
        Some(TRACK_LENGTH * self.exp as f32 / self.needed_exp as f32)
    }
}

/// Exp shown as the goal for `level`.
///
/// ```
/// use pixel_levels::LevelCurve;
/// use pixel_rankcard::display_needed_exp;
///
/// let curve = LevelCurve::new(100, 50).unwrap();
/// assert_eq!(display_needed_exp(&curve, 0), 100);
/// assert_eq!(display_needed_exp(&curve, 2), 400);
/// assert_eq!(display_needed_exp(&curve, 100), 100 * 100 + 50 * 99);
/// ```
pub fn display_needed_exp(curve: &LevelCurve, level: i64) -> i64 {
    if level == MAX_LEVEL {
        curve.base() * level + curve.add() * (level - 1)
    } else {
        curve.base() * (level + 1) + curve.add() * level
    }
}

/// `#rank`, or `#99+` from 100 on.
pub fn rank_label(rank: u64) -> String {
    if rank >= 100 {
        "#99+".to_string()
    } else {
        format!("#{rank}")
    }
}

/// Renders rank cards.
#[derive(Clone)]
pub struct RankCardRenderer {
    avatars: Arc<dyn AvatarService>,
    curve: LevelCurve,
    avatar_timeout: Duration,
}

impl RankCardRenderer {
    pub fn new(avatars: Arc<dyn AvatarService>, curve: LevelCurve) -> Self {
        Self {
            avatars,
            curve,
            avatar_timeout: DEFAULT_AVATAR_TIMEOUT,
        }
    }

    pub fn with_avatar_timeout(mut self, timeout: Duration) -> Self {
        self.avatar_timeout = timeout;
        self
    }

    /// Render onto a fresh 700×250 [`Scene`].
    pub async fn render(
        &self,
        identity: &Identity,
        level: i64,
        exp: i64,
        rank: u64,
        style: &RankCardStyle,
    ) -> Result<Scene> {
        let mut scene = Scene::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        self.render_onto(&mut scene, identity, level, exp, rank, style)
            .await?;
        Ok(scene)
    }

    /// Render onto any surface of the card size.
    ///
    /// The avatar is fetched before anything is drawn; if it fails the
    /// surface is left untouched.
    pub async fn render_onto<S: Surface + Send>(
        &self,
        surface: &mut S,
        identity: &Identity,
        level: i64,
        exp: i64,
        rank: u64,
        style: &RankCardStyle,
    ) -> Result<()> {
        let avatar = self.fetch_avatar(identity).await?;
        let values = CardValues::new(&self.curve, level, exp, rank);
        draw_card(surface, identity, &values, style, &avatar);
        tracing::debug!(
            user = %identity.user_id,
            level = values.level,
            exp = values.exp,
            rank = %values.rank_text,
            "rendered rank card"
        );
        Ok(())
    }

    async fn fetch_avatar(&self, identity: &Identity) -> Result<Avatar> {
        match tokio::time::timeout(self.avatar_timeout, self.avatars.fetch_avatar(identity)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(user = %identity.user_id, "avatar fetch timed out");
                Err(Error::AvatarTimeout(self.avatar_timeout))
            }
        }
    }
}

fn draw_card<S: Surface + ?Sized>(
    surface: &mut S,
    identity: &Identity,
    values: &CardValues,
    style: &RankCardStyle,
    avatar: &Avatar,
) {
    let canvas = surface.size();
    surface.fill_rect(Vec2::ZERO, canvas, style.back);
    surface.fill_rect(PANEL_INSET, PANEL_SIZE, style.front);

    // Username, left of center.
    let name_size = fit_font_size(&*surface, &identity.username, CANVAS_WIDTH - USERNAME_MARGIN);
    let name_origin = Vec2::new(CANVAS_WIDTH / 3.0 - 10.0, CANVAS_HEIGHT / 1.6);
    surface.fill_text(&identity.username, name_origin, name_size, TEXT_COLOR);

    // Stats row, laid out right to left: level digits, "level", rank, "rank".
    let level_text = values.level.to_string();
    let level_size = fit_font_size(&*surface, &level_text, CANVAS_WIDTH - STAT_MARGIN);
    let mut x = CANVAS_WIDTH - (surface.measure_text(&level_text, level_size) + RIGHT_PADDING);
    surface.fill_text(&level_text, Vec2::new(x, STAT_BASELINE), level_size, TEXT_COLOR);

    x -= level_size + LEVEL_LABEL_GAP;
    surface.fill_text("level", Vec2::new(x, STAT_BASELINE), LABEL_FONT_SIZE, TEXT_COLOR);

    let rank_size = fit_font_size(&*surface, &values.rank_text, CANVAS_WIDTH - STAT_MARGIN);
    x -= surface.measure_text(&values.rank_text, rank_size) + RANK_GAP;
    surface.fill_text(&values.rank_text, Vec2::new(x, STAT_BASELINE), rank_size, TEXT_COLOR);

    x -= rank_size + RANK_GAP;
    surface.fill_text("rank", Vec2::new(x, STAT_BASELINE), LABEL_FONT_SIZE, TEXT_COLOR);

    // Exp text, right-aligned on the username row.
    let exp_text = values.exp_text();
    let exp_x = CANVAS_WIDTH
        - (surface.measure_text(&exp_text, LABEL_FONT_SIZE) + RIGHT_PADDING)
        - EXP_TEXT_SHIFT;
    surface.fill_text(&exp_text, Vec2::new(exp_x, CANVAS_HEIGHT / 1.6), LABEL_FONT_SIZE, TEXT_COLOR);

    // Progress pill.
    let track = Path::pill(TRACK_START_X, TRACK_START_X + TRACK_LENGTH, TRACK_CENTER_Y, TRACK_RADIUS);
    surface.fill_path(&track, style.exp_back);
    if let Some(length) = values.fill_length() {
        let fill = Path::pill(TRACK_START_X, TRACK_START_X + length, TRACK_CENTER_Y, TRACK_RADIUS);
        surface.fill_path(&fill, style.exp_front);
    }

    // Avatar last, since the clip applies to everything after it.
    surface.clip_circle(AVATAR_CLIP_CENTER, AVATAR_CLIP_RADIUS);
    surface.draw_image(avatar, AVATAR_ORIGIN, AVATAR_SIZE);
}
