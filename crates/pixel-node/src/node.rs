//! Pixel node configuration and wiring.

use crate::avatar::FileAvatarService;
use crate::error::{Error, Result};
use crate::storage::{RetryPolicy, Storage};
use pixel_levels::{
    leaderboard, BadgeTable, ExperienceStore, LevelCurve, LevelReconciler, LevelRoles,
    ProgressionStore, TierRoleSynchronizer, UserId, DEFAULT_ADD_EXP, DEFAULT_BASE_EXP,
};
use pixel_rankcard::{Color, Identity, RankCardRenderer, RankCardStyle, Scene};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a Pixel node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Data directory for storage
    pub data_dir: PathBuf,

    /// Level curve constants
    pub curve: LevelCurve,

    /// Tier badge roles
    pub badges: BadgeTable,

    /// Rank card colors
    pub style: RankCardStyle,

    /// Directory holding `{user_id}.png` avatars
    pub avatar_dir: PathBuf,

    /// Store connection retry policy
    pub retry: RetryPolicy,

    /// Upper bound on a single avatar fetch
    pub avatar_timeout: Duration,
}

impl NodeConfig {
    /// Defaults rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            avatar_dir: data_dir.join("avatars"),
            data_dir,
            curve: LevelCurve::default(),
            badges: BadgeTable::with_default_tokens(),
            style: RankCardStyle::default(),
            retry: RetryPolicy::default(),
            avatar_timeout: pixel_rankcard::DEFAULT_AVATAR_TIMEOUT,
        }
    }

    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = PathBuf::from(var("PIXEL_DATA_DIR").unwrap_or_else(|| "./pixel-data".to_string()));

        let base = parse_var(&var, "PIXEL_BASE_EXP", DEFAULT_BASE_EXP)?;
        let add = parse_var(&var, "PIXEL_ADD_EXP", DEFAULT_ADD_EXP)?;
        let curve = LevelCurve::new(base, add)?;

        let badges = match var("PIXEL_ROLES_FILE") {
            Some(path) => load_roles(&PathBuf::from(path))?,
            None => BadgeTable::with_default_tokens(),
        };

        let style = match var("PIXEL_COLORS_FILE") {
            Some(path) => load_colors(&PathBuf::from(path))?,
            None => RankCardStyle::default(),
        };

        let avatar_dir = var("PIXEL_AVATAR_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("avatars"));

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_var(&var, "PIXEL_CONNECT_ATTEMPTS", defaults.max_attempts)?,
            delay: Duration::from_millis(parse_var(
                &var,
                "PIXEL_CONNECT_DELAY_MS",
                defaults.delay.as_millis() as u64,
            )?),
        };
        if retry.max_attempts == 0 {
            return Err(Error::Config("PIXEL_CONNECT_ATTEMPTS must be at least 1".into()));
        }

        let avatar_timeout = Duration::from_millis(parse_var(
            &var,
            "PIXEL_AVATAR_TIMEOUT_MS",
            pixel_rankcard::DEFAULT_AVATAR_TIMEOUT.as_millis() as u64,
        )?);

        Ok(Self {
            data_dir,
            curve,
            badges,
            style,
            avatar_dir,
            retry,
            avatar_timeout,
        })
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("Invalid {}: {:?}", key, raw))),
        None => Ok(default),
    }
}

fn load_roles(path: &PathBuf) -> Result<BadgeTable> {
    let data = std::fs::read(path)
        .map_err(|e| Error::Config(format!("Cannot read roles file {:?}: {}", path, e)))?;
    let roles: LevelRoles = serde_json::from_slice(&data)
        .map_err(|e| Error::Config(format!("Invalid roles file {:?}: {}", path, e)))?;
    Ok(roles.into())
}

/// One entry of the bot's color table; only the hex form is read.
#[derive(Deserialize)]
struct ColorData {
    hex: Color,
}

#[derive(Deserialize)]
struct LevelColors {
    back: ColorData,
    front: ColorData,
    expback: ColorData,
    expfront: ColorData,
}

/// Either the bot's whole `colors` table or a bare card style.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColorsFile {
    Bot { levels: LevelColors },
    Style(RankCardStyle),
}

fn load_colors(path: &PathBuf) -> Result<RankCardStyle> {
    let data = std::fs::read(path)
        .map_err(|e| Error::Config(format!("Cannot read colors file {:?}: {}", path, e)))?;
    let colors: ColorsFile = serde_json::from_slice(&data)
        .map_err(|e| Error::Config(format!("Invalid colors file {:?}: {}", path, e)))?;
    Ok(match colors {
        ColorsFile::Bot { levels } => RankCardStyle {
            back: levels.back.hex,
            front: levels.front.hex,
            exp_back: levels.expback.hex,
            exp_front: levels.expfront.hex,
        },
        ColorsFile::Style(style) => style,
    })
}

/// A Pixel node: one shared store behind the experience core and the renderer.
pub struct PixelNode {
    storage: Arc<Storage>,
    experience: ExperienceStore,
    renderer: RankCardRenderer,
    config: NodeConfig,
}

impl PixelNode {
    /// Create a new node, waiting for the store per the configured retry policy.
    pub async fn new(config: NodeConfig) -> Result<Self> {
        // Ensure data directory exists
        std::fs::create_dir_all(&config.data_dir)?;

        let storage = Arc::new(Storage::connect(config.data_dir.join("db"), config.retry).await?);

        let roles = TierRoleSynchronizer::new(storage.clone(), config.badges.clone());
        let reconciler = LevelReconciler::new(storage.clone(), config.curve, roles);
        let experience = ExperienceStore::new(storage.clone(), reconciler);

        let avatars = Arc::new(FileAvatarService::new(&config.avatar_dir));
        let renderer =
            RankCardRenderer::new(avatars, config.curve).with_avatar_timeout(config.avatar_timeout);

        tracing::debug!("Pixel node ready at {:?}", config.data_dir);

        Ok(Self {
            storage,
            experience,
            renderer,
            config,
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn storage(&self) -> Arc<Storage> {
        Arc::clone(&self.storage)
    }

    pub fn experience(&self) -> &ExperienceStore {
        &self.experience
    }

    pub fn renderer(&self) -> &RankCardRenderer {
        &self.renderer
    }

    /// 1-based leaderboard position.
    pub async fn rank_of(&self, user_id: &UserId) -> Result<Option<u64>> {
        Ok(leaderboard::rank_of(self.storage.as_ref(), user_id).await?)
    }

    /// Render a card from the stored record and current rank.
    pub async fn render_card(&self, identity: &Identity, style: &RankCardStyle) -> Result<Scene> {
        let user_id = &identity.user_id;
        let record = self
            .storage
            .read(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;
        let rank = self
            .rank_of(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;

        Ok(self
            .renderer
            .render(identity, record.level, record.exp, rank, style)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixel_levels::Outcome;
    use pixel_rankcard::DrawOp;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_defaults() {
        let config = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./pixel-data"));
        assert_eq!(config.avatar_dir, PathBuf::from("./pixel-data/avatars"));
        assert_eq!(config.curve, LevelCurve::default());
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.avatar_timeout, Duration::from_millis(5000));
        assert_eq!(config.badges, BadgeTable::with_default_tokens());
        assert_eq!(config.style, RankCardStyle::default());
    }

    #[test]
    fn config_overrides() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("PIXEL_DATA_DIR", "/srv/pixel"),
            ("PIXEL_BASE_EXP", "200"),
            ("PIXEL_ADD_EXP", "0"),
            ("PIXEL_CONNECT_ATTEMPTS", "9"),
            ("PIXEL_CONNECT_DELAY_MS", "25"),
        ]))
        .unwrap();
        assert_eq!(config.avatar_dir, PathBuf::from("/srv/pixel/avatars"));
        assert_eq!(config.curve.base(), 200);
        assert_eq!(config.curve.add(), 0);
        assert_eq!(config.retry.max_attempts, 9);
        assert_eq!(config.retry.delay, Duration::from_millis(25));
    }

    #[test]
    fn config_rejects_bad_values() {
        for vars in [
            [("PIXEL_BASE_EXP", "lots")],
            [("PIXEL_BASE_EXP", "0")],
            [("PIXEL_ADD_EXP", "-1")],
            [("PIXEL_CONNECT_ATTEMPTS", "0")],
            [("PIXEL_AVATAR_TIMEOUT_MS", "-5")],
            [("PIXEL_ROLES_FILE", "/nonexistent/roles.json")],
            [("PIXEL_COLORS_FILE", "/nonexistent/colors.json")],
        ] {
            assert!(NodeConfig::from_lookup(lookup(&vars)).is_err(), "{:?}", vars);
        }
    }

    #[test]
    fn config_reads_roles_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roles.json");
        std::fs::write(
            &path,
            r#"{"five":"r5","ten":"r10","twentyfive":"r25","fifty":"r50","hundered":"r100"}"#,
        )
        .unwrap();

        let config =
            NodeConfig::from_lookup(lookup(&[("PIXEL_ROLES_FILE", path.to_str().unwrap())])).unwrap();
        let tokens: Vec<_> = config.badges.badges().iter().map(|b| b.role.to_string()).collect();
        assert_eq!(tokens, ["r5", "r10", "r25", "r50", "r100"]);
    }

    #[test]
    fn config_reads_bot_colors_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colors.json");
        std::fs::write(
            &path,
            r##"{
                "black": {"hex": "#000000", "rgb": [0, 0, 0]},
                "levels": {
                    "front": {"hex": "#fafafa", "rgb": [250, 250, 250]},
                    "back": {"hex": "#202225"},
                    "expfront": {"hex": "#43b581"},
                    "expback": {"hex": "#484b51"}
                }
            }"##,
        )
        .unwrap();

        let config =
            NodeConfig::from_lookup(lookup(&[("PIXEL_COLORS_FILE", path.to_str().unwrap())])).unwrap();
        assert_eq!(config.style.back, Color::rgb(0x20, 0x22, 0x25));
        assert_eq!(config.style.front, Color::rgb(0xfa, 0xfa, 0xfa));
        assert_eq!(config.style.exp_front, Color::rgb(0x43, 0xb5, 0x81));
        assert_eq!(config.style.exp_back, Color::rgb(0x48, 0x4b, 0x51));
    }

    #[test]
    fn config_reads_flat_style_and_rejects_garbage() {
        let dir = tempdir().unwrap();
        let flat = dir.path().join("style.json");
        std::fs::write(
            &flat,
            r##"{"back": "#111111", "front": "#222222", "exp_back": "#333333", "exp_front": "#444444"}"##,
        )
        .unwrap();
        let config =
            NodeConfig::from_lookup(lookup(&[("PIXEL_COLORS_FILE", flat.to_str().unwrap())])).unwrap();
        assert_eq!(config.style.exp_front, Color::rgb(0x44, 0x44, 0x44));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"levels": {"back": "blue"}}"#).unwrap();
        let err = NodeConfig::from_lookup(lookup(&[("PIXEL_COLORS_FILE", bad.to_str().unwrap())]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn node_levels_up_and_grants_roles() {
        let dir = tempdir().unwrap();
        let node = PixelNode::new(NodeConfig::new(dir.path())).await.unwrap();
        let id = UserId::parse("123456789012345678").unwrap();
        node.storage().set_member(&id, true).unwrap();

        assert_eq!(node.experience().ensure_user(id.as_str()).await.unwrap(), Outcome::Applied(true));
        // threshold(5) = 500 + 200
        let change = node
            .experience()
            .adjust_exp(id.as_str(), 700)
            .await
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(change.to, 5);

        let roles = node.storage().list_roles(&id).unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].as_str(), "level-5");
        assert_eq!(node.rank_of(&id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn render_card_uses_stored_record() {
        let dir = tempdir().unwrap();
        let config = NodeConfig::new(dir.path());
        std::fs::create_dir_all(&config.avatar_dir).unwrap();
        std::fs::write(config.avatar_dir.join("123456789012345678.png"), b"png").unwrap();

        let node = PixelNode::new(config).await.unwrap();
        let id = UserId::parse("123456789012345678").unwrap();
        let _ = node.experience().ensure_user(id.as_str()).await.unwrap();
        let _ = node.experience().set_exp(id.as_str(), 250).await.unwrap();

        let identity = Identity::new(id, "pixel");
        let scene = node.render_card(&identity, &RankCardStyle::default()).await.unwrap();
        let texts: Vec<&str> = scene.texts().map(|(t, _, _)| t).collect();
        assert!(texts.contains(&"2"));
        assert!(texts.contains(&"#1"));
        assert!(scene.ops().iter().any(|op| matches!(op, DrawOp::Image { .. })));
    }

    #[tokio::test]
    async fn render_card_unknown_user() {
        let dir = tempdir().unwrap();
        let node = PixelNode::new(NodeConfig::new(dir.path())).await.unwrap();
        let identity = Identity::new(UserId::parse("000000000000000009").unwrap(), "ghost");
        let err = node.render_card(&identity, &RankCardStyle::default()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
