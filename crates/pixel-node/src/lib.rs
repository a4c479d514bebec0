//! Pixel Node - Persistent Levels Backend
//!
//! Runs the progression core against RocksDB, with a local role ledger and
//! file-backed avatars, so levels and rank cards work without a chat platform.
//!
//! # Architecture
//!
//! - **Storage**: RocksDB-backed progression records and role ledger
//! - **Avatar**: `{user_id}.png` files served to the rank card renderer
//! - **Node**: environment config and the shared wiring
//!
//! # Example
//!
//! ```no_run
//! use pixel_node::{NodeConfig, PixelNode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let node = PixelNode::new(NodeConfig::from_env()?).await?;
//!     let outcome = node.experience().adjust_exp("123456789012345678", 25).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

pub mod avatar;
pub mod error;
pub mod node;
pub mod storage;

pub use avatar::FileAvatarService;
pub use error::{Error, Result};
pub use node::{NodeConfig, PixelNode};
pub use storage::{RetryPolicy, Storage};
