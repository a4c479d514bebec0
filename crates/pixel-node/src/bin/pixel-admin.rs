//! pixel-admin CLI tool
//!
//! Manages progression records and the role ledger of a Pixel node.
//!
//! Usage:
//!   pixel-admin add-user <user_id>
//!   pixel-admin add-exp <user_id> <amount>
//!   pixel-admin set-exp <user_id> <amount>
//!   pixel-admin add-level <user_id> <amount>
//!   pixel-admin set-level <user_id> <amount>
//!   pixel-admin show <user_id>
//!   pixel-admin rank <user_id>
//!   pixel-admin join <user_id>
//!   pixel-admin leave <user_id>
//!   pixel-admin roles <user_id>
//!   pixel-admin render <user_id> <username> [out.json]

use pixel_levels::{parse_amount, LevelChange, Outcome, ProgressionStore, Rejection, UserId};
use pixel_node::{NodeConfig, PixelNode};
use pixel_rankcard::Identity;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_usage() {
    eprintln!("pixel-admin - Manage Pixel levels and level roles");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  pixel-admin add-user <user_id>             Create an empty record");
    eprintln!("  pixel-admin add-exp <user_id> <amount>     Add (or subtract) exp");
    eprintln!("  pixel-admin set-exp <user_id> <amount>     Set exp");
    eprintln!("  pixel-admin add-level <user_id> <amount>   Add (or subtract) levels");
    eprintln!("  pixel-admin set-level <user_id> <amount>   Set level");
    eprintln!("  pixel-admin show <user_id>                 Show exp and level");
    eprintln!("  pixel-admin rank <user_id>                 Show leaderboard position");
    eprintln!("  pixel-admin join <user_id>                 Add to the community");
    eprintln!("  pixel-admin leave <user_id>                Remove from the community");
    eprintln!("  pixel-admin roles <user_id>                List held roles");
    eprintln!("  pixel-admin render <user_id> <username> [out.json]");
    eprintln!("                                             Render a rank card display list");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PIXEL_DATA_DIR           Data directory (default: ./pixel-data)");
    eprintln!("  PIXEL_BASE_EXP           Level curve base (default: 100)");
    eprintln!("  PIXEL_ADD_EXP            Level curve increment (default: 50)");
    eprintln!("  PIXEL_ROLES_FILE         JSON file naming the tier roles");
    eprintln!("  PIXEL_COLORS_FILE        JSON file with the rank card colors");
    eprintln!("  PIXEL_AVATAR_DIR         Avatar directory (default: $PIXEL_DATA_DIR/avatars)");
    eprintln!("  PIXEL_CONNECT_ATTEMPTS   Store open attempts (default: 5)");
    eprintln!("  PIXEL_CONNECT_DELAY_MS   Delay between attempts (default: 100)");
    eprintln!("  PIXEL_AVATAR_TIMEOUT_MS  Avatar fetch timeout (default: 5000)");
}

fn require<'a>(args: &'a [String], index: usize, what: &str) -> &'a str {
    match args.get(index) {
        Some(arg) => arg,
        None => {
            eprintln!("Error: {} requires a {} argument", args[1], what);
            std::process::exit(1);
        }
    }
}

fn user_id(raw: &str) -> UserId {
    match UserId::parse(raw) {
        Ok(id) => id,
        Err(e) => reject(e.into()),
    }
}

fn amount(raw: &str) -> i64 {
    match parse_amount(raw) {
        Ok(amount) => amount,
        Err(e) => reject(e.into()),
    }
}

fn reject(reason: Rejection) -> ! {
    eprintln!("Rejected: {}", reason);
    std::process::exit(2);
}

fn report(outcome: Outcome<LevelChange>) {
    match outcome {
        Outcome::Applied(change) => {
            if change.changed() {
                println!("exp {}, level {} -> {}", change.exp, change.from, change.to);
            } else {
                println!("exp {}, level {}", change.exp, change.to);
            }
        }
        Outcome::Rejected(reason) => reject(reason),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pixel_admin=info,pixel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }
    if matches!(args[1].as_str(), "-h" | "--help" | "help") {
        print_usage();
        return Ok(());
    }

    let config = NodeConfig::from_env()?;
    let node = PixelNode::new(config).await?;
    let experience = node.experience();

    match args[1].as_str() {
        "add-user" => {
            let raw = require(&args, 2, "user_id");
            match experience.ensure_user(raw).await? {
                Outcome::Applied(true) => println!("Created {}", raw),
                Outcome::Applied(false) => println!("{} already exists", raw),
                Outcome::Rejected(reason) => reject(reason),
            }
        }
        "add-exp" => {
            let raw = require(&args, 2, "user_id");
            let delta = amount(require(&args, 3, "amount"));
            report(experience.adjust_exp(raw, delta).await?);
        }
        "set-exp" => {
            let raw = require(&args, 2, "user_id");
            let value = amount(require(&args, 3, "amount"));
            report(experience.set_exp(raw, value).await?);
        }
        "add-level" => {
            let raw = require(&args, 2, "user_id");
            let delta = amount(require(&args, 3, "amount"));
            report(experience.adjust_level(raw, delta).await?);
        }
        "set-level" => {
            let raw = require(&args, 2, "user_id");
            let value = amount(require(&args, 3, "amount"));
            report(experience.set_level(raw, value).await?);
        }
        "show" => {
            let id = user_id(require(&args, 2, "user_id"));
            match node.storage().read(&id).await? {
                Some(record) => println!("exp {}, level {}", record.exp, record.level),
                None => {
                    eprintln!("No record for {}", id);
                    std::process::exit(1);
                }
            }
        }
        "rank" => {
            let id = user_id(require(&args, 2, "user_id"));
            match node.rank_of(&id).await? {
                Some(rank) => println!("#{}", rank),
                None => {
                    eprintln!("No record for {}", id);
                    std::process::exit(1);
                }
            }
        }
        "join" => {
            let id = user_id(require(&args, 2, "user_id"));
            node.storage().set_member(&id, true)?;
            // Catch up on tiers earned before joining.
            let level = node.storage().get_user(&id)?.map(|r| r.level).unwrap_or(0);
            let report = experience.reconciler().roles().sync(&id, level).await;
            println!("{} joined ({:?})", id, report);
        }
        "leave" => {
            let id = user_id(require(&args, 2, "user_id"));
            node.storage().set_member(&id, false)?;
            println!("{} left", id);
        }
        "roles" => {
            let id = user_id(require(&args, 2, "user_id"));
            let roles = node.storage().list_roles(&id)?;
            if roles.is_empty() {
                println!("(none)");
            } else {
                for role in roles {
                    println!("  {}", role);
                }
            }
        }
        "render" => {
            let id = user_id(require(&args, 2, "user_id"));
            let username = require(&args, 3, "username");
            let identity = Identity::new(id, username);
            let scene = node.render_card(&identity, &node.config().style).await?;
            let json = serde_json::to_string_pretty(&scene)?;
            match args.get(4) {
                Some(path) => {
                    std::fs::write(path, json)?;
                    println!("Wrote {}", path);
                }
                None => println!("{}", json),
            }
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
