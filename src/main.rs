//! # posts-watch
//!
//! Follows a blog server and logs every snapshot change until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use posts_store::config::StoreConfig;
use posts_store::lifecycle::{setup_tracing, PostsSystem};
use posts_store::store::PostsState;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "posts-watch",
    version,
    about = "Follow a blog server and log post snapshot changes"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Blog server origin, e.g. http://127.0.0.1:8080
    #[arg(long)]
    base_url: Option<String>,

    /// Stop when the reload stream closes instead of reconnecting.
    #[arg(long)]
    no_reconnect: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if cli.no_reconnect {
        config.reconnect = false;
    }

    let system = PostsSystem::start(config).context("starting posts store")?;
    let mut updates = system.store.subscribe();

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Store stopped publishing");
                    break;
                }
                let state = updates.borrow_and_update().clone();
                report(&state);
            }
            _ = &mut interrupted => {
                info!("Interrupted");
                break;
            }
        }
    }

    system.shutdown().await.context("shutting down")?;
    Ok(())
}

fn report(state: &PostsState) {
    if state.is_loading() {
        info!(phase = ?state.phase(), "Loading posts");
        return;
    }
    match state.error() {
        Some(error) => warn!(
            revision = state.revision(),
            posts = state.posts().len(),
            error,
            "Showing stale posts"
        ),
        None => {
            info!(revision = state.revision(), posts = state.posts().len(), "Posts updated");
            for post in state.posts() {
                info!(
                    slug = %post.slug,
                    title = %post.metadata.title,
                    date = %post.metadata.date,
                    "  post"
                );
            }
        }
    }
}
