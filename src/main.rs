mod bootstrap;
mod bot;
mod config;
mod conversation;
mod error;
mod gateway;
mod reconciler;
mod scheduler;
mod wallet;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,paybot=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting paybot");

    // Load configuration; missing required variables abort here
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    let state = bootstrap::initialize_app_state(&config).await?;

    // Reconciliation runs independently of message handling
    let _reconciler_task = state.reconciler.start();

    state.dispatcher.run().await;

    Ok(())
}
