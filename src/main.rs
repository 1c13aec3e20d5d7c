mod catalog;
mod commands;
mod loadout;
mod menu;
mod session;
mod sync;
mod util;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use clap::Parser;
use sqlx::mysql::MySqlPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::catalog::Catalogs;
use crate::sync::MySqlStorage;
use crate::util::handler;
use crate::util::{AppState, Args, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}=debug,tower_http=debug,axum=trace",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    let catalogs = Arc::new(Catalogs::load(&args.data_dir));

    let pool = MySqlPoolOptions::new()
        .max_connections(16)
        .connect(&config.database.url())
        .await
        .context("failed to connect to the loadout database")?;
    let storage = MySqlStorage::new(pool);
    storage
        .ensure_schema()
        .await
        .context("failed to prepare database tables")?;

    let app_state = AppState::new(config, catalogs, Arc::new(storage));

    let app = Router::new()
        .route("/event/connect", post(handler::connect))
        .route("/event/disconnect", post(handler::disconnect))
        .route("/event/team", post(handler::team))
        .route("/event/weapon", post(handler::weapon))
        .route("/event/map-start", post(handler::map_start))
        .route("/event/reload", post(handler::reload))
        .route("/command/refresh", post(handler::command_refresh))
        .route("/command/info", post(handler::command_info))
        .route("/command/stattrak", post(handler::command_stattrak))
        .route("/menu/{category}", get(handler::menu))
        .route("/preview", get(handler::preview))
        .route("/select/{category}", post(handler::select))
        .with_state(app_state)
        .layer((
            TraceLayer::new_for_http(),
            // Graceful shutdown will wait for outstanding requests to complete. Add a timeout so
            // requests don't hang forever.
            TimeoutLayer::new(Duration::from_secs(10)),
        ));

    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!(listen = %args.listen, "loadout service ready");
    axum::serve(listener, app)
        .with_graceful_shutdown(handler::shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
