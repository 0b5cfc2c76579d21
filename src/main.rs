mod app;
mod auth;
mod catalog;
mod config;
mod state;
mod store;

use crate::catalog::{gateway::WorkoutGateway, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "fitpath=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    if app_state.config.seed_on_start {
        let gateway = WorkoutGateway::new(app_state.store.clone());
        if let Err(e) = seed::seed_if_empty(&gateway).await {
            tracing::warn!(error = %e, "seeding sample catalog failed; continuing");
        }
    }

    app::serve(app::build_app(app_state)).await
}
