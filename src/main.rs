mod actions;
mod admin;
mod app;
mod auth;
mod config;
mod inflight;
mod public;
mod revalidate;
mod state;
mod storage;
mod store;
mod validation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "portfolio=debug,axum=info,tower_http=info".to_string());
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

    let state = state::AppState::init().await?;

    if let Some(admin) = state.config.admin.clone() {
        if let Err(e) = auth::bootstrap_admin(&state, &admin).await {
            tracing::warn!(error = %e, "admin bootstrap failed; continuing");
        }
    }

    app::serve(app::build_app(state)).await
}
