use axum::Router;
use tracing::info;

use crate::{config::AdminBootstrap, state::AppState};

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod session;

pub use session::{AdminIdentity, RequireAdmin, Session};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

/// Creates the configured admin account if no user with that email exists.
pub async fn bootstrap_admin(state: &AppState, admin: &AdminBootstrap) -> anyhow::Result<()> {
    let email = admin.email.trim().to_lowercase();
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Ok(());
    }
    let hash = password::hash_password(&admin.password)?;
    let user = state.store.create_user(&email, &hash).await?;
    info!(user_id = %user.id, email = %user.email, "admin account created");
    Ok(())
}
