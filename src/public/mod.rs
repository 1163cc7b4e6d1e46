pub mod gallery;
pub mod handlers;
pub mod home;
pub mod modal;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
