mod dto;
mod extract;
pub mod handlers;
pub mod listing;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
