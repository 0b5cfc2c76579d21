pub mod builder;
pub mod dto;
pub mod gateway;
pub mod handlers;
pub mod listing;
pub mod model;
pub mod seed;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
