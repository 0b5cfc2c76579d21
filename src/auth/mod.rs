use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod repo;
mod repo_types;
pub mod services;

pub use dto::JwtKeys;
pub use extractors::{MaybeSession, Session};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
