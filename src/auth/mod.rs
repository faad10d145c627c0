use axum::Router;

use crate::state::AppState;

pub mod bootstrap;
pub mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod repo;

pub fn router() -> Router<AppState> {
    handlers::router()
}
