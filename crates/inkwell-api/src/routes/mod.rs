//! Route modules and the assembled router.

use axum::Router;

use crate::state::AppState;

pub mod game;
pub mod generate;
pub mod health;

/// The full application router, without transport layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/game", game::router())
        .nest("/api/v1/generate", generate::router())
        .with_state(state)
}
