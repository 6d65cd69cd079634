pub mod templates;
pub mod board;
pub mod dashboard;

use axum::{
    Router,
    routing::get,
    middleware,
};
use crate::api::{middleware::auth, state::AppState};

pub fn create_web_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(board::board_page))
        .route("/login", get(templates::auth::login_page))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::optional_auth,
        ))
        .nest("/portal", portal_routes(state.clone()))
        .with_state(state)
}

fn portal_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::dashboard_page))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_auth,
        ))
}
