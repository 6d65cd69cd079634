pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put, delete},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
    web,
};
use state::AppState;

/// Files per authoring request the body limit leaves room for.
const MAX_FILES_PER_NOTICE: usize = 8;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, settings.clone());

    let api = Router::new()
        // Health and info endpoints
        .route("/health", get(handlers::root::health_check))
        .route("/api", get(handlers::root::api_info))

        .nest("/auth", auth_routes(app_state.clone()))
        .nest("/api", api_routes(app_state.clone(), &settings))
        .nest("/admin", admin_routes(app_state.clone()))

        .with_state(app_state.clone());

    let mut app = api.merge(web::create_web_routes(app_state));

    let mount = settings.storage.public_base_url.trim_end_matches('/');
    if mount.starts_with('/') && mount.len() > 1 {
        app = app.nest_service(mount, ServeDir::new(&settings.storage.root));
    }

    app
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::auth::me))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
}

fn api_routes(state: AppState, settings: &Settings) -> Router<AppState> {
    Router::new()
        .merge(public_notice_routes(state.clone()))
        .merge(member_routes(state.clone()))
        .merge(staff_routes(state.clone(), settings))
        .nest("/approvals", approval_routes(state))
}

fn public_notice_routes(state: AppState) -> Router<AppState> {
    // Anyone may read; a session, when present, widens what `get` returns.
    Router::new()
        .route("/notices", get(handlers::notices::list))
        .route("/notices/:id", get(handlers::notices::get))
        .route("/notices/:id/comments", get(handlers::engagement::list_comments))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::optional_auth,
        ))
}

fn member_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/notices/:id", delete(handlers::notices::delete))
        .route("/notices/:id/like", post(handlers::engagement::toggle_like))
        .route("/notices/:id/bookmark", post(handlers::engagement::toggle_bookmark))
        .route("/notices/:id/comments", post(handlers::engagement::create_comment))
        .route("/bookmarks", get(handlers::engagement::bookmarks))
        .route("/comments/:id", delete(handlers::engagement::delete_comment))
        .route("/notifications", get(handlers::notifications::list))
        .route("/notifications/:id/read", post(handlers::notifications::mark_read))
        .route("/subscriptions", get(handlers::notifications::list_subscriptions))
        .route("/subscriptions", post(handlers::notifications::subscribe))
        .route("/subscriptions/:id", delete(handlers::notifications::unsubscribe))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn staff_routes(state: AppState, settings: &Settings) -> Router<AppState> {
    let body_limit = settings
        .storage
        .max_file_size_bytes
        .saturating_mul(MAX_FILES_PER_NOTICE);

    Router::new()
        .route(
            "/notices",
            post(handlers::notices::create).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/notices/mine", get(handlers::notices::mine))
        .route("/notices/mine/stats", get(handlers::notices::my_stats))
        .route("/notices/:id/submit", post(handlers::notices::submit))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_staff,
        ))
}

fn approval_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/pending", get(handlers::approvals::pending))
        .route("/:id/approve", post(handlers::approvals::approve))
        .route("/:id/reject", post(handlers::approvals::reject))
        .route("/:id/history", get(handlers::approvals::history))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_staff,
        ))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::admin::stats))
        .route("/audit-log", get(handlers::admin::audit_log))
        .route("/expired-check", post(handlers::admin::check_expired))
        .route("/departments", get(handlers::admin::list_departments))
        .route("/departments", post(handlers::admin::create_department))
        .route("/departments/:id", put(handlers::admin::update_department))
        .route("/departments/:id", delete(handlers::admin::delete_department))
        .route("/users", get(handlers::admin::list_users))
        .route("/users", post(handlers::admin::create_user))
        .route("/users/:id", get(handlers::admin::get_user))
        .route("/users/:id", put(handlers::admin::update_user))
        .route("/users/:id", delete(handlers::admin::delete_user))
        .route("/users/:id/role", put(handlers::admin::update_user_role))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
