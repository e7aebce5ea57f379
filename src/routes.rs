// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assessment, auth, metrics, profile, results},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public: auth.
/// * Bearer-protected: assessment flow, telemetry, results, profile.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let assessment_routes = Router::new()
        .route("/", get(assessment::current))
        .route("/next", post(assessment::next))
        .route("/prev", post(assessment::prev))
        .route("/{id}/results", get(assessment::results));

    let results_routes = Router::new()
        .route("/options", get(results::options))
        .route("/timeline", get(results::timeline))
        .route("/correlation", get(results::correlation));

    let profile_routes = Router::new()
        .route("/", get(profile::get_me))
        .route("/notifications", put(profile::update_notifications));

    let protected = Router::new()
        .nest("/api/assessment", assessment_routes)
        .route("/api/metrics", post(metrics::save_metrics))
        .nest("/api/results", results_routes)
        .nest("/api/profile", profile_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(protected)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
