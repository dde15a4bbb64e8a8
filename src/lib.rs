use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::{DailyLogStore, UserStore};
use services::diet_plan::DietPlanGenerator;

/// Shared handler state. Collaborators are built once in `main` and injected.
#[derive(Clone)]
pub struct AppState {
    pub logs: Arc<dyn DailyLogStore>,
    pub users: Arc<dyn UserStore>,
    pub planner: Arc<dyn DietPlanGenerator>,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    // LLM calls are rate limited per user
    let diet_generation = Router::new()
        .route("/api/diet/generate", post(handlers::diet::generate_diet_plan))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_diet,
        ));

    let protected_routes = Router::new()
        // Daily logs
        .route("/api/daily-log", post(handlers::daily_logs::upsert_daily_log))
        .route("/api/daily-log/today", get(handlers::daily_logs::get_today))
        .route("/api/daily-logs", get(handlers::daily_logs::list_daily_logs))
        .route("/api/progress", get(handlers::progress::get_progress))
        // Profile
        .route("/api/user", get(handlers::users::get_user))
        .route("/api/user/onboarding", post(handlers::users::onboarding))
        .route(
            "/api/user/profile",
            get(handlers::users::get_user).put(handlers::users::update_profile),
        )
        // Diet
        .route(
            "/api/diet/checklist",
            get(handlers::diet::get_checklist).post(handlers::diet::submit_checklist),
        )
        .merge(diet_generation)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config))
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<axum::http::HeaderValue> = Vec::new();
    match config.frontend_url.parse::<axum::http::HeaderValue>() {
        Ok(hv) => origins.push(hv),
        Err(_) => tracing::warn!(url = %config.frontend_url, "FRONTEND_URL is not a valid origin"),
    }
    // In dev, also allow LAN access (e.g. testing from another device)
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}
