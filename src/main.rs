use std::sync::Arc;
use std::time::Duration;

use healthtrack_api::auth::rate_limit::{spawn_cleanup_worker, RateLimitState};
use healthtrack_api::config::Config;
use healthtrack_api::db::{self, PgStore};
use healthtrack_api::services::diet_plan::LlmDietPlanner;
use healthtrack_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "healthtrack_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let pool = db::create_pool(&config.database_url).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let store = Arc::new(PgStore::new(pool));
    let planner = Arc::new(LlmDietPlanner::from_config(&config)?);
    if config.llm_api_key.is_empty() {
        tracing::warn!("LLM_API_KEY not set, diet plans will use the built-in fallback");
    }

    let rate_limiter = RateLimitState::new();
    spawn_cleanup_worker(
        rate_limiter.clone(),
        Duration::from_secs(config.diet_rate_limit_window_secs.max(1) * 2),
    );

    let state = AppState {
        logs: store.clone(),
        users: store,
        planner,
        config: config.clone(),
        rate_limiter,
    };

    let app = router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
