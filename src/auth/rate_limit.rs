use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::AppState;

/// In-memory fixed-window limiter (single-instance deployments).
#[derive(Clone, Default)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns Ok(remaining) or Err(retry_after) once the window is used up.
    pub async fn check_with_limits(
        &self,
        key: &str,
        max_requests: u32,
        window_secs: u64,
    ) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(window_secs);

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.window_start));
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(max_requests - entry.count)
    }

    /// Drop entries whose window started more than `max_age` ago.
    pub async fn cleanup(&self, max_age: Duration) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.window_start) < max_age);
    }

    pub async fn entry_count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Periodically purge stale limiter entries.
pub fn spawn_cleanup_worker(limiter: RateLimitState, max_age: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(max_age);
        loop {
            interval.tick().await;
            limiter.cleanup(max_age).await;
            let entries = limiter.entry_count().await;
            tracing::debug!(entries, "Rate limiter cleanup ran");
        }
    });
}

/// Per-user limit on diet plan generation. Must run inside `require_auth`.
pub async fn rate_limit_diet(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.id)
        .ok_or(AppError::Unauthorized)?;
    let key = format!("diet:{}", user_id);

    match state
        .rate_limiter
        .check_with_limits(
            &key,
            state.config.diet_rate_limit_max,
            state.config.diet_rate_limit_window_secs,
        )
        .await
    {
        Ok(remaining) => {
            tracing::debug!(
                user_id = %user_id,
                remaining = remaining,
                "Diet rate limit check passed"
            );
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            let secs: u64 = retry_after.as_secs();
            tracing::warn!(
                user_id = %user_id,
                retry_after_secs = secs,
                "Diet generation rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}
