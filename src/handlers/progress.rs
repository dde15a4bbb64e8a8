use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Duration;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::daily_log::{local_today, ProgressPoint, ProgressQuery, ProgressRange};
use crate::AppState;

/// GET /api/progress?range=7d|30d|90d: chart points, oldest first.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ProgressQuery>,
) -> AppResult<Json<Vec<ProgressPoint>>> {
    let range = ProgressRange::parse(query.range.as_deref());
    let end = local_today();
    let start = end - Duration::days(range.days());

    let logs = state.logs.list_range(auth_user.id, start, end).await?;
    Ok(Json(logs.iter().map(ProgressPoint::from).collect()))
}
