use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::daily_log::{local_today, DailyLog, DailyLogQuery, DailyLogUpdate};
use crate::services::merge::merge_daily_log;
use crate::services::scoring::{breakdown, ScoreBreakdown, ScoreInputs};
use crate::AppState;

/// How far back the log listing reaches when no start date is given.
const DEFAULT_LIST_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogResponse {
    #[serde(flatten)]
    pub log: DailyLog,
    pub breakdown: ScoreBreakdown,
    /// False when no record exists yet for the day.
    pub persisted: bool,
}

impl DailyLogResponse {
    fn new(log: DailyLog, persisted: bool) -> Self {
        let breakdown = breakdown(&ScoreInputs {
            steps: log.steps,
            water_intake: log.water_intake,
            diet_score: log.diet_score,
            completed: log.completed,
        });
        Self {
            log,
            breakdown,
            persisted,
        }
    }
}

/// POST /api/daily-log: merge a partial update into today's record.
pub async fn upsert_daily_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<DailyLogUpdate>,
) -> AppResult<Json<DailyLogResponse>> {
    body.validate()?;

    let today = local_today();
    let log = state
        .logs
        .upsert_today(auth_user.id, today, &body, Utc::now())
        .await?;

    tracing::info!(
        user_id = %auth_user.id,
        date = %today,
        score = log.score,
        "Daily log upserted"
    );

    Ok(Json(DailyLogResponse::new(log, true)))
}

/// GET /api/daily-log/today: the stored record, or the zero record if the
/// day has no writes yet. Reading never creates a row.
pub async fn get_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<DailyLogResponse>> {
    let today = local_today();
    let response = match state.logs.find_today(auth_user.id, today).await? {
        Some(log) => DailyLogResponse::new(log, true),
        None => {
            let empty = merge_daily_log(
                auth_user.id,
                today,
                &DailyLogUpdate::default(),
                None,
                Utc::now(),
            )?;
            DailyLogResponse::new(empty, false)
        }
    };

    Ok(Json(response))
}

/// GET /api/daily-logs?startDate&endDate
pub async fn list_daily_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DailyLogQuery>,
) -> AppResult<Json<Vec<DailyLog>>> {
    let end = query.end_date.unwrap_or_else(local_today);
    let start = match query.start_date {
        Some(start) => start,
        None => end
            .checked_sub_signed(Duration::days(DEFAULT_LIST_DAYS))
            .ok_or_else(|| AppError::Validation("endDate is out of range".into()))?,
    };

    if start > end {
        return Err(AppError::Validation(
            "startDate must not be after endDate".into(),
        ));
    }

    let logs = state.logs.list_range(auth_user.id, start, end).await?;
    Ok(Json(logs))
}
