use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::daily_log::{local_today, DailyLog, DailyLogUpdate, DietPlan};
use crate::services::checklist::{checklist_for, diet_score, Checklist};
use crate::services::diet_plan::{generate_with_fallback, PlanSource};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDietResponse {
    pub diet_plan: DietPlan,
    pub source: PlanSource,
    pub daily_log: DailyLog,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistResponse {
    pub checklist: Option<Checklist>,
    pub diet_score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistRequest {
    #[serde(default)]
    pub checked_items: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSubmitResponse {
    pub checked: usize,
    pub total: usize,
    pub daily_log: DailyLog,
}

/// POST /api/diet/generate: build a plan from the profile and store it on
/// today's log.
pub async fn generate_diet_plan(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<GenerateDietResponse>> {
    let profile = state
        .users
        .find_user(auth_user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if !profile.is_ready_for_diet_plan() {
        return Err(AppError::BadRequest("Incomplete user profile".into()));
    }

    let generated = generate_with_fallback(state.planner.as_ref(), &profile).await;

    let update = DailyLogUpdate {
        diet_plan: Some(generated.plan.clone()),
        ..Default::default()
    };
    let daily_log = state
        .logs
        .upsert_today(auth_user.id, local_today(), &update, Utc::now())
        .await?;

    tracing::info!(user_id = %auth_user.id, source = ?generated.source, "Diet plan generated");

    Ok(Json(GenerateDietResponse {
        diet_plan: generated.plan,
        source: generated.source,
        daily_log,
    }))
}

/// GET /api/diet/checklist: today's plan as tickable items.
pub async fn get_checklist(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ChecklistResponse>> {
    let log = state.logs.find_today(auth_user.id, local_today()).await?;

    let response = match log {
        Some(log) => ChecklistResponse {
            checklist: log.diet_plan.as_ref().map(checklist_for),
            diet_score: log.diet_score,
        },
        None => ChecklistResponse {
            checklist: None,
            diet_score: 0.0,
        },
    };

    Ok(Json(response))
}

/// POST /api/diet/checklist: derive the diet score from ticked items and
/// merge it into today's log.
pub async fn submit_checklist(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<ChecklistRequest>,
) -> AppResult<Json<ChecklistSubmitResponse>> {
    let today = local_today();
    let plan = state
        .logs
        .find_today(auth_user.id, today)
        .await?
        .and_then(|log| log.diet_plan)
        .ok_or(AppError::NotFound("No diet plan for today".into()))?;

    let checklist = checklist_for(&plan);
    let checked = checklist.count_checked(body.checked_items.iter().map(String::as_str));
    let total = checklist.total_items;

    let update = DailyLogUpdate {
        diet_score: Some(diet_score(checked, total)),
        ..Default::default()
    };
    let daily_log = state
        .logs
        .upsert_today(auth_user.id, today, &update, Utc::now())
        .await?;

    Ok(Json(ChecklistSubmitResponse {
        checked,
        total,
        daily_log,
    }))
}
