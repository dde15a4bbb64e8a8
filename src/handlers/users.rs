use axum::{extract::State, Extension, Json};
use chrono::Utc;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::models::user::{OnboardingRequest, ProfileChanges, UpdateProfileRequest, UserProfile};
use crate::AppState;

/// GET /api/user
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = state
        .users
        .find_user(auth_user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user))
}

/// POST /api/user/onboarding: body metrics and goal; creates the profile on
/// first call and overwrites them afterwards.
pub async fn onboarding(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<OnboardingRequest>,
) -> AppResult<Json<UserProfile>> {
    body.validate()?;

    let mut changes = ProfileChanges::from(body);
    // Fall back to the identity provider's email
    changes.email = changes.email.or(auth_user.email.clone());

    let user = state
        .users
        .save_profile(auth_user.id, changes, Utc::now())
        .await?;

    tracing::info!(user_id = %auth_user.id, "User onboarded");
    Ok(Json(user))
}

/// PUT /api/user/profile: partial update of an existing profile.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<UserProfile>> {
    body.validate()?;

    if state.users.find_user(auth_user.id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let user = state
        .users
        .save_profile(auth_user.id, body.into(), Utc::now())
        .await?;

    Ok(Json(user))
}
