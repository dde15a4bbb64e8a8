//! Reconciles a partial daily-log update with the record already stored for
//! the day and recomputes the score.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::daily_log::{DailyLog, DailyLogUpdate};
use crate::services::scoring::{compute_score, ScoreInputs, DIET_MAX_POINTS};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error("steps must be a non-negative integer, got {0}")]
    NegativeSteps(i64),

    #[error("waterIntake must be a finite, non-negative number of liters, got {0}")]
    InvalidWaterIntake(f64),

    #[error("dietScore must be a finite number between 0 and 30, got {0}")]
    InvalidDietScore(f64),

    #[error("existing log belongs to a different user or day")]
    KeyMismatch,
}

impl DailyLogUpdate {
    /// Reject malformed values instead of coercing them.
    pub fn validate(&self) -> Result<(), MergeError> {
        if let Some(steps) = self.steps {
            if steps < 0 {
                return Err(MergeError::NegativeSteps(steps));
            }
        }
        if let Some(water) = self.water_intake {
            if !water.is_finite() || water < 0.0 {
                return Err(MergeError::InvalidWaterIntake(water));
            }
        }
        if let Some(diet) = self.diet_score {
            if !diet.is_finite() || !(0.0..=DIET_MAX_POINTS).contains(&diet) {
                return Err(MergeError::InvalidDietScore(diet));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_none()
            && self.water_intake.is_none()
            && self.completed.is_none()
            && self.diet_plan.is_none()
            && self.diet_score.is_none()
    }
}

/// Produce the next record for `(user_id, date)`.
///
/// Each field resolves to the update's value, else the existing value, else
/// its zero value. The result depends only on the arguments, so replaying the
/// same update against the same snapshot yields the same record.
pub fn merge_daily_log(
    user_id: Uuid,
    date: NaiveDate,
    update: &DailyLogUpdate,
    existing: Option<&DailyLog>,
    now: DateTime<Utc>,
) -> Result<DailyLog, MergeError> {
    update.validate()?;

    if let Some(existing) = existing {
        if existing.user_id != user_id || existing.date != date {
            return Err(MergeError::KeyMismatch);
        }
    }

    let steps = update
        .steps
        .or(existing.map(|e| e.steps))
        .unwrap_or(0);
    let water_intake = update
        .water_intake
        .or(existing.map(|e| e.water_intake))
        .unwrap_or(0.0);
    let completed = update
        .completed
        .or(existing.map(|e| e.completed))
        .unwrap_or(false);
    let diet_score = update
        .diet_score
        .or(existing.map(|e| e.diet_score))
        .unwrap_or(0.0);
    let diet_plan = update
        .diet_plan
        .clone()
        .or_else(|| existing.and_then(|e| e.diet_plan.clone()));

    let score = compute_score(&ScoreInputs {
        steps,
        water_intake,
        diet_score,
        completed,
    });

    Ok(DailyLog {
        user_id,
        date,
        steps,
        water_intake,
        diet_score,
        completed,
        diet_plan,
        score,
        created_at: existing.map(|e| e.created_at).unwrap_or(now),
        updated_at: now,
    })
}
