//! Daily score: a 0–100 composite of steps, water, diet adherence and the
//! user-declared completion flag. Each category is capped at its weight
//! before summing.

use serde::Serialize;

pub const STEPS_TARGET: f64 = 10_000.0;
pub const STEPS_MAX_POINTS: f64 = 30.0;

/// Liters.
pub const WATER_TARGET: f64 = 2.5;
pub const WATER_MAX_POINTS: f64 = 20.0;

pub const DIET_MAX_POINTS: f64 = 30.0;
pub const COMPLETION_POINTS: f64 = 20.0;

/// The four tracked inputs the score is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub steps: i64,
    pub water_intake: f64,
    pub diet_score: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub steps_points: f64,
    pub water_points: f64,
    pub diet_points: f64,
    pub completion_points: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        let sum = self.steps_points + self.water_points + self.diet_points + self.completion_points;
        sum.round().clamp(0.0, 100.0) as i32
    }
}

pub fn steps_points(steps: i64) -> f64 {
    (steps.max(0) as f64 / STEPS_TARGET * STEPS_MAX_POINTS).min(STEPS_MAX_POINTS)
}

pub fn water_points(water_intake: f64) -> f64 {
    if !water_intake.is_finite() || water_intake <= 0.0 {
        return 0.0;
    }
    (water_intake / WATER_TARGET * WATER_MAX_POINTS).min(WATER_MAX_POINTS)
}

/// Diet points are the checklist score itself, held to [0, 30].
pub fn diet_points(diet_score: f64) -> f64 {
    if !diet_score.is_finite() {
        return 0.0;
    }
    diet_score.clamp(0.0, DIET_MAX_POINTS)
}

pub fn completion_points(completed: bool) -> f64 {
    if completed {
        COMPLETION_POINTS
    } else {
        0.0
    }
}

pub fn breakdown(inputs: &ScoreInputs) -> ScoreBreakdown {
    ScoreBreakdown {
        steps_points: steps_points(inputs.steps),
        water_points: water_points(inputs.water_intake),
        diet_points: diet_points(inputs.diet_score),
        completion_points: completion_points(inputs.completed),
    }
}

/// Compute the rounded daily score in [0, 100].
pub fn compute_score(inputs: &ScoreInputs) -> i32 {
    breakdown(inputs).total()
}
