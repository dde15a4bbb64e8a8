use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// One record per user per calendar day. `score` is derived, never client-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub steps: i64,
    pub water_intake: f64,
    pub diet_score: f64,
    pub completed: bool,
    pub diet_plan: Option<DietPlan>,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A diet plan as exchanged with clients: a markdown string or a
/// structured object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DietPlan {
    Text(String),
    Structured(StructuredDietPlan),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredDietPlan {
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub water_intake: Option<f64>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub portions: Option<String>,
}

/// Partial update for today's log. Omitted and `null` fields are both absent;
/// unknown fields (including `score`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogUpdate {
    pub steps: Option<i64>,
    pub water_intake: Option<f64>,
    pub completed: Option<bool>,
    pub diet_plan: Option<DietPlan>,
    pub diet_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressRange {
    Week,
    Month,
    Quarter,
}

impl ProgressRange {
    /// Unknown or missing ranges fall back to a week.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("30d") => Self::Month,
            Some("90d") => Self::Quarter,
            _ => Self::Week,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub range: Option<String>,
}

/// One chart point of the progress history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub steps: i64,
    pub score: i32,
    pub water_intake: f64,
    pub completed: bool,
}

impl From<&DailyLog> for ProgressPoint {
    fn from(log: &DailyLog) -> Self {
        Self {
            date: log.date,
            steps: log.steps,
            score: log.score,
            water_intake: log.water_intake,
            completed: log.completed,
        }
    }
}

/// The calendar day "today" is bucketed into, in server-local time.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Persistence boundary
// ---------------------------------------------------------------------------

/// Diet plan as stored in the `daily_logs.diet_plan` JSONB column. The kind is
/// written explicitly so reads never have to guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum StoredDietPlan {
    Text(String),
    Structured(StructuredDietPlan),
}

impl From<DietPlan> for StoredDietPlan {
    fn from(plan: DietPlan) -> Self {
        match plan {
            DietPlan::Text(text) => Self::Text(text),
            DietPlan::Structured(plan) => Self::Structured(plan),
        }
    }
}

impl From<StoredDietPlan> for DietPlan {
    fn from(plan: StoredDietPlan) -> Self {
        match plan {
            StoredDietPlan::Text(text) => Self::Text(text),
            StoredDietPlan::Structured(plan) => Self::Structured(plan),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DailyLogRow {
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub steps: i64,
    pub water_intake: f64,
    pub diet_score: f64,
    pub completed: bool,
    pub diet_plan: Option<Json<StoredDietPlan>>,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DailyLogRow> for DailyLog {
    fn from(row: DailyLogRow) -> Self {
        Self {
            user_id: row.user_id,
            date: row.log_date,
            steps: row.steps,
            water_intake: row.water_intake,
            diet_score: row.diet_score,
            completed: row.completed,
            diet_plan: row.diet_plan.map(|Json(plan)| plan.into()),
            score: row.score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
