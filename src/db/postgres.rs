use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{DailyLogStore, StoreError, StoreResult, UserStore};
use crate::models::daily_log::{DailyLog, DailyLogRow, DailyLogUpdate, StoredDietPlan};
use crate::models::user::{ProfileChanges, UserProfile};
use crate::services::merge::merge_daily_log;

/// Locked read-merge-write attempts before a contended day is given up on.
const MAX_UPSERT_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn stored_plan(log: &DailyLog) -> Option<Json<StoredDietPlan>> {
    log.diet_plan.clone().map(|plan| Json(plan.into()))
}

async fn lock_day(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    date: NaiveDate,
) -> Result<Option<DailyLog>, sqlx::Error> {
    let row = sqlx::query_as::<_, DailyLogRow>(
        r#"
        SELECT * FROM daily_logs
        WHERE user_id = $1 AND log_date = $2
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(DailyLog::from))
}

#[async_trait]
impl DailyLogStore for PgStore {
    async fn find_today(&self, user_id: Uuid, today: NaiveDate) -> StoreResult<Option<DailyLog>> {
        let row = sqlx::query_as::<_, DailyLogRow>(
            "SELECT * FROM daily_logs WHERE user_id = $1 AND log_date = $2",
        )
        .bind(user_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DailyLog::from))
    }

    async fn upsert_today(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        update: &DailyLogUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<DailyLog> {
        let mut tx = self.pool.begin().await?;

        for attempt in 1..=MAX_UPSERT_ATTEMPTS {
            let existing = lock_day(&mut tx, user_id, today).await?;
            let merged = merge_daily_log(user_id, today, update, existing.as_ref(), now)?;

            let written = if existing.is_some() {
                let row = sqlx::query_as::<_, DailyLogRow>(
                    r#"
                    UPDATE daily_logs SET
                        steps = $3,
                        water_intake = $4,
                        diet_score = $5,
                        completed = $6,
                        diet_plan = $7,
                        score = $8,
                        updated_at = $9
                    WHERE user_id = $1 AND log_date = $2
                    RETURNING *
                    "#,
                )
                .bind(user_id)
                .bind(today)
                .bind(merged.steps)
                .bind(merged.water_intake)
                .bind(merged.diet_score)
                .bind(merged.completed)
                .bind(stored_plan(&merged))
                .bind(merged.score)
                .bind(merged.updated_at)
                .fetch_one(&mut *tx)
                .await?;
                Some(row)
            } else {
                // Another request may create the row between our SELECT and
                // INSERT; DO NOTHING leaves it to the next locked read.
                sqlx::query_as::<_, DailyLogRow>(
                    r#"
                    INSERT INTO daily_logs
                        (user_id, log_date, steps, water_intake, diet_score, completed,
                         diet_plan, score, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    ON CONFLICT (user_id, log_date) DO NOTHING
                    RETURNING *
                    "#,
                )
                .bind(user_id)
                .bind(today)
                .bind(merged.steps)
                .bind(merged.water_intake)
                .bind(merged.diet_score)
                .bind(merged.completed)
                .bind(stored_plan(&merged))
                .bind(merged.score)
                .bind(merged.created_at)
                .bind(merged.updated_at)
                .fetch_optional(&mut *tx)
                .await?
            };

            match written {
                Some(row) => {
                    tx.commit().await?;
                    return Ok(row.into());
                }
                None => {
                    tracing::debug!(
                        user_id = %user_id,
                        date = %today,
                        attempt,
                        "Daily log created concurrently, re-merging"
                    );
                }
            }
        }

        Err(StoreError::Contention { date: today })
    }

    async fn list_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<DailyLog>> {
        let rows = sqlx::query_as::<_, DailyLogRow>(
            r#"
            SELECT * FROM daily_logs
            WHERE user_id = $1 AND log_date BETWEEN $2 AND $3
            ORDER BY log_date ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DailyLog::from).collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let user = sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn save_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<UserProfile> {
        let user = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users
                (id, email, name, age, gender, height_cm, weight_kg, goal, created_at, updated_at)
            VALUES ($1, $2, COALESCE($3, 'Unknown'), $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (id) DO UPDATE SET
                email = COALESCE($2, users.email),
                name = COALESCE($3, users.name),
                age = COALESCE($4, users.age),
                gender = COALESCE($5, users.gender),
                height_cm = COALESCE($6, users.height_cm),
                weight_kg = COALESCE($7, users.weight_kg),
                goal = COALESCE($8, users.goal),
                updated_at = $9
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&changes.email)
        .bind(&changes.name)
        .bind(changes.age)
        .bind(&changes.gender)
        .bind(changes.height_cm)
        .bind(changes.weight_kg)
        .bind(&changes.goal)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
