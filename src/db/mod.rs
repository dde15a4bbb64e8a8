//! Persistence collaborators. Handlers only see the traits; `main` picks the
//! PostgreSQL implementation and tests use the in-memory one.

mod memory;
mod pool;
mod postgres;

pub use memory::MemoryStore;
pub use pool::create_pool;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::daily_log::{DailyLog, DailyLogUpdate};
use crate::models::user::{ProfileChanges, UserProfile};
use crate::services::merge::MergeError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Daily log for {date} kept changing under concurrent writers")]
    Contention { date: NaiveDate },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Daily logs keyed by (user, calendar day).
#[async_trait]
pub trait DailyLogStore: Send + Sync {
    async fn find_today(&self, user_id: Uuid, today: NaiveDate) -> StoreResult<Option<DailyLog>>;

    /// Fetch, merge and write the day's record as one atomic step.
    async fn upsert_today(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        update: &DailyLogUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<DailyLog>;

    /// Inclusive range, oldest first.
    async fn list_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<DailyLog>>;

    async fn ping(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Create the profile if missing, otherwise apply the changes.
    async fn save_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<UserProfile>;
}
