use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{DailyLogStore, StoreResult, UserStore};
use crate::models::daily_log::{DailyLog, DailyLogUpdate};
use crate::models::user::{ProfileChanges, UserProfile};
use crate::services::merge::merge_daily_log;

/// In-process store for single-instance runs and tests. The daily-log map is
/// locked for the whole read-merge-write.
#[derive(Clone, Default)]
pub struct MemoryStore {
    logs: Arc<Mutex<HashMap<(Uuid, NaiveDate), DailyLog>>>,
    users: Arc<Mutex<HashMap<Uuid, UserProfile>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DailyLogStore for MemoryStore {
    async fn find_today(&self, user_id: Uuid, today: NaiveDate) -> StoreResult<Option<DailyLog>> {
        let logs = self.logs.lock().await;
        Ok(logs.get(&(user_id, today)).cloned())
    }

    async fn upsert_today(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        update: &DailyLogUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<DailyLog> {
        let mut logs = self.logs.lock().await;
        let merged = merge_daily_log(user_id, today, update, logs.get(&(user_id, today)), now)?;
        logs.insert((user_id, today), merged.clone());
        Ok(merged)
    }

    async fn list_range(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<DailyLog>> {
        let logs = self.logs.lock().await;
        let mut found: Vec<DailyLog> = logs
            .values()
            .filter(|log| log.user_id == user_id && log.date >= start && log.date <= end)
            .cloned()
            .collect();
        found.sort_by_key(|log| log.date);
        Ok(found)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let users = self.users.lock().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn save_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> StoreResult<UserProfile> {
        let mut users = self.users.lock().await;
        let profile = changes.apply(user_id, users.remove(&user_id), now);
        users.insert(user_id, profile.clone());
        Ok(profile)
    }
}
