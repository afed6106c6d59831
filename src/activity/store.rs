use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::record::ActivityRecord;
use crate::filter::{QueryParams, TypeOption, UserOption};
use crate::view::{ActivityService, FetchError};

/// On-disk layout of an activity data file.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityData {
    #[serde(default)]
    pub activities: Vec<Value>,
    #[serde(default)]
    pub users: Vec<UserOption>,
    #[serde(default)]
    pub types: Vec<TypeOption>,
}

#[derive(Debug, Default)]
struct Contents {
    activities: Vec<ActivityRecord>,
    users: Vec<UserOption>,
    types: Vec<TypeOption>,
    // Set once any data file has been applied, even an empty one
    loaded: bool,
}

/// In-memory activity source, optionally backed by a JSON data file.
#[derive(Debug, Clone, Default)]
pub struct ActivityStore {
    contents: Arc<RwLock<Contents>>,
    source: Option<PathBuf>,
    load_error: Arc<RwLock<Option<String>>>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bound to `path`. A failed first load leaves the store empty and
    /// every fetch failing until a reload succeeds.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self {
            source: Some(path.into()),
            ..Self::default()
        };
        if let Err(e) = store.reload().await {
            tracing::error!("Failed to load activity data: {e:#}");
        }
        store
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Re-read the backing file, replacing all contents on success.
    pub async fn reload(&self) -> Result<usize> {
        let Some(path) = self.source.as_ref() else {
            return Ok(self.count().await);
        };

        let parsed = async {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let data: ActivityData = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            anyhow::Ok(data)
        }
        .await;

        match parsed {
            Ok(data) => {
                let count = self.replace(data).await;
                *self.load_error.write().await = None;
                tracing::info!("Loaded {count} activity records from {}", path.display());
                Ok(count)
            }
            Err(e) => {
                // A failed reload keeps whatever was loaded before
                if !self.contents.read().await.loaded {
                    *self.load_error.write().await = Some(format!("{e:#}"));
                }
                Err(e)
            }
        }
    }

    pub async fn replace(&self, data: ActivityData) -> usize {
        let activities = ActivityRecord::normalize(data.activities);
        let count = activities.len();
        *self.contents.write().await = Contents {
            activities,
            users: data.users,
            types: data.types,
            loaded: true,
        };
        count
    }

    pub async fn add_activity(&self, record: ActivityRecord) {
        self.contents.write().await.activities.push(record);
    }

    pub async fn count(&self) -> usize {
        self.contents.read().await.activities.len()
    }

    /// Records matching `query`; empty dimensions do not constrain, bounds are inclusive.
    pub async fn query(&self, query: &QueryParams) -> Vec<ActivityRecord> {
        let from = query.from.instant().map(|t| t.timestamp_millis());
        let to = query.to.instant().map(|t| t.timestamp_millis());

        let contents = self.contents.read().await;
        contents
            .activities
            .iter()
            .filter(|record| {
                if !query.user_ids.is_empty()
                    && !record
                        .user_id()
                        .is_some_and(|id| query.user_ids.contains(&id))
                {
                    return false;
                }
                if !query.types.is_empty()
                    && !record
                        .activity_type()
                        .is_some_and(|t| query.types.iter().any(|name| name == t))
                {
                    return false;
                }
                if let Some(from) = from
                    && record.activity_time < from
                {
                    return false;
                }
                if let Some(to) = to
                    && record.activity_time > to
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect()
    }

    async fn ensure_loaded(&self) -> Result<(), FetchError> {
        match self.load_error.read().await.as_ref() {
            Some(e) => Err(FetchError::Unavailable(e.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ActivityService for ActivityStore {
    async fn fetch_activities(&self) -> Result<Vec<ActivityRecord>, FetchError> {
        self.ensure_loaded().await?;
        Ok(self.contents.read().await.activities.clone())
    }

    async fn fetch_filtered_activities(
        &self,
        query: &QueryParams,
    ) -> Result<Vec<ActivityRecord>, FetchError> {
        self.ensure_loaded().await?;
        Ok(self.query(query).await)
    }

    async fn fetch_user_catalog(&self) -> Result<Vec<UserOption>, FetchError> {
        self.ensure_loaded().await?;
        Ok(self.contents.read().await.users.clone())
    }

    async fn fetch_type_catalog(&self) -> Result<Vec<TypeOption>, FetchError> {
        self.ensure_loaded().await?;
        Ok(self.contents.read().await.types.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DateBound;
    use crate::types::UserId;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(time: i64, user_id: u64, activity_type: &str) -> ActivityRecord {
        ActivityRecord::new(time)
            .with_field("userId", user_id)
            .with_field("activityType", activity_type)
    }

    async fn seeded() -> ActivityStore {
        let store = ActivityStore::new();
        store.add_activity(record(1_000, 1, "LOGIN")).await;
        store.add_activity(record(2_000, 2, "LOGIN")).await;
        store.add_activity(record(3_000, 1, "CREATE_FLOW")).await;
        store.add_activity(record(4_000, 3, "LOGOUT")).await;
        store
    }

    fn times(records: &[ActivityRecord]) -> Vec<i64> {
        records.iter().map(|r| r.activity_time).collect()
    }

    #[tokio::test]
    async fn test_empty_query_matches_everything() {
        let store = seeded().await;
        let all = store.query(&QueryParams::default()).await;
        assert_eq!(times(&all), vec![1_000, 2_000, 3_000, 4_000]);
    }

    #[tokio::test]
    async fn test_query_by_users_and_types() {
        let store = seeded().await;

        let query = QueryParams {
            user_ids: vec![UserId(1)],
            ..QueryParams::default()
        };
        assert_eq!(times(&store.query(&query).await), vec![1_000, 3_000]);

        let query = QueryParams {
            user_ids: vec![UserId(1), UserId(2)],
            types: vec!["LOGIN".to_string()],
            ..QueryParams::default()
        };
        assert_eq!(times(&store.query(&query).await), vec![1_000, 2_000]);
    }

    #[tokio::test]
    async fn test_query_bounds_are_inclusive() {
        let store = seeded().await;
        let at = |millis| DateBound::at(chrono::DateTime::from_timestamp_millis(millis).unwrap());

        // 0 and 120_000 ms are whole minutes, so truncation does not move them
        let query = QueryParams {
            from: at(0),
            to: at(120_000),
            ..QueryParams::default()
        };
        assert_eq!(store.query(&query).await.len(), 4);

        let store = ActivityStore::new();
        store.add_activity(record(60_000, 1, "LOGIN")).await;
        store.add_activity(record(60_001, 1, "LOGIN")).await;
        let query = QueryParams {
            to: at(60_000),
            ..QueryParams::default()
        };
        assert_eq!(times(&store.query(&query).await), vec![60_000]);
    }

    #[tokio::test]
    async fn test_replace_normalizes_records() {
        let store = ActivityStore::new();
        let data: ActivityData = serde_json::from_value(json!({
            "activities": [
                {"activityTime": 10, "activityType": "LOGIN"},
                {"activityTime": "soon"}
            ],
            "users": [{"user_id": 1, "user_name": "admin"}],
            "types": [{"name": "LOGIN"}]
        }))
        .unwrap();

        assert_eq!(store.replace(data).await, 1);
        assert_eq!(store.fetch_user_catalog().await.unwrap().len(), 1);
        assert_eq!(store.fetch_type_catalog().await.unwrap()[0].name, "LOGIN");
    }

    fn write_data(path: &Path, data: serde_json::Value) {
        std::fs::write(path, data.to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_reload_replaces_contents_wholesale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("activity.json");
        write_data(
            &path,
            json!({
                "activities": [{"activityTime": 1, "userId": 1}, {"activityTime": 2, "userId": 1}],
                "users": [{"user_id": 1, "user_name": "admin"}],
                "types": [{"name": "LOGIN"}]
            }),
        );

        let store = ActivityStore::open(&path).await;
        assert_eq!(store.source(), Some(path.as_path()));
        assert_eq!(times(&store.fetch_activities().await.unwrap()), vec![1, 2]);

        write_data(
            &path,
            json!({
                "activities": [{"activityTime": 7, "userId": 2}],
                "users": [{"user_id": 2, "user_name": "bob"}]
            }),
        );
        assert_eq!(store.reload().await.unwrap(), 1);
        assert_eq!(times(&store.fetch_activities().await.unwrap()), vec![7]);
        assert_eq!(
            store.fetch_user_catalog().await.unwrap(),
            vec![UserOption::new(2, "bob")]
        );
        assert!(store.fetch_type_catalog().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_prior_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("activity.json");
        write_data(
            &path,
            json!({
                "activities": [{"activityTime": 5}],
                "users": [{"user_id": 1, "user_name": "admin"}],
                "types": [{"name": "LOGIN"}]
            }),
        );
        let store = ActivityStore::open(&path).await;

        std::fs::write(&path, "{ not json").unwrap();
        assert!(store.reload().await.is_err());

        assert_eq!(times(&store.fetch_activities().await.unwrap()), vec![5]);
        assert_eq!(store.fetch_user_catalog().await.unwrap().len(), 1);
        assert_eq!(store.fetch_type_catalog().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_catalogs_without_activities() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("activity.json");
        write_data(
            &path,
            json!({
                "activities": [],
                "users": [{"user_id": 1, "user_name": "admin"}],
                "types": [{"name": "LOGIN"}]
            }),
        );
        let store = ActivityStore::open(&path).await;
        assert_eq!(store.count().await, 0);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(store.reload().await.is_err());

        assert!(store.fetch_activities().await.unwrap().is_empty());
        assert_eq!(
            store.fetch_user_catalog().await.unwrap(),
            vec![UserOption::new(1, "admin")]
        );
        assert_eq!(store.fetch_type_catalog().await.unwrap()[0].name, "LOGIN");
    }

    #[tokio::test]
    async fn test_missing_file_makes_fetches_fail() {
        let store = ActivityStore::open("/nonexistent/activity-view/data.json").await;
        assert!(matches!(
            store.fetch_activities().await,
            Err(FetchError::Unavailable(_))
        ));
        assert!(store.reload().await.is_err());
    }
}
