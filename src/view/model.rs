use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use super::collaborators::{
    ActivityService, BusyGuard, BusyIndicator, Clock, Collaborators, NoticeKind, Notifier,
    PermissionGate,
};
use super::error::{FetchError, ViewError};
use crate::activity::{ActivityRecord, ActivitySorter};
use crate::filter::{
    ActivityQueryBuilder, DateBound, Dimension, FilterFlags, FilterState, QueryParams, RangeError,
    TypeOption, TypeSelection, UserOption, UserSelection,
};
use crate::types::RequestSeq;

pub const FEATURE_KEY: &str = "menu_user_activity";
pub const HOME_ROUTE: &str = "/home";

const UNAUTHORISED: &str = "You are not authorised to access this page.";
const LOADING_USER_ACTIVITY: &str = "Loading user activity";
const NO_USER_ACTIVITY: &str = "No user activity found";
const NO_USER_DROPDOWN: &str = "No user dropdown data";
const NO_TYPE_DROPDOWN: &str = "No type dropdown data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPhase {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug)]
struct ActivityPane {
    phase: ViewPhase,
    records: Vec<ActivityRecord>,
}

/// Orchestrates filter editing and activity fetches for one view session.
///
/// Each fetch only ever touches its own piece of state, so the activity
/// list and the two catalogs may complete in any order.
pub struct ActivityViewModel {
    service: Arc<dyn ActivityService>,
    notifier: Arc<dyn Notifier>,
    busy: Arc<dyn BusyIndicator>,
    clock: Arc<dyn Clock>,
    fetch_timeout: Duration,
    filters: RwLock<FilterState>,
    pane: RwLock<ActivityPane>,
    user_catalog: RwLock<Vec<UserOption>>,
    type_catalog: RwLock<Vec<TypeOption>>,
    latest_seq: AtomicU64,
}

impl ActivityViewModel {
    /// Guarded entry point: the permission check runs before anything is fetched.
    pub fn enter(
        gate: &dyn PermissionGate,
        collaborators: Collaborators,
        fetch_timeout: Duration,
    ) -> Result<Self, ViewError> {
        if !gate.has_permission(FEATURE_KEY) {
            tracing::warn!("Access to user activity denied");
            collaborators.notifier.notify(NoticeKind::Error, UNAUTHORISED);
            return Err(ViewError::PermissionDenied {
                feature: FEATURE_KEY.to_string(),
                redirect_to: HOME_ROUTE,
            });
        }

        Ok(Self {
            service: collaborators.service,
            notifier: collaborators.notifier,
            busy: collaborators.busy,
            clock: collaborators.clock,
            fetch_timeout,
            filters: RwLock::new(FilterState::new()),
            pane: RwLock::new(ActivityPane {
                phase: ViewPhase::Uninitialized,
                records: Vec::new(),
            }),
            user_catalog: RwLock::new(Vec::new()),
            type_catalog: RwLock::new(Vec::new()),
            latest_seq: AtomicU64::new(0),
        })
    }

    /// Issue the unfiltered fetch and both catalog fetches concurrently.
    pub async fn initialize(&self) -> Result<usize, ViewError> {
        tracing::info!("Initializing user activity view");
        let (activities, _, _) = tokio::join!(
            self.load_activities(None),
            self.load_user_catalog(),
            self.load_type_catalog(),
        );
        activities
    }

    /// Fetch with the current filters, replacing the displayed records.
    pub async fn apply_filters(&self) -> Result<usize, ViewError> {
        let query = ActivityQueryBuilder::build(&*self.filters.read().await);
        self.load_activities(Some(query)).await
    }

    pub async fn set_start_date(&self, text: &str) -> Result<DateBound, ViewError> {
        let now = self.clock.now();
        let result = self.filters.write().await.set_start_date(text, now);
        self.report_validation(result)
    }

    pub async fn set_end_date(&self, text: &str) -> Result<DateBound, ViewError> {
        let result = self.filters.write().await.set_end_date(text);
        self.report_validation(result)
    }

    pub async fn set_end_to_now(&self) -> Result<DateBound, ViewError> {
        let now = self.clock.now();
        let result = self.filters.write().await.set_end_to_now(now);
        self.report_validation(result)
    }

    pub async fn apply_type_selection(&self, items: &[TypeOption]) -> TypeSelection {
        self.filters.write().await.apply_type_selection(items).clone()
    }

    pub async fn apply_user_selection(&self, items: &[UserOption]) -> UserSelection {
        self.filters.write().await.apply_user_selection(items).clone()
    }

    pub async fn remove_filter(&self, dimension: Dimension) -> FilterFlags {
        let mut filters = self.filters.write().await;
        filters.remove_dimension(dimension);
        filters.flags()
    }

    pub async fn filter_flags(&self) -> FilterFlags {
        self.filters.read().await.flags()
    }

    pub async fn filter_state(&self) -> FilterState {
        self.filters.read().await.clone()
    }

    pub async fn phase(&self) -> ViewPhase {
        self.pane.read().await.phase
    }

    pub async fn activities(&self) -> Vec<ActivityRecord> {
        self.pane.read().await.records.clone()
    }

    pub async fn user_catalog(&self) -> Vec<UserOption> {
        self.user_catalog.read().await.clone()
    }

    pub async fn type_catalog(&self) -> Vec<TypeOption> {
        self.type_catalog.read().await.clone()
    }

    /// Tear the session down: every filter dimension is reset.
    pub async fn close(&self) {
        self.filters.write().await.clear();
        tracing::info!("User activity view closed");
    }

    fn report_validation(
        &self,
        result: Result<DateBound, RangeError>,
    ) -> Result<DateBound, ViewError> {
        result.map_err(|e| {
            tracing::warn!("Rejected date filter: {e}");
            self.notifier.notify(NoticeKind::Error, &e.to_string());
            ViewError::Validation(e)
        })
    }

    fn issue_seq(&self) -> RequestSeq {
        RequestSeq(self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_latest(&self, seq: RequestSeq) -> bool {
        self.latest_seq.load(Ordering::SeqCst) == seq.inner()
    }

    async fn with_timeout<T>(
        &self,
        fetch: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .map_err(|_| FetchError::Timeout(self.fetch_timeout))?
    }

    async fn load_activities(&self, query: Option<QueryParams>) -> Result<usize, ViewError> {
        let seq = self.issue_seq();
        self.pane.write().await.phase = ViewPhase::Loading;
        let _busy = BusyGuard::acquire(self.busy.clone(), LOADING_USER_ACTIVITY);

        let result = match &query {
            None => {
                tracing::info!("Fetching user activity {seq}");
                self.with_timeout(self.service.fetch_activities()).await
            }
            Some(query) if query.is_unconstrained() => {
                tracing::info!("Fetching user activity {seq} with no filters active");
                self.with_timeout(self.service.fetch_filtered_activities(query))
                    .await
            }
            Some(query) => {
                tracing::info!("Fetching filtered user activity {seq}: {query:?}");
                self.with_timeout(self.service.fetch_filtered_activities(query))
                    .await
            }
        };

        match result {
            Ok(records) => {
                let records = ActivitySorter::sort(records);
                let count = records.len();
                let mut pane = self.pane.write().await;
                if self.is_latest(seq) {
                    pane.records = records;
                    pane.phase = ViewPhase::Ready;
                    tracing::info!("Fetch {seq} completed with {count} records");
                } else {
                    tracing::debug!("Discarding stale fetch {seq} ({count} records)");
                }
                Ok(count)
            }
            Err(e) => {
                tracing::error!("Fetch {seq} failed: {e}");
                if self.is_latest(seq) {
                    self.pane.write().await.phase = ViewPhase::Ready;
                }
                self.notifier.notify(NoticeKind::Error, NO_USER_ACTIVITY);
                Err(ViewError::Fetch(e))
            }
        }
    }

    async fn load_user_catalog(&self) {
        match self.with_timeout(self.service.fetch_user_catalog()).await {
            Ok(users) => {
                tracing::info!("Loaded {} users for the username dropdown", users.len());
                *self.user_catalog.write().await = users;
            }
            Err(e) => {
                tracing::error!("User catalog fetch failed: {e}");
                self.notifier.notify(NoticeKind::Error, NO_USER_DROPDOWN);
            }
        }
    }

    async fn load_type_catalog(&self) {
        match self.with_timeout(self.service.fetch_type_catalog()).await {
            Ok(types) => {
                tracing::info!("Loaded {} activity types for the type dropdown", types.len());
                *self.type_catalog.write().await = types;
            }
            Err(e) => {
                tracing::error!("Type catalog fetch failed: {e}");
                self.notifier.notify(NoticeKind::Error, NO_TYPE_DROPDOWN);
            }
        }
    }
}
