use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::error::FetchError;
use crate::activity::ActivityRecord;
use crate::filter::{QueryParams, TypeOption, UserOption};

/// Source of activity records and dropdown catalogs.
#[async_trait]
pub trait ActivityService: Send + Sync {
    async fn fetch_activities(&self) -> Result<Vec<ActivityRecord>, FetchError>;

    async fn fetch_filtered_activities(
        &self,
        query: &QueryParams,
    ) -> Result<Vec<ActivityRecord>, FetchError>;

    async fn fetch_user_catalog(&self) -> Result<Vec<UserOption>, FetchError>;

    async fn fetch_type_catalog(&self) -> Result<Vec<TypeOption>, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Error,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Info => write!(f, "info"),
            NoticeKind::Error => write!(f, "error"),
        }
    }
}

/// Fire-and-forget user notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

pub trait BusyIndicator: Send + Sync {
    fn show(&self, message: &str);
    fn hide(&self);
}

pub trait PermissionGate: Send + Sync {
    fn has_permission(&self, feature_key: &str) -> bool;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Keeps the busy indicator shown for as long as it is alive.
pub struct BusyGuard {
    indicator: Arc<dyn BusyIndicator>,
}

impl BusyGuard {
    pub fn acquire(indicator: Arc<dyn BusyIndicator>, message: &str) -> Self {
        indicator.show(message);
        Self { indicator }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.hide();
    }
}

/// Every collaborator the view needs besides the permission gate.
#[derive(Clone)]
pub struct Collaborators {
    pub service: Arc<dyn ActivityService>,
    pub notifier: Arc<dyn Notifier>,
    pub busy: Arc<dyn BusyIndicator>,
    pub clock: Arc<dyn Clock>,
}
