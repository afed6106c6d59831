use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::collaborators::{BusyIndicator, NoticeKind, Notifier, PermissionGate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: usize,
    pub timestamp: DateTime<Utc>,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug)]
struct NoticeBuffer {
    entries: VecDeque<Notice>,
    next_id: usize,
}

/// Bounded, newest-last record of raised notifications.
#[derive(Debug)]
pub struct NoticeLog {
    buffer: Mutex<NoticeBuffer>,
    max_entries: usize,
}

const DEFAULT_MAX_NOTICES: usize = 100;

impl NoticeLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            buffer: Mutex::new(NoticeBuffer {
                entries: VecDeque::new(),
                next_id: 1,
            }),
            max_entries: max_entries.max(1),
        }
    }

    /// Most recent first
    pub fn recent(&self, limit: Option<usize>) -> Vec<Notice> {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let iter = buffer.entries.iter().rev().cloned();
        match limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn clear(&self) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.entries.clear();
        buffer.next_id = 1;
    }
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NOTICES)
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, kind: NoticeKind, message: &str) {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let id = buffer.next_id;
        buffer.next_id += 1;

        buffer.entries.push_back(Notice {
            id,
            timestamp: Utc::now(),
            kind,
            message: message.to_string(),
        });
        if buffer.entries.len() > self.max_entries {
            let remove_count = buffer.entries.len() - self.max_entries;
            buffer.entries.drain(..remove_count);
        }

        match kind {
            NoticeKind::Info => tracing::info!("Notice #{id}: {message}"),
            NoticeKind::Error => tracing::error!("Notice #{id}: {message}"),
        }
    }
}

/// Busy indicator that tracks nesting depth.
#[derive(Debug, Default)]
pub struct BusyCounter {
    depth: AtomicUsize,
    shown: AtomicUsize,
}

impl BusyCounter {
    pub fn is_busy(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    /// Number of times the indicator has been shown
    pub fn shown(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }
}

impl BusyIndicator for BusyCounter {
    fn show(&self, message: &str) {
        self.shown.fetch_add(1, Ordering::SeqCst);
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Busy ({depth}): {message}");
    }

    fn hide(&self) {
        let _ = self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| d.checked_sub(1));
        tracing::debug!("Busy released ({})", self.depth.load(Ordering::SeqCst));
    }
}

/// Fixed set of feature keys granted to the operator.
#[derive(Debug, Clone, Default)]
pub struct FeatureGrants {
    features: HashSet<String>,
}

impl FeatureGrants {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }
}

impl PermissionGate for FeatureGrants {
    fn has_permission(&self, feature_key: &str) -> bool {
        self.features.contains(feature_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_log_trims_oldest() {
        let log = NoticeLog::new(3);
        for i in 0..5 {
            log.notify(NoticeKind::Info, &format!("message {i}"));
        }

        let recent = log.recent(None);
        assert_eq!(log.count(), 3);
        assert_eq!(recent[0].message, "message 4");
        assert_eq!(recent[2].message, "message 2");
        assert_eq!(recent[0].id, 5);

        assert_eq!(log.recent(Some(1)).len(), 1);
        log.clear();
        assert_eq!(log.count(), 0);
    }

    #[test]
    fn test_busy_counter_never_underflows() {
        let busy = BusyCounter::default();
        busy.hide();
        assert!(!busy.is_busy());

        busy.show("a");
        busy.show("b");
        busy.hide();
        assert!(busy.is_busy());
        busy.hide();
        assert!(!busy.is_busy());
        assert_eq!(busy.shown(), 2);
    }

    #[test]
    fn test_feature_grants() {
        let grants = FeatureGrants::new(["menu_user_activity"]);
        assert!(grants.has_permission("menu_user_activity"));
        assert!(!grants.has_permission("menu_flows"));
    }
}
