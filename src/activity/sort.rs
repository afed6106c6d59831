use super::record::ActivityRecord;

/// Orders activity records most recent first.
pub struct ActivitySorter;

impl ActivitySorter {
    /// Stable: records sharing an `activityTime` keep their fetch order.
    pub fn sort(mut records: Vec<ActivityRecord>) -> Vec<ActivityRecord> {
        records.sort_by(|a, b| b.activity_time.cmp(&a.activity_time));
        records
    }
}
