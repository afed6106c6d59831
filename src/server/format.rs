use chrono::Local;
use serde_json::{Map, Value};

use crate::activity::ActivityRecord;
use crate::filter::{DISPLAY_FORMAT, FilterState, TypeOption, UserOption};
use crate::view::Notice;

const SUMMARY_FIELDS: [&str; 3] = ["username", "activityType", "userId"];

// Remaining record fields as `key: value` pairs
fn format_fields(fields: &Map<String, Value>) -> String {
    fields
        .iter()
        .filter(|(k, _)| !SUMMARY_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| {
            let v_str = match v {
                Value::String(s) => format!("\"{s}\""),
                _ => v.to_string(),
            };
            format!("{k}: {v_str}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_activity(record: &ActivityRecord) -> String {
    let when = record
        .activity_at()
        .map(|t| t.with_timezone(&Local).format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| record.activity_time.to_string());
    let user = record.username().unwrap_or("-");
    let activity_type = record.activity_type().unwrap_or("-");
    let rest = format_fields(&record.fields);

    if rest.is_empty() {
        format!("[{when}] {user} | {activity_type}\n")
    } else {
        format!("[{when}] {user} | {activity_type} | {rest}\n")
    }
}

pub fn format_activities(records: &[ActivityRecord], limit: usize) -> String {
    if records.is_empty() {
        return "No user activity to display.\n".to_string();
    }

    let mut output = String::new();
    for record in records.iter().take(limit) {
        output.push_str(&format_activity(record));
    }
    if records.len() > limit {
        output.push_str(&format!("... {} more\n", records.len() - limit));
    }
    output
}

/// Filter summary panel, hidden entirely when no dimension is active.
pub fn format_filters(state: &FilterState) -> String {
    let flags = state.flags();
    if !flags.show_filter_block {
        return "No filters active.\n".to_string();
    }

    let mut output = String::from("Active filters:\n");
    if flags.show_start_date_filter {
        output.push_str(&format!("  From: {}\n", state.start_date()));
    }
    if flags.show_end_date_filter {
        output.push_str(&format!("  To: {}\n", state.end_date()));
    }
    if flags.show_type_filter {
        output.push_str(&format!("  Type: {}\n", state.types().display()));
    }
    if flags.show_username_filter {
        output.push_str(&format!("  Username: {}\n", state.users().display()));
    }
    output
}

pub fn format_catalogs(users: &[UserOption], types: &[TypeOption]) -> String {
    let mut output = String::from("Users:\n");
    if users.is_empty() {
        output.push_str("  (none)\n");
    }
    for user in users {
        output.push_str(&format!("  {} (id {})\n", user.user_name, user.user_id));
    }

    output.push_str("Types:\n");
    if types.is_empty() {
        output.push_str("  (none)\n");
    }
    for t in types {
        output.push_str(&format!("  {}\n", t.name));
    }
    output
}

pub fn format_notices(notices: &[Notice]) -> String {
    if notices.is_empty() {
        return "No notifications.\n".to_string();
    }

    notices
        .iter()
        .map(|n| {
            format!(
                "[#{}] {} | {} | {}\n",
                n.id,
                n.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                n.kind,
                n.message
            )
        })
        .collect()
}
