//! Relative timestamps for the conversation list

use crate::events::Conversation;
use crate::render::sanitize;
use chrono::{DateTime, Local, Utc};

/// Format `timestamp` relative to `now`.
///
/// Under a minute (including timestamps in the future) is "Now", then minutes,
/// hours and days; a week or older falls back to a fixed `MM/DD` date in
/// local time.
pub fn relative_time(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(timestamp) = timestamp else {
        return String::new();
    };

    let diff_ms = (now - timestamp).num_milliseconds();
    let diff_mins = diff_ms.div_euclid(60_000);
    let diff_hours = diff_ms.div_euclid(3_600_000);
    let diff_days = diff_ms.div_euclid(86_400_000);

    if diff_mins < 1 {
        "Now".to_string()
    } else if diff_mins < 60 {
        format!("{} min ago", diff_mins)
    } else if diff_hours < 24 {
        format!("{}h ago", diff_hours)
    } else if diff_days < 7 {
        format!("{}d ago", diff_days)
    } else {
        timestamp.with_timezone(&Local).format("%m/%d").to_string()
    }
}

/// One line of the `list` subcommand's output, safe to print to a terminal
pub fn conversation_line(conversation: &Conversation, now: DateTime<Utc>) -> String {
    format!(
        "  • {}  ({})  [{}]",
        single_line(&conversation.title),
        relative_time(conversation.last_message_time, now),
        single_line(&conversation.conversation_id)
    )
}

fn single_line(text: &str) -> String {
    sanitize(text).replace('\n', " ")
}
