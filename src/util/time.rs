use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Fixed drift of the Kanbanery server clock, in seconds.
pub const CLOCK_SKEW_SECS: i64 = 9000;

const TIMESTAMP_FIELDS: [&str; 3] = ["created_at", "updated_at", "moved_at"];

pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an HTTP `Date` header (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn parse_http_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Undo the server clock drift on a record's timestamps, judged by the
/// time the server reported for the response.
pub fn rectify_time(record: &mut Map<String, Value>, server_time: DateTime<Utc>) {
    rectify_time_at(record, server_time, Utc::now())
}

pub fn rectify_time_at(
    record: &mut Map<String, Value>,
    server_time: DateTime<Utc>,
    now: DateTime<Utc>,
) {
    let skew = Duration::seconds(CLOCK_SKEW_SECS);
    let drift = server_time - now;
    let correction = if drift > skew / 2 {
        -skew
    } else if drift < -(skew / 2) {
        skew
    } else {
        return;
    };

    tracing::debug!(drift = drift.num_seconds(), "correcting server clock skew");
    for field in TIMESTAMP_FIELDS {
        if let Some(value) = record.get_mut(field) {
            if let Some(time) = parse_timestamp(value) {
                *value = Value::String(format_timestamp(time + correction));
            }
        }
    }
}
