//! Response validation, field defaulting and upcoming/past partitioning.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

use crate::error::EventsError;
use crate::format::{format_time, parse_timestamp};
use crate::types::*;

/// Filter the `entries` array down to public events and apply field defaults.
///
/// Order-preserving; no sorting happens here. Fields of the wrong type fall
/// back to their defaults. An entry that is not a JSON object has no event
/// and is skipped with a warning.
pub fn parse_events(
    body: &Value,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<Vec<ParsedEvent>, EventsError> {
    let entries = match body.get("entries") {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(EventsError::MalformedResponse(format!(
                "`entries` is {}, expected an array",
                json_kind(other)
            )))
        }
        None => {
            return Err(EventsError::MalformedResponse(
                "missing `entries` array".to_string(),
            ))
        }
    };

    let mut events = Vec::with_capacity(entries.len());
    for (index, raw) in entries.iter().enumerate() {
        let entry = match ApiEntry::deserialize(raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(index, "Skipping unreadable event entry: {}", e);
                continue;
            }
        };

        let Some(event) = entry.event.filter(ApiEvent::is_public) else {
            continue;
        };

        events.push(to_parsed(event, now, tz));
    }

    Ok(events)
}

fn to_parsed(event: ApiEvent, now: DateTime<Utc>, tz: Tz) -> ParsedEvent {
    let starts_at = event.start_at.as_deref().and_then(parse_timestamp);

    ParsedEvent {
        name: non_empty(event.name).unwrap_or_else(|| UNNAMED_EVENT.to_string()),
        starts_at,
        location: non_empty(event.geo_address_json.and_then(|g| g.full_address))
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        start_time: format_time(event.start_at.as_deref(), tz),
        end_time: format_time(event.end_at.as_deref(), tz),
        url: non_empty(event.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
        image_url: non_empty(event.cover_url).unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
        is_past: starts_at.is_some_and(|start| start < now),
    }
}

/// Split into upcoming (ascending) and past (descending) by start time.
///
/// Both sorts are stable. Upcoming events without a known start go last.
/// Dates are formatted only after sorting.
pub fn partition(records: Vec<ParsedEvent>, tz: Tz) -> EventFeed {
    let (mut upcoming, mut past): (Vec<_>, Vec<_>) =
        records.into_iter().partition(|event| !event.is_past);

    upcoming.sort_by(|a, b| cmp_start(a.starts_at, b.starts_at));
    past.sort_by(|a, b| cmp_start(b.starts_at, a.starts_at));

    EventFeed {
        upcoming: upcoming.into_iter().map(|e| e.into_view(tz)).collect(),
        past: past.into_iter().map(|e| e.into_view(tz)).collect(),
    }
}

fn cmp_start(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
