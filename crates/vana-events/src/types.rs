//! Luma API types and the feed handed to renderers.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::format::format_date;

pub const UNNAMED_EVENT: &str = "Unnamed Event";
pub const DEFAULT_LOCATION: &str = "Online";
pub const DEFAULT_URL: &str = "#";
pub const DEFAULT_IMAGE_URL: &str = "default-image-url.jpg";

/// Event card as consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub name: String,
    /// Display date, e.g. `Wed, Jan 3, 2024`. Empty when the start is unknown.
    pub date: String,
    pub location: String,
    pub start_time: String,
    pub end_time: String,
    pub url: String,
    pub image_url: String,
    pub is_past: bool,
}

/// Upcoming events soonest first, past events most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFeed {
    pub upcoming: Vec<EventView>,
    pub past: Vec<EventView>,
}

impl EventFeed {
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.past.is_empty()
    }
}

/// A public event after field defaulting, before partitioning.
///
/// Keeps the numeric start so sorting never depends on display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub name: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub location: String,
    pub start_time: String,
    pub end_time: String,
    pub url: String,
    pub image_url: String,
    pub is_past: bool,
}

impl ParsedEvent {
    pub fn into_view(self, tz: Tz) -> EventView {
        EventView {
            date: self
                .starts_at
                .map(|dt| format_date(dt, tz))
                .unwrap_or_default(),
            name: self.name,
            location: self.location,
            start_time: self.start_time,
            end_time: self.end_time,
            url: self.url,
            image_url: self.image_url,
            is_past: self.is_past,
        }
    }
}

// API Response Types
//
// Every field is optional and read leniently: a value of the wrong JSON type
// is treated as absent so the usual fallback applies.

/// One element of the `entries` array.
#[derive(Debug, Deserialize)]
pub struct ApiEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub event: Option<ApiEvent>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub start_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub geo_address_json: Option<ApiGeoAddress>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Deserialize)]
pub struct ApiGeoAddress {
    #[serde(default, deserialize_with = "lenient")]
    pub full_address: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[serde(other)]
    Other,
}

impl ApiEvent {
    pub fn is_public(&self) -> bool {
        self.visibility == Some(Visibility::Public)
    }
}
