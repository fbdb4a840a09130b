//! Event feed error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EventsError {
    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("Response body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid API response structure: {0}")]
    MalformedResponse(String),

    #[error("Rate limited on all {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("Failed to cache events: {0:#}")]
    Cache(#[from] anyhow::Error),
}

impl EventsError {
    /// Message shown in place of the event list.
    pub fn user_message(&self) -> String {
        match self {
            Self::MaxRetriesExceeded { .. } => {
                "The event calendar is busy right now. Please try again in a few minutes."
                    .to_string()
            }
            _ => "Sorry, we couldn't load the events at this time. Please try again later."
                .to_string(),
        }
    }

    /// Whether the upstream kept rate-limiting until attempts ran out.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::MaxRetriesExceeded { .. })
    }

    /// HTTP status for upstream failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
