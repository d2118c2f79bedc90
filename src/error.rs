use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::PhotoId;

/// Failure talking to the remote photo source.
///
/// Never attributed to a particular rover: a probe that fans out over several
/// rovers reports whichever query failed first.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    SourceUnavailable(#[from] SourceError),
    #[error("No photos available before {min} or after {max}")]
    DateOutOfRange { min: NaiveDate, max: NaiveDate },
    #[error("No photos available for {date} or within {radius_days} days of it")]
    NoNearbyAvailability { date: NaiveDate, radius_days: u32 },
    #[error("This photo is already in your list.")]
    DuplicateEntry { id: PhotoId },
    #[error("No rover information available")]
    NoRoverData,
    #[error("Cached rover information is unreadable: {0}")]
    SessionCache(#[from] serde_json::Error),
}

impl Error {
    /// Whether the UI should treat this as a notice rather than a failure.
    pub fn is_notice(&self) -> bool {
        matches!(self, Error::DuplicateEntry { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
