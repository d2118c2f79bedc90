use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::Result;
use crate::mars_client::PhotoSource;
use crate::models::{RoverAvailability, RoverRecord};
use crate::session::{SessionStore, ROVER_DATA_KEY};

/// Date ranges for every known rover, keyed by lowercase rover name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoverRegistry {
    rovers: BTreeMap<String, RoverAvailability>,
}

impl RoverRegistry {
    /// Reads the registry from the session cache, or fetches the rover
    /// listing once and caches it for the rest of the session.
    pub async fn load<S: PhotoSource>(source: &S, cache: &dyn SessionStore) -> Result<Self> {
        if let Some(raw) = cache.get(ROVER_DATA_KEY) {
            match serde_json::from_str::<BTreeMap<String, RoverAvailability>>(&raw) {
                Ok(rovers) => {
                    info!(count = rovers.len(), "rover registry loaded from session cache");
                    return Ok(Self { rovers });
                }
                Err(e) => warn!(error = %e, "discarding unreadable rover cache"),
            }
        }

        let records = source.list_rovers().await?;
        let registry = Self::from_records(&records);
        cache.set(ROVER_DATA_KEY, serde_json::to_string(&registry.rovers)?);
        info!(count = registry.len(), "rover registry fetched");
        Ok(registry)
    }

    /// Builds the mapping from a rover listing. Records with an inverted
    /// date range are skipped.
    pub fn from_records(records: &[RoverRecord]) -> Self {
        let mut rovers = BTreeMap::new();
        for record in records {
            match record.availability() {
                Some(range) => {
                    rovers.insert(record.name.to_lowercase(), range);
                }
                None => warn!(
                    rover = %record.name,
                    landing = %record.landing_date,
                    max = %record.max_date,
                    "skipping rover with inverted date range"
                ),
            }
        }
        Self { rovers }
    }

    pub fn get(&self, rover: &str) -> Option<&RoverAvailability> {
        self.rovers.get(&rover.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.rovers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rovers.is_empty()
    }

    /// Rovers whose range contains `date`, in name order.
    pub fn eligible_rovers(&self, date: NaiveDate) -> Vec<String> {
        self.rovers
            .iter()
            .filter(|(_, range)| range.contains(date))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Earliest `min_date` and latest `max_date` across all rovers.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rovers.values().map(RoverAvailability::min_date).min()?;
        let max = self.rovers.values().map(RoverAvailability::max_date).max()?;
        Some((min, max))
    }
}
