use chrono::{Days, NaiveDate};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filters::PhotoFilter;
use crate::mars_client::PhotoSource;
use crate::models::Photo;
use crate::prober::Prober;
use crate::registry::RoverRegistry;

/// Photos for a date, plus the date they were actually found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub requested_date: NaiveDate,
    pub resolved_date: NaiveDate,
    pub photos: Vec<Photo>,
}

impl Resolution {
    pub fn is_exact(&self) -> bool {
        self.requested_date == self.resolved_date
    }
}

pub struct Resolver<'a, S> {
    registry: &'a RoverRegistry,
    prober: Prober<'a, S>,
    search_radius_days: u32,
}

impl<'a, S: PhotoSource> Resolver<'a, S> {
    pub fn new(registry: &'a RoverRegistry, prober: Prober<'a, S>, search_radius_days: u32) -> Self {
        Self {
            registry,
            prober,
            search_radius_days,
        }
    }

    /// Finds photos for `requested`, falling back to the closest date within
    /// the search radius when the requested day has none.
    ///
    /// The filter narrows only the requested day's results. Photos found on a
    /// nearby day are returned unfiltered.
    pub async fn resolve(
        &self,
        requested: NaiveDate,
        filter: &PhotoFilter,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let rovers = self.registry.eligible_rovers(requested);
        if rovers.is_empty() {
            let (min, max) = self.registry.bounds().ok_or(Error::NoRoverData)?;
            return Err(Error::DateOutOfRange { min, max });
        }

        let photos: Vec<Photo> = self
            .prober
            .probe(requested, &rovers, cancel)
            .await?
            .into_iter()
            .filter(|photo| filter.matches(photo))
            .collect();

        if !photos.is_empty() {
            info!(%requested, count = photos.len(), "photos found on requested date");
            return Ok(Resolution {
                requested_date: requested,
                resolved_date: requested,
                photos,
            });
        }

        for delta in 1..=u64::from(self.search_radius_days) {
            let candidates = [
                requested.checked_add_days(Days::new(delta)),
                requested.checked_sub_days(Days::new(delta)),
            ];
            for candidate in candidates.into_iter().flatten() {
                debug!(%requested, %candidate, delta, "probing nearby date");
                let photos = self.prober.probe(candidate, &rovers, cancel).await?;
                if !photos.is_empty() {
                    info!(%requested, resolved = %candidate, count = photos.len(), "photos found on nearby date");
                    return Ok(Resolution {
                        requested_date: requested,
                        resolved_date: candidate,
                        photos,
                    });
                }
            }
        }

        Err(Error::NoNearbyAvailability {
            date: requested,
            radius_days: self.search_radius_days,
        })
    }
}
