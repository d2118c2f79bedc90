use std::time::Duration;

use chrono::NaiveDate;
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::mars_client::PhotoSource;
use crate::models::Photo;

/// Fans a single-date query out over several rovers.
pub struct Prober<'a, S> {
    source: &'a S,
    timeout: Duration,
}

impl<'a, S: PhotoSource> Prober<'a, S> {
    pub fn new(source: &'a S, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Queries every rover concurrently and flattens the results in rover
    /// order. The first failure drops the outstanding queries and is
    /// returned on its own; nothing partial is kept.
    pub async fn probe(
        &self,
        date: NaiveDate,
        rovers: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Photo>, SourceError> {
        let queries = rovers.iter().map(|rover| self.query(rover, date));

        let results = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%date, "probe cancelled");
                return Err(SourceError::Cancelled);
            }
            results = try_join_all(queries) => results?,
        };

        let photos: Vec<Photo> = results.into_iter().flatten().collect();
        debug!(%date, rovers = rovers.len(), photos = photos.len(), "probe finished");
        Ok(photos)
    }

    async fn query(&self, rover: &str, date: NaiveDate) -> Result<Vec<Photo>, SourceError> {
        match tokio::time::timeout(self.timeout, self.source.list_photos_for_date(rover, date)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(rover, %date, timeout_secs = self.timeout.as_secs(), "photo query timed out");
                Err(SourceError::Timeout(self.timeout))
            }
        }
    }
}
