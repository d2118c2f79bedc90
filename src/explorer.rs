use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Result, SourceError};
use crate::filters::PhotoFilter;
use crate::mars_client::PhotoSource;
use crate::models::Photo;
use crate::prober::Prober;
use crate::registry::RoverRegistry;
use crate::resolver::{Resolution, Resolver};
use crate::session::SessionStore;

/// One browsing session: a photo source, its session cache, and the rover
/// registry loaded from them at most once.
pub struct Explorer<S> {
    source: S,
    session: Box<dyn SessionStore>,
    registry: OnceCell<RoverRegistry>,
    request_timeout: Duration,
    search_radius_days: u32,
}

impl<S: PhotoSource> Explorer<S> {
    pub fn new(source: S, session: Box<dyn SessionStore>, config: &Config) -> Self {
        Self {
            source,
            session,
            registry: OnceCell::new(),
            request_timeout: config.request_timeout,
            search_radius_days: config.search_radius_days,
        }
    }

    /// Loads the registry on first use. Concurrent callers wait on the same
    /// load; a failed load is retried by the next caller.
    pub async fn registry(&self) -> Result<&RoverRegistry> {
        self.registry
            .get_or_try_init(|| RoverRegistry::load(&self.source, self.session.as_ref()))
            .await
    }

    pub async fn resolve(
        &self,
        date: NaiveDate,
        filter: &PhotoFilter,
        cancel: &CancellationToken,
    ) -> Result<Resolution> {
        let registry = self.registry().await?;
        Resolver::new(registry, self.prober(), self.search_radius_days)
            .resolve(date, filter, cancel)
            .await
    }

    pub async fn probe(
        &self,
        date: NaiveDate,
        rovers: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Photo>, SourceError> {
        self.prober().probe(date, rovers, cancel).await
    }

    fn prober(&self) -> Prober<'_, S> {
        Prober::new(&self.source, self.request_timeout)
    }
}
