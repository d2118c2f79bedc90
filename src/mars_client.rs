use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::SourceError;
use crate::models::{Photo, PhotosResponse, RoverRecord, RoversResponse};

/// The remote collaborator the registry and prober read from.
pub trait PhotoSource: Send + Sync {
    fn list_rovers(&self) -> impl Future<Output = Result<Vec<RoverRecord>, SourceError>> + Send;

    fn list_photos_for_date(
        &self,
        rover: &str,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Photo>, SourceError>> + Send;
}

pub struct MarsPhotosClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl MarsPhotosClient {
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("mars_rover_story/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
            timeout: config.request_timeout,
        })
    }

    fn rovers_url(&self) -> String {
        format!("{}/rovers", self.base_url)
    }

    fn photos_url(&self, rover: &str) -> String {
        format!(
            "{}/rovers/{}/photos",
            self.base_url,
            urlencoding::encode(&rover.to_lowercase())
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SourceError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let response = check_status(response)?;
        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }

    fn classify(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Http(err)
        }
    }
}

fn check_status(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SourceError::Status(status.as_u16()))
    }
}

impl PhotoSource for MarsPhotosClient {
    async fn list_rovers(&self) -> Result<Vec<RoverRecord>, SourceError> {
        let body: RoversResponse = self.get_json(&self.rovers_url(), &[]).await?;
        debug!(count = body.rovers.len(), "fetched rover listing");
        Ok(body.rovers)
    }

    async fn list_photos_for_date(
        &self,
        rover: &str,
        date: NaiveDate,
    ) -> Result<Vec<Photo>, SourceError> {
        let query = [("earth_date", date.format("%Y-%m-%d").to_string())];
        let body: PhotosResponse = self.get_json(&self.photos_url(rover), &query).await?;
        debug!(rover, %date, count = body.photos.len(), "fetched photos");
        Ok(body.photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_urls_use_lowercase_rover_names() {
        let client = MarsPhotosClient::new(&Config::for_base_url("http://localhost:1234")).unwrap();
        assert_eq!(client.rovers_url(), "http://localhost:1234/rovers");
        assert_eq!(
            client.photos_url("Curiosity"),
            "http://localhost:1234/rovers/curiosity/photos"
        );
    }
}
