//! Scripted in-memory photo source for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::SourceError;
use crate::mars_client::PhotoSource;
use crate::models::{Camera, Photo, PhotoId, RoverRecord, RoverRef};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn photo(id: PhotoId, rover: &str, camera: &str, earth_date: NaiveDate) -> Photo {
    Photo {
        id,
        sol: None,
        camera: Camera {
            name: String::new(),
            full_name: camera.to_string(),
        },
        img_src: format!("https://example.test/{id}.jpg"),
        earth_date,
        rover: RoverRef {
            name: rover.to_string(),
        },
    }
}

pub fn rover(name: &str, landing: NaiveDate, max: NaiveDate) -> RoverRecord {
    RoverRecord {
        name: name.to_string(),
        landing_date: landing,
        max_date: max,
    }
}

/// Answers queries from a fixed table and records every call made.
#[derive(Default)]
pub struct ScriptedSource {
    rovers: Vec<RoverRecord>,
    photos: HashMap<(String, NaiveDate), Vec<Photo>>,
    failing: HashMap<String, u16>,
    delay: Option<Duration>,
    pub rover_calls: Mutex<usize>,
    pub photo_calls: Mutex<Vec<(String, NaiveDate)>>,
}

impl ScriptedSource {
    pub fn new(rovers: Vec<RoverRecord>) -> Self {
        Self {
            rovers,
            ..Default::default()
        }
    }

    pub fn with_photos(mut self, rover: &str, on: NaiveDate, photos: Vec<Photo>) -> Self {
        self.photos.insert((rover.to_lowercase(), on), photos);
        self
    }

    pub fn failing_for(mut self, rover: &str, status: u16) -> Self {
        self.failing.insert(rover.to_lowercase(), status);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn rover_call_count(&self) -> usize {
        *self.rover_calls.lock().unwrap()
    }

    pub fn queried_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .photo_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, d)| *d)
            .collect();
        dates.dedup();
        dates
    }
}

impl PhotoSource for ScriptedSource {
    async fn list_rovers(&self) -> Result<Vec<RoverRecord>, SourceError> {
        *self.rover_calls.lock().unwrap() += 1;
        Ok(self.rovers.clone())
    }

    async fn list_photos_for_date(
        &self,
        rover: &str,
        date: NaiveDate,
    ) -> Result<Vec<Photo>, SourceError> {
        let key = rover.to_lowercase();
        self.photo_calls.lock().unwrap().push((key.clone(), date));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(status) = self.failing.get(&key) {
            return Err(SourceError::Status(*status));
        }
        Ok(self.photos.get(&(key, date)).cloned().unwrap_or_default())
    }
}
