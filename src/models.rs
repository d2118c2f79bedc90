use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type PhotoId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    #[serde(default)]
    pub name: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoverRef {
    pub name: String,
}

/// A single rover photograph as returned by the photo source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    #[serde(default)]
    pub sol: Option<u32>,
    pub camera: Camera,
    pub img_src: String,
    pub earth_date: NaiveDate,
    pub rover: RoverRef,
}

impl Photo {
    pub fn rover_name(&self) -> &str {
        &self.rover.name
    }

    pub fn camera_full_name(&self) -> &str {
        &self.camera.full_name
    }
}

/// One entry of the rover listing. Everything else the source sends
/// (cameras, status, photo totals) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoverRecord {
    pub name: String,
    pub landing_date: NaiveDate,
    pub max_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RoversResponse {
    pub rovers: Vec<RoverRecord>,
}

#[derive(Debug, Deserialize)]
pub struct PhotosResponse {
    pub photos: Vec<Photo>,
}

/// Inclusive range of earth dates a rover has photographs for.
///
/// Serialized with the field names the session cache has always used.
/// Decoding goes through [`RoverAvailability::new`], so an inverted range
/// never deserializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawAvailability")]
pub struct RoverAvailability {
    min_date: NaiveDate,
    max_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAvailability {
    min_date: NaiveDate,
    max_date: NaiveDate,
}

impl TryFrom<RawAvailability> for RoverAvailability {
    type Error = String;

    fn try_from(raw: RawAvailability) -> Result<Self, Self::Error> {
        Self::new(raw.min_date, raw.max_date).ok_or_else(|| {
            format!("minDate {} is after maxDate {}", raw.min_date, raw.max_date)
        })
    }
}

impl RoverAvailability {
    /// Returns `None` when the range is inverted.
    pub fn new(min_date: NaiveDate, max_date: NaiveDate) -> Option<Self> {
        (min_date <= max_date).then_some(Self { min_date, max_date })
    }

    pub fn min_date(&self) -> NaiveDate {
        self.min_date
    }

    pub fn max_date(&self) -> NaiveDate {
        self.max_date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.min_date <= date && date <= self.max_date
    }
}

impl RoverRecord {
    pub fn availability(&self) -> Option<RoverAvailability> {
        RoverAvailability::new(self.landing_date, self.max_date)
    }
}
