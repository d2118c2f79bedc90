use crate::models::Photo;

/// Rover and camera constraints. `None` (or an empty string) matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoFilter {
    pub rover: Option<String>,
    pub camera: Option<String>,
}

impl PhotoFilter {
    pub fn new(rover: Option<String>, camera: Option<String>) -> Self {
        Self {
            rover: rover.filter(|r| !r.is_empty()),
            camera: camera.filter(|c| !c.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rover.is_none() && self.camera.is_none()
    }

    /// Search semantics: rover name compared ignoring case, camera matched as
    /// a case-insensitive substring of the camera's full name.
    pub fn matches(&self, photo: &Photo) -> bool {
        let rover_ok = self
            .rover
            .as_deref()
            .map_or(true, |r| photo.rover_name().eq_ignore_ascii_case(r));
        let camera_ok = self.camera.as_deref().map_or(true, |c| {
            photo
                .camera_full_name()
                .to_lowercase()
                .contains(&c.to_lowercase())
        });
        rover_ok && camera_ok
    }

    /// Dropdown semantics: both values must equal the photo's exactly, since
    /// the options were taken verbatim from the result set.
    pub fn matches_exact(&self, photo: &Photo) -> bool {
        self.rover.as_deref().map_or(true, |r| photo.rover_name() == r)
            && self.camera.as_deref().map_or(true, |c| photo.camera_full_name() == c)
    }
}

/// Distinct rover and camera names in a result set, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub rovers: Vec<String>,
    pub cameras: Vec<String>,
}

impl FilterOptions {
    pub fn is_empty(&self) -> bool {
        self.rovers.is_empty() && self.cameras.is_empty()
    }
}

pub fn extract_filter_options(photos: &[Photo]) -> FilterOptions {
    let mut options = FilterOptions::default();
    for photo in photos {
        if !options.rovers.iter().any(|r| r == photo.rover_name()) {
            options.rovers.push(photo.rover_name().to_string());
        }
        if !options.cameras.iter().any(|c| c == photo.camera_full_name()) {
            options.cameras.push(photo.camera_full_name().to_string());
        }
    }
    options
}

pub fn apply_filters(photos: &[Photo], filter: &PhotoFilter) -> Vec<Photo> {
    photos
        .iter()
        .filter(|photo| filter.matches_exact(photo))
        .cloned()
        .collect()
}
