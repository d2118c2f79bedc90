use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Photo, PhotoId};

pub const MISSING_CAPTION: &str = "No description provided.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub photo: Photo,
    pub description: String,
}

/// One slide of the story, in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorySlide<'a> {
    pub photo: &'a Photo,
    pub caption: &'a str,
}

/// The user's ordered, deduplicated photo list.
#[derive(Debug, Clone, Default)]
pub struct Curator {
    entries: Vec<ListEntry>,
}

impl Curator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a list from stored entries, keeping the first occurrence of
    /// any repeated id.
    pub fn from_entries(entries: impl IntoIterator<Item = ListEntry>) -> Self {
        let mut curator = Self::new();
        for entry in entries {
            if !curator.contains(entry.photo.id) {
                curator.entries.push(entry);
            }
        }
        curator
    }

    pub fn add(&mut self, photo: Photo) -> Result<&ListEntry> {
        if self.contains(photo.id) {
            return Err(Error::DuplicateEntry { id: photo.id });
        }
        info!(id = photo.id, rover = %photo.rover.name, "photo added to list");
        let index = self.entries.len();
        self.entries.push(ListEntry {
            photo,
            description: String::new(),
        });
        Ok(&self.entries[index])
    }

    /// Returns the removed entry, or `None` if the id was not listed.
    pub fn remove(&mut self, id: PhotoId) -> Option<ListEntry> {
        let index = self.entries.iter().position(|e| e.photo.id == id)?;
        info!(id, "photo removed from list");
        Some(self.entries.remove(index))
    }

    /// Returns whether an entry was updated.
    pub fn set_description(&mut self, id: PhotoId, text: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.photo.id == id) {
            Some(entry) => {
                entry.description = text.into();
                true
            }
            None => false,
        }
    }

    pub fn story(&self) -> Vec<StorySlide<'_>> {
        self.entries
            .iter()
            .map(|entry| StorySlide {
                photo: &entry.photo,
                caption: if entry.description.trim().is_empty() {
                    MISSING_CAPTION
                } else {
                    &entry.description
                },
            })
            .collect()
    }

    pub fn contains(&self, id: PhotoId) -> bool {
        self.entries.iter().any(|e| e.photo.id == id)
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
