//! Album records and the collection they live in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// All albums for the current user, newest insert first.
pub type AlbumCollection = Vec<Album>;

/// Stable album identifier (creation timestamp in milliseconds).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub String);

impl AlbumId {
    pub fn from_millis(millis: i64) -> Self {
        AlbumId(millis.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named, timestamped collection of photos plus a cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub name: String,
    /// Stored as an empty string when absent, like the original records.
    #[serde(
        default,
        serialize_with = "serialize_description",
        deserialize_with = "deserialize_description"
    )]
    pub description: Option<String>,
    /// Image data reference (`data:` URL).
    pub cover: String,
    #[serde(default)]
    pub photos: Vec<String>,
    /// Display names parallel to `photos`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_names: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

fn serialize_description<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(value.as_deref().unwrap_or(""))
}

fn deserialize_description<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value: Option<String> = Option::deserialize(d)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl Album {
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    pub fn photo_name(&self, index: usize) -> Option<&str> {
        self.photo_names
            .as_ref()
            .and_then(|names| names.get(index))
            .map(String::as_str)
    }

    /// Remove the photo at `index` together with its display name.
    ///
    /// Removing the first photo moves the cover to the new first photo. When
    /// the last photo goes the cover is left as it was.
    pub fn remove_photo(&mut self, index: usize) -> Option<String> {
        if index >= self.photos.len() {
            return None;
        }
        let removed = self.photos.remove(index);
        if let Some(names) = self.photo_names.as_mut() {
            if index < names.len() {
                names.remove(index);
            }
        }
        if index == 0 {
            if let Some(first) = self.photos.first() {
                self.cover = first.clone();
            }
        }
        Some(removed)
    }

    /// Case-insensitive match on name, description and photo names.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        if self.name.to_lowercase().contains(needle) {
            return true;
        }
        if let Some(desc) = &self.description {
            if desc.to_lowercase().contains(needle) {
                return true;
            }
        }
        self.photo_names
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n.to_lowercase().contains(needle)))
    }

    pub fn names_aligned(&self) -> bool {
        self.photo_names
            .as_ref()
            .map_or(true, |names| names.len() == self.photos.len())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Album with `photos` tiny photos, created `day` days into 2024.
    pub fn album(id: i64, name: &str, day: u32, photos: usize) -> Album {
        let photos: Vec<String> = (0..photos)
            .map(|i| format!("data:image/png;base64,cGhvdG8{}", i))
            .collect();
        let names = (0..photos.len()).map(|i| format!("{}_{}.png", name, i)).collect();
        Album {
            id: AlbumId::from_millis(id),
            name: name.to_string(),
            description: Some(format!("{} description", name)),
            cover: "data:image/png;base64,Y292ZXI=".to_string(),
            photos,
            photo_names: Some(names),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + chrono::Duration::days(day as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::album;
    use super::*;

    #[test]
    fn test_remove_first_photo_moves_cover() {
        let mut a = album(1, "Trip", 0, 3);
        let second = a.photos[1].clone();
        a.remove_photo(0);
        assert_eq!(a.cover, second);
        assert_eq!(a.photos.len(), 2);
        assert!(a.names_aligned());
        assert_eq!(a.photo_name(0), Some("Trip_1.png"));
    }

    #[test]
    fn test_remove_last_photo_keeps_cover() {
        let mut a = album(1, "Trip", 0, 1);
        let cover = a.cover.clone();
        assert!(a.remove_photo(0).is_some());
        assert!(a.photos.is_empty());
        assert_eq!(a.cover, cover);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut a = album(1, "Trip", 0, 2);
        assert!(a.remove_photo(5).is_none());
        assert_eq!(a.photos.len(), 2);
    }

    #[test]
    fn test_matches_any_field() {
        let a = album(1, "Summer Trip", 0, 2);
        assert!(a.matches("summer"));
        assert!(a.matches("description"));
        assert!(a.matches("trip_1.png"));
        assert!(!a.matches("winter"));
    }

    #[test]
    fn test_original_record_shape() {
        let json = r#"{
            "id": "1714557600000",
            "name": "Beach",
            "description": "",
            "cover": "data:image/jpeg;base64,AAAA",
            "photos": ["data:image/jpeg;base64,AAAA"],
            "createdAt": "2024-05-01T10:00:00.000Z"
        }"#;
        let a: Album = serde_json::from_str(json).unwrap();
        assert_eq!(a.id.as_str(), "1714557600000");
        assert_eq!(a.description, None);
        assert_eq!(a.photo_names, None);

        let out = serde_json::to_value(&a).unwrap();
        assert_eq!(out["description"], "");
        assert!(out.get("photoNames").is_none());
        assert!(out.get("createdAt").is_some());
    }
}
