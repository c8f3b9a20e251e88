//! Catalog data types.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Image extensions shown in the gallery.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Video extensions shown in the gallery.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// Media family of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip.
    Video,
}

impl MediaKind {
    /// Classify a file name by its extension, case-insensitively.
    ///
    /// Returns `None` for anything outside the allow-list.
    #[must_use]
    pub fn from_filename(name: &str) -> Option<Self> {
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Upload (modification) date of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDate {
    /// Date reported by the backend.
    Known(DateTime<Utc>),
    /// The backend reported no usable date.
    Unknown,
}

impl UploadDate {
    /// Parse a backend-reported timestamp.
    ///
    /// Accepts RFC 3339, RFC 2822 (HTTP dates) and `YYYY-MM-DD HH:MM:SS UTC`.
    /// Anything else is [`UploadDate::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
            return Self::Known(date.with_timezone(&Utc));
        }
        if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
            return Self::Known(date.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f UTC") {
            return Self::Known(date.and_utc());
        }
        Self::Unknown
    }

    /// Parse an optional timestamp; absence is [`UploadDate::Unknown`].
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.map_or(Self::Unknown, Self::parse)
    }

    /// Newest first; unknown dates after every known one.
    #[must_use]
    pub fn newest_first(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Known(a), Self::Known(b)) => b.cmp(a),
            (Self::Known(_), Self::Unknown) => Ordering::Less,
            (Self::Unknown, Self::Known(_)) => Ordering::Greater,
            (Self::Unknown, Self::Unknown) => Ordering::Equal,
        }
    }
}

impl Serialize for UploadDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(date) => {
                serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Self::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// One listed media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaItem {
    /// Gallery path used to fetch the file.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload date, or `unknown`.
    pub upload_date: UploadDate,
    /// Id of the backend owning the file.
    pub backend: String,
    /// Backend-native path, relative to the backend root.
    pub original_path: String,
    /// Image or video.
    pub kind: MediaKind,
}

impl MediaItem {
    /// Build an item and its gallery URL.
    #[must_use]
    pub fn new(
        backend: &str,
        original_path: &str,
        size: u64,
        upload_date: UploadDate,
        kind: MediaKind,
    ) -> Self {
        Self {
            url: media_url(backend, original_path),
            size,
            upload_date,
            backend: backend.to_string(),
            original_path: original_path.to_string(),
            kind,
        }
    }

    /// Final path component.
    #[must_use]
    pub fn file_name(&self) -> &str {
        crate::storage::path::file_name(&self.original_path)
    }
}

/// Gallery URL of a backend file: `/{backend}/{segment}/{segment}...`.
///
/// Each segment is percent-encoded on its own so that decoding yields the
/// original name, whatever characters it holds.
#[must_use]
pub fn media_url(backend: &str, original_path: &str) -> String {
    let encoded: Vec<_> = original_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(urlencoding::encode)
        .collect();
    format!("/{backend}/{}", encoded.join("/"))
}

/// Stable sort, newest first, unknown dates last in merge order.
pub fn sort_newest_first(items: &mut [MediaItem]) {
    items.sort_by(|a, b| a.upload_date.newest_first(&b.upload_date));
}

/// One gallery snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    /// Folder that was listed; empty for the root.
    pub folder: String,
    /// Media items, newest first.
    pub items: Vec<MediaItem>,
    /// Sub-folders seen on any backend, sorted and deduplicated.
    pub folders: Vec<String>,
}
