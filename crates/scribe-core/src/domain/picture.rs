//! Profile picture uploads.

use bytes::Bytes;
use uuid::Uuid;

use crate::ports::StorageError;

/// Image formats accepted as profile pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    pub fn from_mime(content_type: &str) -> Option<Self> {
        // Ignore parameters such as "; charset=..."
        let mime = content_type.split(';').next().unwrap_or("").trim();
        match mime.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Guess the kind from a stored file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext {
            "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Check the leading magic bytes of the payload.
    fn matches(self, body: &[u8]) -> bool {
        match self {
            Self::Jpeg => body.starts_with(&[0xFF, 0xD8, 0xFF]),
            Self::Png => body.starts_with(b"\x89PNG\r\n\x1a\n"),
            Self::Webp => body.len() >= 12 && &body[..4] == b"RIFF" && &body[8..12] == b"WEBP",
            Self::Gif => body.starts_with(b"GIF87a") || body.starts_with(b"GIF89a"),
        }
    }
}

/// A validated profile picture ready to be written to storage.
#[derive(Debug, Clone)]
pub struct ProfilePicture {
    pub file_name: String,
    pub kind: ImageKind,
    pub body: Bytes,
}

impl ProfilePicture {
    /// Validate an uploaded body against the declared content type and size limit.
    pub fn from_upload(
        content_type: &str,
        body: Bytes,
        max_bytes: usize,
    ) -> Result<Self, StorageError> {
        if body.len() > max_bytes {
            return Err(StorageError::TooLarge { limit: max_bytes });
        }
        if body.is_empty() {
            return Err(StorageError::Empty);
        }

        let kind = ImageKind::from_mime(content_type)
            .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))?;

        if !kind.matches(&body) {
            return Err(StorageError::UnsupportedType(format!(
                "body is not a valid {}",
                kind.mime()
            )));
        }

        Ok(Self {
            file_name: format!("{}.{}", Uuid::new_v4().simple(), kind.extension()),
            kind,
            body,
        })
    }
}
