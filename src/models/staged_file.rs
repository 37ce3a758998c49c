//! Represents one screenshot staged for submission.

use bytes::Bytes;
use std::{fmt, io, path::Path};
use thiserror::Error;
use tokio::fs;

/// Identity of a staged file.
///
/// Two files with the same name and byte size are treated as the same
/// attachment, even when they come from distinct selection events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey {
    pub name: String,
    pub size: u64,
}

impl FileKey {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}-{}", self.name, self.size)
    }
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("`{0}` has no file name")]
    MissingFileName(String),
    #[error("`{0}` is not a regular file")]
    NotAFile(String),
    #[error("reading `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// A candidate attachment: content plus the attributes the backend receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedFile {
    /// Binary content. Cloning is cheap; the buffer is shared.
    pub content: Bytes,

    /// Original file name, sent as the multipart part's file name.
    pub name: String,

    /// Size in bytes.
    pub size: u64,

    /// Declared media type (MIME).
    pub media_type: String,
}

impl StagedFile {
    /// Build a staged file from in-memory content. Size is taken from the content.
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        let content = content.into();
        Self {
            size: content.len() as u64,
            content,
            name: name.into(),
            media_type: media_type.into(),
        }
    }

    /// Read a file from disk, inferring its media type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, StagingError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| StagingError::MissingFileName(display.clone()))?;

        let meta = fs::metadata(path).await.map_err(|source| StagingError::Read {
            path: display.clone(),
            source,
        })?;
        if !meta.is_file() {
            return Err(StagingError::NotAFile(display));
        }

        let content = fs::read(path).await.map_err(|source| StagingError::Read {
            path: display.clone(),
            source,
        })?;

        let media_type = media_type_for(&name);
        Ok(Self::new(name, media_type, content))
    }

    pub fn key(&self) -> FileKey {
        FileKey::new(self.name.clone(), self.size)
    }

    /// Cheap identity comparison without allocating a key.
    pub fn matches(&self, key: &FileKey) -> bool {
        self.size == key.size && self.name == key.name
    }
}

/// Guess a media type from the file extension (case-insensitive).
pub fn media_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}
