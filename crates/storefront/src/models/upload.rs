//! Uploaded files.

use serde::Serialize;

use flagstone_core::UploadId;

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub id: UploadId,
    pub name: String,
    /// Public path, e.g. `/uploads/3f2c...-tile.jpg`.
    pub url: String,
    pub mime: String,
    pub size: i64,
}

/// A file written to disk but not yet recorded.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub name: String,
    pub url: String,
    pub mime: String,
    pub size: i64,
}

/// Body returned by `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResponse {
    pub id: UploadId,
    pub url: String,
    pub name: String,
}

impl From<UploadedFile> for UploadResponse {
    fn from(file: UploadedFile) -> Self {
        Self {
            id: file.id,
            url: file.url,
            name: file.name,
        }
    }
}
