//! File uploads stored on local disk and served from `/uploads`.

use std::path::PathBuf;

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use flagstone_core::UserId;

use crate::db::RepositoryError;
use crate::db::uploads::UploadRepository;
use crate::models::upload::{NewUpload, UploadedFile};

/// URL prefix uploads are served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file uploaded")]
    NoFile,
    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A file received from a client.
#[derive(Debug)]
pub struct IncomingFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub struct UploadService<'a> {
    pool: &'a PgPool,
    dir: &'a std::path::Path,
}

impl<'a> UploadService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, dir: &'a std::path::Path) -> Self {
        Self { pool, dir }
    }

    /// Write a file to the uploads directory and record it.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NoFile` for an empty file, `UploadError::Io` if
    /// the file cannot be written, and `UploadError::Repository` if it
    /// cannot be recorded.
    #[instrument(skip(self, file), fields(user_id = %user_id, name = %file.name, size = file.bytes.len()))]
    pub async fn store(&self, user_id: UserId, file: IncomingFile) -> Result<UploadedFile, UploadError> {
        if file.bytes.is_empty() {
            return Err(UploadError::NoFile);
        }

        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&file.name));
        let path: PathBuf = self.dir.join(&stored_name);

        tokio::fs::create_dir_all(self.dir).await?;
        tokio::fs::write(&path, &file.bytes).await?;

        let upload = NewUpload {
            name: file.name,
            url: format!("{UPLOADS_URL_PREFIX}/{stored_name}"),
            mime: file.mime,
            size: i64::try_from(file.bytes.len()).unwrap_or(i64::MAX),
        };

        match UploadRepository::new(self.pool).create(user_id, &upload).await {
            Ok(stored) => {
                tracing::info!(upload_id = %stored.id, "Upload stored");
                Ok(stored)
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(error = %remove_err, "Failed to remove orphaned upload");
                }
                Err(e.into())
            }
        }
    }
}

/// Reduce a client file name to a safe, short path component.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LENGTH)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
