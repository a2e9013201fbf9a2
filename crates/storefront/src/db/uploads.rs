//! Uploaded file records.

use sqlx::{FromRow, PgPool};
use tracing::instrument;

use flagstone_core::{UploadId, UserId};

use super::RepositoryError;
use crate::models::upload::{NewUpload, UploadedFile};

#[derive(FromRow)]
struct UploadRow {
    id: UploadId,
    name: String,
    url: String,
    mime: String,
    size: i64,
}

impl From<UploadRow> for UploadedFile {
    fn from(row: UploadRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            url: row.url,
            mime: row.mime,
            size: row.size,
        }
    }
}

/// Repository for uploaded files.
pub struct UploadRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UploadRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a stored file.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, upload), fields(name = %upload.name))]
    pub async fn create(
        &self,
        user_id: UserId,
        upload: &NewUpload,
    ) -> Result<UploadedFile, RepositoryError> {
        let row = sqlx::query_as::<_, UploadRow>(
            r"
            INSERT INTO storefront.upload_file (user_id, name, url, mime, size)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, url, mime, size
            ",
        )
        .bind(user_id)
        .bind(&upload.name)
        .bind(&upload.url)
        .bind(&upload.mime)
        .bind(upload.size)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Get a file by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: UploadId) -> Result<Option<UploadedFile>, RepositoryError> {
        let row = sqlx::query_as::<_, UploadRow>(
            "SELECT id, name, url, mime, size FROM storefront.upload_file WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}
