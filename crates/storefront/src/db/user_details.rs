//! Profile details repository.

use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use flagstone_core::{UploadId, UserId};

use super::RepositoryError;
use crate::models::user::{PhoneNumber, ProfileImage, SavedAddress, UserDetails, UserDetailsUpdate};

#[derive(FromRow)]
struct UserDetailsRow {
    full_name: Option<String>,
    phone_numbers: Json<Vec<PhoneNumber>>,
    saved_addresses: Json<Vec<SavedAddress>>,
    profile_image_id: Option<UploadId>,
    profile_image_url: Option<String>,
    profile_image_name: Option<String>,
}

impl From<UserDetailsRow> for UserDetails {
    fn from(row: UserDetailsRow) -> Self {
        let profile_image = match (row.profile_image_id, row.profile_image_url) {
            (Some(id), Some(url)) => Some(ProfileImage {
                id,
                url,
                name: row.profile_image_name.unwrap_or_default(),
            }),
            _ => None,
        };
        Self {
            full_name: row.full_name,
            phone_numbers: row.phone_numbers.0,
            saved_addresses: row.saved_addresses.0,
            profile_image,
        }
    }
}

const SELECT_DETAILS: &str = r"
    SELECT d.full_name, d.phone_numbers, d.saved_addresses,
           f.id AS profile_image_id, f.url AS profile_image_url, f.name AS profile_image_name
    FROM storefront.user_details d
    LEFT JOIN storefront.upload_file f ON f.id = d.profile_image_id
    WHERE d.user_id = $1
";

/// Repository for profile details.
pub struct UserDetailsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserDetailsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's details, if they have saved any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: UserId) -> Result<Option<UserDetails>, RepositoryError> {
        let row = sqlx::query_as::<_, UserDetailsRow>(SELECT_DETAILS)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Create or replace a user's details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    #[instrument(skip(self, update))]
    pub async fn upsert(
        &self,
        user_id: UserId,
        update: &UserDetailsUpdate,
    ) -> Result<UserDetails, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO storefront.user_details
                (user_id, full_name, phone_numbers, saved_addresses, profile_image_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                phone_numbers = EXCLUDED.phone_numbers,
                saved_addresses = EXCLUDED.saved_addresses,
                profile_image_id = EXCLUDED.profile_image_id,
                updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(&update.full_name)
        .bind(Json(&update.phone_numbers))
        .bind(Json(&update.saved_addresses))
        .bind(update.profile_image)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, UserDetailsRow>(SELECT_DETAILS)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}
