//! Profile details, read through the cache.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use flagstone_core::{UploadId, UserId};

use crate::cache::{CacheError, CacheStore, user_details_key};
use crate::db::RepositoryError;
use crate::db::uploads::UploadRepository;
use crate::db::user_details::UserDetailsRepository;
use crate::models::user::{UserDetails, UserDetailsUpdate};

#[derive(Debug, Error)]
pub enum UserDetailsError {
    #[error("profile image {0} does not exist")]
    UnknownProfileImage(UploadId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

pub struct UserDetailsService<'a> {
    pool: &'a PgPool,
    cache: &'a CacheStore,
}

impl<'a> UserDetailsService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a CacheStore) -> Self {
        Self { pool, cache }
    }

    /// Details straight from the database.
    ///
    /// # Errors
    ///
    /// Returns `UserDetailsError::Repository` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<UserDetails>, UserDetailsError> {
        Ok(UserDetailsRepository::new(self.pool).get(user_id).await?)
    }

    /// Details from the cache, loading and caching them on a miss.
    ///
    /// A user without saved details is cached as empty details.
    ///
    /// # Errors
    ///
    /// Returns `UserDetailsError` on backend failure.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn cached(&self, user_id: UserId) -> Result<UserDetails, UserDetailsError> {
        let key = user_details_key(user_id);
        if let Some(details) = self.cache.get_json::<UserDetails>(&key).await? {
            return Ok(details);
        }

        let details = self.get(user_id).await?.unwrap_or_default();
        self.cache.set_json(&key, &details).await?;
        Ok(details)
    }

    /// Save details and drop the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `UserDetailsError::UnknownProfileImage` if `profileImage`
    /// names no uploaded file.
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub async fn update(
        &self,
        user_id: UserId,
        update: UserDetailsUpdate,
    ) -> Result<UserDetails, UserDetailsError> {
        let update = update.normalized();

        if let Some(image_id) = update.profile_image
            && UploadRepository::new(self.pool).get(image_id).await?.is_none()
        {
            return Err(UserDetailsError::UnknownProfileImage(image_id));
        }

        let details = UserDetailsRepository::new(self.pool)
            .upsert(user_id, &update)
            .await?;
        self.invalidate(user_id).await?;

        tracing::info!("User details updated");
        Ok(details)
    }

    /// Drop the cached copy.
    ///
    /// # Errors
    ///
    /// Returns `UserDetailsError::Cache` on backend failure.
    pub async fn invalidate(&self, user_id: UserId) -> Result<(), UserDetailsError> {
        self.cache.delete(&user_details_key(user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::models::user::PhoneNumber;

    #[tokio::test]
    async fn test_cached_details_served_without_database() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/flagstone_test")
            .unwrap();
        let cache = CacheStore::in_memory();
        let user = UserId::new(3);
        let details = UserDetails {
            full_name: Some("Priya Shah".to_string()),
            phone_numbers: vec![PhoneNumber {
                phone: "07700 900123".to_string(),
            }],
            ..UserDetails::default()
        };
        cache.set_json(&user_details_key(user), &details).await.unwrap();

        let service = UserDetailsService::new(&pool, &cache);
        assert_eq!(service.cached(user).await.unwrap(), details);

        service.invalidate(user).await.unwrap();
        assert!(
            cache
                .get_json::<UserDetails>(&user_details_key(user))
                .await
                .unwrap()
                .is_none()
        );
    }
}
