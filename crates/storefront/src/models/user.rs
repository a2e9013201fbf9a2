//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flagstone_core::{Email, UploadId, UserId};

/// A storefront account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A phone number entry of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    #[serde(default)]
    pub phone: String,
}

/// A saved delivery address of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    #[serde(default)]
    pub address: String,
}

/// Reference to an uploaded profile image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileImage {
    pub id: UploadId,
    pub url: String,
    pub name: String,
}

/// Profile details of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub saved_addresses: Vec<SavedAddress>,
    pub profile_image: Option<ProfileImage>,
}

/// Body of `PUT /api/user-details`.
///
/// `profileImage` is the id of a previously uploaded file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub saved_addresses: Vec<SavedAddress>,
    #[serde(default)]
    pub profile_image: Option<UploadId>,
}

impl UserDetailsUpdate {
    /// Trim text fields and drop blank phone/address entries.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            full_name: self
                .full_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            phone_numbers: self
                .phone_numbers
                .into_iter()
                .map(|p| PhoneNumber {
                    phone: p.phone.trim().to_string(),
                })
                .filter(|p| !p.phone.is_empty())
                .collect(),
            saved_addresses: self
                .saved_addresses
                .into_iter()
                .map(|a| SavedAddress {
                    address: a.address.trim().to_string(),
                })
                .filter(|a| !a.address.is_empty())
                .collect(),
            profile_image: self.profile_image,
        }
    }
}

/// Body of `GET /api/user-details/me` and `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub user_details: Option<UserDetails>,
}

impl Me {
    #[must_use]
    pub fn new(user: User, user_details: Option<UserDetails>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            user_details,
        }
    }
}
